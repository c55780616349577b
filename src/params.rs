//! Encode-time configuration (§3 `EncodeParameters`, §6 "Clamping").

use crate::error::{Error, Result};
use crate::nodal::{effective_block_size, effective_discard_bits};

/// Parameters that drive `encode`: block size for the nodal skeleton,
/// bits discarded from each nodal sample before quantization, and whether
/// preview reconstruction interpolates between nodes or fills each tile
/// flat.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncodeParameters {
    pub block_size: u8,
    pub discard_bits: u8,
    pub smooth: bool,
}

impl EncodeParameters {
    /// Build parameters, silently clamping out-of-range values (the
    /// default behavior hosts get when passing arbitrary UI values, §6).
    pub fn new(block_size: u8, discard_bits: u8, smooth: bool) -> Self {
        EncodeParameters {
            block_size: effective_block_size(block_size),
            discard_bits: effective_discard_bits(discard_bits),
            smooth,
        }
    }

    /// Build parameters, rejecting values that would otherwise be
    /// clamped (§7 "ParameterError: only surfaced when caller explicitly
    /// rejects clamped values").
    pub fn try_new(block_size: u8, discard_bits: u8, smooth: bool) -> Result<Self> {
        if !(2..=255).contains(&block_size) {
            return Err(Error::parameter(format!("block_size {} is outside [2, 255]", block_size)));
        }
        if discard_bits > 6 {
            return Err(Error::parameter(format!("discard_bits {} is outside [0, 6]", discard_bits)));
        }
        Ok(EncodeParameters { block_size, discard_bits, smooth })
    }
}

impl Default for EncodeParameters {
    fn default() -> Self {
        EncodeParameters { block_size: 8, discard_bits: 0, smooth: true }
    }
}
