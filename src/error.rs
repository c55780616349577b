//! Error taxonomy for the KMR codec.
//!
//! Every public operation in [`crate::pipeline`] returns [`Result`]. Internal
//! stages (`qoi`, `huffman`, `nodal`, `paeth`, `container`) propagate the same
//! error type with `?` rather than recovering, per the codec's "all errors
//! surface at the public boundary" policy.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors produced by encoding or decoding a KMR container.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// The container, QOI stream, or Huffman stream is malformed in a way
    /// that makes it unparsable or self-contradictory.
    #[error("format error: {0}")]
    FormatError(String),

    /// An input or embedded buffer has a length inconsistent with its
    /// declared dimensions.
    #[error("dimension error: {0}")]
    DimensionError(String),

    /// A caller explicitly asked for strict parameter validation and a
    /// value fell outside its documented range.
    #[error("parameter error: {0}")]
    ParameterError(String),

    /// The worst-case output size for a stage exceeds a caller-imposed
    /// limit.
    #[error("allocation error: {0}")]
    AllocationError(String),
}

impl Error {
    pub(crate) fn format(msg: impl Into<String>) -> Self {
        Error::FormatError(msg.into())
    }

    pub(crate) fn dimension(msg: impl Into<String>) -> Self {
        Error::DimensionError(msg.into())
    }

    pub(crate) fn parameter(msg: impl Into<String>) -> Self {
        Error::ParameterError(msg.into())
    }
}
