//! KMR: a hybrid lossless/near-lossless image codec.
//!
//! A KMR container pairs two representations of the same image:
//!
//!  * A **residual image**, the Paeth-predicted difference between the
//!    source pixels and a coarse preview, byte-coded with [QOI](qoi) (the
//!    "Quite OK Image" format).
//!  * A **nodal skeleton**: one averaged YCrCb triple per `block_size x
//!    block_size` tile of the source image, delta- and run-length-coded,
//!    then canonical-Huffman-packed ([huffman]). The skeleton is what lets
//!    a host reconstruct a usable low-resolution preview without touching
//!    the residual stream at all.
//!
//! The two pieces are stored back to back in a small fixed-layout
//! container ([container]) together with the parameters that produced
//! them.
//!
//! ```no_run
//! use kmr::{EncodeParameters, encode, decode};
//!
//! # fn run(rgba: &[u8], width: u32, height: u32) -> kmr::Result<()> {
//! let bytes = encode(rgba, width, height, EncodeParameters::default())?;
//! let image = decode(&bytes)?;
//! assert_eq!(image.rgba, rgba);
//! # Ok(())
//! # }
//! ```
#![forbid(unsafe_code)]

pub mod container;
mod error;
pub mod huffman;
pub mod nodal;
pub mod paeth;
mod params;
mod pipeline;
pub mod pixel;
pub mod qoi;

pub use error::{Error, Result};
pub use params::EncodeParameters;
pub use pipeline::{decode, encode, encode_with_preview, DecodedImage, Image};
