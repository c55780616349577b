//! Orchestration of the full encode/decode pipeline (component F, §4.F) and
//! the public operations from §6.

use crate::container;
use crate::error::{Error, Result};
use crate::huffman;
use crate::nodal::{self, NodalGrid};
use crate::paeth;
use crate::params::EncodeParameters;
use crate::qoi;

/// An owned RGBA raster, as described by §3's `Image` entity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl Image {
    /// `true` if `rgba` has exactly `4 * width * height` bytes.
    pub fn len_ok(&self) -> bool {
        (self.width as u64) * (self.height as u64) * 4 == self.rgba.len() as u64
    }
}

/// The reconstructed image and parsed metadata returned by [`decode`]
/// (§6).
pub struct DecodedImage {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub block_size: u8,
    pub discard_bits: u8,
    pub smooth: bool,
    pub qoi_len: u32,
    /// Combined byte length of the three Huffman-coded nodal streams
    /// (`huf_y_len + huf_cb_len + huf_cr_len`).
    pub nodal_len: u32,
    pub total_len: u32,
    /// The decoded nodal skeleton, carried for inspection (§3: "Nodal
    /// streams are carried but not required to reconstruct pixels").
    pub nodes: NodalGrid,
}

const MAX_DIMENSION: u32 = i32::MAX as u32;

fn validate_dimensions(rgba: &[u8], width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(Error::dimension("width and height must both be strictly positive"));
    }
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(Error::dimension(format!("{}x{} exceeds the maximum supported dimension", width, height)));
    }
    let expected = (width as u64) * (height as u64) * 4;
    if rgba.len() as u64 != expected {
        return Err(Error::dimension(format!(
            "RGBA buffer is {} bytes, expected {}x{}x4 = {}",
            rgba.len(),
            width,
            height,
            expected
        )));
    }
    Ok(())
}

/// Every multi-byte section length in the container header is a `u32`
/// (§4.E). A section whose actual encoded length doesn't fit is a genuine
/// allocation failure against the format, not a bug to panic on.
fn section_len_fits(label: &str, len: usize) -> Result<()> {
    if u32::try_from(len).is_err() {
        return Err(Error::AllocationError(format!(
            "{label} section is {len} bytes, which does not fit the container's 32-bit length field"
        )));
    }
    Ok(())
}

/// Run B -> A -> (C, D x3) -> E over a source image and the preview that
/// the Paeth predictor should treat as authoritative.
fn build_container(
    src: &[u8], width: u32, height: u32, params: EncodeParameters, nodes: &NodalGrid, preview: &[u8],
) -> Result<Vec<u8>> {
    let residual = paeth::residual(src, preview, width as usize, height as usize);
    let qoi_bytes = qoi::encode(&residual, width, height)?;

    // The three nodal Huffman streams are independent pure functions over
    // owned buffers; computing them with `rayon::join` preserves the fixed
    // Y, Cb, Cr concatenation order regardless of which thread finishes
    // first (§5).
    let (huf_y, (huf_cb, huf_cr)) =
        rayon::join(|| huffman::encode(&nodes.y), || rayon::join(|| huffman::encode(&nodes.cb), || huffman::encode(&nodes.cr)));

    section_len_fits("QOI", qoi_bytes.len())?;
    section_len_fits("Huffman(Y)", huf_y.len())?;
    section_len_fits("Huffman(Cb)", huf_cb.len())?;
    section_len_fits("Huffman(Cr)", huf_cr.len())?;

    Ok(container::build(
        params.block_size,
        params.discard_bits,
        params.smooth,
        width,
        height,
        &qoi_bytes,
        &huf_y,
        &huf_cb,
        &huf_cr,
    ))
}

/// Encode an RGBA image into a KMR container (§6 operation 1).
pub fn encode(rgba: &[u8], width: u32, height: u32, params: EncodeParameters) -> Result<Vec<u8>> {
    validate_dimensions(rgba, width, height)?;

    let nodes = nodal::to_nodes(rgba, width, height, params.block_size, params.discard_bits);

    // §4.B: "If d = 0: the reconstruction is the original image (pixel
    // perfect; skeleton is diagnostic only)." The nodal skeleton above is
    // still the lossy block average — it is computed for the Huffman
    // streams regardless of `discard_bits` — but the preview fed to the
    // Paeth predictor is the source image itself whenever no bits are
    // discarded, which is what makes property 1 (lossless round trip at
    // `discard_bits = 0`) hold.
    let preview = if params.discard_bits == 0 {
        rgba.to_vec()
    } else {
        nodal::reconstruct_preview(&nodes, width, height, params.block_size, params.smooth)?
    };

    build_container(rgba, width, height, params, &nodes, &preview)
}

/// Encode an already-reconstructed preview as if it were the source image
/// (§8 property 2, "preview idempotence"): the preview is both the pixel
/// data fed to QOI/Paeth and the raster the nodal grid is derived from, so
/// `decode(encode_with_preview(preview, params)).rgba == preview` always,
/// independent of `discard_bits`.
pub fn encode_with_preview(preview_rgba: &[u8], width: u32, height: u32, params: EncodeParameters) -> Result<Vec<u8>> {
    validate_dimensions(preview_rgba, width, height)?;
    let nodes = nodal::to_nodes(preview_rgba, width, height, params.block_size, params.discard_bits);
    build_container(preview_rgba, width, height, params, &nodes, preview_rgba)
}

/// Decode a KMR container back into an RGBA image plus metadata (§6
/// operation 2).
pub fn decode(bytes: &[u8]) -> Result<DecodedImage> {
    let parsed = container::parse(bytes)?;
    let header = parsed.header;

    let (gw, gh) = nodal::grid_dims(header.width, header.height, header.block_size);
    let expected_nodal_len = (gw as usize) * (gh as usize);

    let (y_result, (cb_result, cr_result)) = rayon::join(
        || huffman::decode(parsed.huf_y, expected_nodal_len),
        || {
            rayon::join(
                || huffman::decode(parsed.huf_cb, expected_nodal_len),
                || huffman::decode(parsed.huf_cr, expected_nodal_len),
            )
        },
    );
    let nodes = NodalGrid { gw, gh, y: y_result?, cb: cb_result?, cr: cr_result? };

    let (qoi_header, residual_rgba) = qoi::decode(parsed.qoi)?;
    if qoi_header.width != header.width || qoi_header.height != header.height {
        return Err(Error::dimension(format!(
            "QOI stream declares {}x{} but the container header declares {}x{}",
            qoi_header.width, qoi_header.height, header.width, header.height
        )));
    }

    let rgba = paeth::inverse(&residual_rgba, header.width as usize, header.height as usize);

    Ok(DecodedImage {
        rgba,
        width: header.width,
        height: header.height,
        block_size: header.block_size,
        discard_bits: header.discard_bits,
        smooth: header.smooth,
        qoi_len: header.qoi_len,
        nodal_len: header.huf_y_len + header.huf_cb_len + header.huf_cr_len,
        total_len: bytes.len() as u32,
        nodes,
    })
}
