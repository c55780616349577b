//! The fixed-layout binary container (component E, §4.E).

use crate::error::{Error, Result};

const MAGIC: [u8; 4] = *b"KMR1";
const VERSION: u8 = 1;
pub const HEADER_SIZE: usize = 32;

/// The 32-byte header fields, already validated and clamped (§4.E table).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContainerHeader {
    pub block_size: u8,
    pub discard_bits: u8,
    pub smooth: bool,
    pub width: u32,
    pub height: u32,
    pub qoi_len: u32,
    pub huf_y_len: u32,
    pub huf_cb_len: u32,
    pub huf_cr_len: u32,
}

/// A parsed container: the header plus borrowed views into its four
/// sections, in the fixed order QOI, Huffman(Y), Huffman(Cb), Huffman(Cr).
pub struct ParsedContainer<'a> {
    pub header: ContainerHeader,
    pub qoi: &'a [u8],
    pub huf_y: &'a [u8],
    pub huf_cb: &'a [u8],
    pub huf_cr: &'a [u8],
}

/// Pack a header and four section buffers into a single container (§4.E).
///
/// `block_size` and `discard_bits` are written as given: callers are
/// expected to have already clamped them (`EncodeParameters` does this on
/// construction, per §6 "Clamping").
#[allow(clippy::too_many_arguments)]
pub fn build(
    block_size: u8, discard_bits: u8, smooth: bool, width: u32, height: u32, qoi: &[u8], huf_y: &[u8],
    huf_cb: &[u8], huf_cr: &[u8],
) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_SIZE + qoi.len() + huf_y.len() + huf_cb.len() + huf_cr.len());
    out.extend_from_slice(&MAGIC);
    out.push(VERSION);
    out.push(block_size);
    out.push(discard_bits);
    out.push(smooth as u8);
    out.extend_from_slice(&width.to_be_bytes());
    out.extend_from_slice(&height.to_be_bytes());
    out.extend_from_slice(&(qoi.len() as u32).to_be_bytes());
    out.extend_from_slice(&(huf_y.len() as u32).to_be_bytes());
    out.extend_from_slice(&(huf_cb.len() as u32).to_be_bytes());
    out.extend_from_slice(&(huf_cr.len() as u32).to_be_bytes());
    out.extend_from_slice(qoi);
    out.extend_from_slice(huf_y);
    out.extend_from_slice(huf_cb);
    out.extend_from_slice(huf_cr);
    out
}

/// Parse a container, validating the magic, version, and section lengths
/// (§4.E, §7 FormatError).
pub fn parse(bytes: &[u8]) -> Result<ParsedContainer<'_>> {
    if bytes.len() < HEADER_SIZE {
        return Err(Error::format(format!(
            "container is {} bytes, shorter than the {}-byte header",
            bytes.len(),
            HEADER_SIZE
        )));
    }

    if bytes[0..4] != MAGIC {
        return Err(Error::format("bad magic"));
    }
    let version = bytes[4];
    if version != VERSION {
        return Err(Error::format(format!("unsupported container version {}", version)));
    }

    let block_size = bytes[5];
    let discard_bits = bytes[6];
    let smooth = bytes[7] != 0;
    let width = u32::from_be_bytes(bytes[8..12].try_into().unwrap());
    let height = u32::from_be_bytes(bytes[12..16].try_into().unwrap());
    let qoi_len = u32::from_be_bytes(bytes[16..20].try_into().unwrap());
    let huf_y_len = u32::from_be_bytes(bytes[20..24].try_into().unwrap());
    let huf_cb_len = u32::from_be_bytes(bytes[24..28].try_into().unwrap());
    let huf_cr_len = u32::from_be_bytes(bytes[28..32].try_into().unwrap());

    let total = (HEADER_SIZE as u64)
        + qoi_len as u64
        + huf_y_len as u64
        + huf_cb_len as u64
        + huf_cr_len as u64;
    if total != bytes.len() as u64 {
        return Err(Error::format(format!(
            "section lengths (32 + {} + {} + {} + {} = {}) do not sum to the container length {}",
            qoi_len,
            huf_y_len,
            huf_cb_len,
            huf_cr_len,
            total,
            bytes.len()
        )));
    }

    let mut pos = HEADER_SIZE;
    let qoi = &bytes[pos..pos + qoi_len as usize];
    pos += qoi_len as usize;
    let huf_y = &bytes[pos..pos + huf_y_len as usize];
    pos += huf_y_len as usize;
    let huf_cb = &bytes[pos..pos + huf_cb_len as usize];
    pos += huf_cb_len as usize;
    let huf_cr = &bytes[pos..pos + huf_cr_len as usize];

    Ok(ParsedContainer {
        header: ContainerHeader {
            block_size,
            discard_bits,
            smooth,
            width,
            height,
            qoi_len,
            huf_y_len,
            huf_cb_len,
            huf_cr_len,
        },
        qoi,
        huf_y,
        huf_cb,
        huf_cr,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_header_and_sections() {
        let qoi = vec![1u8, 2, 3];
        let huf_y = vec![4u8, 5];
        let huf_cb = vec![6u8];
        let huf_cr = vec![7u8, 8, 9, 10];

        let bytes = build(8, 2, true, 640, 480, &qoi, &huf_y, &huf_cb, &huf_cr);
        assert_eq!(bytes.len(), HEADER_SIZE + qoi.len() + huf_y.len() + huf_cb.len() + huf_cr.len());

        let parsed = parse(&bytes).unwrap();
        assert_eq!(parsed.header.block_size, 8);
        assert_eq!(parsed.header.discard_bits, 2);
        assert!(parsed.header.smooth);
        assert_eq!(parsed.header.width, 640);
        assert_eq!(parsed.header.height, 480);
        assert_eq!(parsed.qoi, &qoi[..]);
        assert_eq!(parsed.huf_y, &huf_y[..]);
        assert_eq!(parsed.huf_cb, &huf_cb[..]);
        assert_eq!(parsed.huf_cr, &huf_cr[..]);
    }

    #[test]
    fn rejects_bad_magic_matches_spec_scenario_s5() {
        let bytes = build(8, 0, false, 1, 1, &[0u8; 14 + 8], &[], &[], &[]);
        let mut flipped = bytes;
        flipped[0] = b'X';
        assert!(matches!(parse(&flipped), Err(Error::FormatError(_))));
    }

    #[test]
    fn rejects_inconsistent_section_lengths() {
        let mut bytes = build(8, 0, false, 1, 1, &[1, 2, 3], &[], &[], &[]);
        // Declare a QOI length one byte larger than what's actually present.
        bytes[19] += 1;
        assert!(matches!(parse(&bytes), Err(Error::FormatError(_))));
    }

    #[test]
    fn rejects_truncated_header() {
        let bytes = vec![0u8; HEADER_SIZE - 1];
        assert!(matches!(parse(&bytes), Err(Error::FormatError(_))));
    }
}
