//! The QOI byte codec (component C, §4.C).
//!
//! KMR always runs QOI in its 4-channel, sRGB-colorspace configuration over
//! the residual image, so this module hard-codes `channels = 4,
//! colorspace = 0` rather than supporting QOI's full channel/colorspace
//! matrix the way a general-purpose QOI crate would.

use crate::error::{Error, Result};
use crate::pixel::Rgba;

pub(crate) const QOI_OP_INDEX: u8 = 0x00; /* 00xxxxxx */
pub(crate) const QOI_OP_DIFF: u8 = 0x40; /* 01xxxxxx */
pub(crate) const QOI_OP_LUMA: u8 = 0x80; /* 10xxxxxx */
pub(crate) const QOI_OP_RUN: u8 = 0xc0; /* 11xxxxxx */
pub(crate) const QOI_OP_RGB: u8 = 0xfe; /* 11111110 */
pub(crate) const QOI_OP_RGBA: u8 = 0xff; /* 11111111 */

const QOI_MAGIC: u32 = u32::from_be_bytes(*b"qoif");
const QOI_HEADER_SIZE: usize = 14;
const QOI_PADDING: usize = 8;
const QOI_END_MARKER: [u8; 8] = [0, 0, 0, 0, 0, 0, 0, 1];

/// Upper bound on the number of bytes `encode` can produce for a `width *
/// height` RGBA image (§5: "QOI's worst-case encoded size is
/// `14 + 5*W*H + 8`").
pub fn encoded_size_limit(width: u32, height: u32) -> usize {
    QOI_HEADER_SIZE + (width as usize) * (height as usize) * 5 + QOI_PADDING
}

/// Encode an RGBA raster into the QOI byte format.
///
/// `rgba` must have length `4 * width * height`; this is the caller's
/// responsibility per §4.A-style pure-function contracts, but is checked
/// here since `encode` is itself a public-boundary operation (§7).
pub fn encode(rgba: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let expected = (width as usize)
        .checked_mul(height as usize)
        .and_then(|px| px.checked_mul(4))
        .ok_or_else(|| Error::dimension("width * height * 4 overflows usize"))?;
    if rgba.len() != expected {
        return Err(Error::dimension(format!(
            "QOI input length {} does not match {}x{}x4 = {}",
            rgba.len(),
            width,
            height,
            expected
        )));
    }

    let mut out = Vec::with_capacity(encoded_size_limit(width, height));
    out.extend_from_slice(&QOI_MAGIC.to_be_bytes());
    out.extend_from_slice(&width.to_be_bytes());
    out.extend_from_slice(&height.to_be_bytes());
    out.push(4); // channels
    out.push(0); // colorspace

    let mut index = [Rgba::new(); 64];
    let mut px_prev = Rgba::new_opaque();
    let mut run: u32 = 0;

    let n_pixels = (width as usize) * (height as usize);
    let mut i = 0usize;

    for chunk in rgba.chunks_exact(4) {
        let px = Rgba::read(chunk);
        if px == px_prev {
            run += 1;
            if run == 62 || i == n_pixels - 1 {
                out.push(QOI_OP_RUN | (run - 1) as u8);
                run = 0;
            }
        } else {
            if run != 0 {
                out.push(QOI_OP_RUN | (run - 1) as u8);
                run = 0;
            }

            let hash = px.hash();
            let slot = &mut index[hash as usize];
            if *slot == px {
                out.push(QOI_OP_INDEX | hash);
            } else {
                *slot = px;
                if px.a() == px_prev.a() {
                    let v = px.var(&px_prev);
                    if let Some(diff) = v.diff() {
                        out.push(diff);
                    } else if let Some([lu, ma]) = v.luma() {
                        out.push(lu);
                        out.push(ma);
                    } else {
                        out.push(QOI_OP_RGB);
                        out.push(px.r());
                        out.push(px.g());
                        out.push(px.b());
                    }
                } else {
                    out.push(QOI_OP_RGBA);
                    out.push(px.r());
                    out.push(px.g());
                    out.push(px.b());
                    out.push(px.a());
                }
            }
            px_prev = px;
        }
        i += 1;
    }

    out.extend_from_slice(&QOI_END_MARKER);
    Ok(out)
}

/// Metadata recovered from a QOI header.
pub struct Header {
    pub width: u32,
    pub height: u32,
}

/// Decode a QOI byte stream back into an RGBA raster.
///
/// Returns the recovered width/height (read from the stream's own header)
/// together with the pixel buffer, so callers can check it against an
/// externally-declared size (§7 DimensionError: "QOI-reported dimensions
/// != container-declared dimensions").
pub fn decode(bytes: &[u8]) -> Result<(Header, Vec<u8>)> {
    if bytes.len() < QOI_HEADER_SIZE + QOI_PADDING {
        return Err(Error::format("QOI stream shorter than header + end marker"));
    }

    let magic = u32::from_be_bytes(bytes[0..4].try_into().unwrap());
    if magic != QOI_MAGIC {
        return Err(Error::format("QOI stream has the wrong magic bytes"));
    }
    let width = u32::from_be_bytes(bytes[4..8].try_into().unwrap());
    let height = u32::from_be_bytes(bytes[8..12].try_into().unwrap());
    let channels = bytes[12];
    if channels != 4 {
        return Err(Error::format(format!("QOI stream declares {} channels, expected 4", channels)));
    }

    let n_pixels = (width as usize) * (height as usize);
    let mut out = vec![0_u8; n_pixels * 4];

    let mut index = [Rgba::new(); 64];
    let mut px = Rgba::new_opaque();
    let mut rest = &bytes[QOI_HEADER_SIZE..];
    let mut run: u32 = 0;

    for out_px in out.chunks_exact_mut(4) {
        if run > 0 {
            run -= 1;
        } else {
            match *rest {
                [tag @ 0b0000_0000..=0b0011_1111, ref tail @ ..] => {
                    px = index[tag as usize];
                    rest = tail;
                }
                [tag @ 0b0100_0000..=0b0111_1111, ref tail @ ..] => {
                    let dr = ((tag >> 4) & 0x03).wrapping_sub(2);
                    let dg = ((tag >> 2) & 0x03).wrapping_sub(2);
                    let db = (tag & 0x03).wrapping_sub(2);
                    px.add_rgb(dr, dg, db);
                    rest = tail;
                }
                [tag @ 0b1000_0000..=0b1011_1111, b2, ref tail @ ..] => {
                    let dg = (tag & 0x3f).wrapping_sub(32);
                    let dr = ((b2 >> 4) & 0x0f).wrapping_sub(8).wrapping_add(dg);
                    let db = (b2 & 0x0f).wrapping_sub(8).wrapping_add(dg);
                    px.add_rgb(dr, dg, db);
                    rest = tail;
                }
                [QOI_OP_RGB, r, g, b, ref tail @ ..] => {
                    px.set_rgb(r, g, b);
                    rest = tail;
                }
                [QOI_OP_RGBA, r, g, b, a, ref tail @ ..] => {
                    px.set_rgba(r, g, b, a);
                    rest = tail;
                }
                [tag @ 0b1100_0000..=0b1111_1101, ref tail @ ..] => {
                    run = (tag & 0x3f) as u32;
                    rest = tail;
                }
                _ => return Err(Error::format("QOI stream ended mid-pixel")),
            }
            index[px.hash() as usize] = px;
        }
        out_px.copy_from_slice(&px.rgba);
    }

    Ok((Header { width, height }, out))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solid_2x2_red_matches_spec_scenario_s1() {
        let px = [255u8, 0, 0, 255];
        let rgba: Vec<u8> = px.iter().copied().cycle().take(16).collect();
        let stream = encode(&rgba, 2, 2).unwrap();

        assert_eq!(&stream[0..4], b"qoif");
        assert_eq!(u32::from_be_bytes(stream[4..8].try_into().unwrap()), 2);
        assert_eq!(u32::from_be_bytes(stream[8..12].try_into().unwrap()), 2);
        assert_eq!(stream[12], 4);
        assert_eq!(stream[13], 0);
        assert_eq!(&stream[14..18], &[QOI_OP_RGB, 255, 0, 0]);
        assert_eq!(stream[18], QOI_OP_RUN | 2);
        assert_eq!(&stream[19..27], &[0, 0, 0, 0, 0, 0, 0, 1]);

        let (header, decoded) = decode(&stream).unwrap();
        assert_eq!(header.width, 2);
        assert_eq!(header.height, 2);
        assert_eq!(decoded, rgba);
    }

    #[test]
    fn round_trips_a_gradient() {
        let rgba = vec![
            0, 0, 0, 255, //
            64, 64, 64, 255, //
            128, 128, 128, 255, //
            255, 255, 255, 255,
        ];
        let stream = encode(&rgba, 2, 2).unwrap();
        let (_, decoded) = decode(&stream).unwrap();
        assert_eq!(decoded, rgba);
    }

    #[test]
    fn rejects_wrong_magic() {
        let rgba = vec![0u8; 4 * 4];
        let mut stream = encode(&rgba, 2, 2).unwrap();
        stream[0] = b'X';
        assert!(matches!(decode(&stream), Err(Error::FormatError(_))));
    }

    #[test]
    fn rejects_mismatched_input_length() {
        let rgba = vec![0u8; 3];
        assert!(matches!(encode(&rgba, 2, 2), Err(Error::DimensionError(_))));
    }
}
