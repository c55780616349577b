//! Property-based tests for the seven round-trip invariants the codec is
//! expected to hold (lossless encode/decode, preview idempotence, Paeth
//! invertibility, QOI round trip, Huffman round trip, container length, and
//! nodal grid sizing).

use kmr::{container, huffman, nodal, paeth, qoi};
use proptest::prelude::*;

fn rgba_image(max_w: u32, max_h: u32) -> impl Strategy<Value = (u32, u32, Vec<u8>)> {
    (1..=max_w, 1..=max_h).prop_flat_map(|(w, h)| {
        let len = (w * h * 4) as usize;
        (Just(w), Just(h), prop::collection::vec(any::<u8>(), len))
    })
}

proptest! {
    #[test]
    fn lossless_round_trip((width, height, rgba) in rgba_image(12, 12), block_size in 2u8..=16) {
        let params = kmr::EncodeParameters::new(block_size, 0, true);
        let bytes = kmr::encode(&rgba, width, height, params).unwrap();
        let decoded = kmr::decode(&bytes).unwrap();
        prop_assert_eq!(decoded.rgba, rgba);
    }

    #[test]
    fn preview_idempotence((width, height, preview) in rgba_image(12, 12), block_size in 2u8..=16, discard_bits in 0u8..=6) {
        let params = kmr::EncodeParameters::new(block_size, discard_bits, true);
        let bytes = kmr::encode_with_preview(&preview, width, height, params).unwrap();
        let decoded = kmr::decode(&bytes).unwrap();
        prop_assert_eq!(decoded.rgba, preview);
    }

    #[test]
    fn paeth_is_invertible((width, height, rgba) in rgba_image(10, 10)) {
        let w = width as usize;
        let h = height as usize;
        let residual = paeth::residual(&rgba, &rgba, w, h);
        let back = paeth::inverse(&residual, w, h);
        prop_assert_eq!(back, rgba);
    }

    #[test]
    fn qoi_round_trips((width, height, rgba) in rgba_image(10, 10)) {
        let encoded = qoi::encode(&rgba, width, height).unwrap();
        let (header, decoded) = qoi::decode(&encoded).unwrap();
        prop_assert_eq!(header.width, width);
        prop_assert_eq!(header.height, height);
        prop_assert_eq!(decoded, rgba);
    }

    #[test]
    fn huffman_round_trips(values in prop::collection::vec(any::<u8>(), 0..500)) {
        let encoded = huffman::encode(&values);
        let decoded = huffman::decode(&encoded, values.len()).unwrap();
        prop_assert_eq!(decoded, values);
    }

    #[test]
    fn container_length_matches_section_sum((width, height, rgba) in rgba_image(8, 8), block_size in 2u8..=8, discard_bits in 0u8..=6) {
        let params = kmr::EncodeParameters::new(block_size, discard_bits, true);
        let bytes = kmr::encode(&rgba, width, height, params).unwrap();
        let parsed = container::parse(&bytes).unwrap();
        let expected = container::HEADER_SIZE as u32
            + parsed.header.qoi_len
            + parsed.header.huf_y_len
            + parsed.header.huf_cb_len
            + parsed.header.huf_cr_len;
        prop_assert_eq!(bytes.len() as u32, expected);
    }

    #[test]
    fn grid_size_matches_ceiling_division(width in 1u32..2000, height in 1u32..2000, block_size in 2u8..=255) {
        let (gw, gh) = nodal::grid_dims(width, height, block_size);
        let b = nodal::effective_block_size(block_size) as u32;
        prop_assert_eq!(gw, (width + b - 1) / b);
        prop_assert_eq!(gh, (height + b - 1) / b);
    }
}
