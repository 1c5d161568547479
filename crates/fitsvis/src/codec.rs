//! FITS byte-stream decode and encode for image HDUs.
//!
//! Handles the 2880-byte block layout, big-endian pixel payloads, plane
//! splitting for degenerate cubes, and gzip-compressed sources. Table
//! extensions are skipped over, not decoded; this is a raster pipeline.

use alloc::vec;
use alloc::vec::Vec;

use bytemuck::pod_collect_to_vec;
use log::debug;

use crate::card::{format_card, format_end_card, parse_card, Card, Value};
use crate::error::{Error, Result};
use crate::header::Header;
use crate::image::FitsImage;
use crate::pixels::{bytes_per_pixel, PixelData};

/// FITS block size in bytes (each logical record is one block).
pub const BLOCK_SIZE: usize = 2880;

/// FITS card (keyword record) size in bytes.
pub const CARD_SIZE: usize = 80;

/// Number of cards that fit in a single block.
pub const CARDS_PER_BLOCK: usize = BLOCK_SIZE / CARD_SIZE;

/// Returns the number of FITS blocks required to hold `num_bytes` bytes.
pub const fn blocks_needed(num_bytes: usize) -> usize {
    if num_bytes == 0 {
        return 0;
    }
    num_bytes.div_ceil(BLOCK_SIZE)
}

/// Returns the total byte length (in whole blocks) required for `num_bytes`.
pub const fn padded_byte_len(num_bytes: usize) -> usize {
    blocks_needed(num_bytes) * BLOCK_SIZE
}

// ── Header blocks ──

/// Parse consecutive header blocks until the END card.
///
/// Returns the cards (END excluded) and the number of bytes consumed,
/// always a multiple of [`BLOCK_SIZE`].
pub fn parse_header_blocks(data: &[u8]) -> Result<(Vec<Card>, usize)> {
    if data.len() < BLOCK_SIZE {
        return Err(Error::UnexpectedEof);
    }

    let mut cards = Vec::new();
    let num_blocks = data.len() / BLOCK_SIZE;

    for block_idx in 0..num_blocks {
        for card_idx in 0..CARDS_PER_BLOCK {
            let start = block_idx * BLOCK_SIZE + card_idx * CARD_SIZE;
            let card_bytes: &[u8; CARD_SIZE] = data[start..start + CARD_SIZE]
                .try_into()
                .map_err(|_| Error::InvalidHeader("short card"))?;
            let card = parse_card(card_bytes)?;
            if card.is_end() {
                return Ok((cards, (block_idx + 1) * BLOCK_SIZE));
            }
            cards.push(card);
        }
    }

    Err(Error::UnexpectedEof)
}

/// Serialize header cards into complete blocks, appending END and padding
/// the final block with blank cards.
pub fn serialize_header(cards: &[Card]) -> Vec<u8> {
    let total_cards = cards.len() + 1; // +1 for END
    let total_bytes = total_cards.div_ceil(CARDS_PER_BLOCK) * BLOCK_SIZE;

    let mut buf = vec![b' '; total_bytes];
    for (i, card) in cards.iter().enumerate() {
        buf[i * CARD_SIZE..(i + 1) * CARD_SIZE].copy_from_slice(&format_card(card));
    }
    let end_offset = cards.len() * CARD_SIZE;
    buf[end_offset..end_offset + CARD_SIZE].copy_from_slice(&format_end_card());
    buf
}

// ── gzip ──

/// Whether the byte stream starts with the gzip magic.
pub fn is_gzipped(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0x1f && data[1] == 0x8b
}

/// Strip the gzip header and trailer, returning the raw deflate payload.
fn strip_gzip_header(data: &[u8]) -> Result<&[u8]> {
    if data.len() < 18 || data[0] != 0x1f || data[1] != 0x8b || data[2] != 0x08 {
        return Err(Error::Decompression);
    }
    let flg = data[3];
    let mut pos = 10usize;
    if flg & 0x04 != 0 {
        // FEXTRA
        if pos + 2 > data.len() {
            return Err(Error::Decompression);
        }
        let xlen = u16::from_le_bytes([data[pos], data[pos + 1]]) as usize;
        pos += 2 + xlen;
    }
    if flg & 0x08 != 0 {
        // FNAME: skip null-terminated string
        while pos < data.len() && data[pos] != 0 {
            pos += 1;
        }
        pos += 1;
    }
    if flg & 0x10 != 0 {
        // FCOMMENT
        while pos < data.len() && data[pos] != 0 {
            pos += 1;
        }
        pos += 1;
    }
    if flg & 0x02 != 0 {
        // FHCRC
        pos += 2;
    }
    if pos >= data.len() || data.len() < pos + 8 {
        return Err(Error::Decompression);
    }
    // Strip the 8-byte trailer (CRC32 + ISIZE)
    Ok(&data[pos..data.len() - 8])
}

/// Inflate a gzip-compressed byte stream.
pub fn gunzip(data: &[u8]) -> Result<Vec<u8>> {
    let payload = strip_gzip_header(data)?;
    miniz_oxide::inflate::decompress_to_vec(payload).map_err(|_| Error::Decompression)
}

// ── Decode ──

/// The per-HDU data segment length in bytes (unpadded).
fn data_byte_len(header: &Header, is_primary: bool) -> Result<usize> {
    let bitpix = header
        .get_integer("BITPIX")
        .ok_or(Error::MissingKeyword("BITPIX"))?;
    let naxis = header
        .get_integer("NAXIS")
        .ok_or(Error::MissingKeyword("NAXIS"))?;
    if naxis <= 0 {
        return Ok(0);
    }

    let bytes_per_value = (bitpix.unsigned_abs() as usize) / 8;
    let mut pixels: usize = 1;
    for i in 1..=naxis {
        let dim = header
            .get_integer(&alloc::format!("NAXIS{i}"))
            .ok_or(Error::MissingKeyword("NAXISn"))?;
        if dim < 0 {
            return Err(Error::InvalidHeader("negative axis length"));
        }
        pixels = pixels
            .checked_mul(dim as usize)
            .ok_or(Error::InvalidHeader("pixel count overflow"))?;
    }

    let pcount = if is_primary {
        0
    } else {
        header.get_integer("PCOUNT").unwrap_or(0).max(0) as usize
    };
    let gcount = if is_primary {
        1
    } else {
        header.get_integer("GCOUNT").unwrap_or(1).max(1) as usize
    };

    pixels
        .checked_mul(bytes_per_value)
        .and_then(|n| n.checked_add(pcount))
        .and_then(|n| n.checked_mul(gcount))
        .ok_or(Error::InvalidHeader("data size overflow"))
}

/// Decode a contiguous big-endian byte slice into typed pixels.
///
/// Big-endian bytes are collected into a properly-aligned typed vector and
/// byte-swapped to native order element by element.
fn decode_pixels(raw: &[u8], bitpix: i64) -> Result<PixelData> {
    match bitpix {
        8 => Ok(PixelData::U8(raw.to_vec())),
        16 => {
            let mut pixels: Vec<i16> = pod_collect_to_vec(raw);
            for v in &mut pixels {
                *v = i16::from_be(*v);
            }
            Ok(PixelData::I16(pixels))
        }
        32 => {
            let mut pixels: Vec<i32> = pod_collect_to_vec(raw);
            for v in &mut pixels {
                *v = i32::from_be(*v);
            }
            Ok(PixelData::I32(pixels))
        }
        -32 => {
            let mut pixels: Vec<f32> = pod_collect_to_vec(raw);
            for v in &mut pixels {
                *v = f32::from_bits(u32::from_be(v.to_bits()));
            }
            Ok(PixelData::F32(pixels))
        }
        -64 => {
            let mut pixels: Vec<f64> = pod_collect_to_vec(raw);
            for v in &mut pixels {
                *v = f64::from_bits(u64::from_be(v.to_bits()));
            }
            Ok(PixelData::F64(pixels))
        }
        other => Err(Error::UnsupportedBitpix(other)),
    }
}

/// Whether this HDU carries image data the pipeline can raster.
fn is_image_hdu(header: &Header, is_first: bool) -> bool {
    if is_first {
        return true; // primary HDU; may still have no data
    }
    header
        .get_string("XTENSION")
        .map(|x| x.trim() == "IMAGE")
        .unwrap_or(false)
}

/// Split one image HDU into per-plane [`FitsImage`]s.
///
/// A 2-D HDU yields one image. Cube HDUs yield one image per plane, each
/// with a cloned header whose NAXIS3/NAXIS4 are rewritten to 1 so every
/// produced image describes exactly the plane it holds.
fn split_planes(header: &Header, raw: &[u8], out: &mut Vec<FitsImage>) -> Result<()> {
    let bitpix = header
        .get_integer("BITPIX")
        .ok_or(Error::MissingKeyword("BITPIX"))?;
    let bpp = bytes_per_pixel(bitpix)?;
    let naxis1 = header.get_integer("NAXIS1").unwrap_or(0).max(0) as usize;
    let naxis2 = header.get_integer("NAXIS2").unwrap_or(0).max(0) as usize;
    let plane_len = naxis1 * naxis2;
    if plane_len == 0 {
        return Ok(());
    }

    let planes = raw.len() / (plane_len * bpp);
    if planes == 0 {
        return Err(Error::UnexpectedEof);
    }
    if planes > 1 {
        debug!("splitting cube into {planes} planes of {naxis1}x{naxis2}");
    }

    for p in 0..planes {
        let start = p * plane_len * bpp;
        let pixels = decode_pixels(&raw[start..start + plane_len * bpp], bitpix)?;

        let mut plane_header = header.clone();
        if plane_header.contains("NAXIS3") {
            plane_header.set_integer("NAXIS3", 1);
        }
        if plane_header.contains("NAXIS4") {
            plane_header.set_integer("NAXIS4", 1);
        }
        out.push(FitsImage::from_parts(plane_header, pixels, p)?);
    }
    Ok(())
}

/// Decode a FITS byte stream into one [`FitsImage`] per image plane.
///
/// The primary HDU and IMAGE extensions are decoded; other extension types
/// are skipped. Fails when the stream contains no image data at all.
pub fn decode(data: &[u8]) -> Result<Vec<FitsImage>> {
    if data.len() < BLOCK_SIZE {
        return Err(Error::UnexpectedEof);
    }

    let mut images = Vec::new();
    let mut offset = 0usize;
    let mut first = true;

    while offset + BLOCK_SIZE <= data.len() {
        let remaining = &data[offset..];
        let (cards, header_len) = match parse_header_blocks(remaining) {
            Ok(parsed) => parsed,
            // Trailing garbage after at least one complete HDU is tolerated.
            Err(_) if !first => break,
            Err(e) => return Err(e),
        };
        let header = Header::from_cards(cards);

        if first && header.cards().first().map(|c| c.keyword_str()) != Some("SIMPLE") {
            return Err(Error::InvalidHeader("first HDU must be primary"));
        }

        let data_len = data_byte_len(&header, first)?;
        let data_start = offset + header_len;
        if data_len > 0 && data_start + data_len > data.len() {
            return Err(Error::UnexpectedEof);
        }

        if is_image_hdu(&header, first) {
            split_planes(&header, &data[data_start..data_start + data_len], &mut images)?;
        } else {
            debug!(
                "skipping non-image extension {:?}",
                header.get_string("XTENSION").unwrap_or("?")
            );
        }

        offset = data_start + padded_byte_len(data_len);
        first = false;
    }

    if images.is_empty() {
        return Err(Error::InvalidHeader("no image data in FITS stream"));
    }
    Ok(images)
}

// ── Encode ──

/// Serialize one pixel plane into big-endian, block-padded FITS data.
pub fn serialize_pixels(data: &PixelData) -> Vec<u8> {
    let raw_len = data.len() * data.bytes_per_sample();
    let mut buf = Vec::with_capacity(padded_byte_len(raw_len));
    match data {
        PixelData::U8(v) => buf.extend_from_slice(v),
        PixelData::I16(v) => {
            for &x in v {
                buf.extend_from_slice(&x.to_be_bytes());
            }
        }
        PixelData::I32(v) => {
            for &x in v {
                buf.extend_from_slice(&x.to_be_bytes());
            }
        }
        PixelData::F32(v) => {
            for &x in v {
                buf.extend_from_slice(&x.to_be_bytes());
            }
        }
        PixelData::F64(v) => {
            for &x in v {
                buf.extend_from_slice(&x.to_be_bytes());
            }
        }
    }
    buf.resize(padded_byte_len(raw_len), 0);
    buf
}

/// Keywords owned by the encoder; copies in the stored header are dropped
/// so the emitted structural cards cannot be contradicted.
const STRUCTURAL_KEYS: [&str; 10] = [
    "SIMPLE", "XTENSION", "BITPIX", "NAXIS", "NAXIS1", "NAXIS2", "NAXIS3", "NAXIS4", "PCOUNT",
    "GCOUNT",
];

fn structural_cards(image: &FitsImage, primary: bool) -> Vec<Card> {
    let mut cards = Vec::new();
    if primary {
        cards.push(Card::new("SIMPLE", Value::Logical(true)));
    } else {
        cards.push(Card::new(
            "XTENSION",
            Value::String(alloc::string::String::from("IMAGE")),
        ));
    }
    cards.push(Card::new("BITPIX", Value::Integer(image.mini().bitpix)));
    cards.push(Card::new("NAXIS", Value::Integer(2)));
    cards.push(Card::new(
        "NAXIS1",
        Value::Integer(image.width() as i64),
    ));
    cards.push(Card::new(
        "NAXIS2",
        Value::Integer(image.height() as i64),
    ));
    if !primary {
        cards.push(Card::new("PCOUNT", Value::Integer(0)));
        cards.push(Card::new("GCOUNT", Value::Integer(1)));
    }
    cards
}

/// Encode images back into a FITS byte stream: the first as the primary
/// HDU, the rest as IMAGE extensions.
///
/// Structural keywords are re-derived from each image's actual shape; all
/// remaining header cards are carried through in order.
pub fn encode(images: &[FitsImage]) -> Result<Vec<u8>> {
    if images.is_empty() {
        return Err(Error::InvalidHeader("nothing to encode"));
    }

    let mut out = Vec::new();
    for (i, image) in images.iter().enumerate() {
        let mut cards = structural_cards(image, i == 0);
        for card in image.header().iter() {
            if !STRUCTURAL_KEYS.contains(&card.keyword_str()) {
                cards.push(card.clone());
            }
        }
        out.extend_from_slice(&serialize_header(&cards));
        out.extend_from_slice(&serialize_pixels(image.pixels()));
    }
    Ok(out)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::String;

    fn image_cards(bitpix: i64, dims: &[usize]) -> Vec<Card> {
        let mut cards = vec![
            Card::new("SIMPLE", Value::Logical(true)),
            Card::new("BITPIX", Value::Integer(bitpix)),
            Card::new("NAXIS", Value::Integer(dims.len() as i64)),
        ];
        for (i, &d) in dims.iter().enumerate() {
            cards.push(Card::new(
                &alloc::format!("NAXIS{}", i + 1),
                Value::Integer(d as i64),
            ));
        }
        cards
    }

    fn build_fits(cards: &[Card], data: &[u8]) -> Vec<u8> {
        let mut out = serialize_header(cards);
        let start = out.len();
        out.resize(start + padded_byte_len(data.len()), 0);
        out[start..start + data.len()].copy_from_slice(data);
        out
    }

    fn be_i16(values: &[i16]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_be_bytes()).collect()
    }

    #[test]
    fn block_math() {
        assert_eq!(blocks_needed(0), 0);
        assert_eq!(blocks_needed(1), 1);
        assert_eq!(blocks_needed(2880), 1);
        assert_eq!(blocks_needed(2881), 2);
        assert_eq!(padded_byte_len(100), 2880);
    }

    #[test]
    fn header_roundtrip_through_blocks() {
        let cards = image_cards(16, &[3, 2]);
        let bytes = serialize_header(&cards);
        assert_eq!(bytes.len(), BLOCK_SIZE);
        let (parsed, consumed) = parse_header_blocks(&bytes).unwrap();
        assert_eq!(consumed, BLOCK_SIZE);
        assert_eq!(parsed.len(), cards.len());
        assert_eq!(parsed[1].value, Some(Value::Integer(16)));
    }

    #[test]
    fn header_without_end_errors() {
        let data = vec![b' '; BLOCK_SIZE];
        // All-blank cards, no END anywhere.
        assert!(matches!(
            parse_header_blocks(&data),
            Err(Error::UnexpectedEof)
        ));
    }

    #[test]
    fn decode_i16_2d() {
        let fits = build_fits(&image_cards(16, &[3, 2]), &be_i16(&[1, 2, 3, 4, 5, 6]));
        let images = decode(&fits).unwrap();
        assert_eq!(images.len(), 1);
        let img = &images[0];
        assert_eq!((img.width(), img.height()), (3, 2));
        assert_eq!(img.pixels(), &PixelData::I16(vec![1, 2, 3, 4, 5, 6]));
    }

    #[test]
    fn decode_f32_preserves_values() {
        let raw: Vec<u8> = [0.5f32, -1.25, f32::NAN]
            .iter()
            .flat_map(|v| v.to_be_bytes())
            .collect();
        let fits = build_fits(&image_cards(-32, &[3, 1]), &raw);
        let images = decode(&fits).unwrap();
        match images[0].pixels() {
            PixelData::F32(v) => {
                assert_eq!(v[0], 0.5);
                assert_eq!(v[1], -1.25);
                assert!(v[2].is_nan());
            }
            other => panic!("expected F32, got {:?}", other),
        }
    }

    #[test]
    fn decode_rejects_bitpix_64() {
        let fits = build_fits(&image_cards(64, &[2, 1]), &[0u8; 16]);
        assert!(matches!(decode(&fits), Err(Error::UnsupportedBitpix(64))));
    }

    #[test]
    fn decode_splits_degenerate_cube() {
        let mut cards = image_cards(16, &[2, 2, 3]);
        cards.push(Card::new("OBJECT", Value::String(String::from("cube"))));
        let values: Vec<i16> = (0..12).collect();
        let fits = build_fits(&cards, &be_i16(&values));
        let images = decode(&fits).unwrap();
        assert_eq!(images.len(), 3);
        for (p, img) in images.iter().enumerate() {
            assert_eq!(img.plane_index(), p);
            assert_eq!(img.header().get_integer("NAXIS3"), Some(1));
            let expected: Vec<i16> = (p as i16 * 4..p as i16 * 4 + 4).collect();
            assert_eq!(img.pixels(), &PixelData::I16(expected));
        }
    }

    #[test]
    fn decode_skips_table_extension() {
        let primary = build_fits(&image_cards(8, &[2, 2]), &[9u8; 4]);
        let mut table_cards = vec![
            Card::new("XTENSION", Value::String(String::from("BINTABLE"))),
            Card::new("BITPIX", Value::Integer(8)),
            Card::new("NAXIS", Value::Integer(2)),
            Card::new("NAXIS1", Value::Integer(8)),
            Card::new("NAXIS2", Value::Integer(4)),
            Card::new("PCOUNT", Value::Integer(0)),
            Card::new("GCOUNT", Value::Integer(1)),
        ];
        table_cards.push(Card::new("TFIELDS", Value::Integer(1)));
        let table = build_fits(&table_cards, &[0u8; 32]);

        let mut fits = primary;
        fits.extend_from_slice(&table);
        let images = decode(&fits).unwrap();
        assert_eq!(images.len(), 1);
    }

    #[test]
    fn decode_image_extension_after_bare_primary() {
        let primary = serialize_header(&image_cards(8, &[]));
        let mut ext_cards = vec![
            Card::new("XTENSION", Value::String(String::from("IMAGE"))),
            Card::new("BITPIX", Value::Integer(16)),
            Card::new("NAXIS", Value::Integer(2)),
            Card::new("NAXIS1", Value::Integer(2)),
            Card::new("NAXIS2", Value::Integer(1)),
            Card::new("PCOUNT", Value::Integer(0)),
            Card::new("GCOUNT", Value::Integer(1)),
        ];
        ext_cards.push(Card::new("EXTNAME", Value::String(String::from("SCI"))));
        let ext = build_fits(&ext_cards, &be_i16(&[7, 8]));

        let mut fits = primary;
        fits.extend_from_slice(&ext);
        let images = decode(&fits).unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].pixels(), &PixelData::I16(vec![7, 8]));
        assert_eq!(images[0].header().get_string("EXTNAME"), Some("SCI"));
    }

    #[test]
    fn decode_errors_without_any_image() {
        let fits = serialize_header(&image_cards(8, &[]));
        assert!(matches!(decode(&fits), Err(Error::InvalidHeader(_))));
    }

    #[test]
    fn decode_errors_on_truncated_data() {
        let cards = image_cards(16, &[100, 100]);
        let mut fits = serialize_header(&cards);
        fits.resize(fits.len() + BLOCK_SIZE, 0); // far too little data
        assert!(matches!(decode(&fits), Err(Error::UnexpectedEof)));
    }

    #[test]
    fn decode_requires_primary_first() {
        let cards = vec![
            Card::new("XTENSION", Value::String(String::from("IMAGE"))),
            Card::new("BITPIX", Value::Integer(8)),
            Card::new("NAXIS", Value::Integer(0)),
        ];
        let fits = serialize_header(&cards);
        assert!(matches!(decode(&fits), Err(Error::InvalidHeader(_))));
    }

    #[test]
    fn encode_decode_pixel_roundtrip() {
        let fits = build_fits(&image_cards(16, &[3, 2]), &be_i16(&[10, -20, 30, -40, 50, -60]));
        let images = decode(&fits).unwrap();
        let encoded = encode(&images).unwrap();
        let again = decode(&encoded).unwrap();
        assert_eq!(images[0].pixels(), again[0].pixels());
        assert_eq!(encoded.len() % BLOCK_SIZE, 0);
    }

    #[test]
    fn encode_carries_wcs_cards() {
        let mut cards = image_cards(-32, &[2, 2]);
        cards.push(Card::new("CRPIX1", Value::Float(1.5)));
        cards.push(Card::new("CDELT1", Value::Float(-0.001)));
        let raw: Vec<u8> = [1.0f32, 2.0, 3.0, 4.0]
            .iter()
            .flat_map(|v| v.to_be_bytes())
            .collect();
        let fits = build_fits(&cards, &raw);
        let images = decode(&fits).unwrap();
        let again = decode(&encode(&images).unwrap()).unwrap();
        assert_eq!(again[0].wcs().crpix1, 1.5);
        assert_eq!(again[0].header().get_float("CDELT1"), Some(-0.001));
    }

    #[test]
    fn encode_multiple_images_as_extensions() {
        let fits1 = build_fits(&image_cards(8, &[2, 1]), &[1, 2]);
        let fits2 = build_fits(&image_cards(8, &[2, 1]), &[3, 4]);
        let mut images = decode(&fits1).unwrap();
        images.extend(decode(&fits2).unwrap());

        let bytes = encode(&images).unwrap();
        let again = decode(&bytes).unwrap();
        assert_eq!(again.len(), 2);
        assert_eq!(again[1].pixels(), &PixelData::U8(vec![3, 4]));
        assert_eq!(again[1].header().get_string("XTENSION"), Some("IMAGE"));
    }

    #[test]
    fn gzip_roundtrip() {
        let fits = build_fits(&image_cards(8, &[2, 2]), &[1, 2, 3, 4]);
        let deflated = miniz_oxide::deflate::compress_to_vec(&fits, 6);

        // Minimal gzip container: 10-byte header + deflate + 8-byte trailer.
        let mut gz = vec![0x1f, 0x8b, 0x08, 0, 0, 0, 0, 0, 0, 0xff];
        gz.extend_from_slice(&deflated);
        gz.extend_from_slice(&[0u8; 8]);

        assert!(is_gzipped(&gz));
        assert!(!is_gzipped(&fits));
        let inflated = gunzip(&gz).unwrap();
        assert_eq!(inflated, fits);
        assert_eq!(decode(&inflated).unwrap().len(), 1);
    }

    #[test]
    fn gunzip_rejects_garbage() {
        assert!(matches!(gunzip(&[0u8; 4]), Err(Error::Decompression)));
        assert!(matches!(
            gunzip(&[0x1f, 0x8b, 0x08, 0, 0, 0, 0, 0, 0, 0xff]),
            Err(Error::Decompression)
        ));
    }

    #[test]
    fn serialize_pixels_block_aligned_and_be() {
        let bytes = serialize_pixels(&PixelData::I16(vec![0x0102, -2]));
        assert_eq!(bytes.len(), BLOCK_SIZE);
        assert_eq!(&bytes[..4], &[0x01, 0x02, 0xff, 0xfe]);
        assert!(bytes[4..].iter().all(|&b| b == 0));
    }

    #[test]
    fn serialize_empty_plane() {
        assert!(serialize_pixels(&PixelData::F64(vec![])).is_empty());
    }
}
