//! Left-right mirroring.

use alloc::vec::Vec;

use crate::error::{Error, Result};
use crate::header::Header;
use crate::image::FitsImage;
use crate::pixels::{map_plane, Sample};
use crate::wcs::WcsRepresentation;

/// Sign-flip key groups, probed in priority order; the first group with any
/// member present wins.
const FLIP_KEY_GROUPS: [[&str; 2]; 3] = [
    ["CD1_1", "CD2_1"],
    ["CD001001", "CD002001"],
    ["PC1_1", "PC2_1"],
];

fn flip_plane<T: Sample>(src: &[T], width: usize, height: usize) -> Vec<T> {
    let mut out = Vec::with_capacity(src.len());
    for y in 0..height {
        let row = &src[y * width..(y + 1) * width];
        out.extend(row.iter().rev().copied());
    }
    out
}

/// Negate the SIP coefficients whose x-exponent has the given parity.
/// Mirroring x flips the sign of exactly those terms.
fn negate_sip_terms(header: &mut Header, prefix: &str, even_x_order: bool) {
    let Some(order) = header.get_integer(&alloc::format!("{prefix}_ORDER")) else {
        return;
    };
    for i in 0..=order.max(0) as usize {
        if (i % 2 == 0) != even_x_order {
            continue;
        }
        for j in 0..=(order.max(0) as usize - i) {
            header.negate_float(&alloc::format!("{prefix}_{i}_{j}"));
        }
    }
}

/// Mirror the image left-right: each output row is the reverse of the
/// input row.
///
/// The header rewrite keeps the WCS pointing at the same sky:
/// `CRPIX1 = NAXIS1 - CRPIX1 + 1`, the first present of the CD/PC/CDELT
/// x-column keys is negated, and SIP polynomials get the parity-selective
/// sign flip (even x-order terms of `A`/`AP`, odd of `B`/`BP`).
///
/// Plate-solution images are refused outright: mirroring them without
/// re-solving the plate constants would leave the astrometry wrong.
pub fn flip_lr(image: &FitsImage) -> Result<FitsImage> {
    if matches!(
        image.wcs().representation,
        Some(WcsRepresentation::Plate(_))
    ) {
        return Err(Error::Geometry(
            "plate-solution images cannot be mirrored",
        ));
    }

    let width = image.width();
    let height = image.height();
    let pixels = map_plane!(image.pixels(), v => flip_plane(v, width, height));

    let mut header = image.header().clone();
    if let Some(crpix1) = header.get_float("CRPIX1") {
        header.set_float("CRPIX1", width as f64 - crpix1 + 1.0);
    }

    let group = FLIP_KEY_GROUPS
        .iter()
        .find(|g| g.iter().any(|k| header.contains(k)));
    match group {
        Some(group) => {
            for key in group {
                header.negate_float(key);
            }
        }
        None => {
            header.negate_float("CDELT1");
        }
    }

    negate_sip_terms(&mut header, "A", true);
    negate_sip_terms(&mut header, "AP", true);
    negate_sip_terms(&mut header, "B", false);
    negate_sip_terms(&mut header, "BP", false);

    FitsImage::from_parts(header, pixels, image.plane_index())
}

// ── Tests ──
