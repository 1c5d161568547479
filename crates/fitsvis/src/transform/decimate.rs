//! Integer-factor downsampling.

use alloc::vec::Vec;

use crate::error::{Error, Result};
use crate::header::Header;
use crate::image::FitsImage;
use crate::pixels::{map_plane, Sample};
use crate::transform::require_single_plane;

/// Linear-scale keys multiplied by the decimation factor, whichever are
/// present.
const SCALE_KEYS: [&str; 10] = [
    "CD1_1", "CD1_2", "CD2_1", "CD2_2", "CD001001", "CD001002", "CD002001", "CD002002", "CDELT1",
    "CDELT2",
];

/// Plate-solution scale keys multiplied by the factor.
const PLATE_SCALE_KEYS: [&str; 3] = ["PLTSCALE", "XPIXELSZ", "YPIXELSZ"];

/// Take the top-left sample of each `f x f` block. Point sampling, not
/// averaging: preview speed is the point, and averaging would change the
/// photometry of the thumbnail.
fn decimate_plane<T: Sample>(
    src: &[T],
    width: usize,
    factor: usize,
    out_w: usize,
    out_h: usize,
) -> Vec<T> {
    let mut out = Vec::with_capacity(out_w * out_h);
    for oy in 0..out_h {
        let sy = oy * factor;
        for ox in 0..out_w {
            out.push(src[sy * width + ox * factor]);
        }
    }
    out
}

/// Remap a 1-based reference pixel onto the decimated grid.
fn rescale_refpix(v: f64, factor: f64) -> f64 {
    (v - 1.0) / factor + 1.0
}

/// Downsample by an integer factor to `floor(NAXIS1/f) x floor(NAXIS2/f)`.
///
/// The header rewrite: `CRPIX` moves to `(orig-1)/f + 1`, linear scales
/// (CD matrix or CDELT) multiply by `f`, SIP coefficients scale by
/// `f^(i+j-1)`, and plate-solution fields are adjusted when present.
/// Data cubes are refused.
pub fn decimate(image: &FitsImage, factor: usize) -> Result<FitsImage> {
    require_single_plane(image)?;
    if factor == 0 {
        return Err(Error::Geometry("decimation factor must be at least 1"));
    }

    let width = image.width();
    let height = image.height();
    let out_w = width / factor;
    let out_h = height / factor;
    if out_w == 0 || out_h == 0 {
        return Err(Error::Geometry("decimation factor exceeds image size"));
    }

    let pixels = map_plane!(image.pixels(), v => decimate_plane(v, width, factor, out_w, out_h));

    let f = factor as f64;
    let mut header = image.header().clone();
    header.set_integer("NAXIS1", out_w as i64);
    header.set_integer("NAXIS2", out_h as i64);
    for key in ["CRPIX1", "CRPIX2", "CNPIX1", "CNPIX2"] {
        if let Some(v) = header.get_float(key) {
            header.set_float(key, rescale_refpix(v, f));
        }
    }
    for key in SCALE_KEYS {
        header.scale_float(key, f);
    }
    for key in PLATE_SCALE_KEYS {
        header.scale_float(key, f);
    }
    scale_sip_terms(&mut header, "A", f);
    scale_sip_terms(&mut header, "B", f);
    scale_sip_terms(&mut header, "AP", f);
    scale_sip_terms(&mut header, "BP", f);

    FitsImage::from_parts(header, pixels, image.plane_index())
}

/// A term `c * u^i * v^j` keeps its meaning on the coarser grid when the
/// coefficient picks up `f^(i+j-1)`.
fn scale_sip_terms(header: &mut Header, prefix: &str, f: f64) {
    let Some(order) = header.get_integer(&alloc::format!("{prefix}_ORDER")) else {
        return;
    };
    for i in 0..=order.max(0) as usize {
        for j in 0..=(order.max(0) as usize - i) {
            let scale = libm::pow(f, (i + j) as f64 - 1.0);
            header.scale_float(&alloc::format!("{prefix}_{i}_{j}"), scale);
        }
    }
}

// ── Tests ──
