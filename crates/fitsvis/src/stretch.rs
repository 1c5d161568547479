//! Mapping raw data numbers onto displayable byte intensities.
//!
//! A [`RangeValues`] names how each endpoint of the display interval is
//! found (absolute DN, percentile, sigma anchor, or z-scale) and which
//! compression curve maps the normalized value onto 0..255. Stretching
//! never touches the decoded image, so contrast changes only regenerate
//! the byte raster.

use alloc::vec;
use alloc::vec::Vec;

use log::debug;

use crate::colortable::ColorTable;
use crate::error::{Error, Result};
use crate::histogram::Histogram;
use crate::image::FitsImage;

/// How one endpoint of the display interval is resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StretchBound {
    /// A literal data number.
    Absolute(f64),
    /// A cumulative percentile, 0..=100.
    Percent(f64),
    /// `median + k * sigma` through the robust histogram anchor.
    Sigma(f64),
    /// Robust z-scale interval endpoint.
    ZScale,
}

/// Compression curve applied to the normalized value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleKind {
    Linear,
    Log,
    LogLog,
    /// Histogram equalization through the 256-entry table.
    Equal,
    Sqrt,
    Squared,
}

/// A complete stretch specification for one band. Immutable value object;
/// supplied per band by the caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeValues {
    pub lower: StretchBound,
    pub upper: StretchBound,
    pub scale: ScaleKind,
}

impl RangeValues {
    pub const fn new(lower: StretchBound, upper: StretchBound, scale: ScaleKind) -> RangeValues {
        RangeValues {
            lower,
            upper,
            scale,
        }
    }
}

impl Default for RangeValues {
    /// The conventional display default: clip 1% at each tail, linear.
    fn default() -> RangeValues {
        RangeValues::new(
            StretchBound::Percent(1.0),
            StretchBound::Percent(99.0),
            ScaleKind::Linear,
        )
    }
}

/// Multiple of the robust sigma used for the z-scale endpoints.
const ZSCALE_SIGMA: f64 = 2.0;

fn resolve_bound(bound: StretchBound, hist: &Histogram, upper: bool) -> f64 {
    match bound {
        StretchBound::Absolute(dn) => dn,
        StretchBound::Percent(p) => hist.get_pct(p, upper),
        StretchBound::Sigma(k) => hist.get_sigma(k, upper),
        StretchBound::ZScale => {
            let k = if upper { ZSCALE_SIGMA } else { -ZSCALE_SIGMA };
            hist.get_sigma(k, upper)
        }
    }
}

/// Resolve a [`RangeValues`] against a histogram into `(low, high)` data
/// numbers.
pub fn resolve_range(range: &RangeValues, hist: &Histogram) -> (f64, f64) {
    let low = resolve_bound(range.lower, hist, false);
    let high = resolve_bound(range.upper, hist, true);
    debug!("stretch range resolved to [{low}, {high}]");
    (low, high)
}

fn log_curve(t: f64) -> f64 {
    // ln(1 + 999t) / ln(1000): full-range, defined for every t in [0,1].
    libm::log(1.0 + 999.0 * t) / libm::log(1000.0)
}

fn apply_curve(t: f64, scale: ScaleKind) -> f64 {
    match scale {
        ScaleKind::Linear => t,
        ScaleKind::Log => log_curve(t),
        ScaleKind::LogLog => log_curve(log_curve(t)),
        ScaleKind::Sqrt => libm::sqrt(t),
        ScaleKind::Squared => t * t,
        // Equalization bypasses the normalized-value path entirely.
        ScaleKind::Equal => t,
    }
}

/// Byte index for one data number under an equalization table.
fn equalize(dn: f64, tbl: &[f64; 256]) -> u8 {
    let rank = tbl.partition_point(|&e| e <= dn);
    (rank.saturating_sub(1)).min(255) as u8
}

/// Stretch one band against a prebuilt histogram.
///
/// Every output byte is in 0..=255; blank/NaN pixels are forced to 0, the
/// background slot of every color table.
pub fn stretch_with_histogram(
    image: &FitsImage,
    range: &RangeValues,
    hist: &Histogram,
) -> Vec<u8> {
    let pixels = image.pixels();
    let blank = image.mini().blank;
    let mut out = Vec::with_capacity(pixels.len());

    if range.scale == ScaleKind::Equal {
        let tbl = hist.eq_table();
        for i in 0..pixels.len() {
            if pixels.is_blank_at(i, blank) {
                out.push(0);
            } else {
                out.push(equalize(pixels.get_f64(i), &tbl));
            }
        }
        return out;
    }

    let (low, high) = resolve_range(range, hist);
    let span = if high > low { high - low } else { 1.0 };

    for i in 0..pixels.len() {
        if pixels.is_blank_at(i, blank) {
            out.push(0);
            continue;
        }
        let dn = pixels.get_f64(i);
        let t = ((dn - low) / span).clamp(0.0, 1.0);
        let byte = libm::round(apply_curve(t, range.scale) * 255.0) as u8;
        out.push(byte);
    }
    out
}

/// Stretch one band, building the histogram on the fly.
pub fn stretch(image: &FitsImage, range: &RangeValues) -> Vec<u8> {
    let hist = Histogram::build(image.pixels(), None, None, image.mini().blank);
    stretch_with_histogram(image, range, &hist)
}

// ── Rasters ──

/// A display-ready byte raster. Exclusively owned by the caller; the
/// pipeline never shares it back.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderedRaster {
    /// Single band of color-table indices.
    Indexed8 {
        width: usize,
        height: usize,
        pixels: Vec<u8>,
        color_table: usize,
    },
    /// Interleaved R,G,B triples.
    Rgb24 {
        width: usize,
        height: usize,
        pixels: Vec<u8>,
    },
}

impl RenderedRaster {
    pub fn width(&self) -> usize {
        match self {
            RenderedRaster::Indexed8 { width, .. } | RenderedRaster::Rgb24 { width, .. } => *width,
        }
    }

    pub fn height(&self) -> usize {
        match self {
            RenderedRaster::Indexed8 { height, .. } | RenderedRaster::Rgb24 { height, .. } => {
                *height
            }
        }
    }

    /// Expand to interleaved RGB bytes, resolving the color table for
    /// indexed rasters.
    pub fn to_rgb_bytes(&self) -> Result<Vec<u8>> {
        match self {
            RenderedRaster::Rgb24 { pixels, .. } => Ok(pixels.clone()),
            RenderedRaster::Indexed8 {
                pixels,
                color_table,
                ..
            } => {
                let table = ColorTable::by_id(*color_table)
                    .ok_or(Error::InvalidHeader("unknown color table id"))?;
                let mut out = Vec::with_capacity(pixels.len() * 3);
                for &p in pixels {
                    out.extend_from_slice(&table.rgb(p));
                }
                Ok(out)
            }
        }
    }
}

/// Render one band into a color-table-indexed raster.
pub fn render_indexed(
    image: &FitsImage,
    range: &RangeValues,
    color_table: usize,
) -> Result<RenderedRaster> {
    ColorTable::by_id(color_table).ok_or(Error::InvalidHeader("unknown color table id"))?;
    Ok(RenderedRaster::Indexed8 {
        width: image.width(),
        height: image.height(),
        pixels: stretch(image, range),
        color_table,
    })
}

/// Render up to three bands into an interleaved 24-bit RGB raster.
///
/// Bands are stretched independently, each against its own histogram and
/// range. A missing band contributes an all-zero plane. All present bands
/// must share the same dimensions.
pub fn render_rgb(
    bands: [Option<(&FitsImage, &RangeValues)>; 3],
) -> Result<RenderedRaster> {
    let (width, height) = bands
        .iter()
        .flatten()
        .map(|(img, _)| (img.width(), img.height()))
        .next()
        .ok_or(Error::InvalidHeader("no bands supplied"))?;

    for (img, _) in bands.iter().flatten() {
        if (img.width(), img.height()) != (width, height) {
            return Err(Error::InvalidHeader("color bands differ in size"));
        }
    }

    let npix = width * height;
    let planes: [Vec<u8>; 3] = bands.map(|band| match band {
        Some((img, range)) => stretch(img, range),
        None => vec![0u8; npix],
    });

    let mut pixels = Vec::with_capacity(npix * 3);
    for i in 0..npix {
        pixels.push(planes[0][i]);
        pixels.push(planes[1][i]);
        pixels.push(planes[2][i]);
    }
    Ok(RenderedRaster::Rgb24 {
        width,
        height,
        pixels,
    })
}

// ── Tests ──
