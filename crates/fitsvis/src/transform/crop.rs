//! Cropping, including the sky-position-centered variant.

use alloc::vec::Vec;

use crate::error::{Error, Result};
use crate::image::FitsImage;
use crate::pixels::{map_plane, Sample};
use crate::transform::require_single_plane;
use crate::wcs::WcsRepresentation;

/// Copy the box `[min_x..=max_x] x [min_y..=max_y]` out of a plane.
/// Cells whose source index falls outside the plane are filled with the
/// type's no-data value.
fn crop_plane<T: Sample>(
    src: &[T],
    width: usize,
    height: usize,
    min_x: i64,
    min_y: i64,
    out_w: usize,
    out_h: usize,
    blank: Option<i64>,
) -> Vec<T> {
    let mut out = Vec::with_capacity(out_w * out_h);
    for oy in 0..out_h {
        let sy = min_y + oy as i64;
        for ox in 0..out_w {
            let sx = min_x + ox as i64;
            if sx < 0 || sy < 0 || sx >= width as i64 || sy >= height as i64 {
                out.push(T::fill_value(blank));
            } else {
                out.push(src[sy as usize * width + sx as usize]);
            }
        }
    }
    out
}

/// Crop to the inclusive pixel box `(min_x, min_y)..(max_x, max_y)`,
/// 0-based. Reversed corners are swapped.
///
/// The box may extend past the image; uncovered cells are filled with the
/// blank sentinel (integer types) or NaN (float types). The reference
/// pixel moves with the box: `CNPIX1/2` for plate-solution headers,
/// `CRPIX1/2` otherwise. When `CDELT2` is negative the y-corners are
/// mirrored against `NAXIS2` first, since row order tracks declination.
pub fn crop(
    image: &FitsImage,
    min_x: i64,
    min_y: i64,
    max_x: i64,
    max_y: i64,
) -> Result<FitsImage> {
    require_single_plane(image)?;

    let (min_x, max_x) = if min_x <= max_x {
        (min_x, max_x)
    } else {
        (max_x, min_x)
    };
    let (mut min_y, mut max_y) = if min_y <= max_y {
        (min_y, max_y)
    } else {
        (max_y, min_y)
    };

    let width = image.width();
    let height = image.height();
    let mini = image.mini();

    let cdelt2 = image
        .wcs()
        .representation
        .as_ref()
        .and_then(|r| r.cdelt2());
    if matches!(cdelt2, Some(c) if c < 0.0) {
        let m_min = height as i64 - 1 - max_y;
        let m_max = height as i64 - 1 - min_y;
        min_y = m_min;
        max_y = m_max;
    }

    let out_w = (max_x - min_x + 1) as usize;
    let out_h = (max_y - min_y + 1) as usize;

    let pixels = map_plane!(image.pixels(), v => crop_plane(
        v, width, height, min_x, min_y, out_w, out_h, mini.blank,
    ));

    let mut header = image.header().clone();
    header.set_integer("NAXIS1", out_w as i64);
    header.set_integer("NAXIS2", out_h as i64);
    if matches!(
        image.wcs().representation,
        Some(WcsRepresentation::Plate(_))
    ) {
        if let Some(v) = header.get_float("CNPIX1") {
            header.set_float("CNPIX1", v + min_x as f64);
        }
        if let Some(v) = header.get_float("CNPIX2") {
            header.set_float("CNPIX2", v + min_y as f64);
        }
    } else {
        if let Some(v) = header.get_float("CRPIX1") {
            header.set_float("CRPIX1", v - min_x as f64);
        }
        if let Some(v) = header.get_float("CRPIX2") {
            header.set_float("CRPIX2", v - min_y as f64);
        }
    }

    FitsImage::from_parts(header, pixels, image.plane_index())
}

/// Crop a box centered on a sky position.
///
/// The position (degrees) is projected into pixel space through the
/// image's WCS; the box half-width is `radius_deg / |CDELT2|` pixels.
/// Fails with a [`Error::Geometry`] when the projection cannot place the
/// center on the image plane.
pub fn crop_and_center(
    image: &FitsImage,
    ra_deg: f64,
    dec_deg: f64,
    radius_deg: f64,
) -> Result<FitsImage> {
    require_single_plane(image)?;

    let (cx, cy) = image.wcs().sky_to_pixel(ra_deg, dec_deg)?;
    let cdelt2 = image
        .wcs()
        .representation
        .as_ref()
        .and_then(|r| r.cdelt2())
        .ok_or(Error::Geometry("no pixel scale in header"))?;
    if cdelt2 == 0.0 {
        return Err(Error::Geometry("zero pixel scale in header"));
    }

    let half = libm::round(radius_deg / libm::fabs(cdelt2)) as i64;
    let cx = libm::round(cx) as i64;
    let cy = libm::round(cy) as i64;
    crop(image, cx - half, cy - half, cx + half, cy + half)
}

// ── Tests ──
