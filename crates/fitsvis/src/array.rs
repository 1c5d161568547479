//! `ndarray` views over decoded planes, for numeric consumers.

use ndarray::Array2;

use crate::image::FitsImage;

/// Copy a plane into a row-major `Array2<f64>` (rows are NAXIS2).
///
/// Integer blank sentinels are carried through as their raw values; use
/// [`blank_masked_array`] to have them surface as NaN.
pub fn to_array2(image: &FitsImage) -> Array2<f64> {
    let w = image.width();
    Array2::from_shape_fn((image.height(), w), |(y, x)| {
        image.pixels().get_f64(y * w + x)
    })
}

/// Like [`to_array2`], but every blank/NaN pixel becomes NaN.
pub fn blank_masked_array(image: &FitsImage) -> Array2<f64> {
    let w = image.width();
    let blank = image.mini().blank;
    Array2::from_shape_fn((image.height(), w), |(y, x)| {
        let idx = y * w + x;
        if image.pixels().is_blank_at(idx, blank) {
            f64::NAN
        } else {
            image.pixels().get_f64(idx)
        }
    })
}
