//! Geometric transforms over decoded images.
//!
//! Every transform consumes an immutable [`FitsImage`](crate::image::FitsImage)
//! and returns a new one: pixels freshly allocated, header cloned and
//! rewritten so the WCS stays consistent with the remapped pixels. The new
//! header is only published once every key rewrite for the step has
//! succeeded.

pub mod crop;
pub mod decimate;
pub mod flip;
pub mod rotate;

pub use crop::{crop, crop_and_center};
pub use decimate::decimate;
pub use flip::flip_lr;
pub use rotate::{can_rotate, rotate, Reproject, RotationSpec};

use crate::error::{Error, Result};
use crate::image::FitsImage;

/// Transforms that remap a single plane refuse real data cubes.
pub(crate) fn require_single_plane(image: &FitsImage) -> Result<()> {
    let planes = image.mini().planes;
    if planes > 1 {
        return Err(Error::CubeUnsupported(planes));
    }
    Ok(())
}
