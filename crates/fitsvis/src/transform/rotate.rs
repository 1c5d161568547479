//! Rotation gating.
//!
//! The reprojection itself lives outside this crate; callers hand the
//! pipeline an implementation of [`Reproject`]. This module only decides
//! whether an image is rotatable at all and routes the call.

use crate::error::{Error, Result};
use crate::image::FitsImage;

/// Requested rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RotationSpec {
    /// Rotate so celestial north points up.
    North,
    /// Rotate by an angle in degrees.
    Angle(f64),
}

/// Reprojection collaborator. Implementations return a new image whose
/// pixels and WCS describe the rotated frame.
pub trait Reproject {
    fn rotate(&self, image: &FitsImage, spec: RotationSpec) -> Result<FitsImage>;
}

/// Whether the image's projection supports rotation. AITOFF and
/// unrecognized or absent projections do not.
pub fn can_rotate(image: &FitsImage) -> bool {
    image.wcs().can_rotate()
}

/// Rotate through the supplied reprojector, first checking the projection
/// gate.
pub fn rotate(
    image: &FitsImage,
    spec: RotationSpec,
    reprojector: &dyn Reproject,
) -> Result<FitsImage> {
    if !can_rotate(image) {
        return Err(Error::Geometry(
            "rotation is not supported for this projection",
        ));
    }
    reprojector.rotate(image, spec)
}

// ── Tests ──
