#![cfg_attr(not(feature = "std"), no_std)]

//! Server-side FITS raster pipeline: decode, geometric transforms
//! (crop, flip, decimate), histogram-driven stretch, and color-mapped
//! raster output.

extern crate alloc;

pub mod card;
pub mod codec;
pub mod colortable;
pub mod error;
pub mod header;
pub mod histogram;
pub mod image;
pub mod pixels;
pub mod stretch;
pub mod transform;
pub mod wcs;

#[cfg(feature = "std")]
pub mod pipeline;

#[cfg(feature = "array")]
pub mod array;

pub use codec::{BLOCK_SIZE, CARDS_PER_BLOCK, CARD_SIZE};
pub use error::{Error, Result};
