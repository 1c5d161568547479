//! The decoded FITS image: one 2-D pixel plane plus its header and
//! resolved WCS.
//!
//! A `FitsImage` is immutable once built. Geometric transforms produce a
//! fresh image (pixels and header both newly allocated), so a decoded
//! source can be cached and shared freely.

use crate::error::{Error, Result};
use crate::header::Header;
use crate::pixels::{bytes_per_pixel, PixelData};
use crate::wcs::WcsInfo;

/// Minimal typed view over the header fields pixel math needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MiniFitsHeader {
    pub bitpix: i64,
    pub naxis1: usize,
    pub naxis2: usize,
    /// Plane count claimed by NAXIS3 (and NAXIS4). A decoded image always
    /// holds exactly one plane; transforms refuse anything else.
    pub planes: usize,
    pub bscale: f64,
    pub bzero: f64,
    /// Integer no-data sentinel (BLANK keyword); float images use NaN.
    pub blank: Option<i64>,
}

impl MiniFitsHeader {
    pub fn from_header(header: &Header) -> Result<MiniFitsHeader> {
        let bitpix = header
            .get_integer("BITPIX")
            .ok_or(Error::MissingKeyword("BITPIX"))?;
        bytes_per_pixel(bitpix)?;
        let naxis1 = header
            .get_integer("NAXIS1")
            .ok_or(Error::MissingKeyword("NAXIS1"))?;
        let naxis2 = header
            .get_integer("NAXIS2")
            .ok_or(Error::MissingKeyword("NAXIS2"))?;
        if naxis1 < 0 || naxis2 < 0 {
            return Err(Error::InvalidHeader("negative axis length"));
        }
        let naxis3 = header.get_integer("NAXIS3").unwrap_or(1).max(0) as usize;
        let naxis4 = header.get_integer("NAXIS4").unwrap_or(1).max(0) as usize;

        Ok(MiniFitsHeader {
            bitpix,
            naxis1: naxis1 as usize,
            naxis2: naxis2 as usize,
            planes: naxis3 * naxis4,
            bscale: header.get_float("BSCALE").unwrap_or(1.0),
            bzero: header.get_float("BZERO").unwrap_or(0.0),
            blank: header.get_integer("BLANK"),
        })
    }

    /// BSCALE/BZERO calibration: raw data number to physical value.
    pub fn physical(&self, dn: f64) -> f64 {
        self.bzero + self.bscale * dn
    }
}

/// One decoded image plane.
#[derive(Debug, Clone)]
pub struct FitsImage {
    header: Header,
    mini: MiniFitsHeader,
    wcs: WcsInfo,
    pixels: PixelData,
    plane_index: usize,
}

impl FitsImage {
    /// Assemble an image from a header and its matching pixel plane.
    ///
    /// The header's BITPIX must agree with the storage type and
    /// `NAXIS1 * NAXIS2` with the sample count; the mini header and WCS are
    /// re-derived here so they can never drift from the cards.
    pub fn from_parts(header: Header, pixels: PixelData, plane_index: usize) -> Result<FitsImage> {
        let mini = MiniFitsHeader::from_header(&header)?;
        if mini.bitpix != pixels.bitpix() {
            return Err(Error::InvalidHeader("BITPIX does not match pixel storage"));
        }
        if mini.naxis1 * mini.naxis2 != pixels.len() {
            return Err(Error::InvalidHeader("NAXIS1*NAXIS2 does not match data"));
        }
        let wcs = WcsInfo::parse(&header);
        Ok(FitsImage {
            header,
            mini,
            wcs,
            pixels,
            plane_index,
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn mini(&self) -> &MiniFitsHeader {
        &self.mini
    }

    pub fn wcs(&self) -> &WcsInfo {
        &self.wcs
    }

    pub fn pixels(&self) -> &PixelData {
        &self.pixels
    }

    /// Which plane of the source HDU this image came from (0 for 2-D files).
    pub fn plane_index(&self) -> usize {
        self.plane_index
    }

    pub fn width(&self) -> usize {
        self.mini.naxis1
    }

    pub fn height(&self) -> usize {
        self.mini.naxis2
    }

    /// Raw data number at `(x, y)`, 0-based, row-major with `NAXIS1` the
    /// fast axis.
    pub fn dn_at(&self, x: i64, y: i64) -> Result<f64> {
        if x < 0 || y < 0 || x as usize >= self.mini.naxis1 || y as usize >= self.mini.naxis2 {
            return Err(Error::PixelOutOfRange);
        }
        let idx = y as usize * self.mini.naxis1 + x as usize;
        if self.pixels.is_blank_at(idx, self.mini.blank) {
            return Err(Error::PixelOutOfRange);
        }
        Ok(self.pixels.get_f64(idx))
    }

    /// BSCALE/BZERO-calibrated flux at `(x, y)`.
    ///
    /// Blank pixels and out-of-image coordinates are the expected, non-fatal
    /// [`Error::PixelOutOfRange`] ("no data at this point").
    pub fn flux_at(&self, x: i64, y: i64) -> Result<f64> {
        self.dn_at(x, y).map(|dn| self.mini.physical(dn))
    }

    /// Physical unit of the calibrated flux (the BUNIT keyword), when the
    /// header declares one.
    pub fn flux_units(&self) -> Option<&str> {
        self.header.get_string("BUNIT")
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn header_2d(bitpix: i64, w: i64, h: i64) -> Header {
        let mut hd = Header::new();
        hd.set("SIMPLE", crate::card::Value::Logical(true));
        hd.set_integer("BITPIX", bitpix);
        hd.set_integer("NAXIS", 2);
        hd.set_integer("NAXIS1", w);
        hd.set_integer("NAXIS2", h);
        hd
    }

    #[test]
    fn mini_header_defaults() {
        let mini = MiniFitsHeader::from_header(&header_2d(16, 4, 3)).unwrap();
        assert_eq!(mini.bitpix, 16);
        assert_eq!((mini.naxis1, mini.naxis2), (4, 3));
        assert_eq!(mini.planes, 1);
        assert_eq!(mini.bscale, 1.0);
        assert_eq!(mini.bzero, 0.0);
        assert_eq!(mini.blank, None);
    }

    #[test]
    fn mini_header_scaling_and_blank() {
        let mut hd = header_2d(16, 2, 2);
        hd.set_float("BSCALE", 2.0);
        hd.set_float("BZERO", 32768.0);
        hd.set_integer("BLANK", -999);
        let mini = MiniFitsHeader::from_header(&hd).unwrap();
        assert_eq!(mini.physical(1.0), 32770.0);
        assert_eq!(mini.blank, Some(-999));
    }

    #[test]
    fn mini_header_missing_keys() {
        let hd = Header::new();
        assert!(matches!(
            MiniFitsHeader::from_header(&hd),
            Err(Error::MissingKeyword("BITPIX"))
        ));

        let mut hd = Header::new();
        hd.set_integer("BITPIX", 16);
        assert!(matches!(
            MiniFitsHeader::from_header(&hd),
            Err(Error::MissingKeyword("NAXIS1"))
        ));
    }

    #[test]
    fn mini_header_rejects_bad_bitpix() {
        let hd = header_2d(64, 2, 2);
        assert!(matches!(
            MiniFitsHeader::from_header(&hd),
            Err(Error::UnsupportedBitpix(64))
        ));
    }

    #[test]
    fn from_parts_validates_shape() {
        let img = FitsImage::from_parts(header_2d(16, 3, 2), PixelData::I16(vec![0; 6]), 0);
        assert!(img.is_ok());

        let err = FitsImage::from_parts(header_2d(16, 3, 2), PixelData::I16(vec![0; 5]), 0);
        assert!(matches!(err, Err(Error::InvalidHeader(_))));

        let err = FitsImage::from_parts(header_2d(16, 3, 2), PixelData::F32(vec![0.0; 6]), 0);
        assert!(matches!(err, Err(Error::InvalidHeader(_))));
    }

    #[test]
    fn flux_lookup_applies_calibration() {
        let mut hd = header_2d(16, 2, 2);
        hd.set_float("BSCALE", 0.5);
        hd.set_float("BZERO", 100.0);
        let img = FitsImage::from_parts(hd, PixelData::I16(vec![0, 2, 4, 6]), 0).unwrap();
        assert_eq!(img.flux_at(1, 0).unwrap(), 101.0);
        assert_eq!(img.flux_at(1, 1).unwrap(), 103.0);
    }

    #[test]
    fn flux_on_blank_pixel_is_soft_error() {
        let mut hd = header_2d(16, 2, 1);
        hd.set_integer("BLANK", -999);
        let img = FitsImage::from_parts(hd, PixelData::I16(vec![5, -999]), 0).unwrap();
        assert!(img.flux_at(0, 0).is_ok());
        assert!(matches!(img.flux_at(1, 0), Err(Error::PixelOutOfRange)));
    }

    #[test]
    fn flux_outside_image_is_soft_error() {
        let img = FitsImage::from_parts(header_2d(8, 2, 2), PixelData::U8(vec![1; 4]), 0).unwrap();
        assert!(matches!(img.flux_at(-1, 0), Err(Error::PixelOutOfRange)));
        assert!(matches!(img.flux_at(2, 0), Err(Error::PixelOutOfRange)));
        assert!(matches!(img.flux_at(0, 2), Err(Error::PixelOutOfRange)));
    }

    #[test]
    fn flux_on_float_nan_is_soft_error() {
        let img = FitsImage::from_parts(
            header_2d(-32, 2, 1),
            PixelData::F32(vec![1.5, f32::NAN]),
            0,
        )
        .unwrap();
        assert_eq!(img.flux_at(0, 0).unwrap(), 1.5);
        assert!(matches!(img.flux_at(1, 0), Err(Error::PixelOutOfRange)));
    }

    #[test]
    fn flux_units_from_bunit() {
        let mut hd = header_2d(16, 1, 1);
        hd.set_string("BUNIT", "JY/BEAM");
        let img = FitsImage::from_parts(hd, PixelData::I16(vec![1]), 0).unwrap();
        assert_eq!(img.flux_units(), Some("JY/BEAM"));

        let img =
            FitsImage::from_parts(header_2d(16, 1, 1), PixelData::I16(vec![1]), 0).unwrap();
        assert_eq!(img.flux_units(), None);
    }

    #[test]
    fn wcs_is_derived_from_header() {
        let mut hd = header_2d(8, 2, 2);
        hd.set_float("CRPIX1", 1.5);
        let img = FitsImage::from_parts(hd, PixelData::U8(vec![0; 4]), 0).unwrap();
        assert_eq!(img.wcs().crpix1, 1.5);
    }
}
