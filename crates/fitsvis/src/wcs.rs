//! World Coordinate System resolution and the TAN projection.
//!
//! The WCS flavor of a header is resolved once at decode time into a tagged
//! [`WcsRepresentation`]; transform code switches on the variant instead of
//! re-probing header strings at every step. SIP distortion polynomials are
//! stored as fixed-size coefficient matrices with an explicit order.

use alloc::string::String;

use crate::error::{Error, Result};
use crate::header::Header;

/// Highest SIP polynomial order the coefficient matrices can hold.
pub const MAX_SIP_ORDER: usize = 9;

// ── SIP distortion ──

/// One SIP polynomial: `sum coeffs[i][j] * u^i * v^j` for `i + j <= order`.
#[derive(Debug, Clone, PartialEq)]
pub struct SipPoly {
    pub order: usize,
    pub coeffs: [[f64; MAX_SIP_ORDER + 1]; MAX_SIP_ORDER + 1],
}

impl SipPoly {
    fn parse(header: &Header, prefix: &str) -> Option<SipPoly> {
        let order = header.get_integer(&alloc::format!("{prefix}_ORDER"))? as usize;
        let order = order.min(MAX_SIP_ORDER);
        let mut coeffs = [[0.0; MAX_SIP_ORDER + 1]; MAX_SIP_ORDER + 1];
        for i in 0..=order {
            for j in 0..=(order - i) {
                if let Some(v) = header.get_float(&alloc::format!("{prefix}_{i}_{j}")) {
                    coeffs[i][j] = v;
                }
            }
        }
        Some(SipPoly { order, coeffs })
    }
}

/// The four SIP polynomial sets a header may carry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SipSet {
    pub a: Option<SipPoly>,
    pub b: Option<SipPoly>,
    pub ap: Option<SipPoly>,
    pub bp: Option<SipPoly>,
}

impl SipSet {
    pub fn parse(header: &Header) -> SipSet {
        SipSet {
            a: SipPoly::parse(header, "A"),
            b: SipPoly::parse(header, "B"),
            ap: SipPoly::parse(header, "AP"),
            bp: SipPoly::parse(header, "BP"),
        }
    }

    pub fn is_present(&self) -> bool {
        self.a.is_some() || self.b.is_some() || self.ap.is_some() || self.bp.is_some()
    }
}

// ── Representation ──

/// Plate-solution astrometry (DSS-style), recognized by PLTRAH.
#[derive(Debug, Clone, PartialEq)]
pub struct PlateSolution {
    /// Corner of the extracted subimage on the original plate.
    pub cnpix1: f64,
    pub cnpix2: f64,
    /// Plate scale in arcsec/mm.
    pub pltscale: f64,
    /// Pixel size in microns.
    pub xpixelsz: f64,
    pub ypixelsz: f64,
}

/// How the header encodes the pixel-to-sky linear transform.
///
/// Resolution priority mirrors the key probing order of the rewrite rules:
/// plate solution, CD matrix (modern then AIPS spelling), PC matrix, CDELT.
#[derive(Debug, Clone, PartialEq)]
pub enum WcsRepresentation {
    /// CDELT1/CDELT2 scales with an optional CROTA2 rotation (degrees).
    Classic {
        cdelt1: f64,
        cdelt2: f64,
        crota2: f64,
    },
    /// Full CD matrix. `aips_style` marks the CD001001 key spelling.
    CdMatrix { cd: [[f64; 2]; 2], aips_style: bool },
    /// PC rotation matrix with separate CDELT scales.
    PcMatrix {
        pc: [[f64; 2]; 2],
        cdelt1: f64,
        cdelt2: f64,
    },
    /// Plate-solution parameters instead of a linear transform.
    Plate(PlateSolution),
}

impl WcsRepresentation {
    pub fn resolve(header: &Header) -> Option<WcsRepresentation> {
        if header.contains("PLTRAH") {
            return Some(WcsRepresentation::Plate(PlateSolution {
                cnpix1: header.get_float("CNPIX1").unwrap_or(0.0),
                cnpix2: header.get_float("CNPIX2").unwrap_or(0.0),
                pltscale: header.get_float("PLTSCALE").unwrap_or(0.0),
                xpixelsz: header.get_float("XPIXELSZ").unwrap_or(0.0),
                ypixelsz: header.get_float("YPIXELSZ").unwrap_or(0.0),
            }));
        }
        if let Some(cd) = read_matrix(header, ["CD1_1", "CD1_2", "CD2_1", "CD2_2"]) {
            return Some(WcsRepresentation::CdMatrix {
                cd,
                aips_style: false,
            });
        }
        if let Some(cd) = read_matrix(header, ["CD001001", "CD001002", "CD002001", "CD002002"]) {
            return Some(WcsRepresentation::CdMatrix {
                cd,
                aips_style: true,
            });
        }
        if let Some(pc) = read_matrix(header, ["PC1_1", "PC1_2", "PC2_1", "PC2_2"]) {
            return Some(WcsRepresentation::PcMatrix {
                pc,
                cdelt1: header.get_float("CDELT1").unwrap_or(1.0),
                cdelt2: header.get_float("CDELT2").unwrap_or(1.0),
            });
        }
        header.get_float("CDELT1").map(|cdelt1| {
            WcsRepresentation::Classic {
                cdelt1,
                cdelt2: header.get_float("CDELT2").unwrap_or(cdelt1),
                crota2: header.get_float("CROTA2").unwrap_or(0.0),
            }
        })
    }

    /// The effective CD matrix in degrees/pixel, when one can be formed.
    pub fn cd_matrix(&self) -> Option<[[f64; 2]; 2]> {
        match self {
            WcsRepresentation::Classic {
                cdelt1,
                cdelt2,
                crota2,
            } => {
                let rad = crota2.to_radians();
                let (s, c) = (libm::sin(rad), libm::cos(rad));
                Some([
                    [cdelt1 * c, -cdelt2 * s],
                    [cdelt1 * s, cdelt2 * c],
                ])
            }
            WcsRepresentation::CdMatrix { cd, .. } => Some(*cd),
            WcsRepresentation::PcMatrix { pc, cdelt1, cdelt2 } => Some([
                [cdelt1 * pc[0][0], cdelt1 * pc[0][1]],
                [cdelt2 * pc[1][0], cdelt2 * pc[1][1]],
            ]),
            WcsRepresentation::Plate(_) => None,
        }
    }

    /// Signed per-row pixel scale in degrees/pixel (the CDELT2 equivalent).
    pub fn cdelt2(&self) -> Option<f64> {
        match self {
            WcsRepresentation::Classic { cdelt2, .. } => Some(*cdelt2),
            WcsRepresentation::CdMatrix { cd, .. } => {
                let mag = libm::hypot(cd[1][0], cd[1][1]);
                Some(if cd[1][1] < 0.0 { -mag } else { mag })
            }
            WcsRepresentation::PcMatrix { cdelt2, .. } => Some(*cdelt2),
            // arcsec/mm * um / (1000 um/mm) / 3600 = degrees/pixel
            WcsRepresentation::Plate(p) => Some(p.pltscale * p.ypixelsz / 1000.0 / 3600.0),
        }
    }
}

fn read_matrix(header: &Header, keys: [&str; 4]) -> Option<[[f64; 2]; 2]> {
    if !keys.iter().any(|k| header.contains(k)) {
        return None;
    }
    Some([
        [
            header.get_float(keys[0]).unwrap_or(0.0),
            header.get_float(keys[1]).unwrap_or(0.0),
        ],
        [
            header.get_float(keys[2]).unwrap_or(0.0),
            header.get_float(keys[3]).unwrap_or(0.0),
        ],
    ])
}

// ── Projection tag ──

/// Sky projection named by the CTYPE suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    Tan,
    Sin,
    Arc,
    Car,
    Aitoff,
    Unrecognized,
    Unspecified,
}

impl Projection {
    pub fn from_ctype(ctype: Option<&str>) -> Projection {
        let Some(ctype) = ctype else {
            return Projection::Unspecified;
        };
        // CTYPE is "RA---TAN" / "DEC--SIN" style: the code is the tail
        // after the dash padding.
        let code = ctype.rsplit('-').find(|s| !s.is_empty()).unwrap_or("");
        match code {
            "TAN" => Projection::Tan,
            "SIN" => Projection::Sin,
            "ARC" => Projection::Arc,
            "CAR" => Projection::Car,
            "AIT" | "AITOFF" => Projection::Aitoff,
            _ => Projection::Unrecognized,
        }
    }
}

// ── Resolved WCS ──

/// WCS fields resolved once at decode time.
#[derive(Debug, Clone, PartialEq)]
pub struct WcsInfo {
    pub crpix1: f64,
    pub crpix2: f64,
    pub crval1: f64,
    pub crval2: f64,
    pub ctype1: Option<String>,
    pub ctype2: Option<String>,
    pub projection: Projection,
    pub representation: Option<WcsRepresentation>,
    pub sip: SipSet,
}

impl WcsInfo {
    pub fn parse(header: &Header) -> WcsInfo {
        let ctype1 = header.get_string("CTYPE1").map(String::from);
        let projection = Projection::from_ctype(ctype1.as_deref());
        WcsInfo {
            crpix1: header.get_float("CRPIX1").unwrap_or(0.0),
            crpix2: header.get_float("CRPIX2").unwrap_or(0.0),
            crval1: header.get_float("CRVAL1").unwrap_or(0.0),
            crval2: header.get_float("CRVAL2").unwrap_or(0.0),
            ctype1,
            ctype2: header.get_string("CTYPE2").map(String::from),
            projection,
            representation: WcsRepresentation::resolve(header),
            sip: SipSet::parse(header),
        }
    }

    /// Whether the image can be fed to the reprojection collaborator.
    pub fn can_rotate(&self) -> bool {
        !matches!(
            self.projection,
            Projection::Aitoff | Projection::Unrecognized | Projection::Unspecified
        )
    }

    /// Project a sky position (degrees) onto image pixel coordinates
    /// (0-based) through the TAN plane.
    pub fn sky_to_pixel(&self, ra_deg: f64, dec_deg: f64) -> Result<(f64, f64)> {
        let cd = self
            .representation
            .as_ref()
            .and_then(|r| r.cd_matrix())
            .ok_or(Error::Geometry("no linear WCS transform in header"))?;

        let ra = ra_deg.to_radians();
        let dec = dec_deg.to_radians();
        let ra0 = self.crval1.to_radians();
        let dec0 = self.crval2.to_radians();

        // Gnomonic (TAN) standard coordinates.
        let dra = ra - ra0;
        let den = libm::sin(dec) * libm::sin(dec0)
            + libm::cos(dec) * libm::cos(dec0) * libm::cos(dra);
        if den <= 0.0 {
            return Err(Error::Geometry("position is behind the tangent plane"));
        }
        let xi = libm::cos(dec) * libm::sin(dra) / den;
        let eta = (libm::sin(dec) * libm::cos(dec0)
            - libm::cos(dec) * libm::sin(dec0) * libm::cos(dra))
            / den;

        let det = cd[0][0] * cd[1][1] - cd[0][1] * cd[1][0];
        if det == 0.0 {
            return Err(Error::Geometry("singular CD matrix"));
        }
        let xi_deg = xi.to_degrees();
        let eta_deg = eta.to_degrees();
        let u = (cd[1][1] * xi_deg - cd[0][1] * eta_deg) / det;
        let v = (-cd[1][0] * xi_deg + cd[0][0] * eta_deg) / det;

        // CRPIX is 1-based per the FITS convention.
        Ok((u + self.crpix1 - 1.0, v + self.crpix2 - 1.0))
    }

    /// Inverse of [`sky_to_pixel`](Self::sky_to_pixel): pixel (0-based) to
    /// sky position in degrees.
    pub fn pixel_to_sky(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        let cd = self
            .representation
            .as_ref()
            .and_then(|r| r.cd_matrix())
            .ok_or(Error::Geometry("no linear WCS transform in header"))?;

        let u = x - (self.crpix1 - 1.0);
        let v = y - (self.crpix2 - 1.0);
        let xi = (cd[0][0] * u + cd[0][1] * v).to_radians();
        let eta = (cd[1][0] * u + cd[1][1] * v).to_radians();

        let ra0 = self.crval1.to_radians();
        let dec0 = self.crval2.to_radians();

        let den = libm::cos(dec0) - eta * libm::sin(dec0);
        let dra = libm::atan2(xi, den);
        let ra = ra0 + dra;
        let dec = libm::atan2(
            (libm::sin(dec0) + eta * libm::cos(dec0)) * libm::cos(dra),
            den,
        );

        Ok((ra.to_degrees(), dec.to_degrees()))
    }
}

// ── Tests ──
