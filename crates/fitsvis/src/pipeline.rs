//! File-backed read pipeline: validate, fetch, decode, transform.
//!
//! The orchestrator sequences one image read:
//! `DECODED -> (FLIP?) -> (ROTATE?) -> (CROP | CROP-AND-CENTER)? -> READY`.
//! Stages with no request parameter are skipped. Re-running the same
//! immutable input with the same request produces byte-identical output,
//! so callers may cache results keyed by a request hash. The pipeline
//! itself holds no mutable state and may run concurrently on independent
//! sources.

use std::path::{Path, PathBuf};

use log::debug;

use crate::codec::{decode, encode, gunzip, is_gzipped};
use crate::error::{Error, Result};
use crate::image::FitsImage;
use crate::transform::{crop, crop_and_center, flip_lr, rotate, Reproject, RotationSpec};

/// Default source-size ceiling: 1 GiB.
pub const DEFAULT_MAX_BYTES: u64 = 1 << 30;

/// Pre-decode validation limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadLimits {
    /// Largest source the pipeline will read, in bytes.
    pub max_bytes: u64,
}

impl Default for ReadLimits {
    fn default() -> ReadLimits {
        ReadLimits {
            max_bytes: DEFAULT_MAX_BYTES,
        }
    }
}

/// Byte-source collaborator: hands the pipeline a complete in-memory
/// copy of the source. Remote retrieval, retries and locking live behind
/// this boundary, outside the core.
pub trait ByteSource {
    fn fetch(&self) -> Result<Vec<u8>>;
}

/// Local file source with fail-fast validation.
///
/// The file must exist, be a regular readable file, and fit under the
/// configured size ceiling; violations surface as [`Error::Access`] with a
/// short user message and a detailed internal one, before any decode work.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    limits: ReadLimits,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>, limits: ReadLimits) -> FileSource {
        FileSource {
            path: path.into(),
            limits,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the file name says the payload is gzip-compressed.
    pub fn is_gzip_name(&self) -> bool {
        self.path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("gz"))
            .unwrap_or(false)
    }
}

impl ByteSource for FileSource {
    fn fetch(&self) -> Result<Vec<u8>> {
        let meta = std::fs::metadata(&self.path).map_err(|e| Error::Access {
            user: String::from("File was not found or is not accessible"),
            detail: format!("{}: {e}", self.path.display()),
        })?;
        if !meta.is_file() {
            return Err(Error::Access {
                user: String::from("Source is not a regular file"),
                detail: format!("{}", self.path.display()),
            });
        }
        if meta.len() > self.limits.max_bytes {
            return Err(Error::Access {
                user: String::from("File is too large to load"),
                detail: format!(
                    "{}: {} bytes exceeds the {} byte limit",
                    self.path.display(),
                    meta.len(),
                    self.limits.max_bytes
                ),
            });
        }
        std::fs::read(&self.path).map_err(|e| Error::Access {
            user: String::from("File could not be read"),
            detail: format!("{}: {e}", self.path.display()),
        })
    }
}

// ── Requests ──

/// Pixel- or sky-cornered crop box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CropBox {
    /// Inclusive 0-based pixel corners.
    Pixels {
        min_x: i64,
        min_y: i64,
        max_x: i64,
        max_y: i64,
    },
    /// Sky corners in degrees, projected per image.
    World {
        ra1: f64,
        dec1: f64,
        ra2: f64,
        dec2: f64,
    },
}

/// The crop stage: either a cornered box or a centered cutout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CropRequest {
    Box(CropBox),
    Center {
        ra_deg: f64,
        dec_deg: f64,
        radius_deg: f64,
    },
}

/// Per-read transform request. Stages run in the fixed order
/// flip, rotate, crop; absent stages are skipped.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PipelineRequest {
    pub flip: bool,
    pub rotate: Option<RotationSpec>,
    pub crop: Option<CropRequest>,
}

/// Which step last modified the pixels (and so produced the working file).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModReason {
    Unzipped,
    Flipped,
    Rotated,
    Cropped,
    CroppedAndCentered,
}

impl ModReason {
    fn file_stem(self) -> &'static str {
        match self {
            ModReason::Unzipped => "unzipped",
            ModReason::Flipped => "flipped",
            ModReason::Rotated => "rotated",
            ModReason::Cropped => "cropped",
            ModReason::CroppedAndCentered => "crop-centered",
        }
    }
}

/// The finished read: per-plane images plus modified-file bookkeeping for
/// downstream caching.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub images: Vec<FitsImage>,
    /// The last pixel-modifying step, implicit decompression included.
    pub modified: Option<ModReason>,
    /// Re-encoded FITS written for reuse, when a workdir is configured and
    /// some step modified the pixels.
    pub working_file: Option<PathBuf>,
}

// ── Orchestrator ──

/// Sequences the per-read transform stages.
#[derive(Default)]
pub struct Pipeline<'a> {
    reprojector: Option<&'a dyn Reproject>,
    workdir: Option<PathBuf>,
}

impl<'a> Pipeline<'a> {
    pub fn new() -> Pipeline<'a> {
        Pipeline {
            reprojector: None,
            workdir: None,
        }
    }

    /// Supply the rotation collaborator; without one, rotation requests
    /// fail.
    pub fn with_reprojector(mut self, r: &'a dyn Reproject) -> Pipeline<'a> {
        self.reprojector = Some(r);
        self
    }

    /// Directory for re-encoded working files. Without one, modified-file
    /// tracking still reports the producing step but writes nothing.
    pub fn with_workdir(mut self, dir: impl Into<PathBuf>) -> Pipeline<'a> {
        self.workdir = Some(dir.into());
        self
    }

    /// Run the full read against an arbitrary byte source.
    pub fn run(&self, source: &dyn ByteSource, request: &PipelineRequest) -> Result<PipelineOutcome> {
        let bytes = source.fetch()?;

        let mut modified = None;
        let bytes = if is_gzipped(&bytes) {
            debug!("inflating gzip source ({} bytes)", bytes.len());
            modified = Some(ModReason::Unzipped);
            gunzip(&bytes)?
        } else {
            bytes
        };

        let mut images = decode(&bytes)?;
        debug!("decoded {} image plane(s)", images.len());

        if request.flip {
            images = map_images(images, flip_lr)?;
            modified = Some(ModReason::Flipped);
        }

        if let Some(spec) = request.rotate {
            let reprojector = self
                .reprojector
                .ok_or(Error::Geometry("no reprojector configured"))?;
            images = map_images(images, |img| rotate(img, spec, reprojector))?;
            modified = Some(ModReason::Rotated);
        }

        match request.crop {
            None => {}
            Some(CropRequest::Box(bbox)) => {
                images = map_images(images, |img| crop_box(img, bbox))?;
                modified = Some(ModReason::Cropped);
            }
            Some(CropRequest::Center {
                ra_deg,
                dec_deg,
                radius_deg,
            }) => {
                images = map_images(images, |img| {
                    crop_and_center(img, ra_deg, dec_deg, radius_deg)
                })?;
                modified = Some(ModReason::CroppedAndCentered);
            }
        }

        let working_file = match (modified, &self.workdir) {
            (Some(reason), Some(dir)) => {
                let path = dir.join(format!("{}.fits", reason.file_stem()));
                std::fs::write(&path, encode(&images)?)?;
                debug!("working file written to {}", path.display());
                Some(path)
            }
            _ => None,
        };

        Ok(PipelineOutcome {
            images,
            modified,
            working_file,
        })
    }

    /// Convenience wrapper: validate and read a local file, then run.
    pub fn run_file(
        &self,
        path: impl Into<PathBuf>,
        limits: ReadLimits,
        request: &PipelineRequest,
    ) -> Result<PipelineOutcome> {
        self.run(&FileSource::new(path, limits), request)
    }
}

fn map_images(
    images: Vec<FitsImage>,
    f: impl Fn(&FitsImage) -> Result<FitsImage>,
) -> Result<Vec<FitsImage>> {
    let mut out = Vec::with_capacity(images.len());
    for img in &images {
        out.push(f(img)?);
    }
    Ok(out)
}

fn crop_box(image: &FitsImage, bbox: CropBox) -> Result<FitsImage> {
    match bbox {
        CropBox::Pixels {
            min_x,
            min_y,
            max_x,
            max_y,
        } => crop(image, min_x, min_y, max_x, max_y),
        CropBox::World {
            ra1,
            dec1,
            ra2,
            dec2,
        } => {
            let (x1, y1) = image.wcs().sky_to_pixel(ra1, dec1)?;
            let (x2, y2) = image.wcs().sky_to_pixel(ra2, dec2)?;
            crop(
                image,
                libm::round(x1) as i64,
                libm::round(y1) as i64,
                libm::round(x2) as i64,
                libm::round(y2) as i64,
            )
        }
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{Card, Value};
    use crate::codec::serialize_header;
    use crate::pixels::PixelData;

    fn image_cards(bitpix: i64, dims: &[usize]) -> Vec<Card> {
        let mut cards = vec![
            Card::new("SIMPLE", Value::Logical(true)),
            Card::new("BITPIX", Value::Integer(bitpix)),
            Card::new("NAXIS", Value::Integer(dims.len() as i64)),
        ];
        for (i, &d) in dims.iter().enumerate() {
            cards.push(Card::new(
                &format!("NAXIS{}", i + 1),
                Value::Integer(d as i64),
            ));
        }
        cards
    }

    fn build_fits(cards: &[Card], data: &[u8]) -> Vec<u8> {
        let mut out = serialize_header(cards);
        let start = out.len();
        out.resize(start + crate::codec::padded_byte_len(data.len()), 0);
        out[start..start + data.len()].copy_from_slice(data);
        out
    }

    fn sample_fits() -> Vec<u8> {
        let mut cards = image_cards(16, &[4, 4]);
        cards.push(Card::new("CDELT1", Value::Float(-0.001)));
        cards.push(Card::new("CDELT2", Value::Float(0.001)));
        let data: Vec<u8> = (0..16i16).flat_map(|v| v.to_be_bytes()).collect();
        build_fits(&cards, &data)
    }

    fn gzip_bytes(plain: &[u8]) -> Vec<u8> {
        let deflated = miniz_oxide::deflate::compress_to_vec(plain, 6);
        let mut gz = vec![0x1f, 0x8b, 0x08, 0, 0, 0, 0, 0, 0, 0xff];
        gz.extend_from_slice(&deflated);
        gz.extend_from_slice(&[0u8; 8]);
        gz
    }

    struct MemSource(Vec<u8>);

    impl ByteSource for MemSource {
        fn fetch(&self) -> Result<Vec<u8>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn plain_decode_reports_no_modification() {
        let outcome = Pipeline::new()
            .run(&MemSource(sample_fits()), &PipelineRequest::default())
            .unwrap();
        assert_eq!(outcome.images.len(), 1);
        assert_eq!(outcome.modified, None);
        assert!(outcome.working_file.is_none());
    }

    #[test]
    fn gzip_source_records_unzip_step() {
        let outcome = Pipeline::new()
            .run(&MemSource(gzip_bytes(&sample_fits())), &PipelineRequest::default())
            .unwrap();
        assert_eq!(outcome.modified, Some(ModReason::Unzipped));
        assert_eq!(outcome.images[0].pixels().len(), 16);
    }

    #[test]
    fn later_step_supersedes_unzip() {
        let request = PipelineRequest {
            flip: true,
            ..Default::default()
        };
        let outcome = Pipeline::new()
            .run(&MemSource(gzip_bytes(&sample_fits())), &request)
            .unwrap();
        assert_eq!(outcome.modified, Some(ModReason::Flipped));
    }

    #[test]
    fn flip_then_crop_ordering() {
        // Flip runs before crop: the cropped corner must come from the
        // flipped orientation.
        let request = PipelineRequest {
            flip: true,
            crop: Some(CropRequest::Box(CropBox::Pixels {
                min_x: 0,
                min_y: 0,
                max_x: 1,
                max_y: 0,
            })),
            ..Default::default()
        };
        let outcome = Pipeline::new()
            .run(&MemSource(sample_fits()), &request)
            .unwrap();
        assert_eq!(outcome.modified, Some(ModReason::Cropped));
        // Row 0 flipped is [3,2,1,0]; its first two cells are 3,2.
        assert_eq!(
            outcome.images[0].pixels(),
            &PixelData::I16(vec![3, 2])
        );
    }

    #[test]
    fn rotation_without_reprojector_fails() {
        let request = PipelineRequest {
            rotate: Some(RotationSpec::North),
            ..Default::default()
        };
        let err = Pipeline::new()
            .run(&MemSource(sample_fits()), &request)
            .unwrap_err();
        assert!(matches!(err, Error::Geometry(_)));
    }

    #[test]
    fn identical_requests_are_idempotent() {
        let request = PipelineRequest {
            flip: true,
            crop: Some(CropRequest::Box(CropBox::Pixels {
                min_x: 1,
                min_y: 1,
                max_x: 3,
                max_y: 3,
            })),
            ..Default::default()
        };
        let a = Pipeline::new()
            .run(&MemSource(sample_fits()), &request)
            .unwrap();
        let b = Pipeline::new()
            .run(&MemSource(sample_fits()), &request)
            .unwrap();
        assert_eq!(
            crate::codec::encode(&a.images).unwrap(),
            crate::codec::encode(&b.images).unwrap()
        );
    }

    #[test]
    fn file_source_validates_missing_file() {
        let err = FileSource::new("/nonexistent/nope.fits", ReadLimits::default())
            .fetch()
            .unwrap_err();
        match err {
            Error::Access { user, detail } => {
                assert!(user.contains("not found"));
                assert!(detail.contains("nope.fits"));
            }
            other => panic!("expected Access, got {:?}", other),
        }
    }

    #[test]
    fn file_source_validates_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.fits");
        std::fs::write(&path, sample_fits()).unwrap();

        let err = FileSource::new(&path, ReadLimits { max_bytes: 100 })
            .fetch()
            .unwrap_err();
        match err {
            Error::Access { user, detail } => {
                assert!(user.contains("too large"));
                assert!(detail.contains("100 byte limit"));
            }
            other => panic!("expected Access, got {:?}", other),
        }
    }

    #[test]
    fn file_roundtrip_with_working_file() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("input.fits");
        std::fs::write(&src, sample_fits()).unwrap();

        let request = PipelineRequest {
            crop: Some(CropRequest::Box(CropBox::Pixels {
                min_x: 1,
                min_y: 1,
                max_x: 2,
                max_y: 2,
            })),
            ..Default::default()
        };
        let outcome = Pipeline::new()
            .with_workdir(dir.path())
            .run_file(&src, ReadLimits::default(), &request)
            .unwrap();

        assert_eq!(outcome.modified, Some(ModReason::Cropped));
        let working = outcome.working_file.unwrap();
        assert!(working.ends_with("cropped.fits"));

        // The working file reloads to the same pixels.
        let reread = Pipeline::new()
            .run_file(&working, ReadLimits::default(), &PipelineRequest::default())
            .unwrap();
        assert_eq!(reread.images[0].pixels(), outcome.images[0].pixels());
    }

    #[test]
    fn gzip_file_extension_hint() {
        let fs = FileSource::new("/tmp/some.fits.gz", ReadLimits::default());
        assert!(fs.is_gzip_name());
        let fs = FileSource::new("/tmp/some.fits", ReadLimits::default());
        assert!(!fs.is_gzip_name());
    }

    #[test]
    fn unmodified_read_writes_no_working_file() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("input.fits");
        std::fs::write(&src, sample_fits()).unwrap();

        let outcome = Pipeline::new()
            .with_workdir(dir.path())
            .run_file(&src, ReadLimits::default(), &PipelineRequest::default())
            .unwrap();
        assert!(outcome.working_file.is_none());
    }

    #[test]
    fn world_cornered_crop() {
        let mut cards = image_cards(16, &[10, 10]);
        cards.push(Card::new("CTYPE1", Value::String("RA---TAN".into())));
        cards.push(Card::new("CRPIX1", Value::Float(5.0)));
        cards.push(Card::new("CRPIX2", Value::Float(5.0)));
        cards.push(Card::new("CRVAL1", Value::Float(120.0)));
        cards.push(Card::new("CRVAL2", Value::Float(30.0)));
        cards.push(Card::new("CDELT1", Value::Float(-0.001)));
        cards.push(Card::new("CDELT2", Value::Float(0.001)));
        let data: Vec<u8> = (0..100i16).flat_map(|v| v.to_be_bytes()).collect();
        let fits = build_fits(&cards, &data);

        let request = PipelineRequest {
            crop: Some(CropRequest::Center {
                ra_deg: 120.0,
                dec_deg: 30.0,
                radius_deg: 0.002,
            }),
            ..Default::default()
        };
        let outcome = Pipeline::new().run(&MemSource(fits), &request).unwrap();
        assert_eq!(outcome.modified, Some(ModReason::CroppedAndCentered));
        assert_eq!((outcome.images[0].width(), outcome.images[0].height()), (5, 5));
    }
}
