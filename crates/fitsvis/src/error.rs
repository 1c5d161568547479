use alloc::string::String;

/// All errors that can occur while decoding, transforming, or rendering
/// a FITS image.
#[derive(Debug)]
pub enum Error {
    /// Malformed FITS header block.
    InvalidHeader(&'static str),
    /// Malformed keyword name in a header card.
    InvalidKeyword,
    /// Premature end of data while reading.
    UnexpectedEof,
    /// BITPIX value the raster pipeline does not handle.
    UnsupportedBitpix(i64),
    /// A required keyword was not found in the header.
    MissingKeyword(&'static str),
    /// The image is a data cube with more than one plane where a single
    /// 2-D plane is required.
    CubeUnsupported(usize),
    /// Compressed source data could not be inflated.
    Decompression,
    /// A geometric operation could not be carried out (unsolvable
    /// projection, rotation of an unsupported projection, ...).
    Geometry(&'static str),
    /// The source file failed pre-decode validation. Carries a short
    /// user-facing message and a detailed internal one.
    Access { user: String, detail: String },
    /// Flux lookup landed on a blank/NaN pixel or outside the image.
    /// Expected and non-fatal: "no data at this point".
    PixelOutOfRange,
    /// An I/O error from the standard library.
    #[cfg(feature = "std")]
    Io(std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::InvalidHeader(what) => write!(f, "invalid FITS header: {what}"),
            Error::InvalidKeyword => write!(f, "invalid keyword name"),
            Error::UnexpectedEof => write!(f, "unexpected end of file"),
            Error::UnsupportedBitpix(v) => write!(f, "unsupported BITPIX value: {v}"),
            Error::MissingKeyword(kw) => write!(f, "missing required keyword: {kw}"),
            Error::CubeUnsupported(planes) => {
                write!(f, "data cubes are not supported ({planes} planes)")
            }
            Error::Decompression => write!(f, "failed to decompress source data"),
            Error::Geometry(what) => write!(f, "geometry error: {what}"),
            Error::Access { user, .. } => write!(f, "{user}"),
            Error::PixelOutOfRange => write!(f, "no data at this point"),
            #[cfg(feature = "std")]
            Error::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(feature = "std")]
impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}
