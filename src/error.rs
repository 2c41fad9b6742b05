use std::fmt;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    /// The page geometry cannot hold a page: non-finite or non-positive size,
    /// or margins that leave no content width.
    InvalidPage { width: f32, height: f32 },
    /// The image codec could not decode or re-encode a raster.
    Codec(String),
    /// A CLI manifest could not be read or parsed.
    Manifest(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {e}"),
            Error::InvalidPage { width, height } => {
                write!(f, "cannot allocate a {width}x{height} mm page")
            }
            Error::Codec(msg) => write!(f, "image codec error: {msg}"),
            Error::Manifest(msg) => write!(f, "invalid manifest: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<image::ImageError> for Error {
    fn from(e: image::ImageError) -> Self {
        Error::Codec(e.to_string())
    }
}
