use failure::Fail;
use std::io;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can abort a detection run
#[derive(Debug, Fail)]
pub enum Error {
    #[fail(display = "invalid image: {}", reason)]
    InvalidImage { reason: String },
    #[fail(display = "failed to decode {:?}: {}", path, cause)]
    Decode {
        path: PathBuf,
        #[cause]
        cause: image::ImageError,
    },
    #[fail(
        display = "image {:?} is {}x{}, expected {}x{}",
        path, actual_width, actual_height, expected_width, expected_height
    )]
    InvalidDimensions {
        path: PathBuf,
        expected_width: u32,
        expected_height: u32,
        actual_width: u32,
        actual_height: u32,
    },
    #[fail(display = "cannot compute a percentage over zero pixels")]
    DivisionByZero,
    #[fail(display = "no images in the source directory: {:?}", dir)]
    SourceEmpty { dir: PathBuf },
    #[fail(display = "source directory not found: {:?}", dir)]
    DirectoryNotFound { dir: PathBuf },
    #[fail(display = "i/o error on {:?}: {}", path, cause)]
    Io {
        path: PathBuf,
        #[cause]
        cause: io::Error,
    },
    #[fail(display = "failed to write {:?}: {}", path, cause)]
    Image {
        path: PathBuf,
        #[cause]
        cause: image::ImageError,
    },
}

impl Error {
    pub(crate) fn invalid_image<S: Into<String>>(reason: S) -> Error {
        Error::InvalidImage {
            reason: reason.into(),
        }
    }

    pub(crate) fn io<P: Into<PathBuf>>(path: P, cause: io::Error) -> Error {
        Error::Io {
            path: path.into(),
            cause,
        }
    }
}
