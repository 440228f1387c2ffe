use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong while walking a RIFF container.
#[derive(Debug, Error)]
pub enum RiffError {
    /// A fixed-size primitive could not be read in full.
    #[error("Unable to read {expected} bytes: corrupt RIFF file")]
    CorruptFile { expected: usize },

    /// The outer tag is neither `RIFF` nor `RIFX`.
    #[error("Not a valid RIFF file: found container tag '{0}'")]
    InvalidFormat(String),

    #[error("Truncated file: header declares {declared} bytes but only {actual} are present")]
    TruncatedFile { declared: u64, actual: u64 },

    /// A chunk or list claims more bytes than its enclosing scope has left.
    #[error("Element size mismatch for element '{tag}': need {needed} but have only {available}")]
    ElementSizeMismatch {
        tag: String,
        needed: u32,
        available: u64,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Failure while decoding a particular file; the cause is kept as the source.
    #[error("Problem reading file {}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: Box<RiffError>,
    },
}

impl RiffError {
    /// Maps a failed primitive read onto `CorruptFile` when the stream ran dry.
    pub(crate) fn short_read(err: io::Error, expected: usize) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof => RiffError::CorruptFile { expected },
            _ => RiffError::Io(err),
        }
    }

    pub(crate) fn in_file(self, path: impl Into<PathBuf>) -> Self {
        RiffError::File {
            path: path.into(),
            source: Box::new(self),
        }
    }

    /// True for errors a list scope may contain without aborting the file.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, RiffError::ElementSizeMismatch { .. })
    }
}

pub type Result<T> = std::result::Result<T, RiffError>;
