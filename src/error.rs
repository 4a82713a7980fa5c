use crate::prelude::*;
use thiserror::Error;

/// Represents a failure to produce or store a MIDI file.
///
/// Note that invalid composition input is never reported through this type: such calls are
/// skipped and recorded as a [`Rejection`](struct.Rejection.html) instead, and the rest of the
/// document is still rendered.
///
/// Errors are broadly categorized into 2 classes:
///
/// - [`Error::Encoding`](#variant.Encoding): the document cannot be represented as a Standard
///   Midi File. This is always a hard failure; nothing is written out.
/// - [`Error::Storage`](#variant.Storage): the document was rendered, but the underlying writer
///   failed. No guarantees are made about how much data reached the writer.
#[derive(Debug, Error)]
pub enum Error {
    /// A limit of the file format was exceeded, such as a delta time that does not fit in a
    /// 28-bit variable-length integer, or more than 65535 tracks.
    ///
    /// The message is informative and non-normative.
    #[error("invalid midi encoding: {0}")]
    Encoding(&'static str),

    /// Writing the rendered file to its destination failed.
    #[error("failed to store midi file: {0}")]
    Storage(#[from] io::Error),
}
impl Error {
    /// Whether this error was produced by the underlying storage rather than by the encoder.
    #[inline]
    pub fn is_storage(&self) -> bool {
        matches!(self, Error::Storage(_))
    }

    /// Get the informative message of an encoding error.
    #[inline]
    pub fn message(&self) -> Option<&'static str> {
        match *self {
            Error::Encoding(msg) => Some(msg),
            Error::Storage(_) => None,
        }
    }
}

macro_rules! err_encoding {
    ($msg:expr) => {{
        $crate::error::Error::Encoding($msg)
    }};
}

/// The result type used by the MIDI encoder.
pub type Result<T> = StdResult<T, Error>;
