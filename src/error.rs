use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum JoyeError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Not a joyebox container (bad magic)")]
    BadMagic,

    #[error("Unsupported container version: {0}")]
    UnsupportedVersion(u8),

    #[error("Truncated header")]
    TruncatedHeader,

    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Password must not be empty")]
    EmptyPassword,

    #[error("Tag blob too large: {0} bytes, max 65535")]
    TagsTooLarge(usize),

    #[error("Seek resolves to a negative position: {0}")]
    NegativeSeek(i64),

    #[error("Session already finished")]
    SessionFinished,

    #[error("Authentication tag mismatch")]
    AuthenticationMismatch,
}

pub type Result<T> = std::result::Result<T, JoyeError>;

/// Reader and Writer expose the standard `Read`/`Write`/`Seek` traits, so
/// container errors raised inside those calls travel as `io::Error` payloads.
impl From<JoyeError> for io::Error {
    fn from(err: JoyeError) -> Self {
        match err {
            JoyeError::Io(e) => e,
            JoyeError::BadMagic | JoyeError::UnsupportedVersion(_) | JoyeError::TruncatedHeader => {
                io::Error::new(io::ErrorKind::InvalidData, err)
            }
            JoyeError::NegativeSeek(_)
            | JoyeError::EmptyPassword
            | JoyeError::TagsTooLarge(_)
            | JoyeError::SessionFinished => io::Error::new(io::ErrorKind::InvalidInput, err),
            JoyeError::Crypto(_) | JoyeError::Json(_) | JoyeError::AuthenticationMismatch => {
                io::Error::new(io::ErrorKind::Other, err)
            }
        }
    }
}
