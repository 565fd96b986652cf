use std::path::PathBuf;

/// Core error type for the self bot.
///
/// Adapter crates map their transport errors into this type so the dispatcher
/// can handle failures consistently (user-facing reply vs. log and move on).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Persisted state could not be parsed. Callers recover with an empty default.
    #[error("malformed state in {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },

    /// The remote media store rejected the upload or was unreachable.
    #[error("upload failed: {0}")]
    UploadFailed(String),

    #[error("image error: {0}")]
    Image(String),

    #[error("external error: {0}")]
    External(String),
}

impl From<image::ImageError> for Error {
    fn from(e: image::ImageError) -> Self {
        Error::Image(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::External(format!("http error: {e}"))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
