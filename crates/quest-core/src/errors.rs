use thiserror::Error;

#[derive(Debug, Error)]
pub enum QuestError {
    #[error("{0}")]
    Msg(String),

    #[error("index {index} out of range (catalog holds {len} apps)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("catalog not loaded")]
    NotLoaded,

    #[error("unsafe archive entry name: {0}")]
    UnsafeEntry(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),
}

impl From<anyhow::Error> for QuestError {
    fn from(e: anyhow::Error) -> Self {
        QuestError::Msg(e.to_string())
    }
}

/// Failures reported by a platform collaborator.
///
/// `PackageNotFound` is the expected-absent case (the package went away
/// between enumeration and lookup); the rest are real call failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    #[error("package not found: {0}")]
    PackageNotFound(String),

    #[error("platform call failed: {0}")]
    Call(String),

    #[error("platform not available")]
    Unavailable,
}

impl PlatformError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, PlatformError::PackageNotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, QuestError>;
