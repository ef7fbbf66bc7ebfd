use crate::platform::ApplicationDescriptor;
use serde::{Deserialize, Serialize};

/// A catalog record: the platform descriptor plus what the launcher learned later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledApp {
    pub app: ApplicationDescriptor,
    /// Epoch millis from the usage report; `None` until a report mentions the package.
    pub last_used: Option<i64>,
}

impl InstalledApp {
    pub fn new(app: ApplicationDescriptor) -> Self {
        Self {
            app,
            last_used: None,
        }
    }

    pub fn package_name(&self) -> &str {
        &self.app.package_name
    }
}

/// Decoded image ready for a texture upload: RGBA8, rows top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// What an extraction wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractSummary {
    pub files: usize,
    pub dirs: usize,
    pub bytes: u64,
}

/// Outcome of reconciling `iconpack*.zip` files with their extraction folders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IconPackSync {
    pub extracted: Vec<String>, // folder names under cache/
    pub kept: Vec<String>,
    pub removed: Vec<String>,
    pub failed: Vec<String>, // pack file names
}
