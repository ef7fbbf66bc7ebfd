//! JSON shapes the host reads in bulk instead of walking the index accessors.

use serde::{Deserialize, Serialize};

/// One installed application as seen by the launcher grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSnapshot {
    /// Position in the catalog; valid for the index accessors until the next reload.
    pub index: usize,
    pub package_name: String,
    pub display_name: String,
    /// Declares the headtracking hardware feature.
    pub vr_capable: bool,
    /// Lacks the `vr_only` application-mode metadata.
    pub is_2d: bool,
    /// Epoch millis from the usage report, if one has been applied.
    #[serde(default)]
    pub last_used: Option<i64>,
}
