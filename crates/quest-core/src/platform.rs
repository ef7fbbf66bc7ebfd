//! Platform collaborators the catalog talks to.
//!
//! The Android implementation lives in the plugin crate; tests use an
//! in-memory fake. Everything here is blocking and called on the host's thread.

use crate::errors::PlatformError;
use std::collections::{BTreeMap, HashMap};

/// `ApplicationInfo.FLAG_SYSTEM`
pub const FLAG_SYSTEM: u32 = 1 << 0;
/// `ApplicationInfo.FLAG_UPDATED_SYSTEM_APP`
pub const FLAG_UPDATED_SYSTEM_APP: u32 = 1 << 7;

/// Required feature that marks a headset-native app.
pub const HEADTRACKING_FEATURE: &str = "android.hardware.vr.headtracking";
/// Application metadata key carrying the VR UI mode.
pub const VR_MODE_METADATA_KEY: &str = "com.samsung.android.vr.application.mode";
pub const VR_ONLY_MODE: &str = "vr_only";

/// What the registry reports for one installed application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationDescriptor {
    pub package_name: String,
    pub flags: u32,
    /// `None` when the application declares no metadata bundle at all.
    pub metadata: Option<BTreeMap<String, String>>,
}

impl ApplicationDescriptor {
    pub fn is_system(&self) -> bool {
        self.flags & (FLAG_SYSTEM | FLAG_UPDATED_SYSTEM_APP) != 0
    }

    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata.as_ref()?.get(key).map(String::as_str)
    }
}

/// One entry of a package's required features. Name is absent for GL-ES version entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureInfo {
    pub name: Option<String>,
}

impl FeatureInfo {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }
}

/// Icon as rendered by the platform: tightly packed RGBA8, rows top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconBitmap {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

pub trait AppRegistry {
    /// Installed applications with their metadata bundles, in platform order.
    fn installed_applications(&self) -> Result<Vec<ApplicationDescriptor>, PlatformError>;

    fn application_label(&self, app: &ApplicationDescriptor) -> Result<String, PlatformError>;

    /// Declared required features. `Ok(None)` when the package declares none.
    fn required_features(&self, package_name: &str)
        -> Result<Option<Vec<FeatureInfo>>, PlatformError>;

    fn application_icon(&self, app: &ApplicationDescriptor) -> Result<IconBitmap, PlatformError>;

    /// Package name of the launcher itself.
    fn own_package_name(&self) -> Result<String, PlatformError>;
}

pub trait UsageStatsSource {
    fn has_usage_access(&self) -> Result<bool, PlatformError>;

    /// Aggregated usage over `[start_ms, end_ms]`: package name to last-seen epoch millis.
    fn last_used_between(
        &self,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<HashMap<String, i64>, PlatformError>;
}

pub trait ActivityLauncher {
    /// Open the system's usage-access settings screen. Fire-and-forget.
    fn open_usage_access_settings(&self) -> Result<(), PlatformError>;

    fn launch_package(&self, package_name: &str) -> Result<(), PlatformError>;
}

/// Everything the catalog needs from the device.
pub trait Platform: AppRegistry + UsageStatsSource + ActivityLauncher + Send + Sync {}

impl<T> Platform for T where T: AppRegistry + UsageStatsSource + ActivityLauncher + Send + Sync {}
