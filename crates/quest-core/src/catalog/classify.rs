//! The two VR classifications. They read different platform data and can
//! disagree; callers get both and decide.

use crate::errors::PlatformError;
use crate::platform::{
    AppRegistry, ApplicationDescriptor, FeatureInfo, HEADTRACKING_FEATURE, VR_MODE_METADATA_KEY,
    VR_ONLY_MODE,
};
use log::{debug, warn};

/// Application-mode metadata, three-way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VrMode {
    /// No metadata bundle, or no mode key in it.
    Absent,
    VrOnly,
    Other(String),
}

impl VrMode {
    pub fn of(app: &ApplicationDescriptor) -> Self {
        match app.metadata_value(VR_MODE_METADATA_KEY) {
            None => VrMode::Absent,
            Some(VR_ONLY_MODE) => VrMode::VrOnly,
            Some(other) => VrMode::Other(other.to_string()),
        }
    }

    pub fn is_2d(&self) -> bool {
        !matches!(self, VrMode::VrOnly)
    }
}

pub fn declares_headtracking(features: Option<&[FeatureInfo]>) -> bool {
    features.is_some_and(|fs| {
        fs.iter()
            .any(|f| f.name.as_deref() == Some(HEADTRACKING_FEATURE))
    })
}

/// Feature-based check. Lookup failures resolve to `false`; this never errors.
pub fn is_vr_capable<R: AppRegistry + ?Sized>(registry: &R, package_name: &str) -> bool {
    match registry.required_features(package_name) {
        Ok(features) => declares_headtracking(features.as_deref()),
        Err(PlatformError::PackageNotFound(_)) => {
            debug!("{package_name}: no longer installed, treating as not VR-capable");
            false
        }
        Err(e) => {
            warn!("{package_name}: feature lookup failed ({e}), treating as not VR-capable");
            false
        }
    }
}
