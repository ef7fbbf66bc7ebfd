//! The installed-app catalog: one enumeration per activation, then index-based reads.

pub mod classify;

use crate::config::{AppFilter, CatalogConfig};
use crate::errors::{QuestError, Result};
use crate::icon::encode_icon_jpeg;
use crate::platform::{AppRegistry, Platform};
use crate::types::InstalledApp;
use classify::VrMode;
use log::{debug, info};
use quest_abi::AppSnapshot;
use std::sync::Arc;

pub use classify::{declares_headtracking, is_vr_capable};

/// Enumerate installed apps, dropping system apps and anything `filter` excludes.
pub fn enumerate<R: AppRegistry + ?Sized>(
    registry: &R,
    filter: AppFilter,
) -> Result<Vec<InstalledApp>> {
    let mut apps = Vec::new();
    for app in registry.installed_applications()? {
        if app.is_system() {
            continue;
        }
        if filter == AppFilter::VrOnly && VrMode::of(&app) != VrMode::VrOnly {
            debug!("skipping non vr_only app {}", app.package_name);
            continue;
        }
        apps.push(InstalledApp::new(app));
    }
    Ok(apps)
}

pub struct AppCatalog {
    platform: Arc<dyn Platform>,
    config: CatalogConfig,
    pub(crate) apps: Vec<InstalledApp>,
}

impl AppCatalog {
    pub fn load(platform: Arc<dyn Platform>, config: CatalogConfig) -> Result<Self> {
        let apps = enumerate(platform.as_ref(), config.filter)?;
        info!("catalog loaded: {} apps ({:?})", apps.len(), config.filter);
        Ok(Self {
            platform,
            config,
            apps,
        })
    }

    /// Re-enumerate, discarding usage timestamps. Returns the new size.
    pub fn reload(&mut self) -> Result<usize> {
        self.apps = enumerate(self.platform.as_ref(), self.config.filter)?;
        info!("catalog reloaded: {} apps", self.apps.len());
        Ok(self.apps.len())
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    pub(crate) fn platform(&self) -> &dyn Platform {
        self.platform.as_ref()
    }

    pub fn size(&self) -> usize {
        self.apps.len()
    }

    pub fn apps(&self) -> &[InstalledApp] {
        &self.apps
    }

    pub fn get(&self, index: usize) -> Result<&InstalledApp> {
        self.apps.get(index).ok_or(QuestError::IndexOutOfRange {
            index,
            len: self.apps.len(),
        })
    }

    pub fn package_name_at(&self, index: usize) -> Result<&str> {
        Ok(self.get(index)?.package_name())
    }

    pub fn display_name_at(&self, index: usize) -> Result<String> {
        let app = self.get(index)?;
        Ok(self.platform.application_label(&app.app)?)
    }

    /// Declares `android.hardware.vr.headtracking`. Only the bounds check can fail.
    pub fn is_vr_capable_at(&self, index: usize) -> Result<bool> {
        let app = self.get(index)?;
        Ok(is_vr_capable(self.platform.as_ref(), app.package_name()))
    }

    /// Lacks the `vr_only` mode metadata. Only the bounds check can fail.
    pub fn is_2d_at(&self, index: usize) -> Result<bool> {
        Ok(VrMode::of(&self.get(index)?.app).is_2d())
    }

    pub fn last_used_at(&self, index: usize) -> Result<Option<i64>> {
        Ok(self.get(index)?.last_used)
    }

    /// Platform icon encoded as JPEG at the configured quality.
    pub fn icon_bytes_at(&self, index: usize) -> Result<Vec<u8>> {
        let app = self.get(index)?;
        let bitmap = self.platform.application_icon(&app.app)?;
        encode_icon_jpeg(&bitmap, self.config.icon_jpeg_quality)
    }

    pub fn snapshot(&self) -> Result<Vec<AppSnapshot>> {
        self.apps
            .iter()
            .enumerate()
            .map(|(index, app)| {
                Ok(AppSnapshot {
                    index,
                    package_name: app.package_name().to_string(),
                    display_name: self.platform.application_label(&app.app)?,
                    vr_capable: is_vr_capable(self.platform.as_ref(), app.package_name()),
                    is_2d: VrMode::of(&app.app).is_2d(),
                    last_used: app.last_used,
                })
            })
            .collect()
    }

    pub fn host_package_name(&self) -> Result<String> {
        Ok(self.platform.own_package_name()?)
    }

    pub fn launch_package(&self, package_name: &str) -> Result<()> {
        info!("launching {package_name}");
        Ok(self.platform.launch_package(package_name)?)
    }
}
