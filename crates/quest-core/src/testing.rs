//! In-memory platform for unit tests. Clones share state.

use crate::errors::PlatformError;
use crate::platform::{
    ActivityLauncher, AppRegistry, ApplicationDescriptor, FeatureInfo, IconBitmap,
    UsageStatsSource, VR_MODE_METADATA_KEY,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

pub const HOST_PACKAGE: &str = "aaa.QuestAppLauncher.App";

#[derive(Debug, Clone)]
pub struct FakeApp {
    descriptor: ApplicationDescriptor,
    label: Option<String>,
    features: Option<Vec<FeatureInfo>>,
    icon: Option<IconBitmap>,
}

impl FakeApp {
    pub fn new(package_name: &str) -> Self {
        Self {
            descriptor: ApplicationDescriptor {
                package_name: package_name.to_string(),
                flags: 0,
                metadata: None,
            },
            label: None,
            features: None,
            icon: None,
        }
    }

    pub fn flags(mut self, flags: u32) -> Self {
        self.descriptor.flags = flags;
        self
    }

    pub fn label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn vr_mode(mut self, mode: &str) -> Self {
        self.descriptor
            .metadata
            .get_or_insert_with(BTreeMap::new)
            .insert(VR_MODE_METADATA_KEY.to_string(), mode.to_string());
        self
    }

    pub fn features(mut self, features: Vec<FeatureInfo>) -> Self {
        self.features = Some(features);
        self
    }

    pub fn icon(mut self, icon: IconBitmap) -> Self {
        self.icon = Some(icon);
        self
    }
}

#[derive(Default)]
struct FakeState {
    apps: Vec<FakeApp>,
    enumeration_error: Option<PlatformError>,
    feature_error: Option<PlatformError>,
    usage_access: bool,
    usage: HashMap<String, i64>,
    queries: Vec<(i64, i64)>,
    settings_opened: usize,
    launched: Vec<String>,
}

#[derive(Clone, Default)]
pub struct FakePlatform {
    inner: Arc<Mutex<FakeState>>,
}

impl FakePlatform {
    pub fn new(apps: Vec<FakeApp>) -> Self {
        let p = Self::default();
        p.state().apps = apps;
        p
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.inner.lock().unwrap()
    }

    pub fn install(&self, app: FakeApp) {
        self.state().apps.push(app);
    }

    pub fn uninstall(&self, package_name: &str) {
        self.state()
            .apps
            .retain(|a| a.descriptor.package_name != package_name);
    }

    pub fn fail_enumeration_with(&self, e: PlatformError) {
        self.state().enumeration_error = Some(e);
    }

    pub fn fail_features_with(&self, e: PlatformError) {
        self.state().feature_error = Some(e);
    }

    pub fn grant_usage_access(&self, granted: bool) {
        self.state().usage_access = granted;
    }

    pub fn record_usage(&self, package_name: &str, last_used_ms: i64) {
        self.state()
            .usage
            .insert(package_name.to_string(), last_used_ms);
    }

    pub fn usage_queries(&self) -> Vec<(i64, i64)> {
        self.state().queries.clone()
    }

    pub fn settings_opened(&self) -> usize {
        self.state().settings_opened
    }

    pub fn launched(&self) -> Vec<String> {
        self.state().launched.clone()
    }

    fn find(&self, package_name: &str) -> Result<FakeApp, PlatformError> {
        self.state()
            .apps
            .iter()
            .find(|a| a.descriptor.package_name == package_name)
            .cloned()
            .ok_or_else(|| PlatformError::PackageNotFound(package_name.to_string()))
    }
}

impl AppRegistry for FakePlatform {
    fn installed_applications(&self) -> Result<Vec<ApplicationDescriptor>, PlatformError> {
        let st = self.state();
        if let Some(e) = &st.enumeration_error {
            return Err(e.clone());
        }
        Ok(st.apps.iter().map(|a| a.descriptor.clone()).collect())
    }

    fn application_label(&self, app: &ApplicationDescriptor) -> Result<String, PlatformError> {
        let found = self.find(&app.package_name)?;
        Ok(found.label.unwrap_or_else(|| app.package_name.clone()))
    }

    fn required_features(
        &self,
        package_name: &str,
    ) -> Result<Option<Vec<FeatureInfo>>, PlatformError> {
        if let Some(e) = &self.state().feature_error {
            return Err(e.clone());
        }
        Ok(self.find(package_name)?.features)
    }

    fn application_icon(&self, app: &ApplicationDescriptor) -> Result<IconBitmap, PlatformError> {
        self.find(&app.package_name)?
            .icon
            .ok_or_else(|| PlatformError::Call(format!("no icon for {}", app.package_name)))
    }

    fn own_package_name(&self) -> Result<String, PlatformError> {
        Ok(HOST_PACKAGE.to_string())
    }
}

impl UsageStatsSource for FakePlatform {
    fn has_usage_access(&self) -> Result<bool, PlatformError> {
        Ok(self.state().usage_access)
    }

    fn last_used_between(
        &self,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<HashMap<String, i64>, PlatformError> {
        let mut st = self.state();
        st.queries.push((start_ms, end_ms));
        Ok(st
            .usage
            .iter()
            .filter(|(_, ts)| (start_ms..=end_ms).contains(*ts))
            .map(|(k, v)| (k.clone(), *v))
            .collect())
    }
}

impl ActivityLauncher for FakePlatform {
    fn open_usage_access_settings(&self) -> Result<(), PlatformError> {
        self.state().settings_opened += 1;
        Ok(())
    }

    fn launch_package(&self, package_name: &str) -> Result<(), PlatformError> {
        self.find(package_name)?;
        self.state().launched.push(package_name.to_string());
        Ok(())
    }
}
