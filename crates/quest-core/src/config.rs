use crate::errors::Result;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Which installed apps end up in the catalog. System apps are always dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppFilter {
    /// Every non-system app.
    #[default]
    UserApps,
    /// Only apps flagged `vr_only` in their application metadata.
    VrOnly,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub filter: AppFilter,
    /// JPEG quality for icons, 1..=100.
    pub icon_jpeg_quality: u8,
    /// Fallback window when the host passes a negative day count.
    pub usage_lookback_days: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            filter: AppFilter::UserApps,
            icon_jpeg_quality: 100,
            usage_lookback_days: 30,
        }
    }
}

impl CatalogConfig {
    /// Parse a host-provided JSON object. Blank input means defaults.
    pub fn from_json_str(js: &str) -> Result<Self> {
        if js.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: CatalogConfig = serde_json::from_str(js)?;
        Ok(cfg.normalized())
    }

    /// Read a config file written by the host (e.g. `persistentDataPath/plugin.json`).
    pub fn load(path: &Path) -> Result<Self> {
        let txt = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        Self::from_json_str(&txt)
    }

    pub fn normalized(mut self) -> Self {
        self.icon_jpeg_quality = self.icon_jpeg_quality.clamp(1, 100);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn blank_json_gives_defaults() {
        let cfg = CatalogConfig::from_json_str("  ").unwrap();
        assert_eq!(cfg, CatalogConfig::default());
        assert_eq!(cfg.icon_jpeg_quality, 100);
        assert_eq!(cfg.usage_lookback_days, 30);
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let cfg = CatalogConfig::from_json_str(r#"{"filter":"vr_only"}"#).unwrap();
        assert_eq!(cfg.filter, AppFilter::VrOnly);
        assert_eq!(cfg.icon_jpeg_quality, 100);
    }

    #[test]
    fn quality_is_clamped() {
        let cfg = CatalogConfig::from_json_str(r#"{"icon_jpeg_quality":0}"#).unwrap();
        assert_eq!(cfg.icon_jpeg_quality, 1);
    }

    #[test]
    fn bad_json_is_an_error() {
        assert!(CatalogConfig::from_json_str(r#"{"filter":"everything"}"#).is_err());
    }

    #[test]
    fn loads_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("plugin.json");
        fs::write(&path, r#"{"usage_lookback_days":7}"#).unwrap();
        let cfg = CatalogConfig::load(&path).unwrap();
        assert_eq!(cfg.usage_lookback_days, 7);
    }

    #[test]
    fn missing_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        assert!(CatalogConfig::load(&tmp.path().join("nope.json")).is_err());
    }
}
