//! quest-core
//!
//! Blocking helpers behind the Quest launcher's native plugin.
//! - Enumerates installed apps through a `Platform` and classifies them (VR-capable / 2D).
//! - Encodes platform icons as JPEG and loads raw images for textures.
//! - Back-fills last-used timestamps from the usage-stats report.
//! - Extracts and upserts zip archives, and keeps icon-pack caches in sync.
//!
//! Every call runs on the caller's thread; nothing is spawned.

pub mod archive;
pub mod catalog;
pub mod config;
pub mod errors;
pub mod icon;
pub mod platform;
pub mod state;
pub mod types;
pub mod usage;

#[cfg(test)]
pub(crate) mod testing;

pub use archive::{extract_archive, sync_icon_packs, upsert_archive_entry};
pub use catalog::AppCatalog;
pub use config::{AppFilter, CatalogConfig};
pub use errors::{PlatformError, QuestError, Result};
pub use icon::{encode_icon_jpeg, load_raw_image};
pub use platform::Platform;
pub use state::CatalogState;
pub use types::*;
