//! Keeps `cache/` in sync with the `iconpack*.zip` files next to it.
//!
//! Each pack is extracted into a folder named after the pack and its
//! modification time, so a replaced pack gets a fresh folder and the stale
//! one is removed.

use super::extract::extract_archive;
use crate::errors::Result;
use crate::types::IconPackSync;
use chrono::{DateTime, Local};
use log::{info, warn};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::SystemTime;

pub const EXTRACTION_DIR: &str = "cache";

pub fn is_icon_pack(file_name: &str) -> bool {
    let lower = file_name.to_ascii_lowercase();
    lower.starts_with("iconpack") && lower.ends_with(".zip")
}

/// `<pack file name>_<mtime as %Y-%d-%m--%H-%M-%S, local time>`
pub fn extraction_folder_name(file_name: &str, modified: SystemTime) -> String {
    let local: DateTime<Local> = modified.into();
    format!("{file_name}_{}", local.format("%Y-%d-%m--%H-%M-%S"))
}

pub fn sync_icon_packs(packs_dir: &Path) -> Result<IconPackSync> {
    let mut sync = IconPackSync::default();
    if !packs_dir.is_dir() {
        return Ok(sync);
    }

    // (folder, pack file), ordered by pack file name
    let mut packs: Vec<(String, String)> = Vec::new();
    for entry in fs::read_dir(packs_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if !is_icon_pack(&name) {
            continue;
        }
        let modified = entry.metadata()?.modified()?;
        packs.push((extraction_folder_name(&name, modified), name));
    }
    packs.sort_by(|a, b| a.1.cmp(&b.1));

    let cache = packs_dir.join(EXTRACTION_DIR);
    let mut present = HashSet::new();
    if cache.is_dir() {
        for entry in fs::read_dir(&cache)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let dir = entry.file_name().to_string_lossy().into_owned();
            if packs.iter().any(|(folder, _)| folder.eq_ignore_ascii_case(&dir)) {
                present.insert(dir.to_ascii_lowercase());
                sync.kept.push(dir);
            } else {
                fs::remove_dir_all(entry.path())?;
                sync.removed.push(dir);
            }
        }
    }

    for (folder, pack) in &packs {
        if present.contains(&folder.to_ascii_lowercase()) {
            continue;
        }
        let dest = cache.join(folder);
        match extract_archive(&packs_dir.join(pack), &dest) {
            Ok(summary) => {
                info!("extracted {pack}: {} files", summary.files);
                sync.extracted.push(folder.clone());
            }
            Err(e) => {
                warn!("icon pack {pack} failed to extract: {e}");
                // drop the partial folder so the next sync retries
                if let Err(e) = fs::remove_dir_all(&dest) {
                    warn!("could not remove {}: {e}", dest.display());
                }
                sync.failed.push(pack.clone());
            }
        }
    }

    sync.kept.sort();
    sync.removed.sort();
    Ok(sync)
}
