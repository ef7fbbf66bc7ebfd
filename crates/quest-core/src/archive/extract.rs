use crate::errors::{QuestError, Result};
use crate::types::ExtractSummary;
use log::debug;
use std::fs;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;
use zip::ZipArchive;

/// Extract every entry of `archive_path` under `target_dir`, in archive order.
///
/// Existing files are replaced. The first failure aborts the rest; whatever
/// was already written stays on disk.
pub fn extract_archive(archive_path: &Path, target_dir: &Path) -> Result<ExtractSummary> {
    fs::create_dir_all(target_dir)?;

    let f = fs::File::open(archive_path)?;
    let mut archive = ZipArchive::new(BufReader::new(f))?;
    let mut summary = ExtractSummary::default();

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let rel = entry
            .enclosed_name()
            .map(Path::to_path_buf)
            .ok_or_else(|| QuestError::UnsafeEntry(entry.name().to_string()))?;
        let outpath = target_dir.join(rel);
        debug!("unzipping {}", outpath.display());

        if entry.is_dir() {
            fs::create_dir_all(&outpath)?;
            summary.dirs += 1;
        } else {
            if let Some(parent) = outpath.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut out = BufWriter::new(fs::File::create(&outpath)?);
            summary.bytes += io::copy(&mut entry, &mut out)?;
            out.flush()?;
            summary.files += 1;
        }
    }
    Ok(summary)
}
