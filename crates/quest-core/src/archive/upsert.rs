use crate::errors::{QuestError, Result};
use log::debug;
use std::fs;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

/// Replace-or-insert `entry_name` in `archive_path` with the bytes of `source_path`.
///
/// The new archive is written to a temp file next to the original and renamed
/// over it only once complete. On failure the temp file is removed and the
/// original archive is left as it was. Entry names compare case-insensitively.
pub fn upsert_archive_entry(archive_path: &Path, source_path: &Path, entry_name: &str) -> Result<()> {
    debug!(
        "adding {} to {} as {entry_name}",
        source_path.display(),
        archive_path.display()
    );
    if entry_name.is_empty() {
        return Err(QuestError::Msg("empty zip entry name".into()));
    }

    let mut source = BufReader::new(fs::File::open(source_path)?);

    let file_name = archive_path
        .file_name()
        .ok_or_else(|| QuestError::Msg(format!("not a file path: {}", archive_path.display())))?;
    let dir = match archive_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let tmp = tempfile::Builder::new()
        .prefix(file_name)
        .suffix(".tmp")
        .tempfile_in(dir)?;

    write_upserted(&tmp, archive_path, &mut source, entry_name)?;

    tmp.as_file().sync_all()?;
    tmp.persist(archive_path).map_err(|e| e.error)?;
    Ok(())
}

fn write_upserted(
    tmp: &NamedTempFile,
    archive_path: &Path,
    source: &mut impl io::Read,
    entry_name: &str,
) -> Result<()> {
    let mut zw = ZipWriter::new(BufWriter::new(tmp.as_file()));

    if let Some(mut existing) = open_existing(archive_path)? {
        for i in 0..existing.len() {
            let entry = existing.by_index_raw(i)?;
            if names_match(entry.name(), entry_name) {
                debug!("replacing existing entry {}", entry.name());
                continue;
            }
            zw.raw_copy_file(entry)?;
        }
    }

    zw.start_file(entry_name, FileOptions::default())?;
    io::copy(source, &mut zw)?;
    let mut out = zw.finish()?;
    out.flush()?;
    Ok(())
}

/// Per-character case folding with single-char mappings, so `İ` matches
/// `i` and `ß` never matches `ss`.
fn names_match(a: &str, b: &str) -> bool {
    a.chars().count() == b.chars().count()
        && a.chars().zip(b.chars()).all(|(x, y)| {
            if x == y {
                return true;
            }
            let (ux, uy) = (simple_upper(x), simple_upper(y));
            ux == uy || simple_lower(ux) == simple_lower(uy)
        })
}

fn simple_upper(c: char) -> char {
    let mut it = c.to_uppercase();
    match (it.next(), it.next()) {
        (Some(u), None) => u,
        _ => c,
    }
}

fn simple_lower(c: char) -> char {
    // the only char whose lowercase mapping expands but folds to a single letter
    if c == '\u{130}' {
        return 'i';
    }
    let mut it = c.to_lowercase();
    match (it.next(), it.next()) {
        (Some(l), None) => l,
        _ => c,
    }
}

/// A missing or zero-length archive counts as empty.
fn open_existing(archive_path: &Path) -> Result<Option<ZipArchive<BufReader<fs::File>>>> {
    let f = match fs::File::open(archive_path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    if f.metadata()?.len() == 0 {
        return Ok(None);
    }
    Ok(Some(ZipArchive::new(BufReader::new(f))?))
}
