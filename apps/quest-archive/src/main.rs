use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use quest_core::{
    extract_archive, load_raw_image, sync_icon_packs, upsert_archive_entry, CatalogConfig,
};
use serde::Serialize;
use std::{fs, path::PathBuf};

/// Work on launcher archives and icon packs from a desktop shell.
#[derive(Debug, Parser)]
#[command(name = "quest-archive", version)]
struct Cli {
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Extract every entry of a zip archive under a directory
    Extract { archive: PathBuf, target: PathBuf },
    /// Insert or replace one entry (case-insensitive) with a file's bytes
    Upsert {
        archive: PathBuf,
        source: PathBuf,
        entry: String,
    },
    /// Reconcile iconpack*.zip files with their extracted folders under cache/
    SyncIconPacks { dir: PathBuf },
    /// Decode an image to RGBA8, optionally downscaled, and report its size
    RawImage {
        path: PathBuf,
        #[arg(long, default_value_t = 0)]
        max_pixels: u64,
        /// Write the raw RGBA bytes here
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Parse a plugin config file and print it with defaults applied
    CheckConfig { path: PathBuf },
}

#[derive(Debug, Serialize)]
struct ImageReport {
    width: u32,
    height: u32,
    bytes: usize,
}

fn emit<T: Serialize + std::fmt::Debug>(json: bool, value: &T) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{value:#?}");
    }
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Extract { archive, target } => {
            let summary = extract_archive(&archive, &target)
                .with_context(|| format!("extract {}", archive.display()))?;
            info!("extracted {} into {}", archive.display(), target.display());
            emit(cli.json, &summary)
        }
        Command::Upsert {
            archive,
            source,
            entry,
        } => {
            upsert_archive_entry(&archive, &source, &entry)
                .with_context(|| format!("upsert {entry} into {}", archive.display()))?;
            println!("{} → {}:{entry}", source.display(), archive.display());
            Ok(())
        }
        Command::SyncIconPacks { dir } => {
            let sync = sync_icon_packs(&dir)
                .with_context(|| format!("sync icon packs in {}", dir.display()))?;
            emit(cli.json, &sync)
        }
        Command::RawImage {
            path,
            max_pixels,
            out,
        } => {
            let img = load_raw_image(&path, max_pixels)
                .with_context(|| format!("load {}", path.display()))?;
            if let Some(out) = out {
                fs::write(&out, &img.rgba).with_context(|| format!("write {}", out.display()))?;
            }
            emit(
                cli.json,
                &ImageReport {
                    width: img.width,
                    height: img.height,
                    bytes: img.rgba.len(),
                },
            )
        }
        Command::CheckConfig { path } => {
            let cfg = CatalogConfig::load(&path)?;
            emit(cli.json, &cfg)
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    run(Cli::parse())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::FileOptions;
    use zip::ZipWriter;

    #[test]
    fn parses_subcommands() {
        let cli = Cli::try_parse_from(["quest-archive", "--json", "sync-icon-packs", "/sdcard/packs"])
            .unwrap();
        assert!(cli.json);
        assert!(matches!(cli.command, Command::SyncIconPacks { ref dir } if dir.ends_with("packs")));

        let cli = Cli::try_parse_from([
            "quest-archive",
            "raw-image",
            "bg.png",
            "--max-pixels",
            "4096",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::RawImage { max_pixels: 4096, out: None, .. }));

        assert!(Cli::try_parse_from(["quest-archive", "upsert", "a.zip"]).is_err());
    }

    #[test]
    fn upsert_then_extract() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("iconpack_rename.zip");
        let mut zw = ZipWriter::new(fs::File::create(&archive).unwrap());
        zw.start_file("COM.A.JPG", FileOptions::default()).unwrap();
        zw.write_all(b"old").unwrap();
        zw.finish().unwrap();
        let icon = tmp.path().join("a.jpg");
        fs::write(&icon, b"new").unwrap();

        run(Cli {
            json: false,
            command: Command::Upsert {
                archive: archive.clone(),
                source: icon,
                entry: "com.a.jpg".into(),
            },
        })
        .unwrap();

        let out = tmp.path().join("out");
        run(Cli {
            json: true,
            command: Command::Extract {
                archive,
                target: out.clone(),
            },
        })
        .unwrap();
        assert_eq!(fs::read(out.join("com.a.jpg")).unwrap(), b"new");
        assert_eq!(fs::read_dir(&out).unwrap().count(), 1);
    }

    #[test]
    fn missing_config_reports_path() {
        let tmp = TempDir::new().unwrap();
        let err = run(Cli {
            json: false,
            command: Command::CheckConfig {
                path: tmp.path().join("plugin.json"),
            },
        })
        .unwrap_err();
        assert!(format!("{err:#}").contains("plugin.json"));
    }
}
