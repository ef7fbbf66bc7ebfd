//! Zip helpers for launcher asset bundles (icon packs, rename bundles).

pub mod extract;
pub mod iconpacks;
pub mod upsert;

pub use extract::extract_archive;
pub use iconpacks::sync_icon_packs;
pub use upsert::upsert_archive_entry;
