//! Recursive discovery of source files under the data root.

use std::fs;
use std::path::Path;

use watershed_core::source::{EntryKind, FolderEntry, FolderListing};
use watershed_core::Result;

use crate::errors::{IntoCore, StorageError};

const DATABASE_EXTENSION: &str = "db3";
const LISTED_FILE_EXTENSIONS: [&str; 2] = ["shp", "tif"];

/// Walks `root/folder` top-down. Names are relative to `root` and use `/`.
///
/// Within each directory, sub-folders are listed before files and both are
/// sorted by name; sub-folders are then walked in the same order. `.db3`
/// files whose relative path contains `lookup_marker` designate the lookup
/// database.
pub fn scan_folder(root: &Path, folder: &str, lookup_marker: &str) -> Result<FolderListing> {
    let start = root.join(folder);
    if !start.is_dir() {
        return Err(StorageError::NotFound(format!("folder {}", folder)).into());
    }
    let mut listing = FolderListing::default();
    walk(&start, folder.trim_end_matches(['/', '\\']), lookup_marker, &mut listing)?;
    Ok(listing)
}

fn walk(dir: &Path, rel: &str, lookup_marker: &str, listing: &mut FolderListing) -> Result<()> {
    let mut folders = Vec::new();
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).into_core()? {
        let entry = entry.into_core()?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type().into_core()?.is_dir() {
            folders.push(name);
        } else {
            files.push(name);
        }
    }
    folders.sort();
    files.sort();

    for name in &folders {
        listing.entries.push(FolderEntry {
            kind: EntryKind::Folder,
            name: join(rel, name),
        });
    }
    for name in &files {
        let path = join(rel, name);
        let extension = Path::new(name)
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase());
        match extension.as_deref() {
            Some(DATABASE_EXTENSION) => {
                if path.contains(lookup_marker) {
                    if let Some(previous) = listing.lookup.replace(path.clone()) {
                        log::warn!("Several lookup databases found; using {} over {}", path, previous);
                    }
                } else {
                    listing.databases.push(path.clone());
                }
                listing.entries.push(FolderEntry {
                    kind: EntryKind::Database,
                    name: path,
                });
            }
            Some(ext) if LISTED_FILE_EXTENSIONS.contains(&ext) => {
                listing.entries.push(FolderEntry {
                    kind: EntryKind::File,
                    name: path,
                });
            }
            _ => {}
        }
    }

    for name in &folders {
        walk(&dir.join(name), &join(rel, name), lookup_marker, listing)?;
    }
    Ok(())
}

fn join(rel: &str, name: &str) -> String {
    if rel.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", rel, name)
    }
}
