//! Symlink-repairing merge of an extracted package tree into a prefix.
//!
//! Extraction is not trusted to keep links: a link may arrive as a real
//! symlink or as a copy of its target's bytes, depending on the tool that
//! unpacked it. The merge therefore plans every link up front, removes the
//! link entries from the extracted tree, recreates them in the destination
//! with their original target strings, and only then copies the regular files
//! across.

use crate::archive::utils::{copy_dir_all, create_symlink};
use crate::error::SetupError;
use anyhow::{Context, Result};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A link found in an extracted tree and where it belongs in the destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymlinkRecord {
    /// Re-rooted path under the destination
    pub dest_path: PathBuf,
    /// Path inside the extracted tree
    pub source_path: PathBuf,
    /// Target string as stored in the link, never resolved
    pub target: PathBuf,
}

/// What happened to each planned link
#[derive(Debug, Default)]
pub struct MergeReport {
    pub created: Vec<PathBuf>,
    pub unchanged: Vec<PathBuf>,
    pub failed: Vec<SetupError>,
    /// Links whose target did not exist after the copy finished
    pub dangling: Vec<PathBuf>,
}

/// Walk `src_root` without following links and record every symlink in it.
pub fn collect_symlinks(src_root: &Path, dest_root: &Path) -> Result<Vec<SymlinkRecord>> {
    let mut records = Vec::new();

    for entry in WalkDir::new(src_root).follow_links(false).min_depth(1) {
        let entry = entry
            .with_context(|| format!("Failed to walk extracted tree: {}", src_root.display()))?;

        if !entry.path_is_symlink() {
            continue;
        }

        let source_path = entry.path().to_path_buf();
        let target = fs::read_link(&source_path)
            .with_context(|| format!("Failed to read symlink {}", source_path.display()))?;
        let relative = source_path
            .strip_prefix(src_root)
            .with_context(|| format!("{} is outside {}", source_path.display(), src_root.display()))?;

        records.push(SymlinkRecord {
            dest_path: dest_root.join(relative),
            source_path,
            target,
        });
    }

    Ok(records)
}

/// Create one destination link.
///
/// A link that already points at the same target is left alone so repeated
/// runs converge. A link with a different target is replaced. Anything else in
/// the way is reported, not removed.
fn place_symlink(record: &SymlinkRecord) -> Result<bool, SetupError> {
    let failed = |reason: String| SetupError::SymlinkCreateFailed {
        link: record.dest_path.clone(),
        target: record.target.clone(),
        reason,
    };

    match fs::symlink_metadata(&record.dest_path) {
        Ok(meta) if meta.file_type().is_symlink() => {
            let current = fs::read_link(&record.dest_path).map_err(|e| failed(e.to_string()))?;
            if current == record.target {
                return Ok(false);
            }
            fs::remove_file(&record.dest_path).map_err(|e| failed(e.to_string()))?;
        }
        Ok(_) => return Err(failed("a file or directory already exists there".to_string())),
        Err(_) => {}
    }

    if let Some(parent) = record.dest_path.parent() {
        fs::create_dir_all(parent).map_err(|e| failed(e.to_string()))?;
    }

    create_symlink(&record.target, &record.dest_path).map_err(|e| failed(e.to_string()))?;
    Ok(true)
}

/// Merge the extracted tree at `src_root` into `dest_root`.
///
/// Order matters: links are planned, then removed from the source, then
/// created in the destination, then the remaining files are copied. Link
/// failures are collected in the report; copy failures abort.
pub fn merge_package(src_root: &Path, dest_root: &Path) -> Result<MergeReport> {
    let records = collect_symlinks(src_root, dest_root)?;
    debug!(
        "Planned {} symlinks from {}",
        records.len(),
        src_root.display()
    );

    for record in &records {
        fs::remove_file(&record.source_path).with_context(|| {
            format!(
                "Failed to remove extracted link {}",
                record.source_path.display()
            )
        })?;
    }

    if !records.is_empty() {
        println!("Resolving symlinks...");
    }

    let mut report = MergeReport::default();
    for record in &records {
        match place_symlink(record) {
            Ok(true) => report.created.push(record.dest_path.clone()),
            Ok(false) => report.unchanged.push(record.dest_path.clone()),
            Err(err) => {
                eprintln!("Warning: {err}");
                report.failed.push(err);
            }
        }
    }

    println!("Copying files to {}...", dest_root.display());
    copy_dir_all(src_root, dest_root)?;

    // Only now can a link's target be expected to exist
    for record in &records {
        let placed = report.created.contains(&record.dest_path)
            || report.unchanged.contains(&record.dest_path);
        if placed && !record.dest_path.exists() {
            warn!(
                "Dangling symlink {} -> {}",
                record.dest_path.display(),
                record.target.display()
            );
            report.dangling.push(record.dest_path.clone());
        }
    }

    Ok(report)
}
