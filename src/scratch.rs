use anyhow::{Context, Result};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Scratch directory for downloads and extracted trees.
///
/// Always a fresh directory created by this run, so cleanup never touches
/// anything the user already had. Removed when dropped unless `keep` was
/// called.
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
    // None once kept
    guard: Option<TempDir>,
}

impl ScratchDir {
    /// Create a unique `toolstrap*` directory under `root`, or under the
    /// system temp dir when no root is given. `root` itself is never removed.
    pub fn create(root: Option<&Path>) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("toolstrap");

        let guard = match root {
            Some(root) => {
                fs::create_dir_all(root).with_context(|| {
                    format!("Failed to create scratch root: {}", root.display())
                })?;
                builder.tempdir_in(root)
            }
            None => builder.tempdir(),
        }
        .with_context(|| "Failed to create scratch directory")?;

        let path = guard.path().to_path_buf();
        debug!("Using scratch directory {}", path.display());
        Ok(Self {
            path,
            guard: Some(guard),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where downloaded archives land, shared by every fetch in the run
    pub fn downloads_dir(&self) -> PathBuf {
        self.path.join("downloads")
    }

    /// Subdirectory for one package's extracted tree
    pub fn package_dir(&self, name: &str) -> PathBuf {
        self.path.join("extract").join(name)
    }

    /// Leave the directory in place after the run
    pub fn keep(&mut self) {
        if let Some(guard) = self.guard.take() {
            let path = guard.keep();
            println!("Keeping scratch directory: {}", path.display());
        }
    }
}
