use crate::error::SetupError;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Create a symlink at `link` whose target string is exactly `target`.
pub fn create_symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(target, link)
    }

    #[cfg(windows)]
    {
        std::os::windows::fs::symlink_file(target, link)
    }
}

/// Copy one file over `dst`, replacing whatever non-directory is there.
///
/// An existing file is removed first so a running executable is not written
/// through ("Text file busy") and a symlink at `dst` is replaced rather than
/// followed.
pub fn copy_file(src: &Path, dst: &Path) -> Result<()> {
    let copy_failed = |reason: String| SetupError::CopyFailed {
        src: src.to_path_buf(),
        dst: dst.to_path_buf(),
        reason,
    };

    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).map_err(|e| copy_failed(e.to_string()))?;
    }

    match fs::symlink_metadata(dst) {
        Ok(meta) if meta.is_dir() => {
            return Err(copy_failed("destination is a directory".to_string()).into());
        }
        Ok(_) => fs::remove_file(dst).map_err(|e| copy_failed(e.to_string()))?,
        Err(_) => {}
    }

    fs::copy(src, dst).map_err(|e| copy_failed(e.to_string()))?;
    Ok(())
}

/// Copy directory recursively, merging into whatever already exists at `dst`.
///
/// Existing directories are kept and filled in, same-named files are
/// overwritten, and symlinks are recreated with their target string unchanged.
pub fn copy_dir_all(src: &Path, dst: &Path) -> Result<()> {
    // A link to a directory is merged through; files and dangling links are not
    let is_dir = fs::metadata(dst).is_ok_and(|m| m.is_dir());
    if !is_dir && fs::symlink_metadata(dst).is_ok() {
        return Err(SetupError::CopyFailed {
            src: src.to_path_buf(),
            dst: dst.to_path_buf(),
            reason: "destination exists and is not a directory".to_string(),
        }
        .into());
    }

    fs::create_dir_all(dst).map_err(|e| SetupError::CopyFailed {
        src: src.to_path_buf(),
        dst: dst.to_path_buf(),
        reason: e.to_string(),
    })?;

    for entry in fs::read_dir(src)
        .with_context(|| format!("Failed to read source directory: {}", src.display()))?
    {
        let entry = entry.with_context(|| "Failed to read directory entry")?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());
        let file_type = entry
            .file_type()
            .with_context(|| format!("Failed to stat {}", src_path.display()))?;

        if file_type.is_symlink() {
            let target = fs::read_link(&src_path)
                .with_context(|| format!("Failed to read symlink {}", src_path.display()))?;
            if fs::symlink_metadata(&dst_path).is_ok_and(|m| !m.is_dir()) {
                let _ = fs::remove_file(&dst_path);
            }
            create_symlink(&target, &dst_path).map_err(|e| SetupError::CopyFailed {
                src: src_path.clone(),
                dst: dst_path.clone(),
                reason: e.to_string(),
            })?;
        } else if file_type.is_dir() {
            copy_dir_all(&src_path, &dst_path)?;
        } else {
            copy_file(&src_path, &dst_path)?;
        }
    }

    Ok(())
}
