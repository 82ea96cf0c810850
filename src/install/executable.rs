use crate::archive::utils::{copy_dir_all, copy_file};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Check if a file is executable
pub fn is_executable(path: &Path) -> Result<bool> {
    let metadata = fs::metadata(path)?;

    if !metadata.is_file() {
        return Ok(false);
    }

    #[cfg(windows)]
    {
        if let Some(ext) = path.extension()
            && ext.to_string_lossy().to_lowercase() == "exe"
        {
            return Ok(true);
        }
        Ok(false)
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = metadata.permissions().mode();
        Ok(mode & 0o111 != 0)
    }
}

/// Find all executable files in a directory recursively
pub fn find_executables(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut executables = Vec::new();

    fn visit_dir(dir: &Path, executables: &mut Vec<PathBuf>) -> Result<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            let file_type = entry.file_type()?;

            if file_type.is_dir() {
                visit_dir(&path, executables)?;
            } else if file_type.is_file() && is_executable(&path)? {
                executables.push(path);
            }
        }
        Ok(())
    }

    visit_dir(dir, &mut executables)?;
    executables.sort();
    Ok(executables)
}

/// Pick the file to install from an extracted package.
///
/// With a name, that relative path must exist. Without one, the package must
/// contain exactly one executable.
pub fn select_executable(extracted: &Path, file: Option<&str>) -> Result<PathBuf> {
    if let Some(name) = file {
        let path = extracted.join(name);
        if !path.is_file() {
            return Err(anyhow::anyhow!(
                "Executable '{}' not found in {}",
                name,
                extracted.display()
            ));
        }
        return Ok(path);
    }

    let executables = find_executables(extracted).context("Failed to find executables")?;
    match executables.as_slice() {
        [] => Err(anyhow::anyhow!("No executables found in package")),
        [only] => Ok(only.clone()),
        _ => Err(anyhow::anyhow!(
            "Multiple executables found in {}, name one with `file`",
            extracted.display()
        )),
    }
}

/// Copy a single executable into `<dest_root>/bin`, returns the installed path
pub fn install_binary(source: &Path, dest_root: &Path) -> Result<PathBuf> {
    let bin_dir = dest_root.join("bin");
    let file_name = source
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("Could not determine executable name"))?;
    let install_path = bin_dir.join(file_name);

    copy_file(source, &install_path)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = fs::Permissions::from_mode(0o755);
        fs::set_permissions(&install_path, perms)
            .context("Failed to set executable permissions")?;
    }

    println!("Installed to: {}", install_path.display());
    Ok(install_path)
}

/// Copy a whole extracted tree into `<dest_root>/<into>`
pub fn install_subtree(extracted: &Path, dest_root: &Path, into: &str) -> Result<PathBuf> {
    let target = dest_root.join(into);
    copy_dir_all(extracted, &target)?;
    println!("Installed {} to: {}", extracted.display(), target.display());
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_is_executable_nonexistent() {
        let result = is_executable(Path::new("/nonexistent/file/12345"));
        assert!(result.is_err());
    }

    #[test]
    fn test_is_executable_directory() {
        let temp = TempDir::new().unwrap();
        let result = is_executable(temp.path()).unwrap();
        assert!(!result);
    }

    #[cfg(unix)]
    #[test]
    fn test_find_executables_nested() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let bin_dir = temp.path().join("bin");
        fs::create_dir(&bin_dir).unwrap();
        fs::write(temp.path().join("README.md"), "docs").unwrap();

        let exe_path = bin_dir.join("lazygit");
        fs::write(&exe_path, "#!/bin/sh").unwrap();
        fs::set_permissions(&exe_path, fs::Permissions::from_mode(0o755)).unwrap();

        let result = find_executables(temp.path()).unwrap();
        assert_eq!(result, vec![exe_path]);
    }

    #[test]
    fn test_select_named_executable() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("lazygit"), "bin").unwrap();
        fs::write(temp.path().join("LICENSE"), "MIT").unwrap();

        let selected = select_executable(temp.path(), Some("lazygit")).unwrap();
        assert_eq!(selected, temp.path().join("lazygit"));
        assert!(select_executable(temp.path(), Some("missing")).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_select_requires_single_executable() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        assert!(select_executable(temp.path(), None).is_err());

        for name in ["a", "b"] {
            let path = temp.path().join(name);
            fs::write(&path, "#!/bin/sh").unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        }
        assert!(select_executable(temp.path(), None).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_install_binary_marks_executable() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("lazygit");
        fs::write(&source, "binary").unwrap();
        let dest = temp.path().join("local");

        let installed = install_binary(&source, &dest).unwrap();

        assert_eq!(installed, dest.join("bin/lazygit"));
        assert!(is_executable(&installed).unwrap());
    }

    #[test]
    fn test_install_binary_overwrites_previous() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("local");
        fs::create_dir_all(dest.join("bin")).unwrap();
        fs::write(dest.join("bin/lazygit"), "old").unwrap();

        let source = temp.path().join("lazygit");
        fs::write(&source, "new").unwrap();
        install_binary(&source, &dest).unwrap();

        assert_eq!(fs::read_to_string(dest.join("bin/lazygit")).unwrap(), "new");
    }

    #[test]
    fn test_install_subtree_merges_into_bin() {
        let temp = TempDir::new().unwrap();
        let extracted = temp.path().join("fzf");
        fs::create_dir_all(&extracted).unwrap();
        fs::write(extracted.join("fzf"), "fzf").unwrap();

        let dest = temp.path().join("local");
        fs::create_dir_all(dest.join("bin")).unwrap();
        fs::write(dest.join("bin/rg"), "rg").unwrap();

        let target = install_subtree(&extracted, &dest, "bin").unwrap();

        assert_eq!(target, dest.join("bin"));
        assert!(dest.join("bin/fzf").is_file());
        assert!(dest.join("bin/rg").is_file());
    }
}
