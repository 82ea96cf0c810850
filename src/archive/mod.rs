pub mod deb;
pub mod tar;
pub mod utils;

use crate::error::SetupError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Package container formats the installer understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveFormat {
    Deb,
    TarGz,
}

impl ArchiveFormat {
    /// Guess the format from a downloaded file name
    pub fn from_filename(name: &str) -> Option<Self> {
        let lower = name.to_lowercase();
        if lower.ends_with(".deb") {
            Some(ArchiveFormat::Deb)
        } else if lower.ends_with(".tar.gz") || lower.ends_with(".tgz") {
            Some(ArchiveFormat::TarGz)
        } else {
            None
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveFormat::Deb => write!(f, "deb"),
            ArchiveFormat::TarGz => write!(f, "tar.gz"),
        }
    }
}

/// Extract `archive` into `extract_to`.
///
/// `format` overrides detection from the file name. Any failure, including an
/// unrecognized format, is an `ExtractFailed`.
pub fn extract(
    archive: &Path,
    format: Option<ArchiveFormat>,
    extract_to: &Path,
) -> Result<usize, SetupError> {
    let extract_failed = |reason: String| SetupError::ExtractFailed {
        archive: archive.to_path_buf(),
        reason,
    };

    let format = format
        .or_else(|| {
            archive
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(ArchiveFormat::from_filename)
        })
        .ok_or_else(|| extract_failed("unknown archive format".to_string()))?;

    println!("Extracting {format} to: {}", extract_to.display());

    let result = match format {
        ArchiveFormat::Deb => deb::extract_deb(archive, extract_to),
        ArchiveFormat::TarGz => tar::extract_tar_gz(archive, extract_to),
    };

    result.map_err(|e| extract_failed(format!("{e:#}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_format_from_filename() {
        assert_eq!(
            ArchiveFormat::from_filename("ripgrep_14.1.1-1_amd64.deb"),
            Some(ArchiveFormat::Deb)
        );
        assert_eq!(
            ArchiveFormat::from_filename("fzf-0.64.0-linux_amd64.tar.gz"),
            Some(ArchiveFormat::TarGz)
        );
        assert_eq!(
            ArchiveFormat::from_filename("tool.TGZ"),
            Some(ArchiveFormat::TarGz)
        );
        assert_eq!(ArchiveFormat::from_filename("tool.zip"), None);
    }

    #[test]
    fn test_extract_unknown_format_is_extract_failed() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("tool.zip");
        std::fs::write(&file, b"PK").unwrap();

        let err = extract(&file, None, &temp.path().join("out")).unwrap_err();
        assert!(matches!(err, SetupError::ExtractFailed { .. }));
    }

    #[test]
    fn test_extract_corrupt_deb_is_extract_failed() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("fd_10.2.0_amd64.deb");
        std::fs::write(&file, b"garbage garbage").unwrap();

        let err = extract(&file, None, &temp.path().join("out")).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_format_deserialize() {
        #[derive(Deserialize)]
        struct Wrapper {
            format: ArchiveFormat,
        }
        let w: Wrapper = toml::from_str("format = \"tar_gz\"").unwrap();
        assert_eq!(w.format, ArchiveFormat::TarGz);
    }
}
