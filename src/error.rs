//! Classified failures for a setup run.
//!
//! Everything else travels as a plain `anyhow::Error`; these variants are the
//! ones callers need to tell apart, either to pick an exit status or to decide
//! whether the run can continue.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Download failed for {url}: {reason}")]
    DownloadFailed { url: String, reason: String },

    #[error("Cannot derive a filename from URL: {url}")]
    InvalidUrl { url: String },

    #[error("Failed to extract {}: {reason}", .archive.display())]
    ExtractFailed { archive: PathBuf, reason: String },

    #[error("Failed to copy {} to {}: {reason}", .src.display(), .dst.display())]
    CopyFailed {
        src: PathBuf,
        dst: PathBuf,
        reason: String,
    },

    #[error("SHA-256 mismatch for {}: expected {expected}, computed {computed}", .file.display())]
    ChecksumMismatch {
        file: PathBuf,
        expected: String,
        computed: String,
    },

    #[error("Failed to create symlink {} -> {}: {reason}", .link.display(), .target.display())]
    SymlinkCreateFailed {
        link: PathBuf,
        target: PathBuf,
        reason: String,
    },

    #[error("Unsupported shell: {0}. No completion script added.")]
    UnsupportedShell(String),
}

impl SetupError {
    /// Process exit status for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            SetupError::DownloadFailed { .. } | SetupError::InvalidUrl { .. } => 2,
            SetupError::ExtractFailed { .. } => 3,
            SetupError::CopyFailed { .. } => 4,
            SetupError::ChecksumMismatch { .. } => 5,
            // Never fatal; only reached if a caller chose to propagate one
            SetupError::SymlinkCreateFailed { .. } | SetupError::UnsupportedShell(_) => 1,
        }
    }

    /// Whether the run must stop when this error occurs.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            SetupError::SymlinkCreateFailed { .. } | SetupError::UnsupportedShell(_)
        )
    }
}

/// Exit status for an arbitrary error chain, 1 when nothing in it is classified.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<SetupError>())
        .map(SetupError::exit_code)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_exit_codes_are_distinct_for_fatal_kinds() {
        let download = SetupError::DownloadFailed {
            url: "https://example.com/a.deb".to_string(),
            reason: "404".to_string(),
        };
        let extract = SetupError::ExtractFailed {
            archive: PathBuf::from("a.deb"),
            reason: "bad magic".to_string(),
        };
        let copy = SetupError::CopyFailed {
            src: PathBuf::from("a"),
            dst: PathBuf::from("b"),
            reason: "disk full".to_string(),
        };
        assert_eq!(download.exit_code(), 2);
        assert_eq!(extract.exit_code(), 3);
        assert_eq!(copy.exit_code(), 4);
    }

    #[test]
    fn test_non_fatal_kinds() {
        assert!(!SetupError::UnsupportedShell("tcsh".to_string()).is_fatal());
        let link = SetupError::SymlinkCreateFailed {
            link: PathBuf::from("bin/rg1"),
            target: PathBuf::from("rg"),
            reason: "exists".to_string(),
        };
        assert!(!link.is_fatal());
        assert!(SetupError::InvalidUrl { url: "x".to_string() }.is_fatal());
    }

    #[test]
    fn test_exit_code_found_through_context() {
        let err: anyhow::Result<()> = Err(SetupError::ExtractFailed {
            archive: PathBuf::from("fd.deb"),
            reason: "truncated".to_string(),
        }
        .into());
        let err = err.context("Failed to install fd").unwrap_err();
        assert_eq!(exit_code_for(&err), 3);
    }

    #[test]
    fn test_unclassified_error_exits_with_one() {
        let err = anyhow::anyhow!("something else");
        assert_eq!(exit_code_for(&err), 1);
    }
}
