use crate::error::SetupError;
use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Read;
use std::path::Path;

/// Compute SHA-256 hash of a file
pub fn compute_sha256(file_path: &Path) -> Result<String> {
    let mut file = fs::File::open(file_path).with_context(|| {
        format!(
            "Failed to open file for SHA verification: {}",
            file_path.display()
        )
    })?;

    let mut hasher = Sha256::new();
    let mut buffer = [0; 8192];

    loop {
        let bytes_read = file.read(&mut buffer).with_context(|| {
            format!(
                "Failed to read file for SHA verification: {}",
                file_path.display()
            )
        })?;

        if bytes_read == 0 {
            break;
        }

        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Verify a downloaded file against an expected SHA-256, failing on mismatch
pub fn verify_sha256(file_path: &Path, expected_sha: &str) -> Result<()> {
    let computed = compute_sha256(file_path)?;
    let expected = expected_sha.trim().to_lowercase();

    if computed != expected {
        return Err(SetupError::ChecksumMismatch {
            file: file_path.to_path_buf(),
            expected,
            computed,
        }
        .into());
    }

    println!("SHA-256 verified: {expected}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // sha256("hello")
    const HELLO_SHA: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

    #[test]
    fn test_compute_sha256() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("hello.txt");
        fs::write(&file, "hello").unwrap();

        assert_eq!(compute_sha256(&file).unwrap(), HELLO_SHA);
    }

    #[test]
    fn test_verify_sha256_accepts_uppercase() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("hello.txt");
        fs::write(&file, "hello").unwrap();

        assert!(verify_sha256(&file, &HELLO_SHA.to_uppercase()).is_ok());
    }

    #[test]
    fn test_verify_sha256_mismatch() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("hello.txt");
        fs::write(&file, "goodbye").unwrap();

        let err = verify_sha256(&file, HELLO_SHA).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SetupError>(),
            Some(SetupError::ChecksumMismatch { .. })
        ));
    }
}
