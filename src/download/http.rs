use crate::error::SetupError;
use crate::utils::{get_filename_from_disposition, get_filename_from_url};
use anyhow::{Context, Result};
use log::debug;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

const CHUNK_SIZE: usize = 64 * 1024;

/// A download in progress: where it came from and where it is going.
#[derive(Debug, Clone)]
pub struct Download {
    pub url: String,
    pub dest_dir: PathBuf,
    pub filename: String,
    /// Advertised Content-Length, if the server sent one
    pub expected_len: Option<u64>,
}

impl Download {
    pub fn path(&self) -> PathBuf {
        self.dest_dir.join(&self.filename)
    }
}

/// Download `url` into `dest_dir`, returning the path of the written file.
///
/// The filename comes from the Content-Disposition hint when present and from
/// the URL path otherwise.
pub fn fetch(url: &str, dest_dir: &Path) -> Result<PathBuf> {
    let response = match ureq::get(url).call() {
        Ok(response) => response,
        Err(ureq::Error::Status(code, _)) => {
            return Err(SetupError::DownloadFailed {
                url: url.to_string(),
                reason: format!("server returned status {code}"),
            }
            .into());
        }
        Err(err) => {
            return Err(SetupError::DownloadFailed {
                url: url.to_string(),
                reason: err.to_string(),
            }
            .into());
        }
    };

    if !(200..300).contains(&response.status()) {
        return Err(SetupError::DownloadFailed {
            url: url.to_string(),
            reason: format!("server returned status {}", response.status()),
        }
        .into());
    }

    let filename = match response
        .header("Content-Disposition")
        .and_then(get_filename_from_disposition)
    {
        Some(name) => name,
        None => get_filename_from_url(url)?,
    };

    let download = Download {
        url: url.to_string(),
        dest_dir: dest_dir.to_path_buf(),
        filename,
        expected_len: response
            .header("Content-Length")
            .and_then(|v| v.trim().parse::<u64>().ok()),
    };
    debug!("Resolved download {download:?}");

    fs::create_dir_all(dest_dir)
        .with_context(|| format!("Failed to create directory: {}", dest_dir.display()))?;

    let path = download.path();
    let written = write_body(response.into_reader(), &path, &download)?;
    verify_length(&download, written).inspect_err(|_| {
        let _ = fs::remove_file(&path);
    })?;

    println!("Downloaded: {} ({} bytes)", path.display(), written);
    Ok(path)
}

/// Stream the body to `path` in fixed-size chunks, returning the byte count.
fn write_body(mut reader: impl Read, path: &Path, download: &Download) -> Result<u64> {
    let mut file = fs::File::create(path)
        .with_context(|| format!("Failed to create file: {}", path.display()))?;

    let mut buffer = vec![0u8; CHUNK_SIZE];
    let mut written: u64 = 0;

    loop {
        let n = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(err) => {
                drop(file);
                let _ = fs::remove_file(path);
                return Err(SetupError::DownloadFailed {
                    url: download.url.clone(),
                    reason: format!("connection error after {written} bytes: {err}"),
                }
                .into());
            }
        };
        file.write_all(&buffer[..n])
            .with_context(|| format!("Failed to write to file: {}", path.display()))?;
        written += n as u64;
    }

    file.sync_all()
        .with_context(|| format!("Failed to sync file: {}", path.display()))?;

    Ok(written)
}

/// A short body is a failed download, not a smaller file.
pub fn verify_length(download: &Download, written: u64) -> Result<(), SetupError> {
    match download.expected_len {
        Some(expected) if expected != written => Err(SetupError::DownloadFailed {
            url: download.url.clone(),
            reason: format!("expected {expected} bytes, received {written}"),
        }),
        _ => Ok(()),
    }
}
