use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use std::fs;
use std::io::Read;
use std::path::Path;
use tar::Archive;

/// Extract TAR.GZ archive, returns number of extracted entries
pub fn extract_tar_gz(tar_path: &Path, extract_to: &Path) -> Result<usize> {
    let file = fs::File::open(tar_path)
        .with_context(|| format!("Failed to open tar.gz file: {}", tar_path.display()))?;

    let decoder = GzDecoder::new(file);
    extract_tar_from_reader(decoder, extract_to, "tar.gz")
}

/// Unpack a tar stream compressed the way `compression` names it
/// (`gz`, `xz`, `zst`, or empty for a plain tar).
pub fn extract_compressed_tar<R: Read>(
    reader: R,
    compression: &str,
    extract_to: &Path,
) -> Result<usize> {
    match compression {
        "gz" => extract_tar_from_reader(GzDecoder::new(reader), extract_to, "tar.gz"),
        "xz" => extract_tar_from_reader(xz2::read::XzDecoder::new(reader), extract_to, "tar.xz"),
        "zst" => {
            let decoder =
                zstd::Decoder::new(reader).with_context(|| "Failed to create zstd decoder")?;
            extract_tar_from_reader(decoder, extract_to, "tar.zst")
        }
        "" => extract_tar_from_reader(reader, extract_to, "tar"),
        other => Err(anyhow::anyhow!("Unsupported tar compression: {other}")),
    }
}

/// Extract TAR archive from a generic reader, returns number of extracted entries.
///
/// Entries are unpacked as stored, symlinks included; callers that care about
/// links repair them afterwards instead of trusting this step.
fn extract_tar_from_reader<R: Read>(
    reader: R,
    extract_to: &Path,
    archive_type: &str,
) -> Result<usize> {
    let mut archive = Archive::new(reader);
    archive.set_overwrite(true);

    fs::create_dir_all(extract_to).with_context(|| {
        format!(
            "Failed to create extraction directory: {}",
            extract_to.display()
        )
    })?;

    let mut extracted = 0;

    for entry in archive
        .entries()
        .with_context(|| format!("Failed to read {archive_type} entries"))?
    {
        let mut entry = entry.with_context(|| format!("Failed to access {archive_type} entry"))?;

        let path = entry
            .path()
            .with_context(|| "Failed to get entry path")?
            .into_owned();

        // unpack_in refuses entries that would land outside extract_to
        let unpacked = entry
            .unpack_in(extract_to)
            .with_context(|| format!("Failed to extract file: {}", path.display()))?;

        if unpacked {
            extracted += 1;
        } else {
            log::warn!("Skipped {archive_type} entry outside target: {}", path.display());
        }
    }

    println!("Extracted {extracted} entries");
    Ok(extracted)
}
