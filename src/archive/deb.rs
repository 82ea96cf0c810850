//! Debian package extraction.
//!
//! A `.deb` is an `ar` container holding `debian-binary`, `control.tar.*` and
//! `data.tar.*`. Only the data member is unpacked, which yields the same tree
//! as `dpkg -x`.

use crate::archive::tar::extract_compressed_tar;
use anyhow::{Context, Result};
use std::fs;
use std::io::{self, BufReader, Read};
use std::path::Path;

const AR_MAGIC: &[u8; 8] = b"!<arch>\n";
const AR_HEADER_LEN: usize = 60;

/// One member header of an `ar` archive
#[derive(Debug, PartialEq)]
struct ArMember {
    name: String,
    size: u64,
}

fn parse_member_header(header: &[u8; AR_HEADER_LEN]) -> Result<ArMember> {
    if &header[58..60] != b"`\n" {
        return Err(anyhow::anyhow!("Invalid ar member header terminator"));
    }

    let name = std::str::from_utf8(&header[0..16])
        .context("Invalid UTF-8 in ar member name")?
        .trim_end()
        .trim_end_matches('/')
        .to_string();

    let size = std::str::from_utf8(&header[48..58])
        .context("Invalid UTF-8 in ar member size")?
        .trim()
        .parse::<u64>()
        .with_context(|| format!("Invalid size for ar member '{name}'"))?;

    Ok(ArMember { name, size })
}

/// Extract the data member of a `.deb` into `extract_to`, returns number of entries
pub fn extract_deb(deb_path: &Path, extract_to: &Path) -> Result<usize> {
    let file = fs::File::open(deb_path)
        .with_context(|| format!("Failed to open deb file: {}", deb_path.display()))?;
    let mut reader = BufReader::new(file);

    let mut magic = [0u8; 8];
    reader
        .read_exact(&mut magic)
        .with_context(|| "Failed to read ar header")?;
    if &magic != AR_MAGIC {
        return Err(anyhow::anyhow!("Not a Debian package (missing ar magic)"));
    }

    loop {
        let mut header = [0u8; AR_HEADER_LEN];
        match reader.read_exact(&mut header) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(err) => return Err(err).context("Failed to read ar member header"),
        }

        let member = parse_member_header(&header)?;
        log::debug!("deb member {} ({} bytes)", member.name, member.size);

        if let Some(compression) = member.name.strip_prefix("data.tar") {
            let compression = compression.trim_start_matches('.');
            return extract_compressed_tar((&mut reader).take(member.size), compression, extract_to)
                .with_context(|| format!("Failed to unpack {}", member.name));
        }

        // Members are padded to an even length
        let skip = member.size + member.size % 2;
        let skipped = io::copy(&mut (&mut reader).take(skip), &mut io::sink())
            .with_context(|| format!("Failed to skip ar member {}", member.name))?;
        if skipped < member.size {
            return Err(anyhow::anyhow!("Truncated ar member {}", member.name));
        }
    }

    Err(anyhow::anyhow!("No data.tar member in Debian package"))
}
