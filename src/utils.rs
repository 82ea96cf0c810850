use crate::error::SetupError;
use std::path::Path;

/// Extract filename from URL path, ignoring query string and fragment.
///
/// A path that is empty or ends with `/` has no filename; that is an error
/// rather than a made-up default.
pub fn get_filename_from_url(url: &str) -> Result<String, SetupError> {
    let without_scheme = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    let path = without_scheme
        .split(['?', '#'])
        .next()
        .unwrap_or("");

    // Drop the authority; "example.com" alone has no path at all
    let path = match path.find('/') {
        Some(idx) if url.contains("://") => &path[idx..],
        Some(_) => path,
        None if url.contains("://") => "",
        None => path,
    };

    match path.rsplit('/').next() {
        Some(name) if !name.is_empty() && name != "." && name != ".." => Ok(name.to_string()),
        _ => Err(SetupError::InvalidUrl {
            url: url.to_string(),
        }),
    }
}

/// Parse the `filename=` parameter of a Content-Disposition header value.
pub fn get_filename_from_disposition(header: &str) -> Option<String> {
    let value = header
        .split(';')
        .map(str::trim)
        .find_map(|param| param.strip_prefix("filename="))?;

    let value = value.trim().trim_matches('"');

    // Only the final component; a server must not steer writes out of scratch
    let name = Path::new(value).file_name()?.to_str()?;
    if name.is_empty() || name == "." || name == ".." {
        None
    } else {
        Some(name.to_string())
    }
}

/// Check if a directory is listed in PATH
pub fn is_directory_in_path(directory: &Path) -> bool {
    let Some(path_var) = std::env::var_os("PATH") else {
        return false;
    };
    let wanted = directory.canonicalize().unwrap_or_else(|_| directory.to_path_buf());
    std::env::split_paths(&path_var).any(|entry| {
        let entry = entry.canonicalize().unwrap_or(entry);
        entry == wanted
    })
}
