//! Naming helpers shared by the fetcher, packer and sink

use crate::config::FileCollisionAction;
use crate::error::ArchiveError;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Maximum number of rename attempts before giving up
const MAX_RENAME_ATTEMPTS: u32 = 9999;

/// Name used when an identifier has no usable final segment
const FALLBACK_NAME: &str = "download";

/// Derive the display name of a resource identifier
///
/// The display name is the final path segment. For URLs the query string and
/// fragment are ignored and the segment is percent-decoded.
///
/// # Examples
///
/// ```
/// use bundle_dl::utils::display_name;
///
/// assert_eq!(display_name("./files/file1.txt"), "file1.txt");
/// assert_eq!(display_name("https://example.com/img/cat%20photo.jpg?s=1"), "cat photo.jpg");
/// ```
pub fn display_name(identifier: &str) -> String {
    if let Ok(parsed) = url::Url::parse(identifier)
        && !parsed.cannot_be_a_base()
    {
        if let Some(mut segments) = parsed.path_segments()
            && let Some(last) = segments.next_back()
        {
            let decoded = match urlencoding::decode(last) {
                Ok(decoded) => decoded.into_owned(),
                Err(_) => last.to_string(),
            };
            return flat_name(&decoded);
        }
        return FALLBACK_NAME.to_string();
    }

    match identifier.rsplit(['/', '\\']).next() {
        Some(last) => flat_name(last),
        None => FALLBACK_NAME.to_string(),
    }
}

/// Turn a decoded segment into a single archive entry name
///
/// Separators and NUL become `_`; empty, `.` and `..` fall back to
/// [`FALLBACK_NAME`].
fn flat_name(segment: &str) -> String {
    let name: String = segment
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect();
    match name.as_str() {
        "" | "." | ".." => FALLBACK_NAME.to_string(),
        _ => name,
    }
}

/// Split a file name into stem and extension (`"a.tar.gz"` -> `("a.tar", Some("gz"))`)
fn split_name(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < name.len() => (&name[..idx], Some(&name[idx + 1..])),
        _ => (name, None),
    }
}

fn numbered_name(name: &str, n: u32) -> String {
    match split_name(name) {
        (stem, Some(ext)) => format!("{} ({}).{}", stem, n, ext),
        (stem, None) => format!("{} ({})", stem, n),
    }
}

/// Make archive entry names unique while keeping their order
///
/// The first occurrence keeps its name; later duplicates become
/// `name (1).ext`, `name (2).ext`, and so on.
pub fn unique_entry_names<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut taken: HashSet<String> = HashSet::new();
    let mut result = Vec::new();

    for name in names {
        let name = name.as_ref();
        let mut candidate = name.to_string();
        let mut n = 1;
        while taken.contains(&candidate) {
            candidate = numbered_name(name, n);
            n += 1;
        }
        taken.insert(candidate.clone());
        result.push(candidate);
    }

    result
}

/// Get a unique file path based on the collision action
///
/// # Examples
///
/// ```no_run
/// use bundle_dl::utils::get_unique_path;
/// use bundle_dl::config::FileCollisionAction;
/// use std::path::Path;
///
/// let path = Path::new("/tmp/files.zip");
/// let unique = get_unique_path(path, FileCollisionAction::Rename).unwrap();
/// // If /tmp/files.zip exists, returns /tmp/files (1).zip
/// ```
pub fn get_unique_path(
    path: &Path,
    action: FileCollisionAction,
) -> Result<PathBuf, ArchiveError> {
    match action {
        FileCollisionAction::Overwrite => Ok(path.to_path_buf()),
        FileCollisionAction::Rename => {
            if !path.exists() {
                return Ok(path.to_path_buf());
            }

            let file_name = path.file_name().and_then(|s| s.to_str()).ok_or_else(|| {
                ArchiveError::Save {
                    path: path.to_path_buf(),
                    reason: "cannot extract file name".to_string(),
                }
            })?;
            let parent = path.parent().unwrap_or_else(|| Path::new(""));

            for i in 1..=MAX_RENAME_ATTEMPTS {
                let new_path = parent.join(numbered_name(file_name, i));
                if !new_path.exists() {
                    return Ok(new_path);
                }
            }

            Err(ArchiveError::Save {
                path: path.to_path_buf(),
                reason: format!(
                    "could not find a unique file name after {} attempts",
                    MAX_RENAME_ATTEMPTS
                ),
            })
        }
    }
}
