//! Local filename derivation for mirrored documents.
//!
//! Document identifiers are URL paths such as `/en/docs/claude-code/hooks`.
//! The section prefix is stripped and any remaining separators are replaced
//! with `__`, giving flat filenames like `hooks.md` or `sdk__migration-guide.md`.

use std::collections::HashMap;

/// Known section prefixes, longest first.
const KNOWN_PREFIXES: &[&str] = &["/en/docs/claude-code/", "/docs/claude-code/", "/claude-code/"];

/// Looser marker used when none of the known prefixes match.
const SECTION_MARKER: &str = "claude-code/";

/// Replacement for interior path separators.
const SEPARATOR_MARKER: &str = "__";

/// Extension of every mirrored file.
const MIRROR_EXTENSION: &str = ".md";

/// Two distinct identifiers that map to the same local filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameCollision {
    /// The shared filename.
    pub filename: String,
    /// Identifier that claimed the filename first.
    pub first: String,
    /// Identifier that collided with it.
    pub second: String,
}

/// Converts a document path to a flat, filesystem-safe filename.
///
/// # Examples
///
/// ```
/// use docmirror_core::fetch::url_to_safe_filename;
///
/// assert_eq!(url_to_safe_filename("/en/docs/claude-code/hooks"), "hooks.md");
/// assert_eq!(
///     url_to_safe_filename("/en/docs/claude-code/sdk/migration-guide"),
///     "sdk__migration-guide.md"
/// );
/// ```
#[must_use]
pub fn url_to_safe_filename(url_path: &str) -> String {
    let mut relative = url_path;
    for prefix in KNOWN_PREFIXES {
        if let Some((_, rest)) = url_path.rsplit_once(prefix) {
            if !rest.is_empty() {
                relative = rest;
            }
            break;
        }
    }

    if relative == url_path
        && let Some((_, rest)) = url_path.rsplit_once(SECTION_MARKER)
        && !rest.is_empty()
    {
        relative = rest;
    }

    let mut name = if relative.contains('/') {
        relative.replace('/', SEPARATOR_MARKER)
    } else {
        relative.to_string()
    };
    if !name.ends_with(MIRROR_EXTENSION) {
        name.push_str(MIRROR_EXTENSION);
    }
    name
}

/// Reports every identifier whose filename was already claimed by an earlier one.
///
/// Identical identifiers are not collisions. Order matters: the first
/// identifier to produce a filename keeps it.
#[must_use]
pub fn find_filename_collisions<'a, I>(paths: I) -> Vec<FilenameCollision>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut claimed: HashMap<String, &'a str> = HashMap::new();
    let mut collisions = Vec::new();
    for path in paths {
        let filename = url_to_safe_filename(path);
        match claimed.get(&filename) {
            Some(first) if *first != path => collisions.push(FilenameCollision {
                filename,
                first: (*first).to_string(),
                second: path.to_string(),
            }),
            Some(_) => {}
            None => {
                claimed.insert(filename, path);
            }
        }
    }
    collisions
}
