//! Path parsing for container/blob paths
//!
//! Paths have the form `container` or `container/segment[/segment]*`. They are
//! always UTF-8 and always use forward slashes. A leading slash or anything
//! that looks like a URI is rejected.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::error::{Error, Result};

/// Path separator
pub const SEP: char = '/';

/// The longest registered URI scheme has 36 characters.
const MAX_URI_SCHEME_LEN: usize = 36;

/// A validated location inside a storage account
///
/// Equality and hashing only look at the container and the path inside it;
/// `full_path` is derived from those two.
#[derive(Debug, Clone, Default)]
pub struct BlobPath {
    full_path: String,
    container: String,
    path_to_file: String,
    path_to_file_parts: Vec<String>,
}

impl BlobPath {
    /// Parse a path string
    ///
    /// # Example
    /// ```
    /// use bfs_core::BlobPath;
    ///
    /// let path = BlobPath::parse("container/dir/file.txt").unwrap();
    /// assert_eq!(path.container(), "container");
    /// assert_eq!(path.path_to_file(), "dir/file.txt");
    /// assert_eq!(path.path_to_file_parts(), ["dir", "file.txt"]);
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        if is_likely_uri(s) {
            return Err(Error::InvalidPath(format!(
                "Expected an Azure object path of the form 'container/path...', got a URI: '{s}'"
            )));
        }

        let src = remove_trailing_slash(s);
        match src.find(SEP) {
            Some(0) => Err(Error::InvalidPath(format!(
                "Path cannot start with a separator ('{s}')"
            ))),
            None => Ok(Self {
                full_path: src.to_string(),
                container: src.to_string(),
                path_to_file: String::new(),
                path_to_file_parts: Vec::new(),
            }),
            Some(first_sep) => {
                let path_to_file = &src[first_sep + 1..];
                let path = Self {
                    full_path: src.to_string(),
                    container: src[..first_sep].to_string(),
                    path_to_file: path_to_file.to_string(),
                    path_to_file_parts: split_abstract_path(path_to_file),
                };
                path.validate()?;
                Ok(path)
            }
        }
    }

    fn validate(&self) -> Result<()> {
        validate_abstract_path_parts(&self.path_to_file_parts)
            .map_err(|msg| Error::InvalidPath(format!("{msg} in path {}", self.full_path)))
    }

    /// Normalized path string, without trailing separator
    pub fn full_path(&self) -> &str {
        &self.full_path
    }

    /// Top-level namespace
    pub fn container(&self) -> &str {
        &self.container
    }

    /// Remainder after the container, possibly empty
    pub fn path_to_file(&self) -> &str {
        &self.path_to_file
    }

    /// Non-empty segments of [`path_to_file`](Self::path_to_file)
    pub fn path_to_file_parts(&self) -> &[String] {
        &self.path_to_file_parts
    }

    /// True when the path names something below a container
    pub fn has_parent(&self) -> bool {
        !self.path_to_file.is_empty()
    }

    /// True for the empty path (no container, no blob)
    pub fn is_empty(&self) -> bool {
        self.container.is_empty() && self.path_to_file.is_empty()
    }

    /// The enclosing path, or `None` for a bare container
    pub fn parent(&self) -> Option<Self> {
        if !self.has_parent() {
            return None;
        }

        let mut parts = self.path_to_file_parts.clone();
        parts.pop();
        let path_to_file = join_abstract_path(&parts);
        let full_path = if path_to_file.is_empty() {
            self.container.clone()
        } else {
            format!("{}{SEP}{path_to_file}", self.container)
        };

        Some(Self {
            full_path,
            container: self.container.clone(),
            path_to_file,
            path_to_file_parts: parts,
        })
    }

    /// Check the structural preconditions for opening a file
    ///
    /// A path without a container cannot exist, and a bare container is not
    /// a file. Both are checked before any network call.
    pub fn validate_file_path(&self) -> Result<()> {
        if self.container.is_empty() {
            return Err(Error::path_not_found(&self.full_path));
        }
        if self.path_to_file.is_empty() {
            return Err(Error::not_a_file(&self.full_path));
        }
        Ok(())
    }
}

impl PartialEq for BlobPath {
    fn eq(&self, other: &Self) -> bool {
        self.container == other.container && self.path_to_file == other.path_to_file
    }
}

impl Eq for BlobPath {}

impl Hash for BlobPath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.container.hash(state);
        self.path_to_file.hash(state);
    }
}

impl fmt::Display for BlobPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_path)
    }
}

impl FromStr for BlobPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Heuristic check for `scheme:...` strings
///
/// Single-letter schemes are treated as Windows drive letters, not URIs.
pub fn is_likely_uri(s: &str) -> bool {
    if s.is_empty() || s.starts_with(SEP) {
        return false;
    }
    let Some(pos) = s.find(':') else {
        return false;
    };
    if !(2..=MAX_URI_SCHEME_LEN).contains(&pos) {
        return false;
    }
    is_valid_uri_scheme(&s[..pos])
}

fn is_valid_uri_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

pub fn has_trailing_slash(s: &str) -> bool {
    s.ends_with(SEP)
}

/// Strip a single trailing separator
pub fn remove_trailing_slash(s: &str) -> &str {
    s.strip_suffix(SEP).unwrap_or(s)
}

/// Reject paths that end with a separator; those name directories
pub fn assert_no_trailing_slash(s: &str) -> Result<()> {
    if has_trailing_slash(s) {
        return Err(Error::not_a_file(s));
    }
    Ok(())
}

/// Split a path into its segments; the empty path has none
pub fn split_abstract_path(s: &str) -> Vec<String> {
    if s.is_empty() {
        return Vec::new();
    }
    s.split(SEP).map(str::to_string).collect()
}

pub fn join_abstract_path<S: AsRef<str>>(parts: &[S]) -> String {
    parts
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("/")
}

/// Check that every segment is non-empty and free of separators
pub fn validate_abstract_path_parts<S: AsRef<str>>(
    parts: &[S],
) -> std::result::Result<(), String> {
    for part in parts.iter().map(AsRef::as_ref) {
        if part.is_empty() {
            return Err("Empty path component".to_string());
        }
        if part.contains(SEP) {
            return Err(format!("Separator in component '{part}'"));
        }
    }
    Ok(())
}
