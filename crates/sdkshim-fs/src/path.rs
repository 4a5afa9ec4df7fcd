//! Normalized path handling for cross-platform compatibility
//!
//! All comparisons performed by the config resolver are lexical, so paths
//! are stored with forward slashes and simplified before they are compared.

use std::path::{Component, Path, PathBuf};

use crate::{Error, Result};

/// Lexically simplify a path.
///
/// Backslashes become forward slashes, empty and `.` components are
/// dropped, `..` consumes the previous component, and trailing separators
/// are removed. On an absolute path `..` never climbs above the root; on a
/// relative path leading `..` components are kept. An empty input stays
/// empty.
///
/// ```
/// use sdkshim_fs::simplify;
///
/// assert_eq!(simplify("/some/path//."), "/some/path");
/// assert_eq!(simplify("/a/b/../../../c"), "/c");
/// assert_eq!(simplify("../x/./y/"), "../x/y");
/// ```
pub fn simplify(path: &str) -> String {
    if path.is_empty() {
        return String::new();
    }

    let normalized = path.replace('\\', "/");
    let absolute = normalized.starts_with('/');

    let mut parts: Vec<&str> = Vec::new();
    for component in normalized.split('/') {
        match component {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if absolute => {}
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    if absolute {
        format!("/{joined}")
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

/// A path normalized to use forward slashes internally.
///
/// Provides consistent path handling across platforms by normalizing
/// all paths to forward slashes internally and converting to
/// platform-native format only at I/O boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedPath {
    /// Internal representation always uses forward slashes
    inner: String,
}

impl NormalizedPath {
    /// Create a new NormalizedPath from any path-like input.
    ///
    /// Converts backslashes to forward slashes for internal storage.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path_str = path.as_ref().to_string_lossy();
        let normalized = path_str.replace('\\', "/");
        Self { inner: normalized }
    }

    /// Create a lexically simplified path.
    pub fn simplified(path: impl AsRef<Path>) -> Self {
        Self::new(path).simplify()
    }

    /// Get the internal normalized string representation.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Convert to a platform-native PathBuf for I/O operations.
    pub fn to_native(&self) -> PathBuf {
        PathBuf::from(&self.inner)
    }

    /// Return the lexically simplified form of this path.
    pub fn simplify(&self) -> Self {
        Self {
            inner: simplify(&self.inner),
        }
    }

    /// Join this path with a segment.
    pub fn join(&self, segment: &str) -> Self {
        let segment_normalized = segment.replace('\\', "/");
        let joined = if self.inner.ends_with('/') {
            format!("{}{}", self.inner, segment_normalized)
        } else {
            format!("{}/{}", self.inner, segment_normalized)
        };
        Self { inner: joined }
    }

    /// Get the parent directory.
    pub fn parent(&self) -> Option<Self> {
        let trimmed = self.inner.trim_end_matches('/');
        match trimmed.rfind('/') {
            Some(idx) if idx > 0 => Some(Self {
                inner: trimmed[..idx].to_string(),
            }),
            Some(0) if trimmed.len() > 1 => Some(Self {
                inner: "/".to_string(),
            }),
            _ => None,
        }
    }

    /// This path followed by each of its ancestors, nearest first.
    pub fn ancestors(&self) -> Vec<Self> {
        let mut out = vec![self.clone()];
        let mut current = self.parent();
        while let Some(dir) = current {
            current = dir.parent();
            out.push(dir);
        }
        out
    }

    /// Get the file name component.
    pub fn file_name(&self) -> Option<&str> {
        let trimmed = self.inner.trim_end_matches('/');
        trimmed.rsplit('/').next().filter(|name| !name.is_empty())
    }

    /// Get the extension if present.
    pub fn extension(&self) -> Option<&str> {
        self.file_name().and_then(|name| {
            let idx = name.rfind('.')?;
            if idx == 0 {
                None
            } else {
                Some(&name[idx + 1..])
            }
        })
    }

    /// Compute the path of `self` relative to the directory `base`.
    ///
    /// Both paths are simplified first. Fails when one is absolute and the
    /// other is not, or when they live under different roots.
    pub fn relative_to(&self, base: &NormalizedPath) -> Result<NormalizedPath> {
        let target = self.simplify().to_native();
        let base_native = base.simplify().to_native();

        let no_relative = || Error::NoRelativePath {
            from: base.to_string(),
            to: self.to_string(),
        };

        if target.is_absolute() != base_native.is_absolute() {
            return Err(no_relative());
        }
        if root_of(&target) != root_of(&base_native) {
            return Err(no_relative());
        }

        pathdiff::diff_paths(&target, &base_native)
            .map(NormalizedPath::new)
            .ok_or_else(no_relative)
    }

    /// Check if this path exists on the filesystem.
    pub fn exists(&self) -> bool {
        self.to_native().exists()
    }

    /// Check if this is a file.
    pub fn is_file(&self) -> bool {
        self.to_native().is_file()
    }
}

fn root_of(path: &Path) -> Option<Component<'_>> {
    match path.components().next() {
        Some(c @ (Component::Prefix(_) | Component::RootDir)) => Some(c),
        _ => None,
    }
}

impl AsRef<Path> for NormalizedPath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.inner)
    }
}

impl std::fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<&str> for NormalizedPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for NormalizedPath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<PathBuf> for NormalizedPath {
    fn from(p: PathBuf) -> Self {
        Self::new(p)
    }
}

impl From<&Path> for NormalizedPath {
    fn from(p: &Path) -> Self {
        Self::new(p)
    }
}
