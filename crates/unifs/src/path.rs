// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! UNIX-style path algebra shared by every backend
//!
//! A [`UnixPath`] is an immutable list of name components plus an absolute
//! flag. Paths come in two styles chosen by the owning filesystem:
//!
//! - general paths, where `.` and `..` are ordinary components resolved by
//!   [`UnixPath::normalize`] and directory-ness is not tracked
//! - blob-store paths, for flat object stores, which additionally remember
//!   whether the text they were parsed from denoted a directory (a trailing
//!   separator, or a last component of `.`, `..` or nothing). The flag is
//!   computed once and decides whether renderings carry a trailing separator.
//!
//! Paths refer to their filesystem through an [`FsRef`], a non-owning
//! handle: a path never keeps a filesystem alive.

use crate::error::{Error, Result};
use crate::fs::FileSystem;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};
use url::Url;

const CURRENT_DIR: &str = ".";
const PARENT_DIR: &str = "..";

/// Path flavor of a filesystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathStyle {
    Unix,
    BlobStore,
}

/// Non-owning handle from a path to its filesystem
#[derive(Clone)]
pub struct FsRef {
    id: u64,
    separator: char,
    style: PathStyle,
    fs: Weak<FileSystem>,
}

impl FsRef {
    pub(crate) fn new(id: u64, separator: char, style: PathStyle, fs: Weak<FileSystem>) -> Self {
        Self {
            id,
            separator,
            style,
            fs,
        }
    }

    /// A handle with a fresh identity that is not backed by any filesystem.
    ///
    /// Path algebra works on detached paths; anything that needs the
    /// filesystem (absolute resolution, URIs) fails with `ClosedFileSystem`.
    #[must_use]
    pub fn detached(separator: char, style: PathStyle) -> Self {
        Self::new(crate::next_instance_id(), separator, style, Weak::new())
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub fn separator(&self) -> char {
        self.separator
    }

    #[must_use]
    pub fn style(&self) -> PathStyle {
        self.style
    }

    /// The filesystem, if it is still alive.
    pub fn upgrade(&self) -> Result<Arc<FileSystem>> {
        self.fs.upgrade().ok_or(Error::ClosedFileSystem)
    }

    /// Parse `text` into a path of this filesystem.
    #[must_use]
    pub fn parse(&self, text: &str) -> UnixPath {
        let sep = self.separator;
        let absolute = text.starts_with(sep);
        let components = if text.is_empty() {
            vec![String::new()]
        } else {
            text.split(sep)
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .collect()
        };
        let kind = match self.style {
            PathStyle::Unix => PathKind::General,
            PathStyle::BlobStore => PathKind::Blob {
                directory: text.ends_with(sep)
                    || matches!(text.rsplit(sep).next(), Some("" | CURRENT_DIR | PARENT_DIR)),
            },
        };
        UnixPath {
            fs: self.clone(),
            components,
            absolute,
            kind,
        }
    }

    /// Join `first` and `more` with the separator and parse the result.
    ///
    /// Empty segments are skipped.
    #[must_use]
    pub fn path(&self, first: &str, more: &[&str]) -> UnixPath {
        let mut joined = first.to_string();
        for segment in more.iter().filter(|s| !s.is_empty()) {
            if !joined.is_empty() {
                joined.push(self.separator);
            }
            joined.push_str(segment);
        }
        self.parse(&joined)
    }

    #[must_use]
    pub fn root(&self) -> UnixPath {
        self.parse(&self.separator.to_string())
    }

    #[must_use]
    pub fn empty_path(&self) -> UnixPath {
        self.parse("")
    }
}

impl std::fmt::Debug for FsRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsRef")
            .field("id", &self.id)
            .field("separator", &self.separator)
            .field("style", &self.style)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PathKind {
    General,
    Blob { directory: bool },
}

/// Immutable hierarchical path
#[derive(Clone)]
pub struct UnixPath {
    fs: FsRef,
    /// Never contains empty strings, except for the single-element empty path.
    components: Vec<String>,
    absolute: bool,
    kind: PathKind,
}

impl UnixPath {
    /// Rebuild a path of the same filesystem from rendered text.
    fn reparse(&self, text: &str) -> UnixPath {
        self.fs.parse(text)
    }

    /// Render `components` with this path's separator.
    fn render(&self, components: &[String], absolute: bool, directory: bool) -> String {
        let sep = self.fs.separator;
        let mut text = String::new();
        if absolute {
            text.push(sep);
        }
        text.push_str(&components.join(&sep.to_string()));
        if directory
            && self.is_blob_path()
            && !components.is_empty()
            && !(components.len() == 1 && components[0].is_empty())
        {
            text.push(sep);
        }
        text
    }

    fn check_same_fs(&self, other: &UnixPath, operation: &str) -> Result<()> {
        if self.fs.id != other.fs.id {
            return Err(Error::invalid_argument(format!(
                "Cannot {operation} paths of different file systems: '{self}' and '{other}'"
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn fs_ref(&self) -> &FsRef {
        &self.fs
    }

    pub fn file_system(&self) -> Result<Arc<FileSystem>> {
        self.fs.upgrade()
    }

    #[must_use]
    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    #[must_use]
    pub fn is_blob_path(&self) -> bool {
        matches!(self.kind, PathKind::Blob { .. })
    }

    /// Directory-ness inferred from the text a blob-store path was parsed
    /// from. General paths always report false.
    #[must_use]
    pub fn is_directory(&self) -> bool {
        matches!(self.kind, PathKind::Blob { directory: true })
    }

    /// The `""` path: relative with a single empty name.
    #[must_use]
    pub fn is_empty_path(&self) -> bool {
        !self.absolute && self.components.len() == 1 && self.components[0].is_empty()
    }

    /// Name components; the root has none, the empty path has one empty name.
    #[must_use]
    pub fn components(&self) -> &[String] {
        &self.components
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.components.iter().map(String::as_str)
    }

    #[must_use]
    pub fn name_count(&self) -> usize {
        self.components.len()
    }

    /// The `index`-th name as a relative path.
    ///
    /// Blob-store names are directories except for the last name of a
    /// non-directory path.
    pub fn name(&self, index: usize) -> Result<UnixPath> {
        let component = self.components.get(index).ok_or_else(|| {
            Error::invalid_argument(format!(
                "Name index {index} out of range for '{self}' ({} names)",
                self.components.len()
            ))
        })?;
        let last = index + 1 == self.components.len();
        let directory = match self.kind {
            PathKind::General => false,
            PathKind::Blob { directory } => !last || directory,
        };
        Ok(self.reparse(&self.render(std::slice::from_ref(component), false, directory)))
    }

    pub fn iter(&self) -> impl Iterator<Item = UnixPath> + '_ {
        (0..self.components.len()).filter_map(|i| self.name(i).ok())
    }

    #[must_use]
    pub fn file_name(&self) -> Option<UnixPath> {
        if self.components.is_empty() {
            return None;
        }
        self.name(self.components.len() - 1).ok()
    }

    #[must_use]
    pub fn parent(&self) -> Option<UnixPath> {
        let count = self.components.len();
        if count == 0 || (count == 1 && !self.absolute) {
            return None;
        }
        Some(self.reparse(&self.render(&self.components[..count - 1], self.absolute, true)))
    }

    #[must_use]
    pub fn root(&self) -> Option<UnixPath> {
        self.absolute.then(|| self.fs.root())
    }

    /// Relative path of names `begin..end`.
    pub fn subpath(&self, begin: usize, end: usize) -> Result<UnixPath> {
        if begin >= end || end > self.components.len() {
            return Err(Error::invalid_argument(format!(
                "Invalid subpath range {begin}..{end} for '{self}' ({} names)",
                self.components.len()
            )));
        }
        let directory = end < self.components.len() || self.is_directory();
        Ok(self.reparse(&self.render(&self.components[begin..end], false, directory)))
    }

    /// Component-wise prefix test. Paths of other filesystems never match.
    #[must_use]
    pub fn starts_with(&self, other: &UnixPath) -> bool {
        if self.fs.id != other.fs.id || self.absolute != other.absolute {
            return false;
        }
        other.components.len() <= self.components.len()
            && self.components.iter().zip(&other.components).all(|(a, b)| a == b)
    }

    #[must_use]
    pub fn starts_with_str(&self, other: &str) -> bool {
        self.starts_with(&self.reparse(other))
    }

    /// Component-wise suffix test. An absolute `other` must match entirely.
    #[must_use]
    pub fn ends_with(&self, other: &UnixPath) -> bool {
        if self.fs.id != other.fs.id {
            return false;
        }
        if other.absolute && (!self.absolute || other.components.len() != self.components.len()) {
            return false;
        }
        other.components.len() <= self.components.len()
            && self
                .components
                .iter()
                .rev()
                .zip(other.components.iter().rev())
                .all(|(a, b)| a == b)
    }

    #[must_use]
    pub fn ends_with_str(&self, other: &str) -> bool {
        self.ends_with(&self.reparse(other))
    }

    /// Remove `.` names and collapse `name/..` pairs.
    ///
    /// Absolute paths never climb above the root; relative paths keep the
    /// `..` names they cannot collapse.
    #[must_use]
    pub fn normalize(&self) -> UnixPath {
        let mut stack: Vec<String> = Vec::with_capacity(self.components.len());
        for component in &self.components {
            match component.as_str() {
                "" | CURRENT_DIR => {}
                PARENT_DIR => match stack.last() {
                    Some(last) if last != PARENT_DIR => {
                        _ = stack.pop();
                    }
                    _ if self.absolute => {}
                    _ => stack.push(PARENT_DIR.to_string()),
                },
                name => stack.push(name.to_string()),
            }
        }
        self.reparse(&self.render(&stack, self.absolute, self.is_directory()))
    }

    /// Resolve `other` against this path.
    pub fn resolve(&self, other: &UnixPath) -> Result<UnixPath> {
        self.check_same_fs(other, "resolve")?;
        Ok(self.resolve_same_fs(other))
    }

    fn resolve_same_fs(&self, other: &UnixPath) -> UnixPath {
        if other.absolute || self.is_empty_path() {
            return other.clone();
        }
        if other.is_empty_path() {
            return self.clone();
        }
        self.reparse(&format!("{}{}{}", self, self.fs.separator, other))
    }

    #[must_use]
    pub fn resolve_str(&self, other: &str) -> UnixPath {
        self.resolve_same_fs(&self.reparse(other))
    }

    /// Resolve `other` against this path's parent.
    pub fn resolve_sibling(&self, other: &UnixPath) -> Result<UnixPath> {
        self.check_same_fs(other, "resolve")?;
        Ok(match self.parent() {
            Some(parent) => parent.resolve_same_fs(other),
            None => other.clone(),
        })
    }

    /// Relative path that leads from this path to `other`.
    pub fn relativize(&self, other: &UnixPath) -> Result<UnixPath> {
        self.check_same_fs(other, "relativize")?;
        if self.absolute != other.absolute {
            return Err(Error::invalid_argument(format!(
                "Cannot relativize an absolute path with a relative path: '{self}' and '{other}'"
            )));
        }
        if self == other {
            return Ok(self.fs.empty_path());
        }
        if self.is_empty_path() {
            return Ok(other.clone());
        }

        let ups_to = |count: usize| vec![PARENT_DIR.to_string(); count];

        if other.is_empty_path() || self.starts_with(other) {
            let depth = if other.is_empty_path() {
                self.components.len()
            } else {
                self.components.len() - other.components.len()
            };
            return Ok(self.reparse(&self.render(&ups_to(depth), false, true)));
        }
        if other.starts_with(self) {
            return other.subpath(self.components.len(), other.components.len());
        }

        let common = self
            .components
            .iter()
            .zip(&other.components)
            .take_while(|(a, b)| a == b)
            .count();
        let mut parts = ups_to(self.components.len() - common);
        let rest: Vec<String> = other.components[common..]
            .iter()
            .skip_while(|c| c.as_str() == PARENT_DIR)
            .cloned()
            .collect();
        let directory = if rest.is_empty() {
            true
        } else {
            other.is_directory()
        };
        parts.extend(rest);
        Ok(self.reparse(&self.render(&parts, false, directory)))
    }

    /// Resolve against the filesystem's working directory.
    pub fn to_absolute_path(&self) -> Result<UnixPath> {
        if self.absolute {
            return Ok(self.clone());
        }
        let fs = self.fs.upgrade()?;
        Ok(fs.working_directory().resolve_same_fs(self))
    }

    /// The filesystem's base URI with this path's absolute, normalized form.
    pub fn to_uri(&self) -> Result<Url> {
        let fs = self.fs.upgrade()?;
        let absolute = self.to_absolute_path()?.normalize();
        let mut path = String::from("/");
        path.push_str(&absolute.components.join("/"));
        if absolute.is_directory() && !absolute.components.is_empty() {
            path.push('/');
        }
        let mut uri = fs.uri().clone();
        uri.set_path(&path);
        Ok(uri)
    }

    /// Lexicographic comparison of the rendered forms.
    pub fn compare_to(&self, other: &UnixPath) -> Result<Ordering> {
        self.check_same_fs(other, "compare")?;
        Ok(self.to_string().cmp(&other.to_string()))
    }

    /// First name of a blob-store path.
    #[must_use]
    pub fn bucket_name(&self) -> Option<&str> {
        if !self.is_blob_path() || self.is_empty_path() {
            return None;
        }
        self.components.first().map(String::as_str)
    }

    /// Names after the bucket, with a trailing separator for directories.
    #[must_use]
    pub fn blob_name(&self) -> Option<String> {
        if !self.is_blob_path() || self.components.len() < 2 {
            return None;
        }
        Some(self.render(&self.components[1..], false, self.is_directory()))
    }
}

impl std::fmt::Display for UnixPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render(&self.components, self.absolute, self.is_directory()))
    }
}

impl std::fmt::Debug for UnixPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "UnixPath({:?})", self.to_string())
    }
}

/// Same filesystem instance, same absoluteness, same names.
impl PartialEq for UnixPath {
    fn eq(&self, other: &Self) -> bool {
        self.fs.id == other.fs.id
            && self.absolute == other.absolute
            && self.components == other.components
    }
}

impl Eq for UnixPath {}

impl Hash for UnixPath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.fs.id.hash(state);
        self.absolute.hash(state);
        self.components.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unix() -> FsRef {
        FsRef::detached('/', PathStyle::Unix)
    }

    fn blob() -> FsRef {
        FsRef::detached('/', PathStyle::BlobStore)
    }

    #[test]
    fn test_parse() {
        let fs = unix();
        let p = fs.parse("/a//b/");
        assert!(p.is_absolute());
        assert_eq!(p.components(), ["a", "b"]);
        assert_eq!(p.to_string(), "/a/b");

        let root = fs.parse("/");
        assert!(root.is_absolute());
        assert_eq!(root.name_count(), 0);
        assert_eq!(root.to_string(), "/");

        let empty = fs.parse("");
        assert!(empty.is_empty_path());
        assert_eq!(empty.name_count(), 1);
        assert_eq!(empty.to_string(), "");
    }

    #[test]
    fn test_path_joins_segments() {
        let fs = unix();
        assert_eq!(fs.path("/a", &["b", "", "c"]).to_string(), "/a/b/c");
        assert_eq!(fs.path("", &["x"]).to_string(), "x");
        assert!(fs.path("", &[]).is_empty_path());
    }

    #[test]
    fn test_equality_requires_same_fs() {
        let fs = unix();
        assert_eq!(fs.parse("/a/b"), fs.parse("/a//b/"));
        assert_ne!(fs.parse("/a/b"), fs.parse("a/b"));
        assert_ne!(fs.parse("/a/b"), unix().parse("/a/b"));
    }

    #[test]
    fn test_parent_root_file_name() {
        let fs = unix();
        let p = fs.parse("/a/b/c");
        assert_eq!(p.parent().unwrap().to_string(), "/a/b");
        assert_eq!(fs.parse("/a").parent().unwrap().to_string(), "/");
        assert!(fs.parse("/").parent().is_none());
        assert!(fs.parse("a").parent().is_none());
        assert_eq!(p.root().unwrap().to_string(), "/");
        assert!(fs.parse("a/b").root().is_none());
        assert_eq!(p.file_name().unwrap().to_string(), "c");
        assert!(fs.parse("/").file_name().is_none());
    }

    #[test]
    fn test_name_and_subpath_bounds() {
        let fs = unix();
        let p = fs.parse("/a/b/c");
        assert_eq!(p.name(1).unwrap().to_string(), "b");
        assert!(matches!(p.name(3), Err(Error::InvalidArgument(_))));
        assert_eq!(p.subpath(1, 3).unwrap().to_string(), "b/c");
        assert!(matches!(p.subpath(2, 2), Err(Error::InvalidArgument(_))));
        assert!(matches!(p.subpath(0, 4), Err(Error::InvalidArgument(_))));
        let names: Vec<String> = p.iter().map(|n| n.to_string()).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn test_normalize() {
        let fs = unix();
        assert_eq!(fs.parse("/a/./b/../c").normalize().to_string(), "/a/c");
        assert_eq!(fs.parse("/../a").normalize().to_string(), "/a");
        assert_eq!(fs.parse("../a/../../b").normalize().to_string(), "../../b");
        assert_eq!(fs.parse("a/..").normalize().to_string(), "");
        assert!(fs.parse("a/..").normalize().is_empty_path());
        assert_eq!(fs.parse("/a/..").normalize().to_string(), "/");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let fs = blob();
        for text in [
            "", "/", ".", "..", "a/./b", "/a/../..", "../../x/", "a/b/..", "/x/y/./", "a//b/c/../",
        ] {
            let once = fs.parse(text).normalize();
            let twice = once.normalize();
            assert_eq!(once, twice, "{text}");
            assert_eq!(once.to_string(), twice.to_string(), "{text}");
        }
    }

    #[test]
    fn test_resolve() {
        let fs = unix();
        let base = fs.parse("/a/b");
        assert_eq!(base.resolve(&fs.parse("c/d")).unwrap().to_string(), "/a/b/c/d");
        assert_eq!(base.resolve(&fs.parse("/x")).unwrap().to_string(), "/x");
        assert_eq!(base.resolve(&fs.parse("")).unwrap(), base);
        assert_eq!(fs.parse("/").resolve_str("x").to_string(), "/x");
        assert_eq!(fs.parse("").resolve_str("x").to_string(), "x");
        assert_eq!(
            base.resolve_sibling(&fs.parse("z")).unwrap().to_string(),
            "/a/z"
        );

        let other = unix().parse("c");
        assert!(matches!(base.resolve(&other), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_relativize() {
        let fs = unix();
        let rel = |a: &str, b: &str| fs.parse(a).relativize(&fs.parse(b)).unwrap().to_string();
        assert_eq!(rel("/a/b", "/a/b"), "");
        assert_eq!(rel("/a", "/a/b/c"), "b/c");
        assert_eq!(rel("/a/b/c", "/a"), "../..");
        assert_eq!(rel("/a/b", "/a/x/y"), "../x/y");
        assert_eq!(rel("a/b", "c"), "../../c");
        assert_eq!(rel("", "a/b"), "a/b");
        assert_eq!(rel("a/b", ""), "../..");

        assert!(matches!(
            fs.parse("/a").relativize(&fs.parse("a")),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            fs.parse("/a").relativize(&unix().parse("/a")),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_relativize_resolve_roundtrip() {
        let fs = unix();
        let samples = ["/", "/a", "/a/b", "/a/b/c", "/a/x", "/q/r/s", "/a/b/c/d"];
        for a in samples {
            for b in samples {
                let (a, b) = (fs.parse(a), fs.parse(b));
                let relative = a.relativize(&b).unwrap();
                assert_eq!(a.resolve(&relative).unwrap().normalize(), b, "{a} -> {b}");
            }
        }
        let relative_samples = ["a", "a/b", "x/y/z", "a/b/c"];
        for a in relative_samples {
            for b in relative_samples {
                let (a, b) = (fs.parse(a), fs.parse(b));
                let relative = a.relativize(&b).unwrap();
                assert_eq!(a.resolve(&relative).unwrap().normalize(), b, "{a} -> {b}");
            }
        }
    }

    #[test]
    fn test_starts_and_ends_with() {
        let fs = unix();
        let p = fs.parse("/a/b/c");
        assert!(p.starts_with_str("/a/b"));
        assert!(!p.starts_with_str("a/b"));
        assert!(!p.starts_with_str("/a/bc"));
        assert!(p.ends_with_str("b/c"));
        assert!(p.ends_with_str("/a/b/c"));
        assert!(!p.ends_with_str("/b/c"));
        assert!(!p.starts_with(&unix().parse("/a")));
    }

    #[test]
    fn test_compare_to() {
        let fs = unix();
        assert_eq!(
            fs.parse("/a/b").compare_to(&fs.parse("/a/c")).unwrap(),
            Ordering::Less
        );
        assert!(fs.parse("/a").compare_to(&unix().parse("/a")).is_err());
    }

    #[test]
    fn test_blob_directory_flag() {
        let fs = blob();
        let dir = fs.parse("bucket/obj/");
        assert!(dir.is_directory());
        assert_eq!(dir.bucket_name(), Some("bucket"));
        assert_eq!(dir.blob_name().as_deref(), Some("obj/"));
        assert_eq!(dir.to_string(), "bucket/obj/");

        let file = fs.parse("bucket/obj");
        assert!(!file.is_directory());
        assert_eq!(file.blob_name().as_deref(), Some("obj"));

        assert!(fs.parse("a/.").is_directory());
        assert!(fs.parse("a/..").is_directory());
        assert!(fs.parse("").is_directory());
        assert!(fs.parse("/").is_directory());
        assert!(fs.parse("bucket").blob_name().is_none());
        assert!(!unix().parse("a/").is_directory());
    }

    #[test]
    fn test_blob_renderings_keep_trailing_separator() {
        let fs = blob();
        let dir = fs.parse("/bucket/a/b/");
        assert_eq!(dir.file_name().unwrap().to_string(), "b/");
        assert_eq!(dir.name(0).unwrap().to_string(), "bucket/");
        assert_eq!(dir.parent().unwrap().to_string(), "/bucket/a/");
        assert_eq!(dir.subpath(1, 3).unwrap().to_string(), "a/b/");

        let file = fs.parse("/bucket/a/b");
        assert_eq!(file.file_name().unwrap().to_string(), "b");
        assert_eq!(file.name(1).unwrap().to_string(), "a/");
        assert_eq!(file.subpath(1, 2).unwrap().to_string(), "a/");

        assert_eq!(fs.parse("/bucket/a/./").normalize().to_string(), "/bucket/a/");
        assert_eq!(fs.parse("/bucket/a/b/..").normalize().to_string(), "/bucket/a/");
        assert_eq!(fs.parse("/bucket/x/../y").normalize().to_string(), "/bucket/y");
        assert_eq!(fs.parse("/bucket/").resolve_str("key").to_string(), "/bucket/key");
    }

    #[test]
    fn test_blob_equality_ignores_directory_flag() {
        let fs = blob();
        assert_eq!(fs.parse("a/b/"), fs.parse("a/b"));
    }

    #[test]
    fn test_detached_cannot_make_absolute() {
        let fs = unix();
        assert!(matches!(
            fs.parse("a").to_absolute_path(),
            Err(Error::ClosedFileSystem)
        ));
        assert_eq!(fs.parse("/a").to_absolute_path().unwrap().to_string(), "/a");
    }
}
