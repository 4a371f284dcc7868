// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::error::{Error, Result};
use std::time::SystemTime;

/// Kind of file behind a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Regular,
    Directory,
    Symlink,
    Other,
}

/// Attributes fetched from a backend and kept in the attribute cache
///
/// Covers the basic view and, when the backend knows them, the POSIX
/// owner/group/permission fields.
#[derive(Debug, Clone, PartialEq)]
pub struct FileAttributes {
    pub kind: FileKind,
    pub size: u64,
    pub last_modified: SystemTime,
    pub last_access: SystemTime,
    pub creation: SystemTime,
    pub file_key: Option<String>,
    pub owner: Option<String>,
    pub group: Option<String>,
    /// Unix permission bits, e.g. `0o644`
    pub permissions: Option<u32>,
}

impl FileAttributes {
    /// Attributes of a regular file with all timestamps set to `modified`.
    #[must_use]
    pub fn file(size: u64, modified: SystemTime) -> Self {
        Self::with_kind(FileKind::Regular, size, modified)
    }

    /// Attributes of a directory with all timestamps set to `modified`.
    #[must_use]
    pub fn directory(modified: SystemTime) -> Self {
        Self::with_kind(FileKind::Directory, 0, modified)
    }

    fn with_kind(kind: FileKind, size: u64, modified: SystemTime) -> Self {
        Self {
            kind,
            size,
            last_modified: modified,
            last_access: modified,
            creation: modified,
            file_key: None,
            owner: None,
            group: None,
            permissions: None,
        }
    }

    #[must_use]
    pub fn is_regular_file(&self) -> bool {
        self.kind == FileKind::Regular
    }

    #[must_use]
    pub fn is_directory(&self) -> bool {
        self.kind == FileKind::Directory
    }

    #[must_use]
    pub fn is_symbolic_link(&self) -> bool {
        self.kind == FileKind::Symlink
    }

    #[must_use]
    pub fn is_other(&self) -> bool {
        self.kind == FileKind::Other
    }
}

/// Attribute views a caller may ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeView {
    Basic,
    Posix,
    Owner,
    Dos,
    Acl,
    User,
}

impl AttributeView {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeView::Basic => "basic",
            AttributeView::Posix => "posix",
            AttributeView::Owner => "owner",
            AttributeView::Dos => "dos",
            AttributeView::Acl => "acl",
            AttributeView::User => "user",
        }
    }

    /// Views whose attributes can be read through `read_attributes`.
    #[must_use]
    pub fn is_readable(&self) -> bool {
        matches!(self, AttributeView::Basic | AttributeView::Posix)
    }

    /// Views `get_file_attribute_view` hands out.
    #[must_use]
    pub fn has_view(&self) -> bool {
        matches!(
            self,
            AttributeView::Basic | AttributeView::Posix | AttributeView::Owner
        )
    }
}

impl std::fmt::Display for AttributeView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AttributeView {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "basic" => Ok(AttributeView::Basic),
            "posix" => Ok(AttributeView::Posix),
            "owner" => Ok(AttributeView::Owner),
            "dos" => Ok(AttributeView::Dos),
            "acl" => Ok(AttributeView::Acl),
            "user" => Ok(AttributeView::User),
            other => Err(Error::unsupported(format!("attribute view '{other}'"))),
        }
    }
}
