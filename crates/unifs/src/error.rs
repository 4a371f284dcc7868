// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::io;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by paths, filesystems, providers and their streams
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Path not found: {0}")]
    NotFound(String),

    /// A filesystem is already mounted under this key
    #[error("File system already exists: {0}")]
    AlreadyExists(String),

    #[error("File system not found: {0}")]
    FileSystemNotFound(String),

    /// Copy, move or exclusive create onto an existing path
    #[error("File already exists: {0}")]
    FileAlreadyExists(String),

    #[error("File system is read-only: {0}")]
    ReadOnlyFileSystem(String),

    #[error("File system is closed")]
    ClosedFileSystem,

    /// Cross-provider or cross-filesystem misuse, bad ranges, bad option sets
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Invalid pattern: {0}")]
    Glob(#[from] utilities::glob::GlobError),

    #[error("Invalid pattern: {0}")]
    Regex(#[from] regex::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// `next` was called on an exhausted iterator
    #[error("No more elements")]
    NoSuchElement,

    #[error("Directory iteration failed: {0}")]
    DirectoryIteration(#[source] Box<Error>),

    #[error("Channel is closed")]
    ChannelClosed,

    #[error("Stream is closed")]
    StreamClosed,

    #[error("Configuration error: {0}")]
    Config(#[from] serde_yaml_ng::Error),

    #[error("Invalid URI: {0}")]
    Url(#[from] url::ParseError),
}

impl Error {
    pub fn not_found<S: AsRef<str>>(path: S) -> Self {
        Error::NotFound(path.as_ref().to_string())
    }

    pub fn already_exists<S: AsRef<str>>(key: S) -> Self {
        Error::AlreadyExists(key.as_ref().to_string())
    }

    pub fn file_system_not_found<S: AsRef<str>>(key: S) -> Self {
        Error::FileSystemNotFound(key.as_ref().to_string())
    }

    pub fn file_already_exists<S: AsRef<str>>(path: S) -> Self {
        Error::FileAlreadyExists(path.as_ref().to_string())
    }

    pub fn read_only<S: AsRef<str>>(path: S) -> Self {
        Error::ReadOnlyFileSystem(path.as_ref().to_string())
    }

    pub fn invalid_argument<S: Into<String>>(message: S) -> Self {
        Error::InvalidArgument(message.into())
    }

    pub fn unsupported<S: Into<String>>(operation: S) -> Self {
        Error::Unsupported(operation.into())
    }

    pub fn directory_iteration(source: Error) -> Self {
        Error::DirectoryIteration(Box::new(source))
    }

    /// True for [`Error::NotFound`] and for I/O errors of kind `NotFound`.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::NotFound(_) => true,
            Error::Io(e) => e.kind() == io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

/// Lets streams and channels report through `Read`/`Write`/`Seek`.
impl From<Error> for io::Error {
    fn from(e: Error) -> Self {
        match e {
            Error::Io(e) => e,
            Error::NotFound(path) => io::Error::new(io::ErrorKind::NotFound, path),
            Error::FileAlreadyExists(path) => io::Error::new(io::ErrorKind::AlreadyExists, path),
            Error::ReadOnlyFileSystem(path) => io::Error::new(io::ErrorKind::ReadOnlyFilesystem, path),
            Error::InvalidArgument(msg) => io::Error::new(io::ErrorKind::InvalidInput, msg),
            Error::Unsupported(msg) => io::Error::new(io::ErrorKind::Unsupported, msg),
            other => io::Error::other(other),
        }
    }
}
