// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Backend-agnostic virtual filesystem layer
//!
//! Storage connectors implement [`Backend`]; a [`Provider`] wraps one
//! backend and mounts [`FileSystem`]s, each with its own attribute cache and
//! closeable registry. Paths are [`UnixPath`]s in either the general or the
//! blob-store style.

use std::sync::atomic::{AtomicU64, Ordering};

mod attributes;
pub mod backend;
pub mod cache;
mod channel;
mod config;
mod error;
mod fs;
pub mod memory;
mod options;
pub mod paged;
mod path;
mod provider;
mod stream;

#[cfg(test)]
mod tests;

pub use attributes::{AttributeView, FileAttributes, FileKind};
pub use backend::{Backend, MountDescriptor, PathFilter, PathIter};
pub use cache::{AttributesCache, NoOpAttributesCache, TtlAttributesCache};
pub use channel::SeekableChannel;
pub use config::{DEFAULT_CACHE_TTL_MS, FsConfig, mount_key};
pub use error::{Error, Result};
pub use fs::{Closeable, FileStore, FileSystem, PathMatcher};
pub use memory::MemoryBackend;
pub use options::{AccessMode, CopyOption, OpenOption, OpenOptionSet, is_writable, option_set};
pub use paged::{PageSource, PagedIterator};
pub use path::{FsRef, PathStyle, UnixPath};
pub use provider::{FileAttributeView, Provider};
pub use stream::{DirectoryStream, InputStream, OutputStream};

static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity for providers and filesystems
pub(crate) fn next_instance_id() -> u64 {
    NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed)
}
