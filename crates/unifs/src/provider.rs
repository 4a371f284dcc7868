// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Per-backend gateway
//!
//! A [`Provider`] owns the registry of mounted filesystems for one backend,
//! keyed by scheme and authority, and implements the generic operations on
//! top of the backend hooks. Every operation first checks that the path was
//! made by a filesystem of this provider and that the filesystem is open.

use crate::attributes::{AttributeView, FileAttributes};
use crate::backend::{Backend, PathFilter};
use crate::channel::SeekableChannel;
use crate::config::{FsConfig, mount_key};
use crate::error::{Error, Result};
use crate::fs::{FileStore, FileSystem};
use crate::options::{AccessMode, CopyOption, OpenOption, OpenOptionSet, option_set};
use crate::path::UnixPath;
use crate::stream::{DirectoryStream, InputStream, OutputStream};
use diagnostics::*;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use url::Url;

pub struct Provider {
    id: u64,
    backend: Arc<dyn Backend>,
    file_systems: Mutex<HashMap<String, Arc<FileSystem>>>,
    this: Weak<Provider>,
}

impl Provider {
    pub fn new(backend: Arc<dyn Backend>) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            id: crate::next_instance_id(),
            backend,
            file_systems: Mutex::new(HashMap::new()),
            this: this.clone(),
        })
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub fn scheme(&self) -> &str {
        self.backend.scheme()
    }

    pub(crate) fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    fn registry(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<FileSystem>>> {
        self.file_systems
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn check_scheme(&self, uri: &Url) -> Result<()> {
        if uri.scheme() != self.scheme() {
            return Err(Error::invalid_argument(format!(
                "URI scheme of '{uri}' does not match provider scheme '{}'",
                self.scheme()
            )));
        }
        Ok(())
    }

    fn mount(
        &self,
        registry: &mut HashMap<String, Arc<FileSystem>>,
        key: String,
        uri: &Url,
        config: &FsConfig,
    ) -> Result<Arc<FileSystem>> {
        let this = self.this.upgrade().ok_or(Error::ClosedFileSystem)?;
        let descriptor = self.backend.create_file_system(uri, config)?;
        let fs = FileSystem::new(&this, key.clone(), uri.clone(), descriptor, config);
        info!("mounted file system {key}", key: key.as_str());
        _ = registry.insert(key, fs.clone());
        Ok(fs)
    }

    /// Mount a new filesystem for `uri`; fails if one is already mounted
    /// under the same scheme and authority.
    pub fn new_file_system(&self, uri: &Url, config: &FsConfig) -> Result<Arc<FileSystem>> {
        self.check_scheme(uri)?;
        let key = mount_key(uri);
        let mut registry = self.registry();
        if registry.contains_key(&key) {
            return Err(Error::already_exists(key));
        }
        self.mount(&mut registry, key, uri, config)
    }

    /// The filesystem mounted for `uri`, mounting it first if needed.
    pub fn get_or_create_file_system(
        &self,
        uri: &Url,
        config: &FsConfig,
    ) -> Result<Arc<FileSystem>> {
        self.check_scheme(uri)?;
        let key = mount_key(uri);
        let mut registry = self.registry();
        if let Some(fs) = registry.get(&key) {
            return Ok(fs.clone());
        }
        self.mount(&mut registry, key, uri, config)
    }

    pub fn get_file_system(&self, uri: &Url) -> Result<Arc<FileSystem>> {
        let key = mount_key(uri);
        self.registry()
            .get(&key)
            .cloned()
            .ok_or_else(|| Error::file_system_not_found(key))
    }

    /// Drop the registry slot for `uri` without closing the filesystem.
    pub fn remove_file_system(&self, uri: &Url) -> Option<Arc<FileSystem>> {
        let key = mount_key(uri);
        let removed = self.registry().remove(&key);
        if removed.is_some() {
            debug!("removed file system {key}", key: key.as_str());
        }
        removed
    }

    /// Remove `key` only if it still maps to filesystem `fs_id`.
    pub(crate) fn forget_file_system(&self, key: &str, fs_id: u64) {
        let mut registry = self.registry();
        if registry.get(key).is_some_and(|fs| fs.id() == fs_id) {
            _ = registry.remove(key);
        }
    }

    #[must_use]
    pub fn file_system_count(&self) -> usize {
        self.registry().len()
    }

    /// Path named by `uri` in its mounted filesystem.
    pub fn get_path(&self, uri: &Url) -> Result<UnixPath> {
        let fs = self.get_file_system(uri)?;
        let path = if uri.path().is_empty() { "/" } else { uri.path() };
        Ok(fs.get_path(path, &[]))
    }

    /// Filesystem of `path` once it is known to belong here and be open.
    fn check_path(&self, path: &UnixPath) -> Result<Arc<FileSystem>> {
        let fs = path.file_system()?;
        if fs.provider_id() != self.id {
            return Err(Error::invalid_argument(format!(
                "path from different provider: '{path}'"
            )));
        }
        fs.check_open()?;
        Ok(fs)
    }

    fn check_writable(fs: &FileSystem, path: &UnixPath) -> Result<()> {
        if fs.is_read_only() {
            return Err(Error::read_only(path.to_string()));
        }
        Ok(())
    }

    /// Absolute, normalized form handed to backend hooks
    fn canonical(path: &UnixPath) -> Result<UnixPath> {
        Ok(path.to_absolute_path()?.normalize())
    }

    pub fn new_input_stream(&self, path: &UnixPath, options: &[OpenOption]) -> Result<InputStream> {
        let fs = self.check_path(path)?;
        let options = option_set(options);
        if options.contains(&OpenOption::Append) || options.contains(&OpenOption::Write) {
            return Err(Error::invalid_argument(format!(
                "APPEND and WRITE are not allowed when reading '{path}'"
            )));
        }
        let raw = self
            .backend
            .new_input_stream_internal(&Self::canonical(path)?, &options)?;
        Ok(InputStream::new(&fs, raw))
    }

    /// Output options after defaulting: none means write, create, truncate.
    fn output_options(path: &UnixPath, options: &[OpenOption]) -> Result<OpenOptionSet> {
        if options.is_empty() {
            return Ok(option_set(&[
                OpenOption::Write,
                OpenOption::Create,
                OpenOption::TruncateExisting,
            ]));
        }
        let mut options = option_set(options);
        if options.contains(&OpenOption::Read) {
            return Err(Error::invalid_argument(format!(
                "READ is not allowed when writing '{path}'"
            )));
        }
        _ = options.insert(OpenOption::Write);
        Ok(options)
    }

    pub fn new_output_stream(
        &self,
        path: &UnixPath,
        options: &[OpenOption],
    ) -> Result<OutputStream> {
        let fs = self.check_path(path)?;
        let options = Self::output_options(path, options)?;
        Self::check_writable(&fs, path)?;
        let canonical = Self::canonical(path)?;
        let raw = self
            .backend
            .new_output_stream_internal(&canonical, &options)?;
        fs.remove_from_attribute_cache(&canonical)?;
        Ok(OutputStream::new(&fs, raw))
    }

    /// Random-access channel staged through a local temporary file.
    pub fn new_byte_channel(
        &self,
        path: &UnixPath,
        options: &[OpenOption],
    ) -> Result<SeekableChannel> {
        let fs = self.check_path(path)?;
        let options = if options.is_empty() {
            option_set(&[OpenOption::Read])
        } else {
            option_set(options)
        };
        if crate::options::is_writable(&options) {
            Self::check_writable(&fs, path)?;
        }
        let canonical = Self::canonical(path)?;
        if options.contains(&OpenOption::CreateNew) && self.backend.exists(&canonical)? {
            return Err(Error::file_already_exists(canonical.to_string()));
        }
        SeekableChannel::open(&fs, canonical, options)
    }

    pub fn new_directory_stream(
        &self,
        dir: &UnixPath,
        filter: PathFilter,
    ) -> Result<DirectoryStream> {
        let fs = self.check_path(dir)?;
        let entries = self
            .backend
            .create_path_iterator(&Self::canonical(dir)?, filter)?;
        Ok(DirectoryStream::new(&fs, entries))
    }

    /// True if cached attributes exist or the backend reports the path.
    pub fn exists(&self, path: &UnixPath) -> Result<bool> {
        let fs = self.check_path(path)?;
        if fs.has_cached_attributes(path)? {
            return Ok(true);
        }
        self.backend.exists(&Self::canonical(path)?)
    }

    pub fn read_attributes(&self, path: &UnixPath, view: AttributeView) -> Result<FileAttributes> {
        let fs = self.check_path(path)?;
        if !view.is_readable() {
            return Err(Error::unsupported(format!("reading {view} attributes")));
        }
        if let Some(cached) = fs.get_cached_attributes(path)? {
            return Ok(cached);
        }
        let canonical = Self::canonical(path)?;
        if !self.backend.exists(&canonical)? {
            return Err(Error::not_found(canonical.to_string()));
        }
        let attributes = self.backend.fetch_attributes_internal(&canonical, view)?;
        fs.add_to_attribute_cache(&canonical, attributes.clone())?;
        Ok(attributes)
    }

    /// Delete through the backend, then evict this path's cache entry.
    ///
    /// The entry is evicted even when the backend fails; entries below the
    /// path are left alone.
    pub fn delete(&self, path: &UnixPath) -> Result<()> {
        let fs = self.check_path(path)?;
        Self::check_writable(&fs, path)?;
        let canonical = Self::canonical(path)?;
        let deleted = self.backend.delete_internal(&canonical);
        fs.remove_from_attribute_cache(&canonical)?;
        deleted
    }

    pub fn delete_if_exists(&self, path: &UnixPath) -> Result<bool> {
        match self.delete(path) {
            Ok(()) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Lazy attribute view for basic, POSIX and owner views; `None` otherwise.
    pub fn get_file_attribute_view(
        &self,
        path: &UnixPath,
        view: AttributeView,
    ) -> Result<Option<FileAttributeView>> {
        _ = self.check_path(path)?;
        if !view.has_view() {
            return Ok(None);
        }
        let provider = self.this.upgrade().ok_or(Error::ClosedFileSystem)?;
        Ok(Some(FileAttributeView {
            provider,
            path: path.clone(),
            view,
        }))
    }

    pub fn create_directory(&self, dir: &UnixPath) -> Result<()> {
        let fs = self.check_path(dir)?;
        Self::check_writable(&fs, dir)?;
        let canonical = Self::canonical(dir)?;
        if self.backend.exists(&canonical)? {
            return Err(Error::file_already_exists(canonical.to_string()));
        }
        self.backend.create_directory_internal(&canonical)?;
        fs.remove_from_attribute_cache(&canonical)
    }

    /// Resolve both ends of a copy or move; `None` when they are the same file.
    fn transfer_paths(
        &self,
        source: &UnixPath,
        target: &UnixPath,
        options: &[CopyOption],
    ) -> Result<Option<(Arc<FileSystem>, UnixPath, UnixPath)>> {
        let fs = self.check_path(source)?;
        let target_fs = self.check_path(target)?;
        Self::check_writable(&target_fs, target)?;
        if fs.id() != target_fs.id() {
            return Err(Error::invalid_argument(format!(
                "Cannot transfer '{source}' to '{target}' across file systems"
            )));
        }
        let source = Self::canonical(source)?;
        let target = Self::canonical(target)?;
        if !self.backend.exists(&source)? {
            return Err(Error::not_found(source.to_string()));
        }
        if source == target {
            return Ok(None);
        }
        if !options.contains(&CopyOption::ReplaceExisting) && self.backend.exists(&target)? {
            return Err(Error::file_already_exists(target.to_string()));
        }
        Ok(Some((fs, source, target)))
    }

    pub fn copy(&self, source: &UnixPath, target: &UnixPath, options: &[CopyOption]) -> Result<()> {
        let Some((fs, source, target)) = self.transfer_paths(source, target, options)? else {
            return Ok(());
        };
        let copied = self.backend.copy_internal(&source, &target);
        fs.remove_from_attribute_cache(&target)?;
        copied
    }

    pub fn move_path(
        &self,
        source: &UnixPath,
        target: &UnixPath,
        options: &[CopyOption],
    ) -> Result<()> {
        let fs = self.check_path(source)?;
        Self::check_writable(&fs, source)?;
        let Some((fs, source, target)) = self.transfer_paths(source, target, options)? else {
            return Ok(());
        };
        let moved = self.backend.move_internal(&source, &target);
        fs.remove_from_attribute_cache_deep(&source)?;
        fs.remove_from_attribute_cache(&target)?;
        moved
    }

    /// Fails with not-found if `path` is missing and with read-only if
    /// write access is requested on a read-only filesystem.
    pub fn check_access(&self, path: &UnixPath, modes: &[AccessMode]) -> Result<()> {
        let fs = self.check_path(path)?;
        if !self.exists(path)? {
            return Err(Error::not_found(Self::canonical(path)?.to_string()));
        }
        if modes.contains(&AccessMode::Write) {
            Self::check_writable(&fs, path)?;
        }
        Ok(())
    }

    /// Dot-files are hidden.
    pub fn is_hidden(&self, path: &UnixPath) -> Result<bool> {
        _ = self.check_path(path)?;
        Ok(path.file_name().is_some_and(|name| {
            let name = name.to_string();
            let name = name.trim_end_matches(path.fs_ref().separator());
            name.starts_with('.') && name != "." && name != ".."
        }))
    }

    pub fn is_same_file(&self, a: &UnixPath, b: &UnixPath) -> Result<bool> {
        let fs = self.check_path(a)?;
        if a == b {
            return Ok(true);
        }
        match b.file_system() {
            Ok(other) if other.id() == fs.id() => {}
            _ => return Ok(false),
        }
        Ok(Self::canonical(a)? == Self::canonical(b)?)
    }

    pub fn get_file_store(&self, path: &UnixPath) -> Result<FileStore> {
        let fs = self.check_path(path)?;
        fs.file_stores()
            .first()
            .cloned()
            .ok_or_else(|| Error::unsupported("file system without file store"))
    }
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("id", &self.id)
            .field("scheme", &self.scheme())
            .field("file_systems", &self.file_system_count())
            .finish()
    }
}

/// Attribute view whose reads go back through [`Provider::read_attributes`]
#[derive(Debug, Clone)]
pub struct FileAttributeView {
    provider: Arc<Provider>,
    path: UnixPath,
    view: AttributeView,
}

impl FileAttributeView {
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.view.as_str()
    }

    /// Owner views read through the POSIX attributes.
    pub fn read_attributes(&self) -> Result<FileAttributes> {
        let view = match self.view {
            AttributeView::Owner => AttributeView::Posix,
            other => other,
        };
        self.provider.read_attributes(&self.path, view)
    }
}
