// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! One mounted filesystem
//!
//! A [`FileSystem`] owns the attribute cache and the registry of open
//! streams and channels. Closing it force-closes whatever is still open,
//! runs the backend's `prepare_close` hook and clears the cache, in that
//! order, even when a step fails.

use crate::attributes::{AttributeView, FileAttributes};
use crate::backend::{Backend, MountDescriptor};
use crate::cache::{self, AttributesCache};
use crate::config::FsConfig;
use crate::error::{Error, Result};
use crate::path::{FsRef, PathStyle, UnixPath};
use crate::provider::Provider;
use diagnostics::*;
use regex::Regex;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use url::Url;

/// A resource that must be shut down together with its filesystem
pub trait Closeable: Send + Sync {
    fn close(&self) -> Result<()>;
}

/// Virtual store descriptor; every filesystem has exactly one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStore {
    name: String,
    store_type: String,
    read_only: bool,
}

impl FileStore {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn store_type(&self) -> &str {
        &self.store_type
    }

    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    #[must_use]
    pub fn supports_view(&self, view: AttributeView) -> bool {
        view.has_view()
    }
}

/// Compiled `glob:` or `regex:` pattern matched against rendered paths
#[derive(Debug, Clone)]
pub struct PathMatcher {
    regex: Regex,
}

impl PathMatcher {
    #[must_use]
    pub fn matches(&self, path: &UnixPath) -> bool {
        self.regex.is_match(&path.to_string())
    }

    #[must_use]
    pub fn matches_str(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    #[must_use]
    pub fn as_regex(&self) -> &Regex {
        &self.regex
    }
}

/// Clears the attribute cache however the enclosing scope exits.
struct CacheClearGuard<'a> {
    cache: &'a dyn AttributesCache,
}

impl Drop for CacheClearGuard<'_> {
    fn drop(&mut self) {
        self.cache.clear();
    }
}

/// Registry membership of an open stream or channel
pub(crate) struct Registration {
    fs: Weak<FileSystem>,
    token: u64,
}

impl Registration {
    pub(crate) fn register(fs: &Arc<FileSystem>, closeable: Arc<dyn Closeable>) -> Self {
        Self {
            fs: Arc::downgrade(fs),
            token: fs.register_closeable(closeable),
        }
    }

    /// Leave the registry; a no-op once the filesystem is gone.
    pub(crate) fn release(&self) {
        if let Some(fs) = self.fs.upgrade() {
            fs.deregister_closeable(self.token);
        }
    }
}

pub struct FileSystem {
    fs_ref: FsRef,
    key: String,
    uri: Url,
    location: String,
    backend: Arc<dyn Backend>,
    provider: Weak<Provider>,
    provider_id: u64,
    cache: Box<dyn AttributesCache>,
    closeables: Mutex<HashMap<u64, Arc<dyn Closeable>>>,
    next_token: AtomicU64,
    stores: Vec<FileStore>,
    working_directory: UnixPath,
    read_only: bool,
    closed: AtomicBool,
}

impl FileSystem {
    pub(crate) fn new(
        provider: &Arc<Provider>,
        key: String,
        uri: Url,
        descriptor: MountDescriptor,
        config: &FsConfig,
    ) -> Arc<Self> {
        let separator = descriptor.separator;
        let mut working_directory = config
            .working_directory
            .clone()
            .unwrap_or(descriptor.working_directory);
        if !working_directory.starts_with(separator) {
            working_directory.insert(0, separator);
        }
        if config.read_only {
            debug!("mounting {key} read-only", key: key.as_str());
        }

        Arc::new_cyclic(|weak| {
            let fs_ref = FsRef::new(
                crate::next_instance_id(),
                separator,
                descriptor.style,
                weak.clone(),
            );
            let working_directory = fs_ref.parse(&working_directory).normalize();
            Self {
                cache: cache::for_ttl(config.cache_ttl(), separator),
                stores: vec![FileStore {
                    name: descriptor.store_name,
                    store_type: descriptor.store_type,
                    read_only: config.read_only,
                }],
                fs_ref,
                key,
                uri,
                location: descriptor.location,
                backend: provider.backend().clone(),
                provider: Arc::downgrade(provider),
                provider_id: provider.id(),
                closeables: Mutex::new(HashMap::new()),
                next_token: AtomicU64::new(0),
                working_directory,
                read_only: config.read_only,
                closed: AtomicBool::new(false),
            }
        })
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.fs_ref.id()
    }

    /// Registry key: scheme plus authority of the mount URI
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn uri(&self) -> &Url {
        &self.uri
    }

    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    #[must_use]
    pub fn separator(&self) -> char {
        self.fs_ref.separator()
    }

    #[must_use]
    pub fn style(&self) -> PathStyle {
        self.fs_ref.style()
    }

    #[must_use]
    pub fn fs_ref(&self) -> &FsRef {
        &self.fs_ref
    }

    pub(crate) fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    pub(crate) fn provider_id(&self) -> u64 {
        self.provider_id
    }

    pub fn provider(&self) -> Result<Arc<Provider>> {
        self.provider.upgrade().ok_or(Error::ClosedFileSystem)
    }

    #[must_use]
    pub fn working_directory(&self) -> &UnixPath {
        &self.working_directory
    }

    /// Join `first` and `more` into a path of this filesystem.
    #[must_use]
    pub fn get_path(&self, first: &str, more: &[&str]) -> UnixPath {
        self.fs_ref.path(first, more)
    }

    #[must_use]
    pub fn root_directories(&self) -> Vec<UnixPath> {
        vec![self.fs_ref.root()]
    }

    #[must_use]
    pub fn file_stores(&self) -> &[FileStore] {
        &self.stores
    }

    #[must_use]
    pub fn supported_file_attribute_views(&self) -> Vec<AttributeView> {
        vec![
            AttributeView::Basic,
            AttributeView::Posix,
            AttributeView::Owner,
        ]
    }

    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        !self.closed.load(Ordering::Acquire)
    }

    pub(crate) fn check_open(&self) -> Result<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(Error::ClosedFileSystem)
        }
    }

    /// Compile `"glob:<pattern>"` or `"regex:<pattern>"`.
    pub fn get_path_matcher(&self, syntax_and_pattern: &str) -> Result<PathMatcher> {
        let (syntax, pattern) = syntax_and_pattern.split_once(':').ok_or_else(|| {
            Error::invalid_argument(format!(
                "Path matcher '{syntax_and_pattern}' must have the form syntax:pattern"
            ))
        })?;
        let regex = match syntax.to_ascii_lowercase().as_str() {
            "glob" => utilities::glob::compile(pattern, self.separator())?,
            "regex" => Regex::new(&format!("^(?:{pattern})$"))?,
            other => return Err(Error::unsupported(format!("path matcher syntax '{other}'"))),
        };
        Ok(PathMatcher { regex })
    }

    pub fn user_principal_lookup_service(&self) -> Result<Infallible> {
        Err(Error::unsupported("user principal lookup"))
    }

    pub fn new_watch_service(&self) -> Result<Infallible> {
        Err(Error::unsupported("watch service"))
    }

    fn check_path(&self, path: &UnixPath) -> Result<()> {
        if path.fs_ref().id() != self.id() {
            return Err(Error::invalid_argument(format!(
                "Path '{path}' belongs to a different file system"
            )));
        }
        Ok(())
    }

    /// Cache key of `path`: its absolute, normalized names.
    ///
    /// Blob-store directory paths share the key of their non-directory form.
    pub(crate) fn cache_key(&self, path: &UnixPath) -> Result<String> {
        self.check_path(path)?;
        let absolute = if path.is_absolute() {
            path.normalize()
        } else {
            self.working_directory.resolve(path)?.normalize()
        };
        let sep = self.separator();
        let mut key = String::from(sep);
        key.push_str(&absolute.components().join(&sep.to_string()));
        Ok(key)
    }

    pub fn add_to_attribute_cache(&self, path: &UnixPath, attributes: FileAttributes) -> Result<()> {
        let key = self.cache_key(path)?;
        self.cache.put(&key, attributes);
        Ok(())
    }

    pub fn remove_from_attribute_cache(&self, path: &UnixPath) -> Result<()> {
        let key = self.cache_key(path)?;
        debug!("evicting cached attributes of {key}", key: key.as_str());
        self.cache.invalidate(&key);
        Ok(())
    }

    /// Evict `path` and everything cached below it.
    pub fn remove_from_attribute_cache_deep(&self, path: &UnixPath) -> Result<()> {
        let key = self.cache_key(path)?;
        debug!("evicting cached attributes under {key}", key: key.as_str());
        self.cache.invalidate_subtree(&key);
        Ok(())
    }

    pub fn get_cached_attributes(&self, path: &UnixPath) -> Result<Option<FileAttributes>> {
        let key = self.cache_key(path)?;
        let cached = self.cache.get(&key);
        let hit = cached.is_some();
        debug!("attribute cache lookup {key} hit={hit}", key: key.as_str(), hit: hit);
        Ok(cached)
    }

    pub fn has_cached_attributes(&self, path: &UnixPath) -> Result<bool> {
        Ok(self.get_cached_attributes(path)?.is_some())
    }

    pub fn clear_attributes_cache(&self) {
        self.cache.clear();
    }

    fn register_closeable(&self, closeable: Arc<dyn Closeable>) -> u64 {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        _ = self
            .closeables
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(token, closeable);
        token
    }

    fn deregister_closeable(&self, token: u64) {
        _ = self
            .closeables
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&token);
    }

    /// Number of streams and channels currently registered
    #[must_use]
    pub fn open_closeables(&self) -> usize {
        self.closeables
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Run the backend's `prepare_close`; the attribute cache is cleared
    /// whether or not it succeeds.
    pub fn ensure_closed_internal(&self) -> Result<()> {
        let _clear = CacheClearGuard {
            cache: self.cache.as_ref(),
        };
        self.backend.prepare_close().inspect_err(|err| {
            error!("prepare_close failed for {key}: {err}", key: self.key.as_str(), err: err.to_string().as_str());
        })
    }

    /// Close every registered resource, returning how many were closed.
    ///
    /// Failures are logged and do not stop the remaining closes.
    pub fn close_all_closeables(&self) -> usize {
        let drained: Vec<Arc<dyn Closeable>> = {
            let mut registry = self
                .closeables
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            registry.drain().map(|(_, c)| c).collect()
        };
        let count = drained.len();
        if count > 0 {
            warn!("force-closing {count} open resources of {key}", count: count, key: self.key.as_str());
        }
        for closeable in drained {
            if let Err(err) = closeable.close() {
                warn!("closing resource failed: {err}", err: err.to_string().as_str());
            }
        }
        count
    }

    /// Close open resources, run `prepare_close` and leave the provider.
    ///
    /// Closing twice is a no-op.
    pub fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        info!("closing file system {key}", key: self.key.as_str());

        _ = self.close_all_closeables();
        let prepared = self.ensure_closed_internal();
        if let Some(provider) = self.provider.upgrade() {
            provider.forget_file_system(&self.key, self.id());
        }
        prepared
    }
}

impl std::fmt::Debug for FileSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSystem")
            .field("key", &self.key)
            .field("id", &self.id())
            .field("separator", &self.separator())
            .field("style", &self.style())
            .field("open", &self.is_open())
            .finish()
    }
}
