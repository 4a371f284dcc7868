// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! In-memory backend
//!
//! Objects live in a `BTreeMap` keyed by absolute path. Directories are
//! explicit markers plus every prefix of a stored object, which is how
//! flat object stores present them. Listings are served in fixed-size pages
//! through [`PagedIterator`] so paging can be exercised without a network.
//!
//! The backend counts uploads, downloads and attribute fetches so callers
//! can check how often the generic layer reached the backend.

use crate::attributes::{AttributeView, FileAttributes};
use crate::backend::{Backend, MountDescriptor, PathFilter, PathIter, RawInput, RawOutput};
use crate::config::{FsConfig, mount_key};
use crate::error::{Error, Result};
use crate::options::{OpenOption, OpenOptionSet};
use crate::paged::{Page, PageSource, PagedIterator};
use crate::path::{FsRef, PathStyle, UnixPath};
use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Cursor, Write};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;
use url::Url;

pub const DEFAULT_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone)]
struct MemoryObject {
    data: Vec<u8>,
    modified: SystemTime,
}

#[derive(Debug, Default)]
struct MemoryState {
    objects: BTreeMap<String, MemoryObject>,
    directories: BTreeSet<String>,
}

impl MemoryState {
    fn is_directory(&self, key: &str, sep: char) -> bool {
        if key == sep.to_string() || self.directories.contains(key) {
            return true;
        }
        let prefix = format!("{key}{sep}");
        self.objects
            .range(prefix.clone()..)
            .next()
            .is_some_and(|(k, _)| k.starts_with(&prefix))
            || self
                .directories
                .range(prefix.clone()..)
                .next()
                .is_some_and(|k| k.starts_with(&prefix))
    }

    /// Direct children of `key`, with a flag telling whether each is a directory.
    fn children(&self, key: &str, sep: char) -> BTreeMap<String, bool> {
        let prefix = if key == sep.to_string() {
            key.to_string()
        } else {
            format!("{key}{sep}")
        };
        let mut children = BTreeMap::new();
        let names = self
            .objects
            .keys()
            .chain(self.directories.iter())
            .filter_map(|k| k.strip_prefix(&prefix));
        for rest in names {
            match rest.split_once(sep) {
                Some((name, _)) => {
                    _ = children.insert(name.to_string(), true);
                }
                None if !rest.is_empty() => {
                    let is_dir = self.directories.contains(&format!("{prefix}{rest}"));
                    let entry = children.entry(rest.to_string()).or_insert(false);
                    *entry |= is_dir;
                }
                None => {}
            }
        }
        children
    }
}

/// Number of times the generic layer reached into the backend
#[derive(Debug, Default)]
pub struct Counters {
    uploads: AtomicUsize,
    downloads: AtomicUsize,
    fetches: AtomicUsize,
    pages: AtomicUsize,
    prepare_closes: AtomicUsize,
}

impl Counters {
    #[must_use]
    pub fn uploads(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn downloads(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }

    /// Attribute fetches
    #[must_use]
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Listing pages served
    #[must_use]
    pub fn pages(&self) -> usize {
        self.pages.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn prepare_closes(&self) -> usize {
        self.prepare_closes.load(Ordering::SeqCst)
    }
}

pub struct MemoryBackend {
    scheme: String,
    style: PathStyle,
    page_size: usize,
    state: Arc<Mutex<MemoryState>>,
    counters: Arc<Counters>,
    last_output_options: Mutex<Option<OpenOptionSet>>,
    fail_prepare_close: AtomicBool,
}

impl MemoryBackend {
    #[must_use]
    pub fn new(scheme: &str, style: PathStyle) -> Self {
        Self {
            scheme: scheme.to_string(),
            style,
            page_size: DEFAULT_PAGE_SIZE,
            state: Arc::new(Mutex::new(MemoryState::default())),
            counters: Arc::new(Counters::default()),
            last_output_options: Mutex::new(None),
            fail_prepare_close: AtomicBool::new(false),
        }
    }

    /// Serve listings `page_size` entries at a time.
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn key(path: &UnixPath) -> String {
        let sep = path.fs_ref().separator();
        let mut key = String::from(sep);
        key.push_str(&path.components().join(&sep.to_string()));
        key
    }

    #[must_use]
    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    /// Options passed to the most recent output stream request
    #[must_use]
    pub fn last_output_options(&self) -> Option<OpenOptionSet> {
        self.last_output_options
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Make the next `prepare_close` calls fail.
    pub fn set_fail_prepare_close(&self, fail: bool) {
        self.fail_prepare_close.store(fail, Ordering::SeqCst);
    }

    /// Store `data` under the absolute key `key`, bypassing every counter.
    pub fn put_object(&self, key: &str, data: &[u8]) {
        _ = self.state().objects.insert(
            key.to_string(),
            MemoryObject {
                data: data.to_vec(),
                modified: SystemTime::now(),
            },
        );
    }

    #[must_use]
    pub fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.state().objects.get(key).map(|o| o.data.clone())
    }

    #[must_use]
    pub fn object_count(&self) -> usize {
        self.state().objects.len()
    }
}

/// Writer that commits its buffer to the store on flush and on drop
struct MemoryWriter {
    state: Arc<Mutex<MemoryState>>,
    counters: Arc<Counters>,
    key: String,
    buffer: Vec<u8>,
    dirty: bool,
}

impl MemoryWriter {
    fn commit(&mut self) {
        _ = self
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .objects
            .insert(
                self.key.clone(),
                MemoryObject {
                    data: self.buffer.clone(),
                    modified: SystemTime::now(),
                },
            );
        _ = self.counters.uploads.fetch_add(1, Ordering::SeqCst);
        self.dirty = false;
    }
}

impl Write for MemoryWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        self.dirty = true;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.dirty {
            self.commit();
        }
        Ok(())
    }
}

impl Drop for MemoryWriter {
    fn drop(&mut self) {
        if self.dirty {
            self.commit();
        }
    }
}

/// Listing of one directory split into pages
struct MemoryPages {
    entries: std::vec::IntoIter<UnixPath>,
    page_size: usize,
    counters: Arc<Counters>,
}

impl PageSource<UnixPath> for MemoryPages {
    fn has_next_page(&self) -> bool {
        !self.entries.as_slice().is_empty()
    }

    fn load_next_page(&mut self) -> Result<Page<UnixPath>> {
        _ = self.counters.pages.fetch_add(1, Ordering::SeqCst);
        let page: Vec<UnixPath> = self.entries.by_ref().take(self.page_size).collect();
        Ok(Box::new(page.into_iter()))
    }
}

impl Backend for MemoryBackend {
    fn scheme(&self) -> &str {
        &self.scheme
    }

    fn create_file_system(&self, uri: &Url, config: &FsConfig) -> Result<MountDescriptor> {
        let mut descriptor = MountDescriptor::new(self.style, mount_key(uri), "memory");
        if let Some(host) = uri.host_str() {
            descriptor.store_name = host.to_string();
        }
        if let Some(working_directory) = &config.working_directory {
            descriptor.working_directory = working_directory.clone();
        }
        Ok(descriptor)
    }

    fn new_input_stream_internal(
        &self,
        path: &UnixPath,
        _options: &OpenOptionSet,
    ) -> Result<RawInput> {
        let key = Self::key(path);
        let data = self
            .state()
            .objects
            .get(&key)
            .map(|o| o.data.clone())
            .ok_or_else(|| Error::not_found(&key))?;
        _ = self.counters.downloads.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(Cursor::new(data)))
    }

    fn new_output_stream_internal(
        &self,
        path: &UnixPath,
        options: &OpenOptionSet,
    ) -> Result<RawOutput> {
        *self
            .last_output_options
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(options.clone());

        let sep = path.fs_ref().separator();
        let key = Self::key(path);
        let state = self.state();
        if state.is_directory(&key, sep) {
            return Err(Error::invalid_argument(format!("'{key}' is a directory")));
        }
        let existing = state.objects.get(&key);
        if options.contains(&OpenOption::CreateNew) && existing.is_some() {
            return Err(Error::file_already_exists(&key));
        }
        let may_create =
            options.contains(&OpenOption::Create) || options.contains(&OpenOption::CreateNew);
        if existing.is_none() && !may_create {
            return Err(Error::not_found(&key));
        }
        let buffer = match existing {
            Some(o) if options.contains(&OpenOption::Append) => o.data.clone(),
            _ => Vec::new(),
        };
        let dirty = existing.is_none()
            || (!options.contains(&OpenOption::Append)
                && options.contains(&OpenOption::TruncateExisting));
        drop(state);

        Ok(Box::new(MemoryWriter {
            state: self.state.clone(),
            counters: self.counters.clone(),
            key,
            buffer,
            dirty,
        }))
    }

    fn create_path_iterator(&self, dir: &UnixPath, filter: PathFilter) -> Result<PathIter> {
        let sep = dir.fs_ref().separator();
        let key = Self::key(dir);
        let children = {
            let state = self.state();
            if state.objects.contains_key(&key) {
                return Err(Error::invalid_argument(format!("'{key}' is not a directory")));
            }
            if !state.is_directory(&key, sep) {
                return Err(Error::not_found(&key));
            }
            state.children(&key, sep)
        };
        let entries: Vec<UnixPath> = children
            .into_iter()
            .map(|(name, is_dir)| child_path(dir.fs_ref(), &key, &name, is_dir))
            .collect();

        let mut source = MemoryPages {
            entries: entries.into_iter(),
            page_size: self.page_size,
            counters: self.counters.clone(),
        };
        let first = source.load_next_page()?;
        let mut iter = PagedIterator::new(source, filter);
        iter.set_first_page(first)?;
        Ok(Box::new(iter))
    }

    fn exists(&self, path: &UnixPath) -> Result<bool> {
        let key = Self::key(path);
        let state = self.state();
        Ok(state.objects.contains_key(&key) || state.is_directory(&key, path.fs_ref().separator()))
    }

    fn fetch_attributes_internal(
        &self,
        path: &UnixPath,
        _view: AttributeView,
    ) -> Result<FileAttributes> {
        _ = self.counters.fetches.fetch_add(1, Ordering::SeqCst);
        let key = Self::key(path);
        let state = self.state();
        if let Some(object) = state.objects.get(&key) {
            let mut attributes = FileAttributes::file(object.data.len() as u64, object.modified);
            attributes.file_key = Some(key);
            attributes.permissions = Some(0o644);
            return Ok(attributes);
        }
        if state.is_directory(&key, path.fs_ref().separator()) {
            let mut attributes = FileAttributes::directory(SystemTime::UNIX_EPOCH);
            attributes.file_key = Some(key);
            attributes.permissions = Some(0o755);
            return Ok(attributes);
        }
        Err(Error::not_found(key))
    }

    fn delete_internal(&self, path: &UnixPath) -> Result<()> {
        let sep = path.fs_ref().separator();
        let key = Self::key(path);
        let mut state = self.state();
        if state.objects.remove(&key).is_some() {
            return Ok(());
        }
        if !state.is_directory(&key, sep) {
            return Err(Error::not_found(key));
        }
        if !state.children(&key, sep).is_empty() {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::DirectoryNotEmpty,
                key,
            )));
        }
        _ = state.directories.remove(&key);
        Ok(())
    }

    fn prepare_close(&self) -> Result<()> {
        _ = self.counters.prepare_closes.fetch_add(1, Ordering::SeqCst);
        if self.fail_prepare_close.load(Ordering::SeqCst) {
            return Err(Error::Io(io::Error::other("prepare_close failed")));
        }
        Ok(())
    }

    fn create_directory_internal(&self, dir: &UnixPath) -> Result<()> {
        let sep = dir.fs_ref().separator();
        let key = Self::key(dir);
        let mut state = self.state();
        if self.style == PathStyle::Unix {
            if let Some(parent) = dir.parent() {
                let parent_key = Self::key(&parent);
                if !state.is_directory(&parent_key, sep) {
                    return Err(Error::not_found(parent_key));
                }
            }
        }
        _ = state.directories.insert(key);
        Ok(())
    }

    /// Objects are renamed in place; directories cannot be moved.
    fn move_internal(&self, source: &UnixPath, target: &UnixPath) -> Result<()> {
        let source_key = Self::key(source);
        let mut state = self.state();
        let object = state
            .objects
            .remove(&source_key)
            .ok_or_else(|| Error::not_found(&source_key))?;
        _ = state.objects.insert(Self::key(target), object);
        Ok(())
    }
}

fn child_path(fs: &FsRef, parent_key: &str, name: &str, is_dir: bool) -> UnixPath {
    let sep = fs.separator();
    let mut text = parent_key.trim_end_matches(sep).to_string();
    text.push(sep);
    text.push_str(name);
    if is_dir && fs.style() == PathStyle::BlobStore {
        text.push(sep);
    }
    fs.parse(&text)
}
