// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Hooks a storage connector implements to plug into a [`crate::Provider`]
//!
//! Every path handed to a hook is absolute and normalized. Hooks never see
//! the attribute cache or the closeable registry; the provider wraps their
//! raw streams and listings before callers get them.

use crate::attributes::{AttributeView, FileAttributes};
use crate::config::FsConfig;
use crate::error::Result;
use crate::options::{OpenOption, OpenOptionSet, option_set};
use crate::paged::EntryFilter;
use crate::path::{PathStyle, UnixPath};
use std::io::{self, Read, Write};
use url::Url;

/// Raw byte source returned by a backend
pub type RawInput = Box<dyn Read + Send>;

/// Raw byte sink returned by a backend; content is committed on flush or drop
pub type RawOutput = Box<dyn Write + Send>;

/// Filter over directory entries
pub type PathFilter = EntryFilter<UnixPath>;

/// Directory listing returned by a backend
pub type PathIter = Box<dyn Iterator<Item = Result<UnixPath>> + Send>;

/// What a backend reports when a filesystem is mounted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountDescriptor {
    pub separator: char,
    pub style: PathStyle,
    /// Absolute working directory for relative paths
    pub working_directory: String,
    /// Human-readable location, e.g. an endpoint or a host directory
    pub location: String,
    pub store_name: String,
    pub store_type: String,
}

impl MountDescriptor {
    /// A `/`-separated mount rooted at `/`.
    #[must_use]
    pub fn new(style: PathStyle, location: impl Into<String>, store_type: impl Into<String>) -> Self {
        let location = location.into();
        Self {
            separator: '/',
            style,
            working_directory: "/".to_string(),
            store_name: location.clone(),
            location,
            store_type: store_type.into(),
        }
    }
}

pub trait Backend: Send + Sync {
    /// URI scheme served by this backend
    fn scheme(&self) -> &str;

    fn create_file_system(&self, uri: &Url, config: &FsConfig) -> Result<MountDescriptor>;

    fn new_input_stream_internal(&self, path: &UnixPath, options: &OpenOptionSet)
    -> Result<RawInput>;

    fn new_output_stream_internal(
        &self,
        path: &UnixPath,
        options: &OpenOptionSet,
    ) -> Result<RawOutput>;

    /// Entries of `dir` accepted by `filter`, possibly fetched page by page
    fn create_path_iterator(&self, dir: &UnixPath, filter: PathFilter) -> Result<PathIter>;

    fn exists(&self, path: &UnixPath) -> Result<bool>;

    fn fetch_attributes_internal(
        &self,
        path: &UnixPath,
        view: AttributeView,
    ) -> Result<FileAttributes>;

    fn delete_internal(&self, path: &UnixPath) -> Result<()>;

    /// Release backend-held resources before the filesystem goes away
    fn prepare_close(&self) -> Result<()>;

    fn create_directory_internal(&self, dir: &UnixPath) -> Result<()> {
        Err(crate::Error::unsupported(format!(
            "create directory '{dir}' on {}",
            self.scheme()
        )))
    }

    /// Copy file content by streaming it through the raw hooks.
    fn copy_internal(&self, source: &UnixPath, target: &UnixPath) -> Result<()> {
        let mut input = self.new_input_stream_internal(source, &option_set(&[OpenOption::Read]))?;
        let mut output = self.new_output_stream_internal(
            target,
            &option_set(&[
                OpenOption::Write,
                OpenOption::Create,
                OpenOption::TruncateExisting,
            ]),
        )?;
        _ = io::copy(&mut input, &mut output)?;
        output.flush()?;
        Ok(())
    }

    /// Copy then delete the source.
    fn move_internal(&self, source: &UnixPath, target: &UnixPath) -> Result<()> {
        self.copy_internal(source, target)?;
        self.delete_internal(source)
    }
}
