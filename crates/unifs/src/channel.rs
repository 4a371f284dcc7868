// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Seekable channel over sequential backend streams
//!
//! The remote object is downloaded into a local temporary file when the
//! channel opens for reading or appending. Reads, writes and seeks go to
//! that file. Closing uploads the file back through the backend's output
//! hook if the channel was opened writable, then deletes it.

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::fs::{Closeable, FileSystem, Registration};
use crate::options::{OpenOption, OpenOptionSet, is_writable, option_set};
use crate::path::UnixPath;
use diagnostics::*;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tempfile::NamedTempFile;

struct ChannelState {
    path: UnixPath,
    fs: Weak<FileSystem>,
    backend: Arc<dyn Backend>,
    options: OpenOptionSet,
    /// `None` once closed
    staged: Mutex<Option<NamedTempFile>>,
}

impl ChannelState {
    fn lock(&self) -> MutexGuard<'_, Option<NamedTempFile>> {
        self.staged.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with<T>(&self, f: impl FnOnce(&mut NamedTempFile) -> io::Result<T>) -> Result<T> {
        let mut staged = self.lock();
        let file = staged.as_mut().ok_or(Error::ChannelClosed)?;
        Ok(f(file)?)
    }

    /// Drop the cached attributes of the uploaded path.
    fn evict(&self) -> Result<()> {
        match self.fs.upgrade() {
            Some(fs) => fs.remove_from_attribute_cache(&self.path),
            None => Ok(()),
        }
    }

    fn upload(&self, file: &mut NamedTempFile) -> Result<u64> {
        let upload_options = option_set(&[
            OpenOption::Write,
            OpenOption::Create,
            OpenOption::TruncateExisting,
        ]);
        let mut output = self
            .backend
            .new_output_stream_internal(&self.path, &upload_options)?;
        _ = file.seek(SeekFrom::Start(0))?;
        let bytes = io::copy(file.as_file_mut(), &mut output)?;
        output.flush()?;
        Ok(bytes)
    }
}

impl Closeable for ChannelState {
    /// Upload if writable and delete the temporary file; later calls do nothing.
    fn close(&self) -> Result<()> {
        let Some(mut file) = self.lock().take() else {
            return Ok(());
        };
        // Channels opened only for reading never upload.
        let uploaded = if is_writable(&self.options) {
            let result = self.upload(&mut file).map(|bytes| {
                info!("uploaded {bytes} bytes to {path}", bytes: bytes, path: self.path.to_string());
            });
            let evicted = self.evict();
            result.and(evicted)
        } else {
            Ok(())
        };
        let removed = file.close();
        uploaded?;
        Ok(removed?)
    }
}

/// Random-access channel staged through a local temporary file
pub struct SeekableChannel {
    state: Arc<ChannelState>,
    registration: Registration,
    temp_path: PathBuf,
}

impl SeekableChannel {
    pub(crate) fn open(fs: &Arc<FileSystem>, path: UnixPath, options: OpenOptionSet) -> Result<Self> {
        let backend = fs.backend().clone();
        let name = path
            .file_name()
            .map(|n| {
                n.to_string()
                    .trim_end_matches(path.fs_ref().separator())
                    .replace(['/', '\\'], "_")
            })
            .unwrap_or_default();
        let mut file = tempfile::Builder::new()
            .prefix(&format!("unifs-{name}-"))
            .tempfile()?;

        if options.contains(&OpenOption::Read) || options.contains(&OpenOption::Append) {
            match backend.new_input_stream_internal(&path, &option_set(&[OpenOption::Read])) {
                Ok(mut input) => {
                    let bytes = io::copy(&mut input, file.as_file_mut())?;
                    debug!("staged {bytes} bytes of {path}", bytes: bytes, path: path.to_string());
                }
                Err(err) if err.is_not_found() => {
                    debug!("nothing to stage for {path}", path: path.to_string());
                }
                Err(err) => return Err(err),
            }
        }
        if options.contains(&OpenOption::Write) && options.contains(&OpenOption::TruncateExisting) {
            file.as_file().set_len(0)?;
        }
        _ = file.seek(SeekFrom::Start(0))?;

        let temp_path = file.path().to_path_buf();
        let state = Arc::new(ChannelState {
            path,
            fs: Arc::downgrade(fs),
            backend,
            options,
            staged: Mutex::new(Some(file)),
        });
        let registration = Registration::register(fs, state.clone());
        Ok(Self {
            state,
            registration,
            temp_path,
        })
    }

    #[must_use]
    pub fn path(&self) -> &UnixPath {
        &self.state.path
    }

    /// Location of the local staging file
    #[must_use]
    pub fn temp_path(&self) -> &std::path::Path {
        &self.temp_path
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state.lock().is_some()
    }

    pub fn read(&self, buf: &mut [u8]) -> Result<usize> {
        self.state.with(|file| file.read(buf))
    }

    pub fn write(&self, buf: &[u8]) -> Result<usize> {
        if !is_writable(&self.state.options) {
            return Err(Error::unsupported(format!(
                "writing '{}' through a channel opened for reading",
                self.state.path
            )));
        }
        let append = self.state.options.contains(&OpenOption::Append);
        self.state.with(|file| {
            if append {
                _ = file.seek(SeekFrom::End(0))?;
            }
            file.write(buf)
        })
    }

    pub fn position(&self) -> Result<u64> {
        self.state.with(|file| file.stream_position())
    }

    pub fn set_position(&self, position: u64) -> Result<()> {
        self.state
            .with(|file| file.seek(SeekFrom::Start(position)).map(|_| ()))
    }

    pub fn size(&self) -> Result<u64> {
        self.state.with(|file| Ok(file.as_file().metadata()?.len()))
    }

    /// Shrink to `size`; the position moves back if it was past the end.
    pub fn truncate(&self, size: u64) -> Result<()> {
        self.state.with(|file| {
            if file.as_file().metadata()?.len() > size {
                file.as_file().set_len(size)?;
            }
            if file.stream_position()? > size {
                _ = file.seek(SeekFrom::Start(size))?;
            }
            Ok(())
        })
    }

    /// Upload, delete the staging file and leave the registry; idempotent.
    pub fn close(&self) -> Result<()> {
        let closed = self.state.close();
        self.registration.release();
        closed
    }
}

impl Read for SeekableChannel {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(SeekableChannel::read(self, buf)?)
    }
}

impl Write for SeekableChannel {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(SeekableChannel::write(self, buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(self.state.with(|file| file.flush())?)
    }
}

impl Seek for SeekableChannel {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        Ok(self.state.with(|file| file.seek(pos))?)
    }
}

impl Drop for SeekableChannel {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            warn!("channel failed to close: {err}", err: err.to_string().as_str());
        }
    }
}
