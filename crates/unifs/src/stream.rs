// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Registered wrappers around raw backend streams and listings
//!
//! Each wrapper joins its filesystem's closeable registry when created and
//! leaves it when closed or dropped. A filesystem that closes first shuts
//! the raw stream down; later reads and writes fail with `StreamClosed`.

use crate::backend::{PathIter, RawInput, RawOutput};
use crate::error::{Error, Result};
use crate::fs::{Closeable, FileSystem, Registration};
use crate::path::UnixPath;
use diagnostics::*;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Raw stream shared between its wrapper and the registry
struct StreamSlot<S> {
    inner: Mutex<Option<S>>,
}

impl<S> StreamSlot<S> {
    fn new(inner: S) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(Some(inner)),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Option<S>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn take(&self) -> Option<S> {
        self.lock().take()
    }

    fn with<T>(&self, f: impl FnOnce(&mut S) -> io::Result<T>) -> io::Result<T> {
        match self.lock().as_mut() {
            Some(stream) => f(stream),
            None => Err(Error::StreamClosed.into()),
        }
    }
}

impl Closeable for StreamSlot<RawInput> {
    fn close(&self) -> Result<()> {
        drop(self.take());
        Ok(())
    }
}

impl Closeable for StreamSlot<RawOutput> {
    fn close(&self) -> Result<()> {
        if let Some(mut output) = self.take() {
            output.flush()?;
        }
        Ok(())
    }
}

impl Closeable for StreamSlot<PathIter> {
    fn close(&self) -> Result<()> {
        drop(self.take());
        Ok(())
    }
}

/// Byte source registered with its filesystem
pub struct InputStream {
    slot: Arc<StreamSlot<RawInput>>,
    registration: Registration,
}

impl InputStream {
    pub(crate) fn new(fs: &Arc<FileSystem>, raw: RawInput) -> Self {
        let slot = StreamSlot::new(raw);
        let registration = Registration::register(fs, slot.clone());
        Self { slot, registration }
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.slot.lock().is_some()
    }

    pub fn close(&mut self) -> Result<()> {
        let closed = self.slot.close();
        self.registration.release();
        closed
    }
}

impl Read for InputStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.slot.with(|input| input.read(buf))
    }
}

impl Drop for InputStream {
    fn drop(&mut self) {
        _ = self.close();
    }
}

/// Byte sink registered with its filesystem; content is committed on close
pub struct OutputStream {
    slot: Arc<StreamSlot<RawOutput>>,
    registration: Registration,
}

impl OutputStream {
    pub(crate) fn new(fs: &Arc<FileSystem>, raw: RawOutput) -> Self {
        let slot = StreamSlot::new(raw);
        let registration = Registration::register(fs, slot.clone());
        Self { slot, registration }
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.slot.lock().is_some()
    }

    pub fn close(&mut self) -> Result<()> {
        let closed = self.slot.close();
        self.registration.release();
        closed
    }
}

impl Write for OutputStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.slot.with(|output| output.write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.slot.with(|output| output.flush())
    }
}

impl Drop for OutputStream {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            warn!("output stream failed to close: {err}", err: err.to_string().as_str());
        }
    }
}

/// Directory listing registered with its filesystem
///
/// Iteration ends early once the stream or its filesystem is closed.
pub struct DirectoryStream {
    slot: Arc<StreamSlot<PathIter>>,
    registration: Registration,
}

impl DirectoryStream {
    pub(crate) fn new(fs: &Arc<FileSystem>, entries: PathIter) -> Self {
        let slot = StreamSlot::new(entries);
        let registration = Registration::register(fs, slot.clone());
        Self { slot, registration }
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.slot.lock().is_some()
    }

    pub fn close(&mut self) -> Result<()> {
        let closed = self.slot.close();
        self.registration.release();
        closed
    }
}

impl Iterator for DirectoryStream {
    type Item = Result<UnixPath>;

    fn next(&mut self) -> Option<Self::Item> {
        self.slot.lock().as_mut()?.next()
    }
}

impl Drop for DirectoryStream {
    fn drop(&mut self) {
        _ = self.close();
    }
}
