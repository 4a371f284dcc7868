// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Lazy iteration over listings a backend returns in pages
//!
//! A [`PagedIterator`] keeps one filtered entry of lookahead. Each refill
//! drains the current page through the filter and, when the page runs dry,
//! pulls further pages from its [`PageSource`] until an entry is accepted or
//! the source reports no more pages.

use crate::error::{Error, Result};
use diagnostics::*;

/// One page of raw entries
pub type Page<T> = Box<dyn Iterator<Item = T> + Send>;

/// Filter applied to every raw entry; errors abort iteration
pub type EntryFilter<T> = Box<dyn FnMut(&T) -> Result<bool> + Send>;

/// Backend side of a paged listing
pub trait PageSource<T> {
    fn has_next_page(&self) -> bool;

    fn load_next_page(&mut self) -> Result<Page<T>>;
}

/// Filtered iterator with one entry of lookahead over a [`PageSource`]
pub struct PagedIterator<T, S: PageSource<T>> {
    source: S,
    filter: EntryFilter<T>,
    page: Option<Page<T>>,
    next: Option<T>,
    pages_loaded: usize,
}

impl<T, S: PageSource<T>> PagedIterator<T, S> {
    /// Iterator over `source` without a first page; call
    /// [`PagedIterator::set_first_page`] to prime it.
    pub fn new(source: S, filter: EntryFilter<T>) -> Self {
        Self {
            source,
            filter,
            page: None,
            next: None,
            pages_loaded: 0,
        }
    }

    /// Iterator that accepts every entry, primed with the source's first page.
    pub fn unfiltered(mut source: S) -> Result<Self> {
        let first = source.load_next_page()?;
        let mut iter = Self::new(source, Box::new(|_| Ok(true)));
        iter.set_first_page(first)?;
        Ok(iter)
    }

    /// Prime the lookahead from `page` and whatever pages follow it.
    pub fn set_first_page(&mut self, page: Page<T>) -> Result<()> {
        self.page = Some(page);
        self.pages_loaded += 1;
        self.next = self.advance()?;
        Ok(())
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    #[must_use]
    pub fn pages_loaded(&self) -> usize {
        self.pages_loaded
    }

    /// Return the buffered entry and refill the lookahead.
    pub fn next_entry(&mut self) -> Result<T> {
        let current = self.next.take().ok_or(Error::NoSuchElement)?;
        match self.advance() {
            Ok(next) => {
                self.next = next;
                Ok(current)
            }
            Err(err) => {
                debug!("paged listing failed after {pages} pages: {err}",
                    pages: self.pages_loaded, err: err.to_string().as_str());
                Err(Error::directory_iteration(err))
            }
        }
    }

    fn advance(&mut self) -> Result<Option<T>> {
        loop {
            if let Some(page) = self.page.as_mut() {
                for entry in page.by_ref() {
                    if (self.filter)(&entry)? {
                        return Ok(Some(entry));
                    }
                }
            }
            if !self.source.has_next_page() {
                self.page = None;
                return Ok(None);
            }
            self.page = Some(self.source.load_next_page()?);
            self.pages_loaded += 1;
        }
    }
}

impl<T, S: PageSource<T>> Iterator for PagedIterator<T, S> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.has_next() {
            Some(self.next_entry())
        } else {
            None
        }
    }
}
