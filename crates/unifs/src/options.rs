// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Open, copy and access options accepted by the provider operations

use std::collections::BTreeSet;

/// How a file is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OpenOption {
    Read,
    Write,
    Append,
    TruncateExisting,
    Create,
    CreateNew,
    DeleteOnClose,
    Sparse,
    Sync,
    Dsync,
}

/// Normalized set of open options handed to backends
pub type OpenOptionSet = BTreeSet<OpenOption>;

/// Collect a slice of options into a set.
#[must_use]
pub fn option_set(options: &[OpenOption]) -> OpenOptionSet {
    options.iter().copied().collect()
}

/// True when `options` allow modifying the file.
#[must_use]
pub fn is_writable(options: &OpenOptionSet) -> bool {
    options.contains(&OpenOption::Write) || options.contains(&OpenOption::Append)
}

/// Options for copy and move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CopyOption {
    ReplaceExisting,
    CopyAttributes,
    AtomicMove,
}

/// Access checked by `check_access`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessMode {
    Read,
    Write,
    Execute,
}
