// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

mod matcher;
mod provider;

use crate::*;
use std::sync::Arc;
use url::Url;

pub(crate) struct Mounted {
    pub backend: Arc<MemoryBackend>,
    pub provider: Arc<Provider>,
    pub fs: Arc<FileSystem>,
}

/// Memory-backed filesystem at `mem://bucket` with a two-entry page size.
pub(crate) fn mount(style: PathStyle, config: FsConfig) -> Result<Mounted> {
    let backend = Arc::new(MemoryBackend::new("mem", style).with_page_size(2));
    let provider = Provider::new(backend.clone());
    let fs = provider.new_file_system(&uri("mem://bucket"), &config)?;
    Ok(Mounted {
        backend,
        provider,
        fs,
    })
}

pub(crate) fn uri(text: &str) -> Url {
    Url::parse(text).unwrap()
}
