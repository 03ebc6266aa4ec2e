// Copyright 2026 the Penumbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory reference-counted texture pool.

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};

use penumbra_core::backend::{ResourceManager, TextureHandle};
use penumbra_core::scene::TextureId;

/// Failure to hand out a texture.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    /// No texture with this name was registered.
    #[error("texture {name:?} is not registered")]
    NotFound {
        /// Requested name.
        name: String,
    },
    /// A blank texture was requested with a zero dimension.
    #[error("texture {name:?} has zero size ({width}x{height})")]
    EmptyTexture {
        /// Requested name.
        name: String,
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },
    /// A blank texture was requested under a loaded name with another size.
    #[error("texture {name:?} is loaded at {loaded:?}, requested {requested:?}")]
    SizeMismatch {
        /// Requested name.
        name: String,
        /// Width and height of the loaded texture.
        loaded: (u32, u32),
        /// Width and height that were requested.
        requested: (u32, u32),
    },
}

#[derive(Clone, Copy, Debug)]
struct Entry {
    handle: TextureHandle,
    refs: u32,
}

/// Named textures with reference counts.
///
/// Image textures must be [`register`](Self::register)ed up front; blank
/// render targets are created on demand and shared by name, so asking for a
/// loaded name with a different size is an error. A texture whose count drops to zero
/// is unloaded and must be registered again before the next lookup.
#[derive(Clone, Debug, Default)]
pub struct TexturePool {
    by_name: BTreeMap<String, Entry>,
    names: BTreeMap<TextureId, String>,
    next_id: u32,
}

impl TexturePool {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes an image of the given size available under `name` without
    /// taking a reference. Re-registering a loaded name keeps its handle.
    pub fn register(&mut self, name: &str, width: u32, height: u32) -> TextureHandle {
        if let Some(entry) = self.by_name.get(name) {
            return entry.handle;
        }
        self.next_id += 1;
        let handle = TextureHandle {
            id: TextureId(self.next_id),
            width,
            height,
        };
        self.by_name
            .insert(name.to_string(), Entry { handle, refs: 0 });
        self.names.insert(handle.id, name.to_string());
        handle
    }

    /// Current reference count of `name`, or `None` if it is not loaded.
    #[must_use]
    pub fn refs(&self, name: &str) -> Option<u32> {
        self.by_name.get(name).map(|e| e.refs)
    }

    /// Name under which `texture` is loaded.
    #[must_use]
    pub fn name_of(&self, texture: TextureId) -> Option<&str> {
        self.names.get(&texture).map(String::as_str)
    }

    /// Number of loaded textures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Whether no textures are loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    fn acquire(&mut self, name: &str) -> Option<TextureHandle> {
        let entry = self.by_name.get_mut(name)?;
        entry.refs += 1;
        Some(entry.handle)
    }
}

impl ResourceManager for TexturePool {
    type Error = PoolError;

    fn get_texture(&mut self, name: &str) -> Result<TextureHandle, PoolError> {
        self.acquire(name).ok_or_else(|| PoolError::NotFound {
            name: name.to_string(),
        })
    }

    fn create_blank_texture(
        &mut self,
        name: &str,
        width: u32,
        height: u32,
    ) -> Result<TextureHandle, PoolError> {
        if width == 0 || height == 0 {
            return Err(PoolError::EmptyTexture {
                name: name.to_string(),
                width,
                height,
            });
        }
        let loaded = self.register(name, width, height);
        if (loaded.width, loaded.height) != (width, height) {
            return Err(PoolError::SizeMismatch {
                name: name.to_string(),
                loaded: (loaded.width, loaded.height),
                requested: (width, height),
            });
        }
        self.get_texture(name)
    }

    fn release(&mut self, texture: TextureHandle) {
        let Some(name) = self.names.get(&texture.id) else {
            return;
        };
        let Some(entry) = self.by_name.get_mut(name) else {
            return;
        };
        entry.refs = entry.refs.saturating_sub(1);
        if entry.refs == 0 {
            self.by_name.remove(name.as_str());
            self.names.remove(&texture.id);
        }
    }
}
