//! Path-keyed texture cache. Each distinct file is loaded at most once per
//! session; nothing is evicted.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use corelib::CoreResult;

/// Decodes and uploads one texture file, producing a backend handle.
pub trait TextureLoader {
    type Handle: Clone;

    fn load(&mut self, path: &Path) -> CoreResult<Self::Handle>;
}

#[derive(Debug)]
pub struct TextureCache<H> {
    entries: HashMap<PathBuf, H>,
}

impl<H> Default for TextureCache<H> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<H: Clone> TextureCache<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached handle for `path`, loading it on first use.
    /// A failed load is not remembered, so a later call tries again.
    pub fn resolve<L>(&mut self, path: &Path, loader: &mut L) -> CoreResult<H>
    where
        L: TextureLoader<Handle = H> + ?Sized,
    {
        let key = normalize_path(path);
        if let Some(handle) = self.entries.get(&key) {
            log::trace!("Texture cache hit: {}", key.display());
            return Ok(handle.clone());
        }
        let handle = loader.load(&key)?;
        log::debug!("Texture cached: {}", key.display());
        self.entries.insert(key, handle.clone());
        Ok(handle)
    }

    pub fn get(&self, path: &Path) -> Option<&H> {
        self.entries.get(&normalize_path(path))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Lexical normalization: drops `.`, folds `name/..`, rebuilds separators.
/// Does not touch the filesystem or resolve symlinks.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    if out.is_empty() {
        return PathBuf::from(".");
    }
    out.iter().collect()
}
