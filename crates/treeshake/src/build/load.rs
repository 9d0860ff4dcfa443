use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use thiserror::Error;
use tracing::debug;

use crate::ast::file::normalize;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("{path}: {message}")]
    Read { path: String, message: String },
    #[error("{path}: no such file")]
    Missing { path: String },
}

/// Supplies source text for a normalized path.
pub trait Loader: Send + Sync {
    fn load(&self, path: &Path) -> Result<String>;
}

#[derive(Debug, Default)]
pub struct FsLoader;

impl Loader for FsLoader {
    fn load(&self, path: &Path) -> Result<String> {
        debug!("load: {}", path.display());
        if !path.is_file() {
            return Err(anyhow!(LoadError::Missing {
                path: path.to_string_lossy().to_string(),
            }));
        }
        fs::read_to_string(path).map_err(|e| {
            anyhow!(LoadError::Read {
                path: path.to_string_lossy().to_string(),
                message: e.to_string(),
            })
        })
    }
}

/// Serves a fixed in-memory file map. Keys are normalized on insertion.
#[derive(Debug, Default)]
pub struct MemoryLoader {
    files: HashMap<PathBuf, String>,
}

impl MemoryLoader {
    pub fn new(files: HashMap<PathBuf, String>) -> Self {
        Self {
            files: files
                .into_iter()
                .map(|(path, content)| (normalize(&path), content))
                .collect(),
        }
    }

    pub fn insert(&mut self, path: impl AsRef<Path>, content: impl Into<String>) {
        self.files.insert(normalize(path.as_ref()), content.into());
    }
}

impl Loader for MemoryLoader {
    fn load(&self, path: &Path) -> Result<String> {
        debug!("load: {}", path.display());
        self.files.get(&normalize(path)).cloned().ok_or_else(|| {
            anyhow!(LoadError::Missing {
                path: path.to_string_lossy().to_string(),
            })
        })
    }
}
