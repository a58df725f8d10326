// JSON document I/O for stats files, load reports and round summaries.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// A source document that could not be used.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("{} not found", path.display())]
    Missing { path: PathBuf },
    #[error("reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parsing {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl DocumentError {
    pub fn path(&self) -> &Path {
        match self {
            DocumentError::Missing { path }
            | DocumentError::Io { path, .. }
            | DocumentError::Malformed { path, .. } => path,
        }
    }
}

pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, DocumentError> {
    let bytes = std::fs::read(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            DocumentError::Missing {
                path: path.to_path_buf(),
            }
        } else {
            DocumentError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    serde_json::from_slice(&bytes).map_err(|source| DocumentError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads an optional input, logging why it was unusable.
pub fn load_optional<T: DeserializeOwned>(path: &Path, server: &str) -> Option<T> {
    match load_json(path) {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!(server, path = %e.path().display(), error = %e, "could not load document");
            None
        }
    }
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
