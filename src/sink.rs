//! Artifact sinks
//!
//! A serialized score goes to a sink, which hands back a handle naming where
//! it went. `MemorySink` keeps artifacts in a map (handle = key);
//! `DirectorySink` writes files (handle = path).

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use log::info;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("invalid artifact name '{0}'")]
    InvalidName(String),
    #[error("cannot write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("artifact store lock poisoned")]
    Poisoned,
}

/// Where an artifact was stored
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ArtifactHandle {
    /// Key or file path
    pub location: String,
    pub media_type: String,
    pub size: usize,
}

/// Receives serialized artifacts
pub trait ArtifactSink: Send + Sync {
    fn store(&self, stem: &str, extension: &str, media_type: &str, bytes: &[u8]) -> Result<ArtifactHandle, SinkError>;
}

/// Stems become file names, so they stay a single plain path component
fn check_stem(stem: &str) -> Result<(), SinkError> {
    let bad = stem.is_empty()
        || stem == "."
        || stem == ".."
        || stem.chars().any(|c| matches!(c, '/' | '\\' | '\0'));
    if bad {
        return Err(SinkError::InvalidName(stem.to_string()));
    }
    Ok(())
}

fn file_name(stem: &str, extension: &str) -> String {
    if extension.is_empty() {
        stem.to_string()
    } else {
        format!("{}.{}", stem, extension)
    }
}

/// In-memory sink, mainly for the WASM surface and tests
#[derive(Debug, Default)]
pub struct MemorySink {
    artifacts: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes stored under a handle
    pub fn get(&self, handle: &ArtifactHandle) -> Option<Vec<u8>> {
        self.artifacts.lock().ok()?.get(&handle.location).cloned()
    }

    pub fn len(&self) -> usize {
        self.artifacts.lock().map(|a| a.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ArtifactSink for MemorySink {
    fn store(&self, stem: &str, extension: &str, media_type: &str, bytes: &[u8]) -> Result<ArtifactHandle, SinkError> {
        check_stem(stem)?;
        let key = file_name(stem, extension);
        let mut artifacts = self.artifacts.lock().map_err(|_| SinkError::Poisoned)?;
        artifacts.insert(key.clone(), bytes.to_vec());
        Ok(ArtifactHandle { location: key, media_type: media_type.to_string(), size: bytes.len() })
    }
}

/// Writes each artifact as `<root>/<stem>.<extension>`
#[derive(Debug, Clone)]
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }
}

impl ArtifactSink for DirectorySink {
    fn store(&self, stem: &str, extension: &str, media_type: &str, bytes: &[u8]) -> Result<ArtifactHandle, SinkError> {
        check_stem(stem)?;
        let path = self.root.join(file_name(stem, extension));
        let location = path.display().to_string();
        let io_error = |source| SinkError::Io { path: location.clone(), source };

        fs::create_dir_all(&self.root).map_err(io_error)?;
        fs::write(&path, bytes).map_err(io_error)?;

        info!("wrote {} bytes to {}", bytes.len(), location);
        Ok(ArtifactHandle { location, media_type: media_type.to_string(), size: bytes.len() })
    }
}
