use crate::voting::nomination::NOMINATE_TOKEN;
use log::{debug, warn};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Flat string key-value store standing in for browser local storage.
pub trait Storage: Send {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// One file per key under `dir`.
#[derive(Debug)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path(&self, key: &str) -> PathBuf {
        let mut name = String::with_capacity(key.len());
        for byte in key.bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
                name.push(byte as char);
            } else {
                name.push_str(&format!("%{:02X}", byte));
            }
        }
        self.dir.join(name)
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::write(self.path(key), value)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path(key)) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// In-progress vote: the selected stripe controls in stripe order, plus
/// the nomination flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub controls: Vec<String>,
    pub nominated: bool,
}

impl Draft {
    pub fn is_empty(&self) -> bool {
        self.controls.is_empty() && !self.nominated
    }

    pub fn to_tokens(&self) -> Vec<String> {
        let mut tokens = self.controls.clone();
        if self.nominated {
            tokens.push(NOMINATE_TOKEN.to_string());
        }
        tokens
    }

    pub fn from_tokens(tokens: Vec<String>) -> Self {
        let mut draft = Draft::default();
        for token in tokens {
            if token == NOMINATE_TOKEN {
                draft.nominated = true;
            } else {
                draft.controls.push(token);
            }
        }
        draft
    }
}

pub fn draft_key(proposal_id: &str) -> String {
    format!("VOTES-{}", proposal_id)
}

/// Drafts keyed by proposal. Without storage every call is a no-op and
/// `load` finds nothing.
pub struct DraftStore {
    storage: Option<Box<dyn Storage>>,
}

impl DraftStore {
    pub fn new(storage: Box<dyn Storage>) -> Self {
        Self {
            storage: Some(storage),
        }
    }

    pub fn memory() -> Self {
        Self::new(Box::new(MemoryStorage::new()))
    }

    pub fn unavailable() -> Self {
        Self { storage: None }
    }

    pub fn is_available(&self) -> bool {
        self.storage.is_some()
    }

    pub fn save(&mut self, proposal_id: &str, draft: &Draft) {
        let Some(storage) = self.storage.as_mut() else {
            return;
        };
        let raw = match serde_json::to_string(&draft.to_tokens()) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Failed to encode draft for proposal {}: {}", proposal_id, e);
                return;
            }
        };
        if let Err(e) = storage.set(&draft_key(proposal_id), &raw) {
            warn!("Failed to save draft for proposal {}: {}", proposal_id, e);
        }
    }

    pub fn load(&self, proposal_id: &str) -> Option<Draft> {
        let storage = self.storage.as_ref()?;
        let raw = match storage.get(&draft_key(proposal_id)) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("Failed to read draft for proposal {}: {}", proposal_id, e);
                return None;
            }
        };
        match serde_json::from_str::<Vec<String>>(&raw) {
            Ok(tokens) if !tokens.is_empty() => Some(Draft::from_tokens(tokens)),
            Ok(_) => None,
            Err(e) => {
                debug!("Discarding corrupt draft for proposal {}: {}", proposal_id, e);
                None
            }
        }
    }

    pub fn clear(&mut self, proposal_id: &str) {
        let Some(storage) = self.storage.as_mut() else {
            return;
        };
        if let Err(e) = storage.remove(&draft_key(proposal_id)) {
            warn!("Failed to clear draft for proposal {}: {}", proposal_id, e);
        }
    }
}
