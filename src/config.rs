use crate::draft::{DraftStore, FileStorage, StorageError};
use crate::models::ConfigError;
use log::info;
use std::env;
use std::path::PathBuf;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/";
pub const DEFAULT_ACTIVITY_PATH: &str = "activity_buttons/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// URL of the review page; action endpoints resolve against it.
    pub base_url: String,
    /// Where drafts are kept. Drafts stay in memory when unset.
    pub draft_dir: Option<PathBuf>,
    pub activity_path: String,
    pub page_config: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            base_url: lookup("REVIEW_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            draft_dir: lookup("REVIEW_DRAFT_DIR").map(PathBuf::from),
            activity_path: lookup("REVIEW_ACTIVITY_PATH")
                .unwrap_or_else(|| DEFAULT_ACTIVITY_PATH.to_string()),
            page_config: lookup("REVIEW_PAGE_CONFIG").map(PathBuf::from),
        }
    }

    pub fn page_config_path(&self) -> Result<&PathBuf, ConfigError> {
        self.page_config
            .as_ref()
            .ok_or(ConfigError::MissingVar("REVIEW_PAGE_CONFIG"))
    }

    pub fn draft_store(&self) -> Result<DraftStore, StorageError> {
        match &self.draft_dir {
            Some(dir) => {
                info!("Keeping drafts in {}", dir.display());
                Ok(DraftStore::new(Box::new(FileStorage::new(dir)?)))
            }
            None => Ok(DraftStore::memory()),
        }
    }
}
