use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

lazy_static! {
    static ref CRITERION_ID: Regex = Regex::new(r"^[A-Za-z0-9_]+$").unwrap();
}

/// A talk/proposal shown as one row in the ranked-list containers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum CriterionKind {
    /// Reject / neutral / accept buttons.
    Choice,
    /// A row of `count` stars; first star stores 0.
    Stars { count: u8 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criterion {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default = "default_kind")]
    pub kind: CriterionKind,
}

fn default_kind() -> CriterionKind {
    CriterionKind::Choice
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListMode {
    /// Pick at most `cap` talks, order is insertion order.
    #[default]
    Batch,
    /// Thunderdome: every talk must be ranked, with up/down reordering.
    Ranking,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListConfig {
    #[serde(default)]
    pub mode: ListMode,
    /// Maximum number of selected items as the page gave it. Use `cap()`
    /// for the limit that applies.
    #[serde(default)]
    pub cap: Option<usize>,
}

/// Batch pages pick two talks unless told otherwise.
pub const DEFAULT_BATCH_CAP: usize = 2;

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            mode: ListMode::Batch,
            cap: None,
        }
    }
}

impl ListConfig {
    /// The limit that applies. Ranking pages are unbounded unless a cap is given.
    pub fn cap(&self) -> Option<usize> {
        match self.mode {
            ListMode::Batch => Some(self.cap.unwrap_or(DEFAULT_BATCH_CAP)),
            ListMode::Ranking => self.cap,
        }
    }
}

/// A vote or ranking already recorded server-side, embedded in the page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingRanking {
    #[serde(default)]
    pub ranked: Vec<String>,
    #[serde(default)]
    pub accepted: usize,
}

/// Data island the hosting page embeds for the client layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageConfig {
    pub proposal_id: Option<String>,
    #[serde(default)]
    pub criteria: Vec<Criterion>,
    #[serde(default)]
    pub primary_criterion: Option<String>,
    /// Item id -> display title, in page order.
    #[serde(default)]
    pub talks: Vec<Item>,
    #[serde(default)]
    pub existing: Option<ExistingRanking>,
    #[serde(default)]
    pub list: ListConfig,
    #[serde(default)]
    pub templates: BTreeMap<String, String>,
    #[serde(default)]
    pub tabs: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid criterion id {0:?}: only letters, digits and '_' are allowed")]
    InvalidCriterionId(String),
    #[error("duplicate criterion id {0:?}")]
    DuplicateCriterion(String),
    #[error("primary criterion {0:?} is not one of the page criteria")]
    UnknownPrimary(String),
    #[error("star criterion {0:?} needs at least one star")]
    NoStars(String),
    #[error("missing environment variable {0}")]
    MissingVar(&'static str),
    #[error("failed to read page config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse page config: {0}")]
    Parse(#[from] serde_json::Error),
}

impl PageConfig {
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: PageConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = std::collections::HashSet::new();
        for criterion in &self.criteria {
            if !CRITERION_ID.is_match(&criterion.id) {
                return Err(ConfigError::InvalidCriterionId(criterion.id.clone()));
            }
            if !seen.insert(criterion.id.as_str()) {
                return Err(ConfigError::DuplicateCriterion(criterion.id.clone()));
            }
            if criterion.kind == (CriterionKind::Stars { count: 0 }) {
                return Err(ConfigError::NoStars(criterion.id.clone()));
            }
        }
        if let Some(primary) = &self.primary_criterion {
            if !seen.contains(primary.as_str()) {
                return Err(ConfigError::UnknownPrimary(primary.clone()));
            }
        }
        Ok(())
    }

    pub fn title_of(&self, item_id: &str) -> Option<&str> {
        self.talks
            .iter()
            .find(|item| item.id == item_id)
            .map(|item| item.title.as_str())
    }
}
