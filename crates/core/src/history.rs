//! Bounded history of generated results, persisted as a JSON file.
//!
//! The list is newest-first and capped at [`MAX_HISTORY`] entries. A
//! missing or unreadable file is treated as an empty history so a
//! corrupt store never blocks a generation.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Maximum number of entries kept in the store.
pub const MAX_HISTORY: usize = 20;

/// A stored snapshot of a successful generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Creation time in epoch milliseconds.
    pub id: i64,
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_details: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied by the caller when recording a new entry.
#[derive(Debug, Clone, Default)]
pub struct NewHistoryEntry {
    pub image_url: String,
    pub thumbnail_url: Option<String>,
    pub user_details: Option<String>,
}

/// File-backed history store.
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read all entries, newest first.
    pub fn load(&self) -> Vec<HistoryEntry> {
        fs::read(&self.path)
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .unwrap_or_default()
    }

    /// Prepend an entry, truncate to [`MAX_HISTORY`], persist, and return
    /// the updated list.
    pub fn add(&self, entry: NewHistoryEntry) -> Result<Vec<HistoryEntry>, CoreError> {
        if entry.image_url.trim().is_empty() {
            return Err(CoreError::Validation(
                "history entry requires an image URL".to_string(),
            ));
        }

        let now = Utc::now();
        let item = HistoryEntry {
            id: now.timestamp_millis(),
            image_url: entry.image_url,
            thumbnail_url: entry.thumbnail_url,
            user_details: entry
                .user_details
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            created_at: now,
        };

        let mut history = Vec::with_capacity(MAX_HISTORY);
        history.push(item);
        history.extend(self.load());
        history.truncate(MAX_HISTORY);

        self.persist(&history)?;
        Ok(history)
    }

    /// Remove every entry.
    pub fn clear(&self) -> Result<(), CoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn persist(&self, history: &[HistoryEntry]) -> Result<(), CoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        // Write to a sibling file first so a crash never leaves half a list.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(history)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
