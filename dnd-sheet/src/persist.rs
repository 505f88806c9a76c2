//! Store and character persistence.
//!
//! Saves are pretty-printed JSON with a format version. Loading a store
//! rebuilds it through [`MemoryStore::from_snapshot`], so a hand-edited file
//! with dangling references or broken invariants is rejected.

use crate::stats::{StatEngine, StatError};
use crate::store::{MemoryStore, StoreError, StoreSnapshot};
use crate::world::Character;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

/// Errors from persistence operations.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },

    #[error("Saved store is inconsistent: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Stat(#[from] StatError),
}

/// Current store save file version.
const SAVE_VERSION: u32 = 1;

/// A saved store with everything needed to resume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedStore {
    /// Save format version for compatibility checking.
    pub version: u32,

    /// When the save was created.
    pub saved_at: String,

    /// Metadata about the save.
    pub metadata: StoreMetadata,

    /// Every record in the store.
    pub snapshot: StoreSnapshot,
}

/// Summary of a store save for listing without a full load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreMetadata {
    pub user_count: usize,
    pub character_count: usize,

    /// Campaign names, sorted.
    pub campaigns: Vec<String>,

    /// When the save was created (duplicated from parent for peek access).
    #[serde(default)]
    pub saved_at: String,
}

impl SavedStore {
    pub fn new(store: &MemoryStore) -> Self {
        let saved_at = chrono_now();
        let snapshot = store.snapshot();
        let metadata = StoreMetadata {
            user_count: snapshot.users.len(),
            character_count: snapshot.characters.len(),
            campaigns: snapshot.campaigns.iter().map(|c| c.name.clone()).collect(),
            saved_at: saved_at.clone(),
        };

        Self {
            version: SAVE_VERSION,
            saved_at,
            metadata,
            snapshot,
        }
    }

    /// Rebuild the store, re-checking references and invariants.
    pub fn into_store(self) -> Result<MemoryStore, PersistError> {
        Ok(MemoryStore::from_snapshot(self.snapshot)?)
    }

    /// Save to a JSON file.
    pub async fn save_json(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await?;
        tracing::info!(
            path = %path.display(),
            characters = self.metadata.character_count,
            "store saved"
        );
        Ok(())
    }

    /// Load from a JSON file.
    pub async fn load_json(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).await?;
        let saved: Self = serde_json::from_str(&content)?;
        check_version(saved.version, SAVE_VERSION)?;
        tracing::info!(path = %path.display(), saved_at = %saved.saved_at, "store loaded");
        Ok(saved)
    }

    /// Get metadata without loading the full snapshot.
    pub async fn peek_metadata(path: impl AsRef<Path>) -> Result<StoreMetadata, PersistError> {
        let content = fs::read_to_string(path).await?;

        #[derive(Deserialize)]
        struct Partial {
            version: u32,
            metadata: StoreMetadata,
        }

        let partial: Partial = serde_json::from_str(&content)?;
        check_version(partial.version, SAVE_VERSION)?;
        Ok(partial.metadata)
    }
}

fn check_version(found: u32, expected: u32) -> Result<(), PersistError> {
    if found != expected {
        tracing::warn!(expected, found, "save file version mismatch");
        return Err(PersistError::VersionMismatch { expected, found });
    }
    Ok(())
}

/// List all store saves in a directory, most recent first.
pub async fn list_saves(dir: impl AsRef<Path>) -> Result<Vec<SaveInfo>, PersistError> {
    let mut saves = Vec::new();
    let mut entries = fs::read_dir(dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().map(|e| e == "json").unwrap_or(false) {
            match SavedStore::peek_metadata(&path).await {
                Ok(metadata) => saves.push(SaveInfo { path, metadata }),
                Err(e) => tracing::debug!(path = %path.display(), error = %e, "skipping file"),
            }
        }
    }

    saves.sort_by(|a, b| b.metadata.saved_at.cmp(&a.metadata.saved_at));
    Ok(saves)
}

/// Information about a save file.
#[derive(Debug, Clone)]
pub struct SaveInfo {
    pub path: PathBuf,
    pub metadata: StoreMetadata,
}

/// Seconds since the Unix epoch, as a string.
fn chrono_now() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("{}", now.as_secs())
}

// ============================================================================
// Character Persistence
// ============================================================================

/// Current character save file version.
const CHARACTER_SAVE_VERSION: u32 = 1;

/// A single exported character sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedCharacter {
    pub version: u32,
    pub saved_at: String,
    pub character: Character,
    pub metadata: CharacterMetadata,
}

/// Quick-display metadata for a saved character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterMetadata {
    pub name: String,
    pub level: u8,
    pub exp_points: i64,
    pub hit_points: String,
}

impl SavedCharacter {
    /// Fails if the character's experience is invalid for the engine's tables.
    pub fn new(character: Character, engine: &StatEngine<'_>) -> Result<Self, PersistError> {
        let metadata = CharacterMetadata {
            name: character.name.clone(),
            level: engine.character_level(&character)?,
            exp_points: character.exp_points,
            hit_points: format!(
                "{}/{}",
                character.hit_points.current, character.hit_points.maximum
            ),
        };

        Ok(Self {
            version: CHARACTER_SAVE_VERSION,
            saved_at: chrono_now(),
            character,
            metadata,
        })
    }

    pub async fn save_json(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await?;
        Ok(())
    }

    pub async fn load_json(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let content = fs::read_to_string(path).await?;
        let saved: Self = serde_json::from_str(&content)?;
        check_version(saved.version, CHARACTER_SAVE_VERSION)?;
        Ok(saved)
    }

    pub async fn peek_metadata(path: impl AsRef<Path>) -> Result<CharacterMetadata, PersistError> {
        let content = fs::read_to_string(path).await?;

        #[derive(Deserialize)]
        struct Partial {
            version: u32,
            metadata: CharacterMetadata,
        }

        let partial: Partial = serde_json::from_str(&content)?;
        check_version(partial.version, CHARACTER_SAVE_VERSION)?;
        Ok(partial.metadata)
    }
}

/// File path for a character save, with the name sanitized.
pub fn character_save_path(base_dir: impl AsRef<Path>, character_name: &str) -> PathBuf {
    let sanitized = character_name
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect::<String>();
    base_dir.as_ref().join(format!("{sanitized}.character.json"))
}
