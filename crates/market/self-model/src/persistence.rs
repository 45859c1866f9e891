//! Self-model persistence - save and load arm statistics across restarts.
//!
//! Provides the `SelfModelStore` trait, a `JsonFileSelfModelStore` that keeps
//! the arm table in a single JSON file, and an in-memory store for tests.

use crate::error::SelfModelError;
use crate::types::{ArmKey, ArmStats};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Load/save contract for the self-model arm table.
pub trait SelfModelStore: Send + Sync {
    /// Load all arms. Returns an empty map if nothing was persisted yet.
    fn load(&self) -> Result<HashMap<ArmKey, ArmStats>, SelfModelError>;

    /// Replace the persisted arm table.
    fn save(&self, arms: &HashMap<ArmKey, ArmStats>) -> Result<(), SelfModelError>;
}

/// One persisted arm.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct ArmRecord {
    signature: String,
    playbook: String,
    stats: ArmStats,
}

/// On-disk layout of the arm table.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct SelfModelFile {
    version: u32,
    arms: Vec<ArmRecord>,
}

const FILE_VERSION: u32 = 1;

/// JSON-file based persistence.
///
/// Writes are atomic (write to `.tmp`, then rename) so an interrupted save
/// never leaves a truncated table behind.
pub struct JsonFileSelfModelStore {
    path: PathBuf,
}

impl JsonFileSelfModelStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SelfModelStore for JsonFileSelfModelStore {
    fn load(&self) -> Result<HashMap<ArmKey, ArmStats>, SelfModelError> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        let file: SelfModelFile = serde_json::from_str(&contents)
            .map_err(|e| SelfModelError::Serialization(format!("deserialization failed: {}", e)))?;
        Ok(file
            .arms
            .into_iter()
            .map(|r| (ArmKey::new(r.signature, r.playbook), r.stats))
            .collect())
    }

    fn save(&self, arms: &HashMap<ArmKey, ArmStats>) -> Result<(), SelfModelError> {
        let mut records: Vec<ArmRecord> = arms
            .iter()
            .map(|(k, s)| ArmRecord {
                signature: k.signature.clone(),
                playbook: k.playbook.clone(),
                stats: s.clone(),
            })
            .collect();
        records.sort_by(|a, b| (&a.signature, &a.playbook).cmp(&(&b.signature, &b.playbook)));

        let json = serde_json::to_string_pretty(&SelfModelFile {
            version: FILE_VERSION,
            arms: records,
        })
        .map_err(|e| SelfModelError::Serialization(format!("serialization failed: {}", e)))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let tmp_path = self.path.with_extension("tmp");
        std::fs::write(&tmp_path, json)?;
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

/// In-memory persistence (for testing).
#[derive(Default)]
pub struct InMemorySelfModelStore {
    data: Mutex<HashMap<ArmKey, ArmStats>>,
}

impl InMemorySelfModelStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SelfModelStore for InMemorySelfModelStore {
    fn load(&self) -> Result<HashMap<ArmKey, ArmStats>, SelfModelError> {
        let data = self.data.lock().map_err(|_| SelfModelError::LockPoisoned)?;
        Ok(data.clone())
    }

    fn save(&self, arms: &HashMap<ArmKey, ArmStats>) -> Result<(), SelfModelError> {
        let mut data = self.data.lock().map_err(|_| SelfModelError::LockPoisoned)?;
        *data = arms.clone();
        Ok(())
    }
}
