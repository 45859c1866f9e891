use crate::capsule::DesignCapsule;
use crate::error::LedgerError;
use async_trait::async_trait;
use market_types::{CapsuleId, ContentHash};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;
use tracing::debug;

/// Write-once store of design capsules.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Store a capsule. Fails if a capsule with the same id exists.
    async fn put(&self, capsule: DesignCapsule) -> Result<CapsuleId, LedgerError>;

    /// Fetch a capsule; unknown ids yield [`DesignCapsule::empty`].
    async fn get(&self, id: &CapsuleId) -> Result<DesignCapsule, LedgerError>;

    /// Add an annotation key. Existing keys cannot be overwritten.
    async fn annotate(&self, id: &CapsuleId, key: &str, value: Value) -> Result<(), LedgerError>;

    /// All capsule ids, sorted.
    async fn list(&self) -> Result<Vec<CapsuleId>, LedgerError>;
}

fn add_annotation(
    capsule: &mut DesignCapsule,
    key: &str,
    value: Value,
) -> Result<(), LedgerError> {
    if capsule.annotations.contains_key(key) {
        return Err(LedgerError::AnnotationExists {
            capsule: capsule.capsule_id.clone(),
            key: key.to_string(),
        });
    }
    capsule.annotations.insert(key.to_string(), value);
    Ok(())
}

/// In-memory ledger for tests and single-process hosts.
#[derive(Clone, Default)]
pub struct InMemoryLedger {
    capsules: Arc<RwLock<HashMap<CapsuleId, DesignCapsule>>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn put(&self, capsule: DesignCapsule) -> Result<CapsuleId, LedgerError> {
        if capsule.capsule_id.is_empty() {
            return Err(LedgerError::EmptyId);
        }
        let mut store = self.capsules.write().map_err(|_| LedgerError::LockPoisoned)?;
        if store.contains_key(&capsule.capsule_id) {
            return Err(LedgerError::Duplicate(capsule.capsule_id.clone()));
        }
        let id = capsule.capsule_id.clone();
        store.insert(id.clone(), capsule);
        debug!(capsule = %id, "capsule stored");
        Ok(id)
    }

    async fn get(&self, id: &CapsuleId) -> Result<DesignCapsule, LedgerError> {
        let store = self.capsules.read().map_err(|_| LedgerError::LockPoisoned)?;
        Ok(store
            .get(id)
            .cloned()
            .unwrap_or_else(|| DesignCapsule::empty(id.clone())))
    }

    async fn annotate(&self, id: &CapsuleId, key: &str, value: Value) -> Result<(), LedgerError> {
        let mut store = self.capsules.write().map_err(|_| LedgerError::LockPoisoned)?;
        let capsule = store
            .get_mut(id)
            .ok_or_else(|| LedgerError::NotFound(id.clone()))?;
        add_annotation(capsule, key, value)
    }

    async fn list(&self) -> Result<Vec<CapsuleId>, LedgerError> {
        let store = self.capsules.read().map_err(|_| LedgerError::LockPoisoned)?;
        let mut ids: Vec<CapsuleId> = store.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}

/// One JSON file per capsule under a directory.
///
/// Writes go to a `.tmp` file first and are renamed into place. Mutations
/// are serialized through an async lock.
pub struct JsonDirLedger {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonDirLedger {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name is the BLAKE3 hex of the id, so distinct ids never share a file.
    fn path_for(&self, id: &CapsuleId) -> PathBuf {
        let file = ContentHash::hash(id.as_str().as_bytes()).to_hex();
        self.dir.join(format!("{}.json", file))
    }

    /// The capsule stored for `id`, if the file at its path holds that id.
    async fn read_id(&self, id: &CapsuleId) -> Result<Option<DesignCapsule>, LedgerError> {
        Ok(self
            .read(&self.path_for(id))
            .await?
            .filter(|capsule| capsule.capsule_id == *id))
    }

    async fn read(&self, path: &Path) -> Result<Option<DesignCapsule>, LedgerError> {
        match tokio::fs::read_to_string(path).await {
            Ok(contents) => Ok(Some(serde_json::from_str(&contents)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, path: &Path, capsule: &DesignCapsule) -> Result<(), LedgerError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let json = serde_json::to_string_pretty(capsule)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

#[async_trait]
impl Ledger for JsonDirLedger {
    async fn put(&self, capsule: DesignCapsule) -> Result<CapsuleId, LedgerError> {
        if capsule.capsule_id.is_empty() {
            return Err(LedgerError::EmptyId);
        }
        let _guard = self.write_lock.lock().await;
        let path = self.path_for(&capsule.capsule_id);
        if tokio::fs::try_exists(&path).await? {
            return Err(LedgerError::Duplicate(capsule.capsule_id.clone()));
        }
        self.write(&path, &capsule).await?;
        debug!(capsule = %capsule.capsule_id, path = %path.display(), "capsule written");
        Ok(capsule.capsule_id)
    }

    async fn get(&self, id: &CapsuleId) -> Result<DesignCapsule, LedgerError> {
        Ok(self
            .read_id(id)
            .await?
            .unwrap_or_else(|| DesignCapsule::empty(id.clone())))
    }

    async fn annotate(&self, id: &CapsuleId, key: &str, value: Value) -> Result<(), LedgerError> {
        let _guard = self.write_lock.lock().await;
        let mut capsule = self
            .read_id(id)
            .await?
            .ok_or_else(|| LedgerError::NotFound(id.clone()))?;
        add_annotation(&mut capsule, key, value)?;
        self.write(&self.path_for(id), &capsule).await
    }

    async fn list(&self) -> Result<Vec<CapsuleId>, LedgerError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(capsule) = self.read(&path).await? {
                ids.push(capsule.capsule_id);
            }
        }
        ids.sort();
        Ok(ids)
    }
}
