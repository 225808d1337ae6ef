use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::PathBuf;

use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::schema::{FieldPrefs, FlatSnapshot, Settings, Snapshot, SnapshotData};

/// Identity → snapshot list, all records.
pub const DATA_KEY: &str = "FormVaultData";
/// Identity → field prefs, all records.
pub const PREFS_KEY: &str = "FormVaultPrefs";
/// Global settings record.
pub const SETTINGS_KEY: &str = "FormVaultSettings";

/// Per-identity history bound; inserting past it evicts the oldest entry.
pub const MAX_SNAPSHOTS: usize = 20;

/// The backing key-value capability: async get/set of JSON values by
/// string key. Hosts bind this to whatever storage they have; the crate
/// ships [`MemoryStore`] and [`FileStore`] for embedding and tests.
pub trait KeyValue {
    fn get(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = crate::Result<Option<Value>>> + Send;
    fn set(
        &self,
        key: &str,
        value: Value,
    ) -> impl std::future::Future<Output = crate::Result<()>> + Send;
}

/// Volatile in-memory backend.
#[derive(Default)]
pub struct MemoryStore {
    cells: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValue for MemoryStore {
    async fn get(&self, key: &str) -> crate::Result<Option<Value>> {
        Ok(self.cells.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> crate::Result<()> {
        self.cells.lock().await.insert(key.to_string(), value);
        Ok(())
    }
}

/// Durable backend persisting all keys to one JSON document. Writes go to
/// a temp file in the same directory and are renamed into place; rename is
/// atomic on one filesystem, so avoid sharing the file across mounts.
pub struct FileStore {
    path: PathBuf,
    cells: Mutex<HashMap<String, Value>>,
}

impl FileStore {
    pub fn open(path: impl Into<PathBuf>) -> crate::Result<Self> {
        let path = path.into();
        let mut cells = HashMap::new();
        if path.exists() {
            let raw = fs::read_to_string(&path)?;
            cells = serde_json::from_str(&raw)?;
        }
        Ok(Self {
            path,
            cells: Mutex::new(cells),
        })
    }

    fn flush(&self, cells: &HashMap<String, Value>) -> crate::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(cells)?;
        self.atomic_write(data.as_bytes())
    }

    fn atomic_write(&self, bytes: &[u8]) -> crate::Result<()> {
        let parent = self.path.parent().ok_or_else(|| {
            crate::FormVaultError::Storage("store path has no parent directory".to_string())
        })?;
        use rand::{thread_rng, Rng};
        let suffix: u64 = thread_rng().gen();
        let tmp = parent.join(format!(".formvault.{suffix}.tmp"));
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValue for FileStore {
    async fn get(&self, key: &str) -> crate::Result<Option<Value>> {
        Ok(self.cells.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> crate::Result<()> {
        let mut cells = self.cells.lock().await;
        cells.insert(key.to_string(), value);
        self.flush(&cells)
    }
}

/// Bounded, per-identity snapshot persistence over an injected [`KeyValue`].
///
/// Every operation is a read-modify-write against the backend. Callers are
/// assumed to be a single active session per identity; concurrent writers
/// are not isolated and the later write wins.
pub struct SnapshotStore<S: KeyValue> {
    backend: S,
}

impl<S: KeyValue> SnapshotStore<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    async fn load_all(&self) -> crate::Result<BTreeMap<String, Vec<Snapshot>>> {
        match self.backend.get(DATA_KEY).await? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(BTreeMap::new()),
        }
    }

    async fn store_all(&self, all: &BTreeMap<String, Vec<Snapshot>>) -> crate::Result<()> {
        self.backend
            .set(DATA_KEY, serde_json::to_value(all)?)
            .await
    }

    /// Create and persist a snapshot at the head of the identity's list,
    /// evicting past the history bound. Returns the created snapshot.
    pub async fn save(
        &self,
        identity: &str,
        data: SnapshotData,
        name: Option<&str>,
        delay_override: u64,
        restore_hidden: bool,
    ) -> crate::Result<Snapshot> {
        let mut all = self.load_all().await?;
        let snapshot = Snapshot::new(name, data, delay_override, restore_hidden);
        let list = all.entry(identity.to_string()).or_default();
        list.insert(0, snapshot.clone());
        if list.len() > MAX_SNAPSHOTS {
            list.truncate(MAX_SNAPSHOTS);
            debug!(identity, "history bound reached, oldest snapshot evicted");
        }
        self.store_all(&all).await?;
        info!(identity, uid = %snapshot.uid, name = %snapshot.name, "snapshot saved");
        Ok(snapshot)
    }

    /// Snapshots stored for one identity, newest first.
    pub async fn list(&self, identity: &str) -> crate::Result<Vec<Snapshot>> {
        Ok(self.load_all().await?.remove(identity).unwrap_or_default())
    }

    /// Replace the stored entry matching `updated.uid` wholesale. Returns
    /// `Ok(false)` when the identity or uid is unknown; never appends.
    pub async fn update(&self, identity: &str, updated: Snapshot) -> crate::Result<bool> {
        let mut all = self.load_all().await?;
        let Some(list) = all.get_mut(identity) else {
            debug!(identity, "update against unknown identity");
            return Ok(false);
        };
        let Some(slot) = list.iter_mut().find(|s| s.uid == updated.uid) else {
            debug!(identity, uid = %updated.uid, "update against unknown uid");
            return Ok(false);
        };
        *slot = updated;
        self.store_all(&all).await?;
        Ok(true)
    }

    /// Remove one snapshot. When the identity's list empties, the identity
    /// key itself is dropped — no empty lists are persisted.
    pub async fn delete(&self, identity: &str, uid: &str) -> crate::Result<bool> {
        let mut all = self.load_all().await?;
        let Some(list) = all.get_mut(identity) else {
            return Ok(false);
        };
        let before = list.len();
        list.retain(|s| s.uid != uid);
        if list.len() == before {
            return Ok(false);
        }
        if list.is_empty() {
            all.remove(identity);
        }
        self.store_all(&all).await?;
        info!(identity, uid, "snapshot deleted");
        Ok(true)
    }

    /// Clear every identity's snapshot list. Prefs and settings survive.
    pub async fn delete_all(&self) -> crate::Result<()> {
        self.backend
            .set(DATA_KEY, serde_json::to_value(BTreeMap::<String, Vec<Snapshot>>::new())?)
            .await?;
        info!("all snapshots deleted");
        Ok(())
    }

    /// Every stored snapshot annotated with its owning identity, in
    /// identity iteration order then per-identity stored order.
    pub async fn list_flat(&self) -> crate::Result<Vec<FlatSnapshot>> {
        let all = self.load_all().await?;
        let mut flat = Vec::new();
        for (identity, list) in all {
            for snapshot in list {
                flat.push(FlatSnapshot {
                    identity: identity.clone(),
                    snapshot,
                });
            }
        }
        Ok(flat)
    }

    /// Capture prefs for one identity, defaults when none are stored or the
    /// stored entry does not parse.
    pub async fn get_prefs(&self, identity: &str) -> crate::Result<FieldPrefs> {
        let mut map = self.load_prefs_map().await?;
        Ok(map
            .remove(identity)
            .map(|raw| serde_json::from_value(raw).unwrap_or_default())
            .unwrap_or_default())
    }

    pub async fn set_prefs(&self, identity: &str, prefs: &FieldPrefs) -> crate::Result<()> {
        let mut map = self.load_prefs_map().await?;
        map.insert(identity.to_string(), serde_json::to_value(prefs)?);
        self.backend
            .set(PREFS_KEY, serde_json::to_value(&map)?)
            .await
    }

    async fn load_prefs_map(&self) -> crate::Result<BTreeMap<String, Value>> {
        match self.backend.get(PREFS_KEY).await? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(BTreeMap::new()),
        }
    }

    pub async fn settings(&self) -> crate::Result<Settings> {
        match self.backend.get(SETTINGS_KEY).await? {
            Some(value) => Ok(serde_json::from_value(value).unwrap_or_default()),
            None => Ok(Settings::default()),
        }
    }

    pub async fn save_settings(&self, settings: &Settings) -> crate::Result<()> {
        self.backend
            .set(SETTINGS_KEY, serde_json::to_value(settings)?)
            .await
    }

    /// The delay to pace a restore of this snapshot with: a positive
    /// per-snapshot override, else the global setting.
    pub async fn effective_delay(&self, snapshot: &Snapshot) -> crate::Result<u64> {
        if snapshot.delay_override > 0 {
            return Ok(snapshot.delay_override);
        }
        Ok(self.settings().await?.restore_delay)
    }
}
