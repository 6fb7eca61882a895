// Weight persistence
// Durable storage for the adaptive weight table behind a pluggable backend

use crate::error::PersistenceError;
use crate::learning::Learner;
use crate::models::{TradeOutcome, WeightTable, DEFAULT_WEIGHT};
use chrono::{DateTime, Utc};
use redis::{Client, Commands};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// Persisted form of the weight table
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WeightDocument {
    pub weights: WeightTable,
    /// Number of settlements applied since the document was created
    #[serde(default)]
    pub trade_count: u64,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Raw document storage
pub trait WeightBackend: Send + Sync {
    /// Read the stored document, `None` if nothing has been written yet
    fn load(&self) -> Result<Option<String>, PersistenceError>;

    /// Replace the stored document
    fn save(&self, document: &str) -> Result<(), PersistenceError>;

    /// Human-readable location for logs
    fn describe(&self) -> String;
}

/// JSON file on local disk, replaced atomically on every write
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl WeightBackend for JsonFileBackend {
    fn load(&self) -> Result<Option<String>, PersistenceError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, document: &str) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        // Write-then-rename so a crash never leaves a half-written document
        let temp = self.temp_path();
        fs::write(&temp, document)?;
        fs::rename(&temp, &self.path)?;

        Ok(())
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

/// Single string key in Redis
pub struct RedisBackend {
    client: Client,
    key: String,
    timeout: Duration,
}

impl RedisBackend {
    /// Create a backend for `key` on the server at `redis_url`
    ///
    /// # Arguments
    /// * `redis_url` - Redis connection URL (e.g., "redis://127.0.0.1:6379")
    /// * `key` - Key holding the JSON weight document
    ///
    /// No connection is made until the first load or save.
    pub fn new(redis_url: &str, key: impl Into<String>) -> Result<Self, PersistenceError> {
        let client = Client::open(redis_url)?;

        Ok(Self {
            client,
            key: key.into(),
            timeout: Duration::from_secs(5),
        })
    }

    fn connection(&self) -> Result<redis::Connection, PersistenceError> {
        Ok(self.client.get_connection_with_timeout(self.timeout)?)
    }
}

impl WeightBackend for RedisBackend {
    fn load(&self) -> Result<Option<String>, PersistenceError> {
        let mut conn = self.connection()?;
        let raw: Option<String> = conn.get(&self.key)?;
        Ok(raw)
    }

    fn save(&self, document: &str) -> Result<(), PersistenceError> {
        let mut conn = self.connection()?;
        conn.set::<_, _, ()>(&self.key, document)?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("redis key {}", self.key)
    }
}

/// In-process backend for replays and tests
#[derive(Debug, Default)]
pub struct MemoryBackend {
    document: Mutex<Option<String>>,
    fail_writes: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an existing raw document
    pub fn with_document(document: impl Into<String>) -> Self {
        Self {
            document: Mutex::new(Some(document.into())),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Make every subsequent save fail
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Current raw document
    pub fn document(&self) -> Option<String> {
        self.document.lock().ok().and_then(|doc| doc.clone())
    }
}

impl WeightBackend for MemoryBackend {
    fn load(&self) -> Result<Option<String>, PersistenceError> {
        let doc = self.document.lock().map_err(|_| PersistenceError::Poisoned)?;
        Ok(doc.clone())
    }

    fn save(&self, document: &str) -> Result<(), PersistenceError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PersistenceError::Rejected("memory backend is read-only".to_string()));
        }

        let mut doc = self.document.lock().map_err(|_| PersistenceError::Poisoned)?;
        *doc = Some(document.to_string());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

/// Owner of the live weight table.
///
/// Every read, write and learner update goes through one mutex, and the
/// in-memory table only changes after the backend accepted the new document.
pub struct WeightStore {
    backend: Box<dyn WeightBackend>,
    learner: Learner,
    names: Vec<String>,
    state: Mutex<WeightDocument>,
}

impl WeightStore {
    /// Load the stored table, falling back to defaults when it is missing or
    /// unreadable. Never fails.
    pub fn open<B>(backend: B, learner: Learner, names: Vec<String>) -> Self
    where
        B: WeightBackend + 'static,
    {
        let document = read_document(&backend, &learner, &names);

        tracing::info!(
            "Loaded {} analyst weights from {} ({} trades applied)",
            document.weights.len(),
            backend.describe(),
            document.trade_count
        );

        Self {
            backend: Box::new(backend),
            learner,
            names,
            state: Mutex::new(document),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, WeightDocument>, PersistenceError> {
        self.state.lock().map_err(|_| PersistenceError::Poisoned)
    }

    /// Current weight table
    pub fn load(&self) -> Result<WeightTable, PersistenceError> {
        Ok(self.lock()?.weights.clone())
    }

    /// Current document including the trade counter
    pub fn document(&self) -> Result<WeightDocument, PersistenceError> {
        Ok(self.lock()?.clone())
    }

    pub fn trade_count(&self) -> Result<u64, PersistenceError> {
        Ok(self.lock()?.trade_count)
    }

    pub fn describe(&self) -> String {
        self.backend.describe()
    }

    /// Persist `table` as the current weights
    pub fn save(&self, table: &WeightTable) -> Result<(), PersistenceError> {
        let mut state = self.lock()?;
        let document = WeightDocument {
            weights: sanitize(table.clone(), &self.learner, &self.names),
            trade_count: state.trade_count,
            updated_at: Some(Utc::now()),
        };

        self.write(&document)?;
        *state = document;
        Ok(())
    }

    /// Apply one settled trade and persist the result.
    ///
    /// On a failed write the error is returned and the previous weights stay
    /// in effect.
    pub fn record_outcome(&self, outcome: &TradeOutcome) -> Result<WeightTable, PersistenceError> {
        let mut state = self.lock()?;

        if !outcome.signal.is_trade() {
            tracing::warn!("Settlement for a WAIT decision carries no trade, weights unchanged");
            return Ok(state.weights.clone());
        }

        let document = WeightDocument {
            weights: self.learner.update(&state.weights, outcome),
            trade_count: state.trade_count + 1,
            updated_at: Some(Utc::now()),
        };

        if let Err(e) = self.write(&document) {
            tracing::warn!("⚠️  Failed to persist weights, keeping previous table: {}", e);
            return Err(e);
        }

        *state = document;

        tracing::info!(
            "📈 Applied {} {} settlement (trade #{})",
            outcome.signal,
            if outcome.won { "WIN" } else { "LOSS" },
            state.trade_count
        );

        Ok(state.weights.clone())
    }

    /// Restore every analyst to the neutral weight and persist
    pub fn reset(&self) -> Result<WeightTable, PersistenceError> {
        let mut state = self.lock()?;
        let document = WeightDocument {
            weights: WeightTable::with_defaults(self.names.iter().cloned()),
            trade_count: 0,
            updated_at: Some(Utc::now()),
        };

        self.write(&document)?;
        *state = document;

        tracing::info!("Reset {} analyst weights to {}", state.weights.len(), DEFAULT_WEIGHT);
        Ok(state.weights.clone())
    }

    fn write(&self, document: &WeightDocument) -> Result<(), PersistenceError> {
        let raw = serde_json::to_string_pretty(document)?;
        self.backend.save(&raw)
    }
}

impl std::fmt::Debug for WeightStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeightStore")
            .field("backend", &self.backend.describe())
            .field("names", &self.names)
            .finish()
    }
}

fn read_document(backend: &dyn WeightBackend, learner: &Learner, names: &[String]) -> WeightDocument {
    let defaults = || WeightDocument {
        weights: WeightTable::with_defaults(names.iter().cloned()),
        ..WeightDocument::default()
    };

    let raw = match backend.load() {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            tracing::debug!("No stored weights at {}, starting neutral", backend.describe());
            return defaults();
        }
        Err(e) => {
            tracing::warn!(
                "⚠️  Could not read weights from {}, using defaults: {}",
                backend.describe(),
                e
            );
            return defaults();
        }
    };

    match serde_json::from_str::<WeightDocument>(&raw) {
        Ok(mut document) => {
            document.weights = sanitize(document.weights, learner, names);
            document
        }
        Err(e) => {
            tracing::warn!(
                "⚠️  Stored weights at {} are corrupt, resetting to defaults: {}",
                backend.describe(),
                e
            );
            defaults()
        }
    }
}

/// Bound every weight and fill in analysts missing from the table
fn sanitize(mut table: WeightTable, learner: &Learner, names: &[String]) -> WeightTable {
    for (_, weight) in table.iter_mut() {
        *weight = learner.bound(*weight);
    }
    for name in names {
        if !table.contains(name) {
            table.set(name.clone(), DEFAULT_WEIGHT);
        }
    }
    table
}
