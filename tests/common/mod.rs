#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use news_etl::domain::{CsvTable, ObjectStore, ObjectSummary, TableSink};
use news_etl::{EtlError, Result};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
struct StoredObject {
    body: Vec<u8>,
    last_modified: DateTime<Utc>,
}

/// In-memory bucket. Every `put_object` gets a timestamp one second after the
/// previous write, so "latest" is deterministic.
#[derive(Debug, Clone)]
pub struct MemoryObjectStore {
    objects: Arc<Mutex<BTreeMap<String, StoredObject>>>,
    clock: Arc<Mutex<DateTime<Utc>>>,
    failing: Arc<AtomicBool>,
    put_calls: Arc<AtomicU32>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self {
            objects: Arc::new(Mutex::new(BTreeMap::new())),
            clock: Arc::new(Mutex::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())),
            failing: Arc::new(AtomicBool::new(false)),
            put_calls: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Every operation fails with a storage error.
    pub fn failing() -> Self {
        let store = Self::new();
        store.failing.store(true, Ordering::SeqCst);
        store
    }

    pub fn insert_at(&self, key: &str, body: &[u8], last_modified: DateTime<Utc>) {
        self.objects.lock().unwrap().insert(
            key.to_string(),
            StoredObject {
                body: body.to_vec(),
                last_modified,
            },
        );
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn body(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(key).map(|o| o.body.clone())
    }

    pub fn put_calls(&self) -> u32 {
        self.put_calls.load(Ordering::SeqCst)
    }

    fn check(&self, operation: &str) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(EtlError::store(operation, "simulated outage"));
        }
        Ok(())
    }

    fn tick(&self) -> DateTime<Utc> {
        let mut clock = self.clock.lock().unwrap();
        *clock += Duration::seconds(1);
        *clock
    }
}

impl ObjectStore for MemoryObjectStore {
    async fn put_object(&self, key: &str, body: Vec<u8>) -> Result<()> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);
        self.check("put_object")?;
        let last_modified = self.tick();
        self.objects.lock().unwrap().insert(
            key.to_string(),
            StoredObject {
                body,
                last_modified,
            },
        );
        Ok(())
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectSummary>> {
        self.check("list_objects")?;
        Ok(self
            .objects
            .lock()
            .unwrap()
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, object)| ObjectSummary {
                key: key.clone(),
                last_modified: object.last_modified,
                size: object.body.len() as i64,
            })
            .collect())
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>> {
        self.check("get_object")?;
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .map(|o| o.body.clone())
            .ok_or_else(|| EtlError::store("get_object", format!("NoSuchKey: {}", key)))
    }

    fn location(&self) -> String {
        "memory://test-bucket".to_string()
    }
}

/// Table sink that keeps the last table written per name.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    tables: Arc<Mutex<HashMap<String, CsvTable>>>,
    calls: Arc<AtomicU32>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self, name: &str) -> Option<CsvTable> {
        self.tables.lock().unwrap().get(name).cloned()
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TableSink for RecordingSink {
    async fn replace_table(&self, table_name: &str, table: &CsvTable) -> Result<u64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.tables
            .lock()
            .unwrap()
            .insert(table_name.to_string(), table.clone());
        Ok(table.row_count() as u64)
    }
}

pub fn write_csv(dir: &std::path::Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}
