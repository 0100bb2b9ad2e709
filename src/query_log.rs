//! Append-only log of analyses, persisted in a fjall keyspace
//!
//! Records are postcard-encoded under big-endian id keys. A counter key holds
//! the last assigned id. Each append writes record and counter in one atomic
//! batch while holding an async mutex, so ids are unique and the counter never
//! points past the last stored record.

use async_trait::async_trait;
use chrono::Utc;
use fjall::Keyspace;
use std::path::Path;
use tokio::sync::Mutex;
use tokio::task;

use crate::models::{LogRecord, UhiReport};
use crate::{Result, UrbanHeatError};

const RECORD_PREFIX: &[u8] = b"record:";
const LAST_ID_KEY: &[u8] = b"meta:last_id";

/// Sink for analysis records
#[async_trait]
pub trait QueryLog: Send + Sync {
    /// Persist one analysis; the log assigns id and timestamp
    async fn append(&self, query: &str, report: &UhiReport) -> Result<LogRecord>;

    /// Up to `limit` records, newest first
    async fn recent(&self, limit: usize) -> Result<Vec<LogRecord>>;

    /// Number of records appended so far
    async fn count(&self) -> Result<u64>;
}

fn record_key(id: u64) -> Vec<u8> {
    let mut key = RECORD_PREFIX.to_vec();
    key.extend_from_slice(&id.to_be_bytes());
    key
}

fn get_from_store(store: Keyspace, key: Vec<u8>) -> fjall::Result<Option<Vec<u8>>> {
    Ok(store.get(key)?.map(|v| v.to_vec()))
}

fn read_last_id(store: &Keyspace) -> Result<u64> {
    match store.get(LAST_ID_KEY)? {
        Some(bytes) => {
            let raw: [u8; 8] = bytes.to_vec().try_into().map_err(|_| {
                UrbanHeatError::storage(format!("corrupt id counter ({} bytes)", bytes.len()))
            })?;
            Ok(u64::from_be_bytes(raw))
        }
        None => Ok(0),
    }
}

pub struct FjallQueryLog {
    db: fjall::Database,
    store: Keyspace,
    last_id: Mutex<u64>,
}

impl FjallQueryLog {
    /// Open (or create) the log database at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = fjall::Database::builder(&path).open()?;
        let store = db.keyspace("searches", fjall::KeyspaceCreateOptions::default)?;
        let last_id = read_last_id(&store)?;
        tracing::info!(
            "Opened query log at {} ({} records)",
            path.as_ref().display(),
            last_id
        );
        Ok(Self {
            db,
            store,
            last_id: Mutex::new(last_id),
        })
    }

    async fn get(&self, id: u64) -> Result<Option<LogRecord>> {
        let store = self.store.clone();
        let key = record_key(id);

        let maybe_bytes = task::spawn_blocking(move || get_from_store(store, key)).await??;

        match maybe_bytes {
            Some(bytes) => Ok(Some(postcard::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl QueryLog for FjallQueryLog {
    #[tracing::instrument(name = "append_query_log", level = "debug", skip(self, report))]
    async fn append(&self, query: &str, report: &UhiReport) -> Result<LogRecord> {
        let mut last_id = self.last_id.lock().await;
        let id = *last_id + 1;

        let record = LogRecord {
            id,
            query: query.to_string(),
            report: report.clone(),
            created_at: Utc::now(),
        };
        let bytes = postcard::to_stdvec(&record)?;

        let db = self.db.clone();
        let store = self.store.clone();
        task::spawn_blocking(move || -> fjall::Result<()> {
            let mut batch = db.batch();
            batch.insert(&store, record_key(id), bytes);
            batch.insert(&store, LAST_ID_KEY.to_vec(), id.to_be_bytes().to_vec());
            batch.commit()
        })
        .await??;

        *last_id = id;
        tracing::debug!("Logged analysis #{}", id);
        Ok(record)
    }

    async fn recent(&self, limit: usize) -> Result<Vec<LogRecord>> {
        let last_id = *self.last_id.lock().await;
        let mut records = Vec::with_capacity(limit.min(last_id as usize));

        let mut id = last_id;
        while id > 0 && records.len() < limit {
            if let Some(record) = self.get(id).await? {
                records.push(record);
            }
            id -= 1;
        }

        Ok(records)
    }

    async fn count(&self) -> Result<u64> {
        Ok(*self.last_id.lock().await)
    }
}
