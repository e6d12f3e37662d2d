use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use redb::{Database, ReadableTable, ReadableTableMetadata, TableDefinition};
use serde_json::Value;

use super::{PayloadStore, WebhookLog};

pub(crate) const WEBHOOK_LOGS: TableDefinition<u64, &[u8]> = TableDefinition::new("webhook_logs");
pub(crate) const META: TableDefinition<&str, u64> = TableDefinition::new("meta");

const NEXT_ID: &str = "next_id";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("open database: {0}")]
    Database(#[from] redb::DatabaseError),
    #[error("begin transaction: {0}")]
    Transaction(#[from] redb::TransactionError),
    #[error("open table: {0}")]
    Table(#[from] redb::TableError),
    #[error("storage: {0}")]
    Storage(#[from] redb::StorageError),
    #[error("commit: {0}")]
    Commit(#[from] redb::CommitError),
    #[error("encode record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// redb-backed webhook log. Cheap to clone; all clones share one database.
#[derive(Clone)]
pub struct Store {
    db: Arc<Database>,
}

impl Store {
    /// Open (or create) the database file and make sure both tables exist.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let db = Database::create(path)?;

        let write_txn = db.begin_write()?;
        {
            write_txn.open_table(WEBHOOK_LOGS)?;
            write_txn.open_table(META)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    pub fn get(&self, id: u64) -> Result<Option<WebhookLog>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(WEBHOOK_LOGS)?;

        match table.get(id)? {
            Some(v) => Ok(Some(serde_json::from_slice(v.value())?)),
            None => Ok(None),
        }
    }

    /// Newest records first, at most `limit` of them.
    pub fn list(&self, limit: usize) -> Result<Vec<WebhookLog>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(WEBHOOK_LOGS)?;

        let mut logs = Vec::new();
        for item in table.iter()?.rev().take(limit) {
            let (_k, v) = item?;
            logs.push(serde_json::from_slice(v.value())?);
        }
        Ok(logs)
    }

    pub fn count(&self) -> Result<u64, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(WEBHOOK_LOGS)?;
        Ok(table.len()?)
    }
}

impl PayloadStore for Store {
    fn create(&self, payload: &Value) -> Result<WebhookLog, StoreError> {
        // redb serializes write transactions, so the counter read and bump
        // below cannot interleave with another insert.
        let write_txn = self.db.begin_write()?;
        let log = {
            let mut meta = write_txn.open_table(META)?;
            let id = meta.get(NEXT_ID)?.map(|v| v.value()).unwrap_or(1);
            meta.insert(NEXT_ID, id + 1)?;

            let log = WebhookLog::new(id, payload.clone(), now());
            let bytes = serde_json::to_vec(&log)?;

            let mut table = write_txn.open_table(WEBHOOK_LOGS)?;
            table.insert(id, bytes.as_slice())?;
            log
        };
        write_txn.commit()?;
        Ok(log)
    }
}

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
