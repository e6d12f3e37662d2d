pub mod db;
pub mod model;

use serde_json::Value;

pub use db::{Store, StoreError};
pub use model::WebhookLog;

/// Persists accepted webhook payloads.
///
/// `create` returns only after the record is durably committed; on any
/// failure nothing is visible to later reads.
pub trait PayloadStore: Send + Sync {
    fn create(&self, payload: &Value) -> Result<WebhookLog, StoreError>;
}
