use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One accepted webhook delivery. Written once, never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookLog {
    pub id: u64,
    pub payload: Value,
    pub created_at: i64,
    pub updated_at: i64,
}

impl WebhookLog {
    pub fn new(id: u64, payload: Value, now: i64) -> Self {
        Self {
            id,
            payload,
            created_at: now,
            updated_at: now,
        }
    }
}
