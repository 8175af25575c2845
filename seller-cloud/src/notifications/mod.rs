//! Webhook notification ring
//!
//! The marketplace posts change notifications (orders, items, questions).
//! They are kept in a newest-first ring of [`CAPACITY`] entries; older ones
//! are trimmed on every write.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use deadpool_redis::{Pool as RedisPool, redis};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use shared::util::monotonic_id;
use tokio::sync::RwLock;

use crate::kv::{StoreError, keys};

pub const CAPACITY: usize = 100;
pub const DEFAULT_RECENT: usize = 20;
const UNKNOWN_TOPIC: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    /// Time-derived, strictly increasing within the process
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub resource: Option<String>,
    pub raw_payload: Value,
    pub received_at: i64,
    #[serde(default)]
    pub read: bool,
}

fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl NotificationRecord {
    /// Build a record from a webhook delivery.
    ///
    /// The topic comes from the body's `type` or `topic`, falling back to the
    /// query's `topic`; the resource from the body's `resource`, falling back
    /// to the query's `resource_id`.
    pub fn from_webhook(body: Option<Value>, query: &HashMap<String, String>, now: i64) -> Self {
        let field = |name: &str| text(body.as_ref().and_then(|b| b.get(name)));
        let param = |name: &str| query.get(name).filter(|v| !v.trim().is_empty()).cloned();

        let kind = field("type")
            .or_else(|| field("topic"))
            .or_else(|| param("topic"))
            .unwrap_or_else(|| UNKNOWN_TOPIC.to_string());
        let resource = field("resource")
            .or_else(|| param("resource_id"))
            .or_else(|| param("resource"));

        Self {
            id: monotonic_id(),
            kind,
            resource,
            raw_payload: json!({ "body": body, "query": query }),
            received_at: now,
            read: false,
        }
    }
}

#[async_trait]
pub trait NotificationBuffer: Send + Sync {
    /// Prepend a record, trimming the ring to [`CAPACITY`]
    async fn push(&self, record: &NotificationRecord) -> Result<(), StoreError>;
    /// Up to `n` records, newest first
    async fn recent(&self, n: usize) -> Result<Vec<NotificationRecord>, StoreError>;
}

/// Redis list under `ml:notifications`
pub struct RedisNotificationBuffer {
    pool: RedisPool,
}

impl RedisNotificationBuffer {
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationBuffer for RedisNotificationBuffer {
    async fn push(&self, record: &NotificationRecord) -> Result<(), StoreError> {
        let json = serde_json::to_string(record)?;
        let mut conn = self.pool.get().await?;
        let _: () = redis::pipe()
            .atomic()
            .lpush(keys::NOTIFICATIONS, json)
            .ignore()
            .ltrim(keys::NOTIFICATIONS, 0, CAPACITY as isize - 1)
            .ignore()
            .query_async(&mut *conn)
            .await?;
        Ok(())
    }

    async fn recent(&self, n: usize) -> Result<Vec<NotificationRecord>, StoreError> {
        let n = n.min(CAPACITY);
        if n == 0 {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get().await?;
        let raw: Vec<String> = redis::cmd("LRANGE")
            .arg(keys::NOTIFICATIONS)
            .arg(0)
            .arg(n as isize - 1)
            .query_async(&mut *conn)
            .await?;

        Ok(raw
            .iter()
            .filter_map(|json| match serde_json::from_str(json) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping unreadable notification entry");
                    None
                }
            })
            .collect())
    }
}

/// Process-local ring
#[derive(Default)]
pub struct InMemoryNotificationBuffer {
    ring: RwLock<VecDeque<NotificationRecord>>,
}

impl InMemoryNotificationBuffer {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NotificationBuffer for InMemoryNotificationBuffer {
    async fn push(&self, record: &NotificationRecord) -> Result<(), StoreError> {
        let mut ring = self.ring.write().await;
        ring.push_front(record.clone());
        ring.truncate(CAPACITY);
        Ok(())
    }

    async fn recent(&self, n: usize) -> Result<Vec<NotificationRecord>, StoreError> {
        Ok(self.ring.read().await.iter().take(n).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(topic: &str) -> NotificationRecord {
        NotificationRecord::from_webhook(Some(json!({ "topic": topic })), &HashMap::new(), 0)
    }

    #[tokio::test]
    async fn ring_keeps_newest_hundred() {
        let buffer = InMemoryNotificationBuffer::new();
        let mut ids = Vec::new();
        for i in 0..101 {
            let r = record(&format!("orders_v2-{i}"));
            ids.push(r.id);
            buffer.push(&r).await.unwrap();
        }

        let all = buffer.recent(500).await.unwrap();
        assert_eq!(all.len(), CAPACITY);
        assert_eq!(all[0].kind, "orders_v2-100");
        assert_eq!(all[99].kind, "orders_v2-1");
        assert!(all.iter().all(|r| r.id != ids[0]));
    }

    #[tokio::test]
    async fn recent_is_newest_first() {
        let buffer = InMemoryNotificationBuffer::new();
        buffer.push(&record("items")).await.unwrap();
        buffer.push(&record("orders_v2")).await.unwrap();
        buffer.push(&record("questions")).await.unwrap();

        let two = buffer.recent(2).await.unwrap();
        let kinds: Vec<_> = two.iter().map(|r| r.kind.as_str()).collect();
        assert_eq!(kinds, vec!["questions", "orders_v2"]);
        assert!(two[0].id > two[1].id);
        assert!(buffer.recent(0).await.unwrap().is_empty());
    }

    #[test]
    fn webhook_body_wins_over_query() {
        let query = HashMap::from([
            ("topic".to_string(), "items".to_string()),
            ("resource_id".to_string(), "MLB123".to_string()),
        ]);
        let r = NotificationRecord::from_webhook(
            Some(json!({"type": "orders_v2", "resource": "/orders/2000001", "user_id": 7})),
            &query,
            1_700_000_000_000,
        );
        assert_eq!(r.kind, "orders_v2");
        assert_eq!(r.resource.as_deref(), Some("/orders/2000001"));
        assert_eq!(r.received_at, 1_700_000_000_000);
        assert!(!r.read);
        assert_eq!(r.raw_payload["body"]["user_id"], 7);
        assert_eq!(r.raw_payload["query"]["topic"], "items");
    }

    #[test]
    fn webhook_query_fallback() {
        let query = HashMap::from([
            ("topic".to_string(), "items".to_string()),
            ("resource_id".to_string(), "MLB123".to_string()),
        ]);
        let r = NotificationRecord::from_webhook(None, &query, 0);
        assert_eq!(r.kind, "items");
        assert_eq!(r.resource.as_deref(), Some("MLB123"));

        let empty = NotificationRecord::from_webhook(Some(json!({})), &HashMap::new(), 0);
        assert_eq!(empty.kind, "unknown");
        assert_eq!(empty.resource, None);
    }

    #[test]
    fn record_serializes_type_key() {
        let json = serde_json::to_value(record("orders_v2")).unwrap();
        assert_eq!(json["type"], "orders_v2");
        assert!(json.get("receivedAt").is_some());
        assert!(json.get("rawPayload").is_some());
    }
}
