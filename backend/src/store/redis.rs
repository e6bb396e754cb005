use std::sync::Arc;

use async_trait::async_trait;
use redis::{AsyncCommands, Client};
use serde_json::Value;
use shared::Document;
use uuid::Uuid;

use super::{Collection, StoreError};
use crate::config::Config;

/// Redis-backed collection: one key per document under `<collection>:<id>`,
/// the value being the serialized JSON object.
#[derive(Clone)]
pub struct RedisCollection {
    client: Arc<Client>,
    name: String,
}

impl RedisCollection {
    /// Open a client against the configured endpoint. This fails only on an
    /// unusable URL; connections are made per call.
    pub fn connect(config: &Config) -> Result<Self, StoreError> {
        let client = Client::open(config.redis_url.as_str())
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(Self {
            client: Arc::new(client),
            name: config.collection.clone(),
        })
    }

    fn key(&self, id: &str) -> String {
        format!("{}:{}", self.name, id)
    }

    fn pattern(&self) -> String {
        format!("{}:*", self.name)
    }

    async fn connection(&self) -> Result<redis::aio::Connection, StoreError> {
        self.client
            .get_async_connection()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }
}

fn parse_document(raw: &str) -> Result<Document, StoreError> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(doc)) => Ok(doc),
        Ok(_) => Err(StoreError::Malformed(
            "stored value is not a JSON object".to_string(),
        )),
        Err(e) => Err(StoreError::Malformed(e.to_string())),
    }
}

fn unavailable(e: redis::RedisError) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

#[async_trait]
impl Collection for RedisCollection {
    async fn get(&self, id: &str) -> Result<Option<Document>, StoreError> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = conn.get(self.key(id)).await.map_err(unavailable)?;
        raw.as_deref().map(parse_document).transpose()
    }

    async fn set(&self, id: &str, doc: Document, merge: bool) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        let key = self.key(id);
        let doc = if merge {
            // Merge is read-modify-write; document-level races are accepted.
            let existing: Option<String> = conn.get(&key).await.map_err(unavailable)?;
            match existing.as_deref().map(parse_document).transpose()? {
                Some(mut current) => {
                    for (field, value) in doc {
                        current.insert(field, value);
                    }
                    current
                }
                None => doc,
            }
        } else {
            doc
        };
        let payload = serde_json::to_string(&Value::Object(doc))
            .map_err(|e| StoreError::Malformed(e.to_string()))?;
        let _: () = conn.set(&key, payload).await.map_err(unavailable)?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        let _: usize = conn.del(self.key(id)).await.map_err(unavailable)?;
        Ok(())
    }

    async fn all(&self) -> Result<Vec<(String, Document)>, StoreError> {
        let mut conn = self.connection().await?;
        let keys: Vec<String> = conn.keys(self.pattern()).await.map_err(unavailable)?;
        let prefix = format!("{}:", self.name);
        let mut documents = Vec::with_capacity(keys.len());
        for key in keys {
            let raw: Option<String> = conn.get(&key).await.map_err(unavailable)?;
            // The key may have been deleted between KEYS and GET.
            let Some(raw) = raw else { continue };
            let Some(id) = key.strip_prefix(&prefix) else {
                continue;
            };
            match parse_document(&raw) {
                Ok(doc) => documents.push((id.to_string(), doc)),
                Err(e) => tracing::warn!(key = %key, error = %e, "skipping unreadable document"),
            }
        }
        Ok(documents)
    }

    fn new_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}
