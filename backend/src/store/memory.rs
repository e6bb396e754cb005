use std::collections::HashMap;

use async_trait::async_trait;
use shared::Document;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Collection, StoreError};

/// In-memory collection backing the tests. Not a serving mode: task data
/// must outlive the process, so `main` never constructs one.
#[derive(Default)]
pub struct MemoryCollection {
    documents: RwLock<HashMap<String, Document>>,
}

impl MemoryCollection {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Collection for MemoryCollection {
    async fn get(&self, id: &str) -> Result<Option<Document>, StoreError> {
        Ok(self.documents.read().await.get(id).cloned())
    }

    async fn set(&self, id: &str, doc: Document, merge: bool) -> Result<(), StoreError> {
        let mut documents = self.documents.write().await;
        let doc = if merge {
            match documents.get(id) {
                Some(existing) => {
                    let mut current = existing.clone();
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
        documents.insert(id.to_string(), doc);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.documents.write().await.remove(id);
        Ok(())
    }

    async fn all(&self) -> Result<Vec<(String, Document)>, StoreError> {
        Ok(self
            .documents
            .read()
            .await
            .iter()
            .map(|(id, doc)| (id.clone(), doc.clone()))
            .collect())
    }

    fn new_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}
