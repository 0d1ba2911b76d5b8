//! # Live discovery
//!
//! A `discover` query that remembers its channels and schema, keeps the last
//! result set, and can wait for the store to report a relevant write before
//! recomputing.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{broadcast, watch, Mutex, RwLock};
use tracing::debug;

use crate::error::{AppError, Result};
use crate::models::GraffitiObject;
use crate::traits::{Graffiti, ObjectChange};

pub struct Discovery {
    graffiti: Arc<dyn Graffiti>,
    channels: Vec<String>,
    schema: RwLock<Value>,
    results: watch::Sender<Vec<GraffitiObject>>,
    changes: Mutex<broadcast::Receiver<ObjectChange>>,
}

impl Discovery {
    /// Subscribes immediately so writes made before the first `changed()` are
    /// not missed. Results stay empty until the first `refresh()`.
    pub fn new(graffiti: Arc<dyn Graffiti>, channels: Vec<String>, schema: Value) -> Self {
        let changes = graffiti.subscribe();
        let (results, _) = watch::channel(Vec::new());
        Self {
            graffiti,
            channels,
            schema: RwLock::new(schema),
            results,
            changes: Mutex::new(changes),
        }
    }

    /// Replaces the query schema. Takes effect on the next refresh.
    pub async fn set_schema(&self, schema: Value) {
        *self.schema.write().await = schema;
    }

    pub async fn refresh(&self) -> Result<()> {
        let schema = self.schema.read().await.clone();
        let objects = self.graffiti.discover(&self.channels, &schema).await?;
        debug!(channels = ?self.channels, count = objects.len(), "discovery refreshed");
        self.results.send_replace(objects);
        Ok(())
    }

    /// The most recent result set.
    pub fn results(&self) -> Vec<GraffitiObject> {
        self.results.borrow().clone()
    }

    /// Waits for a write touching one of our channels, then refreshes.
    pub async fn changed(&self) -> Result<()> {
        let mut changes = self.changes.lock().await;
        loop {
            match changes.recv().await {
                Ok(change) if self.is_relevant(&change) => break,
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "discovery lagged behind store changes");
                    break;
                }
                Err(broadcast::error::RecvError::Closed) => {
                    return Err(AppError::Internal("object store closed".to_string()));
                }
            }
        }
        drop(changes);
        self.refresh().await
    }

    fn is_relevant(&self, change: &ObjectChange) -> bool {
        change.channels.iter().any(|c| self.channels.contains(c))
    }
}
