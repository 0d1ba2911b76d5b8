//! # Core Traits (Ports)
//!
//! Any object store must implement these traits to back the application.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::error::Result;
use crate::models::{GraffitiObject, Locator, ObjectDraft, Session};

/// Emitted by a store after every successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectChange {
    pub url: String,
    pub channels: Vec<String>,
}

/// The object store contract: fetch one, query many, write one.
#[async_trait]
pub trait Graffiti: Send + Sync {
    /// Fetches one object that must conform to `schema`.
    async fn get(
        &self,
        locator: &Locator,
        schema: &Value,
        session: Option<&Session>,
    ) -> Result<GraffitiObject>;

    /// Every object in at least one of `channels` that conforms to `schema`.
    async fn discover(&self, channels: &[String], schema: &Value) -> Result<Vec<GraffitiObject>>;

    /// Persists a draft as `session.actor` and returns the stored object.
    async fn put(&self, draft: ObjectDraft, session: &Session) -> Result<GraffitiObject>;

    /// Change notifications for live queries.
    fn subscribe(&self) -> broadcast::Receiver<ObjectChange>;
}
