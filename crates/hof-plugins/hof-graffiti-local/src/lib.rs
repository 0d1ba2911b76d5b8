//! # hof-graffiti-local
//!
//! In-process implementation of `Graffiti`.
//! Features: schema-filtered queries, owner-checked replacement, change
//! broadcasts and an optional JSON snapshot on disk.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use dashmap::DashMap;
use hof_core::error::{AppError, Result};
use hof_core::models::{GraffitiObject, Locator, ObjectDraft, Session, LOCAL_SOURCE};
use hof_core::traits::{Graffiti, ObjectChange};
use serde_json::Value;
use tokio::fs;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};
use uuid::Uuid;

const CHANGE_BUFFER: usize = 256;

pub struct LocalGraffiti {
    objects: DashMap<String, GraffitiObject>,
    changes: broadcast::Sender<ObjectChange>,
    /// Snapshot file rewritten after every put (e.g., "./data/objects.json")
    snapshot: Option<PathBuf>,
    /// Serializes puts so the snapshot and the map change together
    write_lock: Mutex<()>,
}

impl Default for LocalGraffiti {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalGraffiti {
    /// A store that lives only as long as the process.
    pub fn new() -> Self {
        Self {
            objects: DashMap::new(),
            changes: broadcast::channel(CHANGE_BUFFER).0,
            snapshot: None,
            write_lock: Mutex::new(()),
        }
    }

    /// Loads `path` if it exists and keeps it up to date afterwards.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let store = Self {
            snapshot: Some(path.clone()),
            ..Self::new()
        };

        match fs::read(&path).await {
            Ok(raw) => {
                let objects: Vec<GraffitiObject> = serde_json::from_slice(&raw)
                    .map_err(|e| AppError::Internal(format!("reading {}: {e}", path.display())))?;
                info!(path = %path.display(), count = objects.len(), "loaded object snapshot");
                for object in objects {
                    store.objects.insert(object.url.clone(), object);
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no snapshot yet, starting empty");
            }
            Err(e) => return Err(AppError::Internal(format!("reading {}: {e}", path.display()))),
        }

        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    fn mint_url(actor: &str) -> String {
        format!("{LOCAL_SOURCE}:{actor}:{}", Uuid::now_v7())
    }

    /// Writes the map, with `pending` in place of any object sharing its URL,
    /// to a sibling temp file, then renames it over the snapshot. Callers hold
    /// `write_lock`.
    async fn persist_with(&self, pending: &GraffitiObject) -> Result<()> {
        let Some(path) = &self.snapshot else {
            return Ok(());
        };

        let mut objects: Vec<GraffitiObject> = self
            .objects
            .iter()
            .filter(|entry| entry.key() != &pending.url)
            .map(|entry| entry.value().clone())
            .collect();
        objects.push(pending.clone());
        objects.sort_by(|a, b| a.url.cmp(&b.url));
        let raw = serde_json::to_vec(&objects)
            .map_err(|e| AppError::Internal(format!("encoding snapshot: {e}")))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(io_error(parent))?;
        }
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, raw).await.map_err(io_error(&tmp))?;
        fs::rename(&tmp, path).await.map_err(io_error(path))?;
        Ok(())
    }
}

fn io_error(path: &Path) -> impl Fn(std::io::Error) -> AppError + '_ {
    move |e| AppError::Internal(format!("writing {}: {e}", path.display()))
}

fn compile(schema: &Value) -> Result<jsonschema::Validator> {
    jsonschema::validator_for(schema).map_err(|e| AppError::ValidationError(format!("invalid schema: {e}")))
}

fn matches(validator: &jsonschema::Validator, object: &GraffitiObject) -> bool {
    match serde_json::to_value(object) {
        Ok(instance) => validator.is_valid(&instance),
        Err(_) => false,
    }
}

#[async_trait]
impl Graffiti for LocalGraffiti {
    async fn get(
        &self,
        locator: &Locator,
        schema: &Value,
        _session: Option<&Session>,
    ) -> Result<GraffitiObject> {
        let uri = locator.uri();
        let validator = compile(schema)?;
        let object = self
            .objects
            .get(&uri)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AppError::NotFound("object".to_string(), uri.clone()))?;

        if !matches(&validator, &object) {
            return Err(AppError::SchemaMismatch(uri));
        }
        Ok(object)
    }

    async fn discover(&self, channels: &[String], schema: &Value) -> Result<Vec<GraffitiObject>> {
        let validator = compile(schema)?;
        let mut found: Vec<GraffitiObject> = self
            .objects
            .iter()
            .filter(|entry| entry.channels.iter().any(|c| channels.contains(c)))
            .filter(|entry| matches(&validator, entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        found.sort_by(|a, b| b.last_modified.cmp(&a.last_modified).then_with(|| b.url.cmp(&a.url)));
        Ok(found)
    }

    async fn put(&self, draft: ObjectDraft, session: &Session) -> Result<GraffitiObject> {
        let _guard = self.write_lock.lock().await;
        let url = match draft.url {
            Some(url) => {
                let owner = self
                    .objects
                    .get(&url)
                    .map(|entry| entry.actor.clone())
                    .ok_or_else(|| AppError::NotFound("object".to_string(), url.clone()))?;
                if owner != session.actor {
                    warn!(%url, actor = %session.actor, "refusing to replace another actor's object");
                    return Err(AppError::Unauthorized(format!(
                        "{url} belongs to {owner}"
                    )));
                }
                url
            }
            None => Self::mint_url(&session.actor),
        };

        let object = GraffitiObject {
            url: url.clone(),
            actor: session.actor.clone(),
            value: draft.value,
            channels: draft.channels,
            last_modified: chrono::Utc::now().timestamp_millis(),
        };
        // Only a snapshot that made it to disk becomes visible
        self.persist_with(&object).await?;
        self.objects.insert(url.clone(), object.clone());

        debug!(%url, channels = ?object.channels, "object stored");
        // No receivers is fine
        let _ = self.changes.send(ObjectChange {
            url,
            channels: object.channels.clone(),
        });
        Ok(object)
    }

    fn subscribe(&self) -> broadcast::Receiver<ObjectChange> {
        self.changes.subscribe()
    }
}
