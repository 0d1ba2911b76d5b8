//! # Domain Models
//!
//! Generic Graffiti object envelopes plus the application values layered on
//! top of them: submissions, likes and files.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, Result};

/// URI prefix used by the local object store.
pub const LOCAL_SOURCE: &str = "graffiti:local";

/// A persisted, schema-validated unit of data owned by an actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraffitiObject<T = Value> {
    /// Identifier issued by the store
    pub url: String,
    pub actor: String,
    pub value: T,
    pub channels: Vec<String>,
    /// Epoch milliseconds of the last write
    pub last_modified: i64,
}

impl GraffitiObject<Value> {
    /// Reinterprets the untyped value as an application shape.
    pub fn decode<T: serde::de::DeserializeOwned>(self) -> Result<GraffitiObject<T>> {
        let value = serde_json::from_value(self.value)
            .map_err(|e| AppError::SchemaMismatch(format!("{}: {e}", self.url)))?;
        Ok(GraffitiObject {
            url: self.url,
            actor: self.actor,
            value,
            channels: self.channels,
            last_modified: self.last_modified,
        })
    }
}

/// What callers hand to `put`. A present `url` replaces that object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectDraft {
    pub value: Value,
    pub channels: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl ObjectDraft {
    pub fn new<T: Serialize>(value: &T, channels: Vec<String>) -> Result<Self> {
        let value = serde_json::to_value(value)
            .map_err(|e| AppError::Internal(format!("serializing draft: {e}")))?;
        Ok(Self { value, channels, url: None })
    }

    pub fn replacing(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// An authenticated identity, required for writes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Session {
    pub actor: String,
}

impl Session {
    /// Accepts 1-64 ASCII alphanumerics, `-` or `_`.
    pub fn new(actor: impl Into<String>) -> Result<Self> {
        let actor = actor.into();
        let valid = !actor.is_empty()
            && actor.len() <= 64
            && actor
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(AppError::ValidationError(format!("invalid actor name {actor:?}")));
        }
        Ok(Self { actor })
    }
}

/// Structured address of an object, rendered as `source:actor:name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraffitiLocation {
    pub source: String,
    pub actor: String,
    pub name: String,
}

impl GraffitiLocation {
    pub fn uri(&self) -> String {
        format!("{}:{}:{}", self.source, self.actor, self.name)
    }
}

/// Either form accepted by `get`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Uri(String),
    Location(GraffitiLocation),
}

impl Locator {
    pub fn uri(&self) -> String {
        match self {
            Locator::Uri(uri) => uri.clone(),
            Locator::Location(location) => location.uri(),
        }
    }
}

impl From<&str> for Locator {
    fn from(uri: &str) -> Self {
        Locator::Uri(uri.to_string())
    }
}

impl From<String> for Locator {
    fn from(uri: String) -> Self {
        Locator::Uri(uri)
    }
}

impl From<GraffitiLocation> for Locator {
    fn from(location: GraffitiLocation) -> Self {
        Locator::Location(location)
    }
}

/// Which hall a submission belongs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Fame,
    Shame,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Fame => "fame",
            Verdict::Shame => "shame",
        }
    }
}

impl std::str::FromStr for Verdict {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "fame" => Ok(Verdict::Fame),
            "shame" => Ok(Verdict::Shame),
            other => Err(AppError::ValidationError(format!("unknown verdict {other:?}"))),
        }
    }
}

/// A community-curated example of good or bad UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub title: String,
    pub content: String,
    /// Epoch milliseconds
    pub created_at: i64,
    /// Must contain "fame" or "shame"
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urls: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<Attachment>>,
}

impl Submission {
    /// The first verdict tag, if any. Fame wins when both are present.
    pub fn verdict(&self) -> Option<Verdict> {
        if self.tags.iter().any(|t| t == "fame") {
            Some(Verdict::Fame)
        } else if self.tags.iter().any(|t| t == "shame") {
            Some(Verdict::Shame)
        } else {
            None
        }
    }

    /// Tags other than the verdict.
    pub fn extra_tags(&self) -> impl Iterator<Item = &str> {
        self.tags
            .iter()
            .map(String::as_str)
            .filter(|t| *t != "fame" && *t != "shame")
    }
}

/// An image shown with a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Inline URL or the URI of an uploaded file object
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

impl Attachment {
    /// Whether `image` points at a file object rather than the open web.
    pub fn is_file_reference(&self) -> bool {
        self.image.starts_with("graffiti:")
    }
}

/// A single actor's endorsement of a target object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Like {
    /// Always "like"
    pub activity: String,
    pub target: String,
}

impl Like {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            activity: "like".to_string(),
            target: target.into(),
        }
    }
}

/// A file as stored in the object store: a data URL plus its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileValue {
    pub data: String,
    pub name: String,
    pub mimetype: String,
}

/// A decoded file held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub name: String,
    /// May be empty when the uploader supplied no type
    pub mimetype: String,
    pub bytes: Bytes,
}

impl LocalFile {
    pub fn new(name: impl Into<String>, mimetype: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mimetype: mimetype.into(),
            bytes: bytes.into(),
        }
    }
}
