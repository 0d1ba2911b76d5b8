//! # Object URLs
//!
//! Revocable URLs for decoded files, the server-side counterpart of a
//! browser's `blob:` URLs. The HTTP layer serves whatever `resolve` returns.

use dashmap::DashMap;
use tracing::trace;
use uuid::Uuid;

use crate::models::LocalFile;

pub struct ObjectUrls {
    /// Public URL prefix (e.g., "/blob")
    prefix: String,
    files: DashMap<Uuid, LocalFile>,
}

impl ObjectUrls {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into().trim_end_matches('/').to_string(),
            files: DashMap::new(),
        }
    }

    /// Registers a file and returns `<prefix>/<id>`.
    pub fn create(&self, file: LocalFile) -> String {
        let id = Uuid::new_v4();
        self.files.insert(id, file);
        trace!(%id, "object url created");
        format!("{}/{}", self.prefix, id)
    }

    /// Looks a file up by the id segment of its URL.
    pub fn resolve(&self, id: &str) -> Option<LocalFile> {
        let id = Uuid::parse_str(id).ok()?;
        self.files.get(&id).map(|entry| entry.value().clone())
    }

    /// Forgets the file behind `url`. Returns whether anything was removed.
    pub fn revoke(&self, url: &str) -> bool {
        let Some(id) = url
            .strip_prefix(&self.prefix)
            .and_then(|rest| rest.strip_prefix('/'))
            .and_then(|id| Uuid::parse_str(id).ok())
        else {
            return false;
        };
        trace!(%id, "object url revoked");
        self.files.remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_resolve_revoke() {
        let urls = ObjectUrls::new("/blob/");
        let url = urls.create(LocalFile::new("a.txt", "text/plain", &b"hi"[..]));

        assert!(url.starts_with("/blob/"));
        let id = url.trim_start_matches("/blob/");
        assert_eq!(urls.resolve(id).map(|f| f.name), Some("a.txt".to_string()));

        assert!(urls.revoke(&url));
        assert!(urls.resolve(id).is_none());
        assert!(!urls.revoke(&url));
    }

    #[test]
    fn foreign_urls_are_ignored() {
        let urls = ObjectUrls::new("/blob");
        urls.create(LocalFile::new("a.txt", "text/plain", &b"hi"[..]));
        assert!(!urls.revoke("https://example.com/blob/nope"));
        assert!(urls.resolve("not-a-uuid").is_none());
        assert_eq!(urls.len(), 1);
    }
}
