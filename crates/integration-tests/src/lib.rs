//! Shared fixtures for the integration tests.

use std::sync::Arc;

use axum::Router;
use hof_api::{configure_routes, AppState};
use hof_core::models::{GraffitiObject, ObjectDraft, Session, Submission};
use hof_core::traits::Graffiti;
use hof_graffiti_local::LocalGraffiti;

pub const CHANNEL: &str = "test-hall";
pub const BOUNDARY: &str = "hof-test-boundary";

pub fn channels() -> Vec<String> {
    vec![CHANNEL.to_string()]
}

pub fn session(actor: &str) -> Session {
    Session::new(actor).expect("valid actor")
}

/// A fresh in-memory store.
pub fn store() -> Arc<LocalGraffiti> {
    Arc::new(LocalGraffiti::new())
}

/// The full router over a fresh store, plus the store for direct inspection.
pub fn test_app() -> (Router, Arc<LocalGraffiti>) {
    let store = store();
    let graffiti: Arc<dyn Graffiti> = store.clone();
    let state = Arc::new(AppState::new(graffiti, channels(), 1024 * 1024));
    (configure_routes(state), store)
}

/// Like [`test_app`], keeping at most `capacity` files decoded at once.
pub fn test_app_with_file_capacity(capacity: usize) -> (Router, Arc<LocalGraffiti>) {
    let store = store();
    let graffiti: Arc<dyn Graffiti> = store.clone();
    let state = Arc::new(
        AppState::new(graffiti, channels(), 1024 * 1024).with_file_capacity(capacity),
    );
    (configure_routes(state), store)
}

pub fn submission(title: &str, verdict: &str, created_at: i64) -> Submission {
    Submission {
        title: title.to_string(),
        content: format!("{title}, in detail"),
        created_at,
        tags: vec![verdict.to_string()],
        urls: None,
        attachments: None,
    }
}

pub async fn put_submission(
    store: &LocalGraffiti,
    actor: &str,
    submission: &Submission,
) -> GraffitiObject {
    store
        .put(
            ObjectDraft::new(submission, channels()).expect("serializable"),
            &session(actor),
        )
        .await
        .expect("put succeeds")
}

/// A file part to include in [`multipart_body`].
pub struct FilePart<'a> {
    pub field: &'a str,
    pub file_name: &'a str,
    pub content_type: &'a str,
    pub bytes: &'a [u8],
}

/// Encodes `multipart/form-data` with [`BOUNDARY`].
pub fn multipart_body(fields: &[(&str, &str)], files: &[FilePart<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    for file in files {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                file.field, file.file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", file.content_type).as_bytes());
        body.extend_from_slice(file.bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}
