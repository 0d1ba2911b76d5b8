//! hall-of-fame/crates/hof-core/src/lib.rs
//!
//! Object shapes, schemas and the store contract for the UI Hall of
//! Fame/Shame, plus the thin wrappers that reshape store results.

pub mod discovery;
pub mod error;
pub mod files;
pub mod likes;
pub mod models;
pub mod object_url;
pub mod schemas;
pub mod traits;

// Re-exporting for easier access in other crates
pub use discovery::*;
pub use error::*;
pub use files::*;
pub use likes::*;
pub use models::*;
pub use object_url::*;
pub use schemas::*;
pub use traits::*;

#[cfg(test)]
mod tests {
    use super::models::*;
    use serde_json::json;

    #[test]
    fn submission_serializes_camel_case_and_skips_empty_options() {
        let submission = Submission {
            title: "Hidden scrollbar".to_string(),
            content: "You cannot tell there is more.".to_string(),
            created_at: 1_700_000_000_000,
            tags: vec!["shame".to_string()],
            urls: None,
            attachments: None,
        };
        assert_eq!(
            serde_json::to_value(&submission).unwrap(),
            json!({
                "title": "Hidden scrollbar",
                "content": "You cannot tell there is more.",
                "createdAt": 1_700_000_000_000_i64,
                "tags": ["shame"]
            })
        );
        assert_eq!(submission.verdict(), Some(Verdict::Shame));
    }

    #[test]
    fn verdict_and_extra_tags() {
        let submission = Submission {
            title: String::new(),
            content: String::new(),
            created_at: 0,
            tags: vec!["forms".into(), "fame".into(), "a11y".into()],
            urls: None,
            attachments: None,
        };
        assert_eq!(submission.verdict(), Some(Verdict::Fame));
        assert_eq!(submission.extra_tags().collect::<Vec<_>>(), vec!["forms", "a11y"]);
    }

    #[test]
    fn decode_reports_schema_mismatch() {
        let object = GraffitiObject {
            url: "graffiti:local:alice:1".to_string(),
            actor: "alice".to_string(),
            value: json!({ "activity": "like" }),
            channels: vec![],
            last_modified: 0,
        };
        assert!(matches!(
            object.decode::<Like>(),
            Err(crate::AppError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn session_rejects_unsafe_actor_names() {
        assert!(Session::new("alice_01").is_ok());
        assert!(Session::new("").is_err());
        assert!(Session::new("alice:bob").is_err());
        assert!(Session::new("a".repeat(65)).is_err());
    }

    #[test]
    fn location_renders_uri() {
        let location = GraffitiLocation {
            source: LOCAL_SOURCE.to_string(),
            actor: "alice".to_string(),
            name: "42".to_string(),
        };
        assert_eq!(Locator::from(location).uri(), "graffiti:local:alice:42");
        assert!(Attachment { image: "graffiti:local:alice:42".into(), alt: None }.is_file_reference());
        assert!(!Attachment { image: "https://example.com/a.png".into(), alt: None }.is_file_reference());
    }
}
