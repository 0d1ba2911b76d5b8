//! # Schemas
//!
//! JSON Schema descriptors for the application's object shapes. They describe
//! whole Graffiti objects (`value`, `actor`, ...) and are handed to the store,
//! which does the validating and filtering.

use serde_json::{json, Value};

/// Channels the gallery reads from and writes to.
pub const CHANNELS: &[&str] = &["ui-hall-of-fame-or-shame"];

pub fn default_channels() -> Vec<String> {
    CHANNELS.iter().map(|c| c.to_string()).collect()
}

/// Submission objects: every field but `urls` and `attachments` is required
/// and `tags` must name a verdict.
pub fn submission_schema() -> Value {
    json!({
        "properties": {
            "value": {
                "required": ["title", "content", "createdAt", "tags"],
                "properties": {
                    "title": { "type": "string" },
                    "content": { "type": "string" },
                    "createdAt": { "type": "number" },
                    "tags": {
                        "type": "array",
                        "items": { "type": "string" },
                        "contains": { "enum": ["fame", "shame"] }
                    },
                    "urls": {
                        "type": "array",
                        "items": { "type": "string" }
                    },
                    "attachments": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "required": ["image"],
                            "properties": {
                                "image": { "type": "string" },
                                "alt": { "type": "string" }
                            }
                        }
                    }
                }
            }
        }
    })
}

/// Optional narrowing of [`like_schema`] for queries.
#[derive(Debug, Clone, Default)]
pub struct LikeSchemaOptions {
    /// Only likes pointing at these URIs
    pub targets: Option<Vec<String>>,
    /// Only likes made by these actors
    pub actors: Option<Vec<String>>,
}

pub fn like_schema(options: &LikeSchemaOptions) -> Value {
    let mut target = json!({ "type": "string" });
    if let Some(targets) = &options.targets {
        target["enum"] = json!(targets);
    }

    let mut actor = json!({});
    if let Some(actors) = &options.actors {
        actor["enum"] = json!(actors);
    }

    json!({
        "properties": {
            "value": {
                "required": ["activity", "target"],
                "properties": {
                    "activity": { "type": "string", "enum": ["like"] },
                    "target": target
                }
            },
            "actor": actor
        }
    })
}

pub fn file_schema() -> Value {
    json!({
        "properties": {
            "value": {
                "required": ["data", "name", "mimetype"],
                "properties": {
                    "data": { "type": "string" },
                    "name": { "type": "string" },
                    "mimetype": { "type": "string" }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(value: Value) -> Value {
        json!({
            "url": "graffiti:local:alice:1",
            "actor": "alice",
            "value": value,
            "channels": ["ui-hall-of-fame-or-shame"],
            "lastModified": 0
        })
    }

    fn valid_submission() -> Value {
        json!({
            "title": "Modal inside a modal",
            "content": "Two close buttons, neither works.",
            "createdAt": 1_700_000_000_000_i64,
            "tags": ["shame", "modals"]
        })
    }

    fn accepts(schema: &Value, instance: &Value) -> bool {
        jsonschema::validator_for(schema)
            .expect("schema compiles")
            .is_valid(instance)
    }

    #[test]
    fn submission_schema_accepts_complete_submission() {
        let mut value = valid_submission();
        value["urls"] = json!(["https://example.com"]);
        value["attachments"] = json!([{ "image": "graffiti:local:alice:2", "alt": "screenshot" }]);
        assert!(accepts(&submission_schema(), &object(value)));
    }

    #[test]
    fn submission_schema_rejects_each_missing_field() {
        for field in ["title", "content", "createdAt", "tags"] {
            let mut value = valid_submission();
            value.as_object_mut().unwrap().remove(field);
            assert!(
                !accepts(&submission_schema(), &object(value)),
                "missing {field} should be rejected"
            );
        }
    }

    #[test]
    fn submission_schema_requires_a_verdict_tag() {
        let mut value = valid_submission();
        value["tags"] = json!(["modals"]);
        assert!(!accepts(&submission_schema(), &object(value.clone())));

        value["tags"] = json!(["modals", "fame"]);
        assert!(accepts(&submission_schema(), &object(value)));
    }

    #[test]
    fn submission_schema_rejects_attachment_without_image() {
        let mut value = valid_submission();
        value["attachments"] = json!([{ "alt": "nothing to see" }]);
        assert!(!accepts(&submission_schema(), &object(value)));
    }

    #[test]
    fn like_schema_narrows_targets_and_actors() {
        let like = object(json!({ "activity": "like", "target": "graffiti:local:bob:9" }));

        assert!(accepts(&like_schema(&LikeSchemaOptions::default()), &like));

        let other_target = LikeSchemaOptions {
            targets: Some(vec!["graffiti:local:bob:10".into()]),
            actors: None,
        };
        assert!(!accepts(&like_schema(&other_target), &like));

        let other_actor = LikeSchemaOptions {
            targets: None,
            actors: Some(vec!["carol".into()]),
        };
        assert!(!accepts(&like_schema(&other_actor), &like));

        let matching = LikeSchemaOptions {
            targets: Some(vec!["graffiti:local:bob:9".into()]),
            actors: Some(vec!["alice".into()]),
        };
        assert!(accepts(&like_schema(&matching), &like));
    }

    #[test]
    fn like_schema_rejects_other_activities() {
        let dislike = object(json!({ "activity": "dislike", "target": "x" }));
        assert!(!accepts(&like_schema(&LikeSchemaOptions::default()), &dislike));
    }

    #[test]
    fn file_schema_requires_all_fields() {
        let file = object(json!({ "data": "data:text/plain;base64,aGk=", "name": "hi.txt", "mimetype": "text/plain" }));
        assert!(accepts(&file_schema(), &file));

        let nameless = object(json!({ "data": "data:,hi", "mimetype": "text/plain" }));
        assert!(!accepts(&file_schema(), &nameless));
    }
}
