//! # hof-ui
//!
//! Page templates and the view models they render.

use askama::Template;
use chrono::{DateTime, Utc};
use hof_core::models::{Attachment, GraffitiObject, Submission};

/// One submission as shown in lists and on its own page.
#[derive(Debug, Clone)]
pub struct SubmissionCard {
    pub uri: String,
    pub actor: String,
    pub title: String,
    /// "fame", "shame" or empty
    pub verdict: &'static str,
    pub extra_tags: Vec<String>,
    pub likes: usize,
    pub created: String,
}

impl SubmissionCard {
    pub fn new(object: &GraffitiObject<Submission>, likes: usize) -> Self {
        let submission = &object.value;
        Self {
            uri: object.url.clone(),
            actor: object.actor.clone(),
            title: submission.title.clone(),
            verdict: submission.verdict().map(|v| v.as_str()).unwrap_or(""),
            extra_tags: submission.extra_tags().map(str::to_string).collect(),
            likes,
            created: format_millis(submission.created_at),
        }
    }
}

fn format_millis(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_default()
}

#[derive(Debug, Clone)]
pub struct AttachmentView {
    /// As stored: an inline URL or a file URI
    pub image: String,
    /// What an `<img>` should load
    pub src: String,
    pub alt: String,
}

impl AttachmentView {
    /// Uploaded files are served through `/files/{uri}`.
    pub fn new(attachment: &Attachment) -> Self {
        let src = if attachment.is_file_reference() {
            format!("/files/{}", attachment.image)
        } else {
            attachment.image.clone()
        };
        Self {
            image: attachment.image.clone(),
            src,
            alt: attachment.alt.clone().unwrap_or_default(),
        }
    }
}

/// Values the submit form is filled with.
#[derive(Debug, Clone, Default)]
pub struct SubmitForm {
    pub title: String,
    pub content: String,
    pub verdict: String,
    /// Comma separated
    pub tags: String,
    /// One per line
    pub urls: String,
    /// Existing attachments, kept when editing
    pub attachments: Vec<AttachmentView>,
}

impl SubmitForm {
    pub fn from_submission(submission: &Submission) -> Self {
        Self {
            title: submission.title.clone(),
            content: submission.content.clone(),
            verdict: submission
                .verdict()
                .map(|v| v.as_str().to_string())
                .unwrap_or_default(),
            tags: submission.extra_tags().collect::<Vec<_>>().join(", "),
            urls: submission.urls.clone().unwrap_or_default().join("\n"),
            attachments: submission
                .attachments
                .iter()
                .flatten()
                .map(AttachmentView::new)
                .collect(),
        }
    }
}

#[derive(Template)]
#[template(path = "gallery.html")]
pub struct GalleryTemplate<'a> {
    pub title: &'a str,
    pub actor: Option<&'a str>,
    pub filter: &'a str,
    pub cards: &'a [SubmissionCard],
}

#[derive(Template)]
#[template(path = "submission.html")]
pub struct SubmissionTemplate<'a> {
    pub title: &'a str,
    pub actor: Option<&'a str>,
    pub card: &'a SubmissionCard,
    pub content: &'a str,
    pub urls: &'a [String],
    pub attachments: &'a [AttachmentView],
    pub likers: &'a [String],
    pub liked: bool,
    pub can_edit: bool,
}

#[derive(Template)]
#[template(path = "submit.html")]
pub struct SubmitTemplate<'a> {
    pub title: &'a str,
    pub actor: Option<&'a str>,
    /// Where the form posts to
    pub action: &'a str,
    pub form: &'a SubmitForm,
}

#[derive(Template)]
#[template(path = "settings.html")]
pub struct SettingsTemplate<'a> {
    pub title: &'a str,
    pub actor: Option<&'a str>,
    pub channels: &'a [String],
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate<'a> {
    pub title: &'a str,
    pub actor: Option<&'a str>,
    pub status: u16,
    pub message: &'a str,
}
