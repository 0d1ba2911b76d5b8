//! # hof-api Handlers
//!
//! This module coordinates the flow between HTTP requests, the object store
//! and the page templates.

use std::collections::HashMap;
use std::sync::Arc;

use askama::Template;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use hof_core::error::AppError;
use hof_core::files::{upload_file, GetFile};
use hof_core::likes::LikeTally;
use hof_core::models::{
    Attachment, GraffitiObject, Like, LocalFile, Locator, ObjectDraft, Session, Submission, Verdict,
};
use hof_core::object_url::ObjectUrls;
use hof_core::schemas::{like_schema, submission_schema, LikeSchemaOptions};
use hof_core::traits::Graffiti;
use hof_ui::{
    AttachmentView, GalleryTemplate, SettingsTemplate, SubmissionCard, SubmissionTemplate,
    SubmitForm, SubmitTemplate,
};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};
use crate::live_files::{LiveFiles, DEFAULT_CAPACITY};
use crate::session::{session_cookie, MaybeSession};

/// Where object URLs are served from.
pub const BLOB_PREFIX: &str = "/blob";

/// State shared across all request handlers.
pub struct AppState {
    pub graffiti: Arc<dyn Graffiti>,
    pub object_urls: Arc<ObjectUrls>,
    /// One live file per URI, reused across requests
    pub files: LiveFiles,
    pub channels: Vec<String>,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(graffiti: Arc<dyn Graffiti>, channels: Vec<String>, max_upload_bytes: usize) -> Self {
        Self {
            graffiti,
            object_urls: Arc::new(ObjectUrls::new(BLOB_PREFIX)),
            files: LiveFiles::new(DEFAULT_CAPACITY),
            channels,
            max_upload_bytes,
        }
    }

    /// Caps how many decoded files stay behind object URLs at once.
    pub fn with_file_capacity(mut self, capacity: usize) -> Self {
        self.files = LiveFiles::new(capacity);
        self
    }
}

fn render(template: impl Template) -> ApiResult<Html<String>> {
    template
        .render()
        .map(Html)
        .map_err(|e| ApiError(AppError::Internal(format!("template rendering failed: {e}"))))
}

async fn fetch_submission(
    state: &AppState,
    uri: &str,
    session: Option<&Session>,
) -> ApiResult<GraffitiObject<Submission>> {
    let object = state
        .graffiti
        .get(&Locator::from(uri), &submission_schema(), session)
        .await?;
    Ok(object.decode::<Submission>()?)
}

#[derive(Debug, Deserialize)]
pub struct GalleryQuery {
    pub tag: Option<String>,
}

/// Renders the gallery (e.g., `/?tag=shame`), newest first.
pub async fn gallery(
    State(state): State<Arc<AppState>>,
    session: MaybeSession,
    Query(query): Query<GalleryQuery>,
) -> ApiResult<Html<String>> {
    let filter = match query.tag.as_deref().filter(|t| !t.is_empty()) {
        Some(tag) => Some(tag.parse::<Verdict>()?),
        None => None,
    };

    let mut submissions: Vec<GraffitiObject<Submission>> = state
        .graffiti
        .discover(&state.channels, &submission_schema())
        .await?
        .into_iter()
        .filter_map(|object| object.decode::<Submission>().ok())
        .filter(|object| match filter {
            Some(verdict) => object.value.tags.iter().any(|t| t == verdict.as_str()),
            None => true,
        })
        .collect();
    submissions.sort_by(|a, b| b.value.created_at.cmp(&a.value.created_at));

    let targets = submissions.iter().map(|s| s.url.clone()).collect();
    let tally = LikeTally::new(state.graffiti.clone(), targets, state.channels.clone());
    tally.refresh().await?;
    let counts = tally.count_per_target();

    let cards: Vec<SubmissionCard> = submissions
        .iter()
        .map(|s| SubmissionCard::new(s, counts.get(&s.url).copied().unwrap_or(0)))
        .collect();
    debug!(count = cards.len(), "rendering gallery");

    render(GalleryTemplate {
        title: "Gallery",
        actor: session.actor(),
        filter: filter.map(|v| v.as_str()).unwrap_or(""),
        cards: &cards,
    })
}

/// Renders a single submission with its likes.
pub async fn view_submission(
    State(state): State<Arc<AppState>>,
    session: MaybeSession,
    Path(uri): Path<String>,
) -> ApiResult<Html<String>> {
    let object = fetch_submission(&state, &uri, session.0.as_ref()).await?;

    let tally = LikeTally::new(state.graffiti.clone(), vec![uri.clone()], state.channels.clone());
    tally.refresh().await?;
    let likers: Vec<String> = tally
        .actors_per_target()
        .remove(&uri)
        .map(|actors| actors.into_iter().collect())
        .unwrap_or_default();

    let liked = session.actor().is_some_and(|actor| likers.iter().any(|l| l == actor));
    let can_edit = session.actor() == Some(object.actor.as_str());
    let card = SubmissionCard::new(&object, tally.count(&uri));
    let attachments: Vec<AttachmentView> = object
        .value
        .attachments
        .iter()
        .flatten()
        .map(AttachmentView::new)
        .collect();

    render(SubmissionTemplate {
        title: &object.value.title,
        actor: session.actor(),
        card: &card,
        content: &object.value.content,
        urls: object.value.urls.as_deref().unwrap_or(&[]),
        attachments: &attachments,
        likers: &likers,
        liked,
        can_edit,
    })
}

/// Adds the current actor's like unless one already exists.
pub async fn like_submission(
    State(state): State<Arc<AppState>>,
    session: MaybeSession,
    Path(uri): Path<String>,
) -> ApiResult<Redirect> {
    let session = session.require()?;
    fetch_submission(&state, &uri, Some(&session)).await?;

    let mine = like_schema(&LikeSchemaOptions {
        targets: Some(vec![uri.clone()]),
        actors: Some(vec![session.actor.clone()]),
    });
    let existing = state.graffiti.discover(&state.channels, &mine).await?;
    if existing.is_empty() {
        let draft = ObjectDraft::new(&Like::new(uri.clone()), state.channels.clone())?;
        state.graffiti.put(draft, &session).await?;
        info!(target_uri = %uri, actor = %session.actor, "liked");
    }

    Ok(Redirect::to(&format!("/submission/{uri}")))
}

/// Empty submission form.
pub async fn submit_form(session: MaybeSession) -> ApiResult<Html<String>> {
    render(SubmitTemplate {
        title: "Submit",
        actor: session.actor(),
        action: "/submit",
        form: &SubmitForm::default(),
    })
}

/// Form pre-filled with an existing submission; owner only.
pub async fn edit_form(
    State(state): State<Arc<AppState>>,
    session: MaybeSession,
    Path(uri): Path<String>,
) -> ApiResult<Html<String>> {
    let object = fetch_submission(&state, &uri, session.0.as_ref()).await?;
    if session.actor() != Some(object.actor.as_str()) {
        return Err(AppError::Unauthorized(format!("{uri} belongs to {}", object.actor)).into());
    }

    render(SubmitTemplate {
        title: "Edit submission",
        actor: session.actor(),
        action: &format!("/submit/{uri}"),
        form: &SubmitForm::from_submission(&object.value),
    })
}

pub async fn create_submission(
    State(state): State<Arc<AppState>>,
    session: MaybeSession,
    multipart: Multipart,
) -> ApiResult<Redirect> {
    let session = session.require()?;
    let fields = SubmitFields::read(multipart).await?;
    let created_at = chrono::Utc::now().timestamp_millis();
    let submission = fields.into_submission(&state, &session, created_at).await?;

    let draft = ObjectDraft::new(&submission, state.channels.clone())?;
    let stored = state.graffiti.put(draft, &session).await?;
    info!(url = %stored.url, actor = %session.actor, "submission created");

    Ok(Redirect::to(&format!("/submission/{}", stored.url)))
}

/// Replaces a submission, keeping its original `createdAt`.
pub async fn update_submission(
    State(state): State<Arc<AppState>>,
    session: MaybeSession,
    Path(uri): Path<String>,
    multipart: Multipart,
) -> ApiResult<Redirect> {
    let session = session.require()?;
    let existing = fetch_submission(&state, &uri, Some(&session)).await?;
    if existing.actor != session.actor {
        return Err(AppError::Unauthorized(format!("{uri} belongs to {}", existing.actor)).into());
    }
    let fields = SubmitFields::read(multipart).await?;
    let submission = fields
        .into_submission(&state, &session, existing.value.created_at)
        .await?;

    let draft = ObjectDraft::new(&submission, existing.channels.clone())?.replacing(uri.clone());
    state.graffiti.put(draft, &session).await?;
    info!(url = %uri, actor = %session.actor, "submission updated");

    Ok(Redirect::to(&format!("/submission/{uri}")))
}

/// Polls a file object and redirects to its object URL.
pub async fn file_redirect(
    State(state): State<Arc<AppState>>,
    Path(uri): Path<String>,
) -> ApiResult<Redirect> {
    let file = state.files.get_or_insert_with(&uri, || {
        GetFile::new(
            state.graffiti.clone(),
            uri.as_str(),
            None,
            state.object_urls.clone(),
        )
    });

    file.poll().await?;
    match file.file_url() {
        Some(url) => Ok(Redirect::to(&url)),
        None => {
            state.files.remove(&uri);
            Err(AppError::NotFound("file".to_string(), uri).into())
        }
    }
}

/// Serves the bytes behind an object URL.
pub async fn blob(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> ApiResult<Response> {
    let file = state
        .object_urls
        .resolve(&id)
        .ok_or_else(|| AppError::NotFound("blob".to_string(), id.clone()))?;
    let mimetype = if file.mimetype.is_empty() {
        "application/octet-stream".to_string()
    } else {
        file.mimetype.clone()
    };
    Ok(([(CONTENT_TYPE, mimetype)], file.bytes).into_response())
}

pub async fn settings(
    State(state): State<Arc<AppState>>,
    session: MaybeSession,
) -> ApiResult<Html<String>> {
    render(SettingsTemplate {
        title: "Settings",
        actor: session.actor(),
        channels: &state.channels,
    })
}

#[derive(Debug, Deserialize)]
pub struct SettingsForm {
    #[serde(default)]
    pub actor: String,
}

/// Signs in as `actor`, or out when it is empty.
pub async fn save_settings(Form(form): Form<SettingsForm>) -> ApiResult<Response> {
    let actor = form.actor.trim();
    let session = if actor.is_empty() {
        None
    } else {
        Some(Session::new(actor)?)
    };
    info!(actor = ?session.as_ref().map(|s| &s.actor), "session changed");
    Ok(([session_cookie(session.as_ref())], Redirect::to("/settings")).into_response())
}

/// Everything the submit form posts.
#[derive(Debug, Default)]
struct SubmitFields {
    title: String,
    content: String,
    verdict: String,
    tags: String,
    urls: String,
    alt: String,
    images: Vec<LocalFile>,
    image_urls: Vec<String>,
    keep: Vec<String>,
    keep_alts: HashMap<String, String>,
}

impl SubmitFields {
    async fn read(mut multipart: Multipart) -> ApiResult<Self> {
        let mut fields = SubmitFields::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            if name == "image" {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let mimetype = field
                    .content_type()
                    .map(str::to_string)
                    .filter(|t| !t.is_empty() && t != "application/octet-stream")
                    .or_else(|| mime_guess::from_path(&file_name).first_raw().map(str::to_string))
                    .unwrap_or_default();
                let bytes = field.bytes().await?;
                if !bytes.is_empty() {
                    fields.images.push(LocalFile::new(file_name, mimetype, bytes));
                }
                continue;
            }

            let text = field.text().await?;
            match name.as_str() {
                "title" => fields.title = text,
                "content" => fields.content = text,
                "verdict" => fields.verdict = text,
                "tags" => fields.tags = text,
                "urls" => fields.urls = text,
                "alt" => fields.alt = text,
                "image_url" if !text.trim().is_empty() => fields.image_urls.push(text.trim().to_string()),
                "keep_image" => fields.keep.push(text),
                other => {
                    if let Some(image) = other.strip_prefix("keep_alt:") {
                        fields.keep_alts.insert(image.to_string(), text);
                    }
                }
            }
        }
        Ok(fields)
    }

    /// Validates the text fields, uploads new images and assembles the value.
    async fn into_submission(
        self,
        state: &AppState,
        session: &Session,
        created_at: i64,
    ) -> ApiResult<Submission> {
        let title = self.title.trim().to_string();
        let content = self.content.trim().to_string();
        if title.is_empty() || content.is_empty() {
            return Err(AppError::ValidationError("title and content are required".to_string()).into());
        }
        let verdict: Verdict = self.verdict.trim().parse()?;

        let mut tags = vec![verdict.as_str().to_string()];
        for tag in self.tags.split(',').map(str::trim) {
            if !tag.is_empty() && tag != "fame" && tag != "shame" && !tags.iter().any(|t| t == tag) {
                tags.push(tag.to_string());
            }
        }

        let urls: Vec<String> = self
            .urls
            .lines()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_string)
            .collect();

        let alt = Some(self.alt.trim().to_string()).filter(|a| !a.is_empty());
        let mut attachments: Vec<Attachment> = self
            .keep
            .iter()
            .map(|image| Attachment {
                image: image.clone(),
                alt: self.keep_alts.get(image).cloned().filter(|a| !a.is_empty()),
            })
            .collect();
        for image in &self.images {
            let uri = upload_file(state.graffiti.as_ref(), image, session).await?;
            attachments.push(Attachment { image: uri, alt: alt.clone() });
        }
        for image in self.image_urls {
            attachments.push(Attachment { image, alt: alt.clone() });
        }

        Ok(Submission {
            title,
            content,
            created_at,
            tags,
            urls: Some(urls).filter(|u| !u.is_empty()),
            attachments: Some(attachments).filter(|a| !a.is_empty()),
        })
    }
}
