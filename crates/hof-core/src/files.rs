//! # Files
//!
//! Files travel through the object store as data URLs. This module converts
//! between bytes and [`FileValue`]s, uploads files, and keeps a polled file
//! decoded behind an object URL.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::watch;
use tracing::{debug, instrument};

use crate::error::{AppError, Result};
use crate::models::{FileValue, LocalFile, Locator, ObjectDraft, Session};
use crate::object_url::ObjectUrls;
use crate::schemas::file_schema;
use crate::traits::Graffiti;

const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

/// Reads `reader` to the end and wraps it as a data URL.
///
/// Fails when the read fails or when `mimetype` cannot appear in a data URL.
/// The data URL carries only the essence (`type/subtype`) of `mimetype`; the
/// value keeps it verbatim. An empty `mimetype` is encoded as
/// `application/octet-stream`.
pub async fn file_to_base64<R>(mut reader: R, name: &str, mimetype: &str) -> Result<FileValue>
where
    R: AsyncRead + Unpin,
{
    let mut payload = Vec::new();
    reader
        .read_to_end(&mut payload)
        .await
        .map_err(|e| AppError::FileRead(format!("{name}: {e}")))?;

    // Parameters stay in the value only; a quoted `,` would end the header early
    let media_type = if mimetype.is_empty() {
        FALLBACK_MEDIA_TYPE.to_string()
    } else {
        mimetype
            .parse::<mime::Mime>()
            .map_err(|_| AppError::FileRead(format!("{name}: {mimetype:?} is not a media type")))?
            .essence_str()
            .to_string()
    };

    Ok(FileValue {
        data: format!("data:{media_type};base64,{}", STANDARD.encode(&payload)),
        name: name.to_string(),
        mimetype: mimetype.to_string(),
    })
}

/// Encodes an in-memory file.
pub async fn encode_file(file: &LocalFile) -> Result<FileValue> {
    file_to_base64(file.bytes.as_ref(), &file.name, &file.mimetype).await
}

/// Decodes the data URL back into bytes, keeping the stored name and type.
pub fn file_from_base64(value: &FileValue) -> Result<LocalFile> {
    let rest = value
        .data
        .strip_prefix("data:")
        .ok_or_else(|| AppError::InvalidDataUrl(format!("{}: missing data: scheme", value.name)))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| AppError::InvalidDataUrl(format!("{}: missing payload", value.name)))?;

    let bytes = if meta.ends_with(";base64") {
        STANDARD
            .decode(payload.trim())
            .map_err(|e| AppError::InvalidDataUrl(format!("{}: {e}", value.name)))?
    } else {
        urlencoding::decode_binary(payload.as_bytes()).into_owned()
    };

    Ok(LocalFile::new(value.name.clone(), value.mimetype.clone(), bytes))
}

/// Stores `file` outside any channel and returns its URI.
#[instrument(skip_all, fields(name = %file.name, actor = %session.actor))]
pub async fn upload_file(graffiti: &dyn Graffiti, file: &LocalFile, session: &Session) -> Result<String> {
    let value = encode_file(file).await?;
    let stored = graffiti.put(ObjectDraft::new(&value, Vec::new())?, session).await?;
    debug!(url = %stored.url, size = file.bytes.len(), "file uploaded");
    Ok(stored.url)
}

/// Where a [`GetFile`] stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileState {
    /// Not polled yet
    Pending,
    /// No such object, or it is not a file
    Missing,
    Ready(LocalFile),
}

/// A single file object kept decoded behind an object URL.
///
/// A `poll` that finds different content replaces the file and revokes the
/// previous URL; the last URL is revoked on drop.
pub struct GetFile {
    graffiti: Arc<dyn Graffiti>,
    locator: Locator,
    session: Option<Session>,
    urls: Arc<ObjectUrls>,
    state: watch::Sender<FileState>,
    url: watch::Sender<Option<String>>,
    polling: AtomicBool,
}

impl GetFile {
    pub fn new(
        graffiti: Arc<dyn Graffiti>,
        locator: impl Into<Locator>,
        session: Option<Session>,
        urls: Arc<ObjectUrls>,
    ) -> Self {
        Self {
            graffiti,
            locator: locator.into(),
            session,
            urls,
            state: watch::channel(FileState::Pending).0,
            url: watch::channel(None).0,
            polling: AtomicBool::new(false),
        }
    }

    /// Fetches the object again and re-derives the file and its URL.
    pub async fn poll(&self) -> Result<()> {
        self.polling.store(true, Ordering::SeqCst);
        let fetched = self.fetch().await;
        self.polling.store(false, Ordering::SeqCst);

        let next = match fetched {
            Ok(file) => FileState::Ready(file),
            Err(AppError::NotFound(..)) | Err(AppError::SchemaMismatch(_)) => FileState::Missing,
            Err(e) => return Err(e),
        };
        self.replace(next);
        Ok(())
    }

    pub fn is_polling(&self) -> bool {
        self.polling.load(Ordering::SeqCst)
    }

    pub fn file(&self) -> FileState {
        self.state.borrow().clone()
    }

    /// URL of the current file, if there is one.
    pub fn file_url(&self) -> Option<String> {
        self.url.borrow().clone()
    }

    async fn fetch(&self) -> Result<LocalFile> {
        let object = self
            .graffiti
            .get(&self.locator, &file_schema(), self.session.as_ref())
            .await?
            .decode::<FileValue>()?;
        file_from_base64(&object.value)
    }

    fn replace(&self, next: FileState) {
        // Same content, same URL
        if *self.state.borrow() == next {
            return;
        }
        let url = match &next {
            FileState::Ready(file) => Some(self.urls.create(file.clone())),
            _ => None,
        };
        if let Some(previous) = self.url.send_replace(url) {
            self.urls.revoke(&previous);
        }
        self.state.send_replace(next);
    }
}

impl Drop for GetFile {
    fn drop(&mut self) {
        if let Some(url) = self.url.borrow().as_ref() {
            self.urls.revoke(url);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[tokio::test]
    async fn round_trip_preserves_name_type_and_bytes() {
        let bytes: Vec<u8> = (0..=255).collect();
        let value = file_to_base64(&bytes[..], "palette.png", "image/png")
            .await
            .unwrap();
        assert!(value.data.starts_with("data:image/png;base64,"));

        let file = file_from_base64(&value).unwrap();
        assert_eq!(file.name, "palette.png");
        assert_eq!(file.mimetype, "image/png");
        assert_eq!(file.bytes.as_ref(), &bytes[..]);
    }

    #[tokio::test]
    async fn parameters_stay_out_of_the_data_url() {
        let mimetype = "text/plain; name=\"a,b\"";
        let value = file_to_base64(&b"hello"[..], "a.txt", mimetype).await.unwrap();
        assert!(value.data.starts_with("data:text/plain;base64,"));

        let file = file_from_base64(&value).unwrap();
        assert_eq!(file.mimetype, mimetype);
        assert_eq!(file.bytes.as_ref(), b"hello");
    }

    #[tokio::test]
    async fn reads_through_async_reader() {
        let reader = tokio_test::io::Builder::new()
            .read(b"hello ")
            .read(b"world")
            .build();
        let value = file_to_base64(reader, "greeting.txt", "text/plain").await.unwrap();
        let file = file_from_base64(&value).unwrap();
        assert_eq!(file.bytes.as_ref(), b"hello world");
    }

    #[tokio::test]
    async fn failed_read_rejects() {
        let reader = tokio_test::io::Builder::new()
            .read(b"partial")
            .read_error(io::Error::new(io::ErrorKind::BrokenPipe, "disk gone"))
            .build();
        let err = file_to_base64(reader, "broken.bin", "").await.unwrap_err();
        assert!(matches!(err, AppError::FileRead(_)));
    }

    #[tokio::test]
    async fn unencodable_media_type_rejects() {
        let err = file_to_base64(&b"x"[..], "odd.bin", "not a type")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::FileRead(_)));
    }

    #[tokio::test]
    async fn empty_type_survives_round_trip() {
        let value = file_to_base64(&b"raw"[..], "blob", "").await.unwrap();
        assert!(value.data.starts_with("data:application/octet-stream;base64,"));
        let file = file_from_base64(&value).unwrap();
        assert_eq!(file.mimetype, "");
        assert_eq!(file.bytes.as_ref(), b"raw");
    }

    #[test]
    fn percent_encoded_payload_decodes() {
        let value = FileValue {
            data: "data:text/plain,hello%20there".to_string(),
            name: "note.txt".to_string(),
            mimetype: "text/plain".to_string(),
        };
        assert_eq!(file_from_base64(&value).unwrap().bytes.as_ref(), b"hello there");
    }

    #[test]
    fn malformed_data_url_rejects() {
        for data in ["https://example.com/a.png", "data:image/png;base64", "data:image/png;base64,@@@"] {
            let value = FileValue {
                data: data.to_string(),
                name: "a.png".to_string(),
                mimetype: "image/png".to_string(),
            };
            assert!(
                matches!(file_from_base64(&value), Err(AppError::InvalidDataUrl(_))),
                "{data} should be rejected"
            );
        }
    }
}
