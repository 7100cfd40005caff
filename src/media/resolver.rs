//! Turns one of the three image inputs into a stored reference, and a stored
//! reference into something a client can fetch.

use axum::body::Bytes;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::Duration;
use rand::Rng;

use crate::error::AppError;
use crate::media::blob_store::BlobStore;
use crate::media::content_type;

const GENERATED_NAME_LEN: usize = 11;
const NAME_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const BASE64_DELIMITER: &str = ";base64,";

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub data: Bytes,
}

/// The image input of a request, after priority selection.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// Stored verbatim.
    Reference(String),
    /// `data:<mime>;base64,<payload>`
    Inline(String),
    Upload(UploadedFile),
}

impl ImageSource {
    /// Picks the first present input in priority order: reference, inline
    /// payload, uploaded file. Empty strings count as absent.
    pub fn select(
        image_str: Option<String>,
        image_b64: Option<String>,
        image_file: Option<UploadedFile>,
    ) -> Option<Self> {
        let present = |s: &Option<String>| s.as_deref().is_some_and(|s| !s.is_empty());

        if present(&image_str) {
            image_str.map(Self::Reference)
        } else if present(&image_b64) {
            image_b64.map(Self::Inline)
        } else {
            image_file.map(Self::Upload)
        }
    }
}

/// Outcome of persisting an image input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    /// Value to persist on the post.
    pub reference: String,
    /// Key of an object written under a generated name, if any.
    pub generated_key: Option<String>,
}

#[derive(Clone, Debug)]
pub struct MediaResolver {
    store: BlobStore,
    signed_url_ttl: Duration,
}

impl MediaResolver {
    pub fn new(store: BlobStore, signed_url_ttl: Duration) -> Self {
        Self {
            store,
            signed_url_ttl,
        }
    }

    pub fn store(&self) -> &BlobStore {
        &self.store
    }

    pub async fn persist(&self, source: Option<ImageSource>) -> Result<Option<StoredImage>, AppError> {
        let Some(source) = source else {
            return Ok(None);
        };

        let stored = match source {
            ImageSource::Reference(reference) => StoredImage {
                reference,
                generated_key: None,
            },
            ImageSource::Inline(data_uri) => self.persist_inline(&data_uri).await?,
            ImageSource::Upload(file) => self.persist_upload(file).await?,
        };
        Ok(Some(stored))
    }

    async fn persist_inline(&self, data_uri: &str) -> Result<StoredImage, AppError> {
        let (mime, bytes) = decode_data_uri(data_uri)?;
        let extension = mime.rsplit('/').next().unwrap_or_default();
        let key = format!("{}.{extension}", random_base_name());

        self.store
            .put_object(&key, &bytes, &mime)
            .await
            .map_err(|e| AppError::validation(format!("Invalid base64 image data: {e}")))?;

        tracing::info!(key, mime, size = bytes.len(), "Stored inline image");
        Ok(StoredImage {
            reference: self.store.public_url(&key),
            generated_key: Some(key),
        })
    }

    async fn persist_upload(&self, file: UploadedFile) -> Result<StoredImage, AppError> {
        let key = upload_key(&file.file_name)?;
        let content_type = content_type::from_file_name(&key);

        self.store
            .put_object(&key, &file.data, content_type)
            .await
            .map_err(|e| AppError::validation(format!("Invalid image file: {e}")))?;

        tracing::info!(key, content_type, size = file.data.len(), "Stored uploaded image");
        Ok(StoredImage {
            reference: self.store.public_url(&key),
            generated_key: None,
        })
    }

    /// Best-effort removal of an object written for a request whose database
    /// work then failed. Uploads keyed by their original name are left alone.
    pub async fn discard(&self, image: &StoredImage) {
        let Some(key) = image.generated_key.as_deref() else {
            return;
        };
        if let Err(e) = self.store.delete_object(key).await {
            tracing::warn!(key, "Failed to discard orphaned image: {e}");
        }
    }

    /// Value shown to clients: a fresh signed URL for objects of this
    /// bucket, the stored reference unchanged otherwise.
    pub fn resolve_for_display(&self, reference: Option<&str>) -> Option<String> {
        let reference = reference?;
        match self.store.key_for_public_url(reference) {
            Some(key) => Some(self.store.presign_get(&key, self.signed_url_ttl)),
            None => Some(reference.to_string()),
        }
    }
}

/// Splits `data:<mime>;base64,<payload>` and decodes the payload.
pub fn decode_data_uri(data_uri: &str) -> Result<(String, Vec<u8>), AppError> {
    let (format, payload) = data_uri.split_once(BASE64_DELIMITER).ok_or_else(|| {
        AppError::validation("Invalid base64 image data: missing ';base64,' delimiter")
    })?;

    let mime = format.strip_prefix("data:").unwrap_or(format).trim();
    let subtype = mime.rsplit('/').next().unwrap_or_default();
    let subtype_ok = !subtype.is_empty()
        && subtype
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if !subtype_ok {
        return Err(AppError::validation(format!(
            "Invalid base64 image data: unsupported mime type '{mime}'"
        )));
    }

    let payload: Vec<u8> = payload
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    let bytes = STANDARD
        .decode(&payload)
        .map_err(|e| AppError::validation(format!("Invalid base64 image data: {e}")))?;

    Ok((mime.to_string(), bytes))
}

fn random_base_name() -> String {
    let mut rng = rand::rng();
    (0..GENERATED_NAME_LEN)
        .map(|_| char::from(NAME_CHARSET[rng.random_range(0..NAME_CHARSET.len())]))
        .collect()
}

/// Final path component of an uploaded file name.
fn upload_key(file_name: &str) -> Result<String, AppError> {
    let name = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    crate::media::blob_store::validate_key(name)
        .map_err(|e| AppError::validation(format!("Invalid image file: {e}")))?;
    Ok(name.to_string())
}
