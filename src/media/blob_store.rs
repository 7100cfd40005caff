//! Filesystem-backed bucket with time-limited signed read URLs.
//!
//! Objects live at `<root>/<bucket>/<key>`, their metadata at
//! `<root>/<bucket>/.meta/<key>.json`. Keys are single path segments.

use std::path::{Path, PathBuf};

use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tokio::fs;
use tracing::{debug, info, warn};

type HmacSha256 = Hmac<Sha256>;

const META_DIR: &str = ".meta";
const META_SUFFIX: &str = ".json";
/// File names are limited to 255 bytes and the metadata name adds a suffix.
const MAX_KEY_LEN: usize = 255 - META_SUFFIX.len();

#[derive(Debug, thiserror::Error)]
pub enum BlobStoreError {
    #[error("Invalid object key: {0}")]
    InvalidKey(String),
    #[error("Signed URL signature is invalid")]
    BadSignature,
    #[error("Signed URL has expired")]
    Expired,
    #[error("Blob storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Blob metadata error: {0}")]
    Metadata(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ObjectMeta {
    pub content_type: String,
    pub size: u64,
}

/// Query parameters carried by a signed URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedUrlParams {
    pub expires: i64,
    pub nonce: String,
    pub signature: String,
}

#[derive(Clone)]
pub struct BlobStore {
    bucket: String,
    bucket_dir: PathBuf,
    public_prefix: String,
    signing_key: Vec<u8>,
}

impl std::fmt::Debug for BlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobStore")
            .field("bucket", &self.bucket)
            .field("bucket_dir", &self.bucket_dir)
            .field("public_prefix", &self.public_prefix)
            .finish_non_exhaustive()
    }
}

impl BlobStore {
    pub async fn new(
        root: impl AsRef<Path>,
        public_base_url: &str,
        bucket: &str,
        signing_key: &[u8],
    ) -> Result<Self, BlobStoreError> {
        validate_key(bucket)?;
        let bucket_dir = root.as_ref().join(bucket);
        fs::create_dir_all(bucket_dir.join(META_DIR)).await?;

        info!(path = %bucket_dir.display(), bucket, "Blob store initialized");

        Ok(Self {
            bucket: bucket.to_string(),
            bucket_dir,
            public_prefix: format!("{}/{bucket}/", public_base_url.trim_end_matches('/')),
            signing_key: signing_key.to_vec(),
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Unsigned public URL of an object; this is what gets persisted.
    pub fn public_url(&self, key: &str) -> String {
        format!("{}{}", self.public_prefix, urlencoding::encode(key))
    }

    /// Object key behind a public URL of this bucket, `None` for any other
    /// reference.
    pub fn key_for_public_url(&self, reference: &str) -> Option<String> {
        let encoded = reference.strip_prefix(&self.public_prefix)?;
        if encoded.contains(['?', '#', '/']) {
            return None;
        }
        let key = urlencoding::decode(encoded).ok()?.into_owned();
        validate_key(&key).ok()?;
        Some(key)
    }

    pub async fn put_object(
        &self,
        key: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<ObjectMeta, BlobStoreError> {
        validate_key(key)?;

        let meta = ObjectMeta {
            content_type: content_type.to_string(),
            size: data.len() as u64,
        };
        let data_path = self.bucket_dir.join(key);
        fs::write(&data_path, data).await?;
        if let Err(e) = self.write_meta(key, &meta).await {
            if let Err(cleanup) = fs::remove_file(&data_path).await {
                warn!(key, "Failed to remove object after metadata error: {cleanup}");
            }
            return Err(e);
        }

        debug!(key, size = meta.size, content_type, "Stored object");
        Ok(meta)
    }

    pub async fn get_object(
        &self,
        key: &str,
    ) -> Result<Option<(Vec<u8>, ObjectMeta)>, BlobStoreError> {
        validate_key(key)?;

        let data = match fs::read(self.bucket_dir.join(key)).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let meta = match fs::read(self.meta_path(key)).await {
            Ok(raw) => serde_json::from_slice(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => ObjectMeta {
                content_type: super::content_type::from_file_name(key).to_string(),
                size: data.len() as u64,
            },
            Err(e) => return Err(e.into()),
        };

        Ok(Some((data, meta)))
    }

    /// Removes an object and its metadata; missing objects are ignored.
    pub async fn delete_object(&self, key: &str) -> Result<(), BlobStoreError> {
        validate_key(key)?;

        for path in [self.bucket_dir.join(key), self.meta_path(key)] {
            match fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        debug!(key, "Deleted object");
        Ok(())
    }

    /// Signed URL granting read access to `key` for `ttl`. Every call yields
    /// a distinct URL because of the random nonce.
    pub fn presign_get(&self, key: &str, ttl: Duration) -> String {
        let expires = (Utc::now() + ttl).timestamp();
        let mut nonce = [0u8; 16];
        rand::rng().fill_bytes(&mut nonce);
        let nonce = hex::encode(nonce);

        let signature = hex::encode(self.mac(key, expires, &nonce).finalize().into_bytes());

        format!(
            "{}?expires={expires}&nonce={nonce}&signature={signature}",
            self.public_url(key)
        )
    }

    /// Checks a signed URL's signature in constant time, then its expiry.
    pub fn verify_signed(&self, key: &str, params: &SignedUrlParams) -> Result<(), BlobStoreError> {
        let signature = hex::decode(&params.signature).map_err(|_| BlobStoreError::BadSignature)?;
        self.mac(key, params.expires, &params.nonce)
            .verify_slice(&signature)
            .map_err(|_| BlobStoreError::BadSignature)?;

        if params.expires <= Utc::now().timestamp() {
            return Err(BlobStoreError::Expired);
        }
        Ok(())
    }

    fn mac(&self, key: &str, expires: i64, nonce: &str) -> HmacSha256 {
        let mut mac =
            HmacSha256::new_from_slice(&self.signing_key).expect("HMAC accepts keys of any length");
        mac.update(format!("{}\n{key}\n{expires}\n{nonce}", self.bucket).as_bytes());
        mac
    }

    async fn write_meta(&self, key: &str, meta: &ObjectMeta) -> Result<(), BlobStoreError> {
        fs::write(self.meta_path(key), serde_json::to_vec(meta)?).await?;
        Ok(())
    }

    fn meta_path(&self, key: &str) -> PathBuf {
        self.bucket_dir.join(META_DIR).join(format!("{key}{META_SUFFIX}"))
    }
}

/// Keys are single, non-hidden path segments.
pub fn validate_key(key: &str) -> Result<(), BlobStoreError> {
    let invalid = key.is_empty()
        || key.starts_with('.')
        || key.contains(['/', '\\', '\0'])
        || key.len() > MAX_KEY_LEN;

    if invalid {
        return Err(BlobStoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}
