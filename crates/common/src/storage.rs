//! Object storage abstraction for uploaded images.
//!
//! Supports local filesystem, in-memory and S3-compatible object storage.
//! Objects are addressed by a path-like key and served from a stable public
//! URL derived from that key.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Deserialize;

use crate::id::IdGenerator;
use crate::{AppError, AppResult};

/// Storage configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Local filesystem storage.
    Local {
        /// Base path for stored files.
        base_path: PathBuf,
        /// Base URL for serving files.
        base_url: String,
    },
    /// Process-local storage. Contents are lost on restart.
    Memory {
        /// Base URL reported for stored files.
        base_url: String,
    },
    /// S3-compatible object storage.
    S3 {
        /// S3 endpoint URL (e.g., "<https://s3.amazonaws.com>" or `MinIO` URL).
        endpoint: String,
        /// S3 bucket name.
        bucket: String,
        /// AWS region.
        region: String,
        /// Access key ID.
        access_key_id: String,
        /// Secret access key.
        secret_access_key: String,
        /// Public URL prefix for serving files.
        #[serde(default)]
        public_url: Option<String>,
        /// Path prefix within the bucket.
        #[serde(default)]
        prefix: Option<String>,
    },
}

impl StorageConfig {
    /// Backend name as written in configuration.
    #[must_use]
    pub const fn backend_name(&self) -> &'static str {
        match self {
            Self::Local { .. } => "local",
            Self::Memory { .. } => "memory",
            Self::S3 { .. } => "s3",
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::Local {
            base_path: PathBuf::from("./files"),
            base_url: "/files".to_string(),
        }
    }
}

/// Metadata of a stored object.
#[derive(Debug, Clone)]
pub struct StoredObject {
    /// Storage key (path or object key).
    pub key: String,
    /// Public URL to access the object.
    pub url: String,
    /// Object size in bytes.
    pub size: u64,
    /// MIME content type.
    pub content_type: String,
    /// MD5 hash of the object.
    pub md5: String,
}

impl StoredObject {
    fn describe(key: &str, url: String, data: &[u8], content_type: &str) -> Self {
        Self {
            key: key.to_string(),
            url,
            size: data.len() as u64,
            content_type: content_type.to_string(),
            md5: format!("{:x}", md5::compute(data)),
        }
    }
}

/// Storage backend trait.
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    /// Store an object under `key`, replacing any previous content.
    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> AppResult<StoredObject>;

    /// Delete a batch of objects. Keys that do not exist are ignored.
    async fn delete_many(&self, keys: &[String]) -> AppResult<()>;

    /// Get the public URL for a key. Never fails.
    fn public_url(&self, key: &str) -> String;

    /// Check if an object exists.
    async fn exists(&self, key: &str) -> AppResult<bool>;
}

/// Shared handle to a storage backend.
pub type SharedStorage = Arc<dyn StorageBackend>;

/// Build the backend described by `config`.
pub async fn build_storage(config: &StorageConfig) -> AppResult<SharedStorage> {
    match config {
        StorageConfig::Local {
            base_path,
            base_url,
        } => Ok(Arc::new(LocalStorage::new(
            base_path.clone(),
            base_url.clone(),
        ))),
        StorageConfig::Memory { base_url } => Ok(Arc::new(MemoryStorage::new(base_url.clone()))),
        #[cfg(feature = "s3")]
        StorageConfig::S3 {
            endpoint,
            bucket,
            region,
            access_key_id,
            secret_access_key,
            public_url,
            prefix,
        } => Ok(Arc::new(
            S3Storage::new(
                endpoint,
                bucket.clone(),
                region,
                access_key_id,
                secret_access_key,
                public_url.clone(),
                prefix.clone(),
            )
            .await?,
        )),
        #[cfg(not(feature = "s3"))]
        StorageConfig::S3 { .. } => Err(AppError::Config(
            "S3 storage requested but memento-common was built without the `s3` feature"
                .to_string(),
        )),
    }
}

/// Local filesystem storage backend.
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new local storage backend.
    #[must_use]
    pub const fn new(base_path: PathBuf, base_url: String) -> Self {
        Self {
            base_path,
            base_url,
        }
    }
}

#[async_trait::async_trait]
impl StorageBackend for LocalStorage {
    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> AppResult<StoredObject> {
        let path = self.base_path.join(key);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to create directory: {e}")))?;
        }

        tokio::fs::write(&path, data)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write file: {e}")))?;

        Ok(StoredObject::describe(
            key,
            self.public_url(key),
            data,
            content_type,
        ))
    }

    async fn delete_many(&self, keys: &[String]) -> AppResult<()> {
        let results = futures::future::join_all(keys.iter().map(|key| async move {
            let path = self.base_path.join(key);
            match tokio::fs::remove_file(&path).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(format!("{key}: {e}")),
            }
        }))
        .await;

        let failed: Vec<String> = results.into_iter().filter_map(Result::err).collect();
        if failed.is_empty() {
            Ok(())
        } else {
            Err(AppError::Storage(format!(
                "Failed to delete {} file(s): {}",
                failed.len(),
                failed.join("; ")
            )))
        }
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        tokio::fs::try_exists(self.base_path.join(key))
            .await
            .map_err(|e| AppError::Storage(format!("Failed to stat file: {e}")))
    }
}

/// In-memory storage backend.
///
/// Used by tests and throwaway development setups. It can be told to fail
/// specific calls so partial-failure paths can be exercised.
#[derive(Default)]
pub struct MemoryStorage {
    base_url: String,
    objects: Mutex<HashMap<String, Vec<u8>>>,
    put_calls: AtomicUsize,
    failing_puts: Mutex<HashSet<usize>>,
    fail_deletes: AtomicBool,
    delete_calls: Mutex<Vec<Vec<String>>>,
}

impl MemoryStorage {
    /// Create a new in-memory storage backend.
    #[must_use]
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            ..Self::default()
        }
    }

    /// Make the `n`-th call to [`StorageBackend::put`] fail (zero based).
    pub fn fail_put_call(&self, n: usize) {
        self.failing_puts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(n);
    }

    /// Make every [`StorageBackend::delete_many`] call fail.
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Whether an object is stored under `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    /// All stored keys, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    /// Number of stored objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every batch passed to [`StorageBackend::delete_many`], in call order.
    #[must_use]
    pub fn delete_calls(&self) -> Vec<Vec<String>> {
        self.delete_calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait::async_trait]
impl StorageBackend for MemoryStorage {
    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> AppResult<StoredObject> {
        let call = self.put_calls.fetch_add(1, Ordering::SeqCst);
        if self
            .failing_puts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&call)
        {
            return Err(AppError::Storage(format!("Injected failure storing {key}")));
        }

        self.objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), data.to_vec());

        Ok(StoredObject::describe(
            key,
            self.public_url(key),
            data,
            content_type,
        ))
    }

    async fn delete_many(&self, keys: &[String]) -> AppResult<()> {
        self.delete_calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(keys.to_vec());

        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(AppError::Storage(format!(
                "Injected failure deleting {} object(s)",
                keys.len()
            )));
        }

        let mut objects = self.objects.lock().unwrap_or_else(PoisonError::into_inner);
        for key in keys {
            objects.remove(key);
        }
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        Ok(self.contains(key))
    }
}

/// Maximum number of keys accepted by one S3 `DeleteObjects` request.
#[cfg(feature = "s3")]
const S3_DELETE_BATCH: usize = 1000;

/// S3-compatible object storage backend.
#[cfg(feature = "s3")]
pub struct S3Storage {
    client: aws_sdk_s3::Client,
    bucket: String,
    public_url: Option<String>,
    prefix: Option<String>,
}

#[cfg(feature = "s3")]
impl S3Storage {
    /// Create a new S3 storage backend.
    pub async fn new(
        endpoint: &str,
        bucket: String,
        region: &str,
        access_key_id: &str,
        secret_access_key: &str,
        public_url: Option<String>,
        prefix: Option<String>,
    ) -> AppResult<Self> {
        use aws_config::Region;
        use aws_sdk_s3::config::Credentials;

        let credentials =
            Credentials::new(access_key_id, secret_access_key, None, None, "memento");

        let config = aws_sdk_s3::Config::builder()
            .endpoint_url(endpoint)
            .region(Region::new(region.to_string()))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        let client = aws_sdk_s3::Client::from_conf(config);

        Ok(Self {
            client,
            bucket,
            public_url,
            prefix,
        })
    }

    fn full_key(&self, key: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}/{}", prefix.trim_end_matches('/'), key),
            None => key.to_string(),
        }
    }
}

#[cfg(feature = "s3")]
#[async_trait::async_trait]
impl StorageBackend for S3Storage {
    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> AppResult<StoredObject> {
        use aws_sdk_s3::primitives::ByteStream;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(self.full_key(key))
            .body(ByteStream::from(data.to_vec()))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("S3 upload failed: {e}")))?;

        Ok(StoredObject::describe(
            key,
            self.public_url(key),
            data,
            content_type,
        ))
    }

    async fn delete_many(&self, keys: &[String]) -> AppResult<()> {
        use aws_sdk_s3::types::{Delete, ObjectIdentifier};

        for chunk in keys.chunks(S3_DELETE_BATCH) {
            let objects = chunk
                .iter()
                .map(|key| ObjectIdentifier::builder().key(self.full_key(key)).build())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| AppError::Storage(format!("Invalid S3 key: {e}")))?;
            let delete = Delete::builder()
                .set_objects(Some(objects))
                .quiet(true)
                .build()
                .map_err(|e| AppError::Storage(format!("Invalid S3 delete request: {e}")))?;

            let response = self
                .client
                .delete_objects()
                .bucket(&self.bucket)
                .delete(delete)
                .send()
                .await
                .map_err(|e| AppError::Storage(format!("S3 delete failed: {e}")))?;

            let errors = response.errors();
            if !errors.is_empty() {
                let failed: Vec<&str> = errors.iter().filter_map(|e| e.key()).collect();
                return Err(AppError::Storage(format!(
                    "S3 failed to delete {} object(s): {}",
                    errors.len(),
                    failed.join(", ")
                )));
            }
        }

        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        let full_key = self.full_key(key);
        match &self.public_url {
            Some(base) => format!("{}/{}", base.trim_end_matches('/'), full_key),
            None => format!("https://{}.s3.amazonaws.com/{}", self.bucket, full_key),
        }
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(self.full_key(key))
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                if e.as_service_error().is_some_and(|se| se.is_not_found()) {
                    Ok(false)
                } else {
                    Err(AppError::Storage(format!("S3 head_object failed: {e}")))
                }
            }
        }
    }
}

/// Extension used when a file name carries no usable one.
const FALLBACK_EXTENSION: &str = "bin";

/// Recover the extension of an uploaded file name.
#[must_use]
pub fn file_extension(file_name: &str) -> &str {
    file_name
        .rfind('.')
        .filter(|&pos| pos > 0 && pos < file_name.len() - 1)
        .map(|pos| &file_name[pos + 1..])
        .filter(|ext| ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or(FALLBACK_EXTENSION)
}

/// Generate a unique storage key for an image of a gallery.
///
/// Keys look like `{gallery_id}/{unix_millis}-{token}.{ext}`. The random
/// token keeps same-millisecond uploads into one gallery apart.
#[must_use]
pub fn generate_storage_key(gallery_id: &str, file_name: &str) -> String {
    let timestamp = chrono::Utc::now().timestamp_millis();
    let token = IdGenerator::new().generate_token();
    format!(
        "{gallery_id}/{timestamp}-{token}.{}",
        file_extension(file_name)
    )
}
