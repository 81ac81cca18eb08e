//! Payment proof storage
//!
//! 外部对象存储的窄接口：上传后返回可长期访问的 URL 与存储标识。
//! 默认实现 [`LocalProofStorage`] 写入 `WORK_DIR/uploads/payments`，
//! 文件名为内容 SHA-256 + 扩展名，相同内容只存一份。

use std::path::PathBuf;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid storage key: {0}")]
    InvalidKey(String),

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Upload handed to the storage collaborator
#[derive(Debug, Clone)]
pub struct ProofUpload {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub extension: &'static str,
}

/// Result of a successful upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredProof {
    /// Storage identifier
    pub key: String,
    /// Durable URL
    pub url: String,
    /// `false` when identical content was already stored
    pub created: bool,
}

#[async_trait]
pub trait ProofStorage: Send + Sync {
    async fn store(&self, upload: &ProofUpload) -> Result<StoredProof, StorageError>;

    /// Best-effort removal after a failed write
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Read back a stored object; `None` when absent
    async fn open(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;
}

/// Local filesystem storage
#[derive(Debug, Clone)]
pub struct LocalProofStorage {
    dir: PathBuf,
    base_url: String,
}

impl LocalProofStorage {
    pub fn new(dir: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn url_for(&self, key: &str) -> String {
        format!("{}/api/uploads/payments/{}", self.base_url, key)
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        if !is_valid_key(key) {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(key))
    }
}

/// Calculate SHA256 hash of data
fn calculate_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// `{64 hex}.{ext}` only, so a key can never escape the storage dir
pub fn is_valid_key(key: &str) -> bool {
    let Some((hash, ext)) = key.split_once('.') else {
        return false;
    };
    hash.len() == 64
        && hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
        && !ext.is_empty()
        && ext.len() <= 5
        && ext.chars().all(|c| c.is_ascii_lowercase())
}

#[async_trait]
impl ProofStorage for LocalProofStorage {
    async fn store(&self, upload: &ProofUpload) -> Result<StoredProof, StorageError> {
        let key = format!("{}.{}", calculate_hash(&upload.bytes), upload.extension);
        let path = self.path_for(&key)?;

        if tokio::fs::try_exists(&path).await? {
            tracing::debug!(key = %key, "Proof already stored, reusing");
            return Ok(StoredProof {
                url: self.url_for(&key),
                key,
                created: false,
            });
        }

        tokio::fs::create_dir_all(&self.dir).await?;
        // 先写临时文件再 rename，读取方不会看到半个文件
        let tmp = self
            .dir
            .join(format!(".{}.{}.tmp", key, shared::util::snowflake_id()));
        tokio::fs::write(&tmp, &upload.bytes).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        tracing::info!(
            key = %key,
            size = upload.bytes.len(),
            content_type = upload.content_type,
            "Payment proof stored"
        );
        Ok(StoredProof {
            url: self.url_for(&key),
            key,
            created: true,
        })
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn open(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
