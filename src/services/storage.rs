use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::config::{Config, StorageBackendKind};

const UPLOAD_TIMEOUT_SECS: u64 = 30;

/// Object storage for uploaded resumes and images.
pub enum Storage {
    /// Files under `<root>/<bucket>/<path>`, served by this app at `/uploads`.
    Local { root: PathBuf, public_url: String },
    /// Supabase Storage REST API.
    Supabase {
        client: reqwest::Client,
        url: String,
        service_key: String,
    },
}

impl Storage {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        match cfg.storage.backend {
            StorageBackendKind::Local => Ok(Self::local(
                &cfg.storage.local_dir,
                &cfg.server.public_url,
            )),
            StorageBackendKind::Supabase => {
                let url = cfg
                    .storage
                    .supabase_url
                    .clone()
                    .context("storage.supabase_url is required for the supabase backend")?;
                let service_key = cfg
                    .storage
                    .supabase_service_key
                    .clone()
                    .context("storage.supabase_service_key is required for the supabase backend")?;
                let client = reqwest::Client::builder()
                    .timeout(Duration::from_secs(UPLOAD_TIMEOUT_SECS))
                    .build()
                    .context("Failed to create HTTP client")?;
                Ok(Self::Supabase {
                    client,
                    url: url.trim_end_matches('/').to_string(),
                    service_key,
                })
            }
        }
    }

    pub fn local(root: impl Into<PathBuf>, public_url: &str) -> Self {
        Self::Local {
            root: root.into(),
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    /// Directory to mount at `/uploads`, when files are kept on local disk.
    pub fn local_root(&self) -> Option<&Path> {
        match self {
            Self::Local { root, .. } => Some(root.as_path()),
            Self::Supabase { .. } => None,
        }
    }

    pub fn public_url(&self, bucket: &str, path: &str) -> String {
        match self {
            Self::Local { public_url, .. } => format!("{}/uploads/{}/{}", public_url, bucket, path),
            Self::Supabase { url, .. } => {
                format!("{}/storage/v1/object/public/{}/{}", url, bucket, path)
            }
        }
    }

    /// Store `data` at `bucket/path` and return its public URL. Existing
    /// objects are never overwritten.
    pub async fn upload(&self, bucket: &str, path: &str, data: Vec<u8>, content_type: &str) -> Result<String> {
        check_object_path(bucket)?;
        check_object_path(path)?;

        match self {
            Self::Local { root, .. } => {
                let target = root.join(bucket).join(path);
                if let Some(parent) = target.parent() {
                    tokio::fs::create_dir_all(parent)
                        .await
                        .with_context(|| format!("Failed to create {}", parent.display()))?;
                }
                let mut file = tokio::fs::OpenOptions::new()
                    .write(true)
                    .create_new(true)
                    .open(&target)
                    .await
                    .with_context(|| format!("Failed to create {}", target.display()))?;
                file.write_all(&data).await.context("Failed to write upload")?;
                file.flush().await?;
            }
            Self::Supabase { client, url, service_key } => {
                let endpoint = format!("{}/storage/v1/object/{}/{}", url, bucket, path);
                let response = client
                    .post(&endpoint)
                    .bearer_auth(service_key)
                    .header("apikey", service_key)
                    .header("content-type", content_type)
                    .header("cache-control", "max-age=3600")
                    .header("x-upsert", "false")
                    .body(data)
                    .send()
                    .await
                    .context("Storage upload request failed")?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    anyhow::bail!("Storage upload to {} returned {}: {}", bucket, status, body);
                }
            }
        }

        info!("Stored {}/{} ({})", bucket, path, content_type);
        Ok(self.public_url(bucket, path))
    }
}

/// Object keys are relative, slash-separated and never climb out of their bucket.
pub fn check_object_path(path: &str) -> Result<()> {
    if path.is_empty() {
        anyhow::bail!("Empty object path");
    }
    if path.starts_with('/') || path.starts_with('\\') {
        anyhow::bail!("Object path must be relative: {}", path);
    }
    if path.contains("..") {
        anyhow::bail!("Object path may not contain '..': {}", path);
    }
    Ok(())
}
