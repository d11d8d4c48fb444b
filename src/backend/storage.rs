use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde_json::Value;

use super::auth::TokenCell;
use super::error::BackendError;
use super::traits::{BlobHandle, BlobStorage};

const STORAGE_BASE: &str = "https://firebasestorage.googleapis.com/v0";

/// Blob-storage REST client. Objects are addressed by their full path inside
/// the bucket; uploading to an existing path overwrites it.
pub struct RestBlobStorage {
    http: Client,
    bucket: String,
    tokens: Arc<TokenCell>,
}

impl RestBlobStorage {
    pub fn new(http: Client, bucket: String, tokens: Arc<TokenCell>) -> Self {
        Self {
            http,
            bucket,
            tokens,
        }
    }

    fn auth_header(&self) -> Result<String, BackendError> {
        match self.tokens.get() {
            Some(token) => Ok(format!("Firebase {}", token)),
            None => Err(BackendError::NotSignedIn),
        }
    }
}

#[async_trait]
impl BlobStorage for RestBlobStorage {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<BlobHandle, BackendError> {
        let url = format!(
            "{}/b/{}/o?uploadType=media&name={}",
            STORAGE_BASE,
            self.bucket,
            urlencoding::encode(path)
        );

        let resp = self
            .http
            .post(url)
            .header(AUTHORIZATION, self.auth_header()?)
            .header(CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(BackendError::Api {
                status: status.as_u16(),
                message: text,
            });
        }

        let meta: Value = serde_json::from_str(&text)
            .map_err(|e| BackendError::Network(format!("malformed upload response: {}", e)))?;
        let token = meta
            .get("downloadTokens")
            .and_then(|t| t.as_str())
            .and_then(|t| t.split(',').next())
            .map(|t| t.to_string());

        Ok(BlobHandle {
            path: path.to_string(),
            token,
        })
    }

    async fn download_url(&self, handle: &BlobHandle) -> Result<String, BackendError> {
        let mut url = format!(
            "{}/b/{}/o/{}?alt=media",
            STORAGE_BASE,
            self.bucket,
            urlencoding::encode(&handle.path)
        );
        if let Some(token) = &handle.token {
            url.push_str(&format!("&token={}", token));
        }
        Ok(url)
    }
}
