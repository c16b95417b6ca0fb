// src/clients/storage.rs

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::common::error::AppError;

/// Bucket privado; leitura só por URL assinada.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), AppError>;
    async fn create_signed_url(&self, path: &str, expires_in: u64) -> Result<String, AppError>;
}

#[derive(Clone)]
pub struct StorageClient {
    http: Client,
    base_url: String,
    key: String,
    bucket: String,
}

#[derive(Deserialize)]
struct SignedUrlResponse {
    #[serde(rename = "signedURL", alias = "signedUrl")]
    signed_url: String,
}

impl StorageClient {
    pub fn new(http: Client, supabase_url: &str, key: String, bucket: String) -> Self {
        Self {
            http,
            base_url: format!("{}/storage/v1", supabase_url.trim_end_matches('/')),
            key,
            bucket,
        }
    }
}

#[async_trait]
impl ObjectStore for StorageClient {
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), AppError> {
        let resp = self
            .http
            .post(format!("{}/object/{}/{}", self.base_url, self.bucket, path))
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("upload: {}", e)))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!("upload falhou ({}): {}", status.as_u16(), body)));
        }
        Ok(())
    }

    async fn create_signed_url(&self, path: &str, expires_in: u64) -> Result<String, AppError> {
        let resp = self
            .http
            .post(format!("{}/object/sign/{}/{}", self.base_url, self.bucket, path))
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .json(&json!({ "expiresIn": expires_in }))
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("create_signed_url: {}", e)))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "create_signed_url falhou ({}): {}",
                status.as_u16(),
                body
            )));
        }

        let signed: SignedUrlResponse = resp
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("create_signed_url: resposta inválida: {}", e)))?;

        // O storage devolve um caminho relativo ("/object/sign/...?token=").
        Ok(format!("{}{}", self.base_url, signed.signed_url))
    }
}
