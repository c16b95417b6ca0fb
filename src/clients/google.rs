// src/clients/google.rs

use async_trait::async_trait;
use jsonwebtoken::{decode, decode_header, jwk::JwkSet, Algorithm, DecodingKey, Validation};
use reqwest::Client;
use serde::Deserialize;

use crate::common::error::AppError;

const GOOGLE_JWKS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";
const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

/// Claims do ID token do Google que nos interessam.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleClaims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[async_trait]
pub trait GoogleTokenVerifier: Send + Sync {
    /// Assinatura, emissor, audiência e validade. Qualquer falha vira `InvalidToken`.
    async fn verify(&self, id_token: &str) -> Result<GoogleClaims, AppError>;
}

#[derive(Clone)]
pub struct GoogleJwksVerifier {
    http: Client,
    client_id: String,
    jwks_url: String,
}

impl GoogleJwksVerifier {
    pub fn new(http: Client, client_id: String) -> Self {
        Self { http, client_id, jwks_url: GOOGLE_JWKS_URL.to_string() }
    }

    async fn fetch_jwks(&self) -> Result<JwkSet, AppError> {
        self.http
            .get(&self.jwks_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::Upstream(format!("google jwks: {}", e)))?
            .json::<JwkSet>()
            .await
            .map_err(|e| AppError::Upstream(format!("google jwks: resposta inválida: {}", e)))
    }
}

#[async_trait]
impl GoogleTokenVerifier for GoogleJwksVerifier {
    async fn verify(&self, id_token: &str) -> Result<GoogleClaims, AppError> {
        if self.client_id.is_empty() {
            tracing::warn!("GOOGLE_CLIENT_ID não configurado; login com Google recusado");
            return Err(AppError::InvalidToken);
        }

        let header = decode_header(id_token).map_err(|_| AppError::InvalidToken)?;
        let kid = header.kid.ok_or(AppError::InvalidToken)?;

        let jwks = self.fetch_jwks().await?;
        let jwk = jwks.find(&kid).ok_or(AppError::InvalidToken)?;
        let key = DecodingKey::from_jwk(jwk).map_err(|_| AppError::InvalidToken)?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[self.client_id.as_str()]);
        validation.set_issuer(&GOOGLE_ISSUERS);

        let data = decode::<GoogleClaims>(id_token, &key, &validation).map_err(|e| {
            tracing::debug!("ID token do Google rejeitado: {}", e);
            AppError::InvalidToken
        })?;

        Ok(data.claims)
    }
}
