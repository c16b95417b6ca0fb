// src/clients/identity.rs
//
// Cliente do provedor de identidade (API compatível com GoTrue).
// Senhas, OTPs, confirmação de e-mail e OAuth ficam todos do lado de lá;
// aqui só falamos HTTP com ele.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::error::AppError;

pub const ADMIN_PAGE_SIZE: u32 = 200;
// Trava contra um provedor que ignora `page` e devolve sempre a mesma página cheia.
pub const ADMIN_MAX_PAGES: u32 = 1_000;

/// Usuário como o provedor de identidade o devolve.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Identity {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_confirmed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub user_metadata: Value,
}

impl Identity {
    pub fn email_confirmed(&self) -> bool {
        self.email_confirmed_at.is_some()
    }

    pub fn email_or_empty(&self) -> &str {
        self.email.as_deref().unwrap_or_default()
    }
}

/// Sessão emitida pelo provedor (login por senha, OAuth ou OTP).
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSession {
    #[serde(default)]
    pub access_token: Option<String>,
    pub user: Identity,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewIdentity {
    pub email: String,
    pub password: String,
    pub email_confirm: bool,
    pub user_metadata: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpType {
    Signup,
    Recovery,
}

impl OtpType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OtpType::Signup => "signup",
            OtpType::Recovery => "recovery",
        }
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Há uma credencial administrativa (service role) configurada?
    fn has_admin_credential(&self) -> bool;

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<ProviderSession, AppError>;
    async fn sign_in_with_id_token(&self, provider: &str, id_token: &str) -> Result<ProviderSession, AppError>;
    /// Resolve um access token emitido pelo próprio provedor.
    async fn get_user(&self, access_token: &str) -> Result<Identity, AppError>;

    async fn send_otp(&self, email: &str, otp_type: OtpType) -> Result<(), AppError>;
    async fn verify_otp(&self, email: &str, code: &str, otp_type: OtpType) -> Result<ProviderSession, AppError>;
    async fn update_password(&self, session_token: &str, new_password: &str) -> Result<(), AppError>;

    // Resgates do link de verificação (fluxo legado).
    async fn verify_link(&self, token: &str) -> Result<(), AppError>;
    async fn verify_token_hash(&self, token_hash: &str) -> Result<(), AppError>;
    async fn verify_raw_token(&self, token: &str) -> Result<(), AppError>;

    // --- Administração ---
    async fn admin_create_user(&self, new_identity: &NewIdentity) -> Result<Identity, AppError>;
    async fn admin_get_user(&self, id: Uuid) -> Result<Option<Identity>, AppError>;
    /// `page` começa em 1.
    async fn admin_list_users(&self, page: u32, per_page: u32) -> Result<Vec<Identity>, AppError>;
    async fn admin_delete_user(&self, id: Uuid) -> Result<(), AppError>;
    async fn admin_confirm_email(&self, id: Uuid) -> Result<(), AppError>;
    async fn admin_generate_magic_link(&self, email: &str, redirect_to: &str) -> Result<(), AppError>;

    fn admin_page_size(&self) -> u32 {
        ADMIN_PAGE_SIZE
    }

    /// Percorre as páginas até achar `matches` ou até vir uma página incompleta.
    async fn admin_find_user(
        &self,
        matches: &(dyn for<'a> Fn(&'a Identity) -> bool + Send + Sync),
    ) -> Result<Option<Identity>, AppError> {
        let per_page = self.admin_page_size().max(1);
        for page in 1..=ADMIN_MAX_PAGES {
            let users = self.admin_list_users(page, per_page).await?;
            let last_page = users.len() < per_page as usize;
            if let Some(found) = users.into_iter().find(|u| matches(u)) {
                return Ok(Some(found));
            }
            if last_page {
                return Ok(None);
            }
        }
        tracing::warn!("admin_find_user: parou após {} páginas", ADMIN_MAX_PAGES);
        Ok(None)
    }

    async fn admin_find_by_email(&self, email: &str) -> Result<Option<Identity>, AppError> {
        let wanted = email.trim().to_lowercase();
        self.admin_find_user(&|u: &Identity| {
            u.email.as_deref().map(str::to_lowercase).as_deref() == Some(wanted.as_str())
        })
        .await
    }
}

// ============================================================================
// Implementação HTTP
// ============================================================================

#[derive(Clone)]
pub struct GoTrueClient {
    http: Client,
    base_url: String,
    anon_key: String,
    service_key: Option<String>,
    redirect_to: String,
}

#[derive(Deserialize)]
struct UserList {
    #[serde(default)]
    users: Vec<Identity>,
}

impl GoTrueClient {
    pub fn new(http: Client, supabase_url: &str, anon_key: String, service_key: Option<String>, frontend_url: &str) -> Self {
        Self {
            http,
            base_url: format!("{}/auth/v1", supabase_url.trim_end_matches('/')),
            anon_key,
            service_key,
            redirect_to: format!("{}/auth/callback", frontend_url.trim_end_matches('/')),
        }
    }

    fn public(&self, req: RequestBuilder) -> RequestBuilder {
        req.header("apikey", &self.anon_key).bearer_auth(&self.anon_key)
    }

    // Sem service key usamos a chave pública mesmo; o provedor recusa o que não puder.
    fn admin(&self, req: RequestBuilder) -> RequestBuilder {
        let key = self.service_key.as_deref().unwrap_or(&self.anon_key);
        req.header("apikey", key).bearer_auth(key)
    }

    async fn send(&self, op: &str, req: RequestBuilder) -> Result<Response, AppError> {
        let resp = req
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("{}: {}", op, e)))?;

        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        tracing::debug!("Provedor de identidade recusou {}: {} {}", op, status, body);
        Err(classify_failure(op, status, &body))
    }

    async fn session(&self, op: &str, req: RequestBuilder) -> Result<ProviderSession, AppError> {
        self.send(op, req)
            .await?
            .json::<ProviderSession>()
            .await
            .map_err(|e| AppError::Upstream(format!("{}: resposta inválida: {}", op, e)))
    }
}

fn classify_failure(op: &str, status: StatusCode, body: &str) -> AppError {
    let lowered = body.to_lowercase();
    if status == StatusCode::UNPROCESSABLE_ENTITY
        && (lowered.contains("already been registered") || lowered.contains("email_exists"))
    {
        return AppError::EmailAlreadyExists;
    }
    AppError::Upstream(format!("{} falhou ({}): {}", op, status.as_u16(), body))
}

#[async_trait]
impl IdentityProvider for GoTrueClient {
    fn has_admin_credential(&self) -> bool {
        self.service_key.is_some()
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<ProviderSession, AppError> {
        let req = self
            .public(self.http.post(format!("{}/token?grant_type=password", self.base_url)))
            .json(&json!({ "email": email, "password": password }));

        // Nunca dizemos qual fator falhou.
        self.session("sign_in_with_password", req).await.map_err(|e| match e {
            AppError::Upstream(_) => AppError::InvalidCredentials,
            other => other,
        })
    }

    async fn sign_in_with_id_token(&self, provider: &str, id_token: &str) -> Result<ProviderSession, AppError> {
        let req = self
            .public(self.http.post(format!("{}/token?grant_type=id_token", self.base_url)))
            .json(&json!({ "provider": provider, "id_token": id_token }));
        self.session("sign_in_with_id_token", req).await
    }

    async fn get_user(&self, access_token: &str) -> Result<Identity, AppError> {
        let req = self
            .http
            .get(format!("{}/user", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token);
        self.send("get_user", req)
            .await
            .map_err(|_| AppError::InvalidToken)?
            .json::<Identity>()
            .await
            .map_err(|_| AppError::InvalidToken)
    }

    async fn send_otp(&self, email: &str, otp_type: OtpType) -> Result<(), AppError> {
        let req = match otp_type {
            OtpType::Signup => self
                .public(self.http.post(format!("{}/resend", self.base_url)))
                .json(&json!({
                    "type": "signup",
                    "email": email,
                    "options": { "email_redirect_to": self.redirect_to },
                })),
            OtpType::Recovery => self
                .public(self.http.post(format!("{}/recover", self.base_url)))
                .json(&json!({ "email": email })),
        };
        self.send("send_otp", req).await.map(|_| ())
    }

    async fn verify_otp(&self, email: &str, code: &str, otp_type: OtpType) -> Result<ProviderSession, AppError> {
        let req = self
            .public(self.http.post(format!("{}/verify", self.base_url)))
            .json(&json!({ "type": otp_type.as_str(), "email": email, "token": code }));
        self.session("verify_otp", req).await
    }

    async fn update_password(&self, session_token: &str, new_password: &str) -> Result<(), AppError> {
        let req = self
            .http
            .put(format!("{}/user", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(session_token)
            .json(&json!({ "password": new_password }));
        self.send("update_password", req).await.map(|_| ())
    }

    async fn verify_link(&self, token: &str) -> Result<(), AppError> {
        let req = self
            .public(self.http.get(format!("{}/verify", self.base_url)))
            .query(&[("token", token), ("type", "signup")]);
        self.send("verify_link", req).await.map(|_| ())
    }

    async fn verify_token_hash(&self, token_hash: &str) -> Result<(), AppError> {
        let req = self
            .public(self.http.post(format!("{}/verify", self.base_url)))
            .json(&json!({ "type": "signup", "token_hash": token_hash }));
        self.session("verify_token_hash", req).await.map(|_| ())
    }

    async fn verify_raw_token(&self, token: &str) -> Result<(), AppError> {
        let req = self
            .public(self.http.post(format!("{}/verify", self.base_url)))
            .json(&json!({ "type": "signup", "token": token }));
        self.session("verify_raw_token", req).await.map(|_| ())
    }

    async fn admin_create_user(&self, new_identity: &NewIdentity) -> Result<Identity, AppError> {
        let req = self
            .admin(self.http.post(format!("{}/admin/users", self.base_url)))
            .json(new_identity);
        self.send("admin_create_user", req)
            .await?
            .json::<Identity>()
            .await
            .map_err(|e| AppError::Upstream(format!("admin_create_user: resposta inválida: {}", e)))
    }

    async fn admin_get_user(&self, id: Uuid) -> Result<Option<Identity>, AppError> {
        let req = self.admin(self.http.get(format!("{}/admin/users/{}", self.base_url, id)));
        let resp = req
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("admin_get_user: {}", e)))?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(classify_failure("admin_get_user", status, &body));
        }
        resp.json::<Identity>()
            .await
            .map(Some)
            .map_err(|e| AppError::Upstream(format!("admin_get_user: resposta inválida: {}", e)))
    }

    async fn admin_list_users(&self, page: u32, per_page: u32) -> Result<Vec<Identity>, AppError> {
        let req = self
            .admin(self.http.get(format!("{}/admin/users", self.base_url)))
            .query(&[("page", page), ("per_page", per_page)]);
        let list = self
            .send("admin_list_users", req)
            .await?
            .json::<UserList>()
            .await
            .map_err(|e| AppError::Upstream(format!("admin_list_users: resposta inválida: {}", e)))?;
        Ok(list.users)
    }

    async fn admin_delete_user(&self, id: Uuid) -> Result<(), AppError> {
        let req = self.admin(self.http.delete(format!("{}/admin/users/{}", self.base_url, id)));
        self.send("admin_delete_user", req).await.map(|_| ())
    }

    async fn admin_confirm_email(&self, id: Uuid) -> Result<(), AppError> {
        let req = self
            .admin(self.http.put(format!("{}/admin/users/{}", self.base_url, id)))
            .json(&json!({ "email_confirm": true }));
        self.send("admin_confirm_email", req).await.map(|_| ())
    }

    async fn admin_generate_magic_link(&self, email: &str, redirect_to: &str) -> Result<(), AppError> {
        let req = self
            .admin(self.http.post(format!("{}/admin/generate_link", self.base_url)))
            .json(&json!({ "type": "magiclink", "email": email, "redirect_to": redirect_to }));
        self.send("admin_generate_magic_link", req).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_email_is_a_conflict() {
        let err = classify_failure(
            "admin_create_user",
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"code":422,"error_code":"email_exists","msg":"A user with this email address has already been registered"}"#,
        );
        assert!(matches!(err, AppError::EmailAlreadyExists));

        let err = classify_failure("admin_create_user", StatusCode::BAD_GATEWAY, "boom");
        assert!(matches!(err, AppError::Upstream(m) if m.contains("502")));
    }

    #[test]
    fn identity_parses_provider_payload() {
        let raw = r#"{
            "id": "8d0fd2b2-3a43-4c67-9d1a-5b0d9f1f2a10",
            "email": "a@x.com",
            "email_confirmed_at": null,
            "user_metadata": {"first_name": "A"},
            "aud": "authenticated"
        }"#;
        let identity: Identity = serde_json::from_str(raw).unwrap();
        assert!(!identity.email_confirmed());
        assert_eq!(identity.user_metadata["first_name"], "A");
    }
}
