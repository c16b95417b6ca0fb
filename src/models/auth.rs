// src/models/auth.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::clients::Identity;
use crate::models::account::AppUser;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Option<Uuid>, // Subject (ID da identidade); ausente = token inválido
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    pub iat: i64,
    pub exp: i64,
}

// ---
// Payloads
// ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SignupPayload {
    #[validate(email(message = "validation.email"))]
    pub email: String,
    // A política completa (classes de caracteres) é checada no serviço.
    #[validate(length(min = 8, max = 64, message = "validation.password_length"))]
    pub password: String,
    #[serde(alias = "firstName")]
    #[validate(length(min = 1, message = "validation.required"))]
    pub first_name: String,
    #[serde(alias = "lastName")]
    #[validate(length(min = 1, message = "validation.required"))]
    pub last_name: String,
    #[serde(alias = "companyName", alias = "company")]
    #[validate(length(min = 1, message = "validation.required"))]
    pub company_name: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SigninPayload {
    #[validate(email(message = "validation.email"))]
    pub email: String,
    #[validate(length(min = 1, message = "validation.required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct GoogleSigninPayload {
    #[serde(alias = "idToken", alias = "credential")]
    #[validate(length(min = 1, message = "validation.required"))]
    pub id_token: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RefreshPayload {
    #[serde(alias = "refreshToken")]
    #[validate(length(min = 1, message = "validation.required"))]
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct VerifyOtpPayload {
    #[validate(email(message = "validation.email"))]
    pub email: String,
    #[serde(alias = "token", alias = "otp")]
    #[validate(length(equal = 6, message = "validation.otp_code"))]
    pub code: String,
}

/// Link de verificação legado.
#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyLinkPayload {
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct EmailPayload {
    #[validate(email(message = "validation.email"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ResetPasswordOtpPayload {
    #[validate(email(message = "validation.email"))]
    pub email: String,
    #[serde(alias = "token", alias = "otp")]
    #[validate(length(equal = 6, message = "validation.otp_code"))]
    pub code: String,
    #[serde(alias = "newPassword", alias = "password")]
    #[validate(length(min = 8, max = 64, message = "validation.password_length"))]
    pub new_password: String,
}

// ---
// Respostas
// ---

#[derive(Debug, Serialize, ToSchema)]
pub struct SignupResponse {
    pub id: Uuid,
    pub email: String,
    pub confirmed: bool,
    pub message: String,
    pub company_id: Uuid,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SigninResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub user_id: Uuid,
    pub email: String,
    pub email_confirmed: bool,
    pub company_id: Option<Uuid>,
    pub is_onboarded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GoogleSigninResponse {
    #[serde(flatten)]
    pub session: SigninResponse,
    pub is_new_user: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub identity: Identity,
    pub profile: Option<AppUser>,
}
