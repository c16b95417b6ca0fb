// src/handlers/auth.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::auth::{
        EmailPayload, GoogleSigninPayload, GoogleSigninResponse, MeResponse, MessageResponse, RefreshPayload,
        ResetPasswordOtpPayload, SigninPayload, SigninResponse, SignupPayload, SignupResponse, TokenPairResponse,
        VerifyLinkPayload, VerifyOtpPayload,
    },
};

fn message(app_state: &AppState, locale: &Locale, key: &str) -> Json<MessageResponse> {
    Json(MessageResponse { message: app_state.i18n_store.translate(&locale.0, key, &[]) })
}

// ---
// Handler: signup
// ---
#[utoipa::path(
    post,
    path = "/api/v1/auth/signup",
    tag = "Auth",
    request_body = SignupPayload,
    responses(
        (status = 201, description = "Conta criada; código de verificação enviado", body = SignupResponse),
        (status = 409, description = "E-mail já cadastrado"),
        (status = 422, description = "Senha fraca ou dados inválidos")
    )
)]
pub async fn signup(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<SignupPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let outcome = app_state
        .auth_service
        .signup(&payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let response = SignupResponse {
        id: outcome.user_id,
        email: outcome.email,
        confirmed: false,
        message: app_state.i18n_store.translate(&locale.0, "messages.signup_success", &[]),
        company_id: outcome.company_id,
    };

    Ok((StatusCode::CREATED, Json(response)))
}

// ---
// Handler: signin
// ---
#[utoipa::path(
    post,
    path = "/api/v1/auth/signin",
    tag = "Auth",
    request_body = SigninPayload,
    responses(
        (status = 200, description = "Login realizado", body = SigninResponse),
        (status = 401, description = "Credenciais inválidas")
    )
)]
pub async fn signin(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<SigninPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let session = app_state
        .auth_service
        .signin(&payload.email, &payload.password)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(session))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/google-signin",
    tag = "Auth",
    request_body = GoogleSigninPayload,
    responses(
        (status = 200, description = "Login com Google realizado", body = GoogleSigninResponse),
        (status = 401, description = "ID token inválido")
    )
)]
pub async fn google_signin(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<GoogleSigninPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let session = app_state
        .auth_service
        .google_signin(&payload.id_token)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(session))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    tag = "Auth",
    request_body = RefreshPayload,
    responses(
        (status = 200, description = "Novo par de tokens", body = TokenPairResponse),
        (status = 401, description = "Refresh token inválido, expirado ou de outro tipo")
    )
)]
pub async fn refresh(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<RefreshPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let pair = app_state
        .auth_service
        .refresh(&payload.refresh_token)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(pair))
}

// ---
// Verificação de e-mail
// ---
#[utoipa::path(
    post,
    path = "/api/v1/auth/verify-otp",
    tag = "Auth",
    request_body = VerifyOtpPayload,
    responses(
        (status = 200, description = "E-mail verificado", body = MessageResponse),
        (status = 400, description = "Código inválido ou expirado")
    )
)]
pub async fn verify_otp(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<VerifyOtpPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .auth_service
        .verify_otp(&payload.email, &payload.code)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(message(&app_state, &locale, "messages.email_verified"))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/resend-verification",
    tag = "Auth",
    request_body = EmailPayload,
    responses((status = 200, description = "Código reenviado", body = MessageResponse))
)]
pub async fn resend_verification(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<EmailPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .auth_service
        .resend_verification(&payload.email)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(message(&app_state, &locale, "messages.verification_sent"))
}

/// Fluxo antigo por link; mantido para e-mails já enviados.
#[utoipa::path(
    post,
    path = "/api/v1/auth/verify",
    tag = "Auth",
    request_body = VerifyLinkPayload,
    responses(
        (status = 200, description = "E-mail verificado", body = MessageResponse),
        (status = 400, description = "Token ausente ou não verificável")
    )
)]
pub async fn verify_link(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<VerifyLinkPayload>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .auth_service
        .verify_link_token(&payload.token)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(message(&app_state, &locale, "messages.email_verified"))
}

// ---
// Recuperação de senha
// ---
#[utoipa::path(
    post,
    path = "/api/v1/auth/forgot-password",
    tag = "Auth",
    request_body = EmailPayload,
    responses((status = 200, description = "Sempre 200, exista a conta ou não", body = MessageResponse))
)]
pub async fn forgot_password(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<EmailPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    app_state.auth_service.forgot_password(&payload.email).await;

    Ok(message(&app_state, &locale, "messages.recovery_sent"))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/reset-password-otp",
    tag = "Auth",
    request_body = ResetPasswordOtpPayload,
    responses(
        (status = 200, description = "Senha alterada", body = MessageResponse),
        (status = 400, description = "Código inválido"),
        (status = 422, description = "Senha fraca")
    )
)]
pub async fn reset_password_otp(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<ResetPasswordOtpPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .auth_service
        .reset_password_with_otp(&payload.email, &payload.code, &payload.new_password)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(message(&app_state, &locale, "messages.password_updated"))
}

// ---
// Handler: me (rota protegida)
// ---
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "Auth",
    security(("api_jwt" = [])),
    responses(
        (status = 200, description = "Identidade e perfil do usuário", body = MeResponse),
        (status = 401, description = "Não autenticado")
    )
)]
pub async fn me(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(identity): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let me = app_state
        .auth_service
        .me(identity)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(me))
}
