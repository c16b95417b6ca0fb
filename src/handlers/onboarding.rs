// src/handlers/onboarding.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::ActiveUser, i18n::Locale},
    models::onboarding::{OnboardingPayload, OnboardingResponse, OnboardingStatusResponse},
};

// ---
// Handler: onboarding inicial da empresa (roda uma vez)
// ---
#[utoipa::path(
    post,
    path = "/api/v1/onboarding",
    tag = "Onboarding",
    security(("api_jwt" = [])),
    request_body = OnboardingPayload,
    responses(
        (status = 201, description = "Empresa configurada", body = OnboardingResponse),
        (status = 400, description = "Usuário sem perfil ou sem empresa"),
        (status = 409, description = "Onboarding já realizado"),
        (status = 422, description = "Horário, fuso ou referência inválidos")
    )
)]
pub async fn complete_onboarding(
    State(app_state): State<AppState>,
    locale: Locale,
    ActiveUser(user): ActiveUser,
    Json(payload): Json<OnboardingPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let response = app_state
        .onboarding_service
        .complete(&user, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    get,
    path = "/api/v1/onboarding",
    tag = "Onboarding",
    security(("api_jwt" = [])),
    responses(
        (status = 200, description = "Configurações e cadastros da empresa", body = OnboardingStatusResponse)
    )
)]
pub async fn get_onboarding_status(
    State(app_state): State<AppState>,
    locale: Locale,
    ActiveUser(user): ActiveUser,
) -> Result<impl IntoResponse, ApiError> {
    let status = app_state
        .onboarding_service
        .status(user.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(status))
}
