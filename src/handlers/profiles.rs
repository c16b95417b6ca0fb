// src/handlers/profiles.rs

use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::{ActiveUser, AuthenticatedUser},
        i18n::Locale,
    },
    models::profile::{
        CreateCategoryPayload, DocumentUploadResponse, OwnerOnboardingPayload, RoleOnboardingResult, ServiceCategory,
        SignedUrlQuery, SignedUrlResponse, SubcontractorOnboardingPayload,
    },
};

const FILE_FIELD: &str = "file";

// ---
// Onboarding por papel
// ---
#[utoipa::path(
    post,
    path = "/api/v1/onboarding/owner",
    tag = "Onboarding",
    security(("api_jwt" = [])),
    request_body = OwnerOnboardingPayload,
    responses(
        (status = 201, description = "Perfil de proprietário/gestor criado", body = RoleOnboardingResult),
        (status = 409, description = "Usuário já tem perfil"),
        (status = 422, description = "Gestor sem PMA")
    )
)]
pub async fn onboard_owner(
    State(app_state): State<AppState>,
    locale: Locale,
    ActiveUser(user): ActiveUser,
    Json(payload): Json<OwnerOnboardingPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let result = app_state
        .profile_service
        .onboard_owner(user.id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(result)))
}

#[utoipa::path(
    post,
    path = "/api/v1/onboarding/subcontractor",
    tag = "Onboarding",
    security(("api_jwt" = [])),
    request_body = SubcontractorOnboardingPayload,
    responses(
        (status = 201, description = "Perfil de subcontratado criado", body = RoleOnboardingResult),
        (status = 409, description = "Usuário já tem perfil"),
        (status = 422, description = "Categoria de serviço desconhecida")
    )
)]
pub async fn onboard_subcontractor(
    State(app_state): State<AppState>,
    locale: Locale,
    ActiveUser(user): ActiveUser,
    Json(payload): Json<SubcontractorOnboardingPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let result = app_state
        .profile_service
        .onboard_subcontractor(user.id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(result)))
}

// ---
// Documentos
// ---

/// Upload multipart do PMA (campo `file`).
#[utoipa::path(
    post,
    path = "/api/v1/onboarding/owner/pma",
    tag = "Onboarding",
    security(("api_jwt" = [])),
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Documento armazenado", body = DocumentUploadResponse),
        (status = 400, description = "Arquivo ausente, vazio ou grande demais")
    )
)]
pub async fn upload_pma(
    State(app_state): State<AppState>,
    locale: Locale,
    ActiveUser(user): ActiveUser,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidFile(e.body_text()).to_api_error(&locale, &app_state.i18n_store))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidFile(e.body_text()).to_api_error(&locale, &app_state.i18n_store))?;
        upload = Some((filename, content_type, bytes.to_vec()));
    }

    let (filename, content_type, bytes) = upload.ok_or_else(|| {
        AppError::InvalidFile(FILE_FIELD.to_string()).to_api_error(&locale, &app_state.i18n_store)
    })?;

    let response = app_state
        .profile_service
        .upload_pma(user.id, &filename, content_type.as_deref(), bytes)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    get,
    path = "/api/v1/onboarding/file/signed-url",
    tag = "Onboarding",
    security(("api_jwt" = [])),
    params(SignedUrlQuery),
    responses((status = 200, description = "URL assinada", body = SignedUrlResponse))
)]
pub async fn get_signed_url(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
    Query(query): Query<SignedUrlQuery>,
) -> Result<impl IntoResponse, ApiError> {
    query
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let response = app_state
        .profile_service
        .signed_url(&query.path, query.expires_in)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(response))
}

// ---
// Categorias de serviço
// ---
#[utoipa::path(
    get,
    path = "/api/v1/onboarding/categories",
    tag = "Onboarding",
    security(("api_jwt" = [])),
    responses((status = 200, description = "Categorias por ordem de exibição", body = Vec<ServiceCategory>))
)]
pub async fn list_categories(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let categories = app_state
        .profile_service
        .list_categories()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(categories))
}

#[utoipa::path(
    post,
    path = "/api/v1/onboarding/categories",
    tag = "Onboarding",
    security(("api_jwt" = [])),
    request_body = CreateCategoryPayload,
    responses(
        (status = 201, description = "Categoria criada", body = ServiceCategory),
        (status = 409, description = "Slug já existe")
    )
)]
pub async fn create_category(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: ActiveUser,
    Json(payload): Json<CreateCategoryPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let category = app_state
        .profile_service
        .create_category(&payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(category)))
}
