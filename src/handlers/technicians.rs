// src/handlers/technicians.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{i18n::Locale, tenancy::TenantContext},
    models::technician::{CreateTechnicianPayload, Technician, UpdateTechnicianPayload},
};

#[utoipa::path(
    get,
    path = "/api/v1/technicians",
    tag = "Technicians",
    security(("api_jwt" = [])),
    responses((status = 200, description = "Técnicos por sobrenome e nome", body = Vec<Technician>))
)]
pub async fn list_technicians(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
) -> Result<impl IntoResponse, ApiError> {
    let technicians = app_state
        .technician_service
        .list(tenant.company_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(technicians))
}

#[utoipa::path(
    post,
    path = "/api/v1/technicians",
    tag = "Technicians",
    security(("api_jwt" = [])),
    request_body = CreateTechnicianPayload,
    responses(
        (status = 201, description = "Técnico criado", body = Technician),
        (status = 422, description = "Propriedade padrão de outra empresa ou UUID inválido")
    )
)]
pub async fn create_technician(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Json(payload): Json<CreateTechnicianPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let technician = app_state
        .technician_service
        .create(tenant.company_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(technician)))
}

#[utoipa::path(
    get,
    path = "/api/v1/technicians/{id}",
    tag = "Technicians",
    security(("api_jwt" = [])),
    params(("id" = Uuid, Path, description = "ID do técnico")),
    responses((status = 200, description = "Técnico", body = Technician), (status = 404, description = "Não encontrado nesta empresa"))
)]
pub async fn get_technician(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let technician = app_state
        .technician_service
        .get(tenant.company_id, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(technician))
}

#[utoipa::path(
    put,
    path = "/api/v1/technicians/{id}",
    tag = "Technicians",
    security(("api_jwt" = [])),
    params(("id" = Uuid, Path, description = "ID do técnico")),
    request_body = UpdateTechnicianPayload,
    responses(
        (status = 200, description = "Técnico atualizado", body = Technician),
        (status = 400, description = "Nenhum campo para atualizar"),
        (status = 404, description = "Não encontrado nesta empresa")
    )
)]
pub async fn update_technician(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTechnicianPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let technician = app_state
        .technician_service
        .update(tenant.company_id, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(technician))
}

#[utoipa::path(
    delete,
    path = "/api/v1/technicians/{id}",
    tag = "Technicians",
    security(("api_jwt" = [])),
    params(("id" = Uuid, Path, description = "ID do técnico")),
    responses((status = 204, description = "Removido"), (status = 404, description = "Não encontrado"))
)]
pub async fn delete_technician(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .technician_service
        .delete(tenant.company_id, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
