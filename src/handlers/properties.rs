// src/handlers/properties.rs

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
    models::property::{CreatePropertyPayload, CreateUnitPayload, Property, PropertyChanges, Unit, UnitChanges},
};

#[utoipa::path(
    get,
    path = "/api/v1/properties",
    tag = "Properties",
    security(("api_jwt" = [])),
    responses((status = 200, description = "Propriedades da empresa, por nome", body = Vec<Property>))
)]
pub async fn list_properties(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
) -> Result<impl IntoResponse, ApiError> {
    let properties = app_state
        .property_service
        .list(tenant.company_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(properties))
}

#[utoipa::path(
    post,
    path = "/api/v1/properties",
    tag = "Properties",
    security(("api_jwt" = [])),
    request_body = CreatePropertyPayload,
    responses((status = 201, description = "Propriedade criada", body = Property))
)]
pub async fn create_property(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Json(payload): Json<CreatePropertyPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let property = app_state
        .property_service
        .create(tenant.company_id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(property)))
}

#[utoipa::path(
    get,
    path = "/api/v1/properties/{id}",
    tag = "Properties",
    security(("api_jwt" = [])),
    params(("id" = Uuid, Path, description = "ID da propriedade")),
    responses(
        (status = 200, description = "Propriedade", body = Property),
        (status = 404, description = "Não encontrada nesta empresa")
    )
)]
pub async fn get_property(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let property = app_state
        .property_service
        .get(tenant.company_id, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(property))
}

#[utoipa::path(
    put,
    path = "/api/v1/properties/{id}",
    tag = "Properties",
    security(("api_jwt" = [])),
    params(("id" = Uuid, Path, description = "ID da propriedade")),
    request_body = PropertyChanges,
    responses(
        (status = 200, description = "Propriedade atualizada", body = Property),
        (status = 400, description = "Nenhum campo para atualizar"),
        (status = 404, description = "Não encontrada nesta empresa")
    )
)]
pub async fn update_property(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(changes): Json<PropertyChanges>,
) -> Result<impl IntoResponse, ApiError> {
    changes
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let property = app_state
        .property_service
        .update(tenant.company_id, id, &changes)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(property))
}

#[utoipa::path(
    delete,
    path = "/api/v1/properties/{id}",
    tag = "Properties",
    security(("api_jwt" = [])),
    params(("id" = Uuid, Path, description = "ID da propriedade")),
    responses(
        (status = 204, description = "Removida"),
        (status = 404, description = "Não encontrada nesta empresa")
    )
)]
pub async fn delete_property(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .property_service
        .delete(tenant.company_id, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// ---
// Unidades
// ---
#[utoipa::path(
    get,
    path = "/api/v1/properties/{id}/units",
    tag = "Properties",
    security(("api_jwt" = [])),
    params(("id" = Uuid, Path, description = "ID da propriedade")),
    responses((status = 200, description = "Unidades da propriedade", body = Vec<Unit>))
)]
pub async fn list_units(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(property_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let units = app_state
        .property_service
        .list_units(tenant.company_id, property_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(units))
}

#[utoipa::path(
    post,
    path = "/api/v1/properties/{id}/units",
    tag = "Properties",
    security(("api_jwt" = [])),
    params(("id" = Uuid, Path, description = "ID da propriedade")),
    request_body = CreateUnitPayload,
    responses(
        (status = 201, description = "Unidade criada", body = Unit),
        (status = 409, description = "Rótulo já existe nesta propriedade")
    )
)]
pub async fn create_unit(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(property_id): Path<Uuid>,
    Json(payload): Json<CreateUnitPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let unit = app_state
        .property_service
        .create_unit(tenant.company_id, property_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(unit)))
}

#[utoipa::path(
    put,
    path = "/api/v1/units/{id}",
    tag = "Properties",
    security(("api_jwt" = [])),
    params(("id" = Uuid, Path, description = "ID da unidade")),
    request_body = UnitChanges,
    responses(
        (status = 200, description = "Unidade atualizada", body = Unit),
        (status = 404, description = "Não encontrada nesta empresa")
    )
)]
pub async fn update_unit(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(unit_id): Path<Uuid>,
    Json(changes): Json<UnitChanges>,
) -> Result<impl IntoResponse, ApiError> {
    changes
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let unit = app_state
        .property_service
        .update_unit(tenant.company_id, unit_id, &changes)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(unit))
}

#[utoipa::path(
    delete,
    path = "/api/v1/units/{id}",
    tag = "Properties",
    security(("api_jwt" = [])),
    params(("id" = Uuid, Path, description = "ID da unidade")),
    responses((status = 204, description = "Removida"), (status = 404, description = "Não encontrada"))
)]
pub async fn delete_unit(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(unit_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .property_service
        .delete_unit(tenant.company_id, unit_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
