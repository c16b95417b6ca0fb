// src/handlers/work_orders.rs

use axum::{
    extract::{Path, Query, State},
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
    models::work_order::{
        CreateWorkOrderPayload, UpdateWorkOrderPayload, WorkOrder, WorkOrderListQuery, WorkOrderListResponse,
        WorkOrderOptionsResponse,
    },
};

#[utoipa::path(
    get,
    path = "/api/v1/work-orders",
    tag = "Work Orders",
    security(("api_jwt" = [])),
    params(WorkOrderListQuery),
    responses((status = 200, description = "Página de ordens, mais recentes primeiro", body = WorkOrderListResponse))
)]
pub async fn list_work_orders(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Query(query): Query<WorkOrderListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    query
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let page = app_state
        .work_order_service
        .list(tenant.company_id, &query)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(page))
}

#[utoipa::path(
    post,
    path = "/api/v1/work-orders",
    tag = "Work Orders",
    security(("api_jwt" = [])),
    request_body = CreateWorkOrderPayload,
    responses(
        (status = 201, description = "Ordem de serviço aberta", body = WorkOrder),
        (status = 404, description = "Propriedade não encontrada nesta empresa"),
        (status = 422, description = "Unidade, técnico ou prioridade inválidos")
    )
)]
pub async fn create_work_order(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Json(payload): Json<CreateWorkOrderPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let work_order = app_state
        .work_order_service
        .create(tenant.company_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(work_order)))
}

#[utoipa::path(
    get,
    path = "/api/v1/work-orders/options",
    tag = "Work Orders",
    security(("api_jwt" = [])),
    responses((status = 200, description = "Propriedades e unidades para o formulário", body = WorkOrderOptionsResponse))
)]
pub async fn get_work_order_options(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
) -> Result<impl IntoResponse, ApiError> {
    let options = app_state
        .work_order_service
        .options(tenant.company_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(options))
}

#[utoipa::path(
    get,
    path = "/api/v1/work-orders/{id}",
    tag = "Work Orders",
    security(("api_jwt" = [])),
    params(("id" = Uuid, Path, description = "ID da ordem de serviço")),
    responses((status = 200, description = "Ordem de serviço", body = WorkOrder), (status = 404, description = "Não encontrada nesta empresa"))
)]
pub async fn get_work_order(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let work_order = app_state
        .work_order_service
        .get(tenant.company_id, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(work_order))
}

#[utoipa::path(
    put,
    path = "/api/v1/work-orders/{id}",
    tag = "Work Orders",
    security(("api_jwt" = [])),
    params(("id" = Uuid, Path, description = "ID da ordem de serviço")),
    request_body = UpdateWorkOrderPayload,
    responses(
        (status = 200, description = "Ordem atualizada", body = WorkOrder),
        (status = 400, description = "Nenhum campo para atualizar"),
        (status = 404, description = "Não encontrada nesta empresa")
    )
)]
pub async fn update_work_order(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateWorkOrderPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let work_order = app_state
        .work_order_service
        .update(tenant.company_id, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(work_order))
}
