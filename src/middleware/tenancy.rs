// src/middleware/tenancy.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use uuid::Uuid;

use crate::{
    clients::Identity,
    common::error::ApiError,
    config::AppState,
    middleware::{auth::ActiveUser, i18n::Locale},
};

/// Empresa do usuário autenticado. Todo recurso filtra por `company_id`
/// vindo daqui, nunca do corpo ou da URL.
#[derive(Debug, Clone)]
pub struct TenantContext {
    pub company_id: Uuid,
    pub user: Identity,
}

impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ActiveUser(user) = ActiveUser::from_request_parts(parts, state).await?;
        let app_state = AppState::from_ref(state);

        let company_id = app_state
            .tenant_service
            .resolve_company(user.id)
            .await
            .map_err(|e| e.to_api_error(&Locale::from_headers(&parts.headers), &app_state.i18n_store))?;

        Ok(TenantContext { company_id, user })
    }
}
