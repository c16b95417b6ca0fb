// src/middleware/auth.rs

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};

use crate::{
    clients::Identity,
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
};

/// Identidade carregada pelo `auth_guard` e guardada nas extensions da requisição.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Identity);

// ============================================================================
// Guardião de rotas autenticadas
// ============================================================================

pub async fn auth_guard(
    State(app_state): State<AppState>,
    locale: Locale,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().to_string())
        .ok_or_else(|| AppError::InvalidToken.to_api_error(&locale, &app_state.i18n_store))?;

    let identity = app_state
        .auth_service
        .authenticate(&token)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    request.extensions_mut().insert(AuthenticatedUser(identity));
    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<AuthenticatedUser>().cloned().ok_or_else(|| {
            let app_state = AppState::from_ref(state);
            AppError::InvalidToken.to_api_error(&Locale::from_headers(&parts.headers), &app_state.i18n_store)
        })
    }
}

/// Usuário autenticado E com e-mail confirmado.
#[derive(Debug, Clone)]
pub struct ActiveUser(pub Identity);

impl<S> FromRequestParts<S> for ActiveUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthenticatedUser(identity) = AuthenticatedUser::from_request_parts(parts, state).await?;
        if !identity.email_confirmed() {
            let app_state = AppState::from_ref(state);
            return Err(AppError::EmailNotVerified
                .to_api_error(&Locale::from_headers(&parts.headers), &app_state.i18n_store));
        }
        Ok(ActiveUser(identity))
    }
}
