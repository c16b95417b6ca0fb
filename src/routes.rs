// src/routes.rs

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware as axum_middleware,
    routing::{get, post, put},
    Json, Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;

use crate::{
    config::AppState,
    docs::ApiDoc,
    handlers,
    middleware::{auth::auth_guard, rate_limit::rate_limit_guard},
};

// Folga para os cabeçalhos do multipart além do próprio arquivo.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    let parsed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    if parsed.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(parsed)
    }
}

pub fn create_router(app_state: AppState) -> Router {
    // Rotas públicas de autenticação
    let auth_routes = Router::new()
        .route("/signup", post(handlers::auth::signup))
        .route("/signin", post(handlers::auth::signin))
        .route("/google-signin", post(handlers::auth::google_signin))
        .route("/refresh", post(handlers::auth::refresh))
        .route("/verify", post(handlers::auth::verify_link))
        .route("/verify-otp", post(handlers::auth::verify_otp))
        .route("/resend-verification", post(handlers::auth::resend_verification))
        .route("/forgot-password", post(handlers::auth::forgot_password))
        .route("/reset-password-otp", post(handlers::auth::reset_password_otp));

    // Todo o resto exige bearer token
    let protected_routes = Router::new()
        .route("/auth/me", get(handlers::auth::me))
        .route(
            "/onboarding",
            post(handlers::onboarding::complete_onboarding).get(handlers::onboarding::get_onboarding_status),
        )
        .route("/onboarding/owner", post(handlers::profiles::onboard_owner))
        .route(
            "/onboarding/owner/pma",
            post(handlers::profiles::upload_pma)
                .layer(DefaultBodyLimit::max(app_state.settings.max_upload_bytes + MULTIPART_OVERHEAD)),
        )
        .route("/onboarding/subcontractor", post(handlers::profiles::onboard_subcontractor))
        .route("/onboarding/file/signed-url", get(handlers::profiles::get_signed_url))
        .route(
            "/onboarding/categories",
            get(handlers::profiles::list_categories).post(handlers::profiles::create_category),
        )
        .route(
            "/properties",
            get(handlers::properties::list_properties).post(handlers::properties::create_property),
        )
        .route(
            "/properties/{id}",
            get(handlers::properties::get_property)
                .put(handlers::properties::update_property)
                .delete(handlers::properties::delete_property),
        )
        .route(
            "/properties/{id}/units",
            get(handlers::properties::list_units).post(handlers::properties::create_unit),
        )
        .route(
            "/units/{id}",
            put(handlers::properties::update_unit).delete(handlers::properties::delete_unit),
        )
        .route(
            "/technicians",
            get(handlers::technicians::list_technicians).post(handlers::technicians::create_technician),
        )
        .route(
            "/technicians/{id}",
            get(handlers::technicians::get_technician)
                .put(handlers::technicians::update_technician)
                .delete(handlers::technicians::delete_technician),
        )
        .route(
            "/work-orders",
            get(handlers::work_orders::list_work_orders).post(handlers::work_orders::create_work_order),
        )
        .route("/work-orders/options", get(handlers::work_orders::get_work_order_options))
        .route(
            "/work-orders/{id}",
            get(handlers::work_orders::get_work_order).put(handlers::work_orders::update_work_order),
        )
        .route_layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let api_routes = Router::new().nest("/auth", auth_routes).merge(protected_routes);

    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .nest("/api/v1", api_routes)
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), rate_limit_guard))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&app_state.settings.cors_origins))
        .with_state(app_state)
}
