// src/config.rs

use std::{env, str::FromStr, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    clients::{GoTrueClient, GoogleJwksVerifier, GoogleTokenVerifier, IdentityProvider, ObjectStore, StorageClient},
    common::i18n::I18nStore,
    db::{
        AccountRepository, OnboardingRepository, PgAccountRepository, PgOnboardingRepository, PgProfileRepository,
        PgPropertyRepository, PgTechnicianRepository, PgWorkOrderRepository, ProfileRepository, PropertyRepository,
        TechnicianRepository, WorkOrderRepository,
    },
    middleware::rate_limit::RateLimiter,
    services::{
        auth::AuthService, onboarding_service::OnboardingService, profile_service::ProfileService,
        property_service::PropertyService, technician_service::TechnicianService, tenancy_service::TenantService,
        token_service::TokenService, work_order_service::WorkOrderService,
    },
};

const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

// ============================================================================
// Settings (variáveis de ambiente)
// ============================================================================

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub database_max_connections: u32,
    pub run_migrations: bool,

    pub supabase_url: String,
    pub supabase_key: String,
    /// Sem ela, as operações administrativas do provedor ficam indisponíveis.
    pub supabase_service_key: Option<String>,
    pub storage_bucket: String,
    pub google_client_id: String,

    pub jwt_secret: String,
    pub jwt_algorithm: String,
    pub access_token_minutes: i64,
    pub refresh_token_days: i64,

    pub cors_origins: Vec<String>,
    pub frontend_url: String,
    pub bind_addr: String,
    pub rate_limit_per_minute: u32,
    pub max_upload_bytes: usize,
}

fn required(key: &str) -> anyhow::Result<String> {
    env::var(key).with_context(|| format!("{} deve ser definida", key))
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parsed<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional(key) {
        Some(raw) => raw.parse().with_context(|| format!("{} inválida: {}", key, raw)),
        None => Ok(default),
    }
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            database_max_connections: parsed("DATABASE_MAX_CONNECTIONS", 5)?,
            run_migrations: parsed("RUN_MIGRATIONS", true)?,
            supabase_url: required("SUPABASE_URL")?,
            supabase_key: required("SUPABASE_KEY")?,
            supabase_service_key: optional("SUPABASE_SERVICE_KEY"),
            storage_bucket: optional("SUPABASE_STORAGE_BUCKET").unwrap_or_else(|| "PMA".to_string()),
            google_client_id: optional("GOOGLE_CLIENT_ID").unwrap_or_default(),
            jwt_secret: required("JWT_SECRET_KEY")?,
            jwt_algorithm: optional("JWT_ALGORITHM").unwrap_or_else(|| "HS256".to_string()),
            access_token_minutes: parsed("ACCESS_TOKEN_EXPIRE_MINUTES", 30)?,
            refresh_token_days: parsed("REFRESH_TOKEN_EXPIRE_DAYS", 7)?,
            cors_origins: optional("CORS_ORIGINS")
                .map(|v| v.split(',').map(|o| o.trim().to_string()).filter(|o| !o.is_empty()).collect())
                .unwrap_or_default(),
            frontend_url: optional("FRONTEND_URL").unwrap_or_else(|| "http://localhost:3000".to_string()),
            bind_addr: optional("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8000".to_string()),
            rate_limit_per_minute: parsed("RATE_LIMIT_PER_MINUTE", 10)?,
            max_upload_bytes: parsed("MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
        })
    }
}

pub async fn connect_pool(settings: &Settings) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(settings.database_max_connections)
        .acquire_timeout(Duration::from_secs(3))
        .connect(&settings.database_url)
        .await
        .context("Falha ao conectar ao banco de dados")?;

    tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");
    Ok(pool)
}

// ============================================================================
// Colaboradores externos
// ============================================================================

/// Tudo que fala com o mundo de fora. Em produção vem do Postgres e do
/// Supabase; nos testes, de implementações em memória.
#[derive(Clone)]
pub struct Backends {
    pub accounts: Arc<dyn AccountRepository>,
    pub properties: Arc<dyn PropertyRepository>,
    pub technicians: Arc<dyn TechnicianRepository>,
    pub work_orders: Arc<dyn WorkOrderRepository>,
    pub onboarding: Arc<dyn OnboardingRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub identity: Arc<dyn IdentityProvider>,
    pub storage: Arc<dyn ObjectStore>,
    pub google: Arc<dyn GoogleTokenVerifier>,
}

impl Backends {
    pub fn production(settings: &Settings, pool: PgPool) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .context("Falha ao criar o cliente HTTP")?;

        // Storage usa a chave de serviço quando existe (bucket privado).
        let storage_key = settings
            .supabase_service_key
            .clone()
            .unwrap_or_else(|| settings.supabase_key.clone());

        Ok(Self {
            accounts: Arc::new(PgAccountRepository::new(pool.clone())),
            properties: Arc::new(PgPropertyRepository::new(pool.clone())),
            technicians: Arc::new(PgTechnicianRepository::new(pool.clone())),
            work_orders: Arc::new(PgWorkOrderRepository::new(pool.clone())),
            onboarding: Arc::new(PgOnboardingRepository::new(pool.clone())),
            profiles: Arc::new(PgProfileRepository::new(pool)),
            identity: Arc::new(GoTrueClient::new(
                http.clone(),
                &settings.supabase_url,
                settings.supabase_key.clone(),
                settings.supabase_service_key.clone(),
                &settings.frontend_url,
            )),
            storage: Arc::new(StorageClient::new(
                http.clone(),
                &settings.supabase_url,
                storage_key,
                settings.storage_bucket.clone(),
            )),
            google: Arc::new(GoogleJwksVerifier::new(http, settings.google_client_id.clone())),
        })
    }
}

// ============================================================================
// AppState
// ============================================================================

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub i18n_store: Arc<I18nStore>,
    pub rate_limiter: Arc<RateLimiter>,

    pub auth_service: AuthService,
    pub tenant_service: TenantService,
    pub onboarding_service: OnboardingService,
    pub profile_service: ProfileService,
    pub property_service: PropertyService,
    pub technician_service: TechnicianService,
    pub work_order_service: WorkOrderService,
}

impl AppState {
    pub fn new(settings: Settings, pool: PgPool) -> anyhow::Result<Self> {
        let backends = Backends::production(&settings, pool)?;
        Self::from_backends(settings, backends)
    }

    /// Monta o gráfico de dependências a partir dos colaboradores.
    pub fn from_backends(settings: Settings, backends: Backends) -> anyhow::Result<Self> {
        let tokens = TokenService::new(
            settings.jwt_secret.clone(),
            &settings.jwt_algorithm,
            settings.access_token_minutes,
            settings.refresh_token_days,
        )?;
        let i18n_store = I18nStore::load()?;

        let auth_service = AuthService::new(
            backends.identity.clone(),
            backends.google.clone(),
            backends.accounts.clone(),
            backends.onboarding.clone(),
            tokens,
        );
        let tenant_service = TenantService::new(backends.accounts.clone());
        let onboarding_service = OnboardingService::new(
            backends.accounts.clone(),
            backends.properties.clone(),
            backends.technicians.clone(),
            backends.onboarding.clone(),
            backends.identity.clone(),
            settings.frontend_url.clone(),
        );
        let profile_service = ProfileService::new(
            backends.accounts.clone(),
            backends.profiles.clone(),
            backends.storage.clone(),
            settings.max_upload_bytes,
        );
        let property_service = PropertyService::new(backends.properties.clone());
        let technician_service = TechnicianService::new(backends.technicians.clone(), backends.properties.clone());
        let work_order_service = WorkOrderService::new(
            backends.work_orders.clone(),
            backends.properties.clone(),
            backends.technicians.clone(),
        );

        Ok(Self {
            settings: Arc::new(settings),
            i18n_store: Arc::new(i18n_store),
            rate_limiter: Arc::new(RateLimiter::new()),
            auth_service,
            tenant_service,
            onboarding_service,
            profile_service,
            property_service,
            technician_service,
            work_order_service,
        })
    }
}
