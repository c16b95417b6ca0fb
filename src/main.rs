// src/main.rs

use std::net::SocketAddr;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use dispatchiq::{
    config::{self, AppState, Settings},
    routes::create_router,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // 1. Configuração e banco
    let settings = Settings::from_env()?;
    let pool = config::connect_pool(&settings).await?;

    if settings.run_migrations {
        sqlx::migrate!()
            .run(&pool)
            .await
            .context("Falha ao rodar as migrações do banco de dados")?;
        tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");
    }

    // 2. Estado e rotas
    let bind_addr = settings.bind_addr.clone();
    let app_state = AppState::new(settings, pool)?;
    let app = create_router(app_state);

    // 3. Servidor (ConnectInfo alimenta o rate limiter)
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Falha ao iniciar o listener TCP em {}", bind_addr))?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .context("Erro no servidor Axum")?;

    Ok(())
}
