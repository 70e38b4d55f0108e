mod api;
mod dashboard;
mod middleware;
mod scheduler;

use std::sync::Arc;

use newsdigest_pipeline::PipelineContext;
use newsdigest_scraper::PortalClient;
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(newsdigest_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    tracing::info!(config = ?config, "starting newsdigest-server");

    let pool_config = newsdigest_db::PoolConfig::from_app_config(&config);
    let pool = newsdigest_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = newsdigest_db::run_migrations(&pool).await?;
    tracing::info!(applied, "database migrations up to date");

    let pipeline = PipelineContext {
        pool,
        portal: Arc::new(PortalClient::from_app_config(&config)?),
        nlp: newsdigest_nlp::build_backends(&config)?,
    };
    tracing::info!(backend = %config.nlp_backend, "nlp backends ready");

    let _scheduler = scheduler::build_scheduler(pipeline.clone(), Arc::clone(&config)).await?;

    let auth = AuthState::from_keys(&config.api_keys, config.is_development())?;
    let app = build_app(
        AppState::new(Arc::clone(&config), pipeline),
        auth,
        default_rate_limit_state(),
    );
    if config.dashboard_enabled {
        tracing::info!("dashboard mounted at /dashboard");
    }

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
