mod cli;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use pinhole_core::Repository;
use pinhole_gateway::{App, AppState};
use pinhole_generator::RandomGenerator;
use pinhole_redirector::RedirectorService;
use pinhole_shortener::{
    AdminGuard, CleanupService, ReservedAliases, ShortenerConfig, ShortenerService,
};
use pinhole_storage::{InMemoryRepository, MySqlRepository, TimeoutRepository};
use tracing::{info, warn};

use crate::cli::{StorageBackendArg, CLI};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CLI::parse();

    pinhole_telemetry::init(config.log_format.into())?;

    info!(
        listen_addr = %config.listen_addr,
        public_base_url = %config.public_base_url,
        storage_backend = %config.storage,
        code_length = config.code_length,
        store_timeout_ms = config.store_timeout_ms,
        "starting pinhole gateway"
    );

    let timeout = Duration::from_millis(config.store_timeout_ms);
    match config.storage {
        StorageBackendArg::InMemory => {
            let repository = TimeoutRepository::new(InMemoryRepository::new(), timeout);
            run_server(config, Arc::new(repository)).await
        }
        StorageBackendArg::Mysql => {
            let mysql_dsn = config
                .mysql_dsn
                .clone()
                .context("mysql dsn is required when storage backend is mysql")?;
            let repository = MySqlRepository::connect(&mysql_dsn)
                .await
                .context("failed to connect to mysql")?;
            run_server(config, Arc::new(TimeoutRepository::new(repository, timeout))).await
        }
    }
}

async fn run_server<R: Repository>(config: CLI, repository: Arc<R>) -> anyhow::Result<()> {
    let reserved_aliases = config
        .reserved_aliases
        .map(|words| words.into_iter().collect::<ReservedAliases>())
        .unwrap_or_default();
    let shortener_config = ShortenerConfig::builder()
        .reserved_aliases(reserved_aliases)
        .build();

    let admin = AdminGuard::new(config.admin_token);
    if !admin.is_configured() {
        warn!("no admin token configured, cleanup endpoint is disabled");
    }

    let shortener = ShortenerService::with_config(
        Arc::clone(&repository),
        RandomGenerator::new(config.code_length.into()),
        shortener_config,
    );
    let redirector = RedirectorService::new(Arc::clone(&repository));
    let sweeper = CleanupService::new(repository);

    let state = AppState::builder()
        .shortener(Arc::new(shortener))
        .redirector(Arc::new(redirector))
        .sweeper(Arc::new(sweeper))
        .admin(admin)
        .base_url(config.public_base_url)
        .build();

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    info!(listen_addr = %listener.local_addr()?, "gateway listening");

    axum::serve(
        listener,
        App::router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
