//! Building tenancy server: registry and tenant API plus the announcement sweep.
//!
//! Run from repo root: `cargo run -p building-tenancy-server`

use building_tenancy::{
    app_router, ensure_database_exists, ensure_global_tables, AppState, TenancyConfig, TenantSchema,
};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("building_tenancy=info,building_tenancy_server=info,tower_http=info")
            }),
        )
        .init();

    let config = TenancyConfig::from_env()?;
    ensure_database_exists(&config.database_url).await?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await?;

    let global = TenantSchema::parse(&config.global_schema)?;
    ensure_global_tables(&pool, &global).await?;

    let address = config.address();
    let state = AppState::new(pool, config)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweep = state.sweep().spawn(shutdown_rx);

    let app = app_router(state).layer(TraceLayer::new_for_http());
    let listener = TcpListener::bind(&address).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shutdown_tx.send(true).ok();
    if let Err(e) = sweep.await {
        tracing::error!(error = %e, "sweep task ended abnormally");
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
