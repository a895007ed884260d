use luct_reporting::{AppState, app, config::Config, db};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;

    let db_pool = db::connect(&config).await?;
    if config.seed_catalogue {
        db::seed_catalogue(&db_pool).await?;
    }
    if let Some(seed) = &config.admin {
        db::seed_admin(&db_pool, seed).await?;
    }

    let app = app(AppState::new(db_pool, &config), &config);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
