use coin_dashboard::{server, Config, DashboardError};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), DashboardError> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    tracing::info!(
        currency = %config.currency,
        page_size = config.page_size,
        include_descriptions = config.include_descriptions,
        convert_client_side = config.convert_client_side,
        locale = config.locale.name,
        "Starting crypto dashboard"
    );

    server::serve(config).await
}
