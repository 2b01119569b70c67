use publish_hour::{Aggregator, AppState, Config, ResultCache, fetcher::build_source, router};
use std::net::SocketAddr;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!("configuration error: {err}");
            return Err(err.into());
        }
    };

    let source = build_source(&config)?;
    info!(
        "using {} source at {} (utc offset {})",
        source.name(),
        config.source.base_url,
        config.offset
    );
    let aggregator = Aggregator::new(source, ResultCache::new(), config.offset);
    let app = router(AppState::new(aggregator));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
