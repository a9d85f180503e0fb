use bookkeeping_report::{build_router, AppConfig, AppState, HttpDocumentSource, ReportService};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .with_level(true)
        .init();

    let config = AppConfig::load()?;
    info!("Starting server with config: {:?}", config);

    let expectations = config.expectation_table();
    info!("Loaded expectations for {} suppliers", expectations.len());

    let source = Arc::new(HttpDocumentSource::new(config.source.clone()));
    let service = Arc::new(ReportService::new(source, expectations));
    let app = build_router(AppState::new(service, &config.access.code));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    info!("Pages:");
    info!("  GET  /          - login");
    info!("  GET  /home      - date picker");
    info!("  GET  /report    - period report");
    info!("API Endpoints:");
    info!("  GET  /api/report             - audit + unlinked expenses");
    info!("  GET  /api/income/file        - merged income documents");
    info!("  GET  /api/expenses/file      - merged expense documents");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
