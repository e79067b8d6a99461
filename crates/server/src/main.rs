use anyhow::Context;
use log::info;
use retrieval_core::Config;
use server::{create_app, AppState, RetrievalService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Set default log level if not already set
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    info!("Starting retrieval server");

    // Missing secrets stop the process before it binds
    let config = Config::load_from_env().context("Failed to load configuration")?;
    let bearer_token = config
        .auth
        .bearer_token
        .clone()
        .context("BEARER_TOKEN environment variable is not set")?;

    let service = RetrievalService::new(&config).context("Failed to initialize service")?;
    service
        .init_schema()
        .await
        .context("Failed to initialize document schema")?;

    info!("Retrieval service initialized for class {}", service.class_name());

    let app = create_app(AppState::new(service, bearer_token), &config.server);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.server.bind_addr))?;

    info!(
        "Server running on http://{} (env: {})",
        config.server.bind_addr, config.server.env
    );

    axum::serve(listener, app)
        .await
        .context("Failed to start server")?;

    Ok(())
}
