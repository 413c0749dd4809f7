use ielts_backend::{
    config::{get_config, init_config},
    database::{pool::create_pool, postgres::PgEvaluationStore},
    routes,
    services::ai_service::AIService,
    AppState,
};
use reqwest::Client;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    init_config()?;
    let config = get_config();

    let pool = create_pool(config).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Migrations applied");

    let http_client = Client::builder()
        .timeout(Duration::from_secs(config.llm_timeout_secs + 5))
        .build()?;
    let generator = AIService::new(
        config.openai_api_key.clone(),
        config.openai_base_url.clone(),
        config.openai_model.clone(),
        Duration::from_secs(config.llm_timeout_secs),
        http_client,
    );

    let app_state = AppState::new(
        config.clone(),
        Arc::new(PgEvaluationStore::new(pool)),
        Arc::new(generator),
    );
    let app = routes::create_router(app_state);

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
