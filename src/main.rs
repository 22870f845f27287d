use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use bookbot::config::AppConfig;
use bookbot::db;
use bookbot::models::KnowledgeBase;
use bookbot::routes;
use bookbot::services::ai;
use bookbot::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;
    tracing::info!(
        "session store at {} ({} sessions)",
        config.database_url,
        db::queries::count_sessions(&conn)?
    );

    let kb = match &config.kb_path {
        Some(path) => {
            tracing::info!("loading clinic knowledge base from {path}");
            KnowledgeBase::from_file(path)?
        }
        None => KnowledgeBase::default_clinic(),
    };
    tracing::info!(
        services = kb.services.len(),
        locations = kb.locations.len(),
        "clinic: {}",
        kb.clinic_name
    );

    let llm = ai::from_config(&config)?;

    let state = Arc::new(AppState::new(conn, config.clone(), kb, llm));
    let app = routes::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
