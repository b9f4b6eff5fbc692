// src/main.rs

use dotenvy::dotenv;
use exam_coach::config::Config;
use exam_coach::routes;
use exam_coach::state::AppState;
use exam_coach::store::{AttemptStore, RuleTable};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env()?;

    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    // Both tables must load; a missing file or column stops startup.
    let store = AttemptStore::load(&config.attempts_path).inspect_err(|e| {
        tracing::error!("Failed to load attempts: {}", e);
    })?;
    let rules = RuleTable::load(&config.rules_path, config.rule_match).inspect_err(|e| {
        tracing::error!("Failed to load rules: {}", e);
    })?;

    tracing::info!(
        "{} students, {} attempts, {} rules",
        store.student_count(),
        store.len(),
        rules.len()
    );

    let bind_addr = config.bind_addr.clone();
    let state = AppState::new(store, rules, config);

    // Create the Axum application router
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Listening on {}", bind_addr);

    // Start the server
    axum::serve(listener, app).await?;

    Ok(())
}
