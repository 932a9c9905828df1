pub mod router;
pub mod server;
pub mod state;
pub mod tracing;

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::adapter::load_capabilities;
use crate::classification::WasteClassifier;
use crate::config::Config;
use crate::domain::KnowledgeBase;
use crate::observability::Telemetry;

/// Application entry point. Initializes tracing, loads configuration and
/// classifiers, and serves HTTP until shutdown.
pub async fn run() -> Result<()> {
    tracing::init_tracing().context("failed to initialize tracing")?;

    let config = Config::from_env().context("failed to load configuration")?;
    ::tracing::info!(bind = %config.http_bind(), "Loaded settings");

    let knowledge = KnowledgeBase::load(config.knowledge_base_path())
        .context("failed to load knowledge base")?;
    ::tracing::info!(categories = knowledge.len(), "Knowledge base loaded");

    let capabilities = load_capabilities(&config)?;
    let telemetry = Telemetry::new().context("failed to register metrics")?;
    let classifier = WasteClassifier::new(capabilities, Arc::new(knowledge));

    let state = state::AppState::from_config(&config, classifier, telemetry);
    let app = router::router(state);

    server::serve(app, config.http_bind()).await?;
    Ok(())
}
