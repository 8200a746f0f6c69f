//! D-FUMT Engine Binary
//!
//! Reads one JSON action request from stdin and prints the response.

use std::io::Read;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dfumt_engine::{ActionDispatcher, DispatchMetrics, EngineConfig, FormulaEngine, VERSION};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    info!("Starting D-FUMT engine v{}", VERSION);

    // Load configuration
    let config = EngineConfig::load()?;
    info!("Loaded configuration: {:?}", config);

    let metrics = DispatchMetrics::new()?;
    metrics.register(prometheus::default_registry())?;

    let engine = FormulaEngine::new(config)?;
    let dispatcher = ActionDispatcher::new(engine).with_metrics(metrics);

    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("Failed to read request from stdin")?;

    let response = dispatcher.dispatch_json(&input).await;
    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(())
}
