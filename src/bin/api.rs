use std::sync::Arc;

use lambda_runtime::{LambdaEvent, service_fn};
use portfolio::api::function_handler;
use portfolio::core::config::AppConfig;
use portfolio::state::AppState;
use serde_json::Value;

#[tokio::main]
async fn main() -> Result<(), lambda_runtime::Error> {
    portfolio::setup_logging();

    let config = AppConfig::from_env().map_err(|e| {
        tracing::error!("Config error: {}", e);
        lambda_runtime::Error::from(e)
    })?;
    // One state per execution environment; the in-memory store lives as long
    // as the warm container.
    let state = AppState::initialize(config).await;

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        function_handler(Arc::clone(&state), event)
    }))
    .await
}
