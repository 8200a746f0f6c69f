//! In-process action facade
//!
//! Requests name an action and carry a JSON argument map. Every outcome,
//! including unknown actions, missing arguments and timeouts, comes back as
//! an [`ActionResponse`]; nothing escapes the boundary as an error.

pub mod actions;
pub mod coercion;

use std::sync::Arc;
use std::time::{Duration, Instant};

use dfumt_common::{DfumtError, DispatchError};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::FacadeSettings;
use crate::engine::FormulaEngine;
use crate::metrics::DispatchMetrics;

pub use actions::ActionSpec;
pub use coercion::Arguments;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub name: String,
    #[serde(default)]
    pub arguments: Arguments,
}

impl ActionRequest {
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            name: name.into(),
            arguments: match arguments {
                Value::Object(map) => map,
                _ => Arguments::new(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResponse {
    pub action: String,
    pub success: bool,
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub execution_ms: u64,
    pub summary: String,
}

impl ActionResponse {
    fn failure(action: &str, error: &DfumtError, elapsed: Duration) -> Self {
        Self {
            action: action.to_string(),
            success: false,
            data: None,
            error: Some(error.to_string()),
            execution_ms: elapsed.as_millis() as u64,
            summary: format!("{} failed", action),
        }
    }
}

/// Dispatches requests against one shared engine
#[derive(Clone)]
pub struct ActionDispatcher {
    engine: Arc<Mutex<FormulaEngine>>,
    settings: FacadeSettings,
    metrics: Option<DispatchMetrics>,
}

impl ActionDispatcher {
    pub fn new(engine: FormulaEngine) -> Self {
        let settings = engine.config().facade.clone();
        Self {
            engine: Arc::new(Mutex::new(engine)),
            settings,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: DispatchMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Shared handle to the engine
    pub fn engine(&self) -> Arc<Mutex<FormulaEngine>> {
        Arc::clone(&self.engine)
    }

    pub fn settings(&self) -> &FacadeSettings {
        &self.settings
    }

    /// Run one request to completion on the calling thread
    pub fn dispatch(&self, request: &ActionRequest) -> ActionResponse {
        let started = Instant::now();
        let outcome = self.execute(request);
        let elapsed = started.elapsed();

        let response = match outcome {
            Ok(output) => ActionResponse {
                action: request.name.clone(),
                success: true,
                data: Some(output.data),
                error: None,
                execution_ms: elapsed.as_millis() as u64,
                summary: output.summary,
            },
            Err(err) => {
                debug!(action = %request.name, error = %err, "Action failed");
                ActionResponse::failure(&request.name, &err, elapsed)
            }
        };

        self.record(&response, elapsed);
        info!(
            action = %response.action,
            success = response.success,
            execution_ms = response.execution_ms,
            "Action dispatched"
        );
        response
    }

    fn execute(&self, request: &ActionRequest) -> dfumt_common::Result<actions::ActionOutput> {
        let spec = actions::lookup(&request.name)
            .ok_or_else(|| DispatchError::UnknownAction(request.name.clone()))?;
        actions::check_required(spec, &request.arguments)?;
        let mut engine = self.engine.lock();
        actions::execute(&mut engine, spec, &request.arguments, &self.settings)
    }

    /// Dispatch on the blocking pool and give up after `timeout_ms`.
    ///
    /// The engine has no cancellation points; an abandoned action keeps
    /// running until it finishes and then releases the engine.
    pub async fn dispatch_with_timeout(&self, request: ActionRequest) -> ActionResponse {
        let started = Instant::now();
        let limit = Duration::from_millis(self.settings.timeout_ms);
        let name = request.name.clone();
        let dispatcher = self.clone();

        let handle = tokio::task::spawn_blocking(move || dispatcher.dispatch(&request));

        match tokio::time::timeout(limit, handle).await {
            Ok(Ok(response)) => response,
            Ok(Err(join_error)) => {
                let err = DfumtError::Internal(join_error.to_string());
                let response = ActionResponse::failure(&name, &err, started.elapsed());
                self.record(&response, started.elapsed());
                response
            }
            Err(_) => {
                warn!(action = %name, timeout_ms = self.settings.timeout_ms, "Action timed out");
                if let Some(metrics) = &self.metrics {
                    metrics.action_timeouts.inc();
                }
                // the abandoned dispatch records its own outcome when it finishes
                let err = DfumtError::Timeout(name.clone());
                ActionResponse::failure(&name, &err, started.elapsed())
            }
        }
    }

    /// Parse `input` as an [`ActionRequest`] and dispatch it with the timeout.
    ///
    /// Input that does not parse comes back as a failure response under the
    /// requested name, or an empty name when none can be read.
    pub async fn dispatch_json(&self, input: &str) -> ActionResponse {
        match serde_json::from_str::<ActionRequest>(input) {
            Ok(request) => self.dispatch_with_timeout(request).await,
            Err(err) => {
                let action = requested_name(input);
                warn!(action = %action, error = %err, "Malformed action request");
                let response =
                    ActionResponse::failure(&action, &DfumtError::from(err), Duration::ZERO);
                self.record(&response, Duration::ZERO);
                response
            }
        }
    }

    fn record(&self, response: &ActionResponse, elapsed: Duration) {
        if let Some(metrics) = &self.metrics {
            metrics.actions_total.inc();
            if !response.success {
                metrics.action_failures.inc();
            }
            metrics.action_duration_seconds.observe(elapsed.as_secs_f64());
        }
    }
}

/// `name` of a request that failed to parse, if it is a string
fn requested_name(input: &str) -> String {
    serde_json::from_str::<Value>(input)
        .ok()
        .and_then(|v| v.get("name").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use serde_json::json;

    fn dispatcher() -> ActionDispatcher {
        ActionDispatcher::new(FormulaEngine::new(EngineConfig::default()).unwrap())
    }

    #[test]
    fn test_unknown_action_is_a_failure_response() {
        let response =
            dispatcher().dispatch(&ActionRequest::new("seed.explode", json!({})));
        assert!(!response.success);
        assert!(response.data.is_none());
        assert_eq!(response.error.as_deref(), Some("Dispatch error: Unknown action: seed.explode"));
    }

    #[test]
    fn test_missing_argument() {
        let response =
            dispatcher().dispatch(&ActionRequest::new("seed.extend", json!({"depth": 2})));
        assert!(!response.success);
        assert!(response.error.unwrap().contains("'origin'"));
    }

    #[test]
    fn test_null_counts_as_missing() {
        let response =
            dispatcher().dispatch(&ActionRequest::new("seed.extend", json!({"origin": null})));
        assert!(!response.success);
    }

    #[test]
    fn test_extend_zero() {
        let response = dispatcher().dispatch(&ActionRequest::new(
            "seed.extend",
            json!({"origin": 0, "depth": 2}),
        ));
        assert!(response.success);
        let expanded = response.data.unwrap()["expanded"].as_array().unwrap().len();
        assert_eq!(expanded, 5);
    }

    #[test]
    fn test_cancel_duals_action() {
        let response = dispatcher().dispatch(&ActionRequest::new(
            "seed.cancel_duals",
            json!({"values": [1, -1, 2, -2, 0.5]}),
        ));
        let data = response.data.unwrap();
        assert_eq!(data["contracted"], json!(0.5));
        assert!((data["loss_ratio"].as_f64().unwrap() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_range_error_is_a_failure_response() {
        let response = dispatcher().dispatch(&ActionRequest::new(
            "seed.reduce",
            json!({"vector": [1, 2], "target": 5}),
        ));
        assert!(!response.success);
        assert!(response.error.unwrap().starts_with("Seed error"));
    }

    #[test]
    fn test_oversized_target_is_a_failure_response() {
        let dispatcher = dispatcher();
        for (action, target) in [("seed.elevate", json!(1e19)), ("seed.reduce", json!(1e9))] {
            let response = dispatcher.dispatch(&ActionRequest::new(
                action,
                json!({"vector": [1.0, 2.0], "target": target}),
            ));
            assert!(!response.success, "{} accepted target {}", action, target);
            assert!(response.error.unwrap().contains("'target'"));
        }

        let limit = dispatcher.settings().max_target_dim;
        let response = dispatcher.dispatch(&ActionRequest::new(
            "seed.elevate",
            json!({"vector": [1.0], "target": limit}),
        ));
        assert!(response.success);
        assert_eq!(response.data.unwrap()["vector"].as_array().unwrap().len(), limit);
    }

    #[test]
    fn test_oversized_turns_is_a_failure_response() {
        let dispatcher = dispatcher();
        let response = dispatcher.dispatch(&ActionRequest::new(
            "metabolism.evaluate_constants",
            json!({"turns": 1_000_000}),
        ));
        assert!(!response.success);
        assert!(response.error.unwrap().contains("'turns'"));

        let limit = dispatcher.settings().max_turns;
        let response = dispatcher.dispatch(&ActionRequest::new(
            "metabolism.evaluate_constants",
            json!({"turns": limit}),
        ));
        assert!(response.success);
    }

    #[test]
    fn test_oversized_generations_is_a_failure_response() {
        let dispatcher = dispatcher();
        let response = dispatcher.dispatch(&ActionRequest::new(
            "engine.run",
            json!({"vector": [1, 2], "generations": 1e15}),
        ));
        assert!(!response.success);
        assert!(response.error.unwrap().contains("'generations'"));
        // nothing ran, so nothing was recorded
        assert_eq!(dispatcher.engine().lock().stats().history_len, 0);
    }

    #[test]
    fn test_invalid_mode() {
        let response = dispatcher().dispatch(&ActionRequest::new(
            "metabolism.synthesize",
            json!({"a": 1, "b": 2, "mode": "blend"}),
        ));
        assert!(!response.success);
        assert!(response.error.unwrap().contains("mode"));
    }

    #[test]
    fn test_response_wire_names() {
        let response = dispatcher().dispatch(&ActionRequest::new("constants.list", json!({})));
        let wire = serde_json::to_value(&response).unwrap();
        assert!(wire.get("executionMs").is_some());
        assert!(wire.get("error").is_none());
        assert_eq!(wire["data"].as_array().unwrap().len(), 6);
    }

    #[test]
    fn test_metrics_recorded() {
        let metrics = DispatchMetrics::new().unwrap();
        let dispatcher = dispatcher().with_metrics(metrics.clone());
        dispatcher.dispatch(&ActionRequest::new("constants.list", json!({})));
        dispatcher.dispatch(&ActionRequest::new("nope", json!({})));
        assert_eq!(metrics.actions_total.get(), 2);
        assert_eq!(metrics.action_failures.get(), 1);
    }

    #[tokio::test]
    async fn test_timeout_while_engine_is_busy() {
        let mut config = EngineConfig::default();
        config.facade.timeout_ms = 50;
        let dispatcher = ActionDispatcher::new(FormulaEngine::new(config).unwrap());

        let engine = dispatcher.engine();
        let guard = engine.lock();
        let response = dispatcher
            .dispatch_with_timeout(ActionRequest::new("engine.reset", json!({})))
            .await;
        drop(guard);

        assert!(!response.success);
        assert!(response.error.unwrap().contains("execution timeout"));
    }

    #[tokio::test]
    async fn test_dispatch_json_malformed_requests() {
        let metrics = DispatchMetrics::new().unwrap();
        let dispatcher = dispatcher().with_metrics(metrics.clone());

        let response = dispatcher
            .dispatch_json(r#"{"name": "seed.extend", "arguments": [1, 2]}"#)
            .await;
        assert!(!response.success);
        assert_eq!(response.action, "seed.extend");
        assert!(response.error.unwrap().starts_with("Serialization error"));

        let response = dispatcher.dispatch_json(r#"{"name": 42}"#).await;
        assert!(!response.success);
        assert_eq!(response.action, "");

        let response = dispatcher.dispatch_json("not json").await;
        assert!(!response.success);
        assert_eq!(metrics.action_failures.get(), 3);
    }

    #[tokio::test]
    async fn test_dispatch_json_well_formed() {
        let response = dispatcher()
            .dispatch_json(r#"{"name": "seed.extend", "arguments": {"origin": 0, "depth": 1}}"#)
            .await;
        assert!(response.success, "{:?}", response.error);
    }

    #[tokio::test]
    async fn test_dispatch_with_timeout_completes() {
        let response = dispatcher()
            .dispatch_with_timeout(ActionRequest::new(
                "engine.run",
                json!({"vector": [1, 2, 3]}),
            ))
            .await;
        assert!(response.success, "{:?}", response.error);
        assert!(response.summary.starts_with("Seed:"));
    }
}
