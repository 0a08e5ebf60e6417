//! Shared application state for the Gatehouse gateway.
//!
//! Built once at startup; startup errors are returned, never panicked on.

use std::sync::Arc;
use std::time::{Duration, Instant};

use gatehouse_core::error::Result;

use crate::admission::AdmissionController;
use crate::config::GatewayConfig;
use crate::obs::AdmissionMetrics;
use crate::policy::{DecisionEvaluator, EvaluatorAdapter, LocalEvaluator, PolicyTable};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    admission: Arc<AdmissionController>,
    metrics: Arc<AdmissionMetrics>,
}

struct AppStateInner {
    cfg: GatewayConfig,
    started: Instant,
}

impl AppState {
    /// Build state backed by the bundled local evaluator.
    pub fn new(cfg: GatewayConfig) -> Result<Self> {
        let evaluator = Arc::new(LocalEvaluator::new(cfg.admission.local_evaluator.clone()));
        Self::with_evaluator(cfg, evaluator)
    }

    /// Build state around any evaluator implementation.
    pub fn with_evaluator(cfg: GatewayConfig, evaluator: Arc<dyn DecisionEvaluator>) -> Result<Self> {
        cfg.validate()?;

        let metrics = Arc::new(AdmissionMetrics::default());
        let adapter = EvaluatorAdapter::new(
            evaluator,
            Duration::from_millis(cfg.admission.evaluator_timeout_ms),
        );
        let admission = AdmissionController::new(
            PolicyTable::from_config(&cfg.admission.quotas),
            adapter,
            cfg.gateway.environment.clone(),
        )
        .with_mode(cfg.admission.mode)
        .with_metrics(Arc::clone(&metrics));

        tracing::info!(
            environment = %cfg.gateway.environment,
            mode = ?cfg.admission.mode,
            fail_open = cfg.gateway.environment.is_development(),
            "admission controller ready"
        );

        Ok(Self {
            inner: Arc::new(AppStateInner { cfg, started: Instant::now() }),
            admission: Arc::new(admission),
            metrics,
        })
    }

    pub fn cfg(&self) -> &GatewayConfig {
        &self.inner.cfg
    }

    pub fn uptime(&self) -> Duration {
        self.inner.started.elapsed()
    }

    pub fn admission(&self) -> Arc<AdmissionController> {
        Arc::clone(&self.admission)
    }

    pub fn metrics(&self) -> Arc<AdmissionMetrics> {
        Arc::clone(&self.metrics)
    }
}
