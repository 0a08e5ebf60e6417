//! Shared test doubles: a scripted evaluator and a capturing tracing layer.

#![allow(dead_code)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tracing::Level;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

use gatehouse_core::{Environment, RequestDescriptor};
use gatehouse_gateway::admission::AdmissionController;
use gatehouse_gateway::policy::{
    DecisionEvaluator, EvaluationRequest, EvaluatorAdapter, EvaluatorError, PolicyTable, Verdict,
};

pub const BROWSER: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_5) Safari/605.1.15";

#[derive(Debug, Clone)]
pub enum Script {
    Answer(Verdict),
    Unavailable,
    Broken,
    Hang,
}

/// Evaluator that answers from a script and records every request it sees.
pub struct ScriptedEvaluator {
    script: Script,
    seen: Mutex<Vec<EvaluationRequest>>,
}

impl ScriptedEvaluator {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(Self { script, seen: Mutex::new(Vec::new()) })
    }

    pub fn seen(&self) -> Vec<EvaluationRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl DecisionEvaluator for ScriptedEvaluator {
    async fn evaluate(&self, req: &EvaluationRequest) -> Result<Verdict, EvaluatorError> {
        self.seen.lock().unwrap().push(req.clone());
        match &self.script {
            Script::Answer(v) => Ok(v.clone()),
            Script::Unavailable => Err(EvaluatorError::Unavailable("connection refused".into())),
            Script::Broken => Err(EvaluatorError::Internal("malformed response".into())),
            Script::Hang => std::future::pending().await,
        }
    }
}

pub fn controller(evaluator: Arc<dyn DecisionEvaluator>, env: Environment) -> AdmissionController {
    AdmissionController::new(
        PolicyTable::default(),
        EvaluatorAdapter::new(evaluator, Duration::from_millis(250)),
        env,
    )
}

pub fn descriptor(path: &str) -> RequestDescriptor {
    RequestDescriptor::new("192.0.2.10".parse().unwrap(), BROWSER, "GET", path)
}

#[derive(Debug, Clone)]
pub struct Captured {
    pub level: Level,
    pub message: String,
}

/// Captures warn-and-above events emitted by the gateway crate.
#[derive(Clone, Default)]
pub struct CaptureLayer {
    events: Arc<Mutex<Vec<Captured>>>,
}

impl CaptureLayer {
    pub fn events(&self) -> Vec<Captured> {
        self.events.lock().unwrap().clone()
    }

    pub fn count_at(&self, level: Level) -> usize {
        self.events().iter().filter(|e| e.level == level).count()
    }

    /// Install as the thread-local default subscriber until the guard drops.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::registry().with(self.clone());
        tracing::subscriber::set_default(subscriber)
    }
}

impl<S> Layer<S> for CaptureLayer
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if *meta.level() > Level::WARN || !meta.target().starts_with("gatehouse_gateway") {
            return;
        }
        let mut visitor = MessageVisitor(String::new());
        event.record(&mut visitor);
        self.events.lock().unwrap().push(Captured {
            level: *meta.level(),
            message: visitor.0,
        });
    }
}

struct MessageVisitor(String);

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{:?}", value);
        }
    }
}

pub async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}
