use std::future::Future;
use std::sync::Arc;

use axum::http::StatusCode;
use tokio::time::Instant;

use gatehouse_core::{
    Decision, DenialReason, Environment, EvaluationFailure, FailureKind, RequestDescriptor,
};

pub use crate::config::schema::EnforcementMode;
use crate::obs::AdmissionMetrics;
use crate::policy::{EvaluatorAdapter, PolicyTable};

/// Terminal response for a request that must not reach the handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rejection {
    pub status: StatusCode,
    pub error: &'static str,
    pub message: &'static str,
}

impl Rejection {
    pub fn for_denial(reason: DenialReason) -> Self {
        let message = match reason {
            DenialReason::Bot => "Automated requests are not allowed",
            DenialReason::Shield => "Request blocked by security policy",
            DenialReason::RateLimit => "Too many requests",
            DenialReason::Other => "Forbidden",
        };
        Self { status: StatusCode::FORBIDDEN, error: "Forbidden", message }
    }

    pub fn evaluator_failure() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: "Internal server error",
            message: "Security middleware failure",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionOutcome {
    Proceed,
    Reject(Rejection),
}

/// Per-request admission: role → quota → evaluator → outcome.
///
/// Holds no per-request state; one instance serves every request.
pub struct AdmissionController {
    table: PolicyTable,
    adapter: EvaluatorAdapter,
    environment: Environment,
    mode: EnforcementMode,
    metrics: Arc<AdmissionMetrics>,
}

impl AdmissionController {
    pub fn new(table: PolicyTable, adapter: EvaluatorAdapter, environment: Environment) -> Self {
        Self {
            table,
            adapter,
            environment,
            mode: EnforcementMode::Live,
            metrics: Arc::new(AdmissionMetrics::default()),
        }
    }

    pub fn with_mode(mut self, mode: EnforcementMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<AdmissionMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub async fn admit(&self, descriptor: &RequestDescriptor) -> AdmissionOutcome {
        self.admit_until(descriptor, std::future::pending::<()>()).await
    }

    /// Like `admit`, but gives up when `abort` resolves first. The in-flight
    /// evaluator call is dropped and the request is handled as an
    /// evaluation failure.
    pub async fn admit_until<F>(&self, descriptor: &RequestDescriptor, abort: F) -> AdmissionOutcome
    where
        F: Future<Output = ()>,
    {
        let role = descriptor.effective_role();
        let quota = self.table.quota_for(role);

        let started = Instant::now();
        let evaluated = tokio::select! {
            biased;
            _ = abort => Err(EvaluationFailure::new(
                FailureKind::Aborted,
                "request aborted before the evaluator answered",
            )),
            r = self.adapter.evaluate(descriptor, quota) => r,
        };
        self.metrics
            .evaluation_duration
            .observe(&[("role", role.as_str())], started.elapsed());

        match evaluated {
            Ok(decision) => self.on_decision(descriptor, decision),
            Err(failure) => self.on_failure(descriptor, &failure),
        }
    }

    fn on_decision(&self, d: &RequestDescriptor, decision: Decision) -> AdmissionOutcome {
        let role = d.effective_role().as_str();
        let reason = match decision {
            Decision::Allowed => {
                self.metrics
                    .decisions
                    .inc(&[("outcome", "proceed"), ("reason", "none"), ("role", role)]);
                return AdmissionOutcome::Proceed;
            }
            Decision::Denied(reason) => reason,
        };

        if self.mode == EnforcementMode::DryRun {
            tracing::warn!(
                reason = %reason,
                ip = %d.ip,
                user_agent = %d.user_agent,
                path = %d.path,
                method = %d.method,
                role,
                dry_run = true,
                "request would be denied"
            );
            self.metrics
                .decisions
                .inc(&[("outcome", "dry_run"), ("reason", reason.as_str()), ("role", role)]);
            return AdmissionOutcome::Proceed;
        }

        tracing::warn!(
            reason = %reason,
            ip = %d.ip,
            user_agent = %d.user_agent,
            path = %d.path,
            method = %d.method,
            role,
            "request denied"
        );
        self.metrics
            .decisions
            .inc(&[("outcome", "reject"), ("reason", reason.as_str()), ("role", role)]);
        AdmissionOutcome::Reject(Rejection::for_denial(reason))
    }

    fn on_failure(&self, d: &RequestDescriptor, failure: &EvaluationFailure) -> AdmissionOutcome {
        let role = d.effective_role().as_str();
        self.metrics.evaluator_failures.inc(&[
            ("kind", failure.kind.as_str()),
            ("environment", self.environment.as_str()),
        ]);

        if self.environment.is_development() {
            tracing::warn!(
                kind = failure.kind.as_str(),
                error = %failure.message,
                ip = %d.ip,
                user_agent = %d.user_agent,
                path = %d.path,
                method = %d.method,
                role,
                environment = %self.environment,
                "evaluator failure in development, allowing request"
            );
            self.metrics
                .decisions
                .inc(&[("outcome", "proceed"), ("reason", "failure"), ("role", role)]);
            return AdmissionOutcome::Proceed;
        }

        tracing::error!(
            kind = failure.kind.as_str(),
            error = %failure.message,
            failure = ?failure,
            ip = %d.ip,
            user_agent = %d.user_agent,
            path = %d.path,
            method = %d.method,
            role,
            environment = %self.environment,
            "evaluator failure, rejecting request"
        );
        self.metrics
            .decisions
            .inc(&[("outcome", "reject"), ("reason", "failure"), ("role", role)]);
        AdmissionOutcome::Reject(Rejection::evaluator_failure())
    }
}
