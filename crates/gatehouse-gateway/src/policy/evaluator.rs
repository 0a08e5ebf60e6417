//! Decision evaluator capability and the adapter that normalizes it.
//!
//! Any `DecisionEvaluator` (the bundled `LocalEvaluator`, a remote service
//! client, a test double) can sit behind `EvaluatorAdapter`. The adapter owns
//! the deadline and turns every evaluator error into an `EvaluationFailure`.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use gatehouse_core::{Decision, DenialReason, EvaluationFailure, FailureKind, Quota, RequestDescriptor};

/// One outbound evaluation, scoped to the caller's quota.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationRequest {
    pub ip: IpAddr,
    pub user_agent: String,
    pub path: String,
    pub method: String,
    pub window: Duration,
    pub max_requests: u32,
    pub counter_name: String,
}

impl EvaluationRequest {
    pub fn scoped(descriptor: &RequestDescriptor, quota: &Quota) -> Self {
        Self {
            ip: descriptor.ip,
            user_agent: descriptor.user_agent.clone(),
            path: descriptor.path.clone(),
            method: descriptor.method.clone(),
            window: quota.window,
            max_requests: quota.max_requests,
            counter_name: quota.counter_name(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conclusion {
    Allow,
    Deny,
}

/// Signal reported by an evaluator alongside its conclusion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    Bot,
    Shield,
    RateLimit,
    Unrecognized(String),
}

/// Raw evaluator answer, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub conclusion: Conclusion,
    pub signals: Vec<Signal>,
}

impl Verdict {
    pub fn allow() -> Self {
        Self { conclusion: Conclusion::Allow, signals: Vec::new() }
    }

    pub fn deny(signals: Vec<Signal>) -> Self {
        Self { conclusion: Conclusion::Deny, signals }
    }
}

#[derive(Debug, Error)]
pub enum EvaluatorError {
    #[error("evaluator unavailable: {0}")]
    Unavailable(String),
    #[error("evaluator error: {0}")]
    Internal(String),
}

#[async_trait]
pub trait DecisionEvaluator: Send + Sync {
    async fn evaluate(&self, req: &EvaluationRequest) -> Result<Verdict, EvaluatorError>;
}

/// Collapse a verdict into a single decision.
///
/// Precedence is fixed (Bot, Shield, RateLimit, Other) because evaluators
/// may report several signals for one request. A deny without any known
/// signal is `Other`.
pub fn normalize(verdict: &Verdict) -> Decision {
    if verdict.conclusion == Conclusion::Allow {
        return Decision::Allowed;
    }
    let has = |s: &Signal| verdict.signals.contains(s);
    let reason = if has(&Signal::Bot) {
        DenialReason::Bot
    } else if has(&Signal::Shield) {
        DenialReason::Shield
    } else if has(&Signal::RateLimit) {
        DenialReason::RateLimit
    } else {
        DenialReason::Other
    };
    Decision::Denied(reason)
}

/// Deadline-bounded, single-shot wrapper around an evaluator. No retries.
#[derive(Clone)]
pub struct EvaluatorAdapter {
    evaluator: Arc<dyn DecisionEvaluator>,
    timeout: Duration,
}

impl EvaluatorAdapter {
    pub fn new(evaluator: Arc<dyn DecisionEvaluator>, timeout: Duration) -> Self {
        Self { evaluator, timeout }
    }

    pub async fn evaluate(
        &self,
        descriptor: &RequestDescriptor,
        quota: &Quota,
    ) -> Result<Decision, EvaluationFailure> {
        let req = EvaluationRequest::scoped(descriptor, quota);
        match tokio::time::timeout(self.timeout, self.evaluator.evaluate(&req)).await {
            Ok(Ok(verdict)) => Ok(normalize(&verdict)),
            Ok(Err(EvaluatorError::Unavailable(msg))) => {
                Err(EvaluationFailure::new(FailureKind::Unavailable, msg))
            }
            Ok(Err(EvaluatorError::Internal(msg))) => {
                Err(EvaluationFailure::new(FailureKind::Malfunction, msg))
            }
            Err(_) => Err(EvaluationFailure::new(
                FailureKind::Timeout,
                format!("no decision within {}ms", self.timeout.as_millis()),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_ignores_signals() {
        let v = Verdict { conclusion: Conclusion::Allow, signals: vec![Signal::Bot] };
        assert_eq!(normalize(&v), Decision::Allowed);
    }

    #[test]
    fn precedence_is_bot_shield_rate_limit() {
        let v = Verdict::deny(vec![Signal::RateLimit, Signal::Shield, Signal::Bot]);
        assert_eq!(normalize(&v), Decision::Denied(DenialReason::Bot));

        let v = Verdict::deny(vec![Signal::RateLimit, Signal::Shield]);
        assert_eq!(normalize(&v), Decision::Denied(DenialReason::Shield));

        let v = Verdict::deny(vec![Signal::Unrecognized("geo".into()), Signal::RateLimit]);
        assert_eq!(normalize(&v), Decision::Denied(DenialReason::RateLimit));
    }

    #[test]
    fn unknown_or_missing_reason_is_other() {
        let v = Verdict::deny(vec![Signal::Unrecognized("email".into())]);
        assert_eq!(normalize(&v), Decision::Denied(DenialReason::Other));
        assert_eq!(normalize(&Verdict::deny(Vec::new())), Decision::Denied(DenialReason::Other));
    }
}
