//! Admission decisions and evaluation failures.
//!
//! A `Decision` is a policy outcome. An `EvaluationFailure` means no policy
//! outcome exists; it is deliberately a separate type so nothing can treat a
//! broken evaluator as an allow or a deny by accident.

use std::fmt;

/// Why a request was denied. Exactly one per denial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DenialReason {
    Bot,
    Shield,
    RateLimit,
    Other,
}

impl DenialReason {
    pub fn as_str(self) -> &'static str {
        match self {
            DenialReason::Bot => "bot",
            DenialReason::Shield => "shield",
            DenialReason::RateLimit => "rate_limit",
            DenialReason::Other => "other",
        }
    }
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one admission evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Denied(DenialReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Evaluator could not be reached.
    Unavailable,
    /// Caller-supplied deadline expired.
    Timeout,
    /// Surrounding pipeline gave up on the request.
    Aborted,
    /// Evaluator answered with an error.
    Malfunction,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::Unavailable => "unavailable",
            FailureKind::Timeout => "timeout",
            FailureKind::Aborted => "aborted",
            FailureKind::Malfunction => "malfunction",
        }
    }
}

/// The evaluator did not produce a decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl EvaluationFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for EvaluationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.as_str(), self.message)
    }
}

impl std::error::Error for EvaluationFailure {}
