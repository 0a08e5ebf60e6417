//! Deployment environment classification.
//!
//! Only the exact value `development` is development-flagged; it selects
//! fail-open handling of evaluator failures. Everything else, including
//! `dev` or `Development`, fails closed.

use std::fmt;

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum Environment {
    Development,
    Test,
    #[default]
    Production,
    Other(String),
}

impl Environment {
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        match s {
            "development" => Environment::Development,
            "test" => Environment::Test,
            "production" => Environment::Production,
            _ => Environment::Other(s.to_string()),
        }
    }

    /// Classify from several environment signals, most specific first.
    ///
    /// Any signal naming development wins; otherwise the first present signal
    /// decides. Returns `None` when no signal is set.
    pub fn from_signals<'a>(signals: impl IntoIterator<Item = Option<&'a str>>) -> Option<Self> {
        let parsed: Vec<Environment> = signals
            .into_iter()
            .flatten()
            .filter(|s| !s.trim().is_empty())
            .map(Environment::parse)
            .collect();
        if parsed.iter().any(Environment::is_development) {
            return Some(Environment::Development);
        }
        parsed.into_iter().next()
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Environment::Development => "development",
            Environment::Test => "test",
            Environment::Production => "production",
            Environment::Other(s) => s,
        }
    }
}

impl From<String> for Environment {
    fn from(s: String) -> Self {
        Environment::parse(&s)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
