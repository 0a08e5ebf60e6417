//! Caller identity classes and their rate-limit quotas.

use std::fmt;
use std::time::Duration;

use serde::Deserialize;

/// Coarse identity class used to pick a rate-limit tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallerRole {
    #[default]
    Guest,
    User,
    Admin,
}

impl CallerRole {
    /// All declared roles, in ascending privilege order.
    pub const ALL: [CallerRole; 3] = [CallerRole::Guest, CallerRole::User, CallerRole::Admin];

    /// Resolve a role claim attached by upstream authentication.
    ///
    /// Upstream may omit the role or attach one this layer does not know
    /// about; both resolve to `Guest` instead of failing the request.
    pub fn from_claim(claim: Option<&str>) -> Self {
        match claim.map(str::trim) {
            Some(c) if c.eq_ignore_ascii_case("admin") => CallerRole::Admin,
            Some(c) if c.eq_ignore_ascii_case("user") => CallerRole::User,
            _ => CallerRole::Guest,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CallerRole::Guest => "guest",
            CallerRole::User => "user",
            CallerRole::Admin => "admin",
        }
    }
}

impl fmt::Display for CallerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Admissible request rate for one role: at most `max_requests` inside any
/// trailing `window`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quota {
    pub window: Duration,
    pub max_requests: u32,
    pub label: String,
}

impl Quota {
    pub fn new(window: Duration, max_requests: u32, label: impl Into<String>) -> Self {
        Self {
            window,
            max_requests,
            label: label.into(),
        }
    }

    /// Evaluator counter name. Quotas are labelled per role, so a guest and
    /// an admin hitting the same endpoint never share a bucket.
    pub fn counter_name(&self) -> String {
        format!("{}-rate-limit", self.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_unknown_claim_is_guest() {
        assert_eq!(CallerRole::from_claim(None), CallerRole::Guest);
        assert_eq!(CallerRole::from_claim(Some("")), CallerRole::Guest);
        assert_eq!(CallerRole::from_claim(Some("superuser")), CallerRole::Guest);
    }

    #[test]
    fn known_claims_resolve() {
        assert_eq!(CallerRole::from_claim(Some("admin")), CallerRole::Admin);
        assert_eq!(CallerRole::from_claim(Some(" User ")), CallerRole::User);
        assert_eq!(CallerRole::from_claim(Some("guest")), CallerRole::Guest);
    }

    #[test]
    fn counter_name_encodes_label() {
        let q = Quota::new(Duration::from_secs(30), 3, CallerRole::Guest.as_str());
        assert_eq!(q.counter_name(), "guest-rate-limit");
    }
}
