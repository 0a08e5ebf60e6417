use serde::Deserialize;
use gatehouse_core::error::{Result, GatehouseError};
use gatehouse_core::Environment;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    pub version: u32,

    #[serde(default)]
    pub gateway: GatewaySection,

    #[serde(default)]
    pub admission: AdmissionSection,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            version: 1,
            gateway: GatewaySection::default(),
            admission: AdmissionSection::default(),
        }
    }
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(GatehouseError::UnsupportedVersion);
        }

        self.admission.validate()?;

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Selects fail-open (development) vs fail-closed (anything else).
    #[serde(default)]
    pub environment: Environment,

    /// Take the caller IP from the first `X-Forwarded-For` hop.
    #[serde(default = "default_true")]
    pub trust_proxy: bool,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            environment: Environment::default(),
            trust_proxy: true,
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0:3000".into()
}
fn default_true() -> bool {
    true
}

/// Live blocks denied requests; dry run only logs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnforcementMode {
    #[default]
    Live,
    DryRun,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdmissionSection {
    #[serde(default)]
    pub mode: EnforcementMode,

    #[serde(default = "default_evaluator_timeout_ms")]
    pub evaluator_timeout_ms: u64,

    #[serde(default)]
    pub quotas: QuotaSection,

    #[serde(default)]
    pub local_evaluator: LocalEvaluatorConfig,
}

impl Default for AdmissionSection {
    fn default() -> Self {
        Self {
            mode: EnforcementMode::default(),
            evaluator_timeout_ms: default_evaluator_timeout_ms(),
            quotas: QuotaSection::default(),
            local_evaluator: LocalEvaluatorConfig::default(),
        }
    }
}

impl AdmissionSection {
    pub fn validate(&self) -> Result<()> {
        if !(10..=60000).contains(&self.evaluator_timeout_ms) {
            return Err(GatehouseError::BadRequest(
                "admission.evaluator_timeout_ms must be between 10 and 60000".into(),
            ));
        }
        self.quotas.guest.validate("guest")?;
        self.quotas.user.validate("user")?;
        self.quotas.admin.validate("admin")?;
        Ok(())
    }
}

fn default_evaluator_timeout_ms() -> u64 {
    1000
}

/// Per-role quota overrides. Omitted roles keep their defaults.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuotaSection {
    #[serde(default = "default_guest_quota")]
    pub guest: QuotaConfig,
    #[serde(default = "default_user_quota")]
    pub user: QuotaConfig,
    #[serde(default = "default_admin_quota")]
    pub admin: QuotaConfig,
}

impl Default for QuotaSection {
    fn default() -> Self {
        Self {
            guest: default_guest_quota(),
            user: default_user_quota(),
            admin: default_admin_quota(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuotaConfig {
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
    pub max_requests: u32,
}

impl QuotaConfig {
    fn validate(&self, role: &str) -> Result<()> {
        if self.window_secs == 0 {
            return Err(GatehouseError::BadRequest(format!(
                "admission.quotas.{role}.window_secs must be greater than 0"
            )));
        }
        if self.max_requests == 0 {
            return Err(GatehouseError::BadRequest(format!(
                "admission.quotas.{role}.max_requests must be greater than 0"
            )));
        }
        Ok(())
    }
}

fn default_window_secs() -> u64 {
    30
}
fn default_guest_quota() -> QuotaConfig {
    QuotaConfig { window_secs: default_window_secs(), max_requests: 3 }
}
fn default_user_quota() -> QuotaConfig {
    QuotaConfig { window_secs: default_window_secs(), max_requests: 5 }
}
fn default_admin_quota() -> QuotaConfig {
    QuotaConfig { window_secs: default_window_secs(), max_requests: 10 }
}

/// Automated clients let through bot detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BotCategory {
    SearchEngine,
    Preview,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LocalEvaluatorConfig {
    #[serde(default = "default_true")]
    pub shield: bool,

    #[serde(default = "default_true")]
    pub bot_detection: bool,

    #[serde(default = "default_allowed_bot_categories")]
    pub allowed_bot_categories: Vec<BotCategory>,
}

impl Default for LocalEvaluatorConfig {
    fn default() -> Self {
        Self {
            shield: true,
            bot_detection: true,
            allowed_bot_categories: default_allowed_bot_categories(),
        }
    }
}

fn default_allowed_bot_categories() -> Vec<BotCategory> {
    vec![BotCategory::SearchEngine, BotCategory::Preview]
}
