//! Role → quota table.
//!
//! Built once at startup from config and never mutated afterwards, so it is
//! shared across requests without synchronization.

use std::time::Duration;

use gatehouse_core::{CallerRole, Quota};

use crate::config::{QuotaConfig, QuotaSection};

#[derive(Debug, Clone)]
pub struct PolicyTable {
    guest: Quota,
    user: Quota,
    admin: Quota,
}

impl PolicyTable {
    pub fn from_config(quotas: &QuotaSection) -> Self {
        Self {
            guest: quota(CallerRole::Guest, &quotas.guest),
            user: quota(CallerRole::User, &quotas.user),
            admin: quota(CallerRole::Admin, &quotas.admin),
        }
    }

    pub fn quota_for(&self, role: CallerRole) -> &Quota {
        match role {
            CallerRole::Guest => &self.guest,
            CallerRole::User => &self.user,
            CallerRole::Admin => &self.admin,
        }
    }
}

impl Default for PolicyTable {
    fn default() -> Self {
        Self::from_config(&QuotaSection::default())
    }
}

fn quota(role: CallerRole, cfg: &QuotaConfig) -> Quota {
    Quota::new(
        Duration::from_secs(cfg.window_secs),
        cfg.max_requests,
        role.as_str(),
    )
}
