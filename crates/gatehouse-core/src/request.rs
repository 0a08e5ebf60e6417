use std::net::IpAddr;

use crate::role::CallerRole;

/// Read-only snapshot of one inbound request, built once at the HTTP seam.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    pub ip: IpAddr,
    /// Empty when the client sent no `User-Agent`.
    pub user_agent: String,
    pub path: String,
    pub method: String,
    /// `None` when upstream authentication attached no role.
    pub role: Option<CallerRole>,
}

impl RequestDescriptor {
    pub fn new(
        ip: IpAddr,
        user_agent: impl Into<String>,
        method: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            ip,
            user_agent: user_agent.into(),
            path: path.into(),
            method: method.into(),
            role: None,
        }
    }

    pub fn with_role(mut self, role: CallerRole) -> Self {
        self.role = Some(role);
        self
    }

    /// Role used for quota selection.
    pub fn effective_role(&self) -> CallerRole {
        self.role.unwrap_or_default()
    }
}
