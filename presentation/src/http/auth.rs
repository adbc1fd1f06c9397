//! Caller identity and policy decisions
//!
//! Identity is taken from headers set by an upstream gateway. Whether a
//! caller may perform an action is decided by a [`PolicyEngine`].

use super::error::ApiError;
use axum::http::HeaderMap;
use council_application::Viewer;
use council_domain::RequesterId;

pub const REQUESTER_HEADER: &str = "x-requester-id";
pub const ROLES_HEADER: &str = "x-requester-roles";

/// An authenticated caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub requester_id: RequesterId,
    pub roles: Vec<String>,
}

impl Caller {
    pub fn new(requester_id: impl Into<RequesterId>) -> Self {
        Self {
            requester_id: requester_id.into(),
            roles: Vec::new(),
        }
    }

    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Read the caller from request headers
    ///
    /// Roles are a comma-separated list. A missing or blank requester id
    /// is rejected.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, ApiError> {
        let requester = headers
            .get(REQUESTER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))?;

        let roles = headers
            .get(ROLES_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            requester_id: RequesterId::new(requester),
            roles,
        })
    }
}

/// Operations subject to a policy decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    List,
    Read,
    Flag,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::List => "list",
            Action::Read => "read",
            Action::Flag => "flag",
        }
    }
}

/// Decides what a caller may do
pub trait PolicyEngine: Send + Sync {
    fn allows(&self, caller: &Caller, action: Action) -> bool;

    /// Admins see every requester's deliberations
    fn is_admin(&self, caller: &Caller) -> bool;
}

/// Role-based policy: any authenticated caller may act, holders of an
/// admin role see everything
#[derive(Debug, Clone)]
pub struct RolePolicy {
    admin_roles: Vec<String>,
}

impl RolePolicy {
    pub fn new(admin_roles: Vec<String>) -> Self {
        Self { admin_roles }
    }
}

impl Default for RolePolicy {
    fn default() -> Self {
        Self::new(vec!["admin".to_string(), "superadmin".to_string()])
    }
}

impl PolicyEngine for RolePolicy {
    fn allows(&self, _caller: &Caller, _action: Action) -> bool {
        true
    }

    fn is_admin(&self, caller: &Caller) -> bool {
        self.admin_roles.iter().any(|role| caller.has_role(role))
    }
}

/// Authorize `action` and return the viewer the use cases expect
pub fn authorize(
    policy: &dyn PolicyEngine,
    caller: &Caller,
    action: Action,
) -> Result<Viewer, ApiError> {
    if !policy.allows(caller, action) {
        return Err(ApiError::Forbidden(format!(
            "Not allowed to {} deliberations",
            action.as_str()
        )));
    }
    Ok(Viewer::new(
        caller.requester_id.clone(),
        policy.is_admin(caller),
    ))
}
