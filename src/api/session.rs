use std::collections::HashSet;
use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::response::ApiError;

/// Site roles, as granted by the upstream auth subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserRole {
    Admin,
    Moderator,
    Finance,
    Emotes,
    Features,
}

impl UserRole {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Some(UserRole::Admin),
            "MODERATOR" => Some(UserRole::Moderator),
            "FINANCE" => Some(UserRole::Finance),
            "EMOTES" => Some(UserRole::Emotes),
            "FEATURES" => Some(UserRole::Features),
            _ => None,
        }
    }
}

/// Request identity as asserted by the auth proxy in front of this
/// service, via the `X-Auth-User` and `X-Auth-Roles` headers. Anonymous
/// requests carry neither.
#[derive(Debug, Clone, Default)]
pub struct Session {
    user_id: Option<String>,
    roles: HashSet<UserRole>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Build a session directly; used by tests and page rendering.
    pub fn with_roles(user_id: impl Into<String>, roles: &[UserRole]) -> Self {
        Self {
            user_id: Some(user_id.into()),
            roles: roles.iter().copied().collect(),
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn has_role(&self, role: UserRole) -> bool {
        self.roles.contains(&role)
    }

    pub fn has_any_role(&self) -> bool {
        !self.roles.is_empty()
    }

    /// The signed-in user id, or a 401 failure.
    pub fn require_user(&self) -> Result<&str, ApiError> {
        self.user_id
            .as_deref()
            .ok_or_else(|| ApiError::unauthorized("Sign in required"))
    }

    /// A 401/403 failure unless the session holds the given role.
    pub fn require_role(&self, role: UserRole) -> Result<(), ApiError> {
        self.require_user()?;
        if self.has_role(role) {
            Ok(())
        } else {
            Err(ApiError::forbidden("Insufficient privileges"))
        }
    }

    /// Like [`require_role`](Self::require_role), passing when any of the
    /// given roles is held.
    pub fn require_any_role(&self, roles: &[UserRole]) -> Result<(), ApiError> {
        self.require_user()?;
        if roles.iter().any(|r| self.has_role(*r)) {
            Ok(())
        } else {
            Err(ApiError::forbidden("Insufficient privileges"))
        }
    }
}

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Session {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Infallible> {
        let user_id = parts
            .headers
            .get("x-auth-user")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .filter(|s| !s.is_empty());

        let roles = parts
            .headers
            .get("x-auth-roles")
            .and_then(|v| v.to_str().ok())
            .map(|raw| raw.split(',').filter_map(UserRole::parse).collect())
            .unwrap_or_default();

        Ok(Session { user_id, roles })
    }
}
