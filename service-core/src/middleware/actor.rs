//! Actor context extractor for role-based authorization.
//!
//! Extracts the calling user's identity and marketplace role from request
//! headers. These headers are set by the BFF after authenticating the user;
//! the services never see raw credentials.
//!
//! This is the single source of "who is calling" for every handler. Ownership
//! of a specific order (is this caller that order's customer or tailor?) is
//! resolved against the loaded row, not re-derived per call site.

use crate::error::AppError;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

pub const USER_ID_HEADER: &str = "X-User-ID";
pub const USER_ROLE_HEADER: &str = "X-User-Role";

/// Marketplace role of the authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorRole {
    Customer,
    Tailor,
    Admin,
}

impl ActorRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorRole::Customer => "customer",
            ActorRole::Tailor => "tailor",
            ActorRole::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "customer" => Some(ActorRole::Customer),
            "tailor" => Some(ActorRole::Tailor),
            "admin" => Some(ActorRole::Admin),
            _ => None,
        }
    }
}

/// Authenticated caller extracted from BFF-set request headers.
#[derive(Debug, Clone)]
pub struct ActorContext {
    pub user_id: Uuid,
    pub role: ActorRole,
}

impl ActorContext {
    pub fn new(user_id: Uuid, role: ActorRole) -> Self {
        Self { user_id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == ActorRole::Admin
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ActorContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Unauthorized(anyhow::anyhow!(
                    "Missing X-User-ID header (required from BFF)"
                ))
            })?;

        let user_id = Uuid::parse_str(user_id)
            .map_err(|_| AppError::Unauthorized(anyhow::anyhow!("Malformed X-User-ID header")))?;

        let role = parts
            .headers
            .get(USER_ROLE_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Unauthorized(anyhow::anyhow!(
                    "Missing X-User-Role header (required from BFF)"
                ))
            })?;

        let role = ActorRole::parse(role).ok_or_else(|| {
            AppError::Unauthorized(anyhow::anyhow!("Unknown role in X-User-Role header"))
        })?;

        let span = tracing::Span::current();
        span.record("user_id", user_id.to_string());
        span.record("role", role.as_str());

        Ok(ActorContext { user_id, role })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_roles() {
        assert_eq!(ActorRole::parse("customer"), Some(ActorRole::Customer));
        assert_eq!(ActorRole::parse("tailor"), Some(ActorRole::Tailor));
        assert_eq!(ActorRole::parse("admin"), Some(ActorRole::Admin));
    }

    #[test]
    fn rejects_unknown_roles() {
        assert_eq!(ActorRole::parse("superuser"), None);
        assert_eq!(ActorRole::parse(""), None);
        assert_eq!(ActorRole::parse("Tailor"), None);
    }
}
