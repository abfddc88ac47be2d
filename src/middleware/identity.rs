//! Caller identity extraction
//!
//! Authentication happens upstream. The gateway forwards the authenticated
//! staff user as `x-user-id` and `x-user-role`; this extractor turns those
//! headers into a typed identity and enforces who may read which book.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::error::ApiError;
use crate::loan::StaffRole;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Staff user making the request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerIdentity {
    pub user_id: Uuid,
    pub role: StaffRole,
}

impl CallerIdentity {
    /// Resolve which officer's book to read.
    ///
    /// No explicit officer means the caller's own book. Only admins and
    /// supervisors may read another officer's.
    pub fn officer_scope(&self, requested: Option<Uuid>) -> Result<Uuid, ApiError> {
        let officer_id = requested.unwrap_or(self.user_id);
        if officer_id != self.user_id && !self.role.can_view_portfolio() {
            return Err(ApiError::Forbidden(
                "Only admins and supervisors can view another officer's loans".to_string(),
            ));
        }
        Ok(officer_id)
    }

    /// Whether the caller may read a loan assigned to `officer_id`.
    pub fn can_read_loan_of(&self, officer_id: Uuid) -> bool {
        self.role.can_view_portfolio() || officer_id == self.user_id
    }

    /// Portfolio-wide views are for admins and supervisors.
    pub fn require_portfolio_access(&self) -> Result<(), ApiError> {
        if self.role.can_view_portfolio() {
            Ok(())
        } else {
            Err(ApiError::Forbidden(
                "Admin or supervisor access required".to_string(),
            ))
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = Uuid::parse_str(header_value(parts, USER_ID_HEADER)?).map_err(|_| {
            ApiError::Unauthorized(format!("{} must be a UUID", USER_ID_HEADER))
        })?;
        let role = header_value(parts, USER_ROLE_HEADER)?
            .parse::<StaffRole>()
            .map_err(|e| ApiError::Unauthorized(e.to_string()))?;

        Ok(CallerIdentity { user_id, role })
    }
}

fn header_value<'a>(parts: &'a Parts, name: &str) -> Result<&'a str, ApiError> {
    parts
        .headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::Unauthorized(format!("{} header required", name)))
}
