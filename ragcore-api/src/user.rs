//! ABOUTME: Extracts the caller's `UserContext` from gateway-injected headers
//! ABOUTME: Authentication itself happens upstream; this layer only trusts the headers

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use ragcore_core::{UserContext, UserRole};

const USER_ID_HEADER: &str = "x-user-id";
const USER_ROLE_HEADER: &str = "x-user-role";
const USER_DEPARTMENT_HEADER: &str = "x-user-department";

pub struct AuthenticatedUser(pub UserContext);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = header_str(parts, USER_ID_HEADER).ok_or((StatusCode::UNAUTHORIZED, "missing X-User-Id header"))?;
        let role = match header_str(parts, USER_ROLE_HEADER).as_deref() {
            Some("manager") => UserRole::Manager,
            Some("admin") => UserRole::Admin,
            _ => UserRole::Employee,
        };
        let department = header_str(parts, USER_DEPARTMENT_HEADER).unwrap_or_default();
        Ok(Self(UserContext::new(user_id, role, department)))
    }
}

fn header_str(parts: &Parts, name: &str) -> Option<String> {
    parts.headers.get(name)?.to_str().ok().map(ToString::to_string)
}
