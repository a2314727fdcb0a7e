use axum::{
    extract::{FromRequestParts, Request},
    http::{StatusCode, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use super::{
    filter::RequestAuth,
    policy::Requirement,
    role::{Principal, Role},
};
use crate::error::json_error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessDenied {
    /// No valid principal on a route that needs one.
    #[error("authentication required")]
    Unauthenticated,
    /// A principal is present but its role does not satisfy the route.
    #[error("role {actual} may not access a route reserved to {required}")]
    PolicyMismatch { required: Role, actual: Role },
}

impl IntoResponse for AccessDenied {
    fn into_response(self) -> Response {
        match &self {
            AccessDenied::Unauthenticated => {
                json_error(StatusCode::UNAUTHORIZED, "unauthenticated", self.to_string())
            }
            AccessDenied::PolicyMismatch { .. } => {
                json_error(StatusCode::FORBIDDEN, "policy_mismatch", self.to_string())
            }
        }
    }
}

/// authorize
///
/// The enforcement decision for one request, taken from the context the auth
/// filter attached.
pub fn authorize(auth: &RequestAuth) -> Result<(), AccessDenied> {
    match (auth.requirement, auth.principal.as_ref()) {
        (Requirement::Public, _) => Ok(()),
        (_, None) => Err(AccessDenied::Unauthenticated),
        (Requirement::AuthenticatedAny, Some(_)) => Ok(()),
        (Requirement::RequiresRole(required), Some(principal)) => {
            if principal.has_role(required) {
                Ok(())
            } else {
                Err(AccessDenied::PolicyMismatch {
                    required,
                    actual: principal.role,
                })
            }
        }
    }
}

/// enforce_access
///
/// Middleware layered inside [`auth_filter`](super::filter::auth_filter).
/// A request that reaches it without a [`RequestAuth`] is treated as
/// unauthenticated.
pub async fn enforce_access(request: Request, next: Next) -> Result<Response, AccessDenied> {
    let Some(auth) = request.extensions().get::<RequestAuth>() else {
        tracing::warn!(path = %request.uri().path(), "request reached enforcement without auth context");
        return Err(AccessDenied::Unauthenticated);
    };

    if let Err(denied) = authorize(auth) {
        tracing::info!(path = %request.uri().path(), %denied, "access denied");
        return Err(denied);
    }

    Ok(next.run(request).await)
}

/// Principal Extractor
///
/// Lets handlers take the request's [`Principal`] as an argument. Rejects with
/// 401 when the auth filter recorded no principal.
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = AccessDenied;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestAuth>()
            .and_then(|auth| auth.principal.clone())
            .ok_or(AccessDenied::Unauthenticated)
    }
}
