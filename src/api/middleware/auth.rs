//! Bearer token authentication middleware.
//!
//! Extracts `Authorization: Bearer <token>`, verifies the signature and
//! expiry, and injects `DoctorContext` into request extensions for
//! downstream handlers. Every failure mode — missing header, malformed
//! value, bad signature, expired token — produces the identical 401.

use axum::http::{HeaderValue, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, DoctorContext};
use crate::auth::{verify_token, DoctorIdentity};

/// Require a valid bearer token on the request.
///
/// Accesses `ApiContext` from request extensions (injected by the
/// Extension layer). On success, injects `DoctorContext`.
pub async fn require_auth(req: Request<axum::body::Body>, next: Next) -> Response {
    match require_auth_inner(req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn require_auth_inner(
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    let identity = authenticate(&req, &ctx)?;
    req.extensions_mut().insert(DoctorContext { identity });

    let mut response = next.run(req).await;
    response
        .headers_mut()
        .insert("Cache-Control", HeaderValue::from_static("no-store"));
    Ok(response)
}

/// Extract and verify the bearer credential on a request.
///
/// Shared by `require_auth` and the bootstrap gate so both paths enforce
/// exactly the same rules.
pub(crate) fn authenticate(
    req: &Request<axum::body::Body>,
    ctx: &ApiContext,
) -> Result<DoctorIdentity, ApiError> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthenticated)?;

    verify_token(token, &ctx.config).map_err(ApiError::from)
}
