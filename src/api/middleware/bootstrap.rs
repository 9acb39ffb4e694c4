//! Bootstrap gate for doctor registration.
//!
//! While zero doctors exist, registration is admitted without a
//! credential so the very first account can be created. Once any doctor
//! exists the gate behaves exactly like the auth middleware. The count
//! is re-queried from storage on every call — never cached and never
//! held behind a process-wide flag — so multiple server instances agree
//! on the same source of truth. Two unauthenticated registrations that
//! interleave during the empty window can theoretically both pass; that
//! race is accepted rather than serialized with a lock.

use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::api::middleware::auth::authenticate;
use crate::api::types::{ApiContext, DoctorContext};
use crate::db::repository::doctor::count_doctors;

/// Admit unauthenticated requests only while no doctor exists;
/// otherwise require a valid bearer token.
pub async fn bootstrap_or_auth(req: Request<axum::body::Body>, next: Next) -> Response {
    match bootstrap_or_auth_inner(req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn bootstrap_or_auth_inner(
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    let count = {
        let conn = ctx.conn()?;
        count_doctors(&conn)?
    };

    if count == 0 {
        tracing::info!("no doctors registered, admitting bootstrap registration");
        return Ok(next.run(req).await);
    }

    let identity = authenticate(&req, &ctx)?;
    req.extensions_mut().insert(DoctorContext { identity });
    Ok(next.run(req).await)
}
