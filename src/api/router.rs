//! API router.
//!
//! Routes are nested under `/api/`. Three route groups with distinct
//! gates:
//! 1. Protected — every request must carry a valid bearer token.
//! 2. Registration — behind the bootstrap gate: open while zero doctors
//!    exist, token-gated afterwards.
//! 3. Open — login and the health probe.
//!
//! Middleware uses `Extension<ApiContext>` (injected as the outermost
//! layer). Endpoint handlers use `State<ApiContext>` via `with_state`.

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;

/// Build the full API router from a pre-constructed `ApiContext`.
pub fn api_router(ctx: ApiContext) -> Router {
    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let protected = Router::new()
        .route("/auth/me", get(endpoints::auth::me))
        .route("/auth/password", put(endpoints::auth::change_password))
        .route(
            "/patients",
            get(endpoints::patients::list).post(endpoints::patients::create),
        )
        .route(
            "/patients/:id",
            get(endpoints::patients::detail)
                .patch(endpoints::patients::update)
                .delete(endpoints::patients::remove),
        )
        .route(
            "/patients/:id/consultations",
            get(endpoints::consultations::list).post(endpoints::consultations::create),
        )
        .route(
            "/consultations/:id",
            get(endpoints::consultations::detail)
                .patch(endpoints::consultations::update)
                .delete(endpoints::consultations::remove),
        )
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::auth::require_auth))
        // Extension must be outermost so middleware can extract ApiContext
        .layer(axum::Extension(ctx.clone()));

    let registration = Router::new()
        .route("/doctors", post(endpoints::auth::register))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(
            middleware::bootstrap::bootstrap_or_auth,
        ))
        .layer(axum::Extension(ctx.clone()));

    let open = Router::new()
        .route("/auth/login", post(endpoints::auth::login))
        .route("/health", get(endpoints::health::check))
        .with_state(ctx);

    Router::new()
        .nest("/api", protected)
        .nest("/api", registration)
        .nest("/api", open)
        .layer(CorsLayer::permissive())
}
