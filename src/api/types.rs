//! Shared types for the API layer.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;

use crate::api::error::ApiError;
use crate::auth::DoctorIdentity;
use crate::config::AppConfig;

/// Shared context for all API routes and middleware.
///
/// Injected as an Extension for middleware and as State for handlers.
/// The single connection behind a Mutex serves the embedded database;
/// requests serialize at the storage boundary.
#[derive(Clone)]
pub struct ApiContext {
    pub db: Arc<Mutex<Connection>>,
    pub config: Arc<AppConfig>,
}

impl ApiContext {
    pub fn new(conn: Connection, config: AppConfig) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            config: Arc::new(config),
        }
    }

    /// Lock the database connection.
    pub fn conn(&self) -> Result<MutexGuard<'_, Connection>, ApiError> {
        self.db
            .lock()
            .map_err(|_| ApiError::Internal("database lock poisoned".into()))
    }
}

/// Authenticated doctor context, injected into request extensions by the
/// auth middleware (or the bootstrap gate when it delegates to it) after
/// the credential is verified. The identity comes entirely from signed
/// claims — no storage read.
#[derive(Debug, Clone)]
pub struct DoctorContext {
    pub identity: DoctorIdentity,
}
