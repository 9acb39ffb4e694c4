use std::env;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "clinica";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default bearer token lifetime in hours.
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

/// Default bind address for the HTTP server.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

/// Default tracing filter when RUST_LOG is unset.
pub fn default_log_filter() -> String {
    format!("{APP_NAME}=info,tower_http=warn")
}

/// Runtime settings, snapshotted once at startup from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Secret used to sign and verify bearer tokens.
    pub token_secret: String,
    /// Token lifetime in hours.
    pub token_ttl_hours: i64,
    /// Bind address for the HTTP server.
    pub bind_addr: String,
}

impl AppConfig {
    /// Read configuration from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        let token_secret = env::var("CLINICA_TOKEN_SECRET").unwrap_or_else(|_| {
            tracing::warn!("CLINICA_TOKEN_SECRET not set, using development secret");
            "clinica-dev-secret".to_string()
        });

        let token_ttl_hours = env::var("CLINICA_TOKEN_TTL_HOURS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|h| *h > 0)
            .unwrap_or(DEFAULT_TOKEN_TTL_HOURS);

        let bind_addr =
            env::var("CLINICA_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());

        Self {
            token_secret,
            token_ttl_hours,
            bind_addr,
        }
    }
}

/// Get the database path: `CLINICA_DB` or `./clinica.db`.
pub fn database_path() -> PathBuf {
    env::var("CLINICA_DB")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("clinica.db"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ttl_is_24h() {
        assert_eq!(DEFAULT_TOKEN_TTL_HOURS, 24);
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn log_filter_names_crate() {
        assert!(default_log_filter().starts_with("clinica="));
    }
}
