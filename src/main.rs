use tracing_subscriber::EnvFilter;

use clinica::api::{start_server, ApiContext};
use clinica::config::{self, AppConfig};
use clinica::db::open_database;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let settings = AppConfig::from_env();
    let db_path = config::database_path();

    let conn = match open_database(&db_path) {
        Ok(conn) => conn,
        Err(e) => {
            tracing::error!(path = %db_path.display(), "cannot open database: {e}");
            std::process::exit(1);
        }
    };

    let bind_addr = settings.bind_addr.clone();
    let ctx = ApiContext::new(conn, settings);

    let mut server = match start_server(ctx, &bind_addr).await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(%bind_addr, "cannot start server: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(addr = %server.addr, "listening");

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("signal handler error: {e}");
    }

    tracing::info!("shutting down");
    server.shutdown();
}
