//! GuestFlow Server: application entry point.

use guestflow_db::{DbManager, run_migrations};
use guestflow_server::seed::{seed_platform_operator, seed_tenant_with_owner};
use guestflow_server::{AppSettings, GuestflowApp, ServerConfig, ServerError};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("guestflow=info"));
    tracing_subscriber::fmt().with_env_filter(filter).json().init();

    if let Err(e) = run(ServerConfig::load()).await {
        tracing::error!(error = %e, "GuestFlow server failed");
        std::process::exit(1);
    }
}

async fn run(config: ServerConfig) -> Result<(), ServerError> {
    config.validate()?;
    tracing::info!("Starting GuestFlow server...");

    let auth = config.auth_config()?;
    let db = DbManager::connect(&config.db_config()).await?;
    run_migrations(db.client()).await?;

    let app = GuestflowApp::new(
        db.client().clone(),
        auth,
        AppSettings {
            store_timeout: config.store_timeout(),
            default_timezone: config.default_timezone.clone(),
        },
    );

    if let (Some(email), Some(password)) =
        (&config.seed_operator_email, &config.seed_operator_password)
    {
        seed_platform_operator(app.staff_repository(), email, password).await?;
    }
    if let Some(seed) = config.tenant_seed() {
        seed_tenant_with_owner(app.tenant_repository(), app.staff_repository(), seed).await?;
    }

    tracing::info!("GuestFlow server ready");
    let _ = tokio::signal::ctrl_c().await;

    tracing::info!("GuestFlow server stopped.");
    Ok(())
}
