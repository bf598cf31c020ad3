use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use booking_bridge_api::app::{create_app, Sources};
use booking_bridge_api::config::Config;
use booking_bridge_api::jobs::{JobScheduler, LoyaltySyncJob, Schedule, VoucherCleanupJob};
use booking_bridge_api::middleware::{init_metrics, logging::init_logging};
use booking_bridge_api::services::{HostexClient, OdooClient};
use tracing::info;

const JOB_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = Config::load().context("Failed to load configuration")?;

    init_logging(&config.logging);
    init_metrics().context("Failed to install metrics recorder")?;

    info!("Starting Booking Bridge v{}", env!("CARGO_PKG_VERSION"));

    let hostex =
        Arc::new(HostexClient::new(&config.hostex).context("Failed to build Hostex client")?);
    let catalog = Arc::new(config.property_catalog());

    let mut scheduler = JobScheduler::new();
    scheduler.register(VoucherCleanupJob::new(
        catalog.clone(),
        hostex.clone(),
        config.cleanup_options(),
    ));
    if config.odoo.enabled {
        let odoo =
            Arc::new(OdooClient::new(&config.odoo).context("Failed to build Odoo client")?);
        scheduler.register(LoyaltySyncJob::new(catalog, odoo, hostex.clone()));
    } else {
        info!("Odoo integration disabled, loyalty sync not scheduled");
    }
    scheduler.start(Schedule::from_minutes(
        config.jobs.run_on_startup,
        config.jobs.interval_minutes,
    ));

    let addr = config.socket_addr().context("Invalid server address")?;
    let app = create_app(
        config,
        Sources {
            reservations: hostex.clone(),
            conversations: hostex,
        },
    );

    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.shutdown();
    scheduler.wait_for_shutdown(JOB_SHUTDOWN_TIMEOUT).await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
