use std::net::Ipv4Addr;
use std::sync::Arc;

use anyhow::Context;
use serde::Deserialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use motorctl_core::{LinkEvent, LinkSupervisor, MotorConfig, SimulatedHardware, SimulatedOutput};
use motorctl_server::{BackgroundPulse, ControlPlane, ControlServer, MotorDriver, ServerConfig};

/// Optional settings file, selected with `MOTORCTL_CONFIG`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Settings {
    motor: MotorConfig,
    server: ServerConfig,
}

fn load_settings() -> anyhow::Result<Settings> {
    let Ok(path) = std::env::var("MOTORCTL_CONFIG") else {
        return Ok(Settings::default());
    };
    let raw = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    let settings: Settings =
        serde_json::from_str(&raw).with_context(|| format!("parsing {path}"))?;
    tracing::info!("loaded settings from {path}");
    Ok(settings)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,motorctl_server=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Motor control server starting (simulated hardware)...");

    let settings = load_settings()?;
    settings.motor.validate()?;

    let hardware = SimulatedHardware::new();
    let motor = MotorDriver::new(hardware.clone(), &settings.motor)?;
    let indicator = BackgroundPulse::new(SimulatedOutput::new(), settings.motor.pulse())
        .context("indicator needs a tokio runtime")?;
    let plane = Arc::new(ControlPlane::new(motor, indicator));

    // The host link is always up; feed the same events the device sees.
    let mut link = LinkSupervisor::new(ControlServer::new(settings.server.clone(), plane.clone()));
    link.handle(LinkEvent::Started);
    link.handle(LinkEvent::IpAcquired(Ipv4Addr::LOCALHOST));
    let addr = link
        .surface()
        .local_addr()
        .context("control server failed to start")?;

    tracing::info!("Motor control server ready!");
    tracing::info!("   Panel:     http://{addr}/");
    tracing::info!("");
    tracing::info!("Try these commands:");
    tracing::info!("   curl 'http://{addr}/motor/speed?value=512'");
    tracing::info!("   curl 'http://{addr}/motor/direction?dir=forward'");

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    tracing::info!("Received Ctrl+C, shutting down...");

    link.surface_mut().shutdown().await;
    link.handle(LinkEvent::Lost);

    let state = plane.state();
    tracing::info!(
        "final state: duty={} direction={} outputs={:?}/{:?}",
        state.duty,
        state.direction,
        hardware.duties(),
        hardware.enables()
    );
    tracing::info!("Shutdown complete");
    Ok(())
}
