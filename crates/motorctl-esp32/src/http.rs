//! `EspHttpServer` control server.
//!
//! The ESP-IDF httpd runs handlers on its own task, one request at a time,
//! so handlers call straight into the shared [`ControlPlane`].

use std::sync::Arc;

use anyhow::Result;
use embedded_svc::http::Method;
use embedded_svc::io::Write;
use esp_idf_svc::http::server::{Configuration, EspHttpConnection, EspHttpServer, Request};
use log::{debug, error, info};

use motorctl_core::{ActivityIndicator, ControlSurface, MotorHardware};
use motorctl_protocol::command::{DIRECTION_PATH, PANEL_PATH, SPEED_PATH};
use motorctl_protocol::ControlPlane;

/// Control server that exists only while the link is up.
pub struct EspControlServer<H, I> {
    plane: Arc<ControlPlane<H, I>>,
    port: u16,
    server: Option<EspHttpServer<'static>>,
}

impl<H, I> EspControlServer<H, I>
where
    H: MotorHardware + 'static,
    I: ActivityIndicator + 'static,
{
    /// Create a stopped server.
    pub fn new(plane: Arc<ControlPlane<H, I>>, port: u16) -> Self {
        Self {
            plane,
            port,
            server: None,
        }
    }

    fn spawn(&self) -> Result<EspHttpServer<'static>> {
        let conf = Configuration {
            http_port: self.port,
            lru_purge_enable: true,
            ..Default::default()
        };
        let mut server = EspHttpServer::new(&conf)?;

        for path in [PANEL_PATH, SPEED_PATH, DIRECTION_PATH] {
            let plane = self.plane.clone();
            server.fn_handler::<anyhow::Error, _>(path, Method::Get, move |req| {
                handle(&plane, req)
            })?;
        }
        Ok(server)
    }
}

fn handle<H, I>(
    plane: &ControlPlane<H, I>,
    req: Request<&mut EspHttpConnection<'_>>,
) -> Result<()>
where
    H: MotorHardware,
    I: ActivityIndicator,
{
    let uri = req.uri().to_string();
    debug!("control request: {uri}");

    match plane.handle_uri(&uri) {
        Some(Ok(reply)) => {
            req.into_response(reply.status, None, &[("Content-Type", reply.content_type)])?
                .write_all(reply.body.as_bytes())?;
        }
        Some(Err(e)) => {
            error!("motor hardware failure: {e}");
            esp_idf_svc::hal::reset::restart();
        }
        None => {
            req.into_status_response(404)?;
        }
    }
    Ok(())
}

impl<H, I> ControlSurface for EspControlServer<H, I>
where
    H: MotorHardware + 'static,
    I: ActivityIndicator + 'static,
{
    type Error = anyhow::Error;

    fn start(&mut self) -> Result<()> {
        if self.server.is_some() {
            debug!("control server already running");
            return Ok(());
        }
        self.server = Some(self.spawn()?);
        info!("control server listening on port {}", self.port);
        Ok(())
    }

    fn stop(&mut self) {
        if self.server.take().is_some() {
            info!("control server stopped");
        }
    }

    fn is_running(&self) -> bool {
        self.server.is_some()
    }
}
