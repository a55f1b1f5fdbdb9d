//! Integration tests for the motor control HTTP server.
//!
//! The router tests drive the axum service in-process; the lifecycle tests
//! start an actual server and talk raw HTTP/1.1 to it over TCP.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tower::ServiceExt;

use motorctl_core::{
    Direction, LinkEvent, LinkSupervisor, MotorConfig, NoIndicator, SimulatedHardware,
    SimulatedOutput,
};
use motorctl_server::{
    router, BackgroundPulse, ControlPlane, ControlServer, ControlSurface, MotorDriver,
    ServerConfig, ServerError, SharedPlane,
};

type TestPlane = SharedPlane<SimulatedHardware, NoIndicator>;

/// Build a control plane over simulated hardware.
fn test_plane() -> (TestPlane, SimulatedHardware) {
    let hw = SimulatedHardware::new();
    let motor = MotorDriver::new(hw.clone(), &MotorConfig::default()).unwrap();
    (Arc::new(ControlPlane::new(motor, NoIndicator)), hw)
}

/// Loopback config on an ephemeral port.
fn loopback_config() -> ServerConfig {
    ServerConfig {
        bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 0)),
    }
}

/// Loopback config on a fixed port that was free a moment ago.
fn fixed_port_config() -> ServerConfig {
    let free = std::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
    let bind_addr = free.local_addr().unwrap();
    drop(free);
    ServerConfig { bind_addr }
}

/// Send one request through the router.
async fn call(app: &Router, method: Method, uri: &str) -> (StatusCode, Option<String>, String) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();

    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string());
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, content_type, String::from_utf8(body.to_vec()).unwrap())
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Option<String>, String) {
    call(app, Method::GET, uri).await
}

/// Issue a GET over a fresh TCP connection and return the raw response.
async fn http_get(addr: SocketAddr, target: &str) -> Result<String, &'static str> {
    let exchange = async {
        let mut stream = TcpStream::connect(addr).await.map_err(|_| "connect failed")?;
        let request =
            format!("GET {target} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
        stream
            .write_all(request.as_bytes())
            .await
            .map_err(|_| "write failed")?;
        let mut response = String::new();
        stream
            .read_to_string(&mut response)
            .await
            .map_err(|_| "read failed")?;
        Ok::<_, &'static str>(response)
    };
    timeout(Duration::from_secs(5), exchange)
        .await
        .map_err(|_| "Timeout")?
}

#[tokio::test]
async fn test_panel_served_as_html() {
    let (plane, _) = test_plane();
    let app = router(plane);

    let (status, content_type, body) = get(&app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("text/html"));
    assert!(body.contains("ESP32 Motor Control"));
}

#[tokio::test]
async fn test_speed_sets_both_channels() {
    let (plane, hw) = test_plane();
    let app = router(plane.clone());

    let (status, _, body) = get(&app, "/motor/speed?value=512").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
    assert_eq!(hw.duties(), (512, 512));
    assert_eq!(plane.state().duty, 512);
}

#[tokio::test]
async fn test_speed_is_clamped_not_rejected() {
    let (plane, hw) = test_plane();
    let app = router(plane);

    let (status, _, body) = get(&app, "/motor/speed?value=2000").await;
    assert_eq!((status, body.as_str()), (StatusCode::OK, "OK"));
    assert_eq!(hw.duties(), (1023, 1023));

    let (status, _, _) = get(&app, "/motor/speed?value=-5").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(hw.duties(), (0, 0));
}

#[tokio::test]
async fn test_speed_without_query_changes_nothing() {
    let (plane, hw) = test_plane();
    let app = router(plane.clone());
    get(&app, "/motor/speed?value=400").await;

    let (status, _, body) = get(&app, "/motor/speed").await;
    assert_eq!((status, body.as_str()), (StatusCode::OK, "OK"));
    assert_eq!(plane.state().duty, 400);
    assert_eq!(hw.duties(), (400, 400));
}

#[tokio::test]
async fn test_malformed_queries_are_answered_ok() {
    let (plane, _) = test_plane();
    let app = router(plane.clone());
    get(&app, "/motor/speed?value=250").await;

    for uri in [
        "/motor/speed?%%%",
        "/motor/speed?value",
        "/motor/speed?=5",
        "/motor/direction?dir",
        "/motor/direction?&&",
    ] {
        let (status, _, body) = get(&app, uri).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(body, "OK", "{uri}");
    }
    assert_eq!(plane.state().duty, 250);
    assert_eq!(plane.state().direction, Direction::Stopped);

    // Present but unparsable is applied as zero.
    get(&app, "/motor/speed?value=fast").await;
    assert_eq!(plane.state().duty, 0);
}

#[tokio::test]
async fn test_direction_endpoint() {
    let (plane, hw) = test_plane();
    let app = router(plane.clone());

    get(&app, "/motor/direction?dir=forward").await;
    assert_eq!(plane.state().direction, Direction::Forward);
    assert_eq!(hw.enables(), (true, false));

    get(&app, "/motor/direction?dir=backward").await;
    assert_eq!(hw.enables(), (false, true));

    let (status, _, body) = get(&app, "/motor/direction?dir=sideways").await;
    assert_eq!((status, body.as_str()), (StatusCode::OK, "OK"));
    assert_eq!(plane.state().direction, Direction::Stopped);

    get(&app, "/motor/direction?dir=forward").await;
    get(&app, "/motor/direction?dir=FORWARD").await;
    assert_eq!(plane.state().direction, Direction::Stopped);
    assert!(!hw.ever_shorted());
}

#[tokio::test]
async fn test_stop_twice_equals_once() {
    let (plane, hw) = test_plane();
    let app = router(plane.clone());
    get(&app, "/motor/speed?value=800").await;
    get(&app, "/motor/direction?dir=backward").await;

    get(&app, "/motor/direction?dir=stop").await;
    let once = (plane.state(), hw.duties(), hw.enables());
    get(&app, "/motor/direction?dir=stop").await;
    assert_eq!(once, (plane.state(), hw.duties(), hw.enables()));
}

#[tokio::test]
async fn test_order_of_speed_and_direction_does_not_matter() {
    let (a, hw_a) = test_plane();
    let app_a = router(a.clone());
    get(&app_a, "/motor/direction?dir=forward").await;
    get(&app_a, "/motor/speed?value=500").await;

    let (b, hw_b) = test_plane();
    let app_b = router(b.clone());
    get(&app_b, "/motor/speed?value=500").await;
    get(&app_b, "/motor/direction?dir=forward").await;

    assert_eq!(a.state(), b.state());
    assert_eq!(
        (hw_a.duties(), hw_a.enables()),
        (hw_b.duties(), hw_b.enables())
    );
}

#[tokio::test]
async fn test_unknown_routes_and_methods() {
    let (plane, hw) = test_plane();
    let app = router(plane);
    let writes = hw.journal().len();

    let (status, _, _) = get(&app, "/motor/brake").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = call(&app, Method::POST, "/motor/speed?value=10").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

    assert_eq!(hw.journal().len(), writes);
}

#[tokio::test]
async fn test_indicator_fires_for_every_motor_request() {
    let hw = SimulatedHardware::new();
    let led = SimulatedOutput::new();
    let motor = MotorDriver::new(hw, &MotorConfig::default()).unwrap();
    let indicator = BackgroundPulse::new(led.clone(), Duration::from_millis(1)).unwrap();
    let app = router(Arc::new(ControlPlane::new(motor, indicator)));

    get(&app, "/").await;
    assert_eq!(led.pulses(), 0);

    get(&app, "/motor/speed").await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    get(&app, "/motor/direction?dir=stop").await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(led.pulses(), 2);
}

#[tokio::test]
async fn test_live_server_round_trip() {
    let (plane, hw) = test_plane();
    let mut server = ControlServer::new(loopback_config(), plane);
    server.start().unwrap();
    let addr = server.local_addr().unwrap();

    let response = http_get(addr, "/motor/speed?value=300").await.unwrap();
    assert!(response.starts_with("HTTP/1.1 200"), "{response}");
    assert!(response.ends_with("OK"), "{response}");
    assert_eq!(hw.duties(), (300, 300));

    let response = http_get(addr, "/").await.unwrap();
    assert!(response.to_ascii_lowercase().contains("content-type: text/html"));
    assert!(response.contains("ESP32 Motor Control"));

    server.shutdown().await;
}

#[tokio::test]
async fn test_start_and_stop_are_idempotent() {
    let (plane, _) = test_plane();
    let mut server = ControlServer::new(loopback_config(), plane);
    assert!(!server.is_running());

    server.start().unwrap();
    let addr = server.local_addr().unwrap();
    server.start().unwrap();
    assert_eq!(server.local_addr(), Some(addr));
    assert!(server.is_running());

    server.shutdown().await;
    assert!(!server.is_running());
    server.stop();
    server.stop();
    server.shutdown().await;
    assert!(!server.is_running());
    assert!(http_get(addr, "/").await.is_err());

    // A stopped server can be started again.
    server.start().unwrap();
    let addr = server.local_addr().unwrap();
    let response = http_get(addr, "/motor/direction?dir=forward").await.unwrap();
    assert!(response.starts_with("HTTP/1.1 200"));
    server.shutdown().await;
}

#[tokio::test]
async fn test_bind_failure_leaves_server_stopped() {
    let occupied = std::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
    let config = ServerConfig {
        bind_addr: occupied.local_addr().unwrap(),
    };

    let (plane, _) = test_plane();
    let mut server = ControlServer::new(config, plane);
    let err = server.start().unwrap_err();
    assert!(matches!(err, ServerError::Bind { .. }));
    assert!(!server.is_running());
    assert!(server.local_addr().is_none());
}

#[test]
fn test_start_outside_runtime_fails() {
    let (plane, _) = test_plane();
    let mut server = ControlServer::new(loopback_config(), plane);
    assert!(matches!(server.start(), Err(ServerError::NoRuntime)));
}

#[tokio::test]
async fn test_link_supervisor_drives_server() {
    let (plane, hw) = test_plane();
    let mut link = LinkSupervisor::new(ControlServer::new(loopback_config(), plane));

    link.handle(LinkEvent::Started);
    assert!(!link.surface().is_running());

    link.handle(LinkEvent::IpAcquired(Ipv4Addr::LOCALHOST));
    let addr = link.surface().local_addr().unwrap();
    let response = http_get(addr, "/motor/speed?value=64").await.unwrap();
    assert!(response.starts_with("HTTP/1.1 200"));
    assert_eq!(hw.duties(), (64, 64));

    link.handle(LinkEvent::Lost);
    assert!(!link.surface().is_running());

    let mut server = link.into_surface();
    server.shutdown().await;
}

#[tokio::test]
async fn test_restart_on_fixed_port() {
    let config = fixed_port_config();
    let addr = config.bind_addr;
    let (plane, hw) = test_plane();
    let mut server = ControlServer::new(config, plane);

    server.start().unwrap();
    server.stop();
    // No yield in between: the stopped task has not run yet.
    server.start().unwrap();
    assert_eq!(server.local_addr(), Some(addr));

    let response = http_get(addr, "/motor/speed?value=77").await.unwrap();
    assert!(response.starts_with("HTTP/1.1 200"), "{response}");
    assert_eq!(hw.duties(), (77, 77));

    server.shutdown().await;
    assert!(http_get(addr, "/").await.is_err());
    // The port is released once shut down.
    drop(std::net::TcpListener::bind(addr).unwrap());
}

#[tokio::test]
async fn test_link_bounce_restarts_server_on_fixed_port() {
    let config = fixed_port_config();
    let addr = config.bind_addr;
    let (plane, hw) = test_plane();
    let mut link = LinkSupervisor::new(ControlServer::new(config, plane));

    link.handle(LinkEvent::IpAcquired(Ipv4Addr::LOCALHOST));
    assert!(link.surface().is_running());

    link.handle(LinkEvent::Lost);
    link.handle(LinkEvent::Associating);
    link.handle(LinkEvent::IpAcquired(Ipv4Addr::LOCALHOST));
    assert!(link.surface().is_running());
    assert_eq!(link.surface().local_addr(), Some(addr));

    let response = http_get(addr, "/motor/direction?dir=forward").await.unwrap();
    assert!(response.starts_with("HTTP/1.1 200"), "{response}");
    assert_eq!(hw.enables(), (true, false));

    link.surface_mut().shutdown().await;
}
