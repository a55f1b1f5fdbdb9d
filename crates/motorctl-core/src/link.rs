//! Network link state machine.
//!
//! The control server only makes sense while the station interface holds
//! an address. This module turns link events into explicit transitions:
//!
//! ```text
//! Disconnected --Started/Associating--> Connecting --IpAcquired--> Connected
//!      ^                                    |                          |
//!      +---------------Lost-----------------+------------Lost----------+
//! ```
//!
//! Entering `Connected` starts the control server, leaving it stops the
//! server. Losing the link always requests a reconnect; retries never stop.

use std::fmt;
use std::net::Ipv4Addr;

use log::{error, info, warn};

/// Something that can be started and stopped as the link comes and goes.
///
/// Both operations must be idempotent: starting a running surface and
/// stopping a stopped one are no-ops.
pub trait ControlSurface {
    type Error: fmt::Display;

    fn start(&mut self) -> Result<(), Self::Error>;
    fn stop(&mut self);
    fn is_running(&self) -> bool;
}

/// Connectivity of the station interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkState {
    #[default]
    Disconnected,
    /// Associating with the access point or waiting for DHCP.
    Connecting,
    /// Holding an address.
    Connected(Ipv4Addr),
}

/// Events reported by the network layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    /// The Wi-Fi driver finished starting.
    Started,
    /// An association attempt is in progress.
    Associating,
    /// DHCP handed out an address.
    IpAcquired(Ipv4Addr),
    /// The access point dropped us or association failed.
    Lost,
}

/// Work a transition asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkAction {
    /// Ask the network layer to (re)associate.
    Connect,
    StartServer,
    StopServer,
}

impl LinkState {
    /// Compute the next state and the actions to run, in order.
    pub fn transition(self, event: LinkEvent) -> (LinkState, Vec<LinkAction>) {
        use LinkAction::*;

        match (self, event) {
            (LinkState::Connected(_), LinkEvent::Lost) => {
                (LinkState::Disconnected, vec![StopServer, Connect])
            }
            (_, LinkEvent::Lost) => (LinkState::Disconnected, vec![Connect]),

            // Address renewal keeps the running server.
            (LinkState::Connected(_), LinkEvent::IpAcquired(ip)) => {
                (LinkState::Connected(ip), vec![])
            }
            (_, LinkEvent::IpAcquired(ip)) => (LinkState::Connected(ip), vec![StartServer]),

            (LinkState::Disconnected, LinkEvent::Started) => (LinkState::Connecting, vec![Connect]),
            (LinkState::Disconnected, LinkEvent::Associating) => (LinkState::Connecting, vec![]),
            (state, LinkEvent::Started | LinkEvent::Associating) => (state, vec![]),
        }
    }

    pub fn is_connected(self) -> bool {
        matches!(self, LinkState::Connected(_))
    }
}

/// Drives a [`ControlSurface`] from link events.
#[derive(Debug)]
pub struct LinkSupervisor<S> {
    state: LinkState,
    surface: S,
    reconnects: u32,
}

impl<S: ControlSurface> LinkSupervisor<S> {
    pub fn new(surface: S) -> Self {
        Self {
            state: LinkState::Disconnected,
            surface,
            reconnects: 0,
        }
    }

    /// Apply an event. Server actions are carried out here; the returned
    /// list still contains every action so the network layer can act on
    /// [`LinkAction::Connect`].
    pub fn handle(&mut self, event: LinkEvent) -> Vec<LinkAction> {
        let (next, actions) = self.state.transition(event);
        if next != self.state {
            info!("link {:?} -> {:?}", self.state, next);
        }
        if matches!(event, LinkEvent::Lost) {
            warn!("link lost, reconnecting");
        }
        self.state = next;

        for action in &actions {
            match action {
                LinkAction::StartServer => {
                    if let Err(e) = self.surface.start() {
                        error!("error starting control server: {e}");
                    }
                }
                LinkAction::StopServer => self.surface.stop(),
                LinkAction::Connect => {
                    if !matches!(event, LinkEvent::Started) {
                        self.reconnects += 1;
                    }
                }
            }
        }
        actions
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Reconnect attempts requested after a link loss.
    pub fn reconnects(&self) -> u32 {
        self.reconnects
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Default)]
    struct FakeSurface {
        running: bool,
        starts: u32,
        stops: u32,
        fail_start: bool,
    }

    impl ControlSurface for FakeSurface {
        type Error = String;

        fn start(&mut self) -> Result<(), String> {
            if self.running {
                return Ok(());
            }
            if self.fail_start {
                return Err("bind failed".to_string());
            }
            self.running = true;
            self.starts += 1;
            Ok(())
        }

        fn stop(&mut self) {
            if self.running {
                self.running = false;
                self.stops += 1;
            }
        }

        fn is_running(&self) -> bool {
            self.running
        }
    }

    const IP: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 40);

    #[test]
    fn test_transitions() {
        let (state, actions) = LinkState::Disconnected.transition(LinkEvent::Started);
        assert_eq!(state, LinkState::Connecting);
        assert_eq!(actions, vec![LinkAction::Connect]);

        let (state, actions) = state.transition(LinkEvent::IpAcquired(IP));
        assert_eq!(state, LinkState::Connected(IP));
        assert_eq!(actions, vec![LinkAction::StartServer]);

        let (state, actions) = state.transition(LinkEvent::Lost);
        assert_eq!(state, LinkState::Disconnected);
        assert_eq!(actions, vec![LinkAction::StopServer, LinkAction::Connect]);

        let (state, actions) = LinkState::Connecting.transition(LinkEvent::Lost);
        assert_eq!(state, LinkState::Disconnected);
        assert_eq!(actions, vec![LinkAction::Connect]);
    }

    #[test]
    fn test_address_renewal_keeps_server() {
        let renewed = Ipv4Addr::new(192, 168, 1, 41);
        let (state, actions) = LinkState::Connected(IP).transition(LinkEvent::IpAcquired(renewed));
        assert_eq!(state, LinkState::Connected(renewed));
        assert!(actions.is_empty());
    }

    #[test]
    fn test_supervisor_starts_and_stops_server() {
        let mut sup = LinkSupervisor::new(FakeSurface::default());
        sup.handle(LinkEvent::Started);
        assert!(!sup.surface().is_running());

        sup.handle(LinkEvent::IpAcquired(IP));
        assert!(sup.surface().is_running());
        assert!(sup.state().is_connected());

        let actions = sup.handle(LinkEvent::Lost);
        assert!(actions.contains(&LinkAction::Connect));
        assert!(!sup.surface().is_running());
        assert_eq!(sup.reconnects(), 1);

        sup.handle(LinkEvent::Associating);
        sup.handle(LinkEvent::IpAcquired(IP));
        assert!(sup.surface().is_running());
        assert_eq!(sup.surface().starts, 2);
        assert_eq!(sup.surface().stops, 1);
    }

    #[test]
    fn test_repeated_events_start_once() {
        let mut sup = LinkSupervisor::new(FakeSurface::default());
        sup.handle(LinkEvent::IpAcquired(IP));
        sup.handle(LinkEvent::IpAcquired(IP));
        sup.handle(LinkEvent::Lost);
        sup.handle(LinkEvent::Lost);
        assert_eq!(sup.surface().starts, 1);
        assert_eq!(sup.surface().stops, 1);
        assert_eq!(sup.reconnects(), 2);
    }

    #[test]
    fn test_start_failure_is_degraded_not_fatal() {
        let mut sup = LinkSupervisor::new(FakeSurface {
            fail_start: true,
            ..Default::default()
        });
        let actions = sup.handle(LinkEvent::IpAcquired(IP));
        assert_eq!(actions, vec![LinkAction::StartServer]);
        assert!(sup.state().is_connected());
        assert!(!sup.surface().is_running());
    }
}
