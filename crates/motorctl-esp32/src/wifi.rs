//! WiFi station management for ESP32.
//!
//! [`Station`] owns the driver and turns what it observes into
//! [`LinkEvent`]s for a [`LinkSupervisor`], which starts and stops the
//! control server. Association is retried forever.

use std::net::Ipv4Addr;
use std::thread;

use anyhow::{anyhow, bail, Result};
use esp_idf_svc::{
    eventloop::EspSystemEventLoop,
    hal::{modem::Modem, peripheral},
    nvs::EspDefaultNvsPartition,
    wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi},
};
use log::{info, warn};

use motorctl_core::{ControlSurface, LinkAction, LinkEvent, LinkState, LinkSupervisor};

use crate::config::{NetworkConfig, WifiConfig};

/// Station-mode WiFi driver.
pub struct Station {
    wifi: BlockingWifi<EspWifi<'static>>,
    ssid: String,
}

impl Station {
    /// Create and configure the driver. Nothing is started yet.
    pub fn new(
        modem: impl peripheral::Peripheral<P = Modem> + 'static,
        sysloop: EspSystemEventLoop,
        nvs: Option<EspDefaultNvsPartition>,
        config: &WifiConfig,
    ) -> Result<Self> {
        if config.ssid.is_empty() {
            bail!("WiFi SSID cannot be empty");
        }

        let auth_method = if config.password.is_empty() {
            info!("WiFi password is empty, using open network");
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };

        let esp_wifi = EspWifi::new(modem, sysloop.clone(), nvs)?;
        let mut wifi = BlockingWifi::wrap(esp_wifi, sysloop)?;

        wifi.set_configuration(&Configuration::Client(ClientConfiguration {
            ssid: config
                .ssid
                .as_str()
                .try_into()
                .map_err(|_| anyhow!("SSID too long (max 32 chars)"))?,
            password: config
                .password
                .as_str()
                .try_into()
                .map_err(|_| anyhow!("Password too long (max 64 chars)"))?,
            auth_method,
            ..Default::default()
        }))?;

        Ok(Self {
            wifi,
            ssid: config.ssid.clone(),
        })
    }

    /// Associate and wait for a DHCP lease.
    fn connect(&mut self) -> Result<Ipv4Addr> {
        info!("Connecting to '{}'...", self.ssid);
        self.wifi.connect()?;

        info!("Waiting for DHCP lease...");
        self.wifi.wait_netif_up()?;

        let ip_info = self.wifi.wifi().sta_netif().get_ip_info()?;
        info!("WiFi connected!");
        info!("  IP address: {}", ip_info.ip);
        info!("  Gateway:    {}", ip_info.subnet.gateway);
        info!("  Netmask:    {}", ip_info.subnet.mask);
        Ok(ip_info.ip)
    }

    /// Current address, if the station is associated and holds one.
    fn current_ip(&self) -> Option<Ipv4Addr> {
        if !self.wifi.is_connected().unwrap_or(false) {
            return None;
        }
        let ip = self.wifi.wifi().sta_netif().get_ip_info().ok()?.ip;
        (!ip.is_unspecified()).then_some(ip)
    }

    /// Start the driver and keep the link up for the rest of the program.
    pub fn run<S: ControlSurface>(
        mut self,
        mut link: LinkSupervisor<S>,
        config: &NetworkConfig,
    ) -> Result<()> {
        self.wifi.start()?;
        let mut actions = link.handle(LinkEvent::Started);

        loop {
            if actions.contains(&LinkAction::Connect) {
                link.handle(LinkEvent::Associating);
                actions = match self.connect() {
                    Ok(ip) => link.handle(LinkEvent::IpAcquired(ip)),
                    Err(e) => {
                        warn!("WiFi connect failed: {e}");
                        // Clear any half-finished association before retrying.
                        let _ = self.wifi.disconnect();
                        let next = link.handle(LinkEvent::Lost);
                        thread::sleep(config.reconnect_delay);
                        next
                    }
                };
                continue;
            }

            thread::sleep(config.poll_interval);
            actions = match self.current_ip() {
                None => {
                    warn!(
                        "WiFi link lost, retrying in {:?} (attempt {})",
                        config.reconnect_delay,
                        link.reconnects() + 1
                    );
                    let _ = self.wifi.disconnect();
                    let next = link.handle(LinkEvent::Lost);
                    thread::sleep(config.reconnect_delay);
                    next
                }
                Some(ip) if link.state() != LinkState::Connected(ip) => {
                    link.handle(LinkEvent::IpAcquired(ip))
                }
                Some(_) => Vec::new(),
            };
        }
    }
}
