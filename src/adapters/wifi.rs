//! WiFi station-mode adapter.
//!
//! Implements [`ConnectivityPort`] — the boundary the upload gatekeeper
//! talks to. The radio is the single largest power cost on this board, so
//! the adapter is strictly connect-on-demand: no background reconnection,
//! no persistent association. `disconnect` is idempotent and safe to call
//! even if the link never came up.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF STA driver, bounded-wait
//!   association poll at 100 ms steps.
//! - **all other targets**: simulation with a scriptable failure switch.

use core::fmt;
use log::{info, warn};

use crate::app::ports::{ConnectivityError, ConnectivityPort};

// ───────────────────────────────────────────────────────────────
// Credential validation
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialError {
    /// SSID must be 1–32 printable ASCII bytes.
    InvalidSsid,
    /// Password must be 8–64 bytes for WPA2, or empty for an open network.
    InvalidPassword,
}

impl fmt::Display for CredentialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => {
                write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)")
            }
        }
    }
}

fn validate_ssid(ssid: &str) -> Result<(), CredentialError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(CredentialError::InvalidSsid);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), CredentialError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(CredentialError::InvalidPassword);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    ssid: heapless::String<32>,
    password: heapless::String<64>,
    connected: bool,
    #[cfg(target_os = "espidf")]
    wifi: esp_idf_svc::wifi::EspWifi<'static>,
    #[cfg(not(target_os = "espidf"))]
    fail_connect: bool,
}

#[cfg(target_os = "espidf")]
impl WifiAdapter {
    pub fn new(wifi: esp_idf_svc::wifi::EspWifi<'static>) -> Self {
        Self {
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            connected: false,
            wifi,
        }
    }
}

#[cfg(not(target_os = "espidf"))]
impl WifiAdapter {
    pub fn new() -> Self {
        Self {
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            connected: false,
            fail_connect: false,
        }
    }

    /// Script the next connect attempts to fail (simulation only).
    pub fn sim_fail_connect(&mut self, fail: bool) {
        self.fail_connect = fail;
    }
}

impl WifiAdapter {
    pub fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), CredentialError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        self.ssid.clear();
        self.ssid.push_str(ssid).map_err(|()| CredentialError::InvalidSsid)?;
        self.password.clear();
        self.password
            .push_str(password)
            .map_err(|()| CredentialError::InvalidPassword)?;
        info!("WiFi: credentials updated (SSID='{}')", self.ssid);
        Ok(())
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self, timeout_ms: u32) -> Result<(), ConnectivityError> {
        use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration};

        let auth_method = if self.password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let conf = Configuration::Client(ClientConfiguration {
            ssid: self.ssid.as_str().try_into().map_err(|_| ConnectivityError::NoCredentials)?,
            password: self
                .password
                .as_str()
                .try_into()
                .map_err(|_| ConnectivityError::NoCredentials)?,
            auth_method,
            ..Default::default()
        });

        self.wifi
            .set_configuration(&conf)
            .map_err(|_| ConnectivityError::Timeout)?;
        self.wifi.start().map_err(|_| ConnectivityError::Timeout)?;
        self.wifi.connect().map_err(|_| ConnectivityError::Timeout)?;

        // Bounded association wait, 100 ms steps.
        let mut waited_ms: u32 = 0;
        while !self.wifi.is_up().unwrap_or(false) {
            if waited_ms >= timeout_ms {
                let _ = self.wifi.stop();
                return Err(ConnectivityError::Timeout);
            }
            esp_idf_hal::delay::FreeRtos::delay_ms(100);
            waited_ms += 100;
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self, _timeout_ms: u32) -> Result<(), ConnectivityError> {
        if self.fail_connect {
            return Err(ConnectivityError::Timeout);
        }
        info!("WiFi(sim): connected to '{}'", self.ssid);
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_disconnect(&mut self) {
        let _ = self.wifi.disconnect();
        let _ = self.wifi.stop();
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_disconnect(&mut self) {}
}

impl ConnectivityPort for WifiAdapter {
    fn connect(&mut self, timeout_ms: u32) -> Result<(), ConnectivityError> {
        if self.ssid.is_empty() {
            return Err(ConnectivityError::NoCredentials);
        }
        if self.connected {
            return Ok(());
        }

        info!("WiFi: connecting to '{}' ({} ms budget)", self.ssid, timeout_ms);
        match self.platform_connect(timeout_ms) {
            Ok(()) => {
                self.connected = true;
                info!("WiFi: connected");
                Ok(())
            }
            Err(e) => {
                warn!("WiFi: connection failed — {}", e);
                Err(e)
            }
        }
    }

    fn disconnect(&mut self) {
        if self.connected {
            self.platform_disconnect();
            self.connected = false;
            info!("WiFi: disconnected");
        }
        // Not connected: nothing to tear down, and that is fine.
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
