//! WiFi station-mode adapter.
//!
//! The node joins one access point at boot so the TCP link can reach the
//! telemetry peer.  Credentials are validated up front; association is a
//! blocking `connect` + `wait_netif_up`.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF WiFi driver via `esp_idf_svc::wifi`.
//! - **all other targets**: simulation stub for host-side tests.

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityError {
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    ConnectionFailed,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)"),
            Self::ConnectionFailed => write!(f, "WiFi connection failed"),
        }
    }
}

impl std::error::Error for ConnectivityError {}

// ───────────────────────────────────────────────────────────────
// Credentials
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

/// SSID and passphrase, checked against the 802.11 / WPA2 length limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WifiCredentials {
    ssid: heapless::String<32>,
    password: heapless::String<64>,
}

impl WifiCredentials {
    /// An empty password selects an open network.
    pub fn new(ssid: &str, password: &str) -> Result<Self, ConnectivityError> {
        if ssid.is_empty() || !is_printable_ascii(ssid) {
            return Err(ConnectivityError::InvalidSsid);
        }
        if !password.is_empty() && password.len() < 8 {
            return Err(ConnectivityError::InvalidPassword);
        }
        let ssid = ssid.try_into().map_err(|_| ConnectivityError::InvalidSsid)?;
        let password = password
            .try_into()
            .map_err(|_| ConnectivityError::InvalidPassword)?;
        Ok(Self { ssid, password })
    }

    /// Credentials baked in at build time (`WIFI_SSID`, `WIFI_PASS`).
    pub fn from_build_env() -> Result<Self, ConnectivityError> {
        let ssid = option_env!("WIFI_SSID").ok_or(ConnectivityError::NoCredentials)?;
        Self::new(ssid, option_env!("WIFI_PASS").unwrap_or(""))
    }

    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    pub fn is_open(&self) -> bool {
        self.password.is_empty()
    }
}

// ───────────────────────────────────────────────────────────────
// Station bring-up
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub use esp::{connect_station, Station};

#[cfg(target_os = "espidf")]
mod esp {
    use esp_idf_hal::modem::Modem;
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;
    use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};
    use log::{error, info};

    use super::{ConnectivityError, WifiCredentials};

    pub type Station = BlockingWifi<EspWifi<'static>>;

    /// Start the station and block until the interface has an address.
    pub fn connect_station(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: Option<EspDefaultNvsPartition>,
        creds: &WifiCredentials,
    ) -> Result<Station, ConnectivityError> {
        let fail = |what: &str, e: esp_idf_svc::sys::EspError| {
            error!("WiFi: {} failed: {}", what, e);
            ConnectivityError::ConnectionFailed
        };

        let esp_wifi = EspWifi::new(modem, sysloop.clone(), nvs).map_err(|e| fail("driver", e))?;
        let mut wifi = BlockingWifi::wrap(esp_wifi, sysloop).map_err(|e| fail("wrap", e))?;

        let config = Configuration::Client(ClientConfiguration {
            ssid: creds
                .ssid
                .as_str()
                .try_into()
                .map_err(|_| ConnectivityError::InvalidSsid)?,
            password: creds
                .password
                .as_str()
                .try_into()
                .map_err(|_| ConnectivityError::InvalidPassword)?,
            auth_method: if creds.is_open() {
                AuthMethod::None
            } else {
                AuthMethod::WPA2Personal
            },
            ..Default::default()
        });
        wifi.set_configuration(&config).map_err(|e| fail("configure", e))?;
        wifi.start().map_err(|e| fail("start", e))?;
        wifi.connect().map_err(|e| fail("connect", e))?;
        wifi.wait_netif_up().map_err(|e| fail("netif up", e))?;

        info!("WiFi: connected to '{}'", creds.ssid());
        Ok(wifi)
    }
}

/// Simulation: the host network is always up.
#[cfg(not(target_os = "espidf"))]
pub fn connect_station(creds: &WifiCredentials) -> Result<(), ConnectivityError> {
    log::info!("WiFi(sim): connected to '{}'", creds.ssid());
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
