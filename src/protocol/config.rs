// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Connection parameters for the heat pump websocket.

use std::fmt;
use std::time::Duration;

use crate::error::ProtocolError;

/// Configuration for connecting to a heat pump.
///
/// # Examples
///
/// ```
/// use luxws::protocol::ConnectionConfig;
/// use std::time::Duration;
///
/// // Defaults: port 8214, 10 s timeouts, 1 s keepalive
/// let config = ConnectionConfig::new("192.168.1.50", "999999");
/// assert_eq!(config.url(), "ws://192.168.1.50:8214/");
///
/// let config = ConnectionConfig::new("192.168.1.50", "999999")
///     .with_port(8215)
///     .with_response_timeout(Duration::from_secs(5));
/// assert_eq!(config.port(), 8215);
/// ```
#[derive(Clone)]
pub struct ConnectionConfig {
    host: String,
    port: u16,
    login_code: String,
    connect_timeout: Duration,
    response_timeout: Duration,
    keepalive_interval: Duration,
    close_grace: Duration,
}

impl ConnectionConfig {
    /// Default websocket port of the Luxtronik controller.
    pub const DEFAULT_PORT: u16 = 8214;
    /// Default timeout for dialing and the websocket handshake.
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
    /// Default timeout for a single command response.
    pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(10);
    /// Default interval between keepalive frames.
    pub const DEFAULT_KEEPALIVE_INTERVAL: Duration = Duration::from_secs(1);
    /// Default time to wait for the peer to acknowledge a close.
    pub const DEFAULT_CLOSE_GRACE: Duration = Duration::from_secs(1);
    /// Websocket subprotocol spoken by the controller.
    pub const SUBPROTOCOL: &'static str = "Lux_WS";

    /// Creates a configuration for the heat pump at `host`.
    ///
    /// # Arguments
    ///
    /// * `host` - Hostname or IP address of the heat pump
    /// * `login_code` - Access code configured on the controller
    #[must_use]
    pub fn new(host: impl Into<String>, login_code: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: Self::DEFAULT_PORT,
            login_code: login_code.into(),
            connect_timeout: Self::DEFAULT_CONNECT_TIMEOUT,
            response_timeout: Self::DEFAULT_RESPONSE_TIMEOUT,
            keepalive_interval: Self::DEFAULT_KEEPALIVE_INTERVAL,
            close_grace: Self::DEFAULT_CLOSE_GRACE,
        }
    }

    /// Sets a custom port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the dial and handshake timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the per-command response timeout.
    #[must_use]
    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    /// Sets the keepalive interval.
    #[must_use]
    pub fn with_keepalive_interval(mut self, interval: Duration) -> Self {
        self.keepalive_interval = interval;
        self
    }

    /// Sets how long to wait for the peer to acknowledge a close.
    #[must_use]
    pub fn with_close_grace(mut self, grace: Duration) -> Self {
        self.close_grace = grace;
        self
    }

    /// Returns the host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the login code.
    #[must_use]
    pub fn login_code(&self) -> &str {
        &self.login_code
    }

    /// Returns the dial and handshake timeout.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Returns the per-command response timeout.
    #[must_use]
    pub fn response_timeout(&self) -> Duration {
        self.response_timeout
    }

    /// Returns the keepalive interval.
    #[must_use]
    pub fn keepalive_interval(&self) -> Duration {
        self.keepalive_interval
    }

    /// Returns the close grace period.
    #[must_use]
    pub fn close_grace(&self) -> Duration {
        self.close_grace
    }

    /// Returns the websocket URL.
    #[must_use]
    pub fn url(&self) -> String {
        format!("ws://{}:{}/", self.host, self.port)
    }

    /// Returns the `Origin` header value expected by the controller.
    #[must_use]
    pub fn origin(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Checks that the address can be dialed.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::InvalidAddress` for an empty host or port 0.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.host.trim().is_empty() {
            return Err(ProtocolError::InvalidAddress(
                "host of the heat pump is not set".to_string(),
            ));
        }
        if self.port == 0 {
            return Err(ProtocolError::InvalidAddress(format!(
                "port 0 is not valid, the controller listens on {} by default",
                Self::DEFAULT_PORT
            )));
        }
        if self.keepalive_interval.is_zero() {
            return Err(ProtocolError::InvalidAddress(
                "keepalive interval must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("login_code", &"***")
            .field("connect_timeout", &self.connect_timeout)
            .field("response_timeout", &self.response_timeout)
            .field("keepalive_interval", &self.keepalive_interval)
            .field("close_grace", &self.close_grace)
            .finish()
    }
}
