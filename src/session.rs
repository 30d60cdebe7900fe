// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Login, navigation and sample reading.
//!
//! A [`Session`] is a logged-in conversation with a heat pump over any
//! [`Protocol`]. The [`Poller`] wraps one session per call: it dials the
//! device, reads every configured sample, sanitizes the result against the
//! previous measurement and always closes the connection.

use chrono::{DateTime, Utc};

use crate::command::DeviceCommand;
use crate::config::{Config, SampleConfig};
use crate::error::{Error, Result};
use crate::navigation::NavigationTree;
use crate::page;
use crate::protocol::{ConnectionConfig, Duplexer, Protocol, ShutdownSignal};
use crate::sanitize::sanitize;
use crate::types::{Measurement, Sample};

/// A logged-in session with a heat pump.
///
/// Requests are awaited one after the other, which is what lets the
/// transport pair each command with the next frame the device sends.
#[derive(Debug)]
pub struct Session<'a, P: Protocol> {
    protocol: &'a P,
    navigation: NavigationTree,
}

impl<'a, P: Protocol> Session<'a, P> {
    /// Logs in and decodes the navigation tree sent in response.
    ///
    /// # Errors
    ///
    /// Returns `Error::Protocol` if the exchange fails and `Error::Navigation`
    /// if the response is not a navigation document.
    pub async fn login(protocol: &'a P, login_code: &str) -> Result<Self> {
        let payload = protocol
            .send_and_await(&DeviceCommand::login(login_code))
            .await?;
        let navigation = NavigationTree::parse(&payload)?;

        tracing::info!(items = navigation.len(), "Logged in to heat pump");

        Ok(Self {
            protocol,
            navigation,
        })
    }

    /// Returns the navigation tree received at login.
    #[must_use]
    pub fn navigation(&self) -> &NavigationTree {
        &self.navigation
    }

    /// Resolves `path` and fetches the raw page payload.
    ///
    /// # Errors
    ///
    /// Returns `Error::Navigation` if the path does not exist and
    /// `Error::Protocol` if the exchange fails.
    pub async fn fetch_page(&self, path: &str) -> Result<String> {
        let id = self.navigation.resolve(path)?;
        tracing::debug!(path = %path, id = %id, "Fetching page");
        let payload = self.protocol.send_and_await(&DeviceCommand::get(id)).await?;
        Ok(payload)
    }

    /// Reads every configured sample.
    ///
    /// Configurations sharing a navigation path are served from a single
    /// page fetch. Samples are returned in configuration order with the
    /// multiplier applied. The first failure aborts the whole read.
    ///
    /// # Errors
    ///
    /// Returns `Error::Navigation` for an unknown path, `Error::Page` if an
    /// item is missing or undecodable, and `Error::Protocol` if an exchange
    /// fails.
    pub async fn read_samples(&self, configs: &[SampleConfig]) -> Result<Vec<Sample>> {
        let mut samples: Vec<Option<Sample>> = vec![None; configs.len()];

        for (path, indices) in group_by_navigation(configs) {
            let payload = self.fetch_page(path).await?;

            for index in indices {
                let config = &configs[index];
                let value =
                    page::extract(&payload, &config.item).map_err(|source| Error::Page {
                        path: path.to_string(),
                        source,
                    })?;
                samples[index] = Some(Sample::from_config(
                    config,
                    value * config.value_multiplier,
                ));
            }
        }

        // Every index belongs to exactly one group.
        Ok(samples.into_iter().flatten().collect())
    }
}

/// Groups configuration indices by navigation path, in order of first appearance.
fn group_by_navigation(configs: &[SampleConfig]) -> Vec<(&str, Vec<usize>)> {
    let mut groups: Vec<(&str, Vec<usize>)> = Vec::new();
    for (index, config) in configs.iter().enumerate() {
        match groups
            .iter_mut()
            .find(|(path, _)| *path == config.navigation)
        {
            Some((_, indices)) => indices.push(index),
            None => groups.push((config.navigation.as_str(), vec![index])),
        }
    }
    groups
}

/// Takes one measurement per call from a heat pump.
///
/// # Examples
///
/// ```no_run
/// use luxws::config::Config;
/// use luxws::protocol::ConnectionConfig;
/// use luxws::{Poller, ShutdownSignal};
///
/// # async fn example() -> luxws::Result<()> {
/// let config = Config::from_file("/configs/config.yaml").await?;
/// let poller = Poller::new(ConnectionConfig::new("192.168.1.50", "999999"));
///
/// let measurement = poller.poll(&config, None, &ShutdownSignal::new()).await?;
/// println!("{} samples", measurement.samples.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Poller {
    connection: ConnectionConfig,
    source: String,
}

impl Poller {
    /// Source tag recorded on measurements unless overridden.
    pub const DEFAULT_SOURCE: &'static str = "jarvis-alpha-innotec-exporter";

    /// Creates a poller for the heat pump described by `connection`.
    #[must_use]
    pub fn new(connection: ConnectionConfig) -> Self {
        Self {
            connection,
            source: Self::DEFAULT_SOURCE.to_string(),
        }
    }

    /// Sets the source tag recorded on measurements.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Returns the connection configuration.
    #[must_use]
    pub fn connection(&self) -> &ConnectionConfig {
        &self.connection
    }

    /// Connects, reads every configured sample and closes the connection.
    ///
    /// The timestamp is taken before dialing. Counter readings are sanitized
    /// against `previous` when given. The connection is closed on every path;
    /// a failed close after a successful read is only logged.
    ///
    /// # Errors
    ///
    /// Returns the first error from dialing, login, path resolution, page
    /// fetch or item extraction. No partial measurement is returned.
    pub async fn poll(
        &self,
        config: &Config,
        previous: Option<&Measurement>,
        interrupt: &ShutdownSignal,
    ) -> Result<Measurement> {
        let measured_at_time = Utc::now();

        tracing::info!(
            host = %self.connection.host(),
            port = self.connection.port(),
            "Polling heat pump"
        );

        let duplexer = Duplexer::connect(&self.connection, interrupt.clone()).await?;
        let measured = self
            .measure(&duplexer, config, previous, measured_at_time)
            .await;
        let closed = duplexer.close().await;

        match (measured, closed) {
            (Ok(measurement), Ok(())) => Ok(measurement),
            (Ok(measurement), Err(e)) => {
                tracing::warn!(error = %e, "Failed to close connection cleanly");
                Ok(measurement)
            }
            (Err(e), closed) => {
                if let Err(close_error) = closed {
                    tracing::debug!(error = %close_error, "Close after failed poll also failed");
                }
                Err(e)
            }
        }
    }

    /// Logs in over `protocol` and assembles a sanitized measurement.
    ///
    /// # Errors
    ///
    /// Returns the first error from login, path resolution, page fetch or
    /// item extraction.
    pub async fn measure<P: Protocol>(
        &self,
        protocol: &P,
        config: &Config,
        previous: Option<&Measurement>,
        measured_at_time: DateTime<Utc>,
    ) -> Result<Measurement> {
        let session = Session::login(protocol, self.connection.login_code()).await?;
        let samples = session.read_samples(&config.sample_configs).await?;

        let mut measurement = Measurement::new(&self.source, &config.location, measured_at_time);
        measurement.samples = match previous {
            Some(previous) => sanitize(samples, &previous.samples),
            None => samples,
        };

        tracing::info!(
            id = %measurement.id,
            samples = measurement.samples.len(),
            "Measurement complete"
        );

        Ok(measurement)
    }
}
