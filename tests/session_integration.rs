// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end polling tests against a scripted websocket device.

mod common;

use std::time::Duration;

use common::{FakeDevice, LOGIN_CODE, OnGet, Script};
use luxws::config::{Config, SampleConfig};
use luxws::error::{NavigationError, PageError, ProtocolError};
use luxws::state::{FileStateStore, StateStore};
use luxws::{Error, MetricType, Poller, ShutdownSignal};

fn config(samples: Vec<SampleConfig>) -> Config {
    Config {
        location: "Test lab".to_string(),
        sample_configs: samples,
    }
}

// ============================================================================
// Successful polls
// ============================================================================

mod polling {
    use super::*;

    #[tokio::test]
    async fn reads_flow_temperature() {
        let device = FakeDevice::start(Script::default()).await;
        let poller = Poller::new(device.connection());

        let measurement = poller
            .poll(
                &config(vec![SampleConfig::new("Info > Temps", "Flow")]),
                None,
                &ShutdownSignal::new(),
            )
            .await
            .unwrap();

        assert_eq!(measurement.location, "Test lab");
        assert_eq!(measurement.source, Poller::DEFAULT_SOURCE);
        assert_eq!(measurement.samples.len(), 1);
        assert_eq!(measurement.samples[0].sample_name, "Flow");
        assert_eq!(measurement.samples[0].value, 22.0);

        let recorded = device.recorded();
        assert_eq!(recorded.frames, [format!("LOGIN;{LOGIN_CODE}"), "GET;0xAAA".to_string()]);
    }

    #[tokio::test]
    async fn fetches_each_page_once() {
        let device = FakeDevice::start(Script::default()).await;
        let poller = Poller::new(device.connection());

        let measurement = poller
            .poll(
                &config(vec![
                    SampleConfig::new("Info > Temps", "Flow"),
                    SampleConfig::new("Info > Energy", "Heating")
                        .with_metric_type(MetricType::Counter),
                    SampleConfig::new("Info > Temps", "Return"),
                    SampleConfig::new("Info > Temps", "Solar"),
                    SampleConfig::new("Info > Energy", "Hot water")
                        .with_metric_type(MetricType::Counter)
                        .with_multiplier(1000.0),
                ]),
                None,
                &ShutdownSignal::new(),
            )
            .await
            .unwrap();

        assert_eq!(device.recorded().gets(), 2);

        let values: Vec<_> = measurement.samples.iter().map(|s| s.value).collect();
        assert_eq!(values, [22.0, 115.0, 19.5, 0.0, 42_000.0]);
    }

    #[tokio::test]
    async fn handshake_carries_subprotocol_and_origin() {
        let device = FakeDevice::start(Script::default()).await;
        let poller = Poller::new(device.connection());

        poller
            .poll(&config(Vec::new()), None, &ShutdownSignal::new())
            .await
            .unwrap();

        let recorded = device.recorded();
        assert_eq!(recorded.subprotocol.as_deref(), Some("Lux_WS"));
        assert_eq!(
            recorded.origin,
            Some(format!("http://127.0.0.1:{}", device.port()))
        );
        assert_eq!(recorded.gets(), 0);
    }

    #[tokio::test]
    async fn closes_connection_after_poll() {
        let device = FakeDevice::start(Script::default()).await;
        let poller = Poller::new(device.connection());

        poller
            .poll(
                &config(vec![SampleConfig::new("Info > Temps", "Flow")]),
                None,
                &ShutdownSignal::new(),
            )
            .await
            .unwrap();

        // Give the device a moment to process the close frame.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(device.recorded().close_received);
    }

    #[tokio::test]
    async fn sanitizes_against_stored_measurement() {
        let device = FakeDevice::start(Script::default()).await;
        let poller = Poller::new(device.connection()).with_source("integration");
        let dir = tempfile::tempdir().unwrap();
        let store = FileStateStore::new(dir.path().join("last-measurement.json"));

        let heating =
            SampleConfig::new("Info > Energy", "Heating").with_metric_type(MetricType::Counter);
        let config = config(vec![heating.clone()]);

        let mut previous = poller
            .poll(&config, None, &ShutdownSignal::new())
            .await
            .unwrap();
        // Pretend the last run saw a much lower counter.
        previous.samples[0].value = 100.0;
        store.store_state(&previous).await.unwrap();

        let stored = store.read_state().await.unwrap();
        let measurement = poller
            .poll(&config, stored.as_ref(), &ShutdownSignal::new())
            .await
            .unwrap();

        assert_eq!(measurement.source, "integration");
        assert_eq!(measurement.samples[0].value, 100.0);
        assert_ne!(measurement.id, previous.id);
    }
}

// ============================================================================
// Failed polls
// ============================================================================

mod failures {
    use super::*;

    #[tokio::test]
    async fn undecodable_value_aborts_poll() {
        let device = FakeDevice::start(Script::default()).await;
        let poller = Poller::new(device.connection());

        let err = poller
            .poll(
                &config(vec![
                    SampleConfig::new("Info > Temps", "Flow"),
                    SampleConfig::new("Info > Temps", "Broken"),
                ]),
                None,
                &ShutdownSignal::new(),
            )
            .await
            .unwrap_err();

        match err {
            Error::Page { path, source } => {
                assert_eq!(path, "Info > Temps");
                assert_eq!(
                    source,
                    PageError::ValueDecode {
                        item: "Broken".to_string(),
                        token: "N/A".to_string(),
                    }
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn missing_item_aborts_poll() {
        let device = FakeDevice::start(Script::default()).await;
        let poller = Poller::new(device.connection());

        let err = poller
            .poll(
                &config(vec![SampleConfig::new("Info > Energy", "Cooling")]),
                None,
                &ShutdownSignal::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Page { source: PageError::ItemNotFound { .. }, .. }
        ));
    }

    #[tokio::test]
    async fn unknown_path_names_failing_segment() {
        let device = FakeDevice::start(Script::default()).await;
        let poller = Poller::new(device.connection());

        let err = poller
            .poll(
                &config(vec![SampleConfig::new("Info > Pressures > High", "Value")]),
                None,
                &ShutdownSignal::new(),
            )
            .await
            .unwrap_err();

        match err {
            Error::Navigation(NavigationError::PathNotFound { segment, path }) => {
                assert_eq!(segment, "Pressures");
                assert_eq!(path, "Info > Pressures > High");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(device.recorded().gets(), 0);
    }

    #[tokio::test]
    async fn silent_device_times_out() {
        let device = FakeDevice::start(Script::default().on_get(OnGet::Ignore)).await;
        let poller = Poller::new(
            device
                .connection()
                .with_response_timeout(Duration::from_millis(200)),
        );

        let err = poller
            .poll(
                &config(vec![SampleConfig::new("Info > Temps", "Flow")]),
                None,
                &ShutdownSignal::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Protocol(ProtocolError::Timeout(200))));
    }

    #[tokio::test]
    async fn device_hangup_is_connection_closed() {
        let device = FakeDevice::start(Script::default().on_get(OnGet::Hangup)).await;
        let poller = Poller::new(device.connection());

        let err = poller
            .poll(
                &config(vec![SampleConfig::new("Info > Temps", "Flow")]),
                None,
                &ShutdownSignal::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::ConnectionClosed)
        ));
    }

    #[tokio::test]
    async fn interrupt_aborts_pending_request() {
        let device = FakeDevice::start(Script::default().on_get(OnGet::Ignore)).await;
        let poller = Poller::new(
            device
                .connection()
                .with_response_timeout(Duration::from_secs(30)),
        );

        let interrupt = ShutdownSignal::new();
        let trigger = interrupt.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(150)).await;
            trigger.trigger();
        });

        let err = tokio::time::timeout(
            Duration::from_secs(5),
            poller.poll(
                &config(vec![SampleConfig::new("Info > Temps", "Flow")]),
                None,
                &interrupt,
            ),
        )
        .await
        .expect("interrupt must end the poll")
        .unwrap_err();

        assert!(matches!(err, Error::Protocol(ProtocolError::Interrupted)));
    }

    #[tokio::test]
    async fn rejected_handshake_is_connection_failure() {
        let device = FakeDevice::start(Script::default().rejecting_handshake()).await;
        let poller = Poller::new(device.connection());

        let err = poller
            .poll(&config(Vec::new()), None, &ShutdownSignal::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::ConnectionFailed(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_device_is_connection_failure() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let connection = luxws::protocol::ConnectionConfig::new("127.0.0.1", LOGIN_CODE)
            .with_port(port)
            .with_connect_timeout(Duration::from_secs(2));

        let err = Poller::new(connection)
            .poll(&config(Vec::new()), None, &ShutdownSignal::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::ConnectionFailed(_))
        ));
    }
}
