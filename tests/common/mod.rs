// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scripted in-process heat pump for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use luxws::protocol::ConnectionConfig;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::header::{ORIGIN, SEC_WEBSOCKET_PROTOCOL};
use tokio_tungstenite::tungstenite::http::{HeaderValue, StatusCode};

pub const LOGIN_CODE: &str = "999999";

pub const NAVIGATION: &str = "<Navigation id='0x45cd88'>\
    <item id='0x1'><name>Info</name>\
    <item id='0xAAA'><name>Temps</name></item>\
    <item id='0xBBB'><name>Energy</name></item>\
    </item>\
    <item id='0x2'><name>Settings</name></item>\
    </Navigation>";

pub const TEMPS: &str = "<Content>\
    <item id='0x4816ac'><name>Flow</name><value>22.0°C</value></item>\
    <item id='0x44fdcc'><name>Return</name><value>19.5°C</value></item>\
    <item id='0x461ecc'><name>Solar</name><value>---</value></item>\
    <item id='0x43e60c'><name>Broken</name><value>N/A</value></item>\
    <name>Temps</name></Content>";

pub const ENERGY: &str = "<Content>\
    <item id='0x5a1'><name>Heating</name><value>115.0 kWh</value></item>\
    <item id='0x5a2'><name>Hot water</name><value>42.0 kWh</value></item>\
    <name>Energy</name></Content>";

/// How the device reacts to `GET` commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnGet {
    /// Send the scripted page.
    Answer,
    /// Never answer.
    Ignore,
    /// Close the connection instead of answering.
    Hangup,
}

/// Behaviour of the fake device.
#[derive(Debug, Clone)]
pub struct Script {
    pub navigation: String,
    pub pages: HashMap<String, String>,
    pub on_get: OnGet,
    pub reject_handshake: bool,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            navigation: NAVIGATION.to_string(),
            pages: HashMap::from([
                ("0xAAA".to_string(), TEMPS.to_string()),
                ("0xBBB".to_string(), ENERGY.to_string()),
            ]),
            on_get: OnGet::Answer,
            reject_handshake: false,
        }
    }
}

impl Script {
    pub fn on_get(mut self, on_get: OnGet) -> Self {
        self.on_get = on_get;
        self
    }

    pub fn rejecting_handshake(mut self) -> Self {
        self.reject_handshake = true;
        self
    }
}

/// What the device observed.
#[derive(Debug, Default, Clone)]
pub struct Recorded {
    pub frames: Vec<String>,
    pub origin: Option<String>,
    pub subprotocol: Option<String>,
    pub pings: usize,
    pub close_received: bool,
    pub connections: usize,
}

impl Recorded {
    pub fn gets(&self) -> usize {
        self.frames.iter().filter(|f| f.starts_with("GET;")).count()
    }
}

/// A websocket server speaking the controller's text protocol.
pub struct FakeDevice {
    addr: SocketAddr,
    recorded: Arc<Mutex<Recorded>>,
    task: JoinHandle<()>,
}

impl FakeDevice {
    pub async fn start(script: Script) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let recorded = Arc::new(Mutex::new(Recorded::default()));
        let task = tokio::spawn(serve(listener, script, Arc::clone(&recorded)));
        Self {
            addr,
            recorded,
            task,
        }
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Connection settings with short timeouts suitable for tests.
    pub fn connection(&self) -> ConnectionConfig {
        ConnectionConfig::new("127.0.0.1", LOGIN_CODE)
            .with_port(self.port())
            .with_connect_timeout(Duration::from_secs(2))
            .with_response_timeout(Duration::from_millis(500))
            .with_close_grace(Duration::from_millis(300))
    }

    pub fn recorded(&self) -> Recorded {
        self.recorded.lock().unwrap().clone()
    }
}

impl Drop for FakeDevice {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve(listener: TcpListener, script: Script, recorded: Arc<Mutex<Recorded>>) {
    while let Ok((stream, _)) = listener.accept().await {
        let seen = Arc::clone(&recorded);
        let reject = script.reject_handshake;
        let callback = move |request: &Request, mut response: Response| {
            let mut seen = seen.lock().unwrap();
            seen.connections += 1;
            seen.origin = header(request, ORIGIN.as_str());
            seen.subprotocol = header(request, SEC_WEBSOCKET_PROTOCOL.as_str());

            if reject {
                let mut refusal = ErrorResponse::new(Some("login disabled".to_string()));
                *refusal.status_mut() = StatusCode::FORBIDDEN;
                return Err(refusal);
            }

            response
                .headers_mut()
                .insert(SEC_WEBSOCKET_PROTOCOL, HeaderValue::from_static("Lux_WS"));
            Ok(response)
        };

        let Ok(mut ws) = accept_hdr_async(stream, callback).await else {
            continue;
        };

        while let Some(Ok(message)) = ws.next().await {
            match message {
                Message::Text(frame) => {
                    recorded.lock().unwrap().frames.push(frame.clone());

                    let reply = if frame.starts_with("LOGIN;") {
                        Some(script.navigation.clone())
                    } else if let Some(id) = frame.strip_prefix("GET;") {
                        match script.on_get {
                            OnGet::Answer => Some(
                                script
                                    .pages
                                    .get(id)
                                    .cloned()
                                    .unwrap_or_else(|| "<Content></Content>".to_string()),
                            ),
                            OnGet::Ignore => None,
                            OnGet::Hangup => {
                                let _ = ws.close(None).await;
                                None
                            }
                        }
                    } else {
                        None
                    };

                    if let Some(reply) = reply {
                        if ws.send(Message::Text(reply)).await.is_err() {
                            break;
                        }
                    }
                }
                Message::Ping(_) => recorded.lock().unwrap().pings += 1,
                Message::Close(_) => recorded.lock().unwrap().close_received = true,
                _ => {}
            }
        }
    }
}

fn header(request: &Request, name: &str) -> Option<String> {
    request
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}
