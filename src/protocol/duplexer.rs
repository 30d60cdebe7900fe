// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Websocket command/response duplexer.

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::{Mutex, mpsc, oneshot, watch};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::{ORIGIN, SEC_WEBSOCKET_PROTOCOL};
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

use super::{ConnectionConfig, Protocol, ShutdownSignal};
use crate::command::Command;
use crate::error::ProtocolError;

type Reply = Result<String, ProtocolError>;

/// Timing parameters of a running duplexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuplexOptions {
    /// How long `send_and_await` waits for a response.
    pub response_timeout: Duration,
    /// Interval between keepalive pings while idle.
    pub keepalive_interval: Duration,
    /// How long to wait for the peer to acknowledge a close.
    pub close_grace: Duration,
}

impl Default for DuplexOptions {
    fn default() -> Self {
        Self {
            response_timeout: ConnectionConfig::DEFAULT_RESPONSE_TIMEOUT,
            keepalive_interval: ConnectionConfig::DEFAULT_KEEPALIVE_INTERVAL,
            close_grace: ConnectionConfig::DEFAULT_CLOSE_GRACE,
        }
    }
}

impl From<&ConnectionConfig> for DuplexOptions {
    fn from(config: &ConnectionConfig) -> Self {
        Self {
            response_timeout: config.response_timeout(),
            keepalive_interval: config.keepalive_interval(),
            close_grace: config.close_grace(),
        }
    }
}

/// Owns one websocket connection to a heat pump.
///
/// A reader task and a writer task share the socket. Requests are issued
/// one at a time: the response to a command is the next text frame the
/// device sends. Keepalive pings are written while the connection is idle.
///
/// Always finish with [`Duplexer::close`], which performs the websocket
/// close handshake and joins both tasks.
///
/// # Examples
///
/// ```no_run
/// use luxws::command::DeviceCommand;
/// use luxws::protocol::{ConnectionConfig, Duplexer, Protocol};
/// use luxws::ShutdownSignal;
///
/// # async fn example() -> luxws::Result<()> {
/// let config = ConnectionConfig::new("192.168.1.50", "999999");
/// let duplexer = Duplexer::connect(&config, ShutdownSignal::new()).await?;
///
/// let navigation = duplexer.send_and_await(&DeviceCommand::login("999999")).await?;
/// println!("{navigation}");
///
/// duplexer.close().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Duplexer {
    commands: mpsc::Sender<String>,
    slots: mpsc::Sender<oneshot::Sender<Reply>>,
    in_flight: Mutex<()>,
    shutdown: ShutdownSignal,
    interrupt: ShutdownSignal,
    terminated: ShutdownSignal,
    fault: Fault,
    options: DuplexOptions,
    reader: JoinHandle<Result<(), ProtocolError>>,
    writer: JoinHandle<Result<(), ProtocolError>>,
}

impl Duplexer {
    /// Dials the heat pump and starts the reader and writer tasks.
    ///
    /// The handshake offers the `Lux_WS` subprotocol and an `Origin` header
    /// pointing at the device, which the controller requires.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::InvalidAddress` for an unusable address,
    /// `ProtocolError::ConnectionFailed` if dialing or the handshake fails or
    /// exceeds the connect timeout, and `ProtocolError::Interrupted` if
    /// `interrupt` fires first.
    pub async fn connect(
        config: &ConnectionConfig,
        interrupt: ShutdownSignal,
    ) -> Result<Self, ProtocolError> {
        config.validate()?;

        let url = config.url();
        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| ProtocolError::InvalidAddress(format!("{url}: {e}")))?;
        let origin = HeaderValue::from_str(&config.origin())
            .map_err(|e| ProtocolError::InvalidAddress(e.to_string()))?;
        let headers = request.headers_mut();
        headers.insert(
            SEC_WEBSOCKET_PROTOCOL,
            HeaderValue::from_static(ConnectionConfig::SUBPROTOCOL),
        );
        headers.insert(ORIGIN, origin);

        tracing::debug!(url = %url, "Connecting to heat pump");

        let handshake = tokio::select! {
            biased;
            () = interrupt.wait() => return Err(ProtocolError::Interrupted),
            result = tokio::time::timeout(config.connect_timeout(), connect_async(request)) => result,
        };

        let (stream, response) = match handshake {
            Ok(Ok(connected)) => connected,
            Ok(Err(e)) => return Err(handshake_error(&url, e)),
            Err(_) => {
                return Err(ProtocolError::ConnectionFailed(format!(
                    "no handshake with {url} within {} ms",
                    millis(config.connect_timeout())
                )));
            }
        };

        tracing::debug!(status = %response.status(), "Websocket handshake complete");

        Ok(Self::spawn(stream, DuplexOptions::from(config), interrupt))
    }

    /// Starts the duplexer over an already established websocket stream.
    #[must_use]
    pub fn spawn<S>(stream: S, options: DuplexOptions, interrupt: ShutdownSignal) -> Self
    where
        S: Stream<Item = Result<Message, WsError>> + Sink<Message, Error = WsError>,
        S: Send + Unpin + 'static,
    {
        let (sink, frames) = stream.split();
        let (commands_tx, commands_rx) = mpsc::channel(1);
        let (slots_tx, slots_rx) = mpsc::channel(1);
        let shutdown = ShutdownSignal::new();
        let latches = Latches {
            shutdown: shutdown.clone(),
            interrupt: interrupt.clone(),
            terminated: ShutdownSignal::new(),
            fault: Fault::new(),
        };

        let reader = tokio::spawn(read_loop(frames, slots_rx, latches.clone()));
        let writer = tokio::spawn(write_loop(sink, commands_rx, options, latches.clone()));

        Self {
            commands: commands_tx,
            slots: slots_tx,
            in_flight: Mutex::new(()),
            shutdown,
            interrupt,
            terminated: latches.terminated,
            fault: latches.fault,
            options,
            reader,
            writer,
        }
    }

    /// Returns true once either task has stopped.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.terminated.is_triggered()
    }

    /// Closes the connection and joins both tasks.
    ///
    /// The writer sends a close frame and waits for the peer to acknowledge
    /// it. Either task is aborted if it has not finished once the close
    /// grace period has run out.
    ///
    /// # Errors
    ///
    /// Returns the first error reported by the writer or the reader, and
    /// `ProtocolError::TaskFailed` if the writer had to be aborted.
    pub async fn close(self) -> Result<(), ProtocolError> {
        let Self {
            shutdown,
            options,
            mut reader,
            mut writer,
            ..
        } = self;

        shutdown.trigger();

        // The writer needs one grace period to send the close frame and wait
        // for the acknowledgement.
        let writer_limit = options.close_grace * 2;
        let written = match tokio::time::timeout(writer_limit, &mut writer).await {
            Ok(joined) => joined.map_err(task_failed).and_then(|result| result),
            Err(_) => {
                tracing::warn!("Writer still running after close grace, aborting");
                writer.abort();
                Err(ProtocolError::TaskFailed(format!(
                    "writer did not stop within {} ms",
                    millis(writer_limit)
                )))
            }
        };

        let read = match tokio::time::timeout(options.close_grace, &mut reader).await {
            Ok(joined) => joined.map_err(task_failed).and_then(|result| result),
            Err(_) => {
                tracing::debug!("Reader still running after close grace, aborting");
                reader.abort();
                Ok(())
            }
        };

        written.and(read)
    }

    /// Returns why the connection terminated, or `ConnectionClosed` if it ended normally.
    fn termination_error(&self) -> ProtocolError {
        self.fault.get().unwrap_or(ProtocolError::ConnectionClosed)
    }
}

impl Protocol for Duplexer {
    async fn send_and_await<C: Command + Sync>(&self, command: &C) -> Result<String, ProtocolError> {
        let _in_flight = self.in_flight.lock().await;

        if self.interrupt.is_triggered() {
            return Err(ProtocolError::Interrupted);
        }
        if self.terminated.is_triggered() {
            return Err(self.termination_error());
        }

        let (reply_tx, reply_rx) = oneshot::channel();
        self.slots
            .send(reply_tx)
            .await
            .map_err(|_| self.termination_error())?;
        self.commands
            .send(command.frame())
            .await
            .map_err(|_| self.termination_error())?;

        tracing::debug!(command = %command.redacted(), "Sent command");

        let timeout = self.options.response_timeout;
        // Leaving this select drops `reply_rx`, which disarms the slot.
        let reply = tokio::select! {
            biased;
            () = self.interrupt.wait() => Err(ProtocolError::Interrupted),
            reply = reply_rx => reply.unwrap_or_else(|_| Err(self.termination_error())),
            () = self.terminated.wait() => Err(self.termination_error()),
            () = tokio::time::sleep(timeout) => Err(ProtocolError::Timeout(millis(timeout))),
        };

        match &reply {
            Ok(body) => tracing::debug!(bytes = body.len(), "Received response"),
            Err(e) => tracing::debug!(command = %command.name(), error = %e, "Command failed"),
        }

        reply
    }
}

/// First error that terminated the connection.
#[derive(Debug, Clone)]
struct Fault(Arc<watch::Sender<Option<ProtocolError>>>);

impl Fault {
    fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self(Arc::new(tx))
    }

    /// Records `error` unless an earlier one is already recorded.
    fn record(&self, error: &ProtocolError) {
        self.0.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }
            *slot = Some(error.clone());
            true
        });
    }

    fn get(&self) -> Option<ProtocolError> {
        self.0.borrow().clone()
    }
}

#[derive(Debug, Clone)]
struct Latches {
    shutdown: ShutdownSignal,
    interrupt: ShutdownSignal,
    terminated: ShutdownSignal,
    fault: Fault,
}

impl Latches {
    /// Marks the connection as terminated by `error`.
    fn fail(&self, error: &ProtocolError) {
        self.fault.record(error);
        self.terminated.trigger();
    }
}

async fn read_loop<R>(
    mut frames: R,
    mut slots: mpsc::Receiver<oneshot::Sender<Reply>>,
    latches: Latches,
) -> Result<(), ProtocolError>
where
    R: Stream<Item = Result<Message, WsError>> + Unpin,
{
    let result = read_frames(&mut frames, &mut slots).await;
    match &result {
        Ok(()) => latches.terminated.trigger(),
        Err(e) => {
            tracing::warn!(error = %e, "Websocket reader stopped");
            latches.fail(e);
        }
    }
    result
}

async fn read_frames<R>(
    frames: &mut R,
    slots: &mut mpsc::Receiver<oneshot::Sender<Reply>>,
) -> Result<(), ProtocolError>
where
    R: Stream<Item = Result<Message, WsError>> + Unpin,
{
    let mut pending: Option<oneshot::Sender<Reply>> = None;
    let mut slots_open = true;

    loop {
        tokio::select! {
            biased;
            slot = slots.recv(), if slots_open => match slot {
                Some(slot) => pending = Some(slot),
                None => slots_open = false,
            },
            frame = frames.next() => match frame {
                Some(Ok(Message::Text(text))) => deliver(&mut pending, text),
                Some(Ok(Message::Close(frame))) => {
                    tracing::debug!(?frame, "Peer closed the connection");
                    return Ok(());
                }
                Some(Ok(_)) => {}
                None | Some(Err(WsError::ConnectionClosed | WsError::AlreadyClosed)) => {
                    return Ok(());
                }
                Some(Err(e)) => {
                    let error = ProtocolError::Read(e.to_string());
                    if let Some(slot) = pending.take() {
                        let _ = slot.send(Err(error.clone()));
                    }
                    return Err(error);
                }
            },
        }
    }
}

fn deliver(pending: &mut Option<oneshot::Sender<Reply>>, text: String) {
    match pending.take() {
        Some(slot) if !slot.is_closed() => {
            if slot.send(Ok(text)).is_err() {
                tracing::debug!("Requester went away before the response was delivered");
            }
        }
        _ => tracing::debug!(bytes = text.len(), "Discarding unsolicited frame"),
    }
}

/// Outcome of a frame write raced against shutdown and interrupt.
enum Sent {
    Done,
    Failed(WsError),
    Cancelled,
}

async fn send_unless_stopped<W>(sink: &mut W, message: Message, latches: &Latches) -> Sent
where
    W: Sink<Message, Error = WsError> + Unpin,
{
    tokio::select! {
        biased;
        () = latches.shutdown.wait() => Sent::Cancelled,
        () = latches.interrupt.wait() => Sent::Cancelled,
        sent = sink.send(message) => match sent {
            Ok(()) => Sent::Done,
            Err(e) => Sent::Failed(e),
        },
    }
}

async fn write_loop<W>(
    mut sink: W,
    mut commands: mpsc::Receiver<String>,
    options: DuplexOptions,
    latches: Latches,
) -> Result<(), ProtocolError>
where
    W: Sink<Message, Error = WsError> + Unpin,
{
    let mut keepalive = tokio::time::interval_at(
        Instant::now() + options.keepalive_interval,
        options.keepalive_interval,
    );
    keepalive.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let result = loop {
        let frame = tokio::select! {
            biased;
            () = latches.shutdown.wait() => break Ok(()),
            () = latches.interrupt.wait() => {
                tracing::debug!("Interrupted, closing connection");
                break Ok(());
            }
            () = latches.terminated.wait() => break Ok(()),
            command = commands.recv() => match command {
                Some(frame) => Message::Text(frame),
                None => break Ok(()),
            },
            _ = keepalive.tick() => Message::Ping(Vec::new()),
        };

        let is_keepalive = matches!(frame, Message::Ping(_));
        match send_unless_stopped(&mut sink, frame, &latches).await {
            Sent::Done if is_keepalive => tracing::trace!("Sent keepalive"),
            Sent::Done => keepalive.reset(),
            Sent::Cancelled => break Ok(()),
            Sent::Failed(WsError::ConnectionClosed | WsError::AlreadyClosed) => {
                latches.terminated.trigger();
                break Ok(());
            }
            Sent::Failed(e) => {
                let error = ProtocolError::Write(e.to_string());
                // Fail the pending request now rather than after the close handshake.
                latches.fail(&error);
                break Err(error);
            }
        }
    };

    let close = Message::Close(Some(CloseFrame {
        code: CloseCode::Normal,
        reason: Cow::Borrowed(""),
    }));
    let closing = async {
        match sink.send(close).await {
            Ok(()) | Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => {}
            Err(e) => tracing::debug!(error = %e, "Failed to send close frame"),
        }
        latches.terminated.wait().await;
    };
    if tokio::time::timeout(options.close_grace, closing).await.is_err() {
        tracing::debug!("Peer did not acknowledge close within grace period");
    }
    latches.terminated.trigger();

    if let Err(e) = &result {
        tracing::warn!(error = %e, "Websocket writer stopped");
    }
    result
}

fn handshake_error(url: &str, error: WsError) -> ProtocolError {
    if let WsError::Http(response) = &error {
        let body = response
            .body()
            .as_deref()
            .map(String::from_utf8_lossy)
            .unwrap_or_default();
        tracing::warn!(
            url = %url,
            status = %response.status(),
            body = %body,
            "Websocket handshake rejected"
        );
    }
    ProtocolError::ConnectionFailed(format!("{url}: {error}"))
}

fn task_failed(error: JoinError) -> ProtocolError {
    ProtocolError::TaskFailed(error.to_string())
}

#[allow(clippy::cast_possible_truncation)]
fn millis(duration: Duration) -> u64 {
    duration.as_millis() as u64
}
