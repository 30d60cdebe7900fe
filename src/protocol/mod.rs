// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Websocket transport for Luxtronik heat pumps.
//!
//! The controller speaks a text protocol over a websocket using the
//! `Lux_WS` subprotocol. Every command is answered by exactly one text
//! frame, so requests are issued strictly one at a time.
//!
//! - [`Duplexer`]: owns the connection, correlates responses and keeps it alive
//! - [`ConnectionConfig`]: address, login code and timeouts
//! - [`ShutdownSignal`]: interrupt latch shared with the host application
//!
//! The [`Protocol`] trait is what the session layer talks to, so sessions can
//! run against a scripted device in tests.

mod config;
mod duplexer;
mod shutdown;

pub use config::ConnectionConfig;
pub use duplexer::{DuplexOptions, Duplexer};
pub use shutdown::ShutdownSignal;

use crate::command::Command;
use crate::error::ProtocolError;

/// Trait for transports that can exchange commands with a heat pump.
#[allow(async_fn_in_trait)]
pub trait Protocol {
    /// Sends a command and waits for the single text frame that answers it.
    ///
    /// # Arguments
    ///
    /// * `command` - The command to send
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the command cannot be sent, the connection
    /// terminates, the caller is interrupted, or no response arrives in time.
    async fn send_and_await<C: Command + Sync>(&self, command: &C)
    -> Result<String, ProtocolError>;
}
