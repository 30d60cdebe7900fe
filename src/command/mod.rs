// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Heat pump command definitions.
//!
//! The websocket interface understands a small set of text commands of the
//! form `<NAME>;<argument>`:
//!
//! | Command | Purpose | Response |
//! |---------|---------|----------|
//! | `LOGIN;<code>` | Open a session | `Navigation` menu tree |
//! | `GET;<id>` | Navigate to a menu page | `Content` item list |
//!
//! # Examples
//!
//! ```
//! use luxws::command::{Command, DeviceCommand};
//!
//! let get = DeviceCommand::get("0x45df90");
//! assert_eq!(get.frame(), "GET;0x45df90");
//!
//! // The login code never shows up in logs
//! let login = DeviceCommand::login("999999");
//! assert_eq!(login.frame(), "LOGIN;999999");
//! assert_eq!(login.to_string(), "LOGIN;***");
//! ```

use std::fmt;

/// A command that can be sent to the heat pump.
pub trait Command {
    /// Returns the command name, e.g. `"GET"`.
    fn name(&self) -> &'static str;

    /// Returns the command argument.
    fn argument(&self) -> &str;

    /// Returns true if the argument must not be logged.
    fn is_sensitive(&self) -> bool {
        false
    }

    /// Returns the text frame sent over the websocket.
    fn frame(&self) -> String {
        format!("{};{}", self.name(), self.argument())
    }

    /// Returns the frame with sensitive arguments masked, for logging.
    fn redacted(&self) -> String {
        if self.is_sensitive() {
            format!("{};***", self.name())
        } else {
            self.frame()
        }
    }
}

/// Commands understood by the Luxtronik websocket server.
#[derive(Clone, PartialEq, Eq)]
pub enum DeviceCommand {
    /// Opens a session; the device answers with its navigation tree.
    Login {
        /// The access code configured on the controller.
        code: String,
    },
    /// Navigates to a menu page; the device answers with the page content.
    Get {
        /// Device id of the menu item, as found in the navigation tree.
        id: String,
    },
}

impl DeviceCommand {
    /// Creates a `LOGIN` command.
    #[must_use]
    pub fn login(code: impl Into<String>) -> Self {
        Self::Login { code: code.into() }
    }

    /// Creates a `GET` command for a navigation id.
    #[must_use]
    pub fn get(id: impl Into<String>) -> Self {
        Self::Get { id: id.into() }
    }
}

impl Command for DeviceCommand {
    fn name(&self) -> &'static str {
        match self {
            Self::Login { .. } => "LOGIN",
            Self::Get { .. } => "GET",
        }
    }

    fn argument(&self) -> &str {
        match self {
            Self::Login { code } => code,
            Self::Get { id } => id,
        }
    }

    fn is_sensitive(&self) -> bool {
        matches!(self, Self::Login { .. })
    }
}

impl fmt::Display for DeviceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

// Debug goes through the redacted form too, so `?command` fields stay safe.
impl fmt::Debug for DeviceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DeviceCommand").field(&self.redacted()).finish()
    }
}
