// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `luxws` library.
//!
//! This module provides the error hierarchy for every stage of a poll:
//! websocket communication, navigation tree decoding, page value extraction,
//! configuration loading and state persistence.

use std::path::PathBuf;

use thiserror::Error;

/// The main error type for this library.
///
/// A poll aborts on the first failure; the variant and its context describe
/// which stage failed and on what input.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred during websocket communication.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Error occurred while decoding or walking the navigation tree.
    #[error("navigation error: {0}")]
    Navigation(#[from] NavigationError),

    /// Error occurred while reading an item from a fetched page.
    #[error("page '{path}': {source}")]
    Page {
        /// Navigation path of the page.
        path: String,
        /// The underlying page error.
        #[source]
        source: PageError,
    },

    /// Error occurred while loading the sample configuration.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Error occurred while reading or writing the previous measurement.
    #[error("state error: {0}")]
    State(#[from] StateError),
}

/// Errors related to the websocket connection and the command duplexer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Dialing or the websocket handshake failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Invalid host, port or URL.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// No response arrived in time.
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    /// Reading a frame failed for a reason other than a normal close.
    #[error("read failed: {0}")]
    Read(String),

    /// Writing a frame failed.
    #[error("write failed: {0}")]
    Write(String),

    /// The connection terminated while a response was outstanding.
    #[error("connection closed")]
    ConnectionClosed,

    /// An external interrupt was raised while waiting for a response.
    #[error("interrupted")]
    Interrupted,

    /// A reader or writer task panicked or was cancelled.
    #[error("connection task failed: {0}")]
    TaskFailed(String),
}

/// Errors related to the navigation tree sent by the device on login.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NavigationError {
    /// The payload is not well-formed markup.
    #[error("malformed navigation markup: {0}")]
    Markup(String),

    /// The document root is not a `Navigation` element.
    #[error("unexpected root element <{0}>")]
    UnexpectedRoot(String),

    /// The payload contains no `Navigation` element at all.
    #[error("navigation element missing")]
    MissingRoot,

    /// A menu item has no `id` attribute.
    #[error("menu item without id")]
    MissingId,

    /// A path segment has no matching menu item at its level.
    #[error("item '{segment}' of path '{path}' does not exist")]
    PathNotFound {
        /// The first segment that could not be matched.
        segment: String,
        /// The full path being resolved.
        path: String,
    },
}

/// Errors related to extracting an item value from a page payload.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PageError {
    /// No entry with the requested name exists on the page.
    #[error("no match for item '{item}'")]
    ItemNotFound {
        /// The requested item name.
        item: String,
    },

    /// The entry exists but its value is neither numeric nor the `---` sentinel.
    #[error("cannot decode value '{token}' of item '{item}'")]
    ValueDecode {
        /// The requested item name.
        item: String,
        /// The raw value token.
        token: String,
    },
}

/// Errors related to loading the sample configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path of the configuration file.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration is not valid YAML for the expected shape.
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The configuration parsed but violates a constraint.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors related to persisting the previous measurement.
#[derive(Debug, Error)]
pub enum StateError {
    /// The state file could not be read or written.
    #[error("failed to access {path}: {source}")]
    Io {
        /// Path of the state file.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The state file does not contain a valid measurement.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
