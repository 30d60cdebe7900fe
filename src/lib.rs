// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `luxws` - A Rust client for Alpha Innotec / Luxtronik heat pumps.
//!
//! The Luxtronik 2.1 controller exposes its service menu over a websocket.
//! After logging in, the device sends a navigation tree; each menu page is
//! then fetched by id and holds a flat list of named readings. This library
//! turns a list of `(menu path, item)` pairs into a timestamped
//! [`Measurement`].
//!
//! # Features
//!
//! - **Transport**: websocket duplexer with keepalive and graceful close
//! - **Navigation**: menu paths such as `Informatie > Temperaturen`
//! - **Extraction**: numeric readings with units stripped, `---` read as zero
//! - **Sanitizing**: implausible counter jumps replaced by the previous value
//! - **Persistence**: previous measurement kept as JSON
//!
//! # Quick Start
//!
//! ```no_run
//! use luxws::config::{Config, SampleConfig};
//! use luxws::protocol::ConnectionConfig;
//! use luxws::{Poller, ShutdownSignal};
//!
//! #[tokio::main]
//! async fn main() -> luxws::Result<()> {
//!     let config = Config {
//!         location: "Home".to_string(),
//!         sample_configs: vec![SampleConfig::new("Informatie > Temperaturen", "Aanvoer")],
//!     };
//!
//!     let poller = Poller::new(ConnectionConfig::new("192.168.1.50", "999999"));
//!     let measurement = poller.poll(&config, None, &ShutdownSignal::new()).await?;
//!
//!     for sample in &measurement.samples {
//!         println!("{}: {}", sample.sample_name, sample.value);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Lower-level access
//!
//! [`Session`] works over any [`Protocol`](protocol::Protocol), which makes
//! it possible to browse the navigation tree or fetch raw pages:
//!
//! ```no_run
//! use luxws::protocol::{ConnectionConfig, Duplexer};
//! use luxws::{Session, ShutdownSignal};
//!
//! # async fn example() -> luxws::Result<()> {
//! let config = ConnectionConfig::new("192.168.1.50", "999999");
//! let duplexer = Duplexer::connect(&config, ShutdownSignal::new()).await?;
//!
//! let session = Session::login(&duplexer, config.login_code()).await?;
//! for (path, id) in session.navigation().paths() {
//!     println!("{id}  {path}");
//! }
//!
//! duplexer.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod command;
pub mod config;
pub mod error;
pub mod navigation;
pub mod page;
pub mod protocol;
pub mod sanitize;
pub mod session;
pub mod state;
pub mod types;

pub use error::{Error, Result};
pub use navigation::NavigationTree;
pub use protocol::ShutdownSignal;
pub use session::{Poller, Session};
pub use types::{EntityType, Measurement, MetricType, Sample, SampleType};
