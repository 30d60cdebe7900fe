// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `luxws-exporter` - polls a Luxtronik heat pump once and prints the
//! measurement as JSON.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use luxws::config::Config;
use luxws::error::StateError;
use luxws::protocol::ConnectionConfig;
use luxws::state::{FileStateStore, StateStore};
use luxws::{Poller, ShutdownSignal};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "luxws-exporter", version)]
#[command(about = "Reads configured values from a Luxtronik heat pump and prints them as JSON")]
struct Args {
    /// Hostname or IP address of the heat pump
    #[arg(long, env = "WEBSOCKET_HOST_IP", default_value = "127.0.0.1")]
    host: String,

    /// Websocket port of the heat pump
    #[arg(long, env = "WEBSOCKET_HOST_PORT", default_value_t = ConnectionConfig::DEFAULT_PORT)]
    port: u16,

    /// Login code configured on the controller
    #[arg(long, env = "WEBSOCKET_LOGIN_CODE", hide_env_values = true)]
    login_code: String,

    /// Path of the YAML sample configuration
    #[arg(long, env = "CONFIG_PATH", default_value = "/configs/config.yaml")]
    config_path: PathBuf,

    /// Path of the JSON file holding the previous measurement
    #[arg(
        long,
        env = "MEASUREMENT_FILE_PATH",
        default_value = "/configs/last-measurement.json"
    )]
    state_file_path: PathBuf,

    /// Seconds to wait for each response from the heat pump
    #[arg(long, env = "WEBSOCKET_RESPONSE_TIMEOUT", default_value_t = 10)]
    response_timeout_secs: u64,
}

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let interrupt = ShutdownSignal::new();
    let on_ctrl_c = interrupt.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, closing connection");
            on_ctrl_c.trigger();
        }
    });

    match run(args, &interrupt).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Poll failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args, interrupt: &ShutdownSignal) -> luxws::Result<()> {
    let config = Config::from_file(&args.config_path).await?;

    let store = FileStateStore::new(args.state_file_path);
    let previous = store.read_state().await?;

    let connection = ConnectionConfig::new(args.host, args.login_code)
        .with_port(args.port)
        .with_response_timeout(Duration::from_secs(args.response_timeout_secs));
    let poller = Poller::new(connection);

    let measurement = poller.poll(&config, previous.as_ref(), interrupt).await?;

    let json = serde_json::to_string_pretty(&measurement).map_err(StateError::from)?;
    println!("{json}");

    store.store_state(&measurement).await?;
    Ok(())
}
