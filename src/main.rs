pub mod bridge;
pub mod config;
pub mod datalog;
pub mod device;

use crate::bridge::driver::BridgeDriver;
use crate::bridge::publisher::RatePublisher;
use crate::bridge::websocket::WebSocketSink;
use crate::config::BridgeConfig;
use crate::datalog::DataLogger;
use crate::device::source::HidReportSource;
use color_eyre::{eyre::eyre, Result};
use hidapi::HidApi;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let config = BridgeConfig::load_or_create()?;
    config
        .device
        .validate()
        .map_err(|e| eyre!("Invalid device spec: {}", e))?;
    info!(
        "Bridging {} to {} at one send per {}s",
        config.device.name, config.publish.url, config.publish.window_secs
    );

    let api = HidApi::new().map_err(|e| eyre!("Failed to initialize hidapi: {}", e))?;
    let source = HidReportSource::open(&api, &config.device)
        .map_err(|e| eyre!("Failed to open device: {}", e))?;

    let datalog = match &config.datalog_path {
        Some(path) => {
            info!("Recording data to {}", path.display());
            Some(DataLogger::open(path)?)
        }
        None => None,
    };

    let sink = WebSocketSink::connect(&config.publish.url)
        .await
        .map_err(|e| eyre!("Failed to connect websocket: {}", e))?;
    let publisher = RatePublisher::new(sink, Duration::from_secs_f64(config.publish.window_secs));

    let driver = BridgeDriver::new(config.device, source, publisher, datalog);

    let shutdown = CancellationToken::new();
    let loop_token = shutdown.clone();
    let mut bridge_task = tokio::spawn(async move { driver.run(loop_token).await });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupt received, shutting down");
            shutdown.cancel();
            match bridge_task.await {
                Ok(Ok(())) => info!("Bridge stopped cleanly"),
                Ok(Err(e)) => warn!("Bridge stopped with error: {}", e),
                Err(e) => error!("Bridge task panicked: {}", e),
            }
        }
        result = &mut bridge_task => {
            match result {
                Ok(Ok(())) => info!("Bridge loop finished"),
                Ok(Err(e)) => return Err(eyre!("Bridge terminated: {}", e)),
                Err(e) => return Err(eyre!("Bridge task panicked: {}", e)),
            }
        }
    }

    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
