mod args;
mod config;
mod logging;
mod output;

use std::{process::ExitCode, sync::Arc};

use anyhow::{Context as _, Result, bail};
use args::Args;
use clap::Parser as _;
use log::{error, info};
use waveplus_reader::{
    ble::BleAdapter, locator::DeviceIdentity, poll::Poller, waveplus::TelemetryDecoder,
};

use crate::config::{Config, Settings};
use crate::logging::LogObserver;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = run().await {
        eprintln!("{e:#}");
        return ExitCode::from(1);
    }

    ExitCode::from(0)
}

async fn run() -> Result<()> {
    let args = Args::parse();

    let config = Config::load(&args.config)?;
    let settings = Settings::resolve(&args, config).context("invalid configuration")?;

    if let Some(path) = logging::init(&settings.logging, output::now(settings.timezone).date())? {
        info!("logging to {}", path.display());
    }

    output::ensure_dir(&settings.output_dir)?;

    let adapter = BleAdapter::first()
        .await
        .context("failed to initialize Bluetooth adapter")?;

    // Scanning and connecting share the one adapter; the poller runs them strictly in sequence.
    let mut poller = Poller::new(
        adapter.clone(),
        adapter,
        TelemetryDecoder::new(settings.radon_order),
        settings.poll,
    )
    .with_observer(Arc::new(LogObserver));

    let mut failed = Vec::new();
    for device in settings.devices.values() {
        info!("querying device {device}");

        let mut identity = DeviceIdentity::new(device.serial_number);
        let reading = match poller.poll_with_retry(&mut identity).await {
            Ok(r) => r,
            Err(err) => {
                error!(
                    "giving up on device {device}: {:#}",
                    anyhow::Error::from(err)
                );
                failed.push(device.serial_number);
                continue;
            }
        };

        info!("device {device}: {}", output::summary(&reading));

        let path = output::write_reading(
            &settings.output_dir,
            device.serial_number,
            output::now(settings.timezone),
            &reading,
        )
        .with_context(|| format!("failed to store reading of device {device}"))?;

        info!("wrote {}", path.display());
    }

    if !failed.is_empty() {
        bail!("failed to query {} device(s): {failed:?}", failed.len());
    }

    Ok(())
}
