use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context as _, Result};
use chrono::{Local, NaiveDate};
use env_logger::{Builder, Target};
use log::{LevelFilter, debug, info, warn};
use waveplus_reader::observer::{Event, Observer};

use crate::config::LoggingConfig;

pub fn log_file_name(date: NaiveDate) -> String {
    format!("WavePlusPlus-{}.log", date.format("%Y-%m-%d"))
}

/// Installs the global logger. `RUST_LOG` overrides the default `info` level.
pub fn init(config: &LoggingConfig, today: NaiveDate) -> Result<Option<PathBuf>> {
    if !config.enabled {
        return Ok(None);
    }

    let mut builder = Builder::new();
    builder
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{:<5}] {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        });

    let mut log_path = None;
    if config.logfile.enabled {
        fs::create_dir_all(&config.logfile.path).with_context(|| {
            format!(
                "failed to create log directory: {}",
                config.logfile.path.display()
            )
        })?;

        let path = config.logfile.path.join(log_file_name(today));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("failed to open log file: {}", path.display()))?;

        builder.target(Target::Pipe(Box::new(Tee { file })));
        log_path = Some(path);
    }

    builder.try_init().context("failed to install logger")?;

    Ok(log_path)
}

/// Writes every log line to stderr and to the log file.
struct Tee {
    file: File,
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        self.file.flush()
    }
}

/// Forwards pipeline events to the `log` facade.
pub struct LogObserver;

impl Observer for LogObserver {
    fn on_event(&self, event: &Event<'_>) {
        match event {
            Event::ScanRound {
                round,
                max_rounds,
                peers,
            } => debug!("scan round {round}/{max_rounds}: {peers} peers"),
            Event::PeerChecked {
                address,
                serial_number: Some(serial_number),
            } => debug!("checked {address}: Wave Plus {serial_number}"),
            Event::PeerChecked {
                address,
                serial_number: None,
            } => debug!("checked {address}: not a Wave Plus"),
            Event::DeviceFound {
                serial_number,
                address,
            } => info!("found device {serial_number} at {address}"),
            Event::Connecting { address } => info!("connecting to {address}"),
            Event::Connected { address } => debug!("connected to {address}"),
            Event::CharacteristicResolved { uuid } => debug!("resolved characteristic {uuid}"),
            Event::Disconnecting { address } => info!("disconnecting from {address}"),
            Event::DisconnectSkipped => info!("no device to disconnect from"),
            Event::DisconnectFailed { address, error } => {
                warn!("failed to disconnect from {address}: {error}")
            }
            Event::PollTimedOut { address, timeout } => {
                warn!("poll of {address} timed out after {timeout:?}")
            }
            Event::RetryScheduled {
                attempt,
                max_attempts,
                delay,
                error,
            } => warn!(
                "attempt {attempt}/{max_attempts} failed: {error}; trying again in {}s",
                delay.as_secs_f32()
            ),
        }
    }
}
