use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context as _, Result, bail};
use chrono_tz::Tz;
use clap::ValueEnum;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use waveplus_reader::{
    locator::ScanOptions,
    poll::PollOptions,
    retry::{Backoff, RetryPolicy},
    waveplus::RadonOrder,
};

use crate::args::Args;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub devices: Vec<DeviceConfig>,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
    pub scan: ScanConfig,
    pub retry: RetryConfig,
    pub timeout_secs: Option<u64>,
    pub radon_order: RadonOrderSetting,
}

#[derive(Debug, Deserialize)]
pub struct DeviceConfig {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(deserialize_with = "deserialize_serial_number")]
    pub serial: u32,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub enabled: bool,
    pub logfile: LogFileConfig,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            logfile: LogFileConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogFileConfig {
    pub enabled: bool,
    pub path: PathBuf,
}

impl Default for LogFileConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: PathBuf::from("logs"),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub rounds: u32,
    pub window_ms: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        let defaults = ScanOptions::default();
        Self {
            rounds: defaults.max_rounds,
            window_ms: defaults.window.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackoffKind {
    #[default]
    Fixed,
    Exponential,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub attempts: u32,
    pub delay_secs: u64,
    pub backoff: BackoffKind,
    /// Cap for exponential backoff.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 5,
            delay_secs: 5,
            backoff: BackoffKind::Fixed,
            max_delay_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum RadonOrderSetting {
    #[default]
    ShortTermFirst,
    LongTermFirst,
}

impl From<RadonOrderSetting> for RadonOrder {
    fn from(v: RadonOrderSetting) -> Self {
        match v {
            RadonOrderSetting::ShortTermFirst => RadonOrder::ShortTermFirst,
            RadonOrderSetting::LongTermFirst => RadonOrder::LongTermFirst,
        }
    }
}

impl Config {
    /// Reads the config file, or `None` if it does not exist.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        let config = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;

        Ok(Some(config))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub serial_number: u32,
    pub name: Option<String>,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} ({name})", self.serial_number),
            None => write!(f, "{}", self.serial_number),
        }
    }
}

/// Config file merged with command line overrides.
#[derive(Debug)]
pub struct Settings {
    pub devices: IndexMap<u32, Device>,
    pub output_dir: PathBuf,
    pub logging: LoggingConfig,
    pub poll: PollOptions,
    pub radon_order: RadonOrder,
    pub timezone: Option<Tz>,
}

impl Settings {
    pub fn resolve(args: &Args, config: Option<Config>) -> Result<Self> {
        let devices: Vec<Device> = if !args.device_serial.is_empty() {
            args.device_serial
                .iter()
                .map(|&serial_number| Device {
                    serial_number,
                    name: None,
                })
                .collect()
        } else if let Some(config) = &config {
            config
                .devices
                .iter()
                .map(|d| Device {
                    serial_number: d.serial,
                    name: d.name.clone(),
                })
                .collect()
        } else {
            bail!(
                "no devices passed and no config file found: {}",
                args.config.display()
            );
        };

        let mut by_serial = IndexMap::new();
        for device in devices {
            by_serial.entry(device.serial_number).or_insert(device);
        }

        if by_serial.is_empty() {
            bail!("no devices configured");
        }

        let config = config.unwrap_or_default();

        let attempts = args.attempts.unwrap_or(config.retry.attempts);
        if attempts == 0 {
            bail!("retry attempts must be at least 1");
        }
        if config.scan.rounds == 0 {
            bail!("scan rounds must be at least 1");
        }

        let delay = Duration::from_secs(args.retry_delay_secs.unwrap_or(config.retry.delay_secs));
        let backoff = match config.retry.backoff {
            BackoffKind::Fixed => Backoff::Fixed(delay),
            BackoffKind::Exponential => Backoff::Exponential {
                initial: delay,
                max: Duration::from_secs(config.retry.max_delay_secs),
            },
        };

        let timeout_secs = args
            .timeout_secs
            .or(config.timeout_secs)
            .unwrap_or(PollOptions::default().timeout.as_secs());

        Ok(Self {
            devices: by_serial,
            output_dir: args.output.clone().unwrap_or(config.output.path),
            logging: config.logging,
            poll: PollOptions {
                scan: ScanOptions {
                    max_rounds: config.scan.rounds,
                    window: Duration::from_millis(config.scan.window_ms),
                },
                timeout: Duration::from_secs(timeout_secs),
                retry: RetryPolicy {
                    max_attempts: attempts,
                    backoff,
                },
            },
            radon_order: args.radon_order.unwrap_or(config.radon_order).into(),
            timezone: args.timezone,
        })
    }
}

/// Serial numbers are accepted as JSON numbers or numeric strings.
fn deserialize_serial_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u32),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(v) => Ok(v),
        Raw::Text(s) => s.trim().parse().map_err(|_| {
            serde::de::Error::custom(format!("invalid serial number: {s:?}"))
        }),
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser as _;

    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["waveplus-poll"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    fn config(json: &str) -> Config {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn cli_serials_without_config_use_defaults() {
        let settings = Settings::resolve(&args(&["-d", "2930000001,2930000002"]), None).unwrap();

        assert_eq!(
            settings.devices.keys().copied().collect::<Vec<_>>(),
            vec![2930000001, 2930000002]
        );
        assert_eq!(settings.output_dir, PathBuf::from("data"));
        assert_eq!(settings.poll, PollOptions::default());
        assert_eq!(settings.radon_order, RadonOrder::ShortTermFirst);
        assert!(settings.logging.enabled);
    }

    #[test]
    fn missing_devices_and_config_is_an_error() {
        let err = Settings::resolve(&args(&["-c", "absent.json"]), None).unwrap_err();

        assert!(err.to_string().contains("no devices passed"));
    }

    #[test]
    fn config_file_devices_and_sections() {
        let config = config(
            r#"{
                "devices": [
                    {"name": "Basement", "serial": 2930000001},
                    {"name": "Bedroom", "serial": "2930000002"},
                    {"name": "Duplicate", "serial": 2930000001}
                ],
                "output": {"path": "/var/lib/waveplus"},
                "logging": {"enabled": true, "logfile": {"enabled": true, "path": "/var/log/waveplus"}, "logformat": "%(message)s"},
                "scan": {"rounds": 20, "window_ms": 250},
                "retry": {"attempts": 3, "delay_secs": 2, "backoff": "exponential", "max_delay_secs": 10},
                "timeout_secs": 15,
                "radon_order": "long-term-first"
            }"#,
        );

        let settings = Settings::resolve(&args(&[]), Some(config)).unwrap();

        let devices: Vec<_> = settings.devices.values().map(|d| d.to_string()).collect();
        assert_eq!(devices, vec!["2930000001 (Basement)", "2930000002 (Bedroom)"]);
        assert_eq!(settings.output_dir, PathBuf::from("/var/lib/waveplus"));
        assert!(settings.logging.logfile.enabled);
        assert_eq!(settings.poll.scan.max_rounds, 20);
        assert_eq!(settings.poll.scan.window, Duration::from_millis(250));
        assert_eq!(settings.poll.timeout, Duration::from_secs(15));
        assert_eq!(
            settings.poll.retry,
            RetryPolicy {
                max_attempts: 3,
                backoff: Backoff::Exponential {
                    initial: Duration::from_secs(2),
                    max: Duration::from_secs(10),
                },
            }
        );
        assert_eq!(settings.radon_order, RadonOrder::LongTermFirst);
    }

    #[test]
    fn command_line_overrides_config_file() {
        let config = config(
            r#"{"devices": [{"serial": 1}], "output": {"path": "from-config"}, "radon_order": "long-term-first"}"#,
        );

        let settings = Settings::resolve(
            &args(&[
                "-d",
                "7",
                "-o",
                "from-cli",
                "--radon-order",
                "short-term-first",
                "--attempts",
                "2",
                "--retry-delay-secs",
                "1",
                "--timeout-secs",
                "9",
            ]),
            Some(config),
        )
        .unwrap();

        assert_eq!(settings.devices.keys().copied().collect::<Vec<_>>(), vec![7]);
        assert_eq!(settings.output_dir, PathBuf::from("from-cli"));
        assert_eq!(settings.radon_order, RadonOrder::ShortTermFirst);
        assert_eq!(settings.poll.retry.max_attempts, 2);
        assert_eq!(
            settings.poll.retry.backoff,
            Backoff::Fixed(Duration::from_secs(1))
        );
        assert_eq!(settings.poll.timeout, Duration::from_secs(9));
    }

    #[test]
    fn invalid_serial_string_is_rejected() {
        let err = serde_json::from_str::<Config>(r#"{"devices": [{"serial": "abc"}]}"#).unwrap_err();

        assert!(err.to_string().contains("invalid serial number"));
    }

    #[test]
    fn zero_attempts_is_rejected() {
        let err = Settings::resolve(&args(&["-d", "1", "--attempts", "0"]), None).unwrap_err();

        assert!(err.to_string().contains("at least 1"));
    }

    #[test]
    fn zero_scan_rounds_is_rejected() {
        let config = config(r#"{"devices": [{"serial": 1}], "scan": {"rounds": 0}}"#);

        let err = Settings::resolve(&args(&[]), Some(config)).unwrap_err();

        assert_eq!(err.to_string(), "scan rounds must be at least 1");
    }
}
