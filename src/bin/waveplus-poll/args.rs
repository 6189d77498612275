use std::path::PathBuf;

use chrono_tz::Tz;
use clap::Parser;

use crate::config::RadonOrderSetting;

#[derive(Debug, Parser)]
#[command(about = "Reads Airthings Wave Plus monitors over Bluetooth LE and writes each reading as JSON")]
pub struct Args {
    /// JSON configuration file; optional when serial numbers are given.
    #[arg(long, short, default_value = "config.json")]
    pub config: PathBuf,

    /// Serial numbers to poll, comma separated. Overrides the devices of the config file.
    #[arg(long, short, env = "WAVEPLUS_DEVICE_SERIAL", value_delimiter = ',')]
    pub device_serial: Vec<u32>,

    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Timezone for output file timestamps; local time when unset.
    #[arg(long, env = "WAVEPLUS_TIMEZONE")]
    pub timezone: Option<Tz>,

    #[arg(long, value_enum)]
    pub radon_order: Option<RadonOrderSetting>,

    #[arg(long)]
    pub attempts: Option<u32>,

    #[arg(long)]
    pub retry_delay_secs: Option<u64>,

    #[arg(long)]
    pub timeout_secs: Option<u64>,
}
