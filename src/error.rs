use std::time::Duration;

use macaddr::MacAddr6;
use thiserror::Error;
use uuid::Uuid;

use crate::waveplus::RECORD_LEN;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unsupported telemetry format version {version} (raw: {raw:02x?})")]
    UnsupportedFormatVersion { version: u8, raw: [u8; RECORD_LEN] },

    #[error("malformed telemetry payload: expected 20 bytes, got {len}")]
    MalformedPayload { len: usize },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to get a bluetooth adapter")]
    AdapterUnavailable,

    #[error("device with serial number {serial_number} not found after {rounds} scan rounds")]
    DeviceNotFound { serial_number: u32, rounds: u32 },

    #[error("device is not connected")]
    NotConnected,

    #[error("session is already connected to {address}")]
    AlreadyConnected { address: MacAddr6 },

    #[error("failed to connect to {address}")]
    ConnectionFailed {
        address: MacAddr6,
        #[source]
        source: btleplug::Error,
    },

    #[error("the characteristic for UUID {0} was not found")]
    CharacteristicNotFound(Uuid),

    #[error("failed to scan for devices")]
    Scan(#[source] btleplug::Error),

    #[error("failed to read telemetry characteristic")]
    Read(#[source] btleplug::Error),

    #[error("poll timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl Error {
    /// Whether repeating the whole locate/connect/read pass could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::DeviceNotFound { .. }
            | Error::ConnectionFailed { .. }
            | Error::CharacteristicNotFound(_)
            | Error::Scan(_)
            | Error::Read(_)
            | Error::Timeout(_)
            | Error::Decode(DecodeError::MalformedPayload { .. }) => true,
            Error::AdapterUnavailable
            | Error::NotConnected
            | Error::AlreadyConnected { .. }
            | Error::Decode(DecodeError::UnsupportedFormatVersion { .. }) => false,
        }
    }

    /// Whether the cached device address should be dropped before the next attempt.
    pub fn invalidates_address(&self) -> bool {
        matches!(
            self,
            Error::DeviceNotFound { .. } | Error::ConnectionFailed { .. } | Error::Timeout(_)
        )
    }
}
