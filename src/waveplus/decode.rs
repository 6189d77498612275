use crate::error::DecodeError;
use crate::waveplus::{Radon, RawTelemetryRecord, SensorReading};

pub const SUPPORTED_FORMAT_VERSION: u8 = 1;

/// Which of the first two words of the record carries the short-term radon average.
///
/// Published readers for this device disagree on the order; pick the one confirmed against real hardware.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RadonOrder {
    #[default]
    ShortTermFirst,
    LongTermFirst,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TelemetryDecoder {
    radon_order: RadonOrder,
}

impl TelemetryDecoder {
    pub fn new(radon_order: RadonOrder) -> Self {
        Self { radon_order }
    }

    pub fn decode(&self, record: &RawTelemetryRecord) -> Result<SensorReading, DecodeError> {
        let version = record.version();
        if version != SUPPORTED_FORMAT_VERSION {
            return Err(DecodeError::UnsupportedFormatVersion {
                version,
                raw: *record.as_bytes(),
            });
        }

        let (short_term_raw, long_term_raw) = match self.radon_order {
            RadonOrder::ShortTermFirst => (record.word(0), record.word(1)),
            RadonOrder::LongTermFirst => (record.word(1), record.word(0)),
        };

        Ok(SensorReading {
            config_version: version,
            reserved: [record.byte(2), record.byte(3)],
            humidity_percent: record.byte(1) as f64 / 2.0,
            temperature_celsius: record.word(2) as f64 / 100.0,
            pressure_hpa: record.word(3) as f64 / 50.0,
            radon_short_term: Radon::from_raw(short_term_raw),
            radon_long_term: Radon::from_raw(long_term_raw),
            co2_ppm: record.word(4) as f64,
            voc_ppb: record.word(5) as f64,
        })
    }
}

/// Decodes with the default radon order.
pub fn decode_telemetry(record: &RawTelemetryRecord) -> Result<SensorReading, DecodeError> {
    TelemetryDecoder::default().decode(record)
}
