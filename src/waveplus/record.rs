use uuid::{Uuid, uuid};

use crate::error::DecodeError;

// Current values characteristic of the Wave Plus.
pub const TELEMETRY_CHARACTERISTIC_UUID: Uuid = uuid!("b42e2a68-ade7-11e4-89d3-123b93f75cba");

pub const RECORD_LEN: usize = 20;

/// The raw current values characteristic, exactly as read from the device.
///
/// Layout (multi-byte fields little-endian):
/// - Byte 0: format version
/// - Byte 1: humidity (0.5 %rH resolution)
/// - Bytes 2-3: unidentified, passed through
/// - Bytes 4-7: radon short-term and long-term averages, order set by [`RadonOrder`](super::RadonOrder)
/// - Bytes 8-9: temperature (0.01 C resolution)
/// - Bytes 10-11: pressure (0.02 hPa resolution)
/// - Bytes 12-13: CO2 (ppm)
/// - Bytes 14-15: VOC (ppb)
/// - Bytes 16-19: unidentified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawTelemetryRecord([u8; RECORD_LEN]);

impl RawTelemetryRecord {
    pub fn new(bytes: [u8; RECORD_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; RECORD_LEN] {
        &self.0
    }

    pub fn version(&self) -> u8 {
        self.0[0]
    }

    pub(crate) fn byte(&self, offset: usize) -> u8 {
        self.0[offset]
    }

    /// The `index`-th little-endian word following the four leading bytes.
    pub(crate) fn word(&self, index: usize) -> u16 {
        let offset = 4 + index * 2;
        u16::from_le_bytes([self.0[offset], self.0[offset + 1]])
    }
}

impl TryFrom<&[u8]> for RawTelemetryRecord {
    type Error = DecodeError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; RECORD_LEN] = value
            .try_into()
            .map_err(|_| DecodeError::MalformedPayload { len: value.len() })?;

        Ok(Self(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_payloads_that_are_not_twenty_bytes() {
        assert_eq!(
            RawTelemetryRecord::try_from(&[1u8; 19][..]),
            Err(DecodeError::MalformedPayload { len: 19 })
        );
        assert_eq!(
            RawTelemetryRecord::try_from(&[1u8; 21][..]),
            Err(DecodeError::MalformedPayload { len: 21 })
        );
        assert_eq!(
            RawTelemetryRecord::try_from(&[0u8; 0][..]),
            Err(DecodeError::MalformedPayload { len: 0 })
        );
    }

    #[test]
    fn words_are_little_endian_after_the_header() {
        let mut bytes = [0u8; RECORD_LEN];
        bytes[4] = 0x0a;
        bytes[8] = 0x98;
        bytes[9] = 0x09;
        bytes[18] = 0xff;
        bytes[19] = 0x01;

        let record = RawTelemetryRecord::new(bytes);
        assert_eq!(record.word(0), 10);
        assert_eq!(record.word(2), 2456);
        assert_eq!(record.word(7), 0x01ff);
    }
}
