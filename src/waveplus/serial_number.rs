// Airthings' Bluetooth SIG company identifier, sent little-endian at the start of manufacturer data.
pub const AIRTHINGS_MANUFACTURER_DATA_COMPANY_ID: u16 = 0x0334;

const SERIAL_NUMBER_OFFSET: usize = 2;
const SERIAL_NUMBER_LEN: usize = 4;

/// Extracts the serial number from a raw manufacturer data payload
/// (`[id_lo, id_hi, sn0, sn1, sn2, sn3, ...]`).
///
/// Returns `None` for payloads from other vendors or ones too short to carry a serial number.
pub fn parse_serial_number(manufacturer_data: &[u8]) -> Option<u32> {
    let (company_id, rest) = manufacturer_data.split_first_chunk::<SERIAL_NUMBER_OFFSET>()?;
    if u16::from_le_bytes(*company_id) != AIRTHINGS_MANUFACTURER_DATA_COMPANY_ID {
        return None;
    }

    let (serial_number, _) = rest.split_first_chunk::<SERIAL_NUMBER_LEN>()?;
    Some(u32::from_le_bytes(*serial_number))
}
