use std::fmt;

pub const RADON_MAX_BQ_M3: u16 = 16383;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Radon {
    Level(u16),
    /// The device reported a value outside 0..=16383 (no valid measurement yet, or a bad read).
    Unavailable,
}

impl Radon {
    pub fn from_raw(v: u16) -> Self {
        if v <= RADON_MAX_BQ_M3 {
            Radon::Level(v)
        } else {
            Radon::Unavailable
        }
    }
}

impl fmt::Display for Radon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Radon::Level(v) => write!(f, "{v}"),
            Radon::Unavailable => f.write_str("N/A"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    RelativeHumidity,
    Celsius,
    Hectopascal,
    BecquerelPerCubicMetre,
    PartsPerMillion,
    PartsPerBillion,
}

impl Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::RelativeHumidity => "%rH",
            Unit::Celsius => "C",
            Unit::Hectopascal => "hPa",
            Unit::BecquerelPerCubicMetre => "Bq/m3",
            Unit::PartsPerMillion => "ppm",
            Unit::PartsPerBillion => "ppb",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SensorReading {
    pub config_version: u8,

    /// Bytes 2 and 3 of the record; meaning unknown, kept for diagnostics.
    pub reserved: [u8; 2],

    pub humidity_percent: f64,

    pub temperature_celsius: f64,

    pub pressure_hpa: f64,

    pub radon_short_term: Radon,

    pub radon_long_term: Radon,

    pub co2_ppm: f64,

    pub voc_ppb: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radon_range_boundaries() {
        assert_eq!(Radon::from_raw(0), Radon::Level(0));
        assert_eq!(Radon::from_raw(16383), Radon::Level(16383));
        assert_eq!(Radon::from_raw(16384), Radon::Unavailable);
        assert_eq!(Radon::from_raw(u16::MAX), Radon::Unavailable);
    }

    #[test]
    fn radon_displays_level_or_placeholder() {
        assert_eq!(Radon::Unavailable.to_string(), "N/A");
        assert_eq!(Radon::Level(42).to_string(), "42");
    }
}
