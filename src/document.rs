//! The JSON document written for each successful poll.
//!
//! Field names and nesting are what downstream tooling already parses, so they are kept as-is:
//!
//! ```json
//! {
//!     "config": { "version": 1, "tbd1": 0, "tbd2": 0 },
//!     "atmospheric": {
//!         "humidity": { "value": 50.0, "unit": "%rH" },
//!         "temperature": { "value": 24.56, "unit": "C" },
//!         "pressure": { "value": 98.08, "unit": "hPa" }
//!     },
//!     "particle": {
//!         "radon_lt": { "value": 5, "unit": "Bq/m3" },
//!         "radon_st": { "value": 10, "unit": "Bq/m3" },
//!         "co2": { "value": 400.0, "unit": "ppm" },
//!         "voc": { "value": 1.0, "unit": "ppb" }
//!     }
//! }
//! ```

use serde::{Serialize, Serializer};

use crate::waveplus::{Radon, SensorReading, Unit};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadingDocument {
    pub config: ConfigSection,
    pub atmospheric: AtmosphericSection,
    pub particle: ParticleSection,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigSection {
    pub version: u8,
    pub tbd1: u8,
    pub tbd2: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AtmosphericSection {
    pub humidity: Quantity<f64>,
    pub temperature: Quantity<f64>,
    pub pressure: Quantity<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticleSection {
    pub radon_lt: Quantity<Radon>,
    pub radon_st: Quantity<Radon>,
    pub co2: Quantity<f64>,
    pub voc: Quantity<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quantity<T> {
    pub value: T,
    #[serde(serialize_with = "serialize_unit")]
    pub unit: Unit,
}

impl<T> Quantity<T> {
    fn new(value: T, unit: Unit) -> Self {
        Self { value, unit }
    }
}

impl Serialize for Radon {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Radon::Level(v) => serializer.serialize_u16(*v),
            Radon::Unavailable => serializer.serialize_str("N/A"),
        }
    }
}

fn serialize_unit<S: Serializer>(unit: &Unit, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(unit.as_str())
}

impl From<&SensorReading> for ReadingDocument {
    fn from(reading: &SensorReading) -> Self {
        Self {
            config: ConfigSection {
                version: reading.config_version,
                tbd1: reading.reserved[0],
                tbd2: reading.reserved[1],
            },
            atmospheric: AtmosphericSection {
                humidity: Quantity::new(reading.humidity_percent, Unit::RelativeHumidity),
                temperature: Quantity::new(reading.temperature_celsius, Unit::Celsius),
                pressure: Quantity::new(reading.pressure_hpa, Unit::Hectopascal),
            },
            particle: ParticleSection {
                radon_lt: Quantity::new(reading.radon_long_term, Unit::BecquerelPerCubicMetre),
                radon_st: Quantity::new(reading.radon_short_term, Unit::BecquerelPerCubicMetre),
                co2: Quantity::new(reading.co2_ppm, Unit::PartsPerMillion),
                voc: Quantity::new(reading.voc_ppb, Unit::PartsPerBillion),
            },
        }
    }
}

/// Pretty-prints with four-space indentation, keys in declaration order.
pub fn to_json_pretty(document: &ReadingDocument) -> serde_json::Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    document.serialize(&mut serializer)?;

    // serde_json only ever emits valid UTF-8.
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
