use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use chrono::{Local, NaiveDateTime, Utc};
use chrono_tz::Tz;
use waveplus_reader::{
    document::{ReadingDocument, to_json_pretty},
    waveplus::SensorReading,
};

pub fn now(timezone: Option<Tz>) -> NaiveDateTime {
    match timezone {
        Some(tz) => Utc::now().with_timezone(&tz).naive_local(),
        None => Local::now().naive_local(),
    }
}

pub fn data_file_name(serial_number: u32, taken_at: NaiveDateTime) -> String {
    format!(
        "WavePlusPlus-{serial_number}-{}.json",
        taken_at.format("%Y-%m-%d-%H-%M-%S")
    )
}

/// One-line overview of a reading for the log.
pub fn summary(reading: &SensorReading) -> String {
    format!(
        "{:.1} C, {:.1} %rH, {:.2} hPa, CO2 {} ppm, VOC {} ppb, radon {}/{} Bq/m3 (short/long)",
        reading.temperature_celsius,
        reading.humidity_percent,
        reading.pressure_hpa,
        reading.co2_ppm,
        reading.voc_ppb,
        reading.radon_short_term,
        reading.radon_long_term,
    )
}

pub fn ensure_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        log::info!("creating output directory: {}", dir.display());
    }

    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory: {}", dir.display()))
}

pub fn write_reading(
    dir: &Path,
    serial_number: u32,
    taken_at: NaiveDateTime,
    reading: &SensorReading,
) -> Result<PathBuf> {
    let path = dir.join(data_file_name(serial_number, taken_at));

    let json = to_json_pretty(&ReadingDocument::from(reading))
        .context("failed to serialize sensor reading")?;

    fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use waveplus_reader::waveplus::Radon;

    use super::*;

    fn taken_at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(7, 5, 30)
            .unwrap()
    }

    #[test]
    fn data_file_name_embeds_serial_and_time() {
        assert_eq!(
            data_file_name(2930012345, taken_at()),
            "WavePlusPlus-2930012345-2024-03-09-07-05-30.json"
        );
    }

    fn reading() -> SensorReading {
        SensorReading {
            config_version: 1,
            reserved: [0, 0],
            humidity_percent: 41.5,
            temperature_celsius: 21.3,
            pressure_hpa: 1001.2,
            radon_short_term: Radon::Unavailable,
            radon_long_term: Radon::Level(31),
            co2_ppm: 612.0,
            voc_ppb: 87.0,
        }
    }

    #[test]
    fn summary_shows_unavailable_radon() {
        assert_eq!(
            summary(&reading()),
            "21.3 C, 41.5 %rH, 1001.20 hPa, CO2 612 ppm, VOC 87 ppb, radon N/A/31 Bq/m3 (short/long)"
        );
    }

    #[test]
    fn writes_reading_document() {
        let dir = std::env::temp_dir().join(format!("waveplus-output-{}", std::process::id()));
        ensure_dir(&dir).unwrap();

        let path = write_reading(&dir, 42, taken_at(), &reading()).unwrap();
        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();

        assert_eq!(path.file_name().unwrap(), "WavePlusPlus-42-2024-03-09-07-05-30.json");
        assert_eq!(written["particle"]["radon_st"]["value"], "N/A");
        assert_eq!(written["atmospheric"]["humidity"]["value"], 41.5);

        fs::remove_dir_all(&dir).unwrap();
    }
}
