//! CSV codec for labeled datasets.

use super::write_atomic;
use crate::data::{Dataset, Field, Label, ObservationInput, Record};
use crate::error::{Result, RiskError};
use std::fmt::Write as _;
use std::path::Path;
use tracing::info;

pub const CSV_HEADER: &str =
    "region,rainfall_mm,temperature_c,humidity_pct,wind_speed_kmh,soil_moisture_pct,label";

const COLUMNS: usize = 7;

/// Write the whole dataset or nothing.
pub fn write_dataset(path: &Path, dataset: &Dataset) -> Result<()> {
    let mut out = String::with_capacity(64 * (dataset.len() + 1));
    out.push_str(CSV_HEADER);
    out.push('\n');
    for r in dataset.records() {
        let o = &r.observation;
        let _ = writeln!(
            out,
            "{},{},{},{},{},{},{}",
            o.region,
            o.rainfall_mm,
            o.temperature_c,
            o.humidity_pct,
            optional(o.wind_speed_kmh),
            optional(o.soil_moisture_pct),
            r.label
        );
    }
    write_atomic(path, out.as_bytes())?;
    info!(path = %path.display(), rows = dataset.len(), "dataset written");
    Ok(())
}

fn optional(v: Option<f64>) -> String {
    v.map(|v| v.to_string()).unwrap_or_default()
}

/// Load a dataset. Out-of-range values are clamped like any other input;
/// a single malformed row rejects the whole file.
pub fn read_dataset(path: &Path) -> Result<Dataset> {
    let text = std::fs::read_to_string(path)?;
    let mut lines = text.lines().enumerate();

    match lines.next() {
        Some((_, header)) if header.trim() == CSV_HEADER => {}
        Some((_, header)) => {
            return Err(RiskError::DatasetFormat {
                line: 1,
                reason: format!("unexpected header `{}`", header.trim()),
            })
        }
        None => {
            return Err(RiskError::DatasetFormat {
                line: 1,
                reason: "file is empty".into(),
            })
        }
    }

    let mut records = Vec::new();
    for (i, line) in lines {
        if line.trim().is_empty() {
            continue;
        }
        let record = parse_row(line).map_err(|reason| RiskError::DatasetFormat {
            line: i + 1,
            reason,
        })?;
        records.push(record);
    }
    Ok(Dataset::new(records))
}

fn parse_row(line: &str) -> std::result::Result<Record, String> {
    let cols: Vec<&str> = line.split(',').map(str::trim).collect();
    if cols.len() != COLUMNS {
        return Err(format!("expected {COLUMNS} columns, found {}", cols.len()));
    }
    let number = |idx: usize, field: Field| -> std::result::Result<Option<f64>, String> {
        let raw = cols[idx];
        if raw.is_empty() {
            return Ok(None);
        }
        raw.parse::<f64>()
            .map(Some)
            .map_err(|_| format!("`{raw}` is not a number for {field}"))
    };
    let input = ObservationInput {
        region: cols[0].to_string(),
        rainfall_mm: number(1, Field::RainfallMm)?,
        temperature_c: number(2, Field::TemperatureC)?,
        humidity_pct: number(3, Field::HumidityPct)?,
        wind_speed_kmh: number(4, Field::WindSpeedKmh)?,
        soil_moisture_pct: number(5, Field::SoilMoisturePct)?,
    };
    let (observation, _) = input.validate().map_err(|e| e.to_string())?;
    let label: Label = cols[6].parse().map_err(|e: RiskError| e.to_string())?;
    Ok(Record { observation, label })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{anchor_observation, Region};

    fn sample() -> Dataset {
        let mut sparse = anchor_observation(Label::Moderate);
        sparse.wind_speed_kmh = None;
        sparse.region = Region::Northeast;
        Dataset::new(vec![
            Record {
                observation: anchor_observation(Label::Low),
                label: Label::Low,
            },
            Record {
                observation: sparse,
                label: Label::Moderate,
            },
        ])
    }

    #[test]
    fn round_trip_preserves_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        let ds = sample();
        write_dataset(&path, &ds).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with(CSV_HEADER));
        assert!(text.contains("Northeast,200,28,70,,50,Moderate"));
        assert_eq!(read_dataset(&path).unwrap(), ds);
    }

    #[test]
    fn bad_row_fails_whole_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        let body = format!(
            "{CSV_HEADER}\nNorth,10,20,30,5,15,Low\nNorth,ten,20,30,5,15,Low\n"
        );
        std::fs::write(&path, body).unwrap();
        match read_dataset(&path) {
            Err(RiskError::DatasetFormat { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected DatasetFormat, got {other:?}"),
        }
    }

    #[test]
    fn unknown_label_and_short_rows_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        std::fs::write(&path, format!("{CSV_HEADER}\nNorth,10,20,30,5,15,Severe\n")).unwrap();
        assert!(matches!(read_dataset(&path), Err(RiskError::DatasetFormat { line: 2, .. })));
        std::fs::write(&path, format!("{CSV_HEADER}\nNorth,10,20\n")).unwrap();
        assert!(matches!(read_dataset(&path), Err(RiskError::DatasetFormat { line: 2, .. })));
        std::fs::write(&path, "a,b,c\n").unwrap();
        assert!(matches!(read_dataset(&path), Err(RiskError::DatasetFormat { line: 1, .. })));
    }

    #[test]
    fn out_of_range_values_are_clamped_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        std::fs::write(&path, format!("{CSV_HEADER}\nSouth,-4,30,130,,,High\n")).unwrap();
        let ds = read_dataset(&path).unwrap();
        let o = &ds.records()[0].observation;
        assert_eq!(o.rainfall_mm, 0.0);
        assert_eq!(o.humidity_pct, 100.0);
        assert_eq!(o.soil_moisture_pct, None);
    }
}
