//! Synthetic labeled observations with seasonal and regional structure.
//!
//! The labeling rule is deterministic in the observation ([`severity_label`]);
//! randomness only enters through the seeded draws of region, season and
//! weather. Equal seeds yield equal datasets.

use super::{Dataset, Field, Label, Observation, Record, Region};
use crate::config::GeneratorConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Season {
    Winter,
    Summer,
    Monsoon,
    PostMonsoon,
}

impl Season {
    const ALL: [Season; 4] = [
        Season::Winter,
        Season::Summer,
        Season::Monsoon,
        Season::PostMonsoon,
    ];
}

/// Cut points on [`severity_score`]: Low < 0.3 <= Moderate < 0.5 <= High < 0.7 <= Critical.
const CUTS: [(f64, Label); 3] = [(0.3, Label::Low), (0.5, Label::Moderate), (0.7, Label::High)];

/// Composite severity in [0, 1] used to label generated rows.
pub fn severity_score(obs: &Observation) -> f64 {
    let wind = obs.wind_speed_kmh.unwrap_or(0.0);
    let soil = obs.soil_moisture_pct.unwrap_or(0.0);

    let mut load = 0.35 * (obs.rainfall_mm / 400.0).min(1.0)
        + 0.10 * obs.humidity_pct / 100.0
        + 0.15 * soil / 100.0
        + 0.25 * (wind / 150.0).min(1.0);
    if obs.temperature_c > 42.0 && obs.rainfall_mm < 10.0 {
        load += 0.15;
    }
    let regional = 0.85 + 0.3 * obs.region.profile().flood_prone;
    (load * regional).clamp(0.0, 1.0)
}

pub fn severity_label(obs: &Observation) -> Label {
    let score = severity_score(obs);
    CUTS.iter()
        .find(|(cut, _)| score < *cut)
        .map_or(Label::Critical, |(_, label)| *label)
}

/// Fixed observation in the Central region that [`severity_label`] maps to `label`.
/// Used to back-fill labels a small draw happened to miss.
pub fn anchor_observation(label: Label) -> Observation {
    let (rainfall_mm, temperature_c, humidity_pct, wind, soil) = match label {
        Label::Low => (5.0, 25.0, 30.0, 5.0, 15.0),
        Label::Moderate => (200.0, 28.0, 70.0, 30.0, 50.0),
        Label::High => (320.0, 27.0, 85.0, 60.0, 75.0),
        Label::Critical => (450.0, 26.0, 95.0, 140.0, 95.0),
    };
    Observation {
        region: Region::Central,
        rainfall_mm,
        temperature_c,
        humidity_pct,
        wind_speed_kmh: Some(wind),
        soil_moisture_pct: Some(soil),
    }
}

pub struct DatasetGenerator {
    config: GeneratorConfig,
}

impl DatasetGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    /// Draw `rows` labeled observations. With at least one row per label,
    /// every label is guaranteed to appear.
    pub fn generate(&self) -> Dataset {
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut records: Vec<Record> = (0..self.config.rows)
            .map(|_| {
                let observation = draw(&mut rng);
                let label = severity_label(&observation);
                Record { observation, label }
            })
            .collect();
        ensure_label_coverage(&mut records);

        let dataset = Dataset::new(records);
        info!(
            rows = dataset.len(),
            seed = self.config.seed,
            labels = ?dataset.label_counts(),
            "dataset generated"
        );
        dataset
    }
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

fn draw(rng: &mut StdRng) -> Observation {
    let region = Region::ALL[rng.gen_range(0..Region::ALL.len())];
    let season = Season::ALL[rng.gen_range(0..Season::ALL.len())];
    let profile = region.profile();

    let mut rainfall = rng.gen_range(0.0..50.0);
    let mut temperature = rng.gen_range(10.0..40.0);
    let mut humidity = rng.gen_range(20.0..80.0);
    let mut soil = rng.gen_range(10.0..80.0);
    let mut wind = rng.gen_range(5.0..20.0);

    let cyclone =
        season == Season::PostMonsoon && profile.cyclone_prone > 0.5 && rng.gen_bool(0.15);

    match season {
        Season::Monsoon => {
            rainfall = if profile.flood_prone > 0.5 {
                rng.gen_range(200.0..800.0)
            } else {
                rng.gen_range(100.0..400.0)
            };
            humidity = rng.gen_range(70.0..100.0);
            soil = rng.gen_range(80.0..100.0);
        }
        Season::Summer => {
            temperature = rng.gen_range(35.0..48.0);
            humidity = rng.gen_range(10.0..40.0);
            soil = rng.gen_range(0.0..20.0);
        }
        Season::PostMonsoon if cyclone => {
            wind = rng.gen_range(80.0..200.0);
            rainfall += 300.0;
        }
        Season::PostMonsoon | Season::Winter => {}
    }

    Observation {
        region,
        rainfall_mm: Field::RainfallMm.clamp(round1(rainfall)),
        temperature_c: round1(temperature),
        humidity_pct: Field::HumidityPct.clamp(round1(humidity)),
        wind_speed_kmh: Some(Field::WindSpeedKmh.clamp(round1(wind))),
        soil_moisture_pct: Some(Field::SoilMoisturePct.clamp(round1(soil))),
    }
}

/// Overwrite rows (from the end, never the last of their label) with anchors
/// for every label the draw missed.
fn ensure_label_coverage(records: &mut [Record]) {
    if records.len() < Label::ALL.len() {
        return;
    }
    let mut counts = [0usize; Label::ALL.len()];
    for r in records.iter() {
        counts[r.label.index()] += 1;
    }
    for label in Label::ALL {
        if counts[label.index()] > 0 {
            continue;
        }
        let Some(idx) = records
            .iter()
            .rposition(|r| counts[r.label.index()] > 1)
        else {
            continue;
        };
        counts[records[idx].label.index()] -= 1;
        counts[label.index()] += 1;
        debug!(row = idx, label = %label, "back-filled missing label");
        records[idx] = Record {
            observation: anchor_observation(label),
            label,
        };
    }
}
