//! Integration test: generate, persist, train, publish, load, assess and simulate.

use disaster_risk::{
    config::{GeneratorConfig, RiskConfig, TrainerConfig},
    data::{Dataset, DatasetGenerator, Field, Label, ObservationInput, Record},
    model::{train_and_publish, ArtifactHandle, ModelArtifact, Trainer},
    risk::{assess, RiskMatrix},
    simulate::{grid, sweep, Simulator, ValueRange},
    storage::{read_dataset, write_dataset, ArtifactStore},
    RiskError,
};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

fn generated(rows: usize, seed: u64) -> Dataset {
    DatasetGenerator::new(GeneratorConfig { rows, seed }).generate()
}

/// One default-config model shared by the read-only tests.
fn trained() -> &'static ModelArtifact {
    static ARTIFACT: OnceLock<ModelArtifact> = OnceLock::new();
    ARTIFACT.get_or_init(|| {
        Trainer::new(TrainerConfig::default())
            .train(&generated(1200, 42))
            .unwrap()
            .artifact
    })
}

fn south_monsoon() -> ObservationInput {
    ObservationInput {
        region: "South".into(),
        rainfall_mm: Some(250.0),
        temperature_c: Some(30.0),
        humidity_pct: Some(85.0),
        wind_speed_kmh: None,
        soil_moisture_pct: None,
    }
}

#[test]
fn config_load_default() {
    let c = RiskConfig::load(Path::new("nonexistent.json")).unwrap();
    assert_eq!(c.generator.rows, 3000);
    assert_eq!(c.trainer.test_ratio, 0.2);
    assert_eq!(c.matrix, RiskMatrix::standard());
}

#[test]
fn generated_dataset_covers_every_label_and_is_reproducible() {
    let a = generated(1000, 7);
    assert_eq!(a.len(), 1000);
    assert_eq!(a.distinct_labels().len(), Label::ALL.len());
    assert_eq!(a, generated(1000, 7));
    assert_ne!(a, generated(1000, 8));
}

#[test]
fn dataset_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data").join("disaster_data.csv");
    let ds = generated(200, 3);
    write_dataset(&path, &ds).unwrap();
    assert_eq!(read_dataset(&path).unwrap(), ds);
}

#[test]
fn malformed_dataset_fails_whole_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("d.csv");
    write_dataset(&path, &generated(20, 3)).unwrap();
    let mut text = std::fs::read_to_string(&path).unwrap();
    text.push_str("Atlantis,1,2,3,4,5,Low\n");
    std::fs::write(&path, text).unwrap();
    match read_dataset(&path) {
        Err(RiskError::DatasetFormat { line, .. }) => assert_eq!(line, 22),
        other => panic!("expected DatasetFormat, got {other:?}"),
    }
}

#[test]
fn heavy_monsoon_rain_in_the_south_is_at_least_high() {
    let a = assess(&south_monsoon(), trained()).unwrap();
    assert!(a.label >= Label::High, "got {:?}", a.label);
    assert!(a.fired_rules().contains(&"heavy-rain-humid"));
    assert!((0.0..=1.0).contains(&a.score));
    assert!((0.0..=1.0).contains(&a.severity_index));
    assert_eq!(a.artifact_id, trained().id);
}

#[test]
fn assessment_is_deterministic() {
    let a = assess(&south_monsoon(), trained()).unwrap();
    let b = assess(&south_monsoon(), trained()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn final_label_never_below_model_or_fired_floors() {
    let matrix = RiskMatrix::standard();
    for record in generated(300, 11).records() {
        let o = &record.observation;
        let input = ObservationInput {
            region: o.region.to_string(),
            rainfall_mm: Some(o.rainfall_mm),
            temperature_c: Some(o.temperature_c),
            humidity_pct: Some(o.humidity_pct),
            wind_speed_kmh: o.wind_speed_kmh,
            soil_moisture_pct: o.soil_moisture_pct,
        };
        let a = assess(&input, trained()).unwrap();
        assert!(a.label >= a.model_label);
        if let Some(floor) = matrix.floor(o) {
            assert!(a.label >= floor);
        }
        assert_eq!(a.rule_override, a.label != a.model_label);
    }
}

#[test]
fn unknown_fields_and_regions_are_rejected() {
    assert!(matches!("region".parse::<Field>(), Err(RiskError::InvalidInput { .. })));
    assert!(matches!("pressure".parse::<Field>(), Err(RiskError::InvalidInput { .. })));
    let mut input = south_monsoon();
    input.region = "Atlantis".into();
    assert!(matches!(assess(&input, trained()), Err(RiskError::InvalidInput { .. })));
}

#[test]
fn single_label_training_publishes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::open(dir.path()).unwrap();
    let lows: Vec<Record> = generated(500, 5)
        .records()
        .iter()
        .filter(|r| r.label == Label::Low)
        .cloned()
        .collect();
    assert!(!lows.is_empty());
    let trainer = Trainer::new(TrainerConfig::default());
    let err = train_and_publish(&trainer, &Dataset::new(lows), &store).unwrap_err();
    assert!(matches!(err, RiskError::InsufficientData { .. }));
    assert!(store.versions().unwrap().is_empty());
    assert!(matches!(store.load_current(), Err(RiskError::ArtifactLoad { .. })));
}

#[test]
fn publish_load_and_reload_through_the_handle() {
    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::open(dir.path().join("model")).unwrap();
    let trainer = Trainer::new(TrainerConfig::default());
    let ds = generated(400, 21);

    let (first, path) = train_and_publish(&trainer, &ds, &store).unwrap();
    assert_eq!(path, store.path_for(1));
    let loaded = store.load_current().unwrap();
    assert_eq!(loaded, first.artifact);

    let handle = ArtifactHandle::new(loaded);
    let in_flight = handle.current();

    let (second, _) = train_and_publish(&trainer, &ds, &store).unwrap();
    assert_eq!(store.versions().unwrap(), vec![1, 2]);
    handle.reload(&store).unwrap();
    assert_eq!(handle.current().id, second.artifact.id);
    assert_eq!(in_flight.id, first.artifact.id);

    // a failed training run leaves CURRENT where it was
    let single = Dataset::new(ds.records()[..1].to_vec());
    assert!(train_and_publish(&trainer, &single, &store).is_err());
    assert_eq!(store.load_current().unwrap().id, second.artifact.id);
}

#[test]
fn corrupted_artifact_fails_to_load() {
    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::open(dir.path()).unwrap();
    let path = store.publish(trained()).unwrap();

    let mut bytes = std::fs::read(&path).unwrap();
    let last = bytes.len() - 2;
    bytes[last] ^= 0x20;
    std::fs::write(&path, &bytes).unwrap();
    match store.load_current() {
        Err(RiskError::ArtifactLoad { reason, .. }) => assert!(reason.contains("checksum")),
        other => panic!("expected ArtifactLoad, got {other:?}"),
    }

    std::fs::write(&path, b"not an artifact").unwrap();
    assert!(matches!(store.load(&path), Err(RiskError::ArtifactLoad { .. })));
    assert!(matches!(
        store.load(&dir.path().join("missing.json")),
        Err(RiskError::ArtifactLoad { .. })
    ));
}

#[test]
fn sweep_returns_one_point_per_value_in_order() {
    let (base, _) = south_monsoon().validate().unwrap();
    let range = ValueRange::stepped(0.0, 500.0, 50.0).unwrap();
    let report = sweep(&base, Field::RainfallMm, &range, trained()).unwrap();
    assert_eq!(report.points.len(), 11);
    for (point, value) in report.points.iter().zip(range.values()) {
        assert_eq!(point.value, *value);
        assert_eq!(point.assessment.observation.rainfall_mm, *value);
        assert_eq!(point.assessment.observation.humidity_pct, 85.0);
    }
    // extreme rainfall always lands at High or above
    assert!(report.points.last().unwrap().assessment.label >= Label::High);
}

#[test]
fn grid_respects_the_configured_bound() {
    let (base, _) = south_monsoon().validate().unwrap();
    let fields = BTreeMap::from([
        (Field::RainfallMm, ValueRange::linspace(0.0, 400.0, 5).unwrap()),
        (Field::WindSpeedKmh, ValueRange::linspace(0.0, 150.0, 4).unwrap()),
    ]);
    let report = grid(&base, &fields, trained(), 20).unwrap();
    assert_eq!(report.points.len(), 20);
    let storm = report
        .get(&[(Field::RainfallMm, 0.0), (Field::WindSpeedKmh, 150.0)])
        .unwrap();
    assert_eq!(storm.label, Label::Critical);

    let mut config = RiskConfig::default();
    config.simulation.max_grid_points = 19;
    assert!(matches!(
        Simulator::from_config(&config).grid(&base, &fields, trained()),
        Err(RiskError::InvalidInput { .. })
    ));
}
