//! Subscriber setup plus ndjson audit lines for assessments.

use crate::risk::RiskAssessment;
use serde::Serialize;
use std::io::Write;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Compact, flat record of one assessment for downstream audit.
#[derive(Serialize)]
pub struct AuditLine<'a> {
    pub ts: String,
    pub artifact_id: String,
    pub region: &'a str,
    pub label: &'a str,
    pub model_label: &'a str,
    pub score: f64,
    pub severity_index: f64,
    pub rule_override: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<&'a str>,
}

impl<'a> AuditLine<'a> {
    pub fn from_assessment(a: &'a RiskAssessment) -> Self {
        Self {
            ts: chrono::Utc::now().to_rfc3339(),
            artifact_id: a.artifact_id.to_string(),
            region: a.observation.region.as_str(),
            label: a.label.as_str(),
            model_label: a.model_label.as_str(),
            score: a.score,
            severity_index: a.severity_index,
            rule_override: a.rule_override,
            rules: a.fired_rules(),
        }
    }
}

pub struct StructuredLogger;

impl StructuredLogger {
    /// Install the global subscriber on stderr (stdout carries command output).
    /// `RUST_LOG` overrides `default_level`.
    pub fn init(json: bool, default_level: &str) {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
        if json {
            let fmt = tracing_subscriber::fmt::layer()
                .json()
                .with_span_events(FmtSpan::NONE)
                .with_writer(std::io::stderr);
            let _ = tracing_subscriber::registry().with(filter).with(fmt).try_init();
        } else {
            let _ = tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .try_init();
        }
    }

    /// Write one ndjson line without going through tracing.
    pub fn emit_json(event: &impl Serialize, w: &mut impl Write) {
        if let Ok(line) = serde_json::to_string(event) {
            let _ = writeln!(w, "{}", line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ObservationInput;
    use crate::model::humidity_fixture;
    use crate::risk::assess;

    #[test]
    fn audit_line_is_one_json_object() {
        let artifact = humidity_fixture();
        let input = ObservationInput {
            region: "East".into(),
            rainfall_mm: Some(5.0),
            temperature_c: Some(25.0),
            humidity_pct: Some(10.0),
            wind_speed_kmh: Some(100.0),
            soil_moisture_pct: None,
        };
        let a = assess(&input, &artifact).unwrap();
        let mut out = Vec::new();
        StructuredLogger::emit_json(&AuditLine::from_assessment(&a), &mut out);
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 1);
        let v: serde_json::Value = serde_json::from_str(text.trim()).unwrap();
        assert_eq!(v["label"], "High");
        assert_eq!(v["model_label"], "Low");
        assert_eq!(v["rules"][0], "gale-force-wind");
        assert_eq!(v["region"], "East");
    }
}
