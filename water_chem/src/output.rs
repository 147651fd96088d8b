//! Report presentation.
//!
//! Three renderings of an assembled `WaterReport`: the plain text summary,
//! a JSON record, and an InfluxDB line-protocol point. Derived values that
//! cannot be computed print as "unavailable" (text), `null` (JSON), or are
//! left out (line protocol). None of these renderers compute on a missing
//! input.

use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt::Write as _;

use crate::extract::ExtractionState;
use crate::model::{Derived, Field, WaterReport};
use crate::resolver::MonthlyExtraction;

pub const MEASUREMENT: &str = "water_quality";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    /// InfluxDB line protocol
    Line,
}

/// Order the text summary lists values in.
enum Entry {
    Raw(Field),
    Derived(Derived),
}

const TEXT_ORDER: [Entry; 8] = [
    Entry::Raw(Field::Ph),
    Entry::Derived(Derived::Calcium),
    Entry::Derived(Derived::Magnesium),
    Entry::Raw(Field::Sulphate),
    Entry::Raw(Field::Chloride),
    Entry::Raw(Field::Sodium),
    Entry::Derived(Derived::Bicarbonate),
    Entry::Raw(Field::Alkalinity),
];

// ---------------------------------------------------------------------------
// Text
// ---------------------------------------------------------------------------

pub fn render_text(report: &WaterReport) -> String {
    let mut out = String::new();
    if let Some(date) = &report.daily_date {
        let _ = writeln!(out, "Daily data date: {}", date);
    }
    if let Some(period) = &report.monthly_period {
        let _ = writeln!(out, "Monthly data date: {}-{}", period.month_name(), period.year);
    }
    for entry in &TEXT_ORDER {
        let (name, value) = match entry {
            Entry::Raw(field) => (
                field.display_name(),
                report.get(*field).map(|v| v.to_string()),
            ),
            Entry::Derived(derived) => (
                derived.display_name(),
                report.derived(*derived).ok().map(|v| v.to_string()),
            ),
        };
        let _ = writeln!(out, "{}: {}", name, value.as_deref().unwrap_or("unavailable"));
    }
    out
}

/// The `--full` table: every monthly parameter with its unit, average and
/// the report line it was read from.
pub fn render_monthly_table(monthly: &MonthlyExtraction) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Monthly report {}", monthly.period);
    for outcome in &monthly.result.outcomes {
        let value = match &outcome.state {
            ExtractionState::Extracted { value, .. } => value.to_string(),
            ExtractionState::Matched { .. } => "no value".to_string(),
            ExtractionState::Seeking => "not found".to_string(),
        };
        let _ = write!(
            out,
            "{:<30}{:<12}{:>10}",
            outcome.spec.name, outcome.spec.unit, value
        );
        if let Some(line) = outcome.state.source_line() {
            let _ = write!(out, "    | {}", line.trim());
        }
        out.push('\n');
    }
    out
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct ReportRecord {
    pub zone: String,
    pub daily_date: Option<String>,
    pub monthly_period: Option<String>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub ph: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub alkalinity: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub total_hardness: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub calcium_hardness: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub sulphate: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub chloride: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub sodium: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub calcium: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub magnesium: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub bicarbonate: Option<Decimal>,
}

impl From<&WaterReport> for ReportRecord {
    fn from(report: &WaterReport) -> Self {
        Self {
            zone: report.zone.clone(),
            daily_date: report.daily_date.clone(),
            monthly_period: report.monthly_period.map(|p| p.to_string()),
            ph: report.ph,
            alkalinity: report.alkalinity,
            total_hardness: report.total_hardness,
            calcium_hardness: report.calcium_hardness,
            sulphate: report.sulphate,
            chloride: report.chloride,
            sodium: report.sodium,
            calcium: report.calcium().ok(),
            magnesium: report.magnesium().ok(),
            bicarbonate: report.bicarbonate().ok(),
        }
    }
}

pub fn render_json(report: &WaterReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&ReportRecord::from(report))
}

// ---------------------------------------------------------------------------
// Line protocol
// ---------------------------------------------------------------------------

/// One line-protocol point tagged with the zone. Returns `None` when the
/// report has no values at all, since a point needs at least one field.
pub fn render_line_protocol(report: &WaterReport, timestamp_ns: Option<i64>) -> Option<String> {
    let mut fields: Vec<String> = Field::ALL
        .into_iter()
        .filter_map(|f| report.get(f).map(|v| format!("{}={}", f.key(), v)))
        .collect();
    fields.extend(
        Derived::ALL
            .into_iter()
            .filter_map(|d| report.derived(d).ok().map(|v| format!("{}={}", d.key(), v))),
    );
    if fields.is_empty() {
        return None;
    }

    let mut line = format!("{},zone={} {}", MEASUREMENT, escape_tag(&report.zone), fields.join(","));
    if let Some(ts) = timestamp_ns {
        let _ = write!(line, " {}", ts);
    }
    Some(line)
}

fn escape_tag(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace(',', "\\,")
        .replace('=', "\\=")
        .replace(' ', "\\ ")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
