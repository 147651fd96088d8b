/// Core data types for the water chemistry report.
///
/// This module defines the shared domain model imported by all other
/// modules: the raw and derived fields, the assembled `WaterReport`, and
/// the error taxonomy for every stage of assembly. It performs no I/O.

use rust_decimal::{Decimal, RoundingStrategy};
use std::fmt;
use thiserror::Error;

use crate::period::ReportPeriod;

// ---------------------------------------------------------------------------
// Fields
// ---------------------------------------------------------------------------

/// A raw reading carried by a `WaterReport`.
///
/// `Ph` and `Alkalinity` come from the daily snapshot; the rest come from
/// the monthly laboratory summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Ph,
    Alkalinity,
    TotalHardness,
    CalciumHardness,
    Sulphate,
    Chloride,
    Sodium,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::Ph,
        Field::Alkalinity,
        Field::TotalHardness,
        Field::CalciumHardness,
        Field::Sulphate,
        Field::Chloride,
        Field::Sodium,
    ];

    /// Stable snake_case key used in config files and structured output.
    pub fn key(self) -> &'static str {
        match self {
            Field::Ph => "ph",
            Field::Alkalinity => "alkalinity",
            Field::TotalHardness => "total_hardness",
            Field::CalciumHardness => "calcium_hardness",
            Field::Sulphate => "sulphate",
            Field::Chloride => "chloride",
            Field::Sodium => "sodium",
        }
    }

    /// Looks up a field by its config/output key.
    pub fn from_key(key: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|f| f.key() == key)
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Field::Ph => "pH",
            Field::Alkalinity => "Alkalinity (CaCO3)",
            Field::TotalHardness => "Total Hardness",
            Field::CalciumHardness => "Calcium Hardness",
            Field::Sulphate => "Sulphate (SO4)",
            Field::Chloride => "Chloride (Cl)",
            Field::Sodium => "Sodium (Na)",
        }
    }

    /// Unit the value is reported in; pH is dimensionless.
    pub fn unit(self) -> &'static str {
        match self {
            Field::Ph => "",
            Field::Alkalinity | Field::TotalHardness | Field::CalciumHardness => "mg/L CaCO3",
            Field::Sulphate | Field::Chloride | Field::Sodium => "mg/L",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Values computed from raw fields on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Derived {
    Calcium,
    Magnesium,
    Bicarbonate,
}

impl Derived {
    pub const ALL: [Derived; 3] = [Derived::Calcium, Derived::Magnesium, Derived::Bicarbonate];

    pub fn key(self) -> &'static str {
        match self {
            Derived::Calcium => "calcium",
            Derived::Magnesium => "magnesium",
            Derived::Bicarbonate => "bicarbonate",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Derived::Calcium => "Calcium (Ca)",
            Derived::Magnesium => "Magnesium (Mg)",
            Derived::Bicarbonate => "Bicarbonate (HCO3)",
        }
    }
}

impl fmt::Display for Derived {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// The assembled chemistry report for one zone.
///
/// Raw fields are `None` until populated; a missing monthly parameter stays
/// `None` rather than defaulting to zero. Derived values are computed on
/// every read and fail with `DerivedValueUnavailable` if an input is unset.
///
/// `total_hardness >= calcium_hardness` is expected of real data but is not
/// checked here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WaterReport {
    pub zone: String,
    pub ph: Option<Decimal>,
    pub alkalinity: Option<Decimal>,
    pub total_hardness: Option<Decimal>,
    pub calcium_hardness: Option<Decimal>,
    pub sulphate: Option<Decimal>,
    pub chloride: Option<Decimal>,
    pub sodium: Option<Decimal>,
    /// Date label of the daily slot the pH/alkalinity pair came from.
    pub daily_date: Option<String>,
    /// Period of the monthly report the laboratory fields came from.
    pub monthly_period: Option<ReportPeriod>,
}

impl WaterReport {
    pub fn new(zone: &str) -> Self {
        Self {
            zone: zone.to_string(),
            ..Self::default()
        }
    }

    pub fn get(&self, field: Field) -> Option<Decimal> {
        match field {
            Field::Ph => self.ph,
            Field::Alkalinity => self.alkalinity,
            Field::TotalHardness => self.total_hardness,
            Field::CalciumHardness => self.calcium_hardness,
            Field::Sulphate => self.sulphate,
            Field::Chloride => self.chloride,
            Field::Sodium => self.sodium,
        }
    }

    pub fn set(&mut self, field: Field, value: Option<Decimal>) {
        let slot = match field {
            Field::Ph => &mut self.ph,
            Field::Alkalinity => &mut self.alkalinity,
            Field::TotalHardness => &mut self.total_hardness,
            Field::CalciumHardness => &mut self.calcium_hardness,
            Field::Sulphate => &mut self.sulphate,
            Field::Chloride => &mut self.chloride,
            Field::Sodium => &mut self.sodium,
        };
        *slot = value;
    }

    /// Fields that were never populated.
    pub fn missing_fields(&self) -> Vec<Field> {
        Field::ALL
            .into_iter()
            .filter(|f| self.get(*f).is_none())
            .collect()
    }

    fn input(&self, derived: Derived, field: Field) -> Result<Decimal, DerivedValueUnavailable> {
        self.get(field)
            .ok_or(DerivedValueUnavailable { derived, missing: field })
    }

    /// `calcium_hardness * 0.4`, quantized up to one decimal place.
    pub fn calcium(&self) -> Result<Decimal, DerivedValueUnavailable> {
        let hardness = self.input(Derived::Calcium, Field::CalciumHardness)?;
        Ok((hardness * Decimal::new(4, 1)).round_dp_with_strategy(1, RoundingStrategy::AwayFromZero))
    }

    /// `(total_hardness - calcium_hardness) / 4`, unrounded.
    pub fn magnesium(&self) -> Result<Decimal, DerivedValueUnavailable> {
        let total = self.input(Derived::Magnesium, Field::TotalHardness)?;
        let calcium = self.input(Derived::Magnesium, Field::CalciumHardness)?;
        Ok((total - calcium) / Decimal::from(4))
    }

    /// `(alkalinity / 50) * 61`, unrounded.
    pub fn bicarbonate(&self) -> Result<Decimal, DerivedValueUnavailable> {
        let alkalinity = self.input(Derived::Bicarbonate, Field::Alkalinity)?;
        Ok(alkalinity / Decimal::from(50) * Decimal::from(61))
    }

    pub fn derived(&self, derived: Derived) -> Result<Decimal, DerivedValueUnavailable> {
        match derived {
            Derived::Calcium => self.calcium(),
            Derived::Magnesium => self.magnesium(),
            Derived::Bicarbonate => self.bicarbonate(),
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// A transport-level failure from an HTTP collaborator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    /// Non-2xx HTTP response.
    #[error("HTTP error: {0}")]
    Http(u16),
    /// Connection, timeout or body-read failure.
    #[error("request failed: {0}")]
    Transport(String),
}

/// Neither today's nor yesterday's daily slot yielded a pH/alkalinity pair,
/// or the page itself could not be retrieved.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("daily snapshot unavailable for zone {zone}: {reason}")]
pub struct DailyDataUnavailable {
    pub zone: String,
    pub reason: String,
}

/// Why a monthly report could not be turned into lines.
#[derive(Debug, Clone, PartialEq)]
pub enum UnreadableCause {
    /// The server answered with a non-2xx status (404 for unpublished months).
    Status(u16),
    /// The request never produced a response body.
    Transport(String),
    /// The body is not a PDF document.
    NotPdf,
    /// The PDF could not be rendered to text.
    Decode(String),
}

impl fmt::Display for UnreadableCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnreadableCause::Status(code) => write!(f, "HTTP status {}", code),
            UnreadableCause::Transport(msg) => write!(f, "transport failure: {}", msg),
            UnreadableCause::NotPdf => write!(f, "response is not a PDF document"),
            UnreadableCause::Decode(msg) => write!(f, "PDF decode failed: {}", msg),
        }
    }
}

/// A single candidate period's report was missing or undecodable.
/// Recoverable: the resolver moves on to the next older period.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("monthly report for {period} unreadable: {cause}")]
pub struct DocumentUnreadable {
    pub period: ReportPeriod,
    pub cause: UnreadableCause,
}

/// Every period in the lookback window was unreadable.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("no monthly report available (attempted: {})", format_periods(.attempted))]
pub struct NoReportAvailable {
    pub attempted: Vec<ReportPeriod>,
}

fn format_periods(periods: &[ReportPeriod]) -> String {
    if periods.is_empty() {
        return "none".to_string();
    }
    periods
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// A derived value was requested but one of its inputs was never populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{derived} unavailable: {missing} was not reported")]
pub struct DerivedValueUnavailable {
    pub derived: Derived,
    pub missing: Field,
}

/// Assembly failed at one of its two stages.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AssemblyError {
    #[error("daily stage failed: {0}")]
    Daily(#[from] DailyDataUnavailable),
    #[error("monthly stage failed: {0}")]
    Monthly(#[from] NoReportAvailable),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_calcium_is_forty_percent_of_calcium_hardness() {
        let mut report = WaterReport::new("ELS");
        report.calcium_hardness = Some(d("100"));
        assert_eq!(report.calcium().unwrap(), d("40.0"));
    }

    #[test]
    fn test_calcium_rounds_up_to_one_decimal() {
        let mut report = WaterReport::new("ELS");
        // 142.3 * 0.4 = 56.92 -> 57.0
        report.calcium_hardness = Some(d("142.3"));
        assert_eq!(report.calcium().unwrap(), d("57.0"));
        // 101.25 * 0.4 = 40.5 exactly, no rounding needed
        report.calcium_hardness = Some(d("101.25"));
        assert_eq!(report.calcium().unwrap(), d("40.5"));
    }

    #[test]
    fn test_magnesium_from_hardness_difference() {
        let mut report = WaterReport::new("ELS");
        report.total_hardness = Some(d("150"));
        report.calcium_hardness = Some(d("100"));
        assert_eq!(report.magnesium().unwrap(), d("12.5"));
    }

    #[test]
    fn test_magnesium_is_not_clamped_when_hardness_out_of_order() {
        let mut report = WaterReport::new("ELS");
        report.total_hardness = Some(d("90"));
        report.calcium_hardness = Some(d("100"));
        assert_eq!(report.magnesium().unwrap(), d("-2.5"));
    }

    #[test]
    fn test_bicarbonate_from_alkalinity() {
        let mut report = WaterReport::new("ELS");
        report.alkalinity = Some(d("100"));
        assert_eq!(report.bicarbonate().unwrap(), d("122"));
        report.alkalinity = Some(d("95.0"));
        assert_eq!(report.bicarbonate().unwrap(), d("115.9"));
    }

    #[test]
    fn test_derived_values_fail_explicitly_on_missing_inputs() {
        let mut report = WaterReport::new("ELS");
        report.calcium_hardness = Some(d("100"));

        let err = report.magnesium().unwrap_err();
        assert_eq!(err.derived, Derived::Magnesium);
        assert_eq!(err.missing, Field::TotalHardness);

        let err = report.bicarbonate().unwrap_err();
        assert_eq!(err.missing, Field::Alkalinity);
        assert_eq!(err.to_string(), "bicarbonate unavailable: alkalinity was not reported");

        assert!(report.derived(Derived::Calcium).is_ok());
    }

    #[test]
    fn test_get_set_cover_every_field() {
        let mut report = WaterReport::new("Rossdale");
        for (i, field) in Field::ALL.into_iter().enumerate() {
            report.set(field, Some(Decimal::from(i as i64)));
        }
        for (i, field) in Field::ALL.into_iter().enumerate() {
            assert_eq!(report.get(field), Some(Decimal::from(i as i64)));
        }
        assert!(report.missing_fields().is_empty());
    }

    #[test]
    fn test_field_keys_round_trip() {
        for field in Field::ALL {
            assert_eq!(Field::from_key(field.key()), Some(field));
        }
        assert_eq!(Field::from_key("magnesium"), None);
    }

    #[test]
    fn test_no_report_message_lists_attempted_periods() {
        let err = NoReportAvailable {
            attempted: vec![ReportPeriod::new(2024, 4), ReportPeriod::new(2024, 3)],
        };
        assert_eq!(
            err.to_string(),
            "no monthly report available (attempted: 2024-04, 2024-03)"
        );
        let wrapped = AssemblyError::from(err);
        assert!(wrapped.to_string().starts_with("monthly stage failed"));
    }
}
