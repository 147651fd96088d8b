//! Data Source Verification Module
//!
//! Checks the daily page and every monthly report in the lookback window
//! without stopping at the first readable one, to show which sources are
//! currently published and how much of each report the extractor can read.
//!
//! Use this when the report changes format: a readable report with missing
//! parameters usually means a label drifted.

use chrono::{NaiveDate, Utc};
use serde::Serialize;

use crate::extract::ParameterExtractor;
use crate::ingest::daily::{DailyPageSource, DailySlot, read_snapshot};
use crate::ingest::monthly::MonthlyReportSource;
use crate::parameters::ParameterSpec;
use crate::resolver::LookbackWindow;

// ============================================================================
// Verification Results
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct VerificationReport {
    pub timestamp: String,
    pub daily: DailyVerification,
    pub monthly: Vec<PeriodVerification>,
    pub summary: VerificationSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerificationSummary {
    pub periods_total: usize,
    pub periods_readable: usize,
    pub periods_complete: usize,
    /// First readable period, i.e. the one a report run would use.
    pub committed_period: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyVerification {
    pub zone: String,
    pub status: VerificationStatus,
    pub page_available: bool,
    pub slot_used: Option<String>,
    pub date: Option<String>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PeriodVerification {
    pub period: String,
    pub status: VerificationStatus,
    pub line_count: usize,
    pub parameters_found: Vec<String>,
    pub parameters_missing: Vec<String>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub enum VerificationStatus {
    Success,
    PartialSuccess,
    Failed,
}

// ============================================================================
// Daily Verification
// ============================================================================

pub fn verify_daily(source: &dyn DailyPageSource, zone: &str) -> DailyVerification {
    let mut result = DailyVerification {
        zone: zone.to_string(),
        status: VerificationStatus::Failed,
        page_available: false,
        slot_used: None,
        date: None,
        error_message: None,
    };

    let html = match source.fetch_daily_page(zone) {
        Ok(html) => html,
        Err(e) => {
            result.error_message = Some(e.to_string());
            return result;
        }
    };
    result.page_available = true;

    match read_snapshot(&html, zone) {
        Ok(reading) => {
            // Falling back to yesterday works, but is worth flagging.
            result.status = match reading.slot {
                DailySlot::Today => VerificationStatus::Success,
                DailySlot::Yesterday => VerificationStatus::PartialSuccess,
            };
            result.slot_used = Some(reading.slot.to_string());
            result.date = reading.date;
        }
        Err(e) => result.error_message = Some(e.reason),
    }
    result
}

// ============================================================================
// Monthly Verification
// ============================================================================

/// Opens every period in the window, newest first.
pub fn verify_monthly(
    source: &dyn MonthlyReportSource,
    window: &LookbackWindow,
    today: NaiveDate,
    specs: &[ParameterSpec],
) -> Vec<PeriodVerification> {
    let extractor = ParameterExtractor::new(specs);

    window
        .periods(today)
        .into_iter()
        .map(|period| {
            let mut result = PeriodVerification {
                period: period.to_string(),
                status: VerificationStatus::Failed,
                line_count: 0,
                parameters_found: Vec::new(),
                parameters_missing: Vec::new(),
                error_message: None,
            };

            match source.open(&period) {
                Ok(mut lines) => {
                    result.line_count = lines.len();
                    let extraction = extractor.extract(&mut lines);
                    for outcome in &extraction.outcomes {
                        let name = outcome.spec.name.to_string();
                        if outcome.state.value().is_some() {
                            result.parameters_found.push(name);
                        } else {
                            result.parameters_missing.push(name);
                        }
                    }
                    result.status = if result.parameters_missing.is_empty() {
                        VerificationStatus::Success
                    } else {
                        VerificationStatus::PartialSuccess
                    };
                }
                Err(e) => result.error_message = Some(e.cause.to_string()),
            }
            result
        })
        .collect()
}

pub fn verify_sources(
    daily_source: &dyn DailyPageSource,
    monthly_source: &dyn MonthlyReportSource,
    zone: &str,
    window: &LookbackWindow,
    today: NaiveDate,
    specs: &[ParameterSpec],
) -> VerificationReport {
    let daily = verify_daily(daily_source, zone);
    let monthly = verify_monthly(monthly_source, window, today, specs);

    let summary = VerificationSummary {
        periods_total: monthly.len(),
        periods_readable: monthly
            .iter()
            .filter(|p| p.status != VerificationStatus::Failed)
            .count(),
        periods_complete: monthly
            .iter()
            .filter(|p| p.status == VerificationStatus::Success)
            .count(),
        committed_period: monthly
            .iter()
            .find(|p| p.status != VerificationStatus::Failed)
            .map(|p| p.period.clone()),
    };

    VerificationReport {
        timestamp: Utc::now().to_rfc3339(),
        daily,
        monthly,
        summary,
    }
}

/// Plain text rendering for the `sources` command.
pub fn render_verification(report: &VerificationReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("Daily page ({}): {:?}", report.daily.zone, report.daily.status));
    if let Some(slot) = &report.daily.slot_used {
        out.push_str(&format!(", slot {}", slot));
    }
    if let Some(error) = &report.daily.error_message {
        out.push_str(&format!(", error: {}", error));
    }
    out.push('\n');

    for period in &report.monthly {
        out.push_str(&format!(
            "Monthly {}: {:?}, {} lines, {} found, {} missing",
            period.period,
            period.status,
            period.line_count,
            period.parameters_found.len(),
            period.parameters_missing.len()
        ));
        if let Some(error) = &period.error_message {
            out.push_str(&format!(", error: {}", error));
        }
        out.push('\n');
    }

    out.push_str(&format!(
        "Summary: {}/{} periods readable, {} complete, committed period: {}\n",
        report.summary.periods_readable,
        report.summary.periods_total,
        report.summary.periods_complete,
        report.summary.committed_period.as_deref().unwrap_or("none")
    ));
    out
}
