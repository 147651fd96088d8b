/// Monthly report period fallback.
///
/// The report for the current month is rarely published yet, so the search
/// starts one period back and walks toward older periods. It commits to the
/// first period whose document can be read at all, even if that report is
/// missing some parameters: a partial report means a measurement was not
/// taken that month or a label drifted, and quietly substituting older data
/// would hide either case.

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::extract::{PartialResult, ParameterExtractor};
use crate::ingest::monthly::MonthlyReportSource;
use crate::logging::log_period_failure;
use crate::model::NoReportAvailable;
use crate::parameters::ParameterSpec;
use crate::period::{PeriodStep, ReportPeriod};

pub const DEFAULT_START_OFFSET: u32 = 1;
pub const DEFAULT_MAX_PERIODS_BACK: u32 = 4;
/// Furthest offset ever tried, two years of monthly reports.
pub const MAX_PERIODS_BACK_LIMIT: u32 = 24;

// ---------------------------------------------------------------------------
// Lookback window
// ---------------------------------------------------------------------------

/// The bounded range of candidate periods, newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookbackWindow {
    pub step: PeriodStep,
    /// First offset tried; 0 is the current period.
    pub start_offset: u32,
    /// Last offset tried, inclusive.
    pub max_periods_back: u32,
}

impl Default for LookbackWindow {
    fn default() -> Self {
        Self {
            step: PeriodStep::CalendarMonth,
            start_offset: DEFAULT_START_OFFSET,
            max_periods_back: DEFAULT_MAX_PERIODS_BACK,
        }
    }
}

impl LookbackWindow {
    /// Candidate periods relative to `today`, newest first. Offsets that map
    /// to the period just tried (possible with four-week steps) are skipped.
    /// Offsets past `MAX_PERIODS_BACK_LIMIT` are never tried.
    pub fn periods(&self, today: NaiveDate) -> Vec<ReportPeriod> {
        let mut periods: Vec<ReportPeriod> = Vec::new();
        let last = self.max_periods_back.min(MAX_PERIODS_BACK_LIMIT);
        for offset in self.start_offset..=last {
            let period = self.step.period_for(today, offset);
            if periods.last() != Some(&period) {
                periods.push(period);
            }
        }
        periods
    }
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Extraction result from the report that was committed to.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyExtraction {
    pub period: ReportPeriod,
    pub result: PartialResult,
}

pub struct MonthlyReportResolver {
    window: LookbackWindow,
    today: NaiveDate,
}

impl MonthlyReportResolver {
    pub fn new(window: LookbackWindow, today: NaiveDate) -> Self {
        Self { window, today }
    }

    /// Opens candidate periods newest first and extracts from the first
    /// readable one. Unreadable periods are logged and skipped; if none is
    /// readable the error lists every period attempted.
    pub fn resolve(
        &self,
        source: &dyn MonthlyReportSource,
        specs: &[ParameterSpec],
    ) -> Result<MonthlyExtraction, NoReportAvailable> {
        let extractor = ParameterExtractor::new(specs);
        let mut attempted = Vec::new();

        for period in self.window.periods(self.today) {
            attempted.push(period);

            let mut lines = match source.open(&period) {
                Ok(lines) => lines,
                Err(err) => {
                    log_period_failure(&err);
                    continue;
                }
            };

            let result = extractor.extract(&mut lines);
            let missing = result.missing();
            if missing.is_empty() {
                info!(stage = "monthly", %period, "monthly report complete");
            } else {
                let names: Vec<&str> = missing.iter().map(|f| f.key()).collect();
                warn!(
                    stage = "monthly",
                    %period,
                    found = result.found_count(),
                    missing = %names.join(", "),
                    "monthly report readable but incomplete; not searching older periods"
                );
            }
            return Ok(MonthlyExtraction { period, result });
        }

        Err(NoReportAvailable { attempted })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
