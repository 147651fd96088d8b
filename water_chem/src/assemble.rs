/// Report assembly: daily snapshot + monthly summary → `WaterReport`.
///
/// Each stage returns its own partial result and the two are merged once
/// here. The daily stage runs first because pH and alkalinity have no
/// monthly substitute; if it fails nothing else is fetched.

use tracing::{info, instrument};

use crate::ingest::daily::{DailyPageSource, DailyReading, read_snapshot};
use crate::ingest::monthly::MonthlyReportSource;
use crate::model::{AssemblyError, DailyDataUnavailable, WaterReport};
use crate::parameters::{PARAMETER_SPECS, ParameterSpec};
use crate::resolver::{MonthlyExtraction, MonthlyReportResolver};

pub struct ReportAssembler<'a> {
    daily: &'a dyn DailyPageSource,
    monthly: &'a dyn MonthlyReportSource,
    resolver: MonthlyReportResolver,
    specs: &'a [ParameterSpec],
}

impl<'a> ReportAssembler<'a> {
    pub fn new(
        daily: &'a dyn DailyPageSource,
        monthly: &'a dyn MonthlyReportSource,
        resolver: MonthlyReportResolver,
    ) -> Self {
        Self {
            daily,
            monthly,
            resolver,
            specs: PARAMETER_SPECS,
        }
    }

    /// Builds the report for `zone`, along with the monthly extraction it
    /// was merged from.
    #[instrument(skip(self), fields(stage = "system"))]
    pub fn assemble_detailed(&self, zone: &str) -> Result<(WaterReport, MonthlyExtraction), AssemblyError> {
        let daily = self.read_daily(zone)?;
        let monthly = self.resolver.resolve(self.monthly, self.specs)?;
        let report = merge(zone, &daily, &monthly);
        info!(
            stage = "system",
            zone,
            period = %monthly.period,
            missing = report.missing_fields().len(),
            "report assembled"
        );
        Ok((report, monthly))
    }

    pub fn assemble(&self, zone: &str) -> Result<WaterReport, AssemblyError> {
        self.assemble_detailed(zone).map(|(report, _)| report)
    }

    fn read_daily(&self, zone: &str) -> Result<DailyReading, DailyDataUnavailable> {
        let html = self
            .daily
            .fetch_daily_page(zone)
            .map_err(|e| DailyDataUnavailable {
                zone: zone.to_string(),
                reason: format!("daily page unavailable: {}", e),
            })?;
        read_snapshot(&html, zone)
    }
}

/// Combines the two stage results into one report. Monthly fields that
/// were not found stay unset.
pub fn merge(zone: &str, daily: &DailyReading, monthly: &MonthlyExtraction) -> WaterReport {
    let mut report = WaterReport::new(zone);
    report.ph = Some(daily.ph);
    report.alkalinity = Some(daily.alkalinity);
    report.daily_date = daily.date.clone();
    for (field, value) in monthly.result.values() {
        report.set(field, value);
    }
    report.monthly_period = Some(monthly.period);
    report
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
