//! Report periods and the period → resource mapping.
//!
//! The monthly summary has been published under more than one naming
//! scheme (month-name slugs, then numeric year/month paths). The resolver
//! only deals in `ReportPeriod`s; turning a period into a URL is the job of
//! a `ReportLocator`, so a naming change never touches resolution or
//! extraction.
//!
//! # Clock injection
//! Period arithmetic takes `today: NaiveDate` rather than reading the clock,
//! so window tests are deterministic.

use chrono::{Datelike, Days, Month, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Period
// ---------------------------------------------------------------------------

/// A calendar month identifying one monthly laboratory summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ReportPeriod {
    pub year: i32,
    /// 1-based month number.
    pub month: u32,
}

impl ReportPeriod {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self::new(date.year(), date.month())
    }

    /// Lower-case English month name, e.g. `"march"`.
    pub fn month_name(&self) -> String {
        u8::try_from(self.month)
            .ok()
            .and_then(|m| Month::try_from(m).ok())
            .map(|m| m.name().to_lowercase())
            .unwrap_or_else(|| format!("month{}", self.month))
    }

    /// The period `months` calendar months before this one.
    pub fn months_back(&self, months: u32) -> Self {
        let index = self.year as i64 * 12 + (self.month as i64 - 1) - months as i64;
        Self::new(index.div_euclid(12) as i32, index.rem_euclid(12) as u32 + 1)
    }
}

impl fmt::Display for ReportPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

// ---------------------------------------------------------------------------
// Period stepping
// ---------------------------------------------------------------------------

/// How a lookback offset is turned into a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PeriodStep {
    /// Offset `n` is `n` calendar months before today's month.
    #[default]
    CalendarMonth,
    /// Offset `n` is the month containing `today - 4n weeks`. Two offsets can
    /// land in the same month near month boundaries.
    FourWeeks,
}

impl PeriodStep {
    pub fn period_for(self, today: NaiveDate, offset: u32) -> ReportPeriod {
        match self {
            PeriodStep::CalendarMonth => ReportPeriod::containing(today).months_back(offset),
            PeriodStep::FourWeeks => {
                ReportPeriod::containing(today - Days::new(28 * u64::from(offset)))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Locators
// ---------------------------------------------------------------------------

pub const DEFAULT_MONTH_NAME_TEMPLATE: &str =
    "https://www.epcor.com/products-services/water/water-quality/wqreportsedmonton/wwq-edmonton-{month_name}-{year}.pdf";

pub const DEFAULT_YEAR_MONTH_TEMPLATE: &str =
    "https://www.epcor.com/products-services/water/water-quality/wqreportsedmonton/{year}/wwq-edmonton-{year}-{month}.pdf";

/// Maps a report period to the location of its document.
pub trait ReportLocator {
    fn locate(&self, period: &ReportPeriod) -> String;
}

/// Month-name scheme: `{month_name}` (e.g. `march`) and `{year}`.
#[derive(Debug, Clone)]
pub struct MonthNameLocator {
    template: String,
}

impl MonthNameLocator {
    pub fn new(template: impl Into<String>) -> Self {
        Self { template: template.into() }
    }
}

impl Default for MonthNameLocator {
    fn default() -> Self {
        Self::new(DEFAULT_MONTH_NAME_TEMPLATE)
    }
}

impl ReportLocator for MonthNameLocator {
    fn locate(&self, period: &ReportPeriod) -> String {
        self.template
            .replace("{month_name}", &period.month_name())
            .replace("{year}", &period.year.to_string())
    }
}

/// Numeric scheme: `{year}` and zero-padded `{month}`.
#[derive(Debug, Clone)]
pub struct YearMonthLocator {
    template: String,
}

impl YearMonthLocator {
    pub fn new(template: impl Into<String>) -> Self {
        Self { template: template.into() }
    }
}

impl Default for YearMonthLocator {
    fn default() -> Self {
        Self::new(DEFAULT_YEAR_MONTH_TEMPLATE)
    }
}

impl ReportLocator for YearMonthLocator {
    fn locate(&self, period: &ReportPeriod) -> String {
        self.template
            .replace("{year}", &period.year.to_string())
            .replace("{month}", &format!("{:02}", period.month))
    }
}

/// Locator scheme selected in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LocatorFormat {
    #[default]
    MonthName,
    YearMonth,
}

impl LocatorFormat {
    /// Builds the locator for this scheme, using `template` if given and the
    /// scheme's default URL otherwise.
    pub fn build(self, template: Option<&str>) -> Box<dyn ReportLocator> {
        match (self, template) {
            (LocatorFormat::MonthName, Some(t)) => Box::new(MonthNameLocator::new(t)),
            (LocatorFormat::MonthName, None) => Box::new(MonthNameLocator::default()),
            (LocatorFormat::YearMonth, Some(t)) => Box::new(YearMonthLocator::new(t)),
            (LocatorFormat::YearMonth, None) => Box::new(YearMonthLocator::default()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_months_back_crosses_year_boundary() {
        let jan = ReportPeriod::new(2024, 1);
        assert_eq!(jan.months_back(0), jan);
        assert_eq!(jan.months_back(1), ReportPeriod::new(2023, 12));
        assert_eq!(jan.months_back(13), ReportPeriod::new(2022, 12));
    }

    #[test]
    fn test_calendar_month_step_ignores_day_of_month() {
        let step = PeriodStep::CalendarMonth;
        assert_eq!(step.period_for(date(2024, 3, 31), 1), ReportPeriod::new(2024, 2));
        assert_eq!(step.period_for(date(2024, 3, 1), 4), ReportPeriod::new(2023, 11));
    }

    #[test]
    fn test_four_week_step_uses_day_arithmetic() {
        let step = PeriodStep::FourWeeks;
        // 2024-03-31 minus 28 days is 2024-03-03: same month.
        assert_eq!(step.period_for(date(2024, 3, 31), 1), ReportPeriod::new(2024, 3));
        assert_eq!(step.period_for(date(2024, 3, 15), 1), ReportPeriod::new(2024, 2));
        assert_eq!(step.period_for(date(2024, 1, 10), 1), ReportPeriod::new(2023, 12));
    }

    #[test]
    fn test_period_display_and_month_name() {
        let p = ReportPeriod::new(2023, 9);
        assert_eq!(p.to_string(), "2023-09");
        assert_eq!(p.month_name(), "september");
    }

    #[test]
    fn test_month_name_locator_fills_slug() {
        let locator = MonthNameLocator::default();
        assert_eq!(
            locator.locate(&ReportPeriod::new(2024, 2)),
            "https://www.epcor.com/products-services/water/water-quality/wqreportsedmonton/wwq-edmonton-february-2024.pdf"
        );
    }

    #[test]
    fn test_year_month_locator_zero_pads_month() {
        let locator = YearMonthLocator::new("https://example.test/{year}/report-{year}-{month}.pdf");
        assert_eq!(
            locator.locate(&ReportPeriod::new(2024, 2)),
            "https://example.test/2024/report-2024-02.pdf"
        );
    }

    #[test]
    fn test_locator_format_builds_matching_scheme() {
        let period = ReportPeriod::new(2022, 11);
        let by_name = LocatorFormat::MonthName.build(Some("x-{month_name}-{year}"));
        let by_number = LocatorFormat::YearMonth.build(Some("x-{year}-{month}"));
        assert_eq!(by_name.locate(&period), "x-november-2022");
        assert_eq!(by_number.locate(&period), "x-2022-11");
    }
}
