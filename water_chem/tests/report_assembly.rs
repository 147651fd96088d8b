/// End-to-end report assembly tests
///
/// Tests verify:
/// 1. Daily page + monthly report lines assemble into a complete report
/// 2. Derived chemistry computed from the assembled report
/// 3. Daily fallback is atomic across the whole pipeline
/// 4. Stage failures surface as the matching AssemblyError
///
/// All collaborators are in-memory; no network access is needed.
///
/// Run with: cargo test --test report_assembly

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::cell::RefCell;
use std::collections::HashMap;

use water_chem::assemble::ReportAssembler;
use water_chem::ingest::daily::DailyPageSource;
use water_chem::ingest::lines::LineStream;
use water_chem::ingest::monthly::MonthlyReportSource;
use water_chem::model::{AssemblyError, DocumentUnreadable, FetchError, UnreadableCause};
use water_chem::output::{render_line_protocol, render_text};
use water_chem::period::ReportPeriod;
use water_chem::resolver::{LookbackWindow, MonthlyReportResolver};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

const DAILY_PAGE: &str = include_str!("fixtures/daily_page.html");
const MONTHLY_REPORT: &str = include_str!("fixtures/monthly_report.txt");

fn d(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 14).unwrap()
}

fn resolver() -> MonthlyReportResolver {
    MonthlyReportResolver::new(LookbackWindow::default(), today())
}

struct StaticPage {
    html: Option<String>,
    requested_zones: RefCell<Vec<String>>,
}

impl StaticPage {
    fn new(html: &str) -> Self {
        Self {
            html: Some(html.to_string()),
            requested_zones: RefCell::new(Vec::new()),
        }
    }

    fn unavailable() -> Self {
        Self {
            html: None,
            requested_zones: RefCell::new(Vec::new()),
        }
    }
}

impl DailyPageSource for StaticPage {
    fn fetch_daily_page(&self, zone: &str) -> Result<String, FetchError> {
        self.requested_zones.borrow_mut().push(zone.to_string());
        self.html
            .clone()
            .ok_or_else(|| FetchError::Transport("operation timed out".to_string()))
    }
}

/// Monthly documents keyed by period, as decoded text.
struct Reports {
    texts: HashMap<ReportPeriod, String>,
    opened: RefCell<Vec<ReportPeriod>>,
}

impl Reports {
    fn new(texts: &[(ReportPeriod, &str)]) -> Self {
        Self {
            texts: texts.iter().map(|(p, t)| (*p, t.to_string())).collect(),
            opened: RefCell::new(Vec::new()),
        }
    }
}

impl MonthlyReportSource for Reports {
    fn open(&self, period: &ReportPeriod) -> Result<LineStream, DocumentUnreadable> {
        self.opened.borrow_mut().push(*period);
        self.texts
            .get(period)
            .map(|text| LineStream::from_text(text))
            .ok_or(DocumentUnreadable {
                period: *period,
                cause: UnreadableCause::Status(404),
            })
    }
}

fn daily_page(today: (&str, &str), yesterday: (&str, &str)) -> String {
    format!(
        r#"<span id="DateLabel6">May 13</span><span id="phLabel6">{}</span><span id="AlkalinityLabel6">{}</span>
           <span id="DateLabel7">May 14</span><span id="phLabel7">{}</span><span id="AlkalinityLabel7">{}</span>"#,
        yesterday.0, yesterday.1, today.0, today.1
    )
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

#[test]
fn test_end_to_end_report_and_derived_values() {
    let daily = StaticPage::new(&daily_page(("7.8", "95.0"), ("7.7", "94.0")));
    let monthly = Reports::new(&[(
        ReportPeriod::new(2024, 4),
        "Total Hardness 30 30 180 180\n\
         Calcium Hardness 30 30 100 100\n\
         Sulphate Dissolved 30 30 25.0 25.0\n\
         Chloride Dissolved 30 30 15.0 15.0\n\
         Sodium 30 30 8.0 8.0",
    )]);

    let report = ReportAssembler::new(&daily, &monthly, resolver())
        .assemble("ELS")
        .expect("assembly should succeed");

    assert_eq!(report.ph, Some(d("7.8")));
    assert_eq!(report.alkalinity, Some(d("95.0")));
    assert_eq!(report.total_hardness, Some(d("180")));
    assert_eq!(report.calcium_hardness, Some(d("100")));
    assert_eq!(report.sulphate, Some(d("25.0")));
    assert_eq!(report.chloride, Some(d("15.0")));
    assert_eq!(report.sodium, Some(d("8.0")));

    assert_eq!(report.calcium().unwrap(), d("40.0"));
    assert_eq!(report.magnesium().unwrap(), d("20.0"));
    assert_eq!(report.bicarbonate().unwrap(), d("115.9"));

    assert_eq!(report.monthly_period, Some(ReportPeriod::new(2024, 4)));
    assert_eq!(*daily.requested_zones.borrow(), vec!["ELS".to_string()]);
}

#[test]
fn test_fixture_documents_assemble() {
    let daily = StaticPage::new(DAILY_PAGE);
    let monthly = Reports::new(&[(ReportPeriod::new(2024, 3), MONTHLY_REPORT)]);

    let report = ReportAssembler::new(&daily, &monthly, resolver())
        .assemble("Rossdale")
        .unwrap();

    assert_eq!(report.daily_date.as_deref(), Some("May 14, 2024"));
    assert_eq!(report.total_hardness, Some(d("180")));
    assert_eq!(report.calcium_hardness, Some(d("100")));
    assert!(report.missing_fields().is_empty());
    // April was tried first and was not published.
    assert_eq!(
        *monthly.opened.borrow(),
        vec![ReportPeriod::new(2024, 4), ReportPeriod::new(2024, 3)]
    );

    let text = render_text(&report);
    assert!(text.contains("Monthly data date: march-2024"));
    assert!(text.contains("Bicarbonate (HCO3): 115.9"));

    let line = render_line_protocol(&report, None).unwrap();
    assert!(line.starts_with("water_quality,zone=Rossdale "));
}

#[test]
fn test_daily_fallback_never_mixes_slots() {
    let monthly = Reports::new(&[(ReportPeriod::new(2024, 4), MONTHLY_REPORT)]);
    let cases = [
        (("7.8", "N/A"), ("7.6", "90.0")),
        (("N/A", "95.0"), ("7.6", "90.0")),
        (("", ""), ("7.6", "90.0")),
    ];

    for (today_slot, yesterday_slot) in cases {
        let daily = StaticPage::new(&daily_page(today_slot, yesterday_slot));
        let report = ReportAssembler::new(&daily, &monthly, resolver())
            .assemble("ELS")
            .unwrap();
        assert_eq!(report.ph, Some(d("7.6")), "case {:?}", today_slot);
        assert_eq!(report.alkalinity, Some(d("90.0")), "case {:?}", today_slot);
        assert_eq!(report.daily_date.as_deref(), Some("May 13"));
    }
}

#[test]
fn test_incomplete_monthly_report_fails_derived_values_explicitly() {
    let daily = StaticPage::new(&daily_page(("7.8", "95.0"), ("7.7", "94.0")));
    let monthly = Reports::new(&[(
        ReportPeriod::new(2024, 4),
        "Calcium Hardness 30 30 100 100\nSodium 30 30 8.0 8.0",
    )]);

    let report = ReportAssembler::new(&daily, &monthly, resolver())
        .assemble("ELS")
        .unwrap();

    assert_eq!(report.total_hardness, None);
    assert!(report.magnesium().is_err());
    assert_eq!(report.calcium().unwrap(), d("40.0"));
    assert!(render_text(&report).contains("Magnesium (Mg): unavailable"));
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[test]
fn test_unavailable_daily_page_is_daily_failure() {
    let daily = StaticPage::unavailable();
    let monthly = Reports::new(&[(ReportPeriod::new(2024, 4), MONTHLY_REPORT)]);

    let err = ReportAssembler::new(&daily, &monthly, resolver())
        .assemble("ELS")
        .unwrap_err();

    assert!(matches!(err, AssemblyError::Daily(_)));
    assert!(err.to_string().starts_with("daily stage failed"));
    assert!(monthly.opened.borrow().is_empty());
}

#[test]
fn test_both_daily_slots_invalid_is_daily_failure() {
    let daily = StaticPage::new(&daily_page(("-", "-"), ("", "")));
    let monthly = Reports::new(&[(ReportPeriod::new(2024, 4), MONTHLY_REPORT)]);

    let err = ReportAssembler::new(&daily, &monthly, resolver())
        .assemble("ELS")
        .unwrap_err();

    match err {
        AssemblyError::Daily(e) => assert_eq!(e.zone, "ELS"),
        other => panic!("expected daily failure, got {:?}", other),
    }
}

#[test]
fn test_no_published_report_is_monthly_failure_listing_periods() {
    let daily = StaticPage::new(DAILY_PAGE);
    let monthly = Reports::new(&[]);

    let err = ReportAssembler::new(&daily, &monthly, resolver())
        .assemble("ELS")
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "monthly stage failed: no monthly report available \
         (attempted: 2024-04, 2024-03, 2024-02, 2024-01)"
    );
}
