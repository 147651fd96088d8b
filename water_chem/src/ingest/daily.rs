/// Daily water quality snapshot reader.
///
/// The daily status page publishes a rolling week of spot readings, one
/// labelled slot per day. Slot 7 is today and slot 6 is yesterday; each slot
/// exposes `phLabel{n}`, `AlkalinityLabel{n}` and `DateLabel{n}` elements.
/// Same-day values are often blank or placeholder text until the utility
/// publishes them, so the reader falls back to yesterday, taking both
/// values from the same slot.
///
/// Page: https://apps.epcor.ca/DailyWaterQuality/Default.aspx?zone={zone}

use rust_decimal::Decimal;
use scraper::{Html, Selector};
use std::fmt;
use tracing::{debug, info, instrument};

use crate::model::{DailyDataUnavailable, FetchError};
use crate::numeric::parse_decimal;

pub const DEFAULT_DAILY_URL_TEMPLATE: &str =
    "https://apps.epcor.ca/DailyWaterQuality/Default.aspx?zone={zone}";

// ============================================================================
// Slots and readings
// ============================================================================

/// Which day's slot on the daily page a reading came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DailySlot {
    Today,
    Yesterday,
}

impl DailySlot {
    /// The page's own numbering for this slot.
    pub fn index(self) -> u8 {
        match self {
            DailySlot::Today => 7,
            DailySlot::Yesterday => 6,
        }
    }

    fn ph_id(self) -> String {
        format!("phLabel{}", self.index())
    }

    fn alkalinity_id(self) -> String {
        format!("AlkalinityLabel{}", self.index())
    }

    fn date_id(self) -> String {
        format!("DateLabel{}", self.index())
    }
}

impl fmt::Display for DailySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DailySlot::Today => write!(f, "today"),
            DailySlot::Yesterday => write!(f, "yesterday"),
        }
    }
}

/// pH and alkalinity from a single daily slot.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyReading {
    pub zone: String,
    pub ph: Decimal,
    pub alkalinity: Decimal,
    /// Human-readable date label printed next to the slot, if present.
    pub date: Option<String>,
    pub slot: DailySlot,
}

#[derive(Debug, Clone, PartialEq)]
enum SlotError {
    MissingElement(String),
    NotNumeric { id: String, text: String },
}

impl fmt::Display for SlotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotError::MissingElement(id) => write!(f, "element #{} not found", id),
            SlotError::NotNumeric { id, text } => {
                write!(f, "element #{} is not numeric ({:?})", id, text)
            }
        }
    }
}

// ============================================================================
// Reader
// ============================================================================

/// Reads today's pH/alkalinity pair from `page_html`, falling back to
/// yesterday's pair if either of today's values is missing or non-numeric.
///
/// Fails with `DailyDataUnavailable` when yesterday's slot is unusable too;
/// the error carries no date. There is no further fallback.
#[instrument(skip(page_html), fields(stage = "daily", html_size = page_html.len()))]
pub fn read_snapshot(page_html: &str, zone: &str) -> Result<DailyReading, DailyDataUnavailable> {
    let document = Html::parse_document(page_html);

    let today_error = match read_slot(&document, DailySlot::Today) {
        Ok((ph, alkalinity)) => {
            return Ok(reading(&document, zone, DailySlot::Today, ph, alkalinity));
        }
        Err(e) => e,
    };
    info!(stage = "daily", zone, "today's readings unusable ({}), falling back to yesterday", today_error);

    match read_slot(&document, DailySlot::Yesterday) {
        Ok((ph, alkalinity)) => Ok(reading(&document, zone, DailySlot::Yesterday, ph, alkalinity)),
        Err(e) => Err(DailyDataUnavailable {
            zone: zone.to_string(),
            reason: format!("today: {}; yesterday: {}", today_error, e),
        }),
    }
}

fn reading(document: &Html, zone: &str, slot: DailySlot, ph: Decimal, alkalinity: Decimal) -> DailyReading {
    let date = element_text(document, &slot.date_id()).filter(|d| !d.is_empty());
    debug!(stage = "daily", zone, %slot, %ph, %alkalinity, date = ?date, "daily readings parsed");
    DailyReading {
        zone: zone.to_string(),
        ph,
        alkalinity,
        date,
        slot,
    }
}

/// Both values must parse for the slot to count.
fn read_slot(document: &Html, slot: DailySlot) -> Result<(Decimal, Decimal), SlotError> {
    let ph = numeric_element(document, &slot.ph_id())?;
    let alkalinity = numeric_element(document, &slot.alkalinity_id())?;
    Ok((ph, alkalinity))
}

fn numeric_element(document: &Html, id: &str) -> Result<Decimal, SlotError> {
    let text = element_text(document, id).ok_or_else(|| SlotError::MissingElement(id.to_string()))?;
    parse_decimal(&text).ok_or_else(|| SlotError::NotNumeric {
        id: id.to_string(),
        text,
    })
}

fn element_text(document: &Html, id: &str) -> Option<String> {
    let selector = Selector::parse(&format!("#{}", id)).ok()?;
    document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
}

// ============================================================================
// Page source
// ============================================================================

/// Supplies the daily page HTML for a zone.
pub trait DailyPageSource {
    fn fetch_daily_page(&self, zone: &str) -> Result<String, FetchError>;
}

/// Fetches the daily page over HTTP. `{zone}` in the template is replaced
/// with the zone code.
pub struct HttpDailySource {
    client: reqwest::blocking::Client,
    url_template: String,
}

impl HttpDailySource {
    pub fn new(client: reqwest::blocking::Client, url_template: impl Into<String>) -> Self {
        Self {
            client,
            url_template: url_template.into(),
        }
    }

    pub fn url_for(&self, zone: &str) -> String {
        self.url_template.replace("{zone}", zone)
    }
}

impl DailyPageSource for HttpDailySource {
    fn fetch_daily_page(&self, zone: &str) -> Result<String, FetchError> {
        let url = self.url_for(zone);
        debug!(stage = "daily", %url, "requesting daily page");

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FetchError::Http(response.status().as_u16()));
        }

        response.text().map_err(|e| FetchError::Transport(e.to_string()))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn page(today: (&str, &str, &str), yesterday: (&str, &str, &str)) -> String {
        format!(
            r#"<html><body><table>
            <tr><td><span id="DateLabel6">{}</span></td><td><span id="phLabel6">{}</span></td><td><span id="AlkalinityLabel6">{}</span></td></tr>
            <tr><td><span id="DateLabel7">{}</span></td><td><span id="phLabel7">{}</span></td><td><span id="AlkalinityLabel7">{}</span></td></tr>
            </table></body></html>"#,
            yesterday.0, yesterday.1, yesterday.2, today.0, today.1, today.2
        )
    }

    #[test]
    fn test_reads_today_when_valid() {
        let html = page(("May 2", "7.8", "95.0"), ("May 1", "7.6", "90.0"));
        let reading = read_snapshot(&html, "ELS").unwrap();
        assert_eq!(reading.slot, DailySlot::Today);
        assert_eq!(reading.ph, d("7.8"));
        assert_eq!(reading.alkalinity, d("95.0"));
        assert_eq!(reading.date.as_deref(), Some("May 2"));
        assert_eq!(reading.zone, "ELS");
    }

    #[test]
    fn test_falls_back_atomically_when_today_alkalinity_invalid() {
        // Today's pH is fine but alkalinity is a placeholder: both values
        // must come from yesterday.
        let html = page(("May 2", "7.8", "N/A"), ("May 1", "7.6", "90.0"));
        let reading = read_snapshot(&html, "ELS").unwrap();
        assert_eq!(reading.slot, DailySlot::Yesterday);
        assert_eq!(reading.ph, d("7.6"));
        assert_eq!(reading.alkalinity, d("90.0"));
        assert_eq!(reading.date.as_deref(), Some("May 1"));
    }

    #[test]
    fn test_falls_back_when_today_blank() {
        let html = page(("", "", ""), ("May 1", "7.6", "90.0"));
        let reading = read_snapshot(&html, "Rossdale").unwrap();
        assert_eq!(reading.slot, DailySlot::Yesterday);
        assert_eq!(reading.ph, d("7.6"));
    }

    #[test]
    fn test_fails_when_both_slots_invalid() {
        let html = page(("May 2", "-", "-"), ("May 1", "pending", "90.0"));
        let err = read_snapshot(&html, "ELS").unwrap_err();
        assert_eq!(err.zone, "ELS");
        assert!(err.reason.contains("phLabel6"), "reason was: {}", err.reason);
    }

    #[test]
    fn test_fails_when_page_structure_changed() {
        let err = read_snapshot("<html><body><p>Maintenance</p></body></html>", "ELS").unwrap_err();
        assert!(err.reason.contains("not found"));
    }

    #[test]
    fn test_missing_date_label_does_not_fail() {
        let html = r#"<span id="phLabel7">8.1</span><span id="AlkalinityLabel7">102</span>"#;
        let reading = read_snapshot(html, "ELS").unwrap();
        assert_eq!(reading.date, None);
        assert_eq!(reading.alkalinity, d("102"));
    }

    #[test]
    fn test_slot_indices() {
        assert_eq!(DailySlot::Today.index(), 7);
        assert_eq!(DailySlot::Yesterday.index(), 6);
    }

    #[test]
    fn test_url_template_substitutes_zone() {
        let source = HttpDailySource::new(reqwest::blocking::Client::new(), DEFAULT_DAILY_URL_TEMPLATE);
        assert_eq!(
            source.url_for("Rossdale"),
            "https://apps.epcor.ca/DailyWaterQuality/Default.aspx?zone=Rossdale"
        );
    }
}
