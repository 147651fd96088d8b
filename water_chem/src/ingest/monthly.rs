/// Monthly laboratory summary retrieval.
///
/// Fetches the PDF for a report period and renders it to text lines. Every
/// way this can go wrong (unpublished month, timeout, an HTML error page in
/// place of the PDF, a malformed document) is reported the same way, as
/// `DocumentUnreadable`, so the resolver can move on to an older period.

use std::panic;
use tracing::debug;

use crate::ingest::lines::LineStream;
use crate::model::{DocumentUnreadable, UnreadableCause};
use crate::period::{ReportLocator, ReportPeriod};

/// Leading bytes of every PDF file.
const PDF_SIGNATURE: &[u8] = b"%PDF-";

/// Supplies the decoded lines of one period's monthly report.
pub trait MonthlyReportSource {
    fn open(&self, period: &ReportPeriod) -> Result<LineStream, DocumentUnreadable>;
}

/// Downloads report PDFs over HTTP and decodes them with `pdf-extract`.
pub struct HttpReportSource {
    client: reqwest::blocking::Client,
    locator: Box<dyn ReportLocator>,
}

impl HttpReportSource {
    pub fn new(client: reqwest::blocking::Client, locator: Box<dyn ReportLocator>) -> Self {
        Self { client, locator }
    }

    pub fn url_for(&self, period: &ReportPeriod) -> String {
        self.locator.locate(period)
    }

    fn download(&self, period: &ReportPeriod) -> Result<Vec<u8>, UnreadableCause> {
        let url = self.url_for(period);
        debug!(stage = "monthly", %period, %url, "requesting monthly report");

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| UnreadableCause::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(UnreadableCause::Status(response.status().as_u16()));
        }

        let bytes = response
            .bytes()
            .map_err(|e| UnreadableCause::Transport(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

impl MonthlyReportSource for HttpReportSource {
    fn open(&self, period: &ReportPeriod) -> Result<LineStream, DocumentUnreadable> {
        let unreadable = |cause| DocumentUnreadable {
            period: *period,
            cause,
        };
        let bytes = self.download(period).map_err(unreadable)?;
        let text = decode_pdf(&bytes).map_err(unreadable)?;
        let lines = LineStream::from_text(&text);
        debug!(stage = "monthly", %period, lines = lines.len(), "monthly report decoded");
        Ok(lines)
    }
}

/// Renders PDF bytes to plain text.
///
/// Bodies that do not start with the PDF signature are rejected before
/// decoding; servers answer unpublished months with an HTML page as often
/// as with a 404.
pub fn decode_pdf(bytes: &[u8]) -> Result<String, UnreadableCause> {
    if !bytes.starts_with(PDF_SIGNATURE) {
        return Err(UnreadableCause::NotPdf);
    }
    // pdf-extract panics on some malformed inputs instead of returning Err.
    match quietly_catch_unwind(|| pdf_extract::extract_text_from_mem(bytes)) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(UnreadableCause::Decode(e.to_string())),
        Err(message) => Err(UnreadableCause::Decode(format!("decoder panicked: {}", message))),
    }
}

/// `catch_unwind` with the panic hook silenced for the duration of `f`, so
/// a decoder panic is reported only through the returned error. The hook is
/// process-wide; the CLI decodes on a single thread.
fn quietly_catch_unwind<T>(f: impl FnOnce() -> T + panic::UnwindSafe) -> Result<T, String> {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));
    let result = panic::catch_unwind(f);
    panic::set_hook(previous);

    result.map_err(|payload| {
        payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string())
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::MonthNameLocator;

    #[test]
    fn test_html_error_page_is_not_pdf() {
        let body = b"<!DOCTYPE html><html><body>Page not found</body></html>";
        assert_eq!(decode_pdf(body), Err(UnreadableCause::NotPdf));
    }

    #[test]
    fn test_empty_body_is_not_pdf() {
        assert_eq!(decode_pdf(b""), Err(UnreadableCause::NotPdf));
    }

    #[test]
    fn test_truncated_pdf_is_decode_failure() {
        let result = decode_pdf(b"%PDF-1.4\n%garbage");
        assert!(matches!(result, Err(UnreadableCause::Decode(_))), "got {:?}", result);
    }

    #[test]
    fn test_panic_is_caught_with_message() {
        let result = quietly_catch_unwind(|| -> u32 { panic!("bad xref table") });
        assert_eq!(result, Err("bad xref table".to_string()));
        assert_eq!(quietly_catch_unwind(|| 7), Ok(7));
    }

    #[test]
    fn test_url_comes_from_locator() {
        let source = HttpReportSource::new(
            reqwest::blocking::Client::new(),
            Box::new(MonthNameLocator::new("https://example.test/{month_name}-{year}.pdf")),
        );
        assert_eq!(
            source.url_for(&ReportPeriod::new(2024, 7)),
            "https://example.test/july-2024.pdf"
        );
    }
}
