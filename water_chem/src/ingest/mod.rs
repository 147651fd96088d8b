/// Retrieval and decoding of the two published sources.
///
/// Submodules:
/// - `daily`  : daily status page (HTML) and the today/yesterday reader.
/// - `monthly`: monthly laboratory summary (PDF) fetch and text rendering.
/// - `lines`  : the line stream a decoded monthly report is read through.

pub mod daily;
pub mod lines;
pub mod monthly;
