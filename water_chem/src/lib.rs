//! Water chemistry from a utility's published water quality reports.
//!
//! pH and alkalinity come from the daily status page (today's slot, or
//! yesterday's when today's is not published yet). Hardness, sulphate,
//! chloride and sodium come from the most recent readable monthly
//! laboratory summary PDF. Calcium, magnesium and bicarbonate are derived
//! from those on read.
//!
//! Modules, leaves first:
//! - `numeric`   : decimal token parsing.
//! - `ingest`    : daily page reader, monthly PDF source, line stream.
//! - `parameters`: the table of monthly parameters and their labels.
//! - `extract`   : single-pass parameter extraction from report lines.
//! - `period`    : report periods and period → URL locators.
//! - `resolver`  : lookback over report periods.
//! - `assemble`  : daily + monthly → `WaterReport`.
//! - `model`     : report type, fields and errors.
//! - `zones`, `config`, `logging`, `output`, `verify`: supporting pieces.

pub mod assemble;
pub mod config;
pub mod extract;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod numeric;
pub mod output;
pub mod parameters;
pub mod period;
pub mod resolver;
pub mod verify;
pub mod zones;
