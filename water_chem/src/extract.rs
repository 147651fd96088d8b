//! Monthly report field extraction.
//!
//! The monthly summary's layout drifts from release to release (fixed-width
//! column blocks in older issues, "label then numbers" rows in newer ones),
//! so extraction anchors on each parameter's own label and reads a value
//! from the same line:
//!
//! ```text
//! Calcium Hardness   mg/L   30   30   142   142
//!                           ^^^^^^^   ^^^   ^^^
//!                            count    avg   median
//! ```
//!
//! The first numeric token on these rows is the monthly sample count and
//! the next column is the monthly average. Some releases print the count
//! twice (samples taken / samples reported): a row of four or more numbers
//! whose first two are equal has that doubled count column, and the second
//! count is skipped. Shorter rows are read literally. That column choice
//! lives in [`ValueColumn`] so a layout change is a one-line policy change.
//!
//! Extraction is a single forward pass with no backtracking. Each parameter
//! moves through `Seeking → Matched | Extracted` exactly once; a parameter
//! whose row has too few numbers ends as `Matched` (not found) and later
//! rows carrying the same label are ignored.

use rust_decimal::Decimal;
use tracing::{debug, trace};

use crate::ingest::lines::LineStream;
use crate::model::Field;
use crate::numeric::{is_numeric, parse_decimal};
use crate::parameters::ParameterSpec;

// ---------------------------------------------------------------------------
// Value column policy
// ---------------------------------------------------------------------------

/// Which numeric column on a matched row holds the value, counted from
/// zero among the row's numeric tokens only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueColumn {
    index: usize,
    merge_repeated_count: bool,
}

/// Count column first, then the monthly average.
pub const MONTHLY_AVERAGE_COLUMN: ValueColumn = ValueColumn::after_count(1);

impl ValueColumn {
    /// The `index`-th numeric token, taken literally.
    #[cfg(test)]
    pub const fn nth(index: usize) -> Self {
        Self {
            index,
            merge_repeated_count: false,
        }
    }

    /// The `index`-th column, counting a doubled count as one column.
    pub const fn after_count(index: usize) -> Self {
        Self {
            index,
            merge_repeated_count: true,
        }
    }

    pub fn pick(self, numbers: &[Decimal]) -> Option<Decimal> {
        let index = if self.merge_repeated_count && has_doubled_count(numbers) {
            self.index + 1
        } else {
            self.index
        };
        numbers.get(index).copied()
    }
}

/// Count, count, average, median: at least four numbers, first two equal.
fn has_doubled_count(numbers: &[Decimal]) -> bool {
    numbers.len() >= 4 && numbers[0] == numbers[1]
}

// ---------------------------------------------------------------------------
// Per-parameter state
// ---------------------------------------------------------------------------

/// Where a single parameter ended up after the pass.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionState {
    /// No line carried this parameter's label.
    Seeking,
    /// The label was found but the row had no value in the chosen column.
    Matched { line_number: usize, line: String },
    /// The label was found and the value parsed.
    Extracted {
        value: Decimal,
        line_number: usize,
        line: String,
    },
}

impl ExtractionState {
    pub fn value(&self) -> Option<Decimal> {
        match self {
            ExtractionState::Extracted { value, .. } => Some(*value),
            _ => None,
        }
    }

    /// The report line that claimed this parameter, if any.
    pub fn source_line(&self) -> Option<&str> {
        match self {
            ExtractionState::Seeking => None,
            ExtractionState::Matched { line, .. } | ExtractionState::Extracted { line, .. } => {
                Some(line)
            }
        }
    }

    fn is_seeking(&self) -> bool {
        matches!(self, ExtractionState::Seeking)
    }
}

/// One parameter's spec together with its final state.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterOutcome {
    pub spec: ParameterSpec,
    pub state: ExtractionState,
}

/// Result of one extraction pass: every spec's field maps to a value or to
/// "not found". Unmatched parameters are a normal outcome, not an error.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PartialResult {
    pub outcomes: Vec<ParameterOutcome>,
}

impl PartialResult {
    pub fn value(&self, field: Field) -> Option<Decimal> {
        self.outcomes
            .iter()
            .find(|o| o.spec.field == field)
            .and_then(|o| o.state.value())
    }

    /// `(field, value)` pairs for every spec, in table order.
    pub fn values(&self) -> impl Iterator<Item = (Field, Option<Decimal>)> + '_ {
        self.outcomes.iter().map(|o| (o.spec.field, o.state.value()))
    }

    pub fn found_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.state.value().is_some()).count()
    }

    /// Fields whose spec produced no value.
    pub fn missing(&self) -> Vec<Field> {
        self.outcomes
            .iter()
            .filter(|o| o.state.value().is_none())
            .map(|o| o.spec.field)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Extractor
// ---------------------------------------------------------------------------

pub struct ParameterExtractor<'a> {
    specs: &'a [ParameterSpec],
    column: ValueColumn,
}

impl<'a> ParameterExtractor<'a> {
    pub fn new(specs: &'a [ParameterSpec]) -> Self {
        Self {
            specs,
            column: MONTHLY_AVERAGE_COLUMN,
        }
    }

    #[cfg(test)]
    pub fn with_column(mut self, column: ValueColumn) -> Self {
        self.column = column;
        self
    }

    /// Scans `lines` forward from its current position once.
    ///
    /// Stops at the end of the stream or as soon as no parameter is still
    /// being sought, whichever comes first.
    pub fn extract(&self, lines: &mut LineStream) -> PartialResult {
        let mut outcomes: Vec<ParameterOutcome> = self
            .specs
            .iter()
            .map(|spec| ParameterOutcome {
                spec: *spec,
                state: ExtractionState::Seeking,
            })
            .collect();

        while outcomes.iter().any(|o| o.state.is_seeking()) {
            let line_number = lines.position();
            let Some(line) = lines.next_line() else {
                break;
            };

            let row = Row::parse(line);
            let Some(outcome) = outcomes
                .iter_mut()
                .find(|o| o.state.is_seeking() && o.spec.label.matches(&row.label))
            else {
                continue;
            };

            outcome.state = match self.column.pick(&row.numbers) {
                Some(value) => {
                    debug!(
                        stage = "monthly",
                        parameter = outcome.spec.name,
                        line_number,
                        %value,
                        "parameter extracted"
                    );
                    ExtractionState::Extracted {
                        value,
                        line_number,
                        line: line.to_string(),
                    }
                }
                None => {
                    debug!(
                        stage = "monthly",
                        parameter = outcome.spec.name,
                        line_number,
                        numeric_tokens = row.numbers.len(),
                        "label matched but row has no value in the average column"
                    );
                    ExtractionState::Matched {
                        line_number,
                        line: line.to_string(),
                    }
                }
            };
        }

        trace!(
            stage = "monthly",
            stopped_at = lines.position(),
            exhausted = lines.is_exhausted(),
            "extraction pass finished"
        );
        PartialResult { outcomes }
    }
}

/// A tokenized report line: the leading label and every numeric token.
struct Row {
    label: String,
    numbers: Vec<Decimal>,
}

impl Row {
    fn parse(line: &str) -> Self {
        let lowered = line.to_lowercase();
        let tokens: Vec<&str> = lowered.split_whitespace().collect();
        let label = tokens
            .iter()
            .take_while(|t| !is_numeric(t))
            .copied()
            .collect::<Vec<_>>()
            .join(" ");
        let numbers = tokens.iter().filter_map(|t| parse_decimal(t)).collect();
        Self { label, numbers }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
