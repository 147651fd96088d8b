/// Parameter registry for the monthly laboratory summary.
///
/// Defines the canonical list of chemistry parameters read from the
/// monthly report, how each one's row is recognised, and which report field
/// it fills. This is the single source of truth for parameter labels; the
/// extractor walks this table and never hardcodes a label itself.

use crate::model::Field;

// ---------------------------------------------------------------------------
// Label matching
// ---------------------------------------------------------------------------

/// How a report line's leading label is recognised.
///
/// The label is the lower-cased, single-space-joined run of tokens that
/// precede the first numeric token on the line. Patterns are lower-case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelMatch {
    /// Label starts with these words (a whole-word prefix).
    Prefix(&'static str),
    /// Label is exactly these words.
    Exact(&'static str),
    /// Label contains every one of these words, in any order.
    AllWords(&'static [&'static str]),
    /// Label is these words followed only by qualifiers such as
    /// "dissolved", units ("mg/l") or a parenthesised symbol ("(na)").
    /// "sodium mg/l" matches; "sodium adsorption ratio" does not.
    Qualified(&'static str),
}

/// Words that may follow a parameter name without changing what it measures.
const QUALIFIER_WORDS: &[&str] = &["dissolved", "total", "caco3", "ppm"];

fn is_qualifier(word: &str) -> bool {
    QUALIFIER_WORDS.contains(&word) || word.contains('/') || word.starts_with('(')
}

impl LabelMatch {
    pub fn matches(&self, label: &str) -> bool {
        match self {
            LabelMatch::Prefix(prefix) => label
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with(' ')),
            LabelMatch::Exact(exact) => label == *exact,
            LabelMatch::AllWords(words) => {
                let tokens: Vec<&str> = label.split(' ').collect();
                words.iter().all(|w| tokens.contains(w))
            }
            LabelMatch::Qualified(name) => label.strip_prefix(name).is_some_and(|rest| {
                rest.is_empty() || (rest.starts_with(' ') && rest.split_whitespace().all(is_qualifier))
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Parameter metadata
// ---------------------------------------------------------------------------

/// A chemistry parameter read from the monthly report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterSpec {
    /// Canonical parameter name as printed in the report.
    pub name: &'static str,
    /// Predicate tested against each line's leading label.
    pub label: LabelMatch,
    /// Report field populated by this parameter's monthly average.
    pub field: Field,
    /// Unit of the monthly average.
    pub unit: &'static str,
}

/// Parameters read from the monthly summary, in the order the report lists
/// them. When two specs could claim the same line, the earlier one wins.
pub static PARAMETER_SPECS: &[ParameterSpec] = &[
    ParameterSpec {
        name: "Total Hardness",
        // Printed as both "Total Hardness" and "Hardness Total" across releases.
        label: LabelMatch::AllWords(&["total", "hardness"]),
        field: Field::TotalHardness,
        unit: "mg/L CaCO3",
    },
    ParameterSpec {
        name: "Calcium Hardness",
        label: LabelMatch::Prefix("calcium hardness"),
        field: Field::CalciumHardness,
        unit: "mg/L CaCO3",
    },
    ParameterSpec {
        name: "Sulphate Dissolved",
        label: LabelMatch::Qualified("sulphate"),
        field: Field::Sulphate,
        unit: "mg/L",
    },
    ParameterSpec {
        name: "Chloride Dissolved",
        label: LabelMatch::Qualified("chloride"),
        field: Field::Chloride,
        unit: "mg/L",
    },
    ParameterSpec {
        name: "Sodium",
        label: LabelMatch::Qualified("sodium"),
        field: Field::Sodium,
        unit: "mg/L",
    },
];

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
