//! Derives acceptance criteria from the quantities mentioned in a
//! requirement.
//!
//! This is best-effort annotation: numbers are not range-checked.

use std::sync::LazyLock;

use regex::Regex;

/// Returned when the text mentions no quantities.
pub const FALLBACK_CRITERIA: &str = "Compliance with requirement as specified";

/// At most this many quantities contribute to the criteria.
pub const MAX_CLAUSES: usize = 3;

static QUANTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:\.\d+)?)\s*(days?|years?|cycles?|percent|%|k\b)?")
        .expect("quantity pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    Days,
    Years,
    Cycles,
    Percent,
    Kelvin,
}

impl Unit {
    fn parse(token: &str) -> Option<Self> {
        match token {
            "day" | "days" => Some(Self::Days),
            "year" | "years" => Some(Self::Years),
            "cycle" | "cycles" => Some(Self::Cycles),
            "%" | "percent" => Some(Self::Percent),
            "k" => Some(Self::Kelvin),
            _ => None,
        }
    }

    fn phrase(self, value: &str) -> String {
        match self {
            Self::Days => format!("Duration shall be ≤ {value} days"),
            Self::Years => format!("Lifetime shall be ≥ {value} years"),
            Self::Cycles => format!("Cycle count shall be ≥ {value}"),
            Self::Percent => format!("Performance shall be ≥ {value}%"),
            Self::Kelvin => format!("Temperature condition: {value}K"),
        }
    }
}

/// Builds an acceptance criteria sentence from the first
/// [`MAX_CLAUSES`] quantities in `text`.
///
/// Each quantity is a number optionally followed by a unit (days, years,
/// cycles, percent or kelvin). Clauses are joined with `"; "`. If the text
/// has no numbers, [`FALLBACK_CRITERIA`] is returned.
#[must_use]
pub fn derive_acceptance_criteria(text: &str) -> String {
    let lowered = text.to_lowercase();
    let clauses: Vec<String> = QUANTITY
        .captures_iter(&lowered)
        .take(MAX_CLAUSES)
        .map(|captures| {
            let value = &captures[1];
            captures
                .get(2)
                .and_then(|unit| Unit::parse(unit.as_str()))
                .map_or_else(|| format!("Value shall meet {value}"), |unit| unit.phrase(value))
        })
        .collect();

    if clauses.is_empty() {
        FALLBACK_CRITERIA.to_string()
    } else {
        clauses.join("; ")
    }
}
