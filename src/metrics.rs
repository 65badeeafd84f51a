//! Citation metrics derived from a record's citations, authors and year.
//!
//! Every derived value is optional: an unknown or zero denominator yields an
//! empty cell instead of a division.

use crate::text::normalize;
use serde::{Deserialize, Serialize};

/// Author list tokens that only mark a truncated list
const ELLIPSIS_TOKENS: &[&str] = &["...", "…"];

/// Derived per-year and per-author citation figures
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    /// Citations per year of age, rounded to two decimals
    pub cites_per_year: Option<f64>,
    /// Citations per author, rounded to the nearest integer
    pub cites_per_author: Option<u32>,
}

/// Number of named authors, or `None` when the list is empty.
///
/// Ellipsis-only tokens from truncated lists are not authors.
pub fn author_count(authors: &str) -> Option<u32> {
    let count = normalize(authors)
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty() && !ELLIPSIS_TOKENS.contains(name))
        .count();
    u32::try_from(count).ok().filter(|&n| n > 0)
}

/// Years since publication, floored at 1.
pub fn age(year: Option<i32>, query_year: i32) -> Option<u32> {
    let year = year?;
    u32::try_from(query_year.saturating_sub(year).max(1)).ok()
}

/// Compute citations per year and per author.
///
/// # Arguments
///
/// * `citations` - Citation count of the record
/// * `author_count` - Number of authors, if known
/// * `age` - Record age in years, if known
pub fn derive_metrics(citations: u32, author_count: Option<u32>, age: Option<u32>) -> DerivedMetrics {
    let cites_per_year = age
        .filter(|&a| a > 0)
        .map(|a| round2(f64::from(citations) / f64::from(a)));

    // Integer rounding, halves round up
    let cites_per_author = author_count.filter(|&n| n > 0).map(|n| {
        let (c, n) = (u64::from(citations), u64::from(n));
        ((2 * c + n) / (2 * n)) as u32
    });

    DerivedMetrics {
        cites_per_year,
        cites_per_author,
    }
}

/// Estimated total citations. Citation-metrics exports define ECC as the
/// record's own citation count.
pub fn estimated_citations(citations: u32) -> u32 {
    citations
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Render a citations-per-year figure the way metrics tools expect (`4.00`)
pub fn format_cites_per_year(value: f64) -> String {
    format!("{:.2}", value)
}
