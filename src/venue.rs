//! Venue heuristics: publication type, source name, volume, issue and pages.
//!
//! Venue lines follow no fixed grammar across publishers. The two dominant
//! shapes are journal lines (`Name Vol (Issue), Pages`) and conference lines
//! (`Name, long descriptive string`). Each field is read by an ordered chain
//! of rules; the first rule that matches wins and a chain where nothing
//! matches leaves the field empty. Nothing here fails on odd input.

use crate::error::{ExportError, Result};
use crate::text::{normalize, YearFinder};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::trace;

/// Words that mark a venue as a conference venue
const CONFERENCE_MARKERS: &[&str] = &["conference", "proceedings", "symposium", "workshop"];

/// Publication type as understood by citation-metrics tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PublicationType {
    #[default]
    JournalArticle,
    ConferencePaper,
}

impl PublicationType {
    /// Classify a venue line
    pub fn from_venue(venue: &str) -> Self {
        let lower = normalize(venue).to_lowercase();
        if CONFERENCE_MARKERS.iter().any(|m| lower.contains(m)) {
            Self::ConferencePaper
        } else {
            Self::JournalArticle
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::JournalArticle => "Journal article",
            Self::ConferencePaper => "Conference paper",
        }
    }
}

impl fmt::Display for PublicationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Structured fields derived from a venue line
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VenueFields {
    pub publication_type: PublicationType,
    pub source_name: String,
    pub volume: Option<u32>,
    pub issue: Option<u32>,
    pub start_page: Option<u32>,
    pub end_page: Option<u32>,
}

/// One heuristic in a rule chain
pub trait VenueRule: Copy + fmt::Debug {
    type Output;

    /// Pattern the rule matches with
    fn pattern(self) -> &'static str;

    /// Read the rule's output from `text`, `None` when the rule does not apply
    fn apply(self, re: &Regex, text: &str) -> Option<Self::Output>;
}

/// Volume and issue rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeRule {
    /// `6 (4)`: volume 6, issue 4
    VolumeIssue,
    /// `181,`: volume 181, no issue
    VolumeBeforeComma,
}

impl VolumeRule {
    pub const ORDER: [Self; 2] = [Self::VolumeIssue, Self::VolumeBeforeComma];
}

impl VenueRule for VolumeRule {
    type Output = (u32, Option<u32>);

    fn pattern(self) -> &'static str {
        match self {
            Self::VolumeIssue => r"\b([0-9]+)\s*\(\s*([0-9]+)\s*\)",
            Self::VolumeBeforeComma => r"(?:^|[^0-9])([0-9]{1,5})\s*,",
        }
    }

    fn apply(self, re: &Regex, text: &str) -> Option<Self::Output> {
        let caps = re.captures(text)?;
        let volume = caps.get(1)?.as_str().parse().ok()?;
        match self {
            Self::VolumeIssue => {
                let issue = caps.get(2)?.as_str().parse().ok()?;
                Some((volume, Some(issue)))
            }
            Self::VolumeBeforeComma => Some((volume, None)),
        }
    }
}

/// Source-name rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceRule {
    /// Words before a numeric tail: `Applied Physics Reviews 6 (4), 41308`.
    /// Never applies to text mentioning "conference".
    NumericTail,
    /// Everything before a trailing `, <n>` or `, <n>-<n>` chunk
    TrailingPages,
}

impl SourceRule {
    pub const ORDER: [Self; 2] = [Self::NumericTail, Self::TrailingPages];
}

impl VenueRule for SourceRule {
    type Output = String;

    fn pattern(self) -> &'static str {
        match self {
            Self::NumericTail => r"^(.+?)\s+[0-9]+\s*(?:\(|,|$)",
            Self::TrailingPages => r",\s*[0-9]+(?:\s*[-–]\s*[0-9]+)?\s*$",
        }
    }

    fn apply(self, re: &Regex, text: &str) -> Option<Self::Output> {
        match self {
            Self::NumericTail => {
                if text.to_lowercase().contains("conference") {
                    return None;
                }
                let caps = re.captures(text)?;
                Some(normalize(caps.get(1)?.as_str()))
            }
            Self::TrailingPages => {
                let m = re.find(text)?;
                Some(normalize(&text[..m.start()]))
            }
        }
    }
}

/// Page rules, applied to the last comma-delimited segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRule {
    /// `45-50` or `45–50`
    Range,
    /// A bare number, used as both start and end (article numbers)
    Single,
}

impl PageRule {
    pub const ORDER: [Self; 2] = [Self::Range, Self::Single];
}

impl VenueRule for PageRule {
    type Output = (u32, u32);

    fn pattern(self) -> &'static str {
        match self {
            Self::Range => r"([0-9]+)\s*[-–]\s*([0-9]+)",
            Self::Single => r"\b([0-9]+)\b",
        }
    }

    fn apply(self, re: &Regex, text: &str) -> Option<Self::Output> {
        let caps = re.captures(text)?;
        let start: u32 = caps.get(1)?.as_str().parse().ok()?;
        match self {
            Self::Range => {
                let end: u32 = caps.get(2)?.as_str().parse().ok()?;
                // A reversed range keeps the start page only
                Some((start, end.max(start)))
            }
            Self::Single => Some((start, start)),
        }
    }
}

/// Ordered rules with their compiled patterns
#[derive(Debug, Clone)]
pub struct RuleChain<R: VenueRule> {
    rules: Vec<(R, Regex)>,
}

impl<R: VenueRule> RuleChain<R> {
    pub fn new(order: &[R]) -> Result<Self> {
        let rules = order
            .iter()
            .map(|&rule| {
                Regex::new(rule.pattern())
                    .map(|re| (rule, re))
                    .map_err(|e| ExportError::Parse(format!("{:?}: {}", rule, e)))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// Output of the first rule that applies
    pub fn first_match(&self, text: &str) -> Option<R::Output> {
        self.rules.iter().find_map(|(rule, re)| {
            let out = rule.apply(re, text);
            if out.is_some() {
                trace!(rule = ?rule, text, "Venue rule matched");
            }
            out
        })
    }
}

/// Venue line parser
#[derive(Debug, Clone)]
pub struct VenueParser {
    years: YearFinder,
    empty_parens: Regex,
    volume: RuleChain<VolumeRule>,
    source: RuleChain<SourceRule>,
    pages: RuleChain<PageRule>,
}

impl VenueParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            years: YearFinder::new()?,
            empty_parens: Regex::new(r"\(\s*\)").map_err(|e| ExportError::Parse(e.to_string()))?,
            volume: RuleChain::new(&VolumeRule::ORDER)?,
            source: RuleChain::new(&SourceRule::ORDER)?,
            pages: RuleChain::new(&PageRule::ORDER)?,
        })
    }

    /// Venue text without year tokens, the empty parentheses they leave
    /// behind, or a leading year. Commas next to a removed year stay.
    fn remove_years(&self, venue: &str, year: &str) -> String {
        let stripped = self.years.strip(&normalize(venue));
        let stripped = normalize(&self.empty_parens.replace_all(&stripped, ""));

        let year = year.trim();
        if !year.is_empty() {
            if let Some(rest) = stripped.strip_prefix(year) {
                return normalize(rest);
            }
        }
        stripped
    }

    /// Year-free venue text with the empty comma segments collapsed
    pub fn strip_years(&self, venue: &str, year: &str) -> String {
        collapse_empty_segments(&self.remove_years(venue, year))
    }

    /// Derive the structured fields of a venue line.
    ///
    /// # Arguments
    ///
    /// * `venue` - Venue line as rendered on the profile page
    /// * `year` - Year already resolved for the record (may be empty)
    pub fn parse(&self, venue: &str, year: &str) -> VenueFields {
        let publication_type = PublicationType::from_venue(venue);
        // `Name 126, 2019` keeps the comma after its volume only here
        let volume_text = self.remove_years(venue, year);
        let text = collapse_empty_segments(&volume_text);
        if text.is_empty() {
            return VenueFields {
                publication_type,
                ..Default::default()
            };
        }

        let (volume, issue) = match self.volume.first_match(&volume_text) {
            Some((volume, issue)) => (Some(volume), issue),
            None => (None, None),
        };

        let source_name = self.source.first_match(&text).unwrap_or_else(|| text.clone());

        let pages = if text.contains(',') {
            text.rsplit(',')
                .next()
                .and_then(|last| self.pages.first_match(last.trim()))
        } else {
            None
        };

        VenueFields {
            publication_type,
            source_name,
            volume,
            issue,
            start_page: pages.map(|(start, _)| start),
            end_page: pages.map(|(_, end)| end),
        }
    }
}

fn collapse_empty_segments(text: &str) -> String {
    normalize(
        &text
            .split(',')
            .filter(|segment| !segment.trim().is_empty())
            .collect::<Vec<_>>()
            .join(","),
    )
}
