//! Field extraction from a rendered Google Scholar profile table.
//!
//! The profile page renders one `<tr class="gsc_a_tr">` per publication:
//! the title link and two gray lines (authors, venue) in `td.gsc_a_t`, the
//! citation link in `td.gsc_a_c` and the year in `td.gsc_a_y`. Rows are
//! first captured as [`RowSnapshot`]s so that everything downstream works on
//! plain text and never touches the document again.

use crate::error::{ExportError, Result};
use crate::text::{leading_u32, normalize, normalize_opt, YearFinder};
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

/// Default Google Scholar URL, used to absolutize relative links
pub const DEFAULT_SCHOLAR_URL: &str = "https://scholar.google.com";

/// Text of one rendered publication row, exactly as located on the page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowSnapshot {
    pub title: String,
    pub authors: String,
    pub venue: String,
    pub year_column: String,
    /// Citation link text; `None` when the row has no citation link
    pub citation_text: Option<String>,
    pub view_href: String,
    pub cites_href: String,
}

/// A publication record as read from the page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Article title
    pub title: String,
    /// Authors, comma-separated, possibly truncated with an ellipsis
    pub authors: String,
    /// Free-text venue line
    pub venue: String,
    /// Publication year; empty when neither the year column nor the venue has one
    pub year: String,
    /// Number of citations (0 when the row has no citation link)
    pub citation_count: u32,
    /// Absolute URL of the record detail view
    pub view_url: String,
    /// Absolute URL of the citing-works listing
    pub cites_url: String,
}

/// Turns [`RowSnapshot`]s into [`RawRecord`]s.
#[derive(Debug, Clone)]
pub struct RecordExtractor {
    base: Url,
    years: YearFinder,
}

impl RecordExtractor {
    pub fn new(base: Url) -> Result<Self> {
        Ok(Self {
            base,
            years: YearFinder::new()?,
        })
    }

    /// Build the raw record for one row.
    ///
    /// The year column wins; otherwise the first 19xx/20xx token in the venue
    /// is used. A missing citation link counts as zero citations.
    pub fn extract(&self, row: &RowSnapshot) -> RawRecord {
        let venue = normalize(&row.venue);

        let year_column = normalize(&row.year_column);
        let year = if year_column.is_empty() {
            self.years.first(&venue).unwrap_or_default().to_string()
        } else {
            year_column
        };

        let citation_count = row
            .citation_text
            .as_deref()
            .map(normalize)
            .and_then(|t| leading_u32(&t))
            .unwrap_or(0);

        RawRecord {
            title: normalize(&row.title),
            authors: normalize(&row.authors),
            venue,
            year,
            citation_count,
            view_url: absolutize(&self.base, &row.view_href),
            cites_url: absolutize(&self.base, &row.cites_href),
        }
    }

    pub fn extract_all(&self, rows: &[RowSnapshot]) -> Vec<RawRecord> {
        rows.iter().map(|row| self.extract(row)).collect()
    }
}

/// Resolve an href against the page origin; unparseable hrefs are kept verbatim
pub fn absolutize(base: &Url, href: &str) -> String {
    let href = href.trim();
    if href.is_empty() {
        return String::new();
    }
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Compiled selectors for the profile publications table
#[derive(Debug, Clone)]
pub struct ProfileSelectors {
    row: Selector,
    title: Selector,
    gray: Selector,
    year: Selector,
    cites: Selector,
}

impl ProfileSelectors {
    pub fn new() -> Result<Self> {
        Ok(Self {
            row: parse_selector("tr.gsc_a_tr")?,
            title: parse_selector("td.gsc_a_t a.gsc_a_at")?,
            gray: parse_selector("td.gsc_a_t .gs_gray")?,
            year: parse_selector("td.gsc_a_y")?,
            cites: parse_selector("td.gsc_a_c a.gsc_a_ac")?,
        })
    }

    pub fn row(&self) -> &Selector {
        &self.row
    }
}

/// Parse a CSS selector, mapping failures to [`ExportError::Parse`]
pub fn parse_selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| ExportError::Parse(format!("selector '{}': {}", css, e)))
}

/// Collected, normalized text of an element
pub fn element_text(elem: ElementRef<'_>) -> String {
    normalize(&elem.text().collect::<String>())
}

/// Capture one row's text fields
pub fn snapshot_row(row: ElementRef<'_>, selectors: &ProfileSelectors) -> RowSnapshot {
    let title_link = row.select(&selectors.title).next();
    let mut gray = row.select(&selectors.gray);
    let authors = gray.next().map(element_text).unwrap_or_default();
    let venue = gray.next().map(element_text).unwrap_or_default();
    let year_column = row
        .select(&selectors.year)
        .next()
        .map(element_text)
        .unwrap_or_default();
    let cite_link = row.select(&selectors.cites).next();

    RowSnapshot {
        title: title_link.map(element_text).unwrap_or_default(),
        authors,
        venue,
        year_column,
        // An empty citation link means "no citations yet"
        citation_text: cite_link.map(element_text).filter(|t| !t.is_empty()),
        view_href: normalize_opt(title_link.and_then(|a| a.value().attr("href"))),
        cites_href: normalize_opt(cite_link.and_then(|a| a.value().attr("href"))),
    }
}

/// Capture every publication row currently present in the document
pub fn snapshot_rows(document: &Html, selectors: &ProfileSelectors) -> Vec<RowSnapshot> {
    let rows: Vec<RowSnapshot> = document
        .select(selectors.row())
        .map(|row| snapshot_row(row, selectors))
        .collect();
    debug!(count = rows.len(), "Captured profile rows");
    rows
}

/// Parse a profile page and return its publication records.
///
/// # Arguments
///
/// * `html` - Profile page HTML
/// * `base` - Origin used to absolutize relative links
pub fn parse_profile_rows(html: &str, base: &Url) -> Result<Vec<RawRecord>> {
    let document = Html::parse_document(html);
    let selectors = ProfileSelectors::new()?;
    let extractor = RecordExtractor::new(base.clone())?;
    Ok(extractor.extract_all(&snapshot_rows(&document, &selectors)))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const PROFILE_HTML: &str = r#"
<html><body>
<table id="gsc_a_t"><tbody id="gsc_a_b">
<tr class="gsc_a_tr">
  <td class="gsc_a_t">
    <a href="/citations?view_op=view_citation&amp;citation_for_view=abc:1" class="gsc_a_at">Plasmonic   sensors</a>
    <div class="gs_gray">A Rahman, SM Choudhury, ...</div>
    <div class="gs_gray">Applied Physics Reviews 6&nbsp;(4), 41308<span class="gs_oph">, 2019</span></div>
  </td>
  <td class="gsc_a_c"><a href="https://scholar.google.com/scholar?cites=111" class="gsc_a_ac gs_ibl">20</a></td>
  <td class="gsc_a_y"><span class="gsc_a_h gsc_a_hc gs_ibl">2019</span></td>
</tr>
<tr class="gsc_a_tr">
  <td class="gsc_a_t">
    <a href="/citations?view_op=view_citation&amp;citation_for_view=abc:2" class="gsc_a_at">Robot arms</a>
    <div class="gs_gray">B Author</div>
    <div class="gs_gray">IEEE International Conference on Robotics 2018, 45-50</div>
  </td>
  <td class="gsc_a_c"><a href="" class="gsc_a_ac gs_ibl"></a></td>
  <td class="gsc_a_y"><span class="gsc_a_h gsc_a_hc gs_ibl"></span></td>
</tr>
</tbody></table>
</body></html>
"#;

    fn base() -> Url {
        Url::parse(DEFAULT_SCHOLAR_URL).expect("valid base url")
    }

    #[test]
    fn test_parse_profile_rows() -> Result<()> {
        let records = parse_profile_rows(PROFILE_HTML, &base())?;
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.title, "Plasmonic sensors");
        assert_eq!(first.authors, "A Rahman, SM Choudhury, ...");
        assert_eq!(first.venue, "Applied Physics Reviews 6 (4), 41308, 2019");
        assert_eq!(first.year, "2019");
        assert_eq!(first.citation_count, 20);
        assert_eq!(
            first.view_url,
            "https://scholar.google.com/citations?view_op=view_citation&citation_for_view=abc:1"
        );
        assert_eq!(first.cites_url, "https://scholar.google.com/scholar?cites=111");
        Ok(())
    }

    #[test]
    fn test_missing_citation_link_counts_zero() -> Result<()> {
        let records = parse_profile_rows(PROFILE_HTML, &base())?;
        let second = &records[1];
        assert_eq!(second.citation_count, 0);
        assert_eq!(second.cites_url, "");
        Ok(())
    }

    #[test]
    fn test_year_resolved_from_venue() -> Result<()> {
        let records = parse_profile_rows(PROFILE_HTML, &base())?;
        assert_eq!(records[1].year, "2018");
        Ok(())
    }

    #[test]
    fn test_extract_from_snapshot() -> Result<()> {
        let extractor = RecordExtractor::new(base())?;
        let row = RowSnapshot {
            title: " A\u{00A0}title ".to_string(),
            venue: "Journal of Things".to_string(),
            citation_text: Some("12*".to_string()),
            ..Default::default()
        };
        let record = extractor.extract(&row);
        assert_eq!(record.title, "A title");
        assert_eq!(record.year, "");
        assert_eq!(record.citation_count, 12);
        assert_eq!(record.view_url, "");
        Ok(())
    }

    #[test]
    fn test_absolutize_keeps_absolute_urls() {
        let base = base();
        assert_eq!(absolutize(&base, "https://example.org/x"), "https://example.org/x");
        assert_eq!(absolutize(&base, "/citations?x=1"), "https://scholar.google.com/citations?x=1");
        assert_eq!(absolutize(&base, "  "), "");
    }

    #[test]
    fn test_parse_empty_html() -> Result<()> {
        let records = parse_profile_rows("<html><body></body></html>", &base())?;
        assert!(records.is_empty());
        Ok(())
    }
}
