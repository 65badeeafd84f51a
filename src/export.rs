//! Output files: general CSV, PoP-compatible CSV and the BibTeX link list.

use crate::error::{ExportError, Result};
use crate::metrics::format_cites_per_year;
use crate::profile::RawRecord;
use crate::record::EnrichedRecord;
use crate::table::{serialize, Tabular};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tracing::info;

/// Column order of the general CSV
pub const GENERAL_COLUMNS: &[&str] = &[
    "title", "authors", "venue", "year", "citation_count", "citation_for_view_url", "cites_url",
];

/// Column order expected by Publish or Perish imports
pub const POP_COLUMNS: &[&str] = &[
    "Cites", "Authors", "Title", "Year", "Source", "Publisher", "ArticleURL", "CitesURL",
    "GSRank", "QueryDate", "Type", "DOI", "ISSN", "CitationURL", "Volume", "Issue",
    "StartPage", "EndPage", "ECC", "CitesPerYear", "CitesPerAuthor", "AuthorCount", "Age",
    "Abstract", "FullTextURL", "RelatedURL",
];

/// Fixed name of the PoP-compatible export
pub const POP_FILE_NAME: &str = "PoPCites.csv";

const CSV_MIME: &str = "text/csv;charset=utf-8";
const TEXT_MIME: &str = "text/plain;charset=utf-8";

impl Tabular for RawRecord {
    fn cell(&self, column: &str) -> Option<String> {
        let value = match column {
            "title" => self.title.clone(),
            "authors" => self.authors.clone(),
            "venue" => self.venue.clone(),
            "year" => self.year.clone(),
            "citation_count" => self.citation_count.to_string(),
            "citation_for_view_url" => self.view_url.clone(),
            "cites_url" => self.cites_url.clone(),
            _ => return None,
        };
        Some(value)
    }
}

impl Tabular for EnrichedRecord {
    fn cell(&self, column: &str) -> Option<String> {
        let number = |n: Option<u32>| n.map(|v| v.to_string());
        match column {
            "Cites" => Some(self.raw.citation_count.to_string()),
            "Authors" => Some(self.raw.authors.clone()),
            "Title" => Some(self.raw.title.clone()),
            "Year" => self.year_number.map(|y| y.to_string()),
            "Source" => Some(self.venue.source_name.clone()),
            "CitesURL" => Some(self.raw.cites_url.clone()),
            "GSRank" => Some(self.rank.to_string()),
            "QueryDate" => Some(self.query_date.clone()),
            "Type" => Some(self.venue.publication_type.label().to_string()),
            "CitationURL" => Some(self.raw.view_url.clone()),
            "Volume" => number(self.venue.volume),
            "Issue" => number(self.venue.issue),
            "StartPage" => number(self.venue.start_page),
            "EndPage" => number(self.venue.end_page),
            "ECC" => Some(self.ecc.to_string()),
            "CitesPerYear" => self.metrics.cites_per_year.map(format_cites_per_year),
            "CitesPerAuthor" => number(self.metrics.cites_per_author),
            "AuthorCount" => number(self.author_count),
            "Age" => number(self.age),
            // Publisher, ArticleURL, DOI, ISSN, Abstract, FullTextURL and
            // RelatedURL are not rendered on the profile page.
            _ => None,
        }
    }
}

/// A file ready to be handed to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub file_name: String,
    pub mime: &'static str,
    pub contents: String,
}

impl ExportFile {
    /// Write the file into `dir`, creating the directory if needed
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.contents)?;
        info!(path = %path.display(), bytes = self.contents.len(), "Saved export");
        Ok(path)
    }
}

/// Timestamp used in export file names: `YYYY-MM-DD_HHMMSS`
pub fn file_stamp(time: DateTime<Local>) -> String {
    time.format("%Y-%m-%d_%H%M%S").to_string()
}

/// General CSV of the raw table
pub fn general_csv(records: &[RawRecord], time: DateTime<Local>) -> Result<ExportFile> {
    ensure_rows(records.len())?;
    Ok(ExportFile {
        file_name: format!("google_scholar_publications_{}.csv", file_stamp(time)),
        mime: CSV_MIME,
        contents: serialize(records, GENERAL_COLUMNS)?,
    })
}

/// PoP-compatible CSV of enriched records
pub fn pop_csv(records: &[EnrichedRecord]) -> Result<ExportFile> {
    ensure_rows(records.len())?;
    Ok(ExportFile {
        file_name: POP_FILE_NAME.to_string(),
        mime: CSV_MIME,
        contents: serialize(records, POP_COLUMNS)?,
    })
}

/// Text file handing a BibTeX export link to another tool
pub fn bibtex_link_file(link: &str, selected_rows: usize, time: DateTime<Local>) -> ExportFile {
    let contents = [
        "# Google Scholar BibTeX export link (generated via Scholar UI Export menu)".to_string(),
        format!("# Selected rows (loaded/visible): {}", selected_rows),
        link.to_string(),
        String::new(),
    ]
    .join("\n");

    ExportFile {
        file_name: format!("google_scholar_bibtex_links_{}.txt", file_stamp(time)),
        mime: TEXT_MIME,
        contents,
    }
}

fn ensure_rows(count: usize) -> Result<()> {
    if count == 0 {
        return Err(ExportError::MissingInput(
            "No publication rows found. Make sure the publications table is visible.".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Enricher, QueryStamp};
    use crate::table::parse_table;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn time() -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2024, 3, 5, 9, 7, 1)
            .single()
            .expect("unambiguous local time")
    }

    fn record() -> RawRecord {
        RawRecord {
            title: "Plasmonic sensors, revisited".to_string(),
            authors: "A Rahman, B Chen, C Diaz, D Evans".to_string(),
            venue: "Applied Physics Reviews 6 (4), 41308".to_string(),
            year: "2019".to_string(),
            citation_count: 20,
            view_url: "https://scholar.google.com/citations?v=1".to_string(),
            cites_url: "https://scholar.google.com/scholar?cites=1".to_string(),
        }
    }

    #[test]
    fn test_general_csv() -> Result<()> {
        let file = general_csv(&[record()], time())?;
        assert_eq!(file.file_name, "google_scholar_publications_2024-03-05_090701.csv");
        let rows = parse_table(&file.contents)?;
        assert_eq!(rows[0], GENERAL_COLUMNS.iter().map(|c| c.to_string()).collect::<Vec<_>>());
        assert_eq!(rows[1][0], "Plasmonic sensors, revisited");
        assert_eq!(rows[1][4], "20");
        assert!(!file.contents.ends_with('\n'));
        Ok(())
    }

    #[test]
    fn test_pop_csv_columns() -> Result<()> {
        let enricher = Enricher::new(QueryStamp::at(time()))?;
        let enriched = enricher.enrich_all(&[record()]);
        let file = pop_csv(&enriched)?;
        assert_eq!(file.file_name, "PoPCites.csv");

        let rows = parse_table(&file.contents)?;
        assert_eq!(rows[0].len(), 26);
        let cell = |name: &str| {
            let idx = POP_COLUMNS.iter().position(|c| *c == name).expect("known column");
            rows[1][idx].clone()
        };
        assert_eq!(cell("Cites"), "20");
        assert_eq!(cell("Source"), "Applied Physics Reviews");
        assert_eq!(cell("GSRank"), "1");
        assert_eq!(cell("QueryDate"), "2024-03-05 09:07:01");
        assert_eq!(cell("Type"), "Journal article");
        assert_eq!(cell("Volume"), "6");
        assert_eq!(cell("Issue"), "4");
        assert_eq!(cell("StartPage"), "41308");
        assert_eq!(cell("EndPage"), "41308");
        assert_eq!(cell("ECC"), "20");
        assert_eq!(cell("CitesPerYear"), "4.00");
        assert_eq!(cell("CitesPerAuthor"), "5");
        assert_eq!(cell("AuthorCount"), "4");
        assert_eq!(cell("Age"), "5");
        for empty in ["Publisher", "ArticleURL", "DOI", "ISSN", "Abstract", "FullTextURL", "RelatedURL"] {
            assert_eq!(cell(empty), "", "{empty}");
        }
        Ok(())
    }

    #[test]
    fn test_empty_exports_are_refused() {
        assert!(matches!(general_csv(&[], time()), Err(ExportError::MissingInput(_))));
        assert!(matches!(pop_csv(&[]), Err(ExportError::MissingInput(_))));
    }

    #[test]
    fn test_bibtex_link_file() {
        let file = bibtex_link_file("https://scholar.google.com/export?bib", 12, time());
        assert_eq!(file.file_name, "google_scholar_bibtex_links_2024-03-05_090701.txt");
        assert_eq!(file.mime, "text/plain;charset=utf-8");
        let lines: Vec<&str> = file.contents.lines().collect();
        assert!(lines[0].starts_with('#'));
        assert_eq!(lines[1], "# Selected rows (loaded/visible): 12");
        assert_eq!(lines[2], "https://scholar.google.com/export?bib");
        assert!(file.contents.ends_with('\n'));
    }

    #[test]
    fn test_write_to_creates_directory() -> Result<()> {
        let dir = TempDir::new()?;
        let target = dir.path().join("nested");
        let file = bibtex_link_file("https://example.org", 1, time());
        let path = file.write_to(&target)?;
        assert_eq!(std::fs::read_to_string(path)?, file.contents);
        Ok(())
    }
}
