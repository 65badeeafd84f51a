//! Enrichment of raw profile records with venue fields and metrics.

use crate::error::Result;
use crate::metrics::{self, DerivedMetrics};
use crate::profile::RawRecord;
use crate::venue::{VenueFields, VenueParser};
use chrono::{DateTime, Datelike, Local};
use serde::{Deserialize, Serialize};

/// Capture time of one export call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryStamp {
    /// `YYYY-MM-DD HH:MM:SS`, local time
    pub date: String,
    pub year: i32,
}

impl QueryStamp {
    pub fn now() -> Self {
        Self::at(Local::now())
    }

    pub fn at(time: DateTime<Local>) -> Self {
        Self {
            date: time.format("%Y-%m-%d %H:%M:%S").to_string(),
            year: time.year(),
        }
    }
}

/// A record with everything citation-metrics exports need
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    pub raw: RawRecord,
    /// Numeric year, when the year text is a number
    pub year_number: Option<i32>,
    pub venue: VenueFields,
    pub author_count: Option<u32>,
    pub age: Option<u32>,
    pub metrics: DerivedMetrics,
    /// Estimated total citations
    pub ecc: u32,
    /// 1-based position in the profile table
    pub rank: usize,
    pub query_date: String,
}

/// Builds [`EnrichedRecord`]s for one export call
#[derive(Debug, Clone)]
pub struct Enricher {
    parser: VenueParser,
    stamp: QueryStamp,
}

impl Enricher {
    pub fn new(stamp: QueryStamp) -> Result<Self> {
        Ok(Self {
            parser: VenueParser::new()?,
            stamp,
        })
    }

    pub fn stamp(&self) -> &QueryStamp {
        &self.stamp
    }

    /// Enrich one record; `rank` is its 1-based table position
    pub fn enrich(&self, raw: &RawRecord, rank: usize) -> EnrichedRecord {
        let year_number = raw.year.trim().parse::<i32>().ok().filter(|&y| y > 0);
        let author_count = metrics::author_count(&raw.authors);
        let age = metrics::age(year_number, self.stamp.year);

        EnrichedRecord {
            raw: raw.clone(),
            year_number,
            venue: self.parser.parse(&raw.venue, &raw.year),
            author_count,
            age,
            metrics: metrics::derive_metrics(raw.citation_count, author_count, age),
            ecc: metrics::estimated_citations(raw.citation_count),
            rank,
            query_date: self.stamp.date.clone(),
        }
    }

    /// Enrich records in table order
    pub fn enrich_all(&self, records: &[RawRecord]) -> Vec<EnrichedRecord> {
        records
            .iter()
            .enumerate()
            .map(|(idx, raw)| self.enrich(raw, idx + 1))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::venue::PublicationType;
    use chrono::TimeZone;

    fn stamp() -> QueryStamp {
        let time = Local
            .with_ymd_and_hms(2024, 3, 5, 9, 7, 1)
            .single()
            .expect("unambiguous local time");
        QueryStamp::at(time)
    }

    fn raw(venue: &str, year: &str, authors: &str, citations: u32) -> RawRecord {
        RawRecord {
            title: "A title".to_string(),
            authors: authors.to_string(),
            venue: venue.to_string(),
            year: year.to_string(),
            citation_count: citations,
            ..Default::default()
        }
    }

    #[test]
    fn test_query_stamp_format() {
        let stamp = stamp();
        assert_eq!(stamp.date, "2024-03-05 09:07:01");
        assert_eq!(stamp.year, 2024);
    }

    #[test]
    fn test_enrich_journal_record() -> Result<()> {
        let enricher = Enricher::new(stamp())?;
        let record = enricher.enrich(
            &raw("Applied Physics Reviews 6 (4), 41308", "2019", "A, B, C, D", 20),
            1,
        );
        assert_eq!(record.year_number, Some(2019));
        assert_eq!(record.age, Some(5));
        assert_eq!(record.author_count, Some(4));
        assert_eq!(record.metrics.cites_per_year, Some(4.0));
        assert_eq!(record.metrics.cites_per_author, Some(5));
        assert_eq!(record.ecc, 20);
        assert_eq!(record.venue.source_name, "Applied Physics Reviews");
        assert_eq!(record.venue.publication_type, PublicationType::JournalArticle);
        assert_eq!(record.query_date, "2024-03-05 09:07:01");
        Ok(())
    }

    #[test]
    fn test_enrich_without_year_or_authors() -> Result<()> {
        let enricher = Enricher::new(stamp())?;
        let record = enricher.enrich(&raw("Some Workshop", "", "", 0), 3);
        assert_eq!(record.year_number, None);
        assert_eq!(record.age, None);
        assert_eq!(record.author_count, None);
        assert_eq!(record.metrics, DerivedMetrics::default());
        assert_eq!(record.rank, 3);
        assert_eq!(record.venue.publication_type, PublicationType::ConferencePaper);
        Ok(())
    }

    #[test]
    fn test_enrich_all_ranks_from_one() -> Result<()> {
        let enricher = Enricher::new(stamp())?;
        let records = vec![raw("A", "2020", "X", 1), raw("B", "2021", "Y", 2)];
        let enriched = enricher.enrich_all(&records);
        assert_eq!(enriched.iter().map(|r| r.rank).collect::<Vec<_>>(), vec![1, 2]);
        Ok(())
    }
}
