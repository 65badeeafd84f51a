//! # rustgsexport
//!
//! Google Scholar profile exporter: reads the publications table a profile
//! page has already rendered, derives bibliographic fields from the venue
//! lines, and writes a general CSV, a Publish or Perish compatible CSV and
//! a BibTeX export link list. Nothing is fetched over the network.
//!
//! ## Modules
//!
//! - [`text`] - Whitespace normalization and year tokens
//! - [`profile`] - Row snapshots and raw records from profile HTML
//! - [`venue`] - Venue heuristics (type, source, volume, issue, pages)
//! - [`metrics`] - Author count, age, citations per year and per author
//! - [`record`] - Enriched records for one export call
//! - [`table`] - Delimited text serialization
//! - [`export`] - Output files
//! - [`page`] - Host page access, including saved HTML snapshots
//! - [`orchestrator`] - Load-more, BibTeX link capture and export actions
//! - [`config`] - Config file handling
//! - [`error`] - Custom error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rustgsexport::{export, profile, record};
//!
//! fn main() -> rustgsexport::Result<()> {
//!     let html = std::fs::read_to_string("profile.html")?;
//!     let base = url::Url::parse(profile::DEFAULT_SCHOLAR_URL)
//!         .map_err(|e| rustgsexport::ExportError::Config(e.to_string()))?;
//!     let records = profile::parse_profile_rows(&html, &base)?;
//!     let enriched = record::Enricher::new(record::QueryStamp::now())?.enrich_all(&records);
//!     let file = export::pop_csv(&enriched)?;
//!     file.write_to(std::path::Path::new("./output"))?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod metrics;
pub mod orchestrator;
pub mod page;
pub mod profile;
pub mod record;
pub mod table;
pub mod text;
pub mod venue;

pub use error::{ExportError, Result};
