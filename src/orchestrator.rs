//! Export actions driven against a [`HostPage`].
//!
//! The page is an uncontrolled UI, so every wait here is a fixed or bounded
//! delay. The parsing core is only ever handed a snapshot of the rows.

use crate::config::ExportConfig;
use crate::error::{ExportError, OptionExt, Result};
use crate::export::{self, ExportFile};
use crate::page::{ControlState, HostPage};
use crate::profile::{absolutize, RawRecord, RecordExtractor};
use crate::record::{Enricher, QueryStamp};
use chrono::{DateTime, Local};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Label the BibTeX entry of the Export menu is recognised by
const BIBTEX_LABEL: &str = "bibtex";

/// Timing and bounds for page interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Upper bound on "Show more" activations
    pub max_clicks: u32,
    /// Wait after each "Show more" activation
    pub load_delay: Duration,
    /// Wait after opening the Export menu
    pub export_menu_delay: Duration,
    /// Waits before each further BibTeX link lookup
    pub link_poll_delays: Vec<Duration>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self::from(&ExportConfig::default())
    }
}

impl From<&ExportConfig> for OrchestratorConfig {
    fn from(config: &ExportConfig) -> Self {
        Self {
            max_clicks: config.max_load_clicks,
            load_delay: config.load_delay(),
            export_menu_delay: config.export_menu_delay(),
            link_poll_delays: config.link_poll_delays(),
        }
    }
}

/// BibTeX export address captured from the Export menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BibtexLink {
    pub url: String,
    pub selected_rows: usize,
}

/// Drives load-more, link capture and the exports
#[derive(Debug, Clone, Default)]
pub struct Orchestrator {
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(config: OrchestratorConfig) -> Self {
        Self { config }
    }

    /// Activate "Show more" until it is disabled or the click bound is hit.
    ///
    /// Returns the number of activations.
    pub async fn load_all<P: HostPage>(&self, page: &mut P) -> Result<u32> {
        if page.load_more_state().is_none() {
            return Err(ExportError::MissingInput(
                "Could not find the 'Show more' button (#gsc_bpf_more). If everything is already loaded, you can export now."
                    .to_string(),
            ));
        }

        let mut clicks = 0;
        while page.load_more_state() == Some(ControlState::Enabled) {
            if clicks >= self.config.max_clicks {
                warn!(clicks, "Stopped at the click bound with more rows available");
                break;
            }
            page.click_load_more();
            clicks += 1;
            debug!(clicks, "Clicked 'Show more'");
            tokio::time::sleep(self.config.load_delay).await;
        }
        info!(clicks, rows = page.rows().len(), "Load all complete");
        Ok(clicks)
    }

    /// Select every row, open the Export menu and capture the BibTeX link
    pub async fn capture_bibtex_link<P: HostPage>(&self, page: &mut P) -> Result<BibtexLink> {
        let selected_rows = page.select_all_rows();
        if selected_rows == 0 {
            return Err(ExportError::MissingInput(
                "No rows found to select. Make sure the publications table is visible and rows are loaded."
                    .to_string(),
            ));
        }

        if !page.has_export_control() {
            return Err(ExportError::MissingInput(
                "Could not find the Export button on this page.".to_string(),
            ));
        }
        page.click_export();
        tokio::time::sleep(self.config.export_menu_delay).await;

        let mut href = page.find_link(BIBTEX_LABEL);
        for (attempt, delay) in self.config.link_poll_delays.iter().enumerate() {
            if href.is_some() {
                break;
            }
            debug!(attempt = attempt + 1, delay_ms = delay.as_millis() as u64, "BibTeX link not rendered yet");
            tokio::time::sleep(*delay).await;
            href = page.find_link(BIBTEX_LABEL);
        }

        let href = href.ok_or_missing("Could not locate the 'BibTeX' item in the Export menu.")?;
        let url = absolutize(page.base_url(), &href);
        if url.is_empty() {
            return Err(ExportError::MissingInput(
                "Found the BibTeX menu item, but its link was empty.".to_string(),
            ));
        }

        info!(url = %url, selected_rows, "Captured BibTeX export link");
        Ok(BibtexLink { url, selected_rows })
    }

    /// Raw records for every rendered row
    pub fn collect_records<P: HostPage>(&self, page: &P) -> Result<Vec<RawRecord>> {
        let rows = page.rows();
        if rows.is_empty() {
            return Err(ExportError::MissingInput(
                "No publication rows found. Make sure the publications table is visible.".to_string(),
            ));
        }
        let extractor = RecordExtractor::new(page.base_url().clone())?;
        Ok(extractor.extract_all(&rows))
    }

    /// General CSV of the rendered table
    pub fn export_general<P: HostPage>(&self, page: &P, time: DateTime<Local>) -> Result<ExportFile> {
        let records = self.collect_records(page)?;
        info!(rows = records.len(), "Exporting general CSV");
        export::general_csv(&records, time)
    }

    /// PoP-compatible CSV of the rendered table
    pub fn export_pop<P: HostPage>(&self, page: &P, time: DateTime<Local>) -> Result<ExportFile> {
        let records = self.collect_records(page)?;
        let enricher = Enricher::new(QueryStamp::at(time))?;
        let enriched = enricher.enrich_all(&records);
        info!(rows = enriched.len(), query_date = %enricher.stamp().date, "Exporting PoP CSV");
        export::pop_csv(&enriched)
    }

    /// Link-list file for the captured BibTeX export address
    pub async fn export_bibtex_link<P: HostPage>(
        &self,
        page: &mut P,
        time: DateTime<Local>,
    ) -> Result<ExportFile> {
        let link = self.capture_bibtex_link(page).await?;
        Ok(export::bibtex_link_file(&link.url, link.selected_rows, time))
    }
}
