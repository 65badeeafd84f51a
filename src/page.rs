//! Host pages the exporter reads from.
//!
//! [`HostPage`] is everything the orchestrator needs from the profile page:
//! the rendered rows, the "Show more" control, the row checkboxes, the
//! Export menu and its links. [`SnapshotPage`] implements it over saved
//! profile HTML, treating each additional snapshot as the page state after
//! one more "Show more" activation.

use crate::error::Result;
use crate::profile::{element_text, parse_selector, snapshot_row, ProfileSelectors, RowSnapshot};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use tracing::{debug, warn};
use url::Url;

/// State of a page control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlState {
    Enabled,
    Disabled,
}

/// Read and activation access to a rendered profile page
pub trait HostPage {
    /// Origin used to absolutize relative links
    fn base_url(&self) -> &Url;

    /// Text of every publication row currently rendered
    fn rows(&self) -> Vec<RowSnapshot>;

    /// State of the "Show more" control, `None` when the page has none
    fn load_more_state(&self) -> Option<ControlState>;

    /// Activate the "Show more" control
    fn click_load_more(&mut self);

    /// Tick every row checkbox; returns how many checkboxes exist
    fn select_all_rows(&mut self) -> usize;

    /// Whether an Export control is present
    fn has_export_control(&self) -> bool;

    /// Activate the Export control
    fn click_export(&mut self);

    /// Target of the first link whose label contains `label`
    /// (case-insensitive); `Some("")` when the link has no target
    fn find_link(&self, label: &str) -> Option<String>;
}

/// Selectors for the page controls around the publications table
#[derive(Debug, Clone)]
struct PageSelectors {
    profile: ProfileSelectors,
    load_more: Selector,
    checkbox: Selector,
    export_candidates: Selector,
    link: Selector,
}

impl PageSelectors {
    fn new() -> Result<Self> {
        Ok(Self {
            profile: ProfileSelectors::new()?,
            load_more: parse_selector("#gsc_bpf_more")?,
            checkbox: parse_selector(r#"input[type="checkbox"][name="s"]"#)?,
            export_candidates: parse_selector("button, a, span, div")?,
            link: parse_selector("a")?,
        })
    }
}

/// A profile page reconstructed from saved HTML snapshots
pub struct SnapshotPage {
    documents: Vec<Html>,
    loaded: usize,
    selected: usize,
    selectors: PageSelectors,
    base: Url,
}

impl SnapshotPage {
    /// Build a page from snapshot HTML, in "Show more" order
    pub fn new(snapshots: &[String], base: Url) -> Result<Self> {
        let documents: Vec<Html> = snapshots.iter().map(|s| Html::parse_document(s)).collect();
        Ok(Self {
            loaded: documents.len().min(1),
            documents,
            selected: 0,
            selectors: PageSelectors::new()?,
            base,
        })
    }

    /// Number of snapshots currently loaded
    pub fn loaded_snapshots(&self) -> usize {
        self.loaded
    }

    /// Rows ticked by the last [`HostPage::select_all_rows`]
    pub fn selected_rows(&self) -> usize {
        self.selected
    }

    fn loaded_documents(&self) -> &[Html] {
        &self.documents[..self.loaded]
    }

    fn current(&self) -> Option<&Html> {
        self.loaded_documents().last()
    }

    /// Rows of every loaded snapshot, first occurrence only, each paired
    /// with whether it carries a selection checkbox
    fn unique_rows(&self) -> Vec<(RowSnapshot, bool)> {
        // Later snapshots usually repeat the rows already shown
        let mut seen = HashSet::new();
        let mut rows = Vec::new();
        for doc in self.loaded_documents() {
            for elem in doc.select(self.selectors.profile.row()) {
                let row = snapshot_row(elem, &self.selectors.profile);
                if seen.insert(row_key(&row)) {
                    let selectable = elem.select(&self.selectors.checkbox).next().is_some();
                    rows.push((row, selectable));
                }
            }
        }
        rows
    }
}

/// Identity of a row across snapshots; the href alone is empty for some rows
fn row_key(row: &RowSnapshot) -> (String, String, String, String) {
    (
        row.view_href.clone(),
        row.title.clone(),
        row.venue.clone(),
        row.year_column.clone(),
    )
}

/// `gs_dis` class, `disabled`/`aria-disabled` attributes or an inline
/// `display: none` all mean the control cannot be used
fn is_disabled(elem: ElementRef<'_>) -> bool {
    let value = elem.value();
    let hidden = value
        .attr("style")
        .map(|s| s.replace(' ', "").to_lowercase().contains("display:none"))
        .unwrap_or(false);
    value.classes().any(|c| c == "gs_dis")
        || value.attr("disabled").is_some()
        || value.attr("aria-disabled") == Some("true")
        || hidden
}

impl HostPage for SnapshotPage {
    fn base_url(&self) -> &Url {
        &self.base
    }

    fn rows(&self) -> Vec<RowSnapshot> {
        let rows: Vec<RowSnapshot> = self.unique_rows().into_iter().map(|(row, _)| row).collect();
        debug!(count = rows.len(), "Captured profile rows");
        rows
    }

    fn load_more_state(&self) -> Option<ControlState> {
        if self.loaded < self.documents.len() {
            return Some(ControlState::Enabled);
        }
        let button = self.current()?.select(&self.selectors.load_more).next()?;
        if !is_disabled(button) {
            warn!("Last snapshot still offers more rows; save the page again after 'Show more' to include them");
        }
        Some(ControlState::Disabled)
    }

    fn click_load_more(&mut self) {
        if self.loaded < self.documents.len() {
            self.loaded += 1;
            debug!(loaded = self.loaded, "Loaded next snapshot");
        }
    }

    fn select_all_rows(&mut self) -> usize {
        self.selected = self.unique_rows().iter().filter(|(_, selectable)| *selectable).count();
        self.selected
    }

    fn has_export_control(&self) -> bool {
        let Some(doc) = self.current() else {
            return false;
        };
        doc.select(&self.selectors.export_candidates)
            .any(|e| element_text(e).to_lowercase().contains("export"))
    }

    fn click_export(&mut self) {
        // The saved menu markup is already in the document
        debug!("Export menu opened on snapshot");
    }

    fn find_link(&self, label: &str) -> Option<String> {
        let label = label.to_lowercase();
        self.loaded_documents().iter().rev().find_map(|doc| {
            doc.select(&self.selectors.link)
                .find(|a| element_text(*a).to_lowercase().contains(&label))
                .map(|a| a.value().attr("href").unwrap_or_default().trim().to_string())
        })
    }
}
