use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Price recorded when no currency token could be found for a link
pub const NOT_FOUND: &str = "Not found";

/// Which document context a value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContextSource {
    /// The top-level page
    TopLevel,
    /// Immediate child frame at this enumeration index
    Frame(usize),
}

/// An outbound vendor link harvested from the ticket panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionLink {
    /// Absolute http(s) address
    pub url: String,

    /// Context the anchor was found in
    pub source: ContextSource,
}

/// One CSV row: a vendor link and the price found next to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceResult {
    pub place: String,
    pub url: String,
    pub price: String,
}

impl PriceResult {
    /// Build a row, recording `NOT_FOUND` when extraction came back empty
    pub fn new(place: &str, url: &str, price: Option<String>) -> Self {
        Self {
            place: place.to_string(),
            url: url.to_string(),
            price: price.unwrap_or_else(|| NOT_FOUND.to_string()),
        }
    }

    pub fn is_priced(&self) -> bool {
        self.price != NOT_FOUND
    }
}

/// Everything produced for one place
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub place: String,

    /// Audit screenshot of the admission panel
    pub screenshot_path: Option<PathBuf>,

    /// Rows in harvest order
    pub rows: Vec<PriceResult>,

    pub csv_path: Option<PathBuf>,

    /// Vendor pages captured in secondary tabs, when enabled
    pub external_screenshots: Vec<PathBuf>,

    /// Step the place was abandoned at, if any
    pub failure: Option<PlaceFailure>,
}

impl RunOutcome {
    /// Outcome for a place abandoned before harvesting
    pub fn failed(place: &str, failure: PlaceFailure) -> Self {
        Self {
            place: place.to_string(),
            screenshot_path: None,
            rows: Vec::new(),
            csv_path: None,
            external_screenshots: Vec::new(),
            failure: Some(failure),
        }
    }
}

/// Required steps whose failure abandons a place
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaceFailure {
    Search,
    TicketsTab,
    AdmissionTab,
}

impl std::fmt::Display for PlaceFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let step = match self {
            PlaceFailure::Search => "search box not found",
            PlaceFailure::TicketsTab => "Tickets tab not found",
            PlaceFailure::AdmissionTab => "Admission tab not found",
        };
        f.write_str(step)
    }
}
