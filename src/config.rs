use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for a harvesting run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Places to look up, processed in order
    #[serde(default = "default_places")]
    pub places: Vec<String>,

    /// Page opened once before the first place is searched
    #[serde(default = "default_start_url")]
    pub start_url: String,

    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Selector that signals search results have rendered
    #[serde(default = "default_results_selector")]
    pub results_selector: String,

    /// Node inside a vendor link that holds its price verbatim (null disables)
    #[serde(default = "default_price_selector")]
    pub price_selector: Option<String>,

    /// Maximum number of vendor links kept per place
    #[serde(default = "default_link_limit")]
    pub link_limit: usize,

    /// Directory receiving screenshots and CSV files
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Whether the CSV carries a leading `place` column
    #[serde(default = "default_true")]
    pub place_column: bool,

    /// Screenshot the first few vendor pages in throwaway tabs
    #[serde(default)]
    pub open_external_links: bool,

    /// Hand each finished place to the notifier
    #[serde(default)]
    pub notify: bool,

    #[serde(default)]
    pub viewport: Viewport,

    #[serde(default)]
    pub timings: Timings,
}

/// Browser window size
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1024,
        }
    }
}

/// Wait budgets and pauses, all in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    /// Wait for the search box in the top-level document
    pub search_input_ms: u64,
    /// Wait per nested frame when sweeping frames
    pub frame_probe_ms: u64,
    /// Best-effort wait for the results marker after submitting a search
    pub results_ms: u64,
    pub tickets_tab_ms: u64,
    pub admission_tab_ms: u64,
    /// Best-effort wait for navigation after accepting a consent dialog
    pub navigation_ms: u64,
    pub keystroke_delay_ms: u64,
    pub tickets_settle_ms: u64,
    pub admission_settle_ms: u64,
    /// Pause between places
    pub pacing_ms: u64,
    /// Pause before screenshotting an external vendor page
    pub external_pause_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            search_input_ms: 5_000,
            frame_probe_ms: 2_000,
            results_ms: 10_000,
            tickets_tab_ms: 5_000,
            admission_tab_ms: 6_000,
            navigation_ms: 15_000,
            keystroke_delay_ms: 100,
            tickets_settle_ms: 1_500,
            admission_settle_ms: 1_200,
            pacing_ms: 10_000,
            external_pause_ms: 1_500,
        }
    }
}

impl Timings {
    /// All waits and pauses set to zero: every probe is a single attempt
    pub fn immediate() -> Self {
        Self {
            search_input_ms: 0,
            frame_probe_ms: 0,
            results_ms: 0,
            tickets_tab_ms: 0,
            admission_tab_ms: 0,
            navigation_ms: 0,
            keystroke_delay_ms: 0,
            tickets_settle_ms: 0,
            admission_settle_ms: 0,
            pacing_ms: 0,
            external_pause_ms: 0,
        }
    }
}

/// Convert a millisecond setting into a `Duration`
pub fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

fn default_places() -> Vec<String> {
    vec!["Img World of Adventure".to_string()]
}

fn default_start_url() -> String {
    "https://www.google.com/maps/".to_string()
}

/// Default value for webdriver_url
fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_results_selector() -> String {
    "#pane".to_string()
}

fn default_price_selector() -> Option<String> {
    Some(".drwWxc".to_string())
}

fn default_link_limit() -> usize {
    7
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_true() -> bool {
    true
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            places: default_places(),
            start_url: default_start_url(),
            webdriver_url: default_webdriver_url(),
            results_selector: default_results_selector(),
            price_selector: default_price_selector(),
            link_limit: default_link_limit(),
            output_dir: default_output_dir(),
            place_column: true,
            open_external_links: false,
            notify: false,
            viewport: Viewport::default(),
            timings: Timings::default(),
        }
    }
}

impl RunConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn Error>> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let config: Self = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup (the environment in production)
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("WEBDRIVER_URL").filter(|v| !v.is_empty()) {
            self.webdriver_url = url;
        }

        if let Some(places) = lookup("PLACES")
            .map(|list| split_places(&list))
            .filter(|places| !places.is_empty())
        {
            self.places = places;
        } else if let Some(place) = lookup("PLACE").filter(|v| !v.trim().is_empty()) {
            self.places = vec![place.trim().to_string()];
        }

        if let Some(flag) = lookup("OPEN_EXTERNAL_LINKS") {
            self.open_external_links = is_true(&flag);
        }
        if let Some(flag) = lookup("SEND_EMAIL") {
            self.notify = is_true(&flag);
        }
        if let Some(dir) = lookup("OUTPUT_DIR").filter(|v| !v.is_empty()) {
            self.output_dir = PathBuf::from(dir);
        }
    }
}

/// Split a comma separated place list, dropping blanks
pub fn split_places(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn is_true(flag: &str) -> bool {
    flag.trim().eq_ignore_ascii_case("true")
}
