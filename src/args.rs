use clap::Parser;
use maps_admission::RunConfig;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "maps-admission")]
#[command(about = "Harvests ticket vendor links and prices from a map's admission panel")]
#[command(version)]
pub struct Args {
    /// Places to look up (overrides PLACES / PLACE and the config file)
    pub places: Vec<String>,

    /// Path to a JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// WebDriver server URL
    #[arg(long)]
    pub webdriver_url: Option<String>,

    /// Directory for screenshots and CSV files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Maximum vendor links per place
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Screenshot the first vendor pages in secondary tabs
    #[arg(long)]
    pub open_external_links: bool,

    /// Hand each finished place to the notifier
    #[arg(long)]
    pub notify: bool,

    /// Write `url,price` CSV files without the place column
    #[arg(long)]
    pub no_place_column: bool,

    /// Pause between places in milliseconds
    #[arg(long)]
    pub pacing_ms: Option<u64>,
}

impl Args {
    /// Apply command-line overrides on top of file and environment settings
    pub fn apply(&self, config: &mut RunConfig) {
        if !self.places.is_empty() {
            config.places = self.places.clone();
        }
        if let Some(url) = &self.webdriver_url {
            config.webdriver_url = url.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(limit) = self.limit {
            config.link_limit = limit;
        }
        if let Some(pacing) = self.pacing_ms {
            config.timings.pacing_ms = pacing;
        }
        config.open_external_links |= self.open_external_links;
        config.notify |= self.notify;
        if self.no_place_column {
            config.place_column = false;
        }
    }
}
