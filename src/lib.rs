// Re-export modules
pub mod config;
pub mod context;
pub mod control;
pub mod error;
pub mod export;
pub mod extract;
pub mod navigation;
pub mod notify;
pub mod results;
pub mod runner;
pub mod utils;

#[cfg(test)]
mod tests;

// Re-export commonly used types for convenience
pub use config::RunConfig;
pub use control::RunGate;
pub use error::RunError;
pub use results::{PriceResult, RunOutcome};
pub use runner::Runner;

use context::WebDriverContext;
use notify::{LogNotifier, Notifier};
use std::sync::Arc;

/// Main builder for a harvesting run against a live WebDriver session
pub struct Harvest<N = LogNotifier> {
    config: RunConfig,
    notifier: N,
    gate: Arc<RunGate>,
}

impl Harvest {
    /// Create a new builder that logs its reports
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            notifier: LogNotifier,
            gate: Arc::new(RunGate::new()),
        }
    }

    /// Load configuration from a file
    pub fn from_config_file(path: impl AsRef<std::path::Path>) -> Result<Self, RunError> {
        let config =
            RunConfig::from_file(path).map_err(|e| RunError::Config(e.to_string()))?;
        Ok(Self::new(config))
    }
}

impl<N: Notifier> Harvest<N> {
    /// Replace the notifier that receives finished places
    pub fn with_notifier<M: Notifier>(self, notifier: M) -> Harvest<M> {
        Harvest {
            config: self.config,
            notifier,
            gate: self.gate,
        }
    }

    /// Share a run gate with a control surface
    pub fn with_gate(mut self, gate: Arc<RunGate>) -> Self {
        self.gate = gate;
        self
    }

    /// Settings for this run, for env and CLI overrides after loading
    pub fn config_mut(&mut self) -> &mut RunConfig {
        &mut self.config
    }

    /// Connect to WebDriver, process every place, then close the session
    pub async fn execute(self) -> Result<Vec<RunOutcome>, RunError> {
        if self.gate.is_busy() {
            return Err(RunError::AlreadyRunning);
        }
        if self.config.places.is_empty() {
            return Err(RunError::Config("no places to process".to_string()));
        }

        ::log::info!(
            "Connecting to WebDriver at {} for {} places",
            self.config.webdriver_url,
            self.config.places.len()
        );
        let context =
            WebDriverContext::connect(&self.config.webdriver_url, self.config.viewport).await?;

        let runner = Runner::new(context, self.config, self.notifier).with_gate(self.gate);
        let result = runner.run().await;

        if let Err(e) = runner.into_context().close().await {
            ::log::warn!("Failed to close WebDriver session: {}", e);
        }
        result
    }
}
