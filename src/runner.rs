use crate::config::{RunConfig, ms};
use crate::context::DocumentContext;
use crate::control::RunGate;
use crate::error::RunError;
use crate::export;
use crate::extract::{extract_price, harvest};
use crate::navigation::{SearchOptions, SweepPlan, consent, panel, search};
use crate::notify::{Notification, Notifier};
use crate::results::{AdmissionLink, PlaceFailure, PriceResult, RunOutcome};
use crate::utils::sanitize_place;
use std::path::PathBuf;
use std::sync::Arc;

/// Most vendor pages opened in secondary tabs per place
const MAX_EXTERNAL_CAPTURES: usize = 6;

/// Drives every place through search, tab navigation, harvesting and export,
/// one after another on a single reused context
pub struct Runner<C, N> {
    context: C,
    config: RunConfig,
    notifier: N,
    gate: Arc<RunGate>,
}

impl<C, N> Runner<C, N>
where
    C: DocumentContext + Clone,
    N: Notifier,
{
    pub fn new(context: C, config: RunConfig, notifier: N) -> Self {
        Self {
            context,
            config,
            notifier,
            gate: Arc::new(RunGate::new()),
        }
    }

    /// Share a gate with a control surface
    pub fn with_gate(mut self, gate: Arc<RunGate>) -> Self {
        self.gate = gate;
        self
    }

    /// Give back the context so the caller can close the session
    pub fn into_context(self) -> C {
        self.context
    }

    /// Open the start page once and accept any consent dialog
    pub async fn prepare(&self) -> Result<(), RunError> {
        self.context.goto(&self.config.start_url).await?;
        if consent::dismiss(&self.context, ms(self.config.timings.navigation_ms)).await {
            ::log::info!("Accepted consent dialog");
        }
        Ok(())
    }

    /// Process every configured place.
    ///
    /// A place that fails is logged and skipped; only a busy gate or a broken
    /// start page ends the run.
    pub async fn run(&self) -> Result<Vec<RunOutcome>, RunError> {
        let _guard = self.gate.try_start().ok_or(RunError::AlreadyRunning)?;

        self.prepare().await?;

        let places = &self.config.places;
        let mut outcomes = Vec::with_capacity(places.len());
        for (i, place) in places.iter().enumerate() {
            let outcome = self.process_place(place).await;
            match outcome.failure {
                Some(failure) => ::log::warn!("Skipping {}: {}", place, failure),
                None => ::log::info!(
                    "Finished {}: {} links, {} priced",
                    place,
                    outcome.rows.len(),
                    outcome.rows.iter().filter(|r| r.is_priced()).count()
                ),
            }
            outcomes.push(outcome);

            if i + 1 < places.len() {
                pause(self.config.timings.pacing_ms).await;
            }
        }
        Ok(outcomes)
    }

    /// Run one place through the pipeline, stopping at the first required
    /// step that fails
    pub async fn process_place(&self, place: &str) -> RunOutcome {
        ::log::info!("Processing: {}", place);
        let timings = &self.config.timings;
        let plan = |top_level_ms| SweepPlan::with_frames(ms(top_level_ms), ms(timings.frame_probe_ms));

        let options = SearchOptions {
            results_selector: &self.config.results_selector,
            input: plan(timings.search_input_ms),
            results_timeout: ms(timings.results_ms),
            keystroke_delay: ms(timings.keystroke_delay_ms),
        };
        if !search::search(&self.context, place, &options).await {
            return RunOutcome::failed(place, PlaceFailure::Search);
        }

        if !panel::select_tickets_tab(&self.context, plan(timings.tickets_tab_ms)).await {
            return RunOutcome::failed(place, PlaceFailure::TicketsTab);
        }
        pause(timings.tickets_settle_ms).await;

        if !panel::select_admission_tab(&self.context, plan(timings.admission_tab_ms)).await {
            return RunOutcome::failed(place, PlaceFailure::AdmissionTab);
        }
        pause(timings.admission_settle_ms).await;

        let screenshot_path =
            panel::capture_panel(&self.context, &self.config.output_dir, place).await;

        let links = harvest(&self.context, self.config.link_limit).await;
        ::log::info!("Found {} vendor links for {}", links.len(), place);

        let mut rows = Vec::with_capacity(links.len());
        for link in &links {
            let price =
                extract_price(&self.context, link, self.config.price_selector.as_deref()).await;
            rows.push(PriceResult::new(place, &link.url, price));
        }

        let csv_path = match export::write_csv(
            &self.config.output_dir,
            place,
            &rows,
            self.config.place_column,
        ) {
            Ok(path) => Some(path),
            Err(e) => {
                ::log::error!("Failed to write CSV for {}: {}", place, e);
                None
            }
        };

        let external_screenshots = if self.config.open_external_links {
            self.capture_vendor_pages(place, &links).await
        } else {
            Vec::new()
        };

        let outcome = RunOutcome {
            place: place.to_string(),
            screenshot_path,
            rows,
            csv_path,
            external_screenshots,
            failure: None,
        };

        if self.config.notify {
            if let Err(e) = self.notifier.notify(&Notification::from(&outcome)).await {
                ::log::error!("Notification failed for {}: {}", place, e);
            }
        }
        outcome
    }

    /// Screenshot the first few vendor pages in throwaway tabs, skipping any
    /// that fail
    async fn capture_vendor_pages(&self, place: &str, links: &[AdmissionLink]) -> Vec<PathBuf> {
        let safe = sanitize_place(place);
        let pause_for = ms(self.config.timings.external_pause_ms);
        let mut shots = Vec::new();

        for (i, link) in links.iter().take(MAX_EXTERNAL_CAPTURES).enumerate() {
            let png = match self.context.capture_external(&link.url, pause_for).await {
                Ok(png) => png,
                Err(e) => {
                    ::log::debug!("Could not capture {}: {}", link.url, e);
                    continue;
                }
            };
            let path = self
                .config
                .output_dir
                .join(format!("tab-{}-{}.png", safe, i + 1));
            match export::write_bytes(&path, &png) {
                Ok(()) => shots.push(path),
                Err(e) => ::log::debug!("{}", e),
            }
        }
        shots
    }
}

async fn pause(millis: u64) {
    if millis > 0 {
        tokio::time::sleep(ms(millis)).await;
    }
}
