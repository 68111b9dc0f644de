//! End-to-end runs against the scripted fixture browser

use crate::config::{RunConfig, Timings};
use crate::context::fixture::{FixtureBrowser, FixturePage};
use crate::control::RunGate;
use crate::error::RunError;
use crate::export::read_csv;
use crate::notify::{Notification, Notifier};
use crate::results::{NOT_FOUND, PlaceFailure};
use crate::runner::Runner;
use crate::Harvest;
use std::cell::RefCell;
use std::error::Error;
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

const START_URL: &str = "https://maps.test/";
const SEARCH_BOX: &str = r#"<input id="searchboxinput">"#;

#[derive(Clone, Default)]
struct RecordingNotifier(Rc<RefCell<Vec<Notification>>>);

impl RecordingNotifier {
    fn sent(&self) -> Vec<Notification> {
        self.0.borrow().clone()
    }
}

impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), Box<dyn Error>> {
        self.0.borrow_mut().push(notification.clone());
        Ok(())
    }
}

struct FailingNotifier;

impl Notifier for FailingNotifier {
    async fn notify(&self, _notification: &Notification) -> Result<(), Box<dyn Error>> {
        Err("mail server unreachable".into())
    }
}

/// A place that has no Tickets tab
fn untabbed_page() -> FixturePage {
    FixturePage::new(
        "https://maps.test/place/A",
        &format!(r#"{SEARCH_BOX}<div id="pane"><button role="tab" aria-label="Overview">Overview</button></div>"#),
    )
}

/// A place with both tabs and three usable vendor links
fn ticketed_page() -> FixturePage {
    FixturePage::new(
        "https://maps.test/place/B",
        &format!(
            r#"{SEARCH_BOX}
            <div id="pane">
              <button role="tab" aria-label="Tickets for B">Tickets</button>
              <button role="tab" data-tab-index="1"><div>Admission</div></button>
              <a href="https://v1.example/buy"><div><span>Vendor 1</span><span>AED 120</span></div></a>
              <a href="javascript:void(0)">More options</a>
              <a href="https://v2.example/buy"><span>Vendor 2</span></a>
              <a href="https://v1.example/buy">Vendor 1 again</a>
              <a href="https://v3.example/buy"><span>From</span><span class="drwWxc">€45</span></a>
            </div>"#
        ),
    )
}

fn fixture() -> FixtureBrowser {
    FixtureBrowser::new(FixturePage::new(START_URL, SEARCH_BOX))
        .with_result("A", untabbed_page())
        .with_result("B", ticketed_page())
}

fn config(places: &[&str], output_dir: &Path) -> RunConfig {
    RunConfig {
        places: places.iter().map(|p| p.to_string()).collect(),
        start_url: START_URL.to_string(),
        output_dir: output_dir.to_path_buf(),
        timings: Timings::immediate(),
        ..RunConfig::default()
    }
}

fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_failed_place_does_not_stop_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let browser = fixture();
    let notifier = RecordingNotifier::default();
    let runner = Runner::new(browser.top(), config(&["A", "B"], dir.path()), notifier);

    let outcomes = runner.run().await.unwrap();
    assert_eq!(outcomes.len(), 2);

    let a = &outcomes[0];
    assert_eq!(a.place, "A");
    assert_eq!(a.failure, Some(PlaceFailure::TicketsTab));
    assert!(a.rows.is_empty());
    assert!(a.csv_path.is_none());

    let b = &outcomes[1];
    assert!(b.failure.is_none());
    let urls: Vec<&str> = b.rows.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(
        urls,
        ["https://v1.example/buy", "https://v2.example/buy", "https://v3.example/buy"]
    );
    let prices: Vec<&str> = b.rows.iter().map(|r| r.price.as_str()).collect();
    assert_eq!(prices, ["AED 120", NOT_FOUND, "€45"]);

    assert_eq!(files_in(dir.path()), ["gmap-admission-B.png", "prices-B.csv"]);
    assert_eq!(browser.clicks(), ["Tickets for B", "Admission"]);
}

#[tokio::test]
async fn test_csv_matches_harvest_order() {
    let dir = tempfile::tempdir().unwrap();
    let runner = Runner::new(fixture().top(), config(&["B"], dir.path()), RecordingNotifier::default());

    let outcomes = runner.run().await.unwrap();
    let csv_path = outcomes[0].csv_path.clone().unwrap();
    assert_eq!(csv_path, dir.path().join("prices-B.csv"));

    let rows = read_csv(&csv_path).unwrap();
    assert_eq!(
        rows,
        vec![
            vec!["place", "url", "price"],
            vec!["B", "https://v1.example/buy", "AED 120"],
            vec!["B", "https://v2.example/buy", NOT_FOUND],
            vec!["B", "https://v3.example/buy", "€45"],
        ]
    );
}

#[tokio::test]
async fn test_csv_without_place_column_and_link_limit() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config(&["B"], dir.path());
    cfg.place_column = false;
    cfg.link_limit = 2;
    let runner = Runner::new(fixture().top(), cfg, RecordingNotifier::default());

    let outcomes = runner.run().await.unwrap();
    assert_eq!(outcomes[0].rows.len(), 2);

    let text = std::fs::read_to_string(dir.path().join("prices-B.csv")).unwrap();
    assert_eq!(
        text,
        "url,price\n\"https://v1.example/buy\",\"AED 120\"\n\"https://v2.example/buy\",\"Not found\""
    );
}

#[tokio::test]
async fn test_notifies_only_finished_places() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config(&["A", "B"], dir.path());
    cfg.notify = true;
    let notifier = RecordingNotifier::default();
    let runner = Runner::new(fixture().top(), cfg, notifier.clone());

    runner.run().await.unwrap();

    assert_eq!(
        notifier.sent(),
        vec![Notification {
            screenshot_path: Some(dir.path().join("gmap-admission-B.png")),
            place_name: "B".to_string(),
            csv_path: Some(dir.path().join("prices-B.csv")),
        }]
    );
}

#[tokio::test]
async fn test_notifier_failure_is_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config(&["B"], dir.path());
    cfg.notify = true;
    let runner = Runner::new(fixture().top(), cfg, FailingNotifier);

    let outcomes = runner.run().await.unwrap();
    assert!(outcomes[0].failure.is_none());
    assert!(outcomes[0].csv_path.is_some());
}

#[tokio::test]
async fn test_notify_disabled_sends_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let notifier = RecordingNotifier::default();
    let runner = Runner::new(fixture().top(), config(&["B"], dir.path()), notifier.clone());

    runner.run().await.unwrap();
    assert!(notifier.sent().is_empty());
}

#[tokio::test]
async fn test_external_captures() {
    let dir = tempfile::tempdir().unwrap();
    let browser = fixture();
    let mut cfg = config(&["B"], dir.path());
    cfg.open_external_links = true;
    let runner = Runner::new(browser.top(), cfg, RecordingNotifier::default());

    let outcomes = runner.run().await.unwrap();
    assert_eq!(
        browser.external(),
        ["https://v1.example/buy", "https://v2.example/buy", "https://v3.example/buy"]
    );
    assert_eq!(
        outcomes[0].external_screenshots,
        vec![
            dir.path().join("tab-B-1.png"),
            dir.path().join("tab-B-2.png"),
            dir.path().join("tab-B-3.png"),
        ]
    );
}

#[tokio::test]
async fn test_external_captures_are_capped() {
    let anchors: String = (1..=9)
        .map(|i| format!(r#"<a href="https://v{i}.example/">Vendor {i}</a>"#))
        .collect();
    let page = FixturePage::new(
        "https://maps.test/place/C",
        &format!(
            r#"{SEARCH_BOX}<div id="pane">
              <button role="tab" aria-label="Tickets">Tickets</button>
              <button role="tab"><div>Admission</div></button>{anchors}</div>"#
        ),
    );
    let browser = FixtureBrowser::new(FixturePage::new(START_URL, SEARCH_BOX)).with_result("C", page);

    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config(&["C"], dir.path());
    cfg.open_external_links = true;
    let runner = Runner::new(browser.top(), cfg, RecordingNotifier::default());

    let outcomes = runner.run().await.unwrap();
    assert_eq!(outcomes[0].rows.len(), 7);
    assert_eq!(browser.external().len(), 6);
    assert_eq!(outcomes[0].external_screenshots.len(), 6);
}

#[tokio::test]
async fn test_missing_admission_tab() {
    let page = FixturePage::new(
        "https://maps.test/place/D",
        &format!(r#"{SEARCH_BOX}<button role="tab" aria-label="Tickets">Tickets</button><a href="https://v.example/">v</a>"#),
    );
    let browser = FixtureBrowser::new(FixturePage::new(START_URL, SEARCH_BOX)).with_result("D", page);
    let dir = tempfile::tempdir().unwrap();
    let runner = Runner::new(browser.top(), config(&["D"], dir.path()), RecordingNotifier::default());

    let outcomes = runner.run().await.unwrap();
    assert_eq!(outcomes[0].failure, Some(PlaceFailure::AdmissionTab));
    assert!(files_in(dir.path()).is_empty());
}

#[tokio::test]
async fn test_consent_accepted_before_first_place() {
    let consent_url = "https://consent.google.com/ml?continue=maps";
    let consent = FixturePage::new(
        consent_url,
        &format!(r#"<button aria-label="Accept all" data-href="{START_URL}">Accept all</button>{SEARCH_BOX}"#),
    );
    let browser = FixtureBrowser::new(consent).with_result("B", ticketed_page());

    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config(&["B"], dir.path());
    cfg.start_url = consent_url.to_string();
    let runner = Runner::new(browser.top(), cfg, RecordingNotifier::default());

    let outcomes = runner.run().await.unwrap();
    assert_eq!(browser.clicks().first().map(String::as_str), Some("Accept all"));
    assert_eq!(outcomes[0].rows.len(), 3);
}

#[tokio::test]
async fn test_busy_gate_rejects_run() {
    let dir = tempfile::tempdir().unwrap();
    let gate = Arc::new(RunGate::new());
    let browser = fixture();
    let runner = Runner::new(browser.top(), config(&["B"], dir.path()), RecordingNotifier::default())
        .with_gate(gate.clone());

    let guard = gate.try_start().unwrap();
    assert!(matches!(runner.run().await, Err(RunError::AlreadyRunning)));
    assert!(browser.clicks().is_empty());
    assert!(files_in(dir.path()).is_empty());

    drop(guard);
    assert!(runner.run().await.is_ok());
    assert!(!gate.is_busy());
}

#[tokio::test]
async fn test_unknown_place_finds_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let runner = Runner::new(fixture().top(), config(&["Z"], dir.path()), RecordingNotifier::default());

    let outcomes = runner.run().await.unwrap();
    assert_eq!(outcomes[0].failure, Some(PlaceFailure::TicketsTab));
}

#[tokio::test(start_paused = true)]
async fn test_pacing_only_between_places() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config(&["B", "B", "B"], dir.path());
    cfg.timings.pacing_ms = 10_000;
    let runner = Runner::new(fixture().top(), cfg, RecordingNotifier::default());

    let started = Instant::now();
    let outcomes = runner.run().await.unwrap();
    assert_eq!(outcomes.len(), 3);
    assert_eq!(started.elapsed(), Duration::from_secs(20));
}

#[tokio::test(start_paused = true)]
async fn test_no_pacing_after_single_place() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config(&["B"], dir.path());
    cfg.timings.pacing_ms = 10_000;
    let runner = Runner::new(fixture().top(), cfg, RecordingNotifier::default());

    let started = Instant::now();
    runner.run().await.unwrap();
    assert_eq!(started.elapsed(), Duration::ZERO);
}

#[tokio::test]
async fn test_harvest_rejects_busy_gate_before_connecting() {
    let gate = Arc::new(RunGate::new());
    let _guard = gate.try_start().unwrap();

    let mut cfg = RunConfig::default();
    cfg.webdriver_url = "http://127.0.0.1:1".to_string();
    let harvest = Harvest::new(cfg).with_gate(gate.clone());
    assert!(matches!(harvest.execute().await, Err(RunError::AlreadyRunning)));
}

#[tokio::test]
async fn test_harvest_requires_places() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.json");
    std::fs::write(&path, r#"{"places": ["Louvre"], "link_limit": 3}"#).unwrap();

    let mut harvest = Harvest::from_config_file(&path).unwrap();
    assert_eq!(harvest.config_mut().link_limit, 3);
    harvest.config_mut().places.clear();
    assert!(matches!(harvest.execute().await, Err(RunError::Config(_))));
}

#[test]
fn test_harvest_missing_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = Harvest::from_config_file(dir.path().join("absent.json"));
    assert!(matches!(result, Err(RunError::Config(_))));
}
