//! Handing finished places to the delivery collaborator.
//!
//! The crate never sends anything itself: it builds a `Notification`, and a
//! `Notifier` decides what to do with it. `LogNotifier` renders the report the
//! way a mail body would look and writes it to the log.
#![allow(async_fn_in_trait)]

use crate::export;
use crate::results::RunOutcome;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::PathBuf;

/// What a delivery collaborator needs for one place
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub screenshot_path: Option<PathBuf>,
    pub place_name: String,
    pub csv_path: Option<PathBuf>,
}

impl From<&RunOutcome> for Notification {
    fn from(outcome: &RunOutcome) -> Self {
        Self {
            screenshot_path: outcome.screenshot_path.clone(),
            place_name: outcome.place.clone(),
            csv_path: outcome.csv_path.clone(),
        }
    }
}

pub trait Notifier {
    async fn notify(&self, notification: &Notification) -> Result<(), Box<dyn Error>>;
}

/// A rendered results message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub subject: String,
    pub html: String,
    pub text: String,
}

const EMPTY_REPORT: &str = "No URL/price data found.";

/// Render CSV rows (header first) as an HTML table and a tab separated body.
///
/// URL and price are the last two columns, so files with or without a place
/// column both render.
pub fn render_report(place: &str, rows: &[Vec<String>]) -> Report {
    let body: Vec<(&str, &str)> = rows
        .iter()
        .skip(1)
        .filter_map(|cols| match cols.as_slice() {
            [] => None,
            [url] => Some((url.as_str(), "")),
            [.., url, price] => Some((url.as_str(), price.as_str())),
        })
        .collect();

    let subject = if place.is_empty() {
        "Places".to_string()
    } else {
        place.to_string()
    };

    if body.is_empty() {
        return Report {
            subject,
            html: format!("<p>{}</p>", EMPTY_REPORT),
            text: EMPTY_REPORT.to_string(),
        };
    }

    let cells: String = body
        .iter()
        .map(|(url, price)| {
            let url = escape_html(url);
            format!(
                "<tr><td><a href=\"{url}\">{url}</a></td><td>{}</td></tr>",
                escape_html(price)
            )
        })
        .collect();
    let html = format!(
        "<table border=\"1\" cellpadding=\"4\" cellspacing=\"0\"><thead><tr><th>URL</th><th>Price</th></tr></thead><tbody>{}</tbody></table>",
        cells
    );
    let text = body
        .iter()
        .map(|(url, price)| format!("{}\t{}", url, price))
        .collect::<Vec<_>>()
        .join("\n");

    Report {
        subject,
        html,
        text,
    }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Reads the CSV back, renders the report and logs it
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), Box<dyn Error>> {
        let rows = match &notification.csv_path {
            Some(path) => export::read_csv(path)?,
            None => Vec::new(),
        };
        let report = render_report(&notification.place_name, &rows);

        ::log::info!("Report \"{}\":\n{}", report.subject, report.text);
        if let Some(shot) = &notification.screenshot_path {
            ::log::info!("Attachment: {}", shot.display());
        }
        ::log::debug!("HTML body: {}", report.html);
        Ok(())
    }
}
