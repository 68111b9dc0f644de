use super::resolver::{Query, SweepPlan, resolve_with_frames};
use crate::context::{DocumentContext, ElementHandle};
use crate::export;
use crate::utils::sanitize_place;
use std::path::{Path, PathBuf};

pub const TICKETS_TAB: &[Query<'static>] =
    &[Query::Css(r#"button[role="tab"][aria-label*="Tickets"]"#)];

/// The attribute match is locale and version sensitive, so a tab whose
/// label text reads "Admission" is accepted as a fallback.
pub const ADMISSION_TAB: &[Query<'static>] = &[
    Query::Css(r#"button[role="tab"][data-tab-index="0"][jsaction*="pane.tabs.tabClick"]"#),
    Query::DescendantText {
        container: r#"button[role="tab"]"#,
        descendant: "div",
        text: "Admission",
    },
];

pub async fn select_tickets_tab<C: DocumentContext>(ctx: &C, plan: SweepPlan) -> bool {
    select_tab(ctx, "Tickets", TICKETS_TAB, plan).await
}

pub async fn select_admission_tab<C: DocumentContext>(ctx: &C, plan: SweepPlan) -> bool {
    select_tab(ctx, "Admission", ADMISSION_TAB, plan).await
}

async fn select_tab<C: DocumentContext>(
    ctx: &C,
    name: &str,
    candidates: &[Query<'_>],
    plan: SweepPlan,
) -> bool {
    let Some(found) = resolve_with_frames(ctx, candidates, plan).await else {
        ::log::debug!("{} tab not found", name);
        return false;
    };

    match found.element.click().await {
        Ok(()) => {
            ::log::debug!(
                "Clicked {} tab via candidate {} in {:?}",
                name,
                found.candidate,
                found.source
            );
            true
        }
        Err(e) => {
            ::log::warn!("Clicking {} tab failed: {}", name, e);
            false
        }
    }
}

/// Screenshot the admission panel as `gmap-admission-<place>.png`.
///
/// Returns the written path, or `None` if capture or writing failed.
pub async fn capture_panel<C: DocumentContext>(
    ctx: &C,
    output_dir: &Path,
    place: &str,
) -> Option<PathBuf> {
    let path = output_dir.join(format!("gmap-admission-{}.png", sanitize_place(place)));

    let png = match ctx.screenshot().await {
        Ok(png) => png,
        Err(e) => {
            ::log::warn!("Admission screenshot failed for {}: {}", place, e);
            return None;
        }
    };

    match export::write_bytes(&path, &png) {
        Ok(()) => {
            ::log::info!("Saved admission screenshot {}", path.display());
            Some(path)
        }
        Err(e) => {
            ::log::warn!("{}", e);
            None
        }
    }
}
