use super::resolver::{Query, SweepPlan, resolve_with_frames, wait_for_navigation};
use crate::context::{DocumentContext, ElementHandle};
use crate::error::TimedOut;
use std::time::Duration;

/// Address fragment of the consent interstitial
pub const CONSENT_URL_MARKER: &str = "consent.google.com";

/// Accept buttons, most specific first; visible-text matches last
pub const ACCEPT_CANDIDATES: &[Query<'static>] = &[
    Query::Css(r#"button[aria-label="Accept all"]"#),
    Query::Css(r#"button[aria-label*="Accept"]"#),
    Query::Css(r#"button[jsname="b3VHJd"]"#),
    Query::Css(r#"button[jsname*="b3"]"#),
    Query::TextContains {
        tag: "button",
        text: "Accept all",
    },
    Query::TextContains {
        tag: "button",
        text: "Accept",
    },
];

/// Accept a consent interstitial if the page is showing one.
///
/// Returns whether an accept button was found and clicked. Any other page is
/// left alone.
pub async fn dismiss<C: DocumentContext>(ctx: &C, navigation_timeout: Duration) -> bool {
    let url = match ctx.current_url().await {
        Ok(url) => url,
        Err(e) => {
            ::log::debug!("Could not read current address: {}", e);
            return false;
        }
    };
    if !url.contains(CONSENT_URL_MARKER) {
        return false;
    }

    ::log::info!("Consent interstitial detected at {}", url);
    let plan = SweepPlan::with_frames(Duration::ZERO, Duration::ZERO);
    let Some(found) = resolve_with_frames(ctx, ACCEPT_CANDIDATES, plan).await else {
        ::log::warn!("No accept button found on consent page");
        return false;
    };

    // Whichever settles first wins; a dialog that never navigates is fine
    tokio::select! {
        biased;
        clicked = found.element.click() => {
            if let Err(e) = clicked {
                ::log::warn!("Consent click failed: {}", e);
            }
        }
        navigated = wait_for_navigation(ctx, &url, navigation_timeout) => match navigated {
            Ok(to) => ::log::debug!("Consent navigated to {}", to),
            Err(TimedOut) => ::log::debug!("No navigation within {:?} after consent click", navigation_timeout),
        },
    }
    true
}
