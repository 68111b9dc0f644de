use super::resolver::{Query, SweepPlan, resolve_with_frames, wait_for};
use crate::context::{DocumentContext, ElementHandle};
use crate::error::{ContextError, TimedOut};
use std::time::Duration;

pub const SEARCH_INPUT: &[Query<'static>] = &[Query::Css("#searchboxinput")];

#[derive(Debug, Clone)]
pub struct SearchOptions<'a> {
    /// Selector that appears once results render
    pub results_selector: &'a str,
    pub input: SweepPlan,
    pub results_timeout: Duration,
    pub keystroke_delay: Duration,
}

/// Type `place` into the search box and submit it.
///
/// False only when no search box could be found or typing failed; a missing
/// results marker afterwards is not a failure.
pub async fn search<C: DocumentContext>(ctx: &C, place: &str, options: &SearchOptions<'_>) -> bool {
    if place.trim().is_empty() {
        return false;
    }

    let Some(found) = resolve_with_frames(ctx, SEARCH_INPUT, options.input).await else {
        ::log::warn!("Search box not found");
        return false;
    };
    let input = found.element;

    if let Err(e) = input.select_contents().await {
        ::log::debug!("Could not select search box contents ({}), clicking instead", e);
        if let Err(e) = input.click().await {
            ::log::debug!("Click on search box failed: {}", e);
        }
    }

    if let Err(e) = type_slowly(&input, place, options.keystroke_delay).await {
        ::log::warn!("Typing into search box failed: {}", e);
        return false;
    }
    if let Err(e) = ctx.press_enter().await {
        ::log::warn!("Submitting search failed: {}", e);
        return false;
    }

    let marker = Query::Css(options.results_selector);
    match wait_for(ctx, &marker, options.results_timeout).await {
        Ok(_) => ::log::debug!("Results panel appeared for {}", place),
        Err(TimedOut) => ::log::debug!(
            "No {} after {:?}; continuing",
            options.results_selector,
            options.results_timeout
        ),
    }
    true
}

/// Send `text` one character at a time
async fn type_slowly<E: ElementHandle>(
    input: &E,
    text: &str,
    delay: Duration,
) -> Result<(), ContextError> {
    let mut buf = [0u8; 4];
    for ch in text.chars() {
        input.send_keys(ch.encode_utf8(&mut buf)).await?;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
    Ok(())
}
