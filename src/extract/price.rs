use crate::context::{DocumentContext, ElementHandle, context_for};
use crate::results::AdmissionLink;
use regex::Regex;
use std::sync::LazyLock;

/// A currency symbol or code, optional whitespace, then digits with optional
/// grouping or decimal punctuation
static PRICE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(€|\$|£|AED|USD|EUR)\s*\d+[\d.,]*").expect("Invalid price pattern")
});

/// First price token in `text`
pub fn match_price(text: &str) -> Option<String> {
    PRICE_PATTERN
        .find(text)
        .map(|m| m.as_str().trim().to_string())
}

/// Find the price shown for `link`, first in the context that produced it,
/// then in every other frame of the top-level page.
///
/// `direct_selector` names a node inside the anchor whose text is the price
/// verbatim; it is tried before the pattern scan.
pub async fn extract_price<C: DocumentContext + Clone>(
    top: &C,
    link: &AdmissionLink,
    direct_selector: Option<&str>,
) -> Option<String> {
    match context_for(top, link.source).await {
        Ok(Some(source)) => {
            if let Some(price) = price_in_context(&source, &link.url, direct_selector).await {
                return Some(price);
            }
        }
        Ok(None) => ::log::debug!("Source {:?} of {} is gone", link.source, link.url),
        Err(e) => ::log::debug!("Could not reach {:?}: {}", link.source, e),
    }

    let frames = top.frames().await.ok()?;
    for frame in frames.iter().filter(|f| f.source() != link.source) {
        if let Some(price) = price_in_context(frame, &link.url, direct_selector).await {
            ::log::debug!("Price for {} found in {:?}", link.url, frame.source());
            return Some(price);
        }
    }
    None
}

/// Price next to the anchor whose resolved href is exactly `url`, in one context
pub async fn price_in_context<C: DocumentContext>(
    ctx: &C,
    url: &str,
    direct_selector: Option<&str>,
) -> Option<String> {
    let anchor = find_anchor(ctx, url).await?;

    if let Some(css) = direct_selector {
        if let Some(price) = direct_price(&anchor, css).await {
            return Some(price);
        }
    }

    if let Ok(descendants) = anchor.find_all("*").await {
        for node in descendants {
            if let Ok(text) = node.text().await {
                if let Some(price) = match_price(text.trim()) {
                    return Some(price);
                }
            }
        }
    }

    anchor.text().await.ok().and_then(|text| match_price(&text))
}

async fn find_anchor<C: DocumentContext>(ctx: &C, url: &str) -> Option<C::Element> {
    let anchors = ctx.find_all("a[href]").await.ok()?;
    for anchor in anchors {
        if anchor.href().await.ok().flatten().as_deref() == Some(url) {
            return Some(anchor);
        }
    }
    None
}

async fn direct_price<E: ElementHandle>(anchor: &E, css: &str) -> Option<String> {
    let node = anchor.find_all(css).await.ok()?.into_iter().next()?;
    let text = node.text().await.ok()?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
