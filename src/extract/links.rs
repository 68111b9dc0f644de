use crate::context::{DocumentContext, ElementHandle};
use crate::results::AdmissionLink;
use std::collections::HashSet;
use url::Url;

/// Anchors inside the results panel
pub const PANEL_LINKS: &str = "#pane a[href]";
pub const ALL_LINKS: &str = "a[href]";

/// Collect unique absolute http(s) links, at most `limit`.
///
/// Tiers, each used only when the previous found no anchors at all: the
/// results panel, the whole top-level document, then every frame.
pub async fn harvest<C: DocumentContext>(top: &C, limit: usize) -> Vec<AdmissionLink> {
    let mut anchors = collect(top, PANEL_LINKS).await;

    if anchors.is_empty() {
        ::log::debug!("No links in results panel, trying the whole document");
        anchors = collect(top, ALL_LINKS).await;
    }

    if anchors.is_empty() {
        match top.frames().await {
            Ok(frames) => {
                ::log::debug!("No links in top-level document, sweeping {} frames", frames.len());
                for frame in &frames {
                    anchors.extend(collect(frame, ALL_LINKS).await);
                }
            }
            Err(e) => ::log::debug!("Could not enumerate frames: {}", e),
        }
    }

    let mut seen = HashSet::new();
    let mut links: Vec<AdmissionLink> = anchors
        .into_iter()
        .filter(|anchor| anchor.absolute && is_web_url(&anchor.link.url))
        .map(|anchor| anchor.link)
        .filter(|link| seen.insert(link.url.clone()))
        .collect();
    links.truncate(limit);

    ::log::debug!(
        "Harvested links: {:?}",
        links.iter().map(|l| l.url.as_str()).collect::<Vec<_>>()
    );
    links
}

/// A harvested anchor and whether its markup href was already absolute
struct Anchor {
    link: AdmissionLink,
    absolute: bool,
}

/// Every non-empty href matched by `css`, in document order.
///
/// The URL is the browser-resolved href; relative markup is only flagged here
/// so that tier selection still sees every anchor.
async fn collect<C: DocumentContext>(ctx: &C, css: &str) -> Vec<Anchor> {
    let elements = match ctx.find_all(css).await {
        Ok(elements) => elements,
        Err(e) => {
            ::log::trace!("Link query {} failed in {:?}: {}", css, ctx.source(), e);
            return Vec::new();
        }
    };

    let mut anchors = Vec::with_capacity(elements.len());
    for element in elements {
        let href = match element.href().await {
            Ok(Some(href)) if !href.is_empty() => href,
            Ok(_) => continue,
            Err(e) => {
                ::log::trace!("Could not read href: {}", e);
                continue;
            }
        };
        let absolute = match element.attr("href").await {
            Ok(raw) => raw.as_deref().is_some_and(is_web_url),
            Err(e) => {
                ::log::trace!("Could not read href attribute: {}", e);
                false
            }
        };
        anchors.push(Anchor {
            link: AdmissionLink {
                url: href,
                source: ctx.source(),
            },
            absolute,
        });
    }
    anchors
}

/// Absolute http or https address
pub fn is_web_url(href: &str) -> bool {
    Url::parse(href)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}
