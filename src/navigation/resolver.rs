use crate::context::{DocumentContext, ElementHandle};
use crate::error::{ContextError, TimedOut};
use crate::results::ContextSource;
use std::time::Duration;
use tokio::time::{Instant, sleep};

/// How often a bounded wait re-runs its query
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// One way of locating an element. Candidate lists are slices of these,
/// highest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query<'a> {
    /// Structural CSS selector
    Css(&'a str),

    /// `tag` elements whose text contains `text`
    TextContains { tag: &'a str, text: &'a str },

    /// `container` elements having a `descendant` whose text contains `text`;
    /// the container is the match
    DescendantText {
        container: &'a str,
        descendant: &'a str,
        text: &'a str,
    },
}

impl Query<'_> {
    /// First displayed element this query matches in `ctx`
    pub async fn find<C: DocumentContext>(
        &self,
        ctx: &C,
    ) -> Result<Option<C::Element>, ContextError> {
        let candidates = match *self {
            Query::Css(css) => ctx.find_all(css).await?,
            Query::TextContains { tag, text } => ctx.find_by_text(tag, text).await?,
            Query::DescendantText {
                container,
                descendant,
                text,
            } => {
                let mut matched = Vec::new();
                for outer in ctx.find_all(container).await? {
                    if has_descendant_text(&outer, descendant, text).await {
                        matched.push(outer);
                    }
                }
                matched
            }
        };

        for element in candidates {
            if element.is_displayed().await.unwrap_or(false) {
                return Ok(Some(element));
            }
        }
        Ok(None)
    }
}

async fn has_descendant_text<E: ElementHandle>(outer: &E, descendant: &str, text: &str) -> bool {
    let Ok(inner) = outer.find_all(descendant).await else {
        return false;
    };
    for node in inner {
        if let Ok(content) = node.text().await {
            if content.trim().contains(text) {
                return true;
            }
        }
    }
    false
}

/// A successful resolution and where it came from
#[derive(Debug, Clone)]
pub struct Resolved<E> {
    pub element: E,
    /// Index of the matching entry in the candidate list
    pub candidate: usize,
    pub source: ContextSource,
}

/// Search budget for a top-level-then-frames resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepPlan {
    /// Wait per candidate in the top-level document
    pub top_level: Duration,
    /// Wait per candidate in each frame; `None` disables the frame sweep
    pub per_frame: Option<Duration>,
}

impl SweepPlan {
    pub fn with_frames(top_level: Duration, per_frame: Duration) -> Self {
        Self {
            top_level,
            per_frame: Some(per_frame),
        }
    }

    pub fn top_level_only(top_level: Duration) -> Self {
        Self {
            top_level,
            per_frame: None,
        }
    }
}

/// Poll `query` in `ctx` until it matches or `timeout` elapses.
///
/// A zero timeout makes exactly one attempt.
pub async fn wait_for<C: DocumentContext>(
    ctx: &C,
    query: &Query<'_>,
    timeout: Duration,
) -> Result<C::Element, TimedOut> {
    let deadline = Instant::now() + timeout;
    loop {
        match query.find(ctx).await {
            Ok(Some(element)) => return Ok(element),
            Ok(None) => {}
            Err(e) => ::log::trace!("{:?} failed in {:?}: {}", query, ctx.source(), e),
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(TimedOut);
        }
        sleep((deadline - now).min(POLL_INTERVAL)).await;
    }
}

/// Wait until the context's address differs from `from`
pub async fn wait_for_navigation<C: DocumentContext>(
    ctx: &C,
    from: &str,
    timeout: Duration,
) -> Result<String, TimedOut> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Ok(url) = ctx.current_url().await {
            if url != from {
                return Ok(url);
            }
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(TimedOut);
        }
        sleep((deadline - now).min(POLL_INTERVAL)).await;
    }
}

/// Try every candidate in every context, in order, and return the first match.
///
/// Each (context, candidate) attempt gets its own bounded wait of `timeout`.
pub async fn resolve<C: DocumentContext>(
    contexts: &[C],
    candidates: &[Query<'_>],
    timeout: Duration,
) -> Option<Resolved<C::Element>> {
    for ctx in contexts {
        for (index, query) in candidates.iter().enumerate() {
            if let Ok(element) = wait_for(ctx, query, timeout).await {
                ::log::debug!(
                    "Resolved {:?} (candidate {}) in {:?}",
                    query,
                    index,
                    ctx.source()
                );
                return Some(Resolved {
                    element,
                    candidate: index,
                    source: ctx.source(),
                });
            }
        }
    }
    None
}

/// Resolve in the top-level document, then sweep its frames with the
/// shorter per-frame budget
pub async fn resolve_with_frames<C: DocumentContext>(
    top: &C,
    candidates: &[Query<'_>],
    plan: SweepPlan,
) -> Option<Resolved<C::Element>> {
    if let Some(found) = resolve(std::slice::from_ref(top), candidates, plan.top_level).await {
        return Some(found);
    }

    let per_frame = plan.per_frame?;
    let frames = match top.frames().await {
        Ok(frames) => frames,
        Err(e) => {
            ::log::debug!("Could not enumerate frames: {}", e);
            return None;
        }
    };
    ::log::trace!("Sweeping {} frames for {:?}", frames.len(), candidates);
    resolve(&frames, candidates, per_frame).await
}
