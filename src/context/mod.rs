//! Document contexts: the top-level page and its immediate child frames.
//!
//! Every navigation step is written against these traits so the same
//! fallback logic runs over a live WebDriver session or an offline fixture.
#![allow(async_fn_in_trait)]

pub mod webdriver;


use crate::error::ContextError;
use crate::results::ContextSource;
use std::time::Duration;

pub use webdriver::{WebDriverContext, WebDriverElement};

/// A handle to an element inside one document context
pub trait ElementHandle: Sized {
    async fn click(&self) -> Result<(), ContextError>;

    /// Select the element's current contents so typing replaces them
    async fn select_contents(&self) -> Result<(), ContextError>;

    async fn send_keys(&self, text: &str) -> Result<(), ContextError>;

    /// Rendered text of the element and its descendants
    async fn text(&self) -> Result<String, ContextError>;

    /// Resolved `href` of an anchor
    async fn href(&self) -> Result<Option<String>, ContextError>;

    /// Attribute value exactly as written in the markup
    async fn attr(&self, name: &str) -> Result<Option<String>, ContextError>;

    async fn is_displayed(&self) -> Result<bool, ContextError>;

    /// Descendants matching a CSS selector, in document order
    async fn find_all(&self, css: &str) -> Result<Vec<Self>, ContextError>;
}

/// The top-level page, or one frame inside it
pub trait DocumentContext: Sized {
    type Element: ElementHandle;

    fn source(&self) -> ContextSource;

    async fn current_url(&self) -> Result<String, ContextError>;

    async fn goto(&self, url: &str) -> Result<(), ContextError>;

    /// Elements matching a CSS selector, in document order
    async fn find_all(&self, css: &str) -> Result<Vec<Self::Element>, ContextError>;

    /// `tag` elements whose text contains `text`, in document order
    async fn find_by_text(&self, tag: &str, text: &str)
    -> Result<Vec<Self::Element>, ContextError>;

    /// Immediate child frames of the top-level page.
    ///
    /// Frames are leaves: calling this on a frame context yields nothing.
    async fn frames(&self) -> Result<Vec<Self>, ContextError>;

    /// Press Enter at page level, reaching whichever element holds focus
    async fn press_enter(&self) -> Result<(), ContextError>;

    /// PNG screenshot of the visible page
    async fn screenshot(&self) -> Result<Vec<u8>, ContextError>;

    /// Open `url` in a short-lived secondary tab, wait `pause`, screenshot it,
    /// then close the tab and return to this context's window
    async fn capture_external(&self, url: &str, pause: Duration)
    -> Result<Vec<u8>, ContextError>;
}

/// Resolve a context source back to a live context, starting from the top-level page
pub async fn context_for<C: DocumentContext + Clone>(
    top: &C,
    source: ContextSource,
) -> Result<Option<C>, ContextError> {
    match source {
        ContextSource::TopLevel => Ok(Some(top.clone())),
        ContextSource::Frame(index) => Ok(top.frames().await?.into_iter().nth(index)),
    }
}
