use super::{DocumentContext, ElementHandle};
use crate::config::Viewport;
use crate::error::ContextError;
use crate::results::ContextSource;
use fantoccini::actions::{InputSource, KeyAction, KeyActions};
use fantoccini::elements::Element;
use fantoccini::key::Key;
use fantoccini::{Client, ClientBuilder, Locator};
use std::time::Duration;

/// A WebDriver session viewed through one document: the top-level page or one
/// of its frames.
///
/// WebDriver has a single "current frame" per session, so every command first
/// switches to the frame this context stands for.
#[derive(Clone)]
pub struct WebDriverContext {
    client: Client,
    frame: Option<u16>,
}

/// An element bound to the context it was found in
#[derive(Clone)]
pub struct WebDriverElement {
    context: WebDriverContext,
    inner: Element,
}

impl WebDriverContext {
    /// Connect to a WebDriver server and size the window
    pub async fn connect(webdriver_url: &str, viewport: Viewport) -> Result<Self, ContextError> {
        let client = connect_to_webdriver(webdriver_url)
            .await
            .ok_or_else(|| ContextError::Connect(webdriver_url.to_string()))?;

        if let Err(e) = client
            .set_window_size(viewport.width, viewport.height)
            .await
        {
            ::log::warn!("Failed to set viewport {:?}: {}", viewport, e);
        }

        Ok(Self {
            client,
            frame: None,
        })
    }

    /// End the WebDriver session
    pub async fn close(self) -> Result<(), ContextError> {
        self.client.close().await?;
        Ok(())
    }

    async fn focus(&self) -> Result<(), ContextError> {
        self.client.enter_frame(None).await?;
        if let Some(index) = self.frame {
            self.client.enter_frame(Some(index)).await?;
        }
        Ok(())
    }

    fn wrap(&self, elements: Vec<Element>) -> Vec<WebDriverElement> {
        elements
            .into_iter()
            .map(|inner| WebDriverElement {
                context: self.clone(),
                inner,
            })
            .collect()
    }
}

/// Connects to the WebDriver instance, trying common local ports if the
/// configured one is down
async fn connect_to_webdriver(webdriver_url: &str) -> Option<Client> {
    match ClientBuilder::native().connect(webdriver_url).await {
        Ok(client) => {
            ::log::debug!("Connected to WebDriver at {}", webdriver_url);
            return Some(client);
        }
        Err(e) => {
            ::log::error!(
                "Failed to connect to WebDriver at {}: {}",
                webdriver_url,
                e
            );
        }
    }

    let fallback_urls = [
        "http://localhost:9515", // ChromeDriver default
        "http://localhost:4444", // Selenium / geckodriver default
        "http://127.0.0.1:4444",
    ];

    for url in fallback_urls.iter() {
        if *url == webdriver_url {
            continue;
        }

        ::log::info!("Trying fallback WebDriver URL: {}", url);
        if let Ok(client) = ClientBuilder::native().connect(url).await {
            ::log::debug!("Connected to fallback WebDriver at {}", url);
            return Some(client);
        }
    }

    ::log::error!(
        "Make sure a WebDriver server is running or set the WEBDRIVER_URL environment variable"
    );
    None
}

/// Quote a string as an XPath literal, splitting on `'` when needed
fn xpath_literal(text: &str) -> String {
    if !text.contains('\'') {
        return format!("'{}'", text);
    }
    let parts: Vec<String> = text.split('\'').map(|p| format!("'{}'", p)).collect();
    format!("concat({})", parts.join(", \"'\", "))
}

impl DocumentContext for WebDriverContext {
    type Element = WebDriverElement;

    fn source(&self) -> ContextSource {
        match self.frame {
            None => ContextSource::TopLevel,
            Some(index) => ContextSource::Frame(index as usize),
        }
    }

    async fn current_url(&self) -> Result<String, ContextError> {
        Ok(self.client.current_url().await?.to_string())
    }

    async fn goto(&self, url: &str) -> Result<(), ContextError> {
        self.client.goto(url).await?;
        Ok(())
    }

    async fn find_all(&self, css: &str) -> Result<Vec<WebDriverElement>, ContextError> {
        self.focus().await?;
        let found = self.client.find_all(Locator::Css(css)).await?;
        Ok(self.wrap(found))
    }

    async fn find_by_text(
        &self,
        tag: &str,
        text: &str,
    ) -> Result<Vec<WebDriverElement>, ContextError> {
        let xpath = format!(
            "//{}[contains(normalize-space(.), {})]",
            tag,
            xpath_literal(text)
        );
        self.focus().await?;
        let found = self.client.find_all(Locator::XPath(&xpath)).await?;
        Ok(self.wrap(found))
    }

    async fn frames(&self) -> Result<Vec<WebDriverContext>, ContextError> {
        if self.frame.is_some() {
            return Ok(Vec::new());
        }
        self.focus().await?;
        let count = self.client.find_all(Locator::Css("iframe, frame")).await?.len();
        ::log::trace!("Top-level document has {} frames", count);

        Ok((0..count.min(u16::MAX as usize))
            .map(|index| WebDriverContext {
                client: self.client.clone(),
                frame: Some(index as u16),
            })
            .collect())
    }

    async fn press_enter(&self) -> Result<(), ContextError> {
        // No frame switch: the key goes to whatever currently has focus
        let enter: char = Key::Enter.into();
        let actions = KeyActions::new("keyboard".to_string())
            .then(KeyAction::Down { value: enter })
            .then(KeyAction::Up { value: enter });
        self.client.perform_actions(actions).await?;
        Ok(())
    }

    async fn screenshot(&self) -> Result<Vec<u8>, ContextError> {
        self.client.enter_frame(None).await?;
        Ok(self.client.screenshot().await?)
    }

    async fn capture_external(&self, url: &str, pause: Duration) -> Result<Vec<u8>, ContextError> {
        let original = self.client.window().await?;
        let tab = self.client.new_window(true).await?;
        self.client.switch_to_window(tab.handle).await?;

        let shot = async {
            self.client.goto(url).await?;
            tokio::time::sleep(pause).await;
            self.client.screenshot().await
        }
        .await;

        if let Err(e) = self.client.close_window().await {
            ::log::warn!("Failed to close secondary tab for {}: {}", url, e);
        }
        self.client.switch_to_window(original).await?;

        Ok(shot?)
    }
}

impl ElementHandle for WebDriverElement {
    async fn click(&self) -> Result<(), ContextError> {
        self.context.focus().await?;
        self.inner.click().await?;
        Ok(())
    }

    async fn select_contents(&self) -> Result<(), ContextError> {
        self.context.focus().await?;
        self.inner.click().await?;
        let arg = serde_json::to_value(&self.inner)
            .map_err(|e| ContextError::Script(e.to_string()))?;
        self.context
            .client
            .execute(
                "if (arguments[0].select) { arguments[0].select(); }",
                vec![arg],
            )
            .await?;
        Ok(())
    }

    async fn send_keys(&self, text: &str) -> Result<(), ContextError> {
        self.context.focus().await?;
        self.inner.send_keys(text).await?;
        Ok(())
    }

    async fn text(&self) -> Result<String, ContextError> {
        self.context.focus().await?;
        Ok(self.inner.text().await?)
    }

    async fn href(&self) -> Result<Option<String>, ContextError> {
        self.context.focus().await?;
        Ok(self.inner.prop("href").await?)
    }

    async fn attr(&self, name: &str) -> Result<Option<String>, ContextError> {
        self.context.focus().await?;
        Ok(self.inner.attr(name).await?)
    }

    async fn is_displayed(&self) -> Result<bool, ContextError> {
        self.context.focus().await?;
        Ok(self.inner.is_displayed().await?)
    }

    async fn find_all(&self, css: &str) -> Result<Vec<WebDriverElement>, ContextError> {
        self.context.focus().await?;
        let found = self.inner.find_all(Locator::Css(css)).await?;
        Ok(self.context.wrap(found))
    }
}
