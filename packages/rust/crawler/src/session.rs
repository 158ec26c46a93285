//! Browser automation session: one browser, scoped to one crawl.

use std::time::Instant;

use burgerwatch_shared::{BurgerWatchError, Result, SessionConfig};
use tracing::{debug, warn};

use crate::driver::{BrowserLauncher, BrowserPage};
use crate::locate::{self, ElementMatch, Strategy};

/// An acquired browser plus the wait policy used for element lookups.
///
/// Callers must [`release`](Self::release) the session on every exit path.
pub struct BrowserSession {
    page: Option<Box<dyn BrowserPage>>,
    config: SessionConfig,
}

impl BrowserSession {
    /// Launch a browser configured by `config`.
    pub async fn acquire(launcher: &dyn BrowserLauncher, config: &SessionConfig) -> Result<Self> {
        let page = launcher.launch(config).await?;
        debug!("browser session acquired");
        Ok(Self {
            page: Some(page),
            config: config.clone(),
        })
    }

    fn page(&mut self) -> Result<&mut Box<dyn BrowserPage>> {
        self.page
            .as_mut()
            .ok_or_else(|| BurgerWatchError::Navigation("browser session already released".into()))
    }

    pub async fn goto(&mut self, url: &str) -> Result<()> {
        debug!(url, "navigating");
        self.page()?.goto(url).await
    }

    pub async fn content(&mut self) -> Result<String> {
        self.page()?.content().await
    }

    /// Evaluate `strategies` in order and return the first visible, enabled match.
    ///
    /// Waiting strategies re-read the DOM every poll interval until the
    /// implicit wait elapses; the others look once.
    pub async fn find_first_match(&mut self, strategies: &[Strategy]) -> Result<ElementMatch> {
        for strategy in strategies {
            let deadline = Instant::now() + self.config.implicit_wait;
            loop {
                let html = self.content().await?;
                if let Some(found) = locate::find_in(&html, &strategy.locator)? {
                    debug!(locator = %strategy.locator, selector = %found.selector, "element matched");
                    return Ok(found);
                }
                if !strategy.wait || Instant::now() >= deadline {
                    break;
                }
                tokio::time::sleep(self.config.poll_interval).await;
            }
        }
        Err(BurgerWatchError::element_not_found(locate::describe(strategies)))
    }

    /// Click via a script-dispatched DOM `click()`, bypassing overlays.
    pub async fn click(&mut self, element: &ElementMatch) -> Result<()> {
        if self.page()?.click_selector(&element.selector).await? {
            Ok(())
        } else {
            Err(BurgerWatchError::element_not_found(format!(
                "'{}' detached before click",
                element.text
            )))
        }
    }

    /// Find with `strategies`, then click the match.
    pub async fn find_and_click(&mut self, strategies: &[Strategy]) -> Result<ElementMatch> {
        let found = self.find_first_match(strategies).await?;
        self.click(&found).await?;
        Ok(found)
    }

    /// Quit the browser.
    pub async fn release(mut self) -> Result<()> {
        match self.page.take() {
            Some(mut page) => {
                let result = page.close().await;
                debug!("browser session released");
                result
            }
            None => Ok(()),
        }
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        if self.page.is_some() {
            warn!("browser session dropped without release");
        }
    }
}
