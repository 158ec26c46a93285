//! In-memory browser serving canned HTML.
//!
//! Pages are keyed by URL. Clicks resolve the clicked element's `id` or
//! cleaned text and, when a transition is registered for that key, swap the
//! current document. Launch and close calls are counted so tests can check
//! that every acquired session is released.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use burgerwatch_shared::{BurgerWatchError, Result, SessionConfig};

use crate::driver::{BrowserLauncher, BrowserPage};
use crate::locate;

#[derive(Debug, Clone, Default)]
struct Site {
    pages: HashMap<String, String>,
    transitions: HashMap<String, String>,
    failing: HashSet<String>,
}

/// Launcher for [`FixturePage`]s sharing one canned site.
#[derive(Debug, Default)]
pub struct FixtureLauncher {
    site: Arc<Site>,
    fail_launch: bool,
    acquired: Arc<AtomicUsize>,
    released: Arc<AtomicUsize>,
}

impl FixtureLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    fn site_mut(&mut self) -> &mut Site {
        Arc::make_mut(&mut self.site)
    }

    /// Serve `html` at `url`.
    pub fn page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.site_mut().pages.insert(url.into(), html.into());
        self
    }

    /// Replace the current document with `html` when an element whose `id`
    /// or text equals `key` is clicked.
    pub fn on_click(mut self, key: impl Into<String>, html: impl Into<String>) -> Self {
        self.site_mut().transitions.insert(key.into(), html.into());
        self
    }

    /// Navigation to `url` fails with a navigation error.
    pub fn fail_goto(mut self, url: impl Into<String>) -> Self {
        self.site_mut().failing.insert(url.into());
        self
    }

    /// Every launch fails as if no browser were installed.
    pub fn fail_launch(mut self) -> Self {
        self.fail_launch = true;
        self
    }

    /// Number of successful launches.
    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    /// Number of pages closed.
    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BrowserLauncher for FixtureLauncher {
    async fn launch(&self, _config: &SessionConfig) -> Result<Box<dyn BrowserPage>> {
        if self.fail_launch {
            return Err(BurgerWatchError::DriverNotFound(
                "fixture launcher configured to fail".into(),
            ));
        }
        self.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FixturePage {
            site: Arc::clone(&self.site),
            current: String::from("<html><body></body></html>"),
            released: Arc::clone(&self.released),
            closed: false,
        }))
    }
}

/// One tab of the canned site.
pub struct FixturePage {
    site: Arc<Site>,
    current: String,
    released: Arc<AtomicUsize>,
    closed: bool,
}

#[async_trait]
impl BrowserPage for FixturePage {
    async fn goto(&mut self, url: &str) -> Result<()> {
        if self.site.failing.contains(url) {
            return Err(BurgerWatchError::Navigation(format!("{url}: page load timed out")));
        }
        match self.site.pages.get(url) {
            Some(html) => {
                self.current = html.clone();
                Ok(())
            }
            None => Err(BurgerWatchError::Navigation(format!("{url}: 404 Not Found"))),
        }
    }

    async fn content(&mut self) -> Result<String> {
        Ok(self.current.clone())
    }

    async fn click_selector(&mut self, css_path: &str) -> Result<bool> {
        let Some((id, text)) = locate::text_at(&self.current, css_path) else {
            return Ok(false);
        };
        let next = id
            .and_then(|id| self.site.transitions.get(&id))
            .or_else(|| self.site.transitions.get(&text));
        if let Some(html) = next {
            self.current = html.clone();
        }
        Ok(true)
    }

    async fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.closed = true;
            self.released.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}
