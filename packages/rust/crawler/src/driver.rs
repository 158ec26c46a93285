//! Browser driver seam and the Chrome DevTools implementation.
//!
//! [`BrowserLauncher`] starts a browser and hands back one [`BrowserPage`];
//! everything above this module talks to those two traits only.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use burgerwatch_shared::{BurgerWatchError, Result, SessionConfig};
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, SetBlockedUrLsParams, SetUserAgentOverrideParams,
};
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures_util::StreamExt;
use rand::seq::SliceRandom;
use tracing::{debug, warn};

/// Environment variable that overrides browser discovery.
pub const CHROME_ENV: &str = "CHROME";

/// Chrome has no launch flag that turns stylesheets off, so they are
/// blocked at the network layer once the page exists.
pub const BLOCKED_RESOURCES: &[&str] = &["*.css", "*.css?*"];

/// Launch flags that skip rendering work the crawler never needs.
const LAUNCH_ARGS: &[&str] = &[
    "--no-sandbox",
    "--disable-dev-shm-usage",
    "--disable-gpu",
    "--blink-settings=imagesEnabled=false",
    "--disable-plugins",
    "--disable-extensions",
    "--disable-background-networking",
    "--disable-background-timer-throttling",
    "--disable-renderer-backgrounding",
    "--disable-default-apps",
    "--disable-popup-blocking",
    "--disable-sync",
    "--disable-translate",
    "--mute-audio",
];

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// A single open browser tab. Dropping it without [`close`](Self::close)
/// leaks the browser process until the handle is dropped.
#[async_trait]
pub trait BrowserPage: Send {
    /// Navigate and wait for the load to finish, bounded by the page-load timeout.
    async fn goto(&mut self, url: &str) -> Result<()>;

    /// Serialized DOM of the current document.
    async fn content(&mut self) -> Result<String>;

    /// Dispatch a DOM `click()` on the element at `css_path`.
    /// Returns `false` when nothing matches the path.
    async fn click_selector(&mut self, css_path: &str) -> Result<bool>;

    /// Close the page and shut the browser down.
    async fn close(&mut self) -> Result<()>;
}

/// Starts browser instances.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self, config: &SessionConfig) -> Result<Box<dyn BrowserPage>>;
}

// ---------------------------------------------------------------------------
// Chrome
// ---------------------------------------------------------------------------

/// Launches Chromium-family browsers over the DevTools protocol.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromeLauncher;

#[async_trait]
impl BrowserLauncher for ChromeLauncher {
    async fn launch(&self, config: &SessionConfig) -> Result<Box<dyn BrowserPage>> {
        let executable = resolve_browser_path(config.executable.as_deref())?;
        debug!(path = %executable.display(), headless = config.headless, "launching browser");

        let mut builder = BrowserConfig::builder()
            .chrome_executable(&executable)
            .args(LAUNCH_ARGS.iter().copied())
            .request_timeout(config.page_load_timeout);
        if !config.headless {
            builder = builder.with_head();
        }
        let browser_config = builder
            .build()
            .map_err(|e| BurgerWatchError::Navigation(format!("browser config: {e}")))?;

        let (mut browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| BurgerWatchError::Navigation(format!("failed to launch browser: {e}")))?;

        // The handler must be polled for the connection to make progress
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("browser handler event error: {e}");
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                let _ = browser.close().await;
                handler_task.abort();
                return Err(BurgerWatchError::Navigation(format!("failed to open page: {e}")));
            }
        };

        if let Err(e) = block_stylesheets(&page).await {
            warn!("could not block stylesheets: {e}");
        }

        if let Some(user_agent) = pick_user_agent(&config.user_agents) {
            if let Err(e) = page
                .set_user_agent(SetUserAgentOverrideParams::new(user_agent))
                .await
            {
                warn!("could not override user agent: {e}");
            }
        }

        Ok(Box::new(ChromePage {
            browser,
            page: Some(page),
            handler_task,
            page_load_timeout: config.page_load_timeout,
        }))
    }
}

struct ChromePage {
    browser: Browser,
    page: Option<Page>,
    handler_task: tokio::task::JoinHandle<()>,
    page_load_timeout: Duration,
}

impl ChromePage {
    fn page(&self) -> Result<&Page> {
        self.page
            .as_ref()
            .ok_or_else(|| BurgerWatchError::Navigation("page already closed".into()))
    }
}

#[async_trait]
impl BrowserPage for ChromePage {
    async fn goto(&mut self, url: &str) -> Result<()> {
        let page = self.page()?;
        match tokio::time::timeout(self.page_load_timeout, page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(BurgerWatchError::Navigation(format!("{url}: {e}"))),
            Err(_) => Err(BurgerWatchError::Navigation(format!(
                "{url}: page load exceeded {}s",
                self.page_load_timeout.as_secs()
            ))),
        }
    }

    async fn content(&mut self) -> Result<String> {
        self.page()?
            .content()
            .await
            .map_err(|e| BurgerWatchError::Navigation(format!("read page content: {e}")))
    }

    async fn click_selector(&mut self, css_path: &str) -> Result<bool> {
        let script = click_script(css_path);
        self.page()?
            .evaluate(script)
            .await
            .map_err(|e| BurgerWatchError::Navigation(format!("click dispatch: {e}")))?
            .into_value::<bool>()
            .map_err(|e| BurgerWatchError::parse(format!("click result: {e}")))
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                debug!("page close failed: {e}");
            }
        }
        let result = self.browser.close().await;
        let _ = self.browser.wait().await;
        self.handler_task.abort();
        result
            .map(|_| ())
            .map_err(|e| BurgerWatchError::Navigation(format!("browser shutdown: {e}")))
    }
}

/// Script that clicks the element at `css_path` and reports whether it existed.
fn click_script(css_path: &str) -> String {
    let quoted = serde_json::to_string(css_path).unwrap_or_else(|_| "\"\"".into());
    format!(
        "(() => {{ const el = document.querySelector({quoted}); \
         if (!el) return false; el.click(); return true; }})()"
    )
}

async fn block_stylesheets(page: &Page) -> chromiumoxide::Result<()> {
    page.execute(EnableParams::default()).await?;
    page.execute(blocked_resources()).await?;
    Ok(())
}

fn blocked_resources() -> SetBlockedUrLsParams {
    SetBlockedUrLsParams::new(BLOCKED_RESOURCES.iter().map(|p| p.to_string()).collect())
}

fn pick_user_agent(pool: &[String]) -> Option<String> {
    pool.choose(&mut rand::thread_rng()).cloned()
}

// ---------------------------------------------------------------------------
// Executable discovery
// ---------------------------------------------------------------------------

#[cfg(target_os = "macos")]
const WELL_KNOWN_PATHS: &[&str] = &[
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    "/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
];

#[cfg(target_os = "windows")]
const WELL_KNOWN_PATHS: &[&str] = &[
    r"C:\Program Files\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe",
];

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const WELL_KNOWN_PATHS: &[&str] = &[
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
    "/snap/bin/chromium",
];

const PATH_NAMES: &[&str] = &[
    "chromium",
    "chromium-browser",
    "google-chrome",
    "chrome",
    "msedge",
];

/// Find a browser executable.
///
/// Order: configured path (must exist), `$CHROME`, well-known install
/// locations, then a `PATH` scan.
pub fn resolve_browser_path(configured: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = configured {
        return if path.is_file() {
            Ok(path.to_path_buf())
        } else {
            Err(BurgerWatchError::DriverNotFound(format!(
                "configured browser executable not found at {}",
                path.display()
            )))
        };
    }

    if let Some(path) = std::env::var_os(CHROME_ENV).map(PathBuf::from) {
        if path.is_file() {
            return Ok(path);
        }
        warn!(path = %path.display(), "${CHROME_ENV} does not point to a file, ignoring");
    }

    if let Some(path) = WELL_KNOWN_PATHS.iter().map(PathBuf::from).find(|p| p.is_file()) {
        return Ok(path);
    }

    if let Some(dirs) = std::env::var_os("PATH") {
        for dir in std::env::split_paths(&dirs) {
            for name in PATH_NAMES {
                let candidate = dir.join(format!("{name}{}", std::env::consts::EXE_SUFFIX));
                if candidate.is_file() {
                    return Ok(candidate);
                }
            }
        }
    }

    Err(BurgerWatchError::DriverNotFound(
        "no Chrome, Chromium, or Edge executable found; set browser.executable or $CHROME"
            .into(),
    ))
}
