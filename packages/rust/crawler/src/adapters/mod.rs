//! Crawl adapter trait, built-in brand adapters, and the adapter registry.
//!
//! Every built-in brand is a [`BrandProfile`] run by [`MenuCrawler`]; the
//! registry maps brand ids to constructors in registration order.

mod burger_king;
mod kfc;
mod lotteria;
mod nobrand_burger;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use burgerwatch_shared::{Brand, BurgerWatchError, CrawlConfig, Result, SessionConfig};
use rand::seq::SliceRandom;
use reqwest::Client;

use crate::driver::BrowserLauncher;
use crate::machine::{CrawlBatch, MenuCrawler};
use crate::profile::BrandProfile;

pub use burger_king::profile as burger_king_profile;
pub use kfc::profile as kfc_profile;
pub use lotteria::profile as lotteria_profile;
pub use nobrand_burger::profile as nobrand_burger_profile;

/// User-Agent for plain HTTP fetches when the configured pool is empty.
const USER_AGENT: &str = concat!("BurgerWatch/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// One brand's crawler.
///
/// `crawl` never fails: step failures degrade to a smaller or empty batch
/// and are listed in [`CrawlBatch::failures`].
#[async_trait]
pub trait CrawlAdapter: Send + Sync {
    /// Registry id, the brand's English name.
    fn id(&self) -> &str;

    fn brand(&self) -> &Brand;

    async fn crawl(&self) -> CrawlBatch;
}

/// Shared resources handed to adapter constructors.
#[derive(Clone)]
pub struct CrawlContext {
    pub launcher: Arc<dyn BrowserLauncher>,
    pub session: SessionConfig,
    pub crawl: CrawlConfig,
    /// Client for pages that need no browser.
    pub http: Client,
}

impl CrawlContext {
    pub fn new(
        launcher: Arc<dyn BrowserLauncher>,
        session: SessionConfig,
        crawl: CrawlConfig,
    ) -> Result<Self> {
        let user_agent = session
            .user_agents
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_else(|| USER_AGENT.to_string());

        let http = Client::builder()
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(session.page_load_timeout.max(Duration::from_secs(1)))
            .build()
            .map_err(|e| {
                BurgerWatchError::Navigation(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            launcher,
            session,
            crawl,
            http,
        })
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Builds an adapter from the shared context.
pub type AdapterFactory = Box<dyn Fn(&CrawlContext) -> Box<dyn CrawlAdapter> + Send + Sync>;

/// Brand id → adapter constructor, in registration order.
pub struct AdapterRegistry {
    context: CrawlContext,
    entries: Vec<(String, AdapterFactory)>,
}

impl AdapterRegistry {
    /// Empty registry.
    pub fn new(context: CrawlContext) -> Self {
        Self {
            context,
            entries: Vec::new(),
        }
    }

    /// Registry holding every built-in brand.
    pub fn with_builtin(context: CrawlContext) -> Self {
        let mut registry = Self::new(context);
        for profile in [
            lotteria_profile(),
            burger_king_profile(),
            nobrand_burger_profile(),
            kfc_profile(),
        ] {
            registry.register_profile(profile);
        }
        registry
    }

    /// Register `factory` under `id`, replacing an existing entry in place.
    pub fn register<F>(&mut self, id: impl Into<String>, factory: F)
    where
        F: Fn(&CrawlContext) -> Box<dyn CrawlAdapter> + Send + Sync + 'static,
    {
        let id = id.into();
        let factory: AdapterFactory = Box::new(factory);
        match self.entries.iter_mut().find(|(existing, _)| *existing == id) {
            Some(entry) => entry.1 = factory,
            None => self.entries.push((id, factory)),
        }
    }

    /// Register a profile run by the shared state machine, keyed by its brand id.
    pub fn register_profile(&mut self, profile: BrandProfile) {
        let id = profile.brand.name_eng.clone();
        self.register(id, move |ctx| {
            Box::new(MenuCrawler::new(profile.clone(), ctx.clone())) as Box<dyn CrawlAdapter>
        });
    }

    /// Construct the adapter registered under `id`.
    pub fn create(&self, id: &str) -> Result<Box<dyn CrawlAdapter>> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == id)
            .map(|(_, factory)| factory(&self.context))
            .ok_or_else(|| {
                BurgerWatchError::config(format!(
                    "unknown brand '{id}' (available: {})",
                    self.brands().join(", ")
                ))
            })
    }

    /// Registered ids in order.
    pub fn brands(&self) -> Vec<&str> {
        self.entries.iter().map(|(id, _)| id.as_str()).collect()
    }

    pub fn context(&self) -> &CrawlContext {
        &self.context
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::FixtureLauncher;

    fn context() -> CrawlContext {
        CrawlContext::new(
            Arc::new(FixtureLauncher::new()),
            SessionConfig::default(),
            CrawlConfig::default(),
        )
        .unwrap()
    }

    struct Canned(Brand);

    #[async_trait]
    impl CrawlAdapter for Canned {
        fn id(&self) -> &str {
            &self.0.name_eng
        }
        fn brand(&self) -> &Brand {
            &self.0
        }
        async fn crawl(&self) -> CrawlBatch {
            CrawlBatch::new(self.0.clone())
        }
    }

    #[test]
    fn builtin_order() {
        let registry = AdapterRegistry::with_builtin(context());
        assert_eq!(
            registry.brands(),
            vec!["lotteria", "burger_king", "nobrand_burger", "kfc"]
        );
    }

    #[test]
    fn create_known_and_unknown() {
        let registry = AdapterRegistry::with_builtin(context());
        let adapter = registry.create("kfc").expect("kfc registered");
        assert_eq!(adapter.brand().name, "KFC");

        let err = registry.create("mcdonalds").err().expect("unknown brand");
        let msg = err.to_string();
        assert!(msg.contains("mcdonalds"));
        assert!(msg.contains("lotteria, burger_king"));
    }

    #[test]
    fn register_replaces_in_place() {
        let mut registry = AdapterRegistry::with_builtin(context());
        registry.register("burger_king", |_| {
            Box::new(Canned(Brand::new("가짜버거킹", "burger_king"))) as Box<dyn CrawlAdapter>
        });
        registry.register("momstouch", |_| {
            Box::new(Canned(Brand::new("맘스터치", "momstouch"))) as Box<dyn CrawlAdapter>
        });

        assert_eq!(
            registry.brands(),
            vec!["lotteria", "burger_king", "nobrand_burger", "kfc", "momstouch"]
        );
        let replaced = registry.create("burger_king").unwrap();
        assert_eq!(replaced.brand().name, "가짜버거킹");
    }
}
