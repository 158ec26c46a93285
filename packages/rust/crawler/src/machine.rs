//! The menu crawl state machine shared by every brand.
//!
//! ```text
//! Init → NavigateToMenu → [OpenFilterModal → ApplySelectedFilter]
//!      → CollectCategoryItems → ParseItems → [VisitDetailPage → ExtractNutrition]
//!      → Done
//! ```
//!
//! `Failed` is reachable from any step. Step failures never escape
//! [`MenuCrawler::crawl`]: they end the run with whatever was parsed so far and
//! are recorded in [`CrawlBatch::failures`].

use std::collections::HashSet;

use async_trait::async_trait;
use burgerwatch_shared::{Brand, BurgerWatchError, DraftProduct, Result};
use scraper::{Html, Selector};
use tracing::{debug, info, instrument, warn};

use crate::adapters::{CrawlAdapter, CrawlContext};
use crate::extract::{
    ExclusionFilter, element_text, extract_embedded_array, extract_price, infer_patty,
    parse_nutrition_table, template,
};
use crate::locate::{Locator, Strategy, is_visible};
use crate::profile::{
    BrandProfile, DetailSpec, EmbeddedMenu, ItemSelectors, MenuSource, RawItem, RenderedMenu,
};
use crate::session::BrowserSession;

// ---------------------------------------------------------------------------
// States and batches
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlState {
    Init,
    NavigateToMenu,
    OpenFilterModal,
    ApplySelectedFilter,
    CollectCategoryItems,
    ParseItems,
    VisitDetailPage,
    ExtractNutrition,
    Done,
    Failed,
}

impl CrawlState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::NavigateToMenu => "navigate_to_menu",
            Self::OpenFilterModal => "open_filter_modal",
            Self::ApplySelectedFilter => "apply_selected_filter",
            Self::CollectCategoryItems => "collect_category_items",
            Self::ParseItems => "parse_items",
            Self::VisitDetailPage => "visit_detail_page",
            Self::ExtractNutrition => "extract_nutrition",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl std::fmt::Display for CrawlState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one adapter invocation.
#[derive(Debug, Clone)]
pub struct CrawlBatch {
    pub brand: Brand,
    /// Draft products in discovery order, unique by name.
    pub items: Vec<DraftProduct>,
    /// States entered, in order.
    pub states: Vec<CrawlState>,
    /// Cause of every degraded step.
    pub failures: Vec<String>,
}

impl CrawlBatch {
    pub fn new(brand: Brand) -> Self {
        Self {
            brand,
            items: Vec::new(),
            states: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Empty batch for a crawl that could not run at all.
    pub fn failed(brand: Brand, cause: impl Into<String>) -> Self {
        Self {
            states: vec![CrawlState::Failed],
            failures: vec![cause.into()],
            ..Self::new(brand)
        }
    }

    pub fn final_state(&self) -> Option<CrawlState> {
        self.states.last().copied()
    }

    pub fn is_degraded(&self) -> bool {
        !self.failures.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

/// A failed step: the step's name and its cause.
type StepError = (&'static str, BurgerWatchError);

/// Crawl adapter driving a [`BrandProfile`] through the shared state machine.
pub struct MenuCrawler {
    profile: BrandProfile,
    ctx: CrawlContext,
}

impl MenuCrawler {
    pub fn new(profile: BrandProfile, ctx: CrawlContext) -> Self {
        Self { profile, ctx }
    }

    pub fn profile(&self) -> &BrandProfile {
        &self.profile
    }

    fn enter(&self, batch: &mut CrawlBatch, state: CrawlState) {
        debug!(brand = %self.profile.brand.name_eng, state = %state, "transition");
        batch.states.push(state);
    }

    fn degrade(&self, batch: &mut CrawlBatch, step: &str, err: &BurgerWatchError) {
        warn!(brand = %self.profile.brand.name_eng, step, error = %err, "crawl step degraded");
        batch.failures.push(format!("{step}: {err}"));
    }

    async fn drive(
        &self,
        session: &mut Option<BrowserSession>,
        batch: &mut CrawlBatch,
    ) -> std::result::Result<(), StepError> {
        self.enter(batch, CrawlState::NavigateToMenu);
        let raw = match &self.profile.menu {
            MenuSource::Embedded(menu) => self
                .fetch_embedded(menu)
                .await
                .map_err(|e| ("navigate to menu", e))?,
            MenuSource::Rendered(menu) => {
                let s = session.as_mut().ok_or((
                    "navigate to menu",
                    BurgerWatchError::Navigation("no browser session".into()),
                ))?;
                self.walk_rendered(s, menu, batch).await?
            }
        };

        self.enter(batch, CrawlState::ParseItems);
        batch.items = self.parse_items(raw);
        info!(
            brand = %self.profile.brand.name_eng,
            items = batch.items.len(),
            "items parsed"
        );

        let Some(detail) = self.profile.detail_visits(&self.ctx.crawl) else {
            return Ok(());
        };
        if batch.items.is_empty() {
            return Ok(());
        }
        // Listings read over HTTP only need a browser from here on
        if session.is_none() {
            match BrowserSession::acquire(self.ctx.launcher.as_ref(), &self.ctx.session).await {
                Ok(s) => *session = Some(s),
                Err(e) => {
                    self.degrade(batch, "acquire browser", &e);
                    return Ok(());
                }
            }
        }
        if let Some(s) = session.as_mut() {
            self.enter(batch, CrawlState::VisitDetailPage);
            self.visit_details(s, detail, batch).await;
            self.enter(batch, CrawlState::ExtractNutrition);
        }
        Ok(())
    }

    async fn fetch_embedded(&self, menu: &EmbeddedMenu) -> Result<Vec<RawItem>> {
        let url = self.profile.menu_url();
        debug!(url = %url, "fetching embedded menu");
        let nav = |e: reqwest::Error| BurgerWatchError::Navigation(format!("{url}: {e}"));
        let body = self
            .ctx
            .http
            .get(&url)
            .send()
            .await
            .map_err(nav)?
            .error_for_status()
            .map_err(nav)?
            .text()
            .await
            .map_err(nav)?;

        let records = extract_embedded_array(&body, &menu.variable)?;
        Ok(records
            .iter()
            .filter_map(|record| (menu.parse)(record, &self.profile))
            .collect())
    }

    async fn walk_rendered(
        &self,
        s: &mut BrowserSession,
        menu: &RenderedMenu,
        batch: &mut CrawlBatch,
    ) -> std::result::Result<Vec<RawItem>, StepError> {
        s.goto(&self.profile.menu_url())
            .await
            .map_err(|e| ("navigate to menu", e))?;

        if let Some(filter) = &menu.filter {
            self.enter(batch, CrawlState::OpenFilterModal);
            s.find_and_click(&filter.open)
                .await
                .map_err(|e| ("open filter modal", e))?;

            self.enter(batch, CrawlState::ApplySelectedFilter);
            let picked = s
                .find_and_click(&filter.option)
                .await
                .map_err(|e| ("apply filter", e))?;
            if !filter.confirm.is_empty() {
                s.find_and_click(&filter.confirm)
                    .await
                    .map_err(|e| ("apply filter", e))?;
            }
            debug!(option = %picked.text, "filter applied");
        }

        self.enter(batch, CrawlState::CollectCategoryItems);
        let mut raw = Vec::new();

        if menu.categories.is_empty() {
            match self.collect_section(s, &menu.items, None).await {
                Ok(found) => raw.extend(found),
                Err(e) => self.degrade(batch, "collect category items", &e),
            }
        }

        // A missing tab or an empty category skips that category. Any other
        // error stops the walk, keeping what was already collected.
        for category in &menu.categories {
            let step = format!("category '{}'", category.label);
            if !category.tab.is_empty() {
                match s.find_and_click(&category.tab).await {
                    Ok(_) => {}
                    Err(e @ BurgerWatchError::ElementNotFound { .. }) => {
                        self.degrade(batch, &step, &e);
                        continue;
                    }
                    Err(e) => {
                        self.degrade(batch, &step, &e);
                        break;
                    }
                }
            }
            match self
                .collect_section(s, &menu.items, category.section.as_deref())
                .await
            {
                Ok(found) => {
                    debug!(category = %category.label, cards = found.len(), "category collected");
                    raw.extend(found);
                }
                Err(e @ BurgerWatchError::ElementNotFound { .. }) => {
                    self.degrade(batch, &step, &e);
                }
                Err(e) => {
                    self.degrade(batch, &step, &e);
                    break;
                }
            }
        }

        Ok(raw)
    }

    /// Wait for the first card to render, then read every card in view.
    async fn collect_section(
        &self,
        s: &mut BrowserSession,
        items: &ItemSelectors,
        section: Option<&str>,
    ) -> Result<Vec<RawItem>> {
        let card = match section {
            Some(section) => format!("{section} {}", items.card),
            None => items.card.clone(),
        };
        match s.find_first_match(&[Strategy::waiting(Locator::css(&card))]).await {
            Ok(_) => {}
            Err(BurgerWatchError::ElementNotFound { .. }) => {
                return Err(BurgerWatchError::element_not_found(format!(
                    "no product cards matching '{card}'"
                )));
            }
            Err(e) => return Err(e),
        }
        let html = s.content().await?;
        collect_cards(&html, items, section, &self.profile)
    }

    /// Normalize raw items: drop excluded and duplicate names, fill canonical fields.
    fn parse_items(&self, raw: Vec<RawItem>) -> Vec<DraftProduct> {
        let exclusions = ExclusionFilter::new(&self.ctx.crawl.exclusion_keywords);
        let mut seen = HashSet::new();
        let brand = &self.profile.brand;

        raw.into_iter()
            .filter_map(|item| {
                if item.name.is_empty() {
                    return None;
                }
                if exclusions.is_excluded(&item.name) {
                    debug!(name = %item.name, "excluded derived product");
                    return None;
                }
                if !seen.insert(item.name.clone()) {
                    debug!(name = %item.name, "duplicate within batch");
                    return None;
                }

                let mut draft = template(&item.name, &brand.name, &brand.name_eng);
                draft.brand = brand.clone();
                draft.price = item
                    .price_text
                    .as_deref()
                    .and_then(extract_price)
                    .unwrap_or(0);
                draft.patty = infer_patty(&item.name, item.description.as_deref());
                draft.image_url = item.image_url;
                draft.description = item.description;
                draft.shop_url = item.detail_url;
                Some(draft)
            })
            .collect()
    }

    async fn visit_details(
        &self,
        s: &mut BrowserSession,
        detail: &DetailSpec,
        batch: &mut CrawlBatch,
    ) {
        for i in 0..batch.items.len() {
            let Some(url) = batch.items[i].shop_url.clone() else {
                continue;
            };
            let step = format!("detail page for '{}'", batch.items[i].name);

            if let Err(e) = s.goto(&url).await {
                self.degrade(batch, &step, &e);
                continue;
            }
            let html = match s.content().await {
                Ok(html) => html,
                Err(e) => {
                    self.degrade(batch, &step, &e);
                    continue;
                }
            };

            match parse_nutrition_table(&html, &detail.table, detail.labels) {
                Some(n) if !n.is_empty() => batch.items[i].nutrition = Some(n),
                Some(_) => debug!(url = %url, "nutrition table has no known rows"),
                None => warn!(url = %url, "nutrition table not found"),
            }
        }
    }
}

#[async_trait]
impl CrawlAdapter for MenuCrawler {
    fn id(&self) -> &str {
        &self.profile.brand.name_eng
    }

    fn brand(&self) -> &Brand {
        &self.profile.brand
    }

    #[instrument(skip_all, fields(brand = %self.profile.brand.name_eng))]
    async fn crawl(&self) -> CrawlBatch {
        info!(url = %self.profile.menu_url(), "crawl started");
        let mut batch = CrawlBatch::new(self.profile.brand.clone());
        self.enter(&mut batch, CrawlState::Init);

        let mut session = None;
        if self.profile.renders_menu() {
            match BrowserSession::acquire(self.ctx.launcher.as_ref(), &self.ctx.session).await {
                Ok(s) => session = Some(s),
                Err(e) => {
                    self.degrade(&mut batch, "acquire browser", &e);
                    self.enter(&mut batch, CrawlState::Failed);
                    return batch;
                }
            }
        }

        match self.drive(&mut session, &mut batch).await {
            Ok(()) => self.enter(&mut batch, CrawlState::Done),
            Err((step, e)) => {
                self.degrade(&mut batch, step, &e);
                self.enter(&mut batch, CrawlState::Failed);
            }
        }

        if let Some(s) = session {
            if let Err(e) = s.release().await {
                self.degrade(&mut batch, "release browser", &e);
            }
        }

        info!(
            items = batch.items.len(),
            failures = batch.failures.len(),
            "crawl finished"
        );
        batch
    }
}

/// Read product cards from a DOM snapshot, optionally inside `section` only.
fn collect_cards(
    html: &str,
    items: &ItemSelectors,
    section: Option<&str>,
    profile: &BrandProfile,
) -> Result<Vec<RawItem>> {
    let parse = |css: &str| {
        Selector::parse(css)
            .map_err(|e| BurgerWatchError::parse(format!("invalid selector '{css}': {e}")))
    };
    let optional = |css: &Option<String>| css.as_deref().map(parse).transpose();

    let card_sel = parse(&items.card)?;
    let name_sel = parse(&items.name)?;
    let price_sel = optional(&items.price)?;
    let image_sel = optional(&items.image)?;
    let desc_sel = optional(&items.description)?;
    let link_sel = optional(&items.link)?;

    let doc = Html::parse_document(html);
    let roots: Vec<_> = match section {
        Some(css) => doc.select(&parse(css)?).collect(),
        None => vec![doc.root_element()],
    };

    let mut out = Vec::new();
    for root in roots {
        for card in root.select(&card_sel).filter(is_visible) {
            let Some(name) = card.select(&name_sel).next().map(|el| element_text(&el)) else {
                continue;
            };
            let text_of = |sel: &Option<Selector>| {
                sel.as_ref()
                    .and_then(|s| card.select(s).next())
                    .map(|el| element_text(&el))
                    .filter(|t| !t.is_empty())
            };
            let attr_of = |sel: &Option<Selector>, attrs: &[&str]| {
                let el = sel.as_ref().and_then(|s| card.select(s).next())?;
                attrs
                    .iter()
                    .find_map(|a| el.value().attr(a))
                    .and_then(|href| profile.absolutize(href))
            };

            out.push(RawItem {
                name,
                price_text: text_of(&price_sel),
                image_url: attr_of(&image_sel, &["src", "data-src"]),
                description: text_of(&desc_sel),
                detail_url: attr_of(&link_sel, &["href"]),
            });
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::CrawlContext;
    use crate::driver::{BrowserLauncher, BrowserPage};
    use crate::fixture::FixtureLauncher;
    use crate::profile::{CategorySpec, FilterSpec};
    use burgerwatch_shared::{CrawlConfig, SessionConfig};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const BASE: &str = "https://shop.test";

    const MENU: &str = r#"<html><body>
        <ul class="tabs"><li><a id="tab-a">A</a></li></ul>
        <ul class="cards">
          <li class="card"><a href="/p/1"><span class="name">치킨 버거</span><em>3,000원</em></a></li>
          <li class="card"><a href="/p/2"><span class="name">치킨 버거 세트</span><em>5,000원</em></a></li>
          <li class="card"><a href="/p/3"><span class="name">  </span></a></li>
          <li class="card"><a href="/p/4"><span class="name">소고기 버거</span></a></li>
        </ul>
    </body></html>"#;

    const SECTIONS: &str = r#"<html><body>
        <section id="a"><ul>
          <li class="card"><span class="name">불고기 버거</span></li>
          <li class="card"><span class="name">새우 버거</span></li>
        </ul></section>
        <section id="b"><ul><li class="card"><span class="name">치즈 버거</span></li></ul></section>
        <section id="c"><ul><li class="card"><span class="name">한우 버거</span></li></ul></section>
    </body></html>"#;

    fn context<L: BrowserLauncher + 'static>(launcher: L) -> (Arc<L>, CrawlContext) {
        let launcher = Arc::new(launcher);
        let session = SessionConfig {
            implicit_wait: Duration::ZERO,
            ..SessionConfig::default()
        };
        let ctx = CrawlContext::new(launcher.clone(), session, CrawlConfig::default())
            .expect("context builds");
        (launcher, ctx)
    }

    fn section(label: &str, css: &str) -> CategorySpec {
        CategorySpec {
            label: label.into(),
            tab: vec![],
            section: Some(css.into()),
        }
    }

    /// Serves one page whose renderer dies on the `fail_at`-th DOM read.
    struct CrashingLauncher {
        html: &'static str,
        fail_at: usize,
        reads: Arc<AtomicUsize>,
    }

    struct CrashingPage {
        html: &'static str,
        fail_at: usize,
        reads: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl BrowserLauncher for CrashingLauncher {
        async fn launch(&self, _config: &SessionConfig) -> Result<Box<dyn BrowserPage>> {
            Ok(Box::new(CrashingPage {
                html: self.html,
                fail_at: self.fail_at,
                reads: self.reads.clone(),
            }))
        }
    }

    #[async_trait]
    impl BrowserPage for CrashingPage {
        async fn goto(&mut self, _url: &str) -> Result<()> {
            Ok(())
        }

        async fn content(&mut self) -> Result<String> {
            let read = self.reads.fetch_add(1, Ordering::SeqCst) + 1;
            if read == self.fail_at {
                return Err(BurgerWatchError::Navigation("renderer crashed".into()));
            }
            Ok(self.html.to_string())
        }

        async fn click_selector(&mut self, _css_path: &str) -> Result<bool> {
            Ok(true)
        }

        async fn close(&mut self) -> Result<()> {
            Ok(())
        }
    }

    fn profile(filter: Option<FilterSpec>, categories: Vec<CategorySpec>) -> BrandProfile {
        BrandProfile {
            brand: Brand::new("테스트", "test"),
            base_url: BASE.into(),
            menu_path: "/menu".into(),
            menu: MenuSource::Rendered(RenderedMenu {
                filter,
                categories,
                items: ItemSelectors {
                    card: "li.card".into(),
                    name: ".name".into(),
                    price: Some("em".into()),
                    image: None,
                    description: None,
                    link: Some("a".into()),
                },
            }),
            detail: None,
        }
    }

    #[tokio::test]
    async fn plain_menu_reaches_done() {
        let (launcher, ctx) = context(FixtureLauncher::new().page(format!("{BASE}/menu"), MENU));
        let crawler = MenuCrawler::new(profile(None, vec![]), ctx);

        let batch = crawler.crawl().await;
        assert_eq!(
            batch.states,
            vec![
                CrawlState::Init,
                CrawlState::NavigateToMenu,
                CrawlState::CollectCategoryItems,
                CrawlState::ParseItems,
                CrawlState::Done,
            ]
        );
        let names: Vec<&str> = batch.items.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["치킨 버거", "소고기 버거"]);
        assert_eq!(batch.items[0].price, 3000);
        assert_eq!(batch.items[0].shop_url.as_deref(), Some("https://shop.test/p/1"));
        assert_eq!(batch.items[1].price, 0);
        assert!(!batch.is_degraded());
        assert_eq!(launcher.acquired(), launcher.released());
    }

    #[tokio::test]
    async fn same_category_twice_keeps_first() {
        let tab = |label: &str| CategorySpec {
            label: label.into(),
            tab: vec![Strategy::now(Locator::exact("a", "A"))],
            section: None,
        };
        let (_, ctx) = context(FixtureLauncher::new().page(format!("{BASE}/menu"), MENU));
        let crawler = MenuCrawler::new(profile(None, vec![tab("first"), tab("second")]), ctx);

        let batch = crawler.crawl().await;
        assert_eq!(batch.items.len(), 2);
        assert_eq!(batch.final_state(), Some(CrawlState::Done));
    }

    #[tokio::test]
    async fn missing_filter_modal_fails_with_empty_batch() {
        let filter = FilterSpec {
            open: vec![Strategy::now(Locator::css("button.filter"))],
            option: vec![],
            confirm: vec![],
        };
        let (launcher, ctx) = context(FixtureLauncher::new().page(format!("{BASE}/menu"), MENU));
        let crawler = MenuCrawler::new(profile(Some(filter), vec![]), ctx);

        let batch = crawler.crawl().await;
        assert_eq!(batch.final_state(), Some(CrawlState::Failed));
        assert!(batch.states.contains(&CrawlState::OpenFilterModal));
        assert!(batch.items.is_empty());
        assert!(batch.failures[0].starts_with("open filter modal"));
        assert_eq!(launcher.acquired(), 1);
        assert_eq!(launcher.released(), 1);
    }

    #[tokio::test]
    async fn navigation_failure_releases_browser() {
        let (launcher, ctx) = context(FixtureLauncher::new().fail_goto(format!("{BASE}/menu")));
        let crawler = MenuCrawler::new(profile(None, vec![]), ctx);

        let batch = crawler.crawl().await;
        assert_eq!(
            batch.states,
            vec![CrawlState::Init, CrawlState::NavigateToMenu, CrawlState::Failed]
        );
        assert_eq!(launcher.acquired(), 1);
        assert_eq!(launcher.released(), 1);
    }

    #[tokio::test]
    async fn launch_failure_is_reported() {
        let (launcher, ctx) = context(FixtureLauncher::new().fail_launch());
        let crawler = MenuCrawler::new(profile(None, vec![]), ctx);

        let batch = crawler.crawl().await;
        assert_eq!(batch.states, vec![CrawlState::Init, CrawlState::Failed]);
        assert!(batch.failures[0].starts_with("acquire browser"));
        assert_eq!(launcher.acquired(), 0);
        assert_eq!(launcher.released(), 0);
    }

    #[tokio::test]
    async fn browser_error_mid_walk_keeps_collected_categories() {
        // Section a takes two DOM reads (wait, collect); the third read is b's wait
        let (_, ctx) = context(CrashingLauncher {
            html: SECTIONS,
            fail_at: 3,
            reads: Arc::new(AtomicUsize::new(0)),
        });
        let categories = vec![section("a", "#a"), section("b", "#b"), section("c", "#c")];
        let crawler = MenuCrawler::new(profile(None, categories), ctx);

        let batch = crawler.crawl().await;

        let names: Vec<&str> = batch.items.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["불고기 버거", "새우 버거"]);
        assert_eq!(batch.final_state(), Some(CrawlState::Done));
        assert!(batch.states.contains(&CrawlState::ParseItems));
        assert_eq!(batch.failures.len(), 1);
        assert!(batch.failures[0].starts_with("category 'b'"));
        assert!(batch.failures[0].contains("renderer crashed"));
    }

    #[tokio::test]
    async fn category_without_cards_is_reported() {
        let (launcher, ctx) = context(FixtureLauncher::new().page(format!("{BASE}/menu"), SECTIONS));
        let categories = vec![section("empty", "#missing"), section("b", "#b")];
        let crawler = MenuCrawler::new(profile(None, categories), ctx);

        let batch = crawler.crawl().await;

        assert_eq!(batch.final_state(), Some(CrawlState::Done));
        let names: Vec<&str> = batch.items.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["치즈 버거"]);
        assert_eq!(batch.failures.len(), 1);
        assert!(batch.failures[0].starts_with("category 'empty'"));
        assert!(batch.failures[0].contains("no product cards"));
        assert_eq!(launcher.acquired(), launcher.released());
    }

    #[tokio::test]
    async fn page_without_cards_degrades_to_empty() {
        let (_, ctx) = context(
            FixtureLauncher::new().page(format!("{BASE}/menu"), "<html><body><ul></ul></body></html>"),
        );
        let crawler = MenuCrawler::new(profile(None, vec![]), ctx);

        let batch = crawler.crawl().await;

        assert_eq!(batch.final_state(), Some(CrawlState::Done));
        assert!(batch.items.is_empty());
        assert!(batch.failures[0].starts_with("collect category items"));
    }

    #[test]
    fn collect_cards_respects_section() {
        let html = r#"<html><body>
            <section id="a"><div class="c"><b>one</b><img data-src="/i/1.png"></div></section>
            <section id="b"><div class="c"><b>two</b></div></section>
        </body></html>"#;
        let items = ItemSelectors {
            card: ".c".into(),
            name: "b".into(),
            price: None,
            image: Some("img".into()),
            description: None,
            link: None,
        };
        let p = profile(None, vec![]);
        let all = collect_cards(html, &items, None, &p).unwrap();
        assert_eq!(all.len(), 2);

        let only_b = collect_cards(html, &items, Some("#b"), &p).unwrap();
        assert_eq!(only_b.len(), 1);
        assert_eq!(only_b[0].name, "two");

        let only_a = collect_cards(html, &items, Some("#a"), &p).unwrap();
        assert_eq!(only_a[0].image_url.as_deref(), Some("https://shop.test/i/1.png"));
    }
}
