//! Declarative brand profiles consumed by the menu state machine.

use burgerwatch_shared::{Brand, CrawlConfig};
use serde_json::Value;
use url::Url;

use crate::extract::NutritionField;
use crate::locate::Strategy;

/// Everything the state machine needs to crawl one brand.
#[derive(Debug, Clone)]
pub struct BrandProfile {
    pub brand: Brand,
    /// Site origin, e.g. `https://www.kfc.co.kr`.
    pub base_url: String,
    pub menu_path: String,
    pub menu: MenuSource,
    pub detail: Option<DetailSpec>,
}

impl BrandProfile {
    pub fn menu_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.menu_path)
    }

    /// Point the profile at another origin (mirrors, test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Resolve a possibly relative link against the site origin.
    pub fn absolutize(&self, href: &str) -> Option<String> {
        let href = href.trim();
        if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
            return None;
        }
        let base = Url::parse(&self.base_url).ok()?;
        base.join(href).ok().map(String::from)
    }

    /// Whether the listing itself can only be read in a browser.
    pub fn renders_menu(&self) -> bool {
        matches!(self.menu, MenuSource::Rendered(_))
    }

    /// Detail pages a crawl with `config` visits, if any.
    pub fn detail_visits(&self, config: &CrawlConfig) -> Option<&DetailSpec> {
        self.detail.as_ref().filter(|_| config.visit_detail_pages)
    }
}

/// Where the product listing comes from.
#[derive(Debug, Clone)]
pub enum MenuSource {
    /// Listing rendered in the browser, reached through UI interaction.
    Rendered(RenderedMenu),
    /// Listing embedded as a script array literal, fetched without a browser.
    Embedded(EmbeddedMenu),
}

#[derive(Debug, Clone)]
pub struct RenderedMenu {
    pub filter: Option<FilterSpec>,
    /// Allowed categories in visiting order. Empty means "collect the page as is".
    pub categories: Vec<CategorySpec>,
    pub items: ItemSelectors,
}

/// Open a filter modal, pick one option, confirm.
#[derive(Debug, Clone)]
pub struct FilterSpec {
    pub open: Vec<Strategy>,
    pub option: Vec<Strategy>,
    /// Empty when picking the option applies it immediately.
    pub confirm: Vec<Strategy>,
}

#[derive(Debug, Clone)]
pub struct CategorySpec {
    pub label: String,
    /// Tab to click before reading items. Empty means no click.
    pub tab: Vec<Strategy>,
    /// Container holding this category's cards. `None` reads the whole page.
    pub section: Option<String>,
}

/// CSS selectors for product cards, relative to each card.
#[derive(Debug, Clone)]
pub struct ItemSelectors {
    pub card: String,
    pub name: String,
    pub price: Option<String>,
    pub image: Option<String>,
    pub description: Option<String>,
    pub link: Option<String>,
}

/// Turns one embedded record into a raw item; `None` skips the record.
pub type EmbeddedParser = fn(&Value, &BrandProfile) -> Option<RawItem>;

#[derive(Clone)]
pub struct EmbeddedMenu {
    pub variable: String,
    pub parse: EmbeddedParser,
}

impl std::fmt::Debug for EmbeddedMenu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddedMenu")
            .field("variable", &self.variable)
            .finish_non_exhaustive()
    }
}

/// Nutrition table on per-product detail pages.
#[derive(Debug, Clone)]
pub struct DetailSpec {
    pub table: String,
    pub labels: &'static [(&'static str, NutritionField)],
}

/// Unnormalized fields scraped for one product.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawItem {
    pub name: String,
    pub price_text: Option<String>,
    pub image_url: Option<String>,
    pub description: Option<String>,
    pub detail_url: Option<String>,
}
