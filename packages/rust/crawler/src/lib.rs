//! Browser session, extraction pipeline, and per-brand crawl adapters.
//!
//! This crate provides:
//! - [`driver`]: the browser seam ([`BrowserLauncher`], [`BrowserPage`]) and the Chrome implementation
//! - [`BrowserSession`]: scoped browser with fallback element lookup and script clicks
//! - [`extract`]: price, numeric, nutrition-table, and patty extraction
//! - [`MenuCrawler`]: the crawl state machine run over declarative [`BrandProfile`]s
//! - [`AdapterRegistry`]: brand id → adapter constructor

pub mod adapters;
pub mod driver;
pub mod extract;
#[cfg(any(test, feature = "fixture"))]
pub mod fixture;
pub mod locate;
pub mod machine;
pub mod profile;
pub mod session;

pub use adapters::{AdapterFactory, AdapterRegistry, CrawlAdapter, CrawlContext};
pub use driver::{BrowserLauncher, BrowserPage, ChromeLauncher, resolve_browser_path};
pub use extract::{
    ExclusionFilter, clean_text, extract_price, infer_patty, parse_numeric, template,
};
pub use locate::{ElementMatch, Locator, Strategy};
pub use machine::{CrawlBatch, CrawlState, MenuCrawler};
pub use profile::{BrandProfile, MenuSource, RawItem};
pub use session::BrowserSession;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{
        burger_king_profile, kfc_profile, lotteria_profile, nobrand_burger_profile,
    };
    use crate::fixture::FixtureLauncher;
    use burgerwatch_shared::{CrawlConfig, Patty, SessionConfig};
    use std::sync::Arc;
    use std::time::Duration;

    fn load_fixture(name: &str) -> String {
        let path = format!("../../../fixtures/html/{name}");
        std::fs::read_to_string(&path).unwrap_or_else(|_| panic!("missing fixture: {path}"))
    }

    fn context(launcher: &Arc<FixtureLauncher>, crawl: CrawlConfig) -> CrawlContext {
        let session = SessionConfig {
            implicit_wait: Duration::ZERO,
            ..SessionConfig::default()
        };
        CrawlContext::new(launcher.clone(), session, crawl).expect("context builds")
    }

    fn names(batch: &CrawlBatch) -> Vec<&str> {
        batch.items.iter().map(|p| p.name.as_str()).collect()
    }

    fn burger_king_site() -> FixtureLauncher {
        FixtureLauncher::new()
            .page(
                "https://www.burgerking.co.kr/menu/main",
                load_fixture("burger_king_menu.html"),
            )
            .on_click("bk-filter-open", load_fixture("burger_king_filter.html"))
            .on_click("bk-filter-apply", load_fixture("burger_king_filtered.html"))
    }

    fn nobrand_site() -> FixtureLauncher {
        FixtureLauncher::new()
            .page(
                "https://www.nobrand.co.kr/menu/burger",
                load_fixture("nobrand_menu.html"),
            )
            .on_click("nb-filter-open", load_fixture("nobrand_filter.html"))
            .on_click("nb-filter-confirm", load_fixture("nobrand_filtered.html"))
    }

    fn kfc_site() -> FixtureLauncher {
        FixtureLauncher::new()
            .page("https://www.kfc.co.kr/menu/burger", load_fixture("kfc_menu.html"))
            .on_click("tab-new", load_fixture("kfc_new.html"))
            .on_click("tab-burger", load_fixture("kfc_menu.html"))
    }

    async fn mount_lotteria(server: &wiremock::MockServer) {
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/brand/ria"))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_string(load_fixture("lotteria_menu.html")),
            )
            .mount(server)
            .await;
    }

    // -----------------------------------------------------------------------
    // Rendered menus
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn burger_king_filter_and_categories() {
        let launcher = Arc::new(burger_king_site());
        let crawler = MenuCrawler::new(
            burger_king_profile(),
            context(&launcher, CrawlConfig::default()),
        );

        let batch = crawler.crawl().await;

        assert_eq!(
            batch.states,
            vec![
                CrawlState::Init,
                CrawlState::NavigateToMenu,
                CrawlState::OpenFilterModal,
                CrawlState::ApplySelectedFilter,
                CrawlState::CollectCategoryItems,
                CrawlState::ParseItems,
                CrawlState::Done,
            ]
        );
        // Set excluded, duplicate dropped, side section never read
        assert_eq!(names(&batch), vec!["콰트로치즈와퍼", "몬스터와퍼", "와퍼", "와퍼주니어"]);
        assert_eq!(batch.items[0].price, 8400);
        assert_eq!(batch.items[0].patty, Patty::Beef);
        assert_eq!(
            batch.items[0].image_url.as_deref(),
            Some("https://www.burgerking.co.kr/images/menu/quattro_cheese.png")
        );
        assert_eq!(
            batch.items[0].shop_url.as_deref(),
            Some("https://www.burgerking.co.kr/menu/detail/1001")
        );
        assert_eq!(batch.items[0].brand.name, "버거킹");

        // The chicken & shrimp tab is missing: reported, not fatal
        assert_eq!(batch.failures.len(), 1);
        assert!(batch.failures[0].contains("치킨&슈림프버거"));
        assert_eq!(launcher.acquired(), 1);
        assert_eq!(launcher.released(), 1);
    }

    #[tokio::test]
    async fn nobrand_filter_modal() {
        let launcher = Arc::new(nobrand_site());
        let crawler = MenuCrawler::new(
            nobrand_burger_profile(),
            context(&launcher, CrawlConfig::default()),
        );

        let batch = crawler.crawl().await;

        assert_eq!(batch.final_state(), Some(CrawlState::Done));
        assert_eq!(names(&batch), vec!["NBB 시그니처 한우", "돼지불백 버거"]);
        assert_eq!(batch.items[0].patty, Patty::Beef);
        assert_eq!(batch.items[0].price, 7900);
        assert_eq!(
            batch.items[0].description.as_deref(),
            Some("국내산 한우 패티와 트러플 마요")
        );
        assert_eq!(
            batch.items[0].image_url.as_deref(),
            Some("https://www.nobrand.co.kr/upload/menu/nbb_signature_hanwoo.jpg")
        );
        assert_eq!(batch.items[1].patty, Patty::Pork);
        assert!(!batch.is_degraded());
    }

    #[tokio::test]
    async fn nobrand_filter_not_applicable_degrades_to_empty() {
        // Modal never opens: the option stays hidden
        let launcher = Arc::new(FixtureLauncher::new().page(
            "https://www.nobrand.co.kr/menu/burger",
            load_fixture("nobrand_menu.html"),
        ));
        let crawler = MenuCrawler::new(
            nobrand_burger_profile(),
            context(&launcher, CrawlConfig::default()),
        );

        let batch = crawler.crawl().await;

        assert!(batch.items.is_empty());
        assert_eq!(batch.final_state(), Some(CrawlState::Failed));
        assert!(batch.failures[0].starts_with("apply filter"));
        assert_eq!(launcher.acquired(), launcher.released());
    }

    #[tokio::test]
    async fn kfc_category_tabs() {
        let launcher = Arc::new(kfc_site());
        let crawler = MenuCrawler::new(kfc_profile(), context(&launcher, CrawlConfig::default()));

        let batch = crawler.crawl().await;

        assert_eq!(batch.final_state(), Some(CrawlState::Done));
        // Hidden card skipped, double excluded, duplicate kept once
        assert_eq!(names(&batch), vec!["블랙라벨 치킨버거", "징거버거"]);
        assert_eq!(batch.items[1].patty, Patty::Chicken);
        assert_eq!(batch.items[1].price, 5900);
        assert_eq!(launcher.acquired(), launcher.released());
    }

    #[tokio::test]
    async fn identical_input_parses_identically() {
        let strip = |batch: &CrawlBatch| {
            batch
                .items
                .iter()
                .map(|p| {
                    let mut p = p.clone();
                    p.released_at = chrono::DateTime::<chrono::Utc>::UNIX_EPOCH;
                    p
                })
                .collect::<Vec<_>>()
        };

        let launcher = Arc::new(burger_king_site());
        let crawler = MenuCrawler::new(
            burger_king_profile(),
            context(&launcher, CrawlConfig::default()),
        );
        let first = crawler.crawl().await;
        let second = crawler.crawl().await;

        assert!(!first.items.is_empty());
        assert_eq!(strip(&first), strip(&second));
        assert_eq!(launcher.acquired(), 2);
        assert_eq!(launcher.released(), 2);
    }

    // -----------------------------------------------------------------------
    // Embedded menu
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn lotteria_embedded_list_with_nutrition() {
        let server = wiremock::MockServer::start().await;
        mount_lotteria(&server).await;
        let base = server.uri();

        let launcher = Arc::new(
            FixtureLauncher::new()
                .page(
                    format!("{base}/products/introductions/P0001"),
                    load_fixture("lotteria_detail.html"),
                )
                .page(
                    format!("{base}/products/introductions/P0002"),
                    load_fixture("lotteria_detail_no_table.html"),
                )
                .fail_goto(format!("{base}/products/introductions/P0005")),
        );
        let crawler = MenuCrawler::new(
            lotteria_profile().with_base_url(base.clone()),
            context(&launcher, CrawlConfig::default()),
        );

        let batch = crawler.crawl().await;

        assert_eq!(
            batch.states,
            vec![
                CrawlState::Init,
                CrawlState::NavigateToMenu,
                CrawlState::ParseItems,
                CrawlState::VisitDetailPage,
                CrawlState::ExtractNutrition,
                CrawlState::Done,
            ]
        );
        assert_eq!(
            names(&batch),
            vec!["리아 불고기", "모짜렐라 인 더 버거 베이컨", "핫크리스피 치킨버거"]
        );

        let bulgogi = &batch.items[0];
        assert_eq!(bulgogi.price, 5200);
        assert_eq!(bulgogi.patty, Patty::Beef);
        assert_eq!(
            bulgogi.image_url.as_deref(),
            Some("https://img.lotteeatz.com/upload/product/ria_bulgogi.png")
        );
        let nutrition = bulgogi.nutrition.expect("nutrition parsed");
        assert_eq!(nutrition.calories, Some(430.0));
        assert_eq!(nutrition.fat, Some(4.7));
        assert_eq!(nutrition.protein, Some(17.0));
        assert_eq!(nutrition.sugar, Some(14.0));
        assert_eq!(nutrition.sodium, Some(820.0));

        // String price with separators
        assert_eq!(batch.items[1].price, 7400);
        // No table: product kept without nutrition
        assert!(batch.items[1].nutrition.is_none());
        // Detail navigation failed for one item only
        assert!(batch.items[2].nutrition.is_none());
        assert_eq!(batch.items[2].patty, Patty::Chicken);
        assert_eq!(batch.failures.len(), 1);
        assert!(batch.failures[0].contains("핫크리스피 치킨버거"));

        assert_eq!(launcher.acquired(), 1);
        assert_eq!(launcher.released(), 1);
    }

    #[tokio::test]
    async fn lotteria_without_detail_pages_needs_no_browser() {
        let server = wiremock::MockServer::start().await;
        mount_lotteria(&server).await;

        let launcher = Arc::new(FixtureLauncher::new().fail_launch());
        let crawl = CrawlConfig {
            visit_detail_pages: false,
            ..CrawlConfig::default()
        };
        let crawler = MenuCrawler::new(
            lotteria_profile().with_base_url(server.uri()),
            context(&launcher, crawl),
        );

        let batch = crawler.crawl().await;

        assert_eq!(batch.final_state(), Some(CrawlState::Done));
        assert_eq!(batch.items.len(), 3);
        assert!(batch.items.iter().all(|p| p.nutrition.is_none()));
        assert_eq!(launcher.acquired(), 0);
    }

    #[tokio::test]
    async fn lotteria_browser_failure_keeps_menu_items() {
        let server = wiremock::MockServer::start().await;
        mount_lotteria(&server).await;

        let launcher = Arc::new(FixtureLauncher::new().fail_launch());
        let crawler = MenuCrawler::new(
            lotteria_profile().with_base_url(server.uri()),
            context(&launcher, CrawlConfig::default()),
        );

        let batch = crawler.crawl().await;

        assert_eq!(
            batch.states,
            vec![
                CrawlState::Init,
                CrawlState::NavigateToMenu,
                CrawlState::ParseItems,
                CrawlState::Done,
            ]
        );
        assert_eq!(batch.items.len(), 3);
        assert!(batch.items.iter().all(|p| p.nutrition.is_none()));
        assert_eq!(batch.failures.len(), 1);
        assert!(batch.failures[0].starts_with("acquire browser"));
        assert_eq!(launcher.acquired(), 0);
        assert_eq!(launcher.released(), 0);
    }

    #[tokio::test]
    async fn lotteria_menu_error_degrades_to_empty() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::path("/brand/ria"))
            .respond_with(wiremock::ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let launcher = Arc::new(FixtureLauncher::new());
        let crawler = MenuCrawler::new(
            lotteria_profile().with_base_url(server.uri()),
            context(&launcher, CrawlConfig::default()),
        );

        let batch = crawler.crawl().await;

        assert!(batch.items.is_empty());
        assert_eq!(batch.final_state(), Some(CrawlState::Failed));
        assert!(batch.failures[0].starts_with("navigate to menu"));
        // The menu is read before any browser is launched
        assert_eq!(launcher.acquired(), 0);
    }

    #[tokio::test]
    async fn missing_browser_fails_rendered_brand() {
        let launcher = Arc::new(FixtureLauncher::new().fail_launch());
        let crawler = MenuCrawler::new(kfc_profile(), context(&launcher, CrawlConfig::default()));

        let batch = crawler.crawl().await;

        assert!(batch.items.is_empty());
        assert_eq!(batch.states, vec![CrawlState::Init, CrawlState::Failed]);
        assert_eq!(launcher.acquired(), 0);
        assert_eq!(launcher.released(), 0);
    }
}
