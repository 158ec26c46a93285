//! Burger King: filter the menu to new products through the filter modal, then
//! read each allowed category section.

use burgerwatch_shared::Brand;

use crate::locate::{Locator, Strategy};
use crate::profile::{BrandProfile, CategorySpec, FilterSpec, ItemSelectors, MenuSource, RenderedMenu};

/// Allowed categories, in visiting order.
const CATEGORIES: &[&str] = &["신제품", "프리미엄", "와퍼&주니어", "치킨&슈림프버거"];

pub fn profile() -> BrandProfile {
    BrandProfile {
        brand: Brand {
            website_url: Some("https://www.burgerking.co.kr".into()),
            ..Brand::new("버거킹", "burger_king")
        },
        base_url: "https://www.burgerking.co.kr".into(),
        menu_path: "/menu/main".into(),
        menu: MenuSource::Rendered(RenderedMenu {
            filter: Some(FilterSpec {
                open: vec![
                    Strategy::waiting(Locator::css("button.btn_filter")),
                    Strategy::now(Locator::contains("button", "필터")),
                ],
                option: vec![
                    Strategy::now(Locator::exact("label", "신제품")),
                    Strategy::now(Locator::contains("button", "신제품")),
                ],
                confirm: vec![
                    Strategy::now(Locator::css(".filter_pop .btn_apply")),
                    Strategy::now(Locator::exact("button", "적용")),
                ],
            }),
            categories: CATEGORIES
                .iter()
                .map(|label| CategorySpec {
                    label: label.to_string(),
                    tab: vec![
                        Strategy::waiting(Locator::exact("a", *label)),
                        Strategy::now(Locator::exact("button", *label)),
                    ],
                    section: Some(format!("section[data-category=\"{label}\"]")),
                })
                .collect(),
            items: ItemSelectors {
                card: "ul.prdmenu_list > li".into(),
                name: ".tit".into(),
                price: Some(".price".into()),
                image: Some("img".into()),
                description: Some(".txt".into()),
                link: Some("a".into()),
            },
        }),
        detail: None,
    }
}
