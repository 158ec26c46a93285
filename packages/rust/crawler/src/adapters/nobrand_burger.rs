//! No Brand Burger: pick the "NEW" option in the filter modal, then read the
//! burger tab.

use burgerwatch_shared::Brand;

use crate::locate::{Locator, Strategy};
use crate::profile::{BrandProfile, CategorySpec, FilterSpec, ItemSelectors, MenuSource, RenderedMenu};

pub fn profile() -> BrandProfile {
    BrandProfile {
        brand: Brand {
            website_url: Some("https://www.nobrand.co.kr".into()),
            ..Brand::new("노브랜드 버거", "nobrand_burger")
        },
        base_url: "https://www.nobrand.co.kr".into(),
        menu_path: "/menu/burger".into(),
        menu: MenuSource::Rendered(RenderedMenu {
            filter: Some(FilterSpec {
                open: vec![
                    Strategy::waiting(Locator::css("button.btn-filter")),
                    Strategy::now(Locator::contains("button", "필터")),
                ],
                option: vec![
                    Strategy::now(Locator::exact("button", "NEW")),
                    Strategy::now(Locator::exact("label", "신메뉴")),
                ],
                confirm: vec![Strategy::now(Locator::exact("button", "확인"))],
            }),
            categories: vec![CategorySpec {
                label: "버거".into(),
                tab: vec![
                    Strategy::waiting(Locator::exact("a", "버거")),
                    Strategy::now(Locator::exact("button", "버거")),
                ],
                section: None,
            }],
            items: ItemSelectors {
                card: ".menu-list .menu-item".into(),
                name: ".menu-name".into(),
                price: Some(".menu-price".into()),
                image: Some("img".into()),
                description: Some(".menu-desc".into()),
                link: Some("a".into()),
            },
        }),
        detail: None,
    }
}
