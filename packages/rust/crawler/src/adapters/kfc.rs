//! KFC: category tabs, each swapping the product list in place.

use burgerwatch_shared::Brand;

use crate::locate::{Locator, Strategy};
use crate::profile::{BrandProfile, CategorySpec, ItemSelectors, MenuSource, RenderedMenu};

const CATEGORIES: &[&str] = &["신제품", "버거"];

pub fn profile() -> BrandProfile {
    BrandProfile {
        brand: Brand {
            website_url: Some("https://www.kfc.co.kr".into()),
            ..Brand::new("KFC", "kfc")
        },
        base_url: "https://www.kfc.co.kr".into(),
        menu_path: "/menu/burger".into(),
        menu: MenuSource::Rendered(RenderedMenu {
            filter: None,
            categories: CATEGORIES
                .iter()
                .map(|label| CategorySpec {
                    label: label.to_string(),
                    tab: vec![
                        Strategy::waiting(Locator::exact("a", *label)),
                        Strategy::now(Locator::exact("button", *label)),
                    ],
                    section: None,
                })
                .collect(),
            items: ItemSelectors {
                card: "ul.menu_list li.item".into(),
                name: "strong.name".into(),
                price: Some("span.price".into()),
                image: Some("img".into()),
                description: Some("p.desc".into()),
                link: Some("a".into()),
            },
        }),
        detail: None,
    }
}
