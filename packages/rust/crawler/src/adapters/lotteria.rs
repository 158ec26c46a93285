//! Lotteria: the menu page embeds the full product list as `var pList = [...]`;
//! nutrition comes from each product's introduction page.

use burgerwatch_shared::Brand;
use serde_json::Value;

use crate::extract::{DEFAULT_NUTRITION_LABELS, clean_text};
use crate::profile::{BrandProfile, DetailSpec, EmbeddedMenu, MenuSource, RawItem};

const IMAGE_HOST: &str = "https://img.lotteeatz.com";
const BURGER_CATEGORY: &str = "버거";

pub fn profile() -> BrandProfile {
    BrandProfile {
        brand: Brand {
            website_url: Some("https://www.lotteeatz.com/brand/ria".into()),
            ..Brand::new("롯데리아", "lotteria")
        },
        base_url: "https://www.lotteeatz.com".into(),
        menu_path: "/brand/ria".into(),
        menu: MenuSource::Embedded(EmbeddedMenu {
            variable: "pList".into(),
            parse: parse_product,
        }),
        detail: Some(DetailSpec {
            table: "table.tbl-row-info".into(),
            labels: DEFAULT_NUTRITION_LABELS,
        }),
    }
}

fn field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// One `pList` record; non-burger categories are skipped.
fn parse_product(value: &Value, profile: &BrandProfile) -> Option<RawItem> {
    if field(value, "displayCategoryNm").as_deref() != Some(BURGER_CATEGORY) {
        return None;
    }
    let name = clean_text(&field(value, "presPrdNm")?);

    let image_url = match (
        field(value, "imgPath"),
        field(value, "imgSystemFileNm"),
        field(value, "imgExtsn"),
    ) {
        (Some(path), Some(file), Some(ext)) => Some(format!("{IMAGE_HOST}{path}{file}.{ext}")),
        _ => None,
    };

    let detail_url = field(value, "presPrdId").map(|id| {
        format!(
            "{}/products/introductions/{id}",
            profile.base_url.trim_end_matches('/')
        )
    });

    Some(RawItem {
        name,
        price_text: field(value, "sellPrice"),
        image_url,
        description: field(value, "dispNm").map(|d| clean_text(&d)),
        detail_url,
    })
}
