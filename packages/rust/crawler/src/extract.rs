//! Extraction pipeline: turns scraped text and DOM fragments into canonical
//! product and nutrition field values.

use std::sync::LazyLock;

use burgerwatch_shared::{
    Brand, BurgerWatchError, DEFAULT_CATEGORY, DraftProduct, Nutrition, Patty, Result,
};
use chrono::Utc;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;

static TRAILING_PAREN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\([^)]*\)\s*$").expect("valid regex"));
static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("valid regex"));
static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("valid regex"));

// ---------------------------------------------------------------------------
// Text and numbers
// ---------------------------------------------------------------------------

/// Trim and collapse newlines, tabs, and runs of spaces into single spaces.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Visible text of an element, cleaned.
pub fn element_text(el: &ElementRef<'_>) -> String {
    clean_text(&el.text().collect::<Vec<_>>().join(" "))
}

/// Leading integer of a price string, ignoring thousands separators and
/// currency marks. `None` when the text has no digits.
pub fn extract_price(text: &str) -> Option<u32> {
    let stripped = text.replace(',', "");
    DIGITS
        .find(&stripped)
        .and_then(|m| m.as_str().parse::<u32>().ok())
}

/// First decimal number in `text` after dropping a trailing parenthetical
/// such as a daily-value percentage. Thousands separators are ignored.
pub fn parse_numeric(text: &str) -> Option<f64> {
    let trimmed = text.trim().replace(',', "");
    let base = TRAILING_PAREN.replace(&trimmed, "");
    NUMBER
        .find(&base)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Canonical draft with every optional field empty.
pub fn template(name: &str, brand_name: &str, brand_name_eng: &str) -> DraftProduct {
    DraftProduct {
        name: name.to_string(),
        brand: Brand::new(brand_name, brand_name_eng),
        description: None,
        description_full: None,
        image_url: None,
        price: 0,
        set_price: None,
        available: true,
        category: DEFAULT_CATEGORY.to_string(),
        shop_url: None,
        released_at: Utc::now(),
        patty: Patty::Undefined,
        nutrition: None,
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

const CHICKEN_KEYWORDS: &[&str] = &["치킨", "chicken"];
const PORK_KEYWORDS: &[&str] = &["포크", "돼지", "pork"];
const BEEF_KEYWORDS: &[&str] = &["비프", "소고기", "한우", "불고기", "와퍼", "beef"];

/// Guess the patty type from the product name, falling back to the description.
pub fn infer_patty(name: &str, description: Option<&str>) -> Patty {
    let from = |text: &str| {
        let lower = text.to_lowercase();
        let has = |keywords: &[&str]| keywords.iter().any(|k| lower.contains(k));
        if has(CHICKEN_KEYWORDS) {
            Some(Patty::Chicken)
        } else if has(PORK_KEYWORDS) {
            Some(Patty::Pork)
        } else if has(BEEF_KEYWORDS) {
            Some(Patty::Beef)
        } else {
            None
        }
    };

    from(name)
        .or_else(|| description.and_then(from))
        .unwrap_or_default()
}

/// Drops derived products (sets, combos, multi-packs) by name keyword.
#[derive(Debug, Clone, Default)]
pub struct ExclusionFilter {
    keywords: Vec<String>,
}

impl ExclusionFilter {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    /// Case-insensitive substring match against any keyword.
    pub fn is_excluded(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        self.keywords.iter().any(|k| lower.contains(k.as_str()))
    }

    /// Keep only names that match no keyword, preserving order.
    pub fn retain<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
        names.into_iter().filter(|n| !self.is_excluded(n)).collect()
    }
}

// ---------------------------------------------------------------------------
// Nutrition tables
// ---------------------------------------------------------------------------

/// Nutrition field a table label maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NutritionField {
    Calories,
    Fat,
    Protein,
    Sugar,
    Sodium,
}

impl NutritionField {
    fn set(self, nutrition: &mut Nutrition, value: f64) {
        let slot = match self {
            Self::Calories => &mut nutrition.calories,
            Self::Fat => &mut nutrition.fat,
            Self::Protein => &mut nutrition.protein,
            Self::Sugar => &mut nutrition.sugar,
            Self::Sodium => &mut nutrition.sodium,
        };
        if slot.is_none() {
            *slot = Some(value);
        }
    }
}

/// Korean label fragments used by most brand nutrition tables.
pub const DEFAULT_NUTRITION_LABELS: &[(&str, NutritionField)] = &[
    ("열량", NutritionField::Calories),
    ("포화지방", NutritionField::Fat),
    ("단백질", NutritionField::Protein),
    ("당류", NutritionField::Sugar),
    ("나트륨", NutritionField::Sodium),
];

/// Parse the first table matching `table_selector` in `html`.
///
/// Each row contributes when its label cell (`th`, or the first `td` when the
/// row has no `th`) contains one of `labels`. Returns `None` when the table is
/// absent; the result may be empty when no row matched.
pub fn parse_nutrition_table(
    html: &str,
    table_selector: &str,
    labels: &[(&str, NutritionField)],
) -> Option<Nutrition> {
    let doc = Html::parse_document(html);
    let table_sel = Selector::parse(table_selector).ok()?;
    let row_sel = Selector::parse("tr").ok()?;
    let th_sel = Selector::parse("th").ok()?;
    let td_sel = Selector::parse("td").ok()?;

    let table = doc.select(&table_sel).next()?;
    let mut nutrition = Nutrition::default();

    for row in table.select(&row_sel) {
        let cells: Vec<ElementRef<'_>> = row.select(&td_sel).collect();
        let (label, value) = match row.select(&th_sel).next() {
            Some(th) => match cells.first() {
                Some(td) => (element_text(&th), element_text(td)),
                None => continue,
            },
            None if cells.len() >= 2 => (element_text(&cells[0]), element_text(&cells[1])),
            None => continue,
        };

        let Some((_, field)) = labels.iter().find(|(l, _)| label.contains(l)) else {
            continue;
        };
        if let Some(v) = parse_numeric(&value) {
            field.set(&mut nutrition, v);
        }
    }

    Some(nutrition)
}

// ---------------------------------------------------------------------------
// Embedded script data
// ---------------------------------------------------------------------------

/// Decode the array literal assigned by `var <variable> = [...]` in a page.
///
/// Only the first JSON value after the assignment is read, so trailing
/// script is ignored.
pub fn extract_embedded_array(html: &str, variable: &str) -> Result<Vec<Value>> {
    let pattern = format!(r"var\s+{}\s*=\s*", regex::escape(variable));
    let re = Regex::new(&pattern)
        .map_err(|e| BurgerWatchError::parse(format!("bad variable name '{variable}': {e}")))?;
    let start = re
        .find(html)
        .ok_or_else(|| BurgerWatchError::parse(format!("no `var {variable}` in page")))?
        .end();

    let value = serde_json::Deserializer::from_str(&html[start..])
        .into_iter::<Value>()
        .next()
        .ok_or_else(|| BurgerWatchError::parse(format!("`{variable}` has no value")))?
        .map_err(|e| BurgerWatchError::parse(format!("`{variable}` is not valid JSON: {e}")))?;

    match value {
        Value::Array(items) => Ok(items),
        other => Err(BurgerWatchError::parse(format!(
            "`{variable}` is not an array (found {})",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
