//! Core domain types: brands, products, nutrition facts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default product category for everything this tool collects.
pub const DEFAULT_CATEGORY: &str = "버거";

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Row id of a stored brand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BrandId(pub i64);

/// Row id of a stored product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub i64);

impl std::fmt::Display for BrandId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Brand
// ---------------------------------------------------------------------------

/// A fast-food brand. Identity key is the local `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brand {
    /// Local (Korean) brand name, e.g. `버거킹`.
    pub name: String,
    /// Stable English identifier, e.g. `burger_king`.
    pub name_eng: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website_url: Option<String>,
}

impl Brand {
    /// Brand with only the two required names set.
    pub fn new(name: impl Into<String>, name_eng: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            name_eng: name_eng.into(),
            description: None,
            logo_url: None,
            website_url: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Patty
// ---------------------------------------------------------------------------

/// Protein component of a burger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Patty {
    Beef,
    Chicken,
    Pork,
    #[default]
    Undefined,
}

impl Patty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beef => "beef",
            Self::Chicken => "chicken",
            Self::Pork => "pork",
            Self::Undefined => "undefined",
        }
    }
}

impl std::fmt::Display for Patty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Patty {
    type Err = crate::BurgerWatchError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beef" => Ok(Self::Beef),
            "chicken" => Ok(Self::Chicken),
            "pork" => Ok(Self::Pork),
            "undefined" | "" => Ok(Self::Undefined),
            other => Err(crate::BurgerWatchError::validation(format!(
                "unknown patty type '{other}'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Nutrition
// ---------------------------------------------------------------------------

/// Nutrition facts for one product. `None` means "not extracted", never zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrition {
    /// Energy in kcal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories: Option<f64>,
    /// Saturated fat in grams.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fat: Option<f64>,
    /// Protein in grams.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protein: Option<f64>,
    /// Sugars in grams.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sugar: Option<f64>,
    /// Sodium in milligrams.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sodium: Option<f64>,
}

impl Nutrition {
    /// True when no field was extracted.
    pub fn is_empty(&self) -> bool {
        self.calories.is_none()
            && self.fat.is_none()
            && self.protein.is_none()
            && self.sugar.is_none()
            && self.sodium.is_none()
    }
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

/// Canonical draft record produced by a crawl adapter, not yet persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftProduct {
    pub name: String,
    pub brand: Brand,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_full: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Price in won. 0 means unknown.
    pub price: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_price: Option<u32>,
    pub available: bool,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shop_url: Option<String>,
    pub released_at: DateTime<Utc>,
    pub patty: Patty,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrition: Option<Nutrition>,
}

impl DraftProduct {
    /// Dedup identity: `(name, brand name)`.
    pub fn identity(&self) -> (&str, &str) {
        (self.name.as_str(), self.brand.name.as_str())
    }
}

/// A product as read back from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredProduct {
    pub id: ProductId,
    pub brand_id: BrandId,
    pub brand_name: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_full: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub price: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_price: Option<u32>,
    pub available: bool,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shop_url: Option<String>,
    pub released_at: DateTime<Utc>,
    pub patty: Patty,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrition: Option<Nutrition>,
    /// When the row was inserted.
    pub created_at: DateTime<Utc>,
}
