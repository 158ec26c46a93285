//! In-memory store double with per-entity failure injection.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use burgerwatch_crawler::extract::template;
use burgerwatch_shared::{
    Brand, BrandId, BurgerWatchError, DraftProduct, Nutrition, ProductId, Result, StoredProduct,
};
use burgerwatch_storage::ProductStore;
use chrono::Utc;
use tokio::sync::Mutex;

#[derive(Default)]
struct Tables {
    brands: Vec<Brand>,
    products: Vec<(BrandId, DraftProduct)>,
    nutrition: HashMap<i64, Nutrition>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    failing_lookups: HashSet<String>,
    failing_brands: HashSet<String>,
    failing_products: HashSet<String>,
    fail_nutrition: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_lookup(mut self, product: &str) -> Self {
        self.failing_lookups.insert(product.to_string());
        self
    }

    pub fn fail_brand(mut self, brand: &str) -> Self {
        self.failing_brands.insert(brand.to_string());
        self
    }

    pub fn fail_product(mut self, product: &str) -> Self {
        self.failing_products.insert(product.to_string());
        self
    }

    pub fn fail_nutrition(mut self) -> Self {
        self.fail_nutrition = true;
        self
    }

    /// Store `item` directly, bypassing failure injection.
    pub async fn seed(&self, item: &DraftProduct) {
        let mut t = self.tables.lock().await;
        let brand_id = brand_id_of(&mut t, &item.brand);
        t.products.push((brand_id, item.clone()));
    }

    pub async fn product_count(&self) -> usize {
        self.tables.lock().await.products.len()
    }

    pub async fn nutrition_count(&self) -> usize {
        self.tables.lock().await.nutrition.len()
    }
}

fn brand_id_of(t: &mut Tables, brand: &Brand) -> BrandId {
    match t.brands.iter().position(|b| b.name == brand.name) {
        Some(i) => BrandId(i as i64 + 1),
        None => {
            t.brands.push(brand.clone());
            BrandId(t.brands.len() as i64)
        }
    }
}

fn stored(id: usize, brand_id: BrandId, p: &DraftProduct, n: Option<Nutrition>) -> StoredProduct {
    StoredProduct {
        id: ProductId(id as i64 + 1),
        brand_id,
        brand_name: p.brand.name.clone(),
        name: p.name.clone(),
        description: p.description.clone(),
        description_full: p.description_full.clone(),
        image_url: p.image_url.clone(),
        price: p.price,
        set_price: p.set_price,
        available: p.available,
        category: p.category.clone(),
        shop_url: p.shop_url.clone(),
        released_at: p.released_at,
        patty: p.patty,
        nutrition: n,
        created_at: Utc::now(),
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn find_product(&self, name: &str, brand_name: &str) -> Result<Option<StoredProduct>> {
        if self.failing_lookups.contains(name) {
            return Err(BurgerWatchError::Persistence("lookup failed".into()));
        }
        let t = self.tables.lock().await;
        Ok(t
            .products
            .iter()
            .enumerate()
            .find(|(_, (_, p))| p.name == name && p.brand.name == brand_name)
            .map(|(i, (brand_id, p))| {
                stored(i, *brand_id, p, t.nutrition.get(&(i as i64 + 1)).copied())
            }))
    }

    async fn get_or_create_brand(&self, brand: &Brand) -> Result<BrandId> {
        if self.failing_brands.contains(&brand.name) {
            return Err(BurgerWatchError::Persistence("brand insert failed".into()));
        }
        let mut t = self.tables.lock().await;
        Ok(brand_id_of(&mut t, brand))
    }

    async fn insert_product(&self, brand_id: BrandId, product: &DraftProduct) -> Result<ProductId> {
        if self.failing_products.contains(&product.name) {
            return Err(BurgerWatchError::Persistence("product insert failed".into()));
        }
        let mut t = self.tables.lock().await;
        if t
            .products
            .iter()
            .any(|(id, p)| *id == brand_id && p.name == product.name)
        {
            return Err(BurgerWatchError::Persistence(
                "UNIQUE constraint failed: products.name, products.brand_id".into(),
            ));
        }
        t.products.push((brand_id, product.clone()));
        Ok(ProductId(t.products.len() as i64))
    }

    async fn insert_nutrition(&self, product_id: ProductId, nutrition: &Nutrition) -> Result<()> {
        if self.fail_nutrition {
            return Err(BurgerWatchError::Persistence("nutrition insert failed".into()));
        }
        self.tables
            .lock()
            .await
            .nutrition
            .insert(product_id.0, *nutrition);
        Ok(())
    }

    async fn list_recent_products(
        &self,
        limit: u32,
        brand_name: Option<&str>,
    ) -> Result<Vec<StoredProduct>> {
        let t = self.tables.lock().await;
        Ok(t
            .products
            .iter()
            .enumerate()
            .rev()
            .filter(|(_, (_, p))| brand_name.is_none_or(|b| p.brand.name == b))
            .take(limit as usize)
            .map(|(i, (brand_id, p))| {
                stored(i, *brand_id, p, t.nutrition.get(&(i as i64 + 1)).copied())
            })
            .collect())
    }
}

pub fn draft(name: &str, brand: &Brand) -> DraftProduct {
    let mut d = template(name, &brand.name, &brand.name_eng);
    d.brand = brand.clone();
    d.price = 5900;
    d
}

pub fn draft_with_nutrition(name: &str, brand: &Brand) -> DraftProduct {
    DraftProduct {
        nutrition: Some(Nutrition {
            calories: Some(540.0),
            sodium: Some(1100.0),
            ..Nutrition::default()
        }),
        ..draft(name, brand)
    }
}
