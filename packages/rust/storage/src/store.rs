//! The persistence contract consumed by the dedup gate.

use async_trait::async_trait;
use burgerwatch_shared::{Brand, BrandId, DraftProduct, Nutrition, ProductId, Result, StoredProduct};

/// Relational product store.
///
/// Brand, product, and nutrition writes are independent calls; there is no
/// cross-entity transaction. Callers order them and decide what a partial
/// failure means.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Look up a product by its dedup identity.
    async fn find_product(&self, name: &str, brand_name: &str) -> Result<Option<StoredProduct>>;

    /// Return the id of the brand named `brand.name`, creating it if absent.
    async fn get_or_create_brand(&self, brand: &Brand) -> Result<BrandId>;

    /// Insert a product under an existing brand.
    async fn insert_product(&self, brand_id: BrandId, product: &DraftProduct) -> Result<ProductId>;

    /// Attach nutrition facts to an existing product.
    async fn insert_nutrition(&self, product_id: ProductId, nutrition: &Nutrition) -> Result<()>;

    /// Most recently inserted products, newest first, optionally for one brand.
    async fn list_recent_products(
        &self,
        limit: u32,
        brand_name: Option<&str>,
    ) -> Result<Vec<StoredProduct>>;
}
