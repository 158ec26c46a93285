//! libSQL storage layer for brands, products, and nutrition facts.
//!
//! The [`Storage`] struct wraps a local libSQL database and implements
//! [`ProductStore`], the contract the dedup gate writes through.
//!
//! **Access rules:**
//! - crawl and sweep commands: read-write (sole writer) via [`Storage::open`]
//! - listing commands: read-only via [`Storage::open_readonly`]

mod migrations;
mod store;

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use burgerwatch_shared::{
    Brand, BrandId, BurgerWatchError, DraftProduct, Nutrition, ProductId, Result, StoredProduct,
};
use libsql::{Connection, Database, params};

pub use store::ProductStore;

/// Columns selected for every [`StoredProduct`] read, in [`row_to_product`] order.
const PRODUCT_COLUMNS: &str = "p.id, p.brand_id, b.name, p.name, p.description, p.description_full,
       p.image_url, p.price, p.set_price, p.available, p.category, p.shop_url,
       p.released_at, p.patty, p.created_at,
       n.id, n.calories, n.fat, n.protein, n.sugar, n.sodium";

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
    readonly: bool,
}

impl Storage {
    /// Open or create a database at `path` in read-write mode.
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| BurgerWatchError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| BurgerWatchError::Persistence(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| BurgerWatchError::Persistence(e.to_string()))?;

        let storage = Self {
            db,
            conn,
            readonly: false,
        };
        storage.enable_foreign_keys().await?;
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Open an existing database at `path` in read-only mode.
    pub async fn open_readonly(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(BurgerWatchError::Persistence(format!(
                "database not found at {}",
                path.display()
            )));
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| BurgerWatchError::Persistence(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| BurgerWatchError::Persistence(e.to_string()))?;

        Ok(Self {
            db,
            conn,
            readonly: true,
        })
    }

    async fn enable_foreign_keys(&self) -> Result<()> {
        self.conn
            .execute_batch("PRAGMA foreign_keys = ON;")
            .await
            .map_err(|e| BurgerWatchError::Persistence(e.to_string()))?;
        Ok(())
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn
                    .execute_batch(migration.sql)
                    .await
                    .map_err(|e| {
                        BurgerWatchError::Persistence(format!(
                            "migration v{} failed: {e}",
                            migration.version
                        ))
                    })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    /// Ensure we're in read-write mode before writing.
    fn check_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(BurgerWatchError::Persistence(
                "database is opened in read-only mode".into(),
            ));
        }
        Ok(())
    }

    /// Total number of stored products.
    pub async fn count_products(&self) -> Result<u64> {
        let mut rows = self
            .conn
            .query("SELECT COUNT(*) FROM products", params![])
            .await
            .map_err(|e| BurgerWatchError::Persistence(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let count: i64 = row
                    .get(0)
                    .map_err(|e| BurgerWatchError::Persistence(e.to_string()))?;
                Ok(count.max(0) as u64)
            }
            Ok(None) => Ok(0),
            Err(e) => Err(BurgerWatchError::Persistence(e.to_string())),
        }
    }
}

#[async_trait]
impl ProductStore for Storage {
    async fn find_product(&self, name: &str, brand_name: &str) -> Result<Option<StoredProduct>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS}
             FROM products p
             JOIN brands b ON b.id = p.brand_id
             LEFT JOIN nutrition n ON n.product_id = p.id
             WHERE p.name = ?1 AND b.name = ?2"
        );
        let mut rows = self
            .conn
            .query(&sql, params![name, brand_name])
            .await
            .map_err(|e| BurgerWatchError::Persistence(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_product(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(BurgerWatchError::Persistence(e.to_string())),
        }
    }

    async fn get_or_create_brand(&self, brand: &Brand) -> Result<BrandId> {
        self.check_writable()?;
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO brands (name, name_eng, description, logo_url, website_url, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(name) DO NOTHING",
                params![
                    brand.name.as_str(),
                    brand.name_eng.as_str(),
                    brand.description.as_deref(),
                    brand.logo_url.as_deref(),
                    brand.website_url.as_deref(),
                    now.as_str(),
                ],
            )
            .await
            .map_err(|e| BurgerWatchError::Persistence(e.to_string()))?;

        let mut rows = self
            .conn
            .query(
                "SELECT id FROM brands WHERE name = ?1",
                params![brand.name.as_str()],
            )
            .await
            .map_err(|e| BurgerWatchError::Persistence(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(BrandId(
                row.get::<i64>(0)
                    .map_err(|e| BurgerWatchError::Persistence(e.to_string()))?,
            )),
            Ok(None) => Err(BurgerWatchError::Persistence(format!(
                "brand '{}' missing after insert",
                brand.name
            ))),
            Err(e) => Err(BurgerWatchError::Persistence(e.to_string())),
        }
    }

    async fn insert_product(&self, brand_id: BrandId, product: &DraftProduct) -> Result<ProductId> {
        self.check_writable()?;
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO products (brand_id, name, description, description_full, image_url,
                                       price, set_price, available, category, shop_url,
                                       released_at, patty, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    brand_id.0,
                    product.name.as_str(),
                    product.description.as_deref(),
                    product.description_full.as_deref(),
                    product.image_url.as_deref(),
                    i64::from(product.price),
                    product.set_price.map(i64::from),
                    i64::from(product.available),
                    product.category.as_str(),
                    product.shop_url.as_deref(),
                    product.released_at.to_rfc3339(),
                    product.patty.as_str(),
                    now.as_str(),
                ],
            )
            .await
            .map_err(|e| {
                BurgerWatchError::Persistence(format!("insert product '{}': {e}", product.name))
            })?;

        Ok(ProductId(self.conn.last_insert_rowid()))
    }

    async fn insert_nutrition(&self, product_id: ProductId, nutrition: &Nutrition) -> Result<()> {
        self.check_writable()?;
        self.conn
            .execute(
                "INSERT INTO nutrition (product_id, calories, fat, protein, sugar, sodium)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    product_id.0,
                    nutrition.calories,
                    nutrition.fat,
                    nutrition.protein,
                    nutrition.sugar,
                    nutrition.sodium,
                ],
            )
            .await
            .map_err(|e| {
                BurgerWatchError::Persistence(format!(
                    "insert nutrition for product {product_id}: {e}"
                ))
            })?;
        Ok(())
    }

    async fn list_recent_products(
        &self,
        limit: u32,
        brand_name: Option<&str>,
    ) -> Result<Vec<StoredProduct>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS}
             FROM products p
             JOIN brands b ON b.id = p.brand_id
             LEFT JOIN nutrition n ON n.product_id = p.id
             WHERE ?1 IS NULL OR b.name = ?1
             ORDER BY p.created_at DESC, p.id DESC
             LIMIT ?2"
        );
        let mut rows = self
            .conn
            .query(&sql, params![brand_name, limit])
            .await
            .map_err(|e| BurgerWatchError::Persistence(e.to_string()))?;

        let mut results = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            results.push(row_to_product(&row)?);
        }
        Ok(results)
    }
}

/// Convert a database row (selected with [`PRODUCT_COLUMNS`]) to a [`StoredProduct`].
fn row_to_product(row: &libsql::Row) -> Result<StoredProduct> {
    let storage_err = |e: libsql::Error| BurgerWatchError::Persistence(e.to_string());

    let price: i64 = row.get(7).map_err(storage_err)?;
    let patty: String = row.get(13).map_err(storage_err)?;

    let nutrition = row.get::<i64>(15).ok().map(|_| Nutrition {
        calories: row.get::<f64>(16).ok(),
        fat: row.get::<f64>(17).ok(),
        protein: row.get::<f64>(18).ok(),
        sugar: row.get::<f64>(19).ok(),
        sodium: row.get::<f64>(20).ok(),
    });

    Ok(StoredProduct {
        id: ProductId(row.get::<i64>(0).map_err(storage_err)?),
        brand_id: BrandId(row.get::<i64>(1).map_err(storage_err)?),
        brand_name: row.get::<String>(2).map_err(storage_err)?,
        name: row.get::<String>(3).map_err(storage_err)?,
        description: row.get::<String>(4).ok(),
        description_full: row.get::<String>(5).ok(),
        image_url: row.get::<String>(6).ok(),
        price: u32::try_from(price)
            .map_err(|_| BurgerWatchError::Persistence(format!("invalid price {price}")))?,
        set_price: row
            .get::<i64>(8)
            .ok()
            .and_then(|v| u32::try_from(v).ok()),
        available: row.get::<i64>(9).map_err(storage_err)? != 0,
        category: row.get::<String>(10).map_err(storage_err)?,
        shop_url: row.get::<String>(11).ok(),
        released_at: parse_timestamp(&row.get::<String>(12).map_err(storage_err)?)?,
        patty: patty
            .parse()
            .map_err(|e| BurgerWatchError::Persistence(format!("{e}")))?,
        nutrition,
        created_at: parse_timestamp(&row.get::<String>(14).map_err(storage_err)?)?,
    })
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| BurgerWatchError::Persistence(format!("invalid date '{s}': {e}")))
}
