//! SQL migration definitions for the BurgerWatch database.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a batch of SQL statements.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial schema: brands, products, nutrition",
        sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version    INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Brands, keyed by local name
CREATE TABLE IF NOT EXISTS brands (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL UNIQUE,
    name_eng    TEXT NOT NULL,
    description TEXT,
    logo_url    TEXT,
    website_url TEXT,
    created_at  TEXT NOT NULL
);

-- Products; (name, brand) is the dedup identity
CREATE TABLE IF NOT EXISTS products (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    brand_id         INTEGER NOT NULL REFERENCES brands(id) ON DELETE CASCADE,
    name             TEXT NOT NULL,
    description      TEXT,
    description_full TEXT,
    image_url        TEXT,
    price            INTEGER NOT NULL DEFAULT 0 CHECK (price >= 0),
    set_price        INTEGER CHECK (set_price IS NULL OR set_price >= 0),
    available        INTEGER NOT NULL DEFAULT 1,
    category         TEXT NOT NULL DEFAULT '버거',
    shop_url         TEXT,
    released_at      TEXT NOT NULL,
    patty            TEXT NOT NULL DEFAULT 'undefined'
                     CHECK (patty IN ('beef', 'chicken', 'pork', 'undefined')),
    created_at       TEXT NOT NULL,
    UNIQUE(name, brand_id)
);

CREATE INDEX IF NOT EXISTS idx_products_brand_id ON products(brand_id);
CREATE INDEX IF NOT EXISTS idx_products_created_at ON products(created_at);

-- At most one nutrition record per product
CREATE TABLE IF NOT EXISTS nutrition (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    product_id INTEGER NOT NULL UNIQUE REFERENCES products(id) ON DELETE CASCADE,
    calories   REAL CHECK (calories IS NULL OR calories >= 0),
    fat        REAL CHECK (fat IS NULL OR fat >= 0),
    protein    REAL CHECK (protein IS NULL OR protein >= 0),
    sugar      REAL CHECK (sugar IS NULL OR sugar >= 0),
    sodium     REAL CHECK (sodium IS NULL OR sodium >= 0)
);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
    }]
}
