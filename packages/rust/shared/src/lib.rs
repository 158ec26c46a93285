//! Shared types, error model, and configuration for BurgerWatch.
//!
//! This crate is the foundation depended on by all other BurgerWatch crates.
//! It provides:
//! - [`BurgerWatchError`]: the unified error type
//! - Domain types ([`Brand`], [`DraftProduct`], [`StoredProduct`], [`Nutrition`], [`Patty`])
//! - Configuration ([`AppConfig`], runtime configs, config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, BrowserSection, CrawlConfig, CrawlSection, DatabaseConfig, PersistMode,
    PersistSection, ScheduleConfig, ScheduleSection, SessionConfig, config_dir, config_file_path,
    database_path, init_config, load_config, load_config_from,
};
pub use error::{BurgerWatchError, Result};
pub use types::{
    Brand, BrandId, DEFAULT_CATEGORY, DraftProduct, Nutrition, Patty, ProductId, StoredProduct,
};
