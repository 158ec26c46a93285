//! Dedup gate: narrow a crawl batch to products the store has not seen, decide
//! which of them to keep, and write them.
//!
//! Writes are per entity with no surrounding transaction. A brand failure
//! aborts that item, a product failure skips its nutrition, and a nutrition
//! failure leaves the product in place. Every failure lands in the
//! [`PersistReport`].

use std::collections::HashSet;

use burgerwatch_shared::{BurgerWatchError, DraftProduct, PersistMode};
use burgerwatch_storage::ProductStore;
use tracing::{debug, info, instrument, warn};

// ---------------------------------------------------------------------------
// Confirmation
// ---------------------------------------------------------------------------

/// Operator decision for one new item in [`PersistMode::Confirm`].
pub trait Confirmer: Send + Sync {
    fn confirm(&self, item: &DraftProduct) -> bool;
}

/// Accepts everything.
pub struct AutoConfirm;

impl Confirmer for AutoConfirm {
    fn confirm(&self, _item: &DraftProduct) -> bool {
        true
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Write step that failed for an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistStage {
    Brand,
    Product,
    Nutrition,
}

impl PersistStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Brand => "brand",
            Self::Product => "product",
            Self::Nutrition => "nutrition",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistFailure {
    pub name: String,
    pub stage: PersistStage,
    pub cause: String,
}

impl std::fmt::Display for PersistFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.name, self.stage.as_str(), self.cause)
    }
}

/// Outcome of [`DedupGate::persist`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistReport {
    /// Names of products written, in input order.
    pub inserted: Vec<String>,
    /// Products whose nutrition row was written as well.
    pub nutrition_attached: usize,
    pub failures: Vec<PersistFailure>,
}

impl PersistReport {
    fn fail(&mut self, item: &DraftProduct, stage: PersistStage, err: &BurgerWatchError) {
        warn!(name = %item.name, brand = %item.brand.name, stage = stage.as_str(), error = %err, "persist failed");
        self.failures.push(PersistFailure {
            name: item.name.clone(),
            stage,
            cause: err.to_string(),
        });
    }
}

/// Outcome of one full pass through the gate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GateOutcome {
    /// Items not yet in the store.
    pub proposed: usize,
    /// Proposed items the confirmer turned down.
    pub declined: usize,
    pub report: PersistReport,
}

// ---------------------------------------------------------------------------
// Gate
// ---------------------------------------------------------------------------

pub struct DedupGate<'a> {
    store: &'a dyn ProductStore,
}

impl<'a> DedupGate<'a> {
    pub fn new(store: &'a dyn ProductStore) -> Self {
        Self { store }
    }

    /// Items of `batch` with no stored `(name, brand)` match, in batch order.
    ///
    /// Repeats inside the batch are kept once. An item whose lookup fails is
    /// dropped, never proposed unverified.
    pub async fn filter_new(&self, batch: &[DraftProduct]) -> Vec<DraftProduct> {
        let mut seen = HashSet::new();
        let mut fresh = Vec::new();

        for item in batch {
            let (name, brand) = item.identity();
            if !seen.insert((name.to_string(), brand.to_string())) {
                continue;
            }
            match self.store.find_product(name, brand).await {
                Ok(None) => fresh.push(item.clone()),
                Ok(Some(existing)) => {
                    debug!(name, brand, id = %existing.id, "already stored");
                }
                Err(e) => {
                    warn!(name, brand, error = %e, "lookup failed, item not proposed");
                }
            }
        }
        fresh
    }

    /// Split proposed items into accepted ones and a declined count.
    pub fn decide(
        &self,
        items: Vec<DraftProduct>,
        mode: PersistMode,
        confirmer: &dyn Confirmer,
    ) -> (Vec<DraftProduct>, usize) {
        match mode {
            PersistMode::Auto => (items, 0),
            PersistMode::Confirm => {
                let total = items.len();
                let accepted: Vec<_> = items
                    .into_iter()
                    .filter(|item| confirmer.confirm(item))
                    .collect();
                let declined = total - accepted.len();
                (accepted, declined)
            }
        }
    }

    /// Write each item: brand (get-or-create), product, then nutrition when present.
    pub async fn persist(&self, items: &[DraftProduct]) -> PersistReport {
        let mut report = PersistReport::default();

        for item in items {
            let brand_id = match self.store.get_or_create_brand(&item.brand).await {
                Ok(id) => id,
                Err(e) => {
                    report.fail(item, PersistStage::Brand, &e);
                    continue;
                }
            };
            let product_id = match self.store.insert_product(brand_id, item).await {
                Ok(id) => id,
                Err(e) => {
                    report.fail(item, PersistStage::Product, &e);
                    continue;
                }
            };
            debug!(name = %item.name, id = %product_id, "product inserted");
            report.inserted.push(item.name.clone());

            if let Some(nutrition) = item.nutrition.filter(|n| !n.is_empty()) {
                match self.store.insert_nutrition(product_id, &nutrition).await {
                    Ok(()) => report.nutrition_attached += 1,
                    Err(e) => report.fail(item, PersistStage::Nutrition, &e),
                }
            }
        }
        report
    }

    /// Filter, decide, and persist one batch.
    #[instrument(skip_all, fields(items = batch.len(), mode = ?mode))]
    pub async fn process(
        &self,
        batch: &[DraftProduct],
        mode: PersistMode,
        confirmer: &dyn Confirmer,
    ) -> GateOutcome {
        let fresh = self.filter_new(batch).await;
        let proposed = fresh.len();
        let (accepted, declined) = self.decide(fresh, mode, confirmer);
        let report = self.persist(&accepted).await;

        info!(
            proposed,
            declined,
            inserted = report.inserted.len(),
            failures = report.failures.len(),
            "batch gated"
        );
        GateOutcome {
            proposed,
            declined,
            report,
        }
    }
}
