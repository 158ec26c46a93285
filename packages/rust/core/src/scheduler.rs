//! Brand sweeps: crawl every registered brand in order and gate the results.
//!
//! One brand's crawl → dedup → persist cycle finishes before the next brand
//! starts. A brand that fails, panics included, is logged and the sweep
//! moves on.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use burgerwatch_crawler::{AdapterRegistry, CrawlAdapter, CrawlBatch, CrawlState};
use burgerwatch_shared::{DraftProduct, PersistMode, Result, ScheduleConfig};
use burgerwatch_storage::ProductStore;
use chrono::Local;
use futures_util::FutureExt;
use tracing::{error, info, instrument, warn};

use crate::dedup::{AutoConfirm, Confirmer, DedupGate, PersistReport};
use crate::schedule::SweepSchedule;

// ---------------------------------------------------------------------------
// Summaries
// ---------------------------------------------------------------------------

/// Result of one brand's crawl and gate pass.
#[derive(Debug, Clone)]
pub struct BrandRunSummary {
    /// Registry id.
    pub brand: String,
    /// Items in the crawl batch.
    pub crawled: usize,
    /// Items not yet stored.
    pub proposed: usize,
    pub declined: usize,
    pub report: PersistReport,
    pub final_state: Option<CrawlState>,
    /// Degraded crawl steps.
    pub crawl_failures: Vec<String>,
}

impl BrandRunSummary {
    fn from_batch(brand: &str, batch: &CrawlBatch) -> Self {
        Self {
            brand: brand.to_string(),
            crawled: batch.items.len(),
            proposed: 0,
            declined: 0,
            report: PersistReport::default(),
            final_state: batch.final_state(),
            crawl_failures: batch.failures.clone(),
        }
    }

    fn failed(brand: &str, cause: String) -> Self {
        Self {
            brand: brand.to_string(),
            crawled: 0,
            proposed: 0,
            declined: 0,
            report: PersistReport::default(),
            final_state: Some(CrawlState::Failed),
            crawl_failures: vec![cause],
        }
    }

    /// Crawl reached `Done` and every write succeeded.
    pub fn is_clean(&self) -> bool {
        self.final_state == Some(CrawlState::Done)
            && self.crawl_failures.is_empty()
            && self.report.failures.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SweepSummary {
    pub brands: Vec<BrandRunSummary>,
    pub elapsed: Duration,
}

impl SweepSummary {
    pub fn inserted(&self) -> usize {
        self.brands.iter().map(|b| b.report.inserted.len()).sum()
    }

    /// Brands whose crawl ended in `Failed`.
    pub fn failed_brands(&self) -> Vec<&str> {
        self.brands
            .iter()
            .filter(|b| b.final_state == Some(CrawlState::Failed))
            .map(|b| b.brand.as_str())
            .collect()
    }
}

/// Output of a crawl without writes.
#[derive(Debug, Clone)]
pub struct DryRun {
    pub batch: CrawlBatch,
    /// Batch items not yet stored.
    pub new_items: Vec<DraftProduct>,
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Sweep events for an operator display.
pub trait ProgressReporter: Send + Sync {
    /// Called before the first brand.
    fn sweep_started(&self, total: usize);
    /// Called before a brand's crawl.
    fn brand_started(&self, brand: &str, current: usize, total: usize);
    /// Called after a brand's gate pass.
    fn brand_finished(&self, summary: &BrandRunSummary);
    fn sweep_finished(&self, summary: &SweepSummary);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn sweep_started(&self, _total: usize) {}
    fn brand_started(&self, _brand: &str, _current: usize, _total: usize) {}
    fn brand_finished(&self, _summary: &BrandRunSummary) {}
    fn sweep_finished(&self, _summary: &SweepSummary) {}
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

pub struct Scheduler {
    registry: AdapterRegistry,
    store: Arc<dyn ProductStore>,
    brand_delay: Duration,
    progress: Arc<dyn ProgressReporter>,
}

impl Scheduler {
    pub fn new(registry: AdapterRegistry, store: Arc<dyn ProductStore>) -> Self {
        let brand_delay = registry.context().crawl.brand_delay;
        Self {
            registry,
            store,
            brand_delay,
            progress: Arc::new(SilentProgress),
        }
    }

    pub fn with_brand_delay(mut self, delay: Duration) -> Self {
        self.brand_delay = delay;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    /// Crawl and gate every registered brand with auto-confirm.
    #[instrument(skip_all)]
    pub async fn run_all(&self) -> SweepSummary {
        let start = Instant::now();
        let ids: Vec<String> = self.registry.brands().into_iter().map(String::from).collect();
        let total = ids.len();
        info!(brands = total, "sweep started");
        self.progress.sweep_started(total);

        let mut summary = SweepSummary::default();
        for (i, id) in ids.iter().enumerate() {
            if i > 0 && !self.brand_delay.is_zero() {
                tokio::time::sleep(self.brand_delay).await;
            }
            self.progress.brand_started(id, i + 1, total);

            let brand = match self.run_brand(id, PersistMode::Auto, &AutoConfirm).await {
                Ok(brand) => brand,
                Err(e) => {
                    error!(brand = %id, error = %e, "brand run failed");
                    BrandRunSummary::failed(id, e.to_string())
                }
            };
            self.progress.brand_finished(&brand);
            summary.brands.push(brand);
        }

        summary.elapsed = start.elapsed();
        info!(
            inserted = summary.inserted(),
            failed = summary.failed_brands().len(),
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "sweep finished"
        );
        self.progress.sweep_finished(&summary);
        summary
    }

    /// Crawl and gate one brand in `mode`.
    #[instrument(skip_all, fields(brand = %brand))]
    pub async fn run_once(
        &self,
        brand: &str,
        mode: PersistMode,
        confirmer: &dyn Confirmer,
    ) -> Result<BrandRunSummary> {
        self.progress.brand_started(brand, 1, 1);
        let summary = self.run_brand(brand, mode, confirmer).await?;
        self.progress.brand_finished(&summary);
        Ok(summary)
    }

    /// Crawl one brand and report which items are new, writing nothing.
    #[instrument(skip_all, fields(brand = %brand))]
    pub async fn crawl_only(&self, brand: &str) -> Result<DryRun> {
        let adapter = self.registry.create(brand)?;
        let batch = crawl_isolated(adapter.as_ref()).await;
        let new_items = DedupGate::new(self.store.as_ref())
            .filter_new(&batch.items)
            .await;
        Ok(DryRun { batch, new_items })
    }

    /// Sweep now, then on every due job. Never returns.
    pub async fn start(&self, config: &ScheduleConfig) {
        self.start_until(config, std::future::pending()).await
    }

    /// Like [`Scheduler::start`], stopping once `shutdown` resolves.
    pub async fn start_until(&self, config: &ScheduleConfig, shutdown: impl Future<Output = ()>) {
        let mut schedule = SweepSchedule::new(config, Local::now().naive_local());
        for (job, next) in schedule.jobs() {
            info!(job = %job, next = %next, "job scheduled");
        }

        tokio::pin!(shutdown);
        let mut sweep = true;
        loop {
            if sweep {
                self.run_all().await;
                if let Some(next) = schedule.next_run() {
                    info!(next = %next, "next sweep");
                }
            }
            tokio::select! {
                _ = &mut shutdown => {
                    info!("scheduler stopped");
                    return;
                }
                _ = tokio::time::sleep(config.tick) => {}
            }
            sweep = schedule.take_due(Local::now().naive_local());
        }
    }

    async fn run_brand(
        &self,
        brand: &str,
        mode: PersistMode,
        confirmer: &dyn Confirmer,
    ) -> Result<BrandRunSummary> {
        let adapter = self.registry.create(brand)?;
        let batch = crawl_isolated(adapter.as_ref()).await;
        let mut summary = BrandRunSummary::from_batch(brand, &batch);

        let outcome = DedupGate::new(self.store.as_ref())
            .process(&batch.items, mode, confirmer)
            .await;
        summary.proposed = outcome.proposed;
        summary.declined = outcome.declined;
        summary.report = outcome.report;
        Ok(summary)
    }
}

/// Run `adapter.crawl()`, turning a panic into an empty failed batch.
async fn crawl_isolated(adapter: &dyn CrawlAdapter) -> CrawlBatch {
    match AssertUnwindSafe(adapter.crawl()).catch_unwind().await {
        Ok(batch) => {
            if batch.is_degraded() {
                warn!(brand = %adapter.id(), failures = batch.failures.len(), "crawl degraded");
            }
            batch
        }
        Err(payload) => {
            let cause = format!("adapter panicked: {}", panic_message(payload.as_ref()));
            error!(brand = %adapter.id(), "{cause}");
            CrawlBatch::failed(adapter.brand().clone(), cause)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
