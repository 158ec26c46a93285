//! Sweep orchestration for BurgerWatch.
//!
//! This crate ties crawling and persistence together: the [`DedupGate`]
//! decides which crawled products are new, the [`Scheduler`] runs brands in
//! sequence, and [`SweepSchedule`] decides when a sweep is due.

pub mod dedup;
pub mod schedule;
pub mod scheduler;

#[cfg(test)]
mod testing;

pub use dedup::{
    AutoConfirm, Confirmer, DedupGate, GateOutcome, PersistFailure, PersistReport, PersistStage,
};
pub use schedule::{Job, SweepSchedule};
pub use scheduler::{
    BrandRunSummary, DryRun, ProgressReporter, Scheduler, SilentProgress, SweepSummary,
};
