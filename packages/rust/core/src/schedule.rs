//! Sweep timing: fixed wall-clock times plus a recurring interval.
//!
//! Times are local wall-clock [`NaiveDateTime`]s so the schedule can be driven
//! by a test clock. Jobs due at the same check coalesce into one sweep.

use std::time::Duration;

use burgerwatch_shared::ScheduleConfig;
use chrono::{NaiveDateTime, NaiveTime, TimeDelta};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Job {
    Every(Duration),
    DailyAt(NaiveTime),
}

impl Job {
    /// First run strictly after `after`.
    fn next_after(&self, after: NaiveDateTime) -> NaiveDateTime {
        match *self {
            Job::Every(every) => TimeDelta::from_std(every)
                .ok()
                .and_then(|d| after.checked_add_signed(d))
                .unwrap_or(NaiveDateTime::MAX),
            Job::DailyAt(time) => {
                let today = after.date().and_time(time);
                if today > after {
                    today
                } else {
                    today + TimeDelta::days(1)
                }
            }
        }
    }
}

impl std::fmt::Display for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Job::Every(every) => write!(f, "every {}s", every.as_secs()),
            Job::DailyAt(time) => write!(f, "daily at {}", time.format("%H:%M")),
        }
    }
}

#[derive(Debug, Clone)]
struct Pending {
    job: Job,
    next_run: NaiveDateTime,
}

/// Pending sweep jobs and their next run times.
#[derive(Debug, Clone)]
pub struct SweepSchedule {
    jobs: Vec<Pending>,
}

impl SweepSchedule {
    /// Schedule from configuration, with every job's first run after `now`.
    pub fn new(config: &ScheduleConfig, now: NaiveDateTime) -> Self {
        let jobs = std::iter::once(Job::Every(config.interval))
            .chain(config.daily_at.iter().copied().map(Job::DailyAt))
            .collect();
        Self::from_jobs(jobs, now)
    }

    pub fn from_jobs(jobs: Vec<Job>, now: NaiveDateTime) -> Self {
        Self {
            jobs: jobs
                .into_iter()
                .map(|job| Pending {
                    job,
                    next_run: job.next_after(now),
                })
                .collect(),
        }
    }

    /// Earliest pending run.
    pub fn next_run(&self) -> Option<NaiveDateTime> {
        self.jobs.iter().map(|p| p.next_run).min()
    }

    pub fn jobs(&self) -> impl Iterator<Item = (Job, NaiveDateTime)> + '_ {
        self.jobs.iter().map(|p| (p.job, p.next_run))
    }

    /// Whether any job is due at `now`. Due jobs are rescheduled after `now`.
    pub fn take_due(&mut self, now: NaiveDateTime) -> bool {
        let mut due = false;
        for pending in &mut self.jobs {
            if pending.next_run <= now {
                due = true;
                pending.next_run = pending.job.next_after(now);
            }
        }
        due
    }
}
