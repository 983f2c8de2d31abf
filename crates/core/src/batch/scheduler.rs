//! Scheduler loop driving the monthly jobs.
//!
//! Ticks on a fixed interval, checks the due-date predicates, and runs each
//! job at most once per calendar period in-process. Exactly-once across
//! process restarts is the deployment's responsibility; this loop only
//! guarantees it does not re-fire within its own lifetime.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{Datelike, NaiveDate, Utc};
use tokio::sync::watch;

use crate::store::Store;

use super::runner::{BatchRunner, JobReport};
use super::schedule::MonthlySchedule;

/// A calendar period, as (year, month).
type Period = (i32, u32);

/// Handle for stopping a running scheduler.
///
/// Shutdown is graceful: the in-flight job stops between accounts (never
/// mid-account) and the loop exits.
#[derive(Debug, Clone)]
pub struct SchedulerHandle {
    shutdown_tx: watch::Sender<bool>,
    stop: Arc<AtomicBool>,
}

impl SchedulerHandle {
    /// Requests shutdown.
    pub fn shutdown(&self) {
        self.stop.store(true, Ordering::SeqCst);
        let _ = self.shutdown_tx.send(true);
    }
}

/// Runs the monthly jobs on their configured days.
pub struct Scheduler<S> {
    runner: BatchRunner<S>,
    schedule: MonthlySchedule,
    tick: Duration,
    stop: Arc<AtomicBool>,
    shutdown_rx: watch::Receiver<bool>,
    last_fee_period: Option<Period>,
    last_yield_period: Option<Period>,
}

impl<S: Store + 'static> Scheduler<S> {
    /// Creates a scheduler and its shutdown handle.
    #[must_use]
    pub fn new(
        runner: BatchRunner<S>,
        schedule: MonthlySchedule,
        tick: Duration,
    ) -> (Self, SchedulerHandle) {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let stop = Arc::new(AtomicBool::new(false));
        let handle = SchedulerHandle {
            shutdown_tx,
            stop: Arc::clone(&stop),
        };
        (
            Self {
                runner,
                schedule,
                tick,
                stop,
                shutdown_rx,
                last_fee_period: None,
                last_yield_period: None,
            },
            handle,
        )
    }

    /// Starts the scheduler loop on the current tokio runtime.
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    /// Runs the scheduler loop until shutdown.
    async fn run(mut self) {
        tracing::info!(
            fee_day = self.schedule.fee_day,
            yield_day = self.schedule.yield_day,
            "batch scheduler started"
        );

        let mut shutdown_rx = self.shutdown_rx.clone();
        let mut interval = tokio::time::interval(self.tick);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.run_due_jobs(Utc::now().date_naive());
                }
                _ = shutdown_rx.changed() => {
                    tracing::info!("batch scheduler stopping");
                    break;
                }
            }
        }
    }

    /// Runs whichever jobs are due on `today` and not yet run this period.
    ///
    /// Returns the reports of the jobs that ran.
    pub fn run_due_jobs(&mut self, today: NaiveDate) -> Vec<JobReport> {
        let period = (today.year(), today.month());
        let mut reports = Vec::new();

        if self.schedule.fee_due(today) && self.last_fee_period != Some(period) {
            match self.runner.run_fee_job(&self.stop) {
                Ok(report) => {
                    self.last_fee_period = Some(period);
                    reports.push(report);
                }
                Err(e) => tracing::error!(error = %e, "maintenance fee job failed to start"),
            }
        }

        if self.schedule.yield_due(today) && self.last_yield_period != Some(period) {
            match self.runner.run_yield_job(&self.stop) {
                Ok(report) => {
                    self.last_yield_period = Some(period);
                    reports.push(report);
                }
                Err(e) => tracing::error!(error = %e, "savings yield job failed to start"),
            }
        }

        reports
    }
}
