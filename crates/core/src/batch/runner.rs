//! Batch job execution with isolated per-account failures.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tucano_shared::types::AccountId;

use crate::account::{Account, AccountKindTag};
use crate::ledger::{LedgerError, LedgerService, Movement};
use crate::store::Store;

/// The two monthly jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    /// Maintenance fee sweep over checking accounts.
    MaintenanceFee,
    /// Yield sweep over savings accounts.
    SavingsYield,
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MaintenanceFee => write!(f, "maintenance_fee"),
            Self::SavingsYield => write!(f, "savings_yield"),
        }
    }
}

/// A single account's recorded failure.
#[derive(Debug, Clone)]
pub struct JobFailure {
    /// The account that failed.
    pub account_id: AccountId,
    /// Stable error code of the failure.
    pub code: &'static str,
    /// Human-readable failure message.
    pub message: String,
}

/// Outcome of one batch job run.
#[derive(Debug, Clone)]
pub struct JobReport {
    /// Which job ran.
    pub kind: JobKind,
    /// Accounts picked up before completion or early termination.
    pub processed: usize,
    /// Accounts that received a movement.
    pub applied: usize,
    /// Accounts that were a no-op (zero fee or zero yield).
    pub skipped: usize,
    /// True when the stop flag ended the run between accounts.
    pub stopped_early: bool,
    /// Per-account failures, in processing order.
    pub failures: Vec<JobFailure>,
    /// When the run finished.
    pub completed_at: DateTime<Utc>,
}

/// Runs the monthly jobs, delegating each account to the ledger engine.
pub struct BatchRunner<S> {
    ledger: LedgerService<S>,
}

impl<S> Clone for BatchRunner<S> {
    fn clone(&self) -> Self {
        Self {
            ledger: self.ledger.clone(),
        }
    }
}

impl<S: Store> BatchRunner<S> {
    /// Creates a runner over the given ledger engine.
    #[must_use]
    pub const fn new(ledger: LedgerService<S>) -> Self {
        Self { ledger }
    }

    /// Charges the monthly maintenance fee on every checking account.
    ///
    /// The `stop` flag is honored between accounts; a run never stops
    /// mid-account.
    ///
    /// # Errors
    ///
    /// Only enumeration failures abort the run; per-account failures are
    /// collected in the report.
    pub fn run_fee_job(&self, stop: &AtomicBool) -> Result<JobReport, LedgerError> {
        let accounts = self
            .ledger
            .store()
            .list_accounts_by_kind(AccountKindTag::Checking)?;
        Ok(self.run_job(JobKind::MaintenanceFee, &accounts, stop, |id| {
            self.ledger.apply_maintenance_fee(id)
        }))
    }

    /// Credits the monthly yield on every savings account.
    ///
    /// # Errors
    ///
    /// Only enumeration failures abort the run; per-account failures are
    /// collected in the report.
    pub fn run_yield_job(&self, stop: &AtomicBool) -> Result<JobReport, LedgerError> {
        let accounts = self
            .ledger
            .store()
            .list_accounts_by_kind(AccountKindTag::Savings)?;
        Ok(self.run_job(JobKind::SavingsYield, &accounts, stop, |id| {
            self.ledger.apply_yield(id)
        }))
    }

    fn run_job(
        &self,
        kind: JobKind,
        accounts: &[Account],
        stop: &AtomicBool,
        apply: impl Fn(AccountId) -> Result<Option<Movement>, LedgerError>,
    ) -> JobReport {
        let mut report = JobReport {
            kind,
            processed: 0,
            applied: 0,
            skipped: 0,
            stopped_early: false,
            failures: Vec::new(),
            completed_at: Utc::now(),
        };

        for account in accounts {
            if stop.load(Ordering::SeqCst) {
                report.stopped_early = true;
                tracing::info!(job = %kind, processed = report.processed, "batch job stopped early");
                break;
            }

            report.processed += 1;
            match apply(account.id) {
                Ok(Some(movement)) => {
                    report.applied += 1;
                    tracing::debug!(
                        job = %kind,
                        account_id = %account.id,
                        amount = %movement.amount,
                        "batch movement applied"
                    );
                }
                Ok(None) => report.skipped += 1,
                Err(e) => {
                    tracing::warn!(
                        job = %kind,
                        account_id = %account.id,
                        error = %e,
                        "batch account failed, continuing"
                    );
                    report.failures.push(JobFailure {
                        account_id: account.id,
                        code: e.error_code(),
                        message: e.to_string(),
                    });
                }
            }
        }

        report.completed_at = Utc::now();
        tracing::info!(
            job = %kind,
            processed = report.processed,
            applied = report.applied,
            skipped = report.skipped,
            failures = report.failures.len(),
            "batch job finished"
        );
        report
    }
}
