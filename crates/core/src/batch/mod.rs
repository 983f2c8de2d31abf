//! Monthly batch jobs over the account book.
//!
//! Two independent jobs: the maintenance fee sweep over checking accounts
//! and the yield sweep over savings accounts. Each account is processed as
//! its own atomic unit; one account's failure is recorded and never aborts
//! the batch. The scheduler runs the jobs on their configured day of month.

pub mod runner;
pub mod schedule;
pub mod scheduler;

pub use runner::{BatchRunner, JobFailure, JobKind, JobReport};
pub use schedule::MonthlySchedule;
pub use scheduler::{Scheduler, SchedulerHandle};
