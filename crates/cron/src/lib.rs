//! Morning/evening summary jobs on the external OpenClaw scheduler.
//!
//! The scheduler itself is external; this crate only reconciles OuraClaw's
//! jobs against it so repeated setup never leaves duplicates behind.

pub mod error;
pub mod reconcile;
pub mod runner;
pub mod schedule;
pub mod types;

pub use {
    error::SchedulingError,
    reconcile::{InstalledJobs, install_jobs, remove_jobs},
    runner::{JobRunner, OpenclawCli},
    schedule::{time_to_cron, validate_schedule},
    types::{CronJobRef, EVENING_JOB_NAME, KNOWN_JOB_NAMES, MORNING_JOB_NAME, NewJob},
};
