use serde::{Deserialize, Serialize};

pub const MORNING_JOB_NAME: &str = "OuraClaw Morning Summary";
pub const EVENING_JOB_NAME: &str = "OuraClaw Evening Summary";

/// Every name an OuraClaw job has ever been created under, current first.
pub const KNOWN_JOB_NAMES: &[&str] = &[
    MORNING_JOB_NAME,
    EVENING_JOB_NAME,
    "ouraclaw-morning",
    "ouraclaw-evening",
];

/// Opaque handle to a job on the external scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CronJobRef {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

impl CronJobRef {
    pub fn is_ouraclaw_job(&self) -> bool {
        KNOWN_JOB_NAMES.contains(&self.name.as_str())
    }
}

/// A job to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewJob {
    pub name: String,
    /// Five-field cron expression, e.g. `0 7 * * *`.
    pub cron_expression: String,
    pub timezone: String,
    /// Run in a fresh agent session rather than the main one.
    pub isolated_session: bool,
    pub message: String,
    /// The agent sends the summary itself over the configured channel, so
    /// the runner must not announce the output a second time.
    pub deliver_directly: bool,
}
