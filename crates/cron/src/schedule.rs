use std::path::Path;

use ouraclaw_config::OuraConfig;

use crate::{
    error::SchedulingError,
    types::{EVENING_JOB_NAME, MORNING_JOB_NAME, NewJob},
};

/// Convert `HH:MM` into a daily cron expression (`M H * * *`).
pub fn time_to_cron(time: &str) -> Result<String, SchedulingError> {
    let invalid = || SchedulingError::InvalidTime(time.to_string());
    let (hours, minutes) = time.trim().split_once(':').ok_or_else(invalid)?;
    let hours: u8 = hours.parse().map_err(|_| invalid())?;
    let minutes: u8 = minutes.parse().map_err(|_| invalid())?;
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }
    Ok(format!("{minutes} {hours} * * *"))
}

fn validate_timezone(tz: &str) -> Result<(), SchedulingError> {
    tz.parse::<chrono_tz::Tz>()
        .map(|_| ())
        .map_err(|_| SchedulingError::InvalidTimezone(tz.to_string()))
}

/// Check the schedule fields of `config` (both times and the timezone)
/// without building any job.
pub fn validate_schedule(config: &OuraConfig) -> Result<(), SchedulingError> {
    validate_timezone(config.timezone())?;
    time_to_cron(config.morning_time())?;
    time_to_cron(config.evening_time())?;
    Ok(())
}

/// The morning and evening jobs described by `config`.
pub(crate) fn summary_jobs(
    config: &OuraConfig,
    skill_path: &Path,
) -> Result<[NewJob; 2], SchedulingError> {
    let timezone = config.timezone();
    validate_timezone(timezone)?;

    let channel = config
        .preferred_channel
        .as_deref()
        .filter(|c| !c.is_empty() && *c != "default");
    let target = config
        .preferred_channel_target
        .as_deref()
        .filter(|t| !t.is_empty());
    let (channel_part, deliver_directly) = match (channel, target) {
        (Some(channel), Some(target)) => (format!(" Channel: {channel}. Target: {target}."), true),
        _ => (String::new(), false),
    };

    let job = |name: &str, time: &str, template: &str| -> Result<NewJob, SchedulingError> {
        Ok(NewJob {
            name: name.to_string(),
            cron_expression: time_to_cron(time)?,
            timezone: timezone.to_string(),
            isolated_session: true,
            message: format!(
                "Read {} and follow the {template} Summary Template.{channel_part}",
                skill_path.display()
            ),
            deliver_directly,
        })
    };

    Ok([
        job(MORNING_JOB_NAME, config.morning_time(), "Morning")?,
        job(EVENING_JOB_NAME, config.evening_time(), "Evening")?,
    ])
}
