use std::path::PathBuf;

use {
    anyhow::Result,
    clap::Subcommand,
    ouraclaw_config::{ConfigStore, OuraConfig, config_dir},
    ouraclaw_cron::{OpenclawCli, install_jobs, remove_jobs, validate_schedule},
};

#[derive(Subcommand)]
pub enum ScheduleAction {
    /// Create (or recreate) the morning and evening summary jobs.
    Setup {
        /// Morning summary time, HH:MM.
        #[arg(long)]
        morning: Option<String>,
        /// Evening summary time, HH:MM.
        #[arg(long)]
        evening: Option<String>,
        /// IANA timezone, e.g. Europe/Helsinki.
        #[arg(long)]
        timezone: Option<String>,
        /// Messaging channel to deliver to ("default" uses announce delivery).
        #[arg(long)]
        channel: Option<String>,
        /// Recipient on that channel.
        #[arg(long)]
        target: Option<String>,
        /// Path to the Oura SKILL.md the agent follows.
        #[arg(long)]
        skill_path: Option<PathBuf>,
        /// Job runner executable.
        #[arg(long, default_value = "openclaw")]
        runner: String,
    },
    /// Remove the summary jobs.
    Remove {
        #[arg(long, default_value = "openclaw")]
        runner: String,
    },
}

/// Schedule fields given on the command line; `None` keeps the stored value.
#[derive(Debug, Default)]
struct ScheduleFlags {
    morning: Option<String>,
    evening: Option<String>,
    timezone: Option<String>,
    channel: Option<String>,
    target: Option<String>,
}

impl ScheduleFlags {
    fn apply(&self, config: &mut OuraConfig) {
        let set = |field: &mut Option<String>, value: &Option<String>| {
            if value.is_some() {
                field.clone_from(value);
            }
        };
        set(&mut config.morning_time, &self.morning);
        set(&mut config.evening_time, &self.evening);
        set(&mut config.timezone, &self.timezone);
        set(&mut config.preferred_channel, &self.channel);
        set(&mut config.preferred_channel_target, &self.target);
    }
}

/// Merge `flags` into the stored config, refusing to write a schedule the
/// scheduler would reject.
fn save_schedule(store: &ConfigStore, flags: &ScheduleFlags) -> Result<OuraConfig> {
    let mut candidate = store.load()?;
    flags.apply(&mut candidate);
    validate_schedule(&candidate)?;
    store.update(|c| flags.apply(c))
}

pub async fn handle_schedule(action: ScheduleAction) -> Result<()> {
    let store = ConfigStore::new()?;
    match action {
        ScheduleAction::Setup {
            morning,
            evening,
            timezone,
            channel,
            target,
            skill_path,
            runner,
        } => {
            let config = save_schedule(&store, &ScheduleFlags {
                morning,
                evening,
                timezone,
                channel,
                target,
            })?;
            let skill_path = match skill_path {
                Some(path) => path,
                None => config_dir()?.join("skills").join("oura").join("SKILL.md"),
            };

            let installed = install_jobs(&OpenclawCli::new(runner), &config, &skill_path).await?;
            store.update(|c| {
                c.morning_cron_job_id = installed.morning_id.clone();
                c.evening_cron_job_id = installed.evening_id.clone();
            })?;

            println!(
                "Scheduled morning summary at {} and evening summary at {} ({}).",
                config.morning_time(),
                config.evening_time(),
                config.timezone()
            );
            Ok(())
        },
        ScheduleAction::Remove { runner } => {
            let config = store.load()?;
            remove_jobs(&OpenclawCli::new(runner), &config).await?;
            store.update(|c| {
                c.morning_cron_job_id = None;
                c.evening_cron_job_id = None;
            })?;
            println!("Summary jobs removed.");
            Ok(())
        },
    }
}
