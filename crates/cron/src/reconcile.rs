use std::{collections::BTreeSet, path::Path};

use {
    ouraclaw_config::OuraConfig,
    tracing::{debug, info},
};

use crate::{
    error::SchedulingError,
    runner::JobRunner,
    schedule::summary_jobs,
    types::{CronJobRef, EVENING_JOB_NAME, MORNING_JOB_NAME},
};

/// Ids of the jobs created by [`install_jobs`], to be stored in the config.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstalledJobs {
    pub morning_id: Option<String>,
    pub evening_id: Option<String>,
}

/// Replace any existing OuraClaw jobs with fresh morning and evening jobs.
///
/// Safe to run repeatedly: old jobs are found by stored id and by name and
/// removed before the new ones are created.
pub async fn install_jobs(
    runner: &dyn JobRunner,
    config: &OuraConfig,
    skill_path: &Path,
) -> Result<InstalledJobs, SchedulingError> {
    // Validate before touching the scheduler.
    let jobs = summary_jobs(config, skill_path)?;

    remove_existing(runner, config).await?;

    for job in &jobs {
        runner.create_job(job).await?;
        info!(name = %job.name, cron = %job.cron_expression, tz = %job.timezone, "scheduled job created");
    }

    let fresh = runner.list_jobs().await?;
    let id_of = |name: &str| fresh.iter().find(|j| j.name == name).map(|j| j.id.clone());
    Ok(InstalledJobs {
        morning_id: id_of(MORNING_JOB_NAME),
        evening_id: id_of(EVENING_JOB_NAME),
    })
}

/// Remove every OuraClaw job. The caller clears the stored ids afterwards.
pub async fn remove_jobs(runner: &dyn JobRunner, config: &OuraConfig) -> Result<(), SchedulingError> {
    remove_existing(runner, config).await
}

async fn remove_existing(runner: &dyn JobRunner, config: &OuraConfig) -> Result<(), SchedulingError> {
    let existing = runner.list_jobs().await?;
    for id in removal_set(config, &existing) {
        match runner.remove_job(&id).await {
            Ok(()) => info!(job_id = %id, "removed scheduled job"),
            Err(SchedulingError::NotFound(_)) => debug!(job_id = %id, "scheduled job already gone"),
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Stored ids plus the ids of jobs carrying a known OuraClaw name.
fn removal_set(config: &OuraConfig, existing: &[CronJobRef]) -> BTreeSet<String> {
    config
        .morning_cron_job_id
        .iter()
        .chain(config.evening_cron_job_id.iter())
        .filter(|id| !id.is_empty())
        .cloned()
        .chain(
            existing
                .iter()
                .filter(|job| job.is_ouraclaw_job())
                .map(|job| job.id.clone()),
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::types::NewJob,
        async_trait::async_trait,
        std::sync::Mutex,
    };

    #[derive(Default)]
    struct FakeRunner {
        jobs: Mutex<Vec<CronJobRef>>,
        next_id: Mutex<u32>,
        removed: Mutex<Vec<String>>,
        fail_remove_with: Option<&'static str>,
    }

    impl FakeRunner {
        fn with_jobs(jobs: &[(&str, &str)]) -> Self {
            let runner = Self::default();
            *runner.jobs.lock().unwrap() = jobs
                .iter()
                .map(|(id, name)| CronJobRef {
                    id: (*id).into(),
                    name: (*name).into(),
                })
                .collect();
            runner
        }

        fn names(&self) -> Vec<String> {
            let mut names: Vec<String> = self
                .jobs
                .lock()
                .unwrap()
                .iter()
                .map(|j| j.name.clone())
                .collect();
            names.sort();
            names
        }
    }

    #[async_trait]
    impl JobRunner for FakeRunner {
        async fn list_jobs(&self) -> Result<Vec<CronJobRef>, SchedulingError> {
            Ok(self.jobs.lock().unwrap().clone())
        }

        async fn remove_job(&self, id: &str) -> Result<(), SchedulingError> {
            if let Some(stderr) = self.fail_remove_with {
                return Err(SchedulingError::Command {
                    command: format!("openclaw cron remove {id}"),
                    stderr: stderr.into(),
                });
            }
            self.removed.lock().unwrap().push(id.to_string());
            let mut jobs = self.jobs.lock().unwrap();
            let before = jobs.len();
            jobs.retain(|j| j.id != id);
            if jobs.len() == before {
                return Err(SchedulingError::NotFound(id.to_string()));
            }
            Ok(())
        }

        async fn create_job(&self, job: &NewJob) -> Result<(), SchedulingError> {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            self.jobs.lock().unwrap().push(CronJobRef {
                id: format!("new-{next}"),
                name: job.name.clone(),
            });
            Ok(())
        }
    }

    fn skill() -> &'static Path {
        Path::new("/plugins/ouraclaw/skills/oura/SKILL.md")
    }

    #[tokio::test]
    async fn test_install_twice_leaves_exactly_two_jobs() {
        let runner = FakeRunner::with_jobs(&[("other", "Daily Standup")]);
        let mut config = OuraConfig::default();

        let first = install_jobs(&runner, &config, skill()).await.unwrap();
        assert_eq!(first.morning_id.as_deref(), Some("new-1"));
        assert_eq!(first.evening_id.as_deref(), Some("new-2"));
        config.morning_cron_job_id = first.morning_id;
        config.evening_cron_job_id = first.evening_id;

        let second = install_jobs(&runner, &config, skill()).await.unwrap();
        assert_eq!(second.morning_id.as_deref(), Some("new-3"));
        assert_eq!(second.evening_id.as_deref(), Some("new-4"));

        assert_eq!(runner.names(), vec![
            "Daily Standup",
            "OuraClaw Evening Summary",
            "OuraClaw Morning Summary",
        ]);
    }

    #[tokio::test]
    async fn test_install_removes_legacy_names_and_stale_ids() {
        let runner = FakeRunner::with_jobs(&[
            ("legacy-m", "ouraclaw-morning"),
            ("legacy-e", "ouraclaw-evening"),
            ("keep", "Something Else"),
        ]);
        let config = OuraConfig {
            // Stored id whose job was deleted by hand.
            morning_cron_job_id: Some("vanished".into()),
            ..Default::default()
        };

        install_jobs(&runner, &config, skill()).await.unwrap();

        let mut removed = runner.removed.lock().unwrap().clone();
        removed.sort();
        assert_eq!(removed, vec!["legacy-e", "legacy-m", "vanished"]);
        assert_eq!(runner.names(), vec![
            "OuraClaw Evening Summary",
            "OuraClaw Morning Summary",
            "Something Else",
        ]);
    }

    #[tokio::test]
    async fn test_remove_missing_id_does_not_fail() {
        let runner = FakeRunner::default();
        let config = OuraConfig {
            morning_cron_job_id: Some("gone-1".into()),
            evening_cron_job_id: Some("gone-2".into()),
            ..Default::default()
        };
        remove_jobs(&runner, &config).await.unwrap();
        assert_eq!(runner.removed.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_other_remove_failures_propagate() {
        let mut runner = FakeRunner::with_jobs(&[("m", MORNING_JOB_NAME)]);
        runner.fail_remove_with = Some("permission denied");

        let err = remove_jobs(&runner, &OuraConfig::default()).await.unwrap_err();
        assert!(matches!(err, SchedulingError::Command { ref stderr, .. } if stderr == "permission denied"));
    }

    #[tokio::test]
    async fn test_invalid_schedule_leaves_jobs_untouched() {
        let runner = FakeRunner::with_jobs(&[("m", MORNING_JOB_NAME)]);
        let config = OuraConfig {
            morning_time: Some("25:00".into()),
            ..Default::default()
        };

        let err = install_jobs(&runner, &config, skill()).await.unwrap_err();
        assert!(matches!(err, SchedulingError::InvalidTime(_)));
        assert!(runner.removed.lock().unwrap().is_empty());
    }

    #[test]
    fn test_removal_set_dedupes_ids() {
        let config = OuraConfig {
            morning_cron_job_id: Some("a".into()),
            evening_cron_job_id: Some(String::new()),
            ..Default::default()
        };
        let existing = vec![
            CronJobRef {
                id: "a".into(),
                name: MORNING_JOB_NAME.into(),
            },
            CronJobRef {
                id: "b".into(),
                name: "unrelated".into(),
            },
        ];
        let ids: Vec<String> = removal_set(&config, &existing).into_iter().collect();
        assert_eq!(ids, vec!["a"]);
    }
}
