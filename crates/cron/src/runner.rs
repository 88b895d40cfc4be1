use {async_trait::async_trait, serde::Deserialize, tokio::process::Command, tracing::debug};

use crate::{
    error::SchedulingError,
    types::{CronJobRef, NewJob},
};

/// The external scheduler that actually runs jobs.
#[async_trait]
pub trait JobRunner: Send + Sync {
    async fn list_jobs(&self) -> Result<Vec<CronJobRef>, SchedulingError>;

    /// Remove a job. Must fail with [`SchedulingError::NotFound`] when `id`
    /// does not exist.
    async fn remove_job(&self, id: &str) -> Result<(), SchedulingError>;

    async fn create_job(&self, job: &NewJob) -> Result<(), SchedulingError>;
}

/// Drives the scheduler through the `openclaw cron` CLI.
#[derive(Debug, Clone)]
pub struct OpenclawCli {
    program: String,
}

impl Default for OpenclawCli {
    fn default() -> Self {
        Self::new("openclaw")
    }
}

impl OpenclawCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    async fn run(&self, args: &[&str]) -> Result<String, SchedulingError> {
        debug!(program = %self.program, ?args, "running job runner");
        let output = Command::new(&self.program)
            .args(args)
            .output()
            .await
            .map_err(|source| SchedulingError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).trim().to_string());
        }
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        Err(SchedulingError::Command {
            command: format!("{} {}", self.program, args.join(" ")),
            stderr,
        })
    }
}

/// `cron list --json` prints either a bare array or `{ "jobs": [...] }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum JobList {
    Bare(Vec<CronJobRef>),
    Wrapped {
        #[serde(default)]
        jobs: Vec<CronJobRef>,
    },
}

fn parse_job_list(output: &str) -> Result<Vec<CronJobRef>, SchedulingError> {
    if output.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(match serde_json::from_str(output)? {
        JobList::Bare(jobs) | JobList::Wrapped { jobs } => jobs,
    })
}

fn is_not_found(stderr: &str) -> bool {
    let stderr = stderr.to_ascii_lowercase();
    stderr.contains("not found") || stderr.contains("no such job")
}

fn add_args(job: &NewJob) -> Vec<&str> {
    let mut args = vec![
        "cron",
        "add",
        "--name",
        &job.name,
        "--cron",
        &job.cron_expression,
        "--tz",
        &job.timezone,
    ];
    if job.isolated_session {
        args.extend(["--session", "isolated"]);
    }
    args.extend(["--message", &job.message]);
    if job.deliver_directly {
        args.push("--no-deliver");
    }
    args
}

#[async_trait]
impl JobRunner for OpenclawCli {
    async fn list_jobs(&self) -> Result<Vec<CronJobRef>, SchedulingError> {
        let output = self.run(&["cron", "list", "--json"]).await?;
        parse_job_list(&output)
    }

    async fn remove_job(&self, id: &str) -> Result<(), SchedulingError> {
        match self.run(&["cron", "remove", id]).await {
            Err(SchedulingError::Command { stderr, .. }) if is_not_found(&stderr) => {
                Err(SchedulingError::NotFound(id.to_string()))
            },
            other => other.map(|_| ()),
        }
    }

    async fn create_job(&self, job: &NewJob) -> Result<(), SchedulingError> {
        self.run(&add_args(job)).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_job_list_shapes() {
        let bare = r#"[{"id":"1","name":"OuraClaw Morning Summary"},{"id":"2"}]"#;
        let jobs = parse_job_list(bare).unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[1].name, "");

        let wrapped = r#"{"jobs":[{"id":"9","name":"x","schedule":"0 7 * * *"}]}"#;
        assert_eq!(parse_job_list(wrapped).unwrap(), vec![CronJobRef {
            id: "9".into(),
            name: "x".into(),
        }]);

        assert!(parse_job_list("{}").unwrap().is_empty());
        assert!(parse_job_list("").unwrap().is_empty());
        assert!(parse_job_list("not json").is_err());
    }

    #[test]
    fn test_add_args() {
        let job = NewJob {
            name: "OuraClaw Morning Summary".into(),
            cron_expression: "0 7 * * *".into(),
            timezone: "UTC".into(),
            isolated_session: true,
            message: "Read x".into(),
            deliver_directly: true,
        };
        assert_eq!(add_args(&job), vec![
            "cron",
            "add",
            "--name",
            "OuraClaw Morning Summary",
            "--cron",
            "0 7 * * *",
            "--tz",
            "UTC",
            "--session",
            "isolated",
            "--message",
            "Read x",
            "--no-deliver",
        ]);

        let job = NewJob {
            deliver_directly: false,
            ..job
        };
        assert!(!add_args(&job).contains(&"--no-deliver"));
    }

    #[test]
    fn test_not_found_detection() {
        assert!(is_not_found("Error: Job abc not found"));
        assert!(is_not_found("no such job: abc"));
        assert!(!is_not_found("permission denied"));
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let runner = OpenclawCli::new("ouraclaw-test-no-such-binary");
        assert!(matches!(
            runner.list_jobs().await,
            Err(SchedulingError::Spawn { .. })
        ));
    }
}
