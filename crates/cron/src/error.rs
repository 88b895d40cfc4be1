/// Failures talking to the external job runner or validating schedule input.
#[derive(Debug, thiserror::Error)]
pub enum SchedulingError {
    /// The job was already gone. Reconciliation treats this as success.
    #[error("scheduled job not found: {0}")]
    NotFound(String),

    #[error("failed to run `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` failed: {stderr}")]
    Command { command: String, stderr: String },

    #[error("unexpected job list output: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid time '{0}': expected HH:MM")]
    InvalidTime(String),

    #[error("unknown timezone '{0}'")]
    InvalidTimezone(String),
}
