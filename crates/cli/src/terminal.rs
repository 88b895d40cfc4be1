//! Interactive terminal plumbing shared by the commands.

use std::{
    io::{self, BufRead, Write},
    time::{SystemTime, UNIX_EPOCH},
};

use {
    anyhow::Context,
    async_trait::async_trait,
    ouraclaw_config::ConfigStore,
    ouraclaw_oauth::{FlowHost, TokenResponse},
    tokio::sync::mpsc,
    tokio_stream::{StreamExt, wrappers::ReceiverStream},
};

pub type Lines = ReceiverStream<io::Result<String>>;

/// Lines typed on stdin.
///
/// Read on a plain thread so a pending read never holds up runtime shutdown;
/// once the stream is dropped the thread exits after its next line.
pub fn stdin_lines() -> Lines {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    ReceiverStream::new(rx)
}

/// Print `question` and wait for a non-empty answer.
pub async fn prompt(lines: &mut Lines, question: &str) -> anyhow::Result<String> {
    loop {
        print!("{question}");
        io::stdout().flush()?;
        let line = lines
            .next()
            .await
            .context("input closed before an answer was given")??;
        let answer = line.trim();
        if !answer.is_empty() {
            return Ok(answer.to_string());
        }
    }
}

pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Human-readable lifetime of a token expiring at `expires_at`.
pub fn describe_expiry(expires_at: Option<u64>, now: u64) -> String {
    match expires_at {
        Some(ts) if ts > now => {
            let remaining = ts - now;
            let hours = remaining / 3600;
            let mins = (remaining % 3600) / 60;
            format!("valid ({hours}h {mins}m remaining)")
        },
        Some(_) => "expired".to_string(),
        None => "unknown".to_string(),
    }
}

/// Terminal front-end for the authorization flow; tokens go to the config store.
pub struct TerminalHost<'a> {
    pub store: &'a ConfigStore,
}

#[async_trait]
impl FlowHost for TerminalHost<'_> {
    fn present_url(&self, url: &str) {
        println!("\nOpen this URL to authorize OuraClaw:\n\n  {url}\n");
        if open::that_detached(url).is_err() {
            println!("Could not open a browser; copy the URL above into one.");
        }
        print!(
            "Waiting for the redirect. If it does not arrive, paste the redirect URL or the code here: "
        );
        let _ = io::stdout().flush();
    }

    fn reprompt(&self, message: &str) {
        print!("{message}");
        let _ = io::stdout().flush();
    }

    async fn persist_tokens(&self, tokens: &TokenResponse) -> anyhow::Result<()> {
        let access = tokens
            .access_token
            .as_deref()
            .context("token response has no access_token")?;
        let expires_at = tokens.expires_at(unix_now());
        self.store
            .update(|c| c.set_tokens(access, tokens.refresh_token.as_deref(), expires_at))?;
        Ok(())
    }
}
