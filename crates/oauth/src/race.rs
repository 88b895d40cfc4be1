//! First-wins capture of the authorization code.
//!
//! Three producers compete to settle one attempt: the loopback listener
//! ([`CallbackServer`]), lines pasted into the terminal, and a deadline.
//! Each producer writes through the same [`Settle`] guard into a oneshot;
//! the first write wins and later ones are dropped. Once the oneshot fires
//! every producer is torn down before [`ArmedRace::run`] returns.

use std::{
    io,
    net::SocketAddr,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use {
    futures::{Stream, StreamExt},
    tokio::sync::oneshot,
    tracing::{debug, info},
};

use crate::{
    authorize::{CALLBACK_PATH, CALLBACK_PORT},
    callback_server::CallbackServer,
    manual_input::{LineOutcome, REPROMPT, classify_line},
    types::CallbackOutcome,
};

/// How long a human has to complete consent.
pub const CALLBACK_TIMEOUT: Duration = Duration::from_secs(300);

/// Provider error reported when a callback arrives without `code` or `error`.
pub const MISSING_CODE: &str = "missing authorization code in callback";

#[derive(Debug, Clone)]
pub struct RaceConfig {
    /// Loopback port; `0` picks an ephemeral one.
    pub port: u16,
    pub path: String,
    pub timeout: Duration,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            port: CALLBACK_PORT,
            path: CALLBACK_PATH.to_string(),
            timeout: CALLBACK_TIMEOUT,
        }
    }
}

/// Take-once guard in front of the result channel.
pub(crate) struct Settle {
    tx: Mutex<Option<oneshot::Sender<CallbackOutcome>>>,
}

impl Settle {
    fn new(tx: oneshot::Sender<CallbackOutcome>) -> Self {
        Self {
            tx: Mutex::new(Some(tx)),
        }
    }

    /// Deliver `outcome` if nothing has settled yet. Returns whether this call won.
    pub(crate) fn settle(&self, outcome: CallbackOutcome) -> bool {
        let sender = self
            .tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match sender {
            Some(tx) => tx.send(outcome).is_ok(),
            None => {
                debug!("race already settled, dropping later result");
                false
            },
        }
    }
}

/// A race that has not bound anything yet.
#[derive(Debug, Clone, Default)]
pub struct CallbackRace {
    config: RaceConfig,
}

impl CallbackRace {
    pub fn new(config: RaceConfig) -> Self {
        Self { config }
    }

    /// Bind the automatic channel. Bind failure is not an error: the race
    /// continues with manual input only.
    pub async fn arm(self) -> ArmedRace {
        let (tx, rx) = oneshot::channel();
        let settle = Arc::new(Settle::new(tx));
        let server =
            CallbackServer::start(self.config.port, &self.config.path, Arc::clone(&settle)).await;
        ArmedRace {
            config: self.config,
            settle,
            rx,
            server,
        }
    }
}

/// A race whose listener (if any) is accepting callbacks.
pub struct ArmedRace {
    config: RaceConfig,
    settle: Arc<Settle>,
    rx: oneshot::Receiver<CallbackOutcome>,
    server: Option<CallbackServer>,
}

impl ArmedRace {
    /// Address of the callback listener, or `None` when the port was taken.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.as_ref().map(CallbackServer::local_addr)
    }

    /// Wait for the first terminal event from the listener, `lines`, or the
    /// deadline.
    ///
    /// `reprompt` is called when a pasted line carries no code. The listener,
    /// the line stream and the timer are all released before this returns,
    /// whichever of them won.
    pub async fn run<L, P>(self, mut lines: L, mut reprompt: P) -> CallbackOutcome
    where
        L: Stream<Item = io::Result<String>> + Unpin,
        P: FnMut(&str),
    {
        let Self {
            config,
            settle,
            mut rx,
            server,
        } = self;

        let deadline = tokio::time::sleep(config.timeout);
        tokio::pin!(deadline);
        let mut lines_open = true;

        let outcome = loop {
            tokio::select! {
                biased;
                received = &mut rx => {
                    break received.unwrap_or_else(|_| {
                        CallbackOutcome::ChannelError("callback result channel closed".into())
                    });
                },
                () = &mut deadline => {
                    settle.settle(CallbackOutcome::Timeout);
                },
                line = lines.next(), if lines_open => match line {
                    Some(Ok(line)) => match classify_line(&line) {
                        LineOutcome::Terminal(outcome) => {
                            settle.settle(outcome);
                        },
                        LineOutcome::Unrecognized => reprompt(REPROMPT),
                        LineOutcome::Ignored => {},
                    },
                    Some(Err(e)) => {
                        settle.settle(CallbackOutcome::ChannelError(format!(
                            "failed to read input: {e}"
                        )));
                    },
                    None => {
                        debug!("manual input closed, waiting on the callback listener");
                        lines_open = false;
                    },
                },
            }
        };

        if let Some(server) = server {
            server.close().await;
        }
        drop(lines);

        match &outcome {
            CallbackOutcome::Code(_) => info!("authorization code received"),
            other => info!(outcome = ?other, "authorization attempt ended without a code"),
        }
        outcome
    }
}
