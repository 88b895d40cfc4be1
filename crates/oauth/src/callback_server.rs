//! Automatic channel: a transient loopback HTTP listener that captures the
//! provider redirect.

use std::{
    collections::HashMap,
    net::{Ipv4Addr, Ipv6Addr, SocketAddr},
    sync::Arc,
    time::Duration,
};

use {
    axum::{
        Router,
        extract::{Query, State},
        http::StatusCode,
        response::{Html, IntoResponse, Response},
        routing::any,
    },
    futures::future::join_all,
    tokio::{net::TcpListener, sync::watch, task::JoinHandle},
    tracing::{debug, info, warn},
};

use crate::{
    manual_input::outcome_from_params,
    race::{MISSING_CODE, Settle},
    types::CallbackOutcome,
};

/// How long an in-flight browser response may take to finish after the race settles.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

const SUCCESS_PAGE: &str = "<html><body><h2>OuraClaw authorized!</h2>\
<p>You can close this tab and return to the terminal.</p></body></html>";

/// A running callback listener. Dropping it without [`close`](Self::close)
/// aborts the server tasks.
pub struct CallbackServer {
    addr: SocketAddr,
    ipv6_addr: Option<SocketAddr>,
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl CallbackServer {
    /// Bind `127.0.0.1:port` and start serving `path`. `[::1]` on the same
    /// port is served too when it can be bound, since the redirect URI names
    /// `localhost`.
    ///
    /// Returns `None` when the IPv4 port cannot be bound; the race then relies
    /// on manual input alone.
    pub(crate) async fn start(port: u16, path: &str, settle: Arc<Settle>) -> Option<Self> {
        let listener = match TcpListener::bind((Ipv4Addr::LOCALHOST, port)).await {
            Ok(listener) => listener,
            Err(e) => {
                warn!(
                    port,
                    error = %e,
                    "callback port unavailable, automatic capture disabled; paste the redirect URL instead"
                );
                return None;
            },
        };
        let addr = match listener.local_addr() {
            Ok(addr) => addr,
            Err(e) => {
                warn!(port, error = %e, "callback listener has no local address, automatic capture disabled");
                return None;
            },
        };

        // Same port as the IPv4 socket, which matters when `port` was 0.
        let ipv6_listener = match TcpListener::bind((Ipv6Addr::LOCALHOST, addr.port())).await {
            Ok(listener) => Some(listener),
            Err(e) => {
                debug!(port = addr.port(), error = %e, "IPv6 loopback not bound, serving IPv4 only");
                None
            },
        };
        let ipv6_addr = ipv6_listener
            .as_ref()
            .and_then(|listener| listener.local_addr().ok());

        let app = Router::new()
            .route(path, any(handle_callback))
            .fallback(not_found)
            .with_state(Arc::clone(&settle));

        let (shutdown, _) = watch::channel(false);
        let tasks = std::iter::once(listener)
            .chain(ipv6_listener)
            .map(|listener| {
                let app = app.clone();
                let settle = Arc::clone(&settle);
                let mut stop = shutdown.subscribe();
                tokio::spawn(async move {
                    let served = axum::serve(listener, app)
                        .with_graceful_shutdown(async move {
                            let _ = stop.wait_for(|stop| *stop).await;
                        })
                        .await;
                    if let Err(e) = served {
                        settle.settle(CallbackOutcome::ChannelError(format!(
                            "callback listener failed: {e}"
                        )));
                    }
                })
            })
            .collect();

        info!(%addr, ipv6 = ipv6_addr.is_some(), "listening for OAuth callback");
        Some(Self {
            addr,
            ipv6_addr,
            shutdown,
            tasks,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    pub(crate) fn ipv6_addr(&self) -> Option<SocketAddr> {
        self.ipv6_addr
    }

    /// Stop accepting, let an in-flight response finish, then release the sockets.
    pub(crate) async fn close(mut self) {
        self.shutdown.send_replace(true);
        if tokio::time::timeout(SHUTDOWN_GRACE, join_all(self.tasks.iter_mut()))
            .await
            .is_err()
        {
            for task in &self.tasks {
                task.abort();
            }
        }
        debug!(addr = %self.addr, "callback listener closed");
    }
}

impl Drop for CallbackServer {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

async fn handle_callback(
    State(settle): State<Arc<Settle>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let error = params.get("error").map(String::as_str);
    let code = params.get("code").map(String::as_str);

    match outcome_from_params(error, code) {
        Some(CallbackOutcome::Code(code)) => {
            info!("OAuth callback received automatically");
            settle.settle(CallbackOutcome::Code(code));
            Html(SUCCESS_PAGE).into_response()
        },
        Some(CallbackOutcome::ProviderError(error)) => {
            let body = format!("Authorization error: {error}");
            settle.settle(CallbackOutcome::ProviderError(error));
            (StatusCode::BAD_REQUEST, body).into_response()
        },
        _ => {
            settle.settle(CallbackOutcome::ProviderError(MISSING_CODE.to_string()));
            (StatusCode::BAD_REQUEST, "Missing authorization code").into_response()
        },
    }
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not found")
}
