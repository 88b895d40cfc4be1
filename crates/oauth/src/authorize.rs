//! Provider endpoints and the authorize URL.
//!
//! The loopback port and callback path live here and nowhere else: the
//! redirect URI sent to the provider and the listener bound by
//! [`CallbackRace`](crate::race::CallbackRace) are both derived from them.

use url::form_urlencoded;

use crate::types::AuthorizationRequest;

pub const AUTHORIZE_URL: &str = "https://cloud.ouraring.com/oauth/authorize";
pub const TOKEN_URL: &str = "https://api.ouraring.com/oauth/token";

/// Loopback port the callback listener binds.
pub const CALLBACK_PORT: u16 = 9876;
pub const CALLBACK_PATH: &str = "/callback";

/// Scopes requested on every authorization (v2 API).
pub const SCOPES: &[&str] = &[
    "email",
    "personal",
    "daily",
    "heartrate",
    "workout",
    "session",
    "spo2",
    "tag",
    "stress",
    "heart_health",
    "ring_configuration",
];

pub fn redirect_uri() -> String {
    format!("http://localhost:{CALLBACK_PORT}{CALLBACK_PATH}")
}

/// Authorize URL for `client_id` with the fixed scopes and redirect URI.
pub fn build_authorize_url(client_id: &str) -> String {
    AuthorizationRequest::new(client_id).authorize_url()
}

pub(crate) fn authorize_url_for(req: &AuthorizationRequest) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("response_type", "code")
        .append_pair("client_id", &req.client_id)
        .append_pair("redirect_uri", &req.redirect_uri)
        .append_pair("scope", &req.scopes.join(" "))
        .finish();
    format!("{AUTHORIZE_URL}?{query}")
}
