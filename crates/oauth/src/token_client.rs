use tracing::debug;

use crate::{
    authorize::{TOKEN_URL, redirect_uri},
    error::{Error, Result},
    types::TokenResponse,
};

/// Client for the provider token endpoint. Holds no token state; every call
/// is an independent form-encoded POST with no retries.
#[derive(Debug, Clone)]
pub struct TokenClient {
    http: reqwest::Client,
    token_url: String,
}

impl Default for TokenClient {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenClient {
    pub fn new() -> Self {
        Self::with_token_url(TOKEN_URL)
    }

    /// Point the client at a different token endpoint.
    pub fn with_token_url(token_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            token_url: token_url.into(),
        }
    }

    /// Exchange an authorization code (`authorization_code` grant).
    pub async fn exchange_code_for_tokens(
        &self,
        client_id: &str,
        client_secret: &str,
        code: &str,
    ) -> Result<TokenResponse> {
        self.exchange_code(client_id, client_secret, code)
            .await
            .map(|(tokens, _)| tokens)
    }

    /// Like [`exchange_code_for_tokens`](Self::exchange_code_for_tokens), but
    /// also hands back the response body exactly as the provider sent it.
    pub(crate) async fn exchange_code(
        &self,
        client_id: &str,
        client_secret: &str,
        code: &str,
    ) -> Result<(TokenResponse, String)> {
        let redirect = redirect_uri();
        self.post_token_request(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("redirect_uri", &redirect),
        ])
        .await
    }

    /// Obtain a new access token (`refresh_token` grant).
    pub async fn refresh_access_token(
        &self,
        client_id: &str,
        client_secret: &str,
        refresh_token: &str,
    ) -> Result<TokenResponse> {
        self.post_token_request(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", client_id),
            ("client_secret", client_secret),
        ])
        .await
        .map(|(tokens, _)| tokens)
    }

    async fn post_token_request(&self, form: &[(&str, &str)]) -> Result<(TokenResponse, String)> {
        let grant = form
            .iter()
            .find(|(k, _)| *k == "grant_type")
            .map(|(_, v)| *v)
            .unwrap_or_default();
        debug!(%grant, url = %self.token_url, "posting token request");

        // `form` sets `Content-Type: application/x-www-form-urlencoded`.
        let resp = self
            .http
            .post(&self.token_url)
            .form(form)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        let body = resp.text().await.map_err(Error::Transport)?;

        if !status.is_success() {
            return Err(Error::TokenEndpoint {
                status: status.as_u16(),
                body,
            });
        }

        match serde_json::from_str(&body) {
            Ok(tokens) => Ok((tokens, body)),
            Err(_) => Err(Error::MalformedResponse { body }),
        }
    }
}
