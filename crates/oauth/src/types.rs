use serde::{Deserialize, Serialize};

use crate::authorize::{self, SCOPES};

/// One authorization attempt against the Oura provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    pub client_id: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
}

impl AuthorizationRequest {
    /// Build a request using the fixed scope list and loopback redirect URI.
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            redirect_uri: authorize::redirect_uri(),
            scopes: SCOPES.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    pub fn authorize_url(&self) -> String {
        authorize::authorize_url_for(self)
    }
}

/// Token endpoint response, kept exactly as the provider sent it.
///
/// Every field is optional: the provider contract only promises "some JSON
/// object". Callers check the fields they actually use.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Lifetime of the access token in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Any additional fields the provider returned.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl TokenResponse {
    /// Unix timestamp (seconds) at which the access token expires.
    pub fn expires_at(&self, now_secs: u64) -> Option<u64> {
        self.expires_in.map(|secs| now_secs.saturating_add(secs))
    }
}

/// Terminal result of a callback race. Exactly one is produced per attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// Authorization code delivered by the provider redirect or pasted by the user.
    Code(String),
    /// The provider redirected back with `error=…`, or without a code.
    ProviderError(String),
    /// Nobody completed consent before the deadline.
    Timeout,
    /// Local I/O failure while capturing the callback.
    ChannelError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_uses_fixed_redirect_and_scopes() {
        let req = AuthorizationRequest::new("client-1");
        assert_eq!(req.redirect_uri, "http://localhost:9876/callback");
        assert!(req.scopes.iter().any(|s| s == "daily"));
        assert_eq!(req.scopes.len(), SCOPES.len());
    }

    #[test]
    fn test_token_response_keeps_unknown_fields() {
        let body = r#"{"access_token":"a","user_id":"u-42"}"#;
        let tokens: TokenResponse = serde_json::from_str(body).unwrap();
        assert_eq!(tokens.access_token.as_deref(), Some("a"));
        assert!(tokens.refresh_token.is_none());
        assert_eq!(tokens.extra.get("user_id"), Some(&serde_json::json!("u-42")));

        let back = serde_json::to_value(&tokens).unwrap();
        assert_eq!(back, serde_json::json!({"access_token": "a", "user_id": "u-42"}));
    }

    #[test]
    fn test_expires_at() {
        let tokens = TokenResponse {
            expires_in: Some(3600),
            ..Default::default()
        };
        assert_eq!(tokens.expires_at(1_000), Some(4_600));
        assert_eq!(TokenResponse::default().expires_at(1_000), None);
    }
}
