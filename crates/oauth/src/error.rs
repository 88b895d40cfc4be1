use std::time::Duration;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures of an authorization attempt or a token request.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Could not reach the token endpoint (DNS, connect, TLS, body read).
    #[error("could not reach the Oura token endpoint: {0}")]
    Transport(#[source] reqwest::Error),

    /// The token endpoint answered with a non-2xx status.
    #[error("token request failed ({status}): {body}")]
    TokenEndpoint { status: u16, body: String },

    /// 2xx response whose body is not a usable token object.
    #[error("failed to parse token response: {body}")]
    MalformedResponse { body: String },

    /// Consent was denied or the provider redirected back with an error.
    #[error("Oura authorization failed: {0}")]
    ProviderAuth(String),

    #[error(
        "timed out after {}s waiting for authorization; start the login again",
        .0.as_secs()
    )]
    Timeout(Duration),

    /// Local I/O failure while capturing the callback.
    #[error("callback capture failed: {0}")]
    Channel(String),

    /// Tokens were obtained but could not be stored.
    #[error("failed to store tokens: {0}")]
    Persist(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_detail() {
        let err = Error::TokenEndpoint {
            status: 400,
            body: r#"{"error":"invalid_grant"}"#.into(),
        };
        assert_eq!(
            err.to_string(),
            r#"token request failed (400): {"error":"invalid_grant"}"#
        );

        let err = Error::Timeout(Duration::from_secs(300));
        assert!(err.to_string().contains("300s"));
    }
}
