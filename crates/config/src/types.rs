use std::fmt;

use {
    secrecy::{ExposeSecret, SecretString},
    serde::{Deserialize, Serialize, Serializer},
};

pub const DEFAULT_MORNING_TIME: &str = "07:00";
pub const DEFAULT_EVENING_TIME: &str = "21:00";
pub const DEFAULT_TIMEZONE: &str = "UTC";

/// Everything OuraClaw keeps between runs.
#[derive(Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OuraConfig {
    // ── OAuth ────────────────────────────────────────────────────────────────
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(
        serialize_with = "serialize_option_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub client_secret: Option<SecretString>,
    #[serde(
        serialize_with = "serialize_option_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub access_token: Option<SecretString>,
    #[serde(
        serialize_with = "serialize_option_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub refresh_token: Option<SecretString>,
    /// Unix timestamp (seconds) when the access token expires.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_expires_at: Option<u64>,

    // ── Scheduled summaries ──────────────────────────────────────────────────
    /// Local time of the morning summary, `HH:MM`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub morning_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evening_time: Option<String>,
    /// IANA timezone the summary times are expressed in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    /// Messaging channel to deliver to; `default` means the runner's own delivery.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_channel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_channel_target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub morning_cron_job_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evening_cron_job_id: Option<String>,
}

impl OuraConfig {
    pub fn client_secret(&self) -> Option<&str> {
        self.client_secret.as_ref().map(|s| s.expose_secret().as_str())
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_ref().map(|s| s.expose_secret().as_str())
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_ref().map(|s| s.expose_secret().as_str())
    }

    /// Client id and secret, when both are configured.
    pub fn client_credentials(&self) -> Option<(&str, &str)> {
        match (self.client_id.as_deref(), self.client_secret()) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => Some((id, secret)),
            _ => None,
        }
    }

    pub fn morning_time(&self) -> &str {
        self.morning_time.as_deref().unwrap_or(DEFAULT_MORNING_TIME)
    }

    pub fn evening_time(&self) -> &str {
        self.evening_time.as_deref().unwrap_or(DEFAULT_EVENING_TIME)
    }

    pub fn timezone(&self) -> &str {
        self.timezone
            .as_deref()
            .filter(|tz| !tz.is_empty())
            .unwrap_or(DEFAULT_TIMEZONE)
    }

    /// Store new tokens. A missing refresh token keeps the previous one.
    pub fn set_tokens(
        &mut self,
        access_token: &str,
        refresh_token: Option<&str>,
        expires_at: Option<u64>,
    ) {
        self.access_token = Some(SecretString::new(access_token.to_string()));
        if let Some(refresh) = refresh_token {
            self.refresh_token = Some(SecretString::new(refresh.to_string()));
        }
        self.token_expires_at = expires_at;
    }

    pub fn clear_tokens(&mut self) {
        self.access_token = None;
        self.refresh_token = None;
        self.token_expires_at = None;
    }
}

impl fmt::Debug for OuraConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redacted = |s: &Option<SecretString>| s.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("OuraConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &redacted(&self.client_secret))
            .field("access_token", &redacted(&self.access_token))
            .field("refresh_token", &redacted(&self.refresh_token))
            .field("token_expires_at", &self.token_expires_at)
            .field("morning_time", &self.morning_time)
            .field("evening_time", &self.evening_time)
            .field("timezone", &self.timezone)
            .field("preferred_channel", &self.preferred_channel)
            .field("preferred_channel_target", &self.preferred_channel_target)
            .field("morning_cron_job_id", &self.morning_cron_job_id)
            .field("evening_cron_job_id", &self.evening_cron_job_id)
            .finish()
    }
}

/// Serialize an optional secret as its plain value. Only used for the config file.
pub fn serialize_option_secret<S: Serializer>(
    secret: &Option<SecretString>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(s) => serializer.serialize_some(s.expose_secret()),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OuraConfig::default();
        assert_eq!(config.morning_time(), "07:00");
        assert_eq!(config.evening_time(), "21:00");
        assert_eq!(config.timezone(), "UTC");
        assert!(config.client_credentials().is_none());
    }

    #[test]
    fn test_set_tokens_keeps_previous_refresh() {
        let mut config = OuraConfig::default();
        config.set_tokens("a1", Some("r1"), Some(100));
        config.set_tokens("a2", None, Some(200));
        assert_eq!(config.access_token(), Some("a2"));
        assert_eq!(config.refresh_token(), Some("r1"));
        assert_eq!(config.token_expires_at, Some(200));

        config.clear_tokens();
        assert!(config.access_token().is_none());
        assert!(config.refresh_token().is_none());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut config = OuraConfig {
            client_id: Some("cid".into()),
            client_secret: Some(SecretString::new("hunter2".into())),
            ..Default::default()
        };
        config.set_tokens("access-xyz", Some("refresh-xyz"), None);

        let debug = format!("{config:?}");
        assert!(debug.contains("cid"));
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("access-xyz"));
        assert!(!debug.contains("refresh-xyz"));
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = OuraConfig {
            client_id: Some("cid".into()),
            client_secret: Some(SecretString::new("secret".into())),
            timezone: Some("Europe/Helsinki".into()),
            ..Default::default()
        };
        config.set_tokens("a", Some("r"), Some(42));

        let text = toml::to_string(&config).unwrap();
        assert!(!text.contains("morning_cron_job_id"));

        let back: OuraConfig = toml::from_str(&text).unwrap();
        assert_eq!(back.client_credentials(), Some(("cid", "secret")));
        assert_eq!(back.access_token(), Some("a"));
        assert_eq!(back.refresh_token(), Some("r"));
        assert_eq!(back.token_expires_at, Some(42));
        assert_eq!(back.timezone(), "Europe/Helsinki");
    }
}
