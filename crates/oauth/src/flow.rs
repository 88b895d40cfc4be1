use std::io;

use {async_trait::async_trait, futures::Stream, tracing::info};

use crate::{
    error::{Error, Result},
    race::{CallbackRace, RaceConfig},
    token_client::TokenClient,
    types::{AuthorizationRequest, CallbackOutcome, TokenResponse},
};

/// What the authorization flow needs from whoever is driving it.
#[async_trait]
pub trait FlowHost: Send + Sync {
    /// Show the authorize URL to the user (and open a browser if possible).
    fn present_url(&self, url: &str);

    /// Ask again after a pasted line contained no code.
    fn reprompt(&self, message: &str);

    /// Store freshly obtained tokens.
    async fn persist_tokens(&self, tokens: &TokenResponse) -> anyhow::Result<()>;
}

/// Authorization-code flow: authorize URL, callback race, code exchange,
/// hand-off to the host. A failed attempt leaves nothing behind; the caller
/// starts over.
pub struct AuthorizationFlow {
    client_id: String,
    client_secret: String,
    token_client: TokenClient,
    race: RaceConfig,
}

impl AuthorizationFlow {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            token_client: TokenClient::new(),
            race: RaceConfig::default(),
        }
    }

    pub fn with_token_client(mut self, token_client: TokenClient) -> Self {
        self.token_client = token_client;
        self
    }

    pub fn with_race_config(mut self, race: RaceConfig) -> Self {
        self.race = race;
        self
    }

    /// Run one attempt. `lines` is the user's terminal input.
    pub async fn run<H, L>(&self, host: &H, lines: L) -> Result<TokenResponse>
    where
        H: FlowHost + ?Sized,
        L: Stream<Item = io::Result<String>> + Unpin,
    {
        let request = AuthorizationRequest::new(&self.client_id);

        // Bind before showing the URL so an instant redirect is not missed.
        let race = CallbackRace::new(self.race.clone()).arm().await;
        host.present_url(&request.authorize_url());

        let code = match race.run(lines, |msg| host.reprompt(msg)).await {
            CallbackOutcome::Code(code) => code,
            CallbackOutcome::ProviderError(error) => return Err(Error::ProviderAuth(error)),
            CallbackOutcome::Timeout => return Err(Error::Timeout(self.race.timeout)),
            CallbackOutcome::ChannelError(cause) => return Err(Error::Channel(cause)),
        };

        info!("exchanging authorization code for tokens");
        let (tokens, body) = self
            .token_client
            .exchange_code(&self.client_id, &self.client_secret, &code)
            .await?;

        if tokens.access_token.is_none() || tokens.refresh_token.is_none() {
            return Err(Error::MalformedResponse { body });
        }

        host.persist_tokens(&tokens)
            .await
            .map_err(|e| Error::Persist(format!("{e:#}")))?;
        info!("Oura tokens stored");
        Ok(tokens)
    }
}
