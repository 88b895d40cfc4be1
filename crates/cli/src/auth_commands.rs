use {
    anyhow::{Context, Result},
    clap::Subcommand,
    ouraclaw_config::ConfigStore,
    ouraclaw_oauth::{AuthorizationFlow, TokenClient},
    secrecy::SecretString,
};

use crate::terminal::{TerminalHost, describe_expiry, prompt, stdin_lines, unix_now};

#[derive(Subcommand)]
pub enum AuthAction {
    /// Connect an Oura account via OAuth.
    Login {
        /// OAuth client ID from the Oura developer portal.
        #[arg(long, env = "OURACLAW_CLIENT_ID")]
        client_id: Option<String>,
        /// OAuth client secret from the Oura developer portal.
        #[arg(long, env = "OURACLAW_CLIENT_SECRET", hide_env_values = true)]
        client_secret: Option<String>,
    },
    /// Exchange the stored refresh token for a new access token.
    Refresh,
    /// Show the stored authorization state.
    Status,
    /// Forget the stored tokens.
    Logout,
}

pub async fn handle_auth(action: AuthAction) -> Result<()> {
    let store = ConfigStore::new()?;
    match action {
        AuthAction::Login {
            client_id,
            client_secret,
        } => login(&store, client_id, client_secret).await,
        AuthAction::Refresh => refresh(&store).await,
        AuthAction::Status => status(&store),
        AuthAction::Logout => logout(&store),
    }
}

async fn login(
    store: &ConfigStore,
    client_id: Option<String>,
    client_secret: Option<String>,
) -> Result<()> {
    let config = store.load()?;
    let mut lines = stdin_lines();

    let client_id = match client_id.or(config.client_id.clone()) {
        Some(id) if !id.is_empty() => id,
        _ => prompt(&mut lines, "Oura client ID: ").await?,
    };
    let client_secret = match client_secret.or(config.client_secret().map(str::to_string)) {
        Some(secret) if !secret.is_empty() => secret,
        _ => prompt(&mut lines, "Oura client secret: ").await?,
    };

    store.update(|c| {
        c.client_id = Some(client_id.clone());
        c.client_secret = Some(SecretString::new(client_secret.clone()));
    })?;

    let host = TerminalHost { store };
    AuthorizationFlow::new(client_id, client_secret)
        .run(&host, lines)
        .await?;

    println!("\nOura account connected.");
    Ok(())
}

async fn refresh(store: &ConfigStore) -> Result<()> {
    let config = store.load()?;
    let (client_id, client_secret) = config
        .client_credentials()
        .context("no Oura client configured; run `ouraclaw auth login` first")?;
    let refresh_token = config
        .refresh_token()
        .context("no refresh token stored; run `ouraclaw auth login` first")?;

    let tokens = TokenClient::new()
        .refresh_access_token(client_id, client_secret, refresh_token)
        .await?;
    let access = tokens
        .access_token
        .as_deref()
        .context("token response has no access_token")?;
    let expires_at = tokens.expires_at(unix_now());

    store.update(|c| c.set_tokens(access, tokens.refresh_token.as_deref(), expires_at))?;
    println!("Access token refreshed [{}]", describe_expiry(expires_at, unix_now()));
    Ok(())
}

fn status(store: &ConfigStore) -> Result<()> {
    let config = store.load()?;
    match config.client_id.as_deref() {
        Some(id) => println!("Client:        {id}"),
        None => {
            println!("No Oura client configured. Run `ouraclaw auth login`.");
            return Ok(());
        },
    }
    if config.access_token().is_none() {
        println!("Access token:  none");
        return Ok(());
    }
    println!(
        "Access token:  {}",
        describe_expiry(config.token_expires_at, unix_now())
    );
    println!(
        "Refresh token: {}",
        if config.refresh_token().is_some() {
            "stored"
        } else {
            "missing"
        }
    );
    Ok(())
}

fn logout(store: &ConfigStore) -> Result<()> {
    store.update(|c| c.clear_tokens())?;
    println!("Oura tokens removed from {}", store.path().display());
    Ok(())
}
