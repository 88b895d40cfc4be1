pub mod authorize;
pub mod callback_server;
pub mod error;
pub mod flow;
pub mod manual_input;
pub mod race;
pub mod token_client;
pub mod types;

pub use {
    authorize::{
        AUTHORIZE_URL, CALLBACK_PATH, CALLBACK_PORT, SCOPES, TOKEN_URL, build_authorize_url,
        redirect_uri,
    },
    error::{Error, Result},
    flow::{AuthorizationFlow, FlowHost},
    race::{ArmedRace, CALLBACK_TIMEOUT, CallbackRace, RaceConfig},
    token_client::TokenClient,
    types::{AuthorizationRequest, CallbackOutcome, TokenResponse},
};
