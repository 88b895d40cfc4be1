//! Persisted OuraClaw settings: OAuth client credentials, tokens, and the
//! scheduled-summary preferences.

pub mod store;
pub mod types;

pub use {
    store::{ConfigStore, config_dir},
    types::{
        DEFAULT_EVENING_TIME, DEFAULT_MORNING_TIME, DEFAULT_TIMEZONE, OuraConfig,
        serialize_option_secret,
    },
};
