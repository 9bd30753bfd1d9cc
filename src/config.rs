use std::{env, path::PathBuf};
use tracing::info;

pub const DEFAULT_API_BASE: &str = "http://localhost:1337/api/counter-app-rigs";
pub const DEFAULT_AUTH_BASE: &str = "http://localhost:1337/api/auth";
pub const DEFAULT_SESSION_PATH: &str = "data/session.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_base: String,
    pub auth_base: String,
    pub session_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            api_base: base_url(&lookup, "COUNTER_API_BASE_URL", DEFAULT_API_BASE),
            auth_base: base_url(&lookup, "COUNTER_AUTH_BASE_URL", DEFAULT_AUTH_BASE),
            session_path: PathBuf::from(load(
                &lookup,
                "COUNTER_SESSION_PATH",
                DEFAULT_SESSION_PATH,
            )),
        }
    }
}

fn load(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    match lookup(key).filter(|value| !value.trim().is_empty()) {
        Some(value) => value,
        None => {
            info!("{key} not set, using default: {default}");
            default.to_string()
        }
    }
}

fn base_url(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    load(lookup, key, default).trim_end_matches('/').to_string()
}
