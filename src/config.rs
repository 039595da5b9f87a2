use std::time::Duration;

use anyhow::{bail, Context};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_url: String,
    pub api_token: Option<String>,
    pub timeout: Duration,
    pub log_level: String,
}

impl Config {
    /// Reads the environment; command line values win over it.
    pub fn load(api_url: Option<String>, verbose: bool) -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok(), api_url, verbose)
    }

    fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        api_url: Option<String>,
        verbose: bool,
    ) -> anyhow::Result<Self> {
        let api_url = api_url
            .or_else(|| lookup("MENTOR_API_URL"))
            .context("MENTOR_API_URL must be set (or pass --api-url)")?;
        if api_url.trim().is_empty() {
            bail!("MENTOR_API_URL is empty");
        }

        let api_token = lookup("MENTOR_API_TOKEN").filter(|token| !token.trim().is_empty());

        let timeout_secs = match lookup("MENTOR_API_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("MENTOR_API_TIMEOUT_SECS is not a number: {raw}"))?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let log_level = if verbose {
            "debug".to_string()
        } else {
            lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string())
        };

        Ok(Self {
            api_url,
            api_token,
            timeout: Duration::from_secs(timeout_secs),
            log_level,
        })
    }
}
