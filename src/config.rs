use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub imap: ImapConfig,
    pub lookup: LookupConfig,
    pub poll: PollConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone)]
pub struct ImapConfig {
    pub server: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub folder: String,
}

#[derive(Debug, Clone)]
pub struct LookupConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Only messages whose subject contains this phrase count as orders.
    pub subject_phrase: String,
    pub lookback_days: u32,
    pub interval: Duration,
    pub summary_top_n: usize,
}

#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub orders_path: PathBuf,
    pub cards_path: PathBuf,
    pub all_cards_path: PathBuf,
    pub summary_path: PathBuf,
    pub cache_path: PathBuf,
}

impl Default for PollConfig {
    fn default() -> Self {
        PollConfig {
            subject_phrase: "twój przedmiot został sprzedany".to_string(),
            lookback_days: 10,
            interval: Duration::from_secs(60),
            summary_top_n: 5,
        }
    }
}

impl Config {
    pub fn new() -> Result<Self> {
        // Fail early when the credentials are missing
        Self::check_required_env_vars()?;

        let defaults = PollConfig::default();

        Ok(Config {
            imap: ImapConfig {
                server: env_or("IMAP_SERVER", "imap.gmail.com"),
                port: env_parse("IMAP_PORT", 993)?,
                username: std::env::var("EMAIL_ACCOUNT").context("EMAIL_ACCOUNT must be set")?,
                password: std::env::var("EMAIL_PASSWORD").context("EMAIL_PASSWORD must be set")?,
                folder: env_or("FOLDER", "INBOX"),
            },
            lookup: LookupConfig {
                base_url: env_or("LOOKUP_BASE_URL", "https://api.pokemontcg.io/v2/cards"),
                api_key: std::env::var("API_KEY")
                    .ok()
                    .map(|key| key.trim().to_string())
                    .filter(|key| !key.is_empty()),
            },
            poll: PollConfig {
                subject_phrase: env_or("SEARCH_PHRASE", &defaults.subject_phrase),
                lookback_days: env_parse("SEARCH_DAYS", defaults.lookback_days)?,
                interval: Duration::from_secs(env_parse("CHECK_INTERVAL", defaults.interval.as_secs())?),
                summary_top_n: env_parse("SUMMARY_TOP_N", defaults.summary_top_n)?,
            },
            output: OutputConfig {
                orders_path: env_or("OUTPUT_PATH", "orders.json").into(),
                cards_path: env_or("CARDS_OUTPUT_PATH", "latest_order_cards.json").into(),
                all_cards_path: env_or("ALL_CARDS_OUTPUT_PATH", "all_cards.json").into(),
                summary_path: env_or("SUMMARY_OUTPUT_PATH", "summary.html").into(),
                cache_path: env_or("CARDS_CACHE_PATH", "cache.json").into(),
            },
        })
    }

    fn check_required_env_vars() -> Result<()> {
        let required_vars = [
            "EMAIL_ACCOUNT",
            "EMAIL_PASSWORD",
        ];

        let missing_vars: Vec<&str> = required_vars
            .iter()
            .filter(|var| std::env::var(var).is_err())
            .copied()
            .collect();

        if !missing_vars.is_empty() {
            anyhow::bail!(
                "Missing environment variables: {}\n\
                 \n\
                 💡 Solutions:\n\
                 1. Create a .env file with your mailbox credentials:\n\
                    EMAIL_ACCOUNT=you@example.com\n\
                    EMAIL_PASSWORD=app-password\n\
                 \n\
                 2. Or export them before running:\n\
                    export EMAIL_ACCOUNT=you@example.com\n\
                    export EMAIL_PASSWORD=app-password\n\
                    cargo run -- --dry-run",
                missing_vars.join(", ")
            );
        }

        Ok(())
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: '{}'", key, value)),
        Err(_) => Ok(default),
    }
}
