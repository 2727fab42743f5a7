//! Configuration loading and management

use anyhow::{Context, Result, bail};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub feed: FeedConfig,

    #[serde(default)]
    pub mastodon: MastodonConfig,

    #[serde(default)]
    pub bluesky: BlueskyConfig,

    #[serde(default)]
    pub threads: ThreadsConfig,

    #[serde(default)]
    pub gotify: GotifyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_state_db_path")]
    pub state_db_path: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub dry_run: bool,

    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default)]
    pub url: String,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_mins: i64,

    #[serde(default)]
    pub category: String,

    #[serde(default = "default_skip_prefix_categories")]
    pub skip_prefix_categories: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MastodonConfig {
    #[serde(default)]
    pub url: String,

    #[serde(default = "default_mastodon_token_env")]
    pub access_token_env: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlueskyConfig {
    #[serde(default)]
    pub handle: String,

    #[serde(default = "default_bluesky_password_env")]
    pub password_env: String,

    #[serde(default = "default_bluesky_pds")]
    pub pds: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadsConfig {
    #[serde(default)]
    pub user_id: String,

    #[serde(default = "default_threads_token_env")]
    pub token_env: String,

    #[serde(default = "default_threads_api_url")]
    pub api_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GotifyConfig {
    #[serde(default)]
    pub url: String,

    #[serde(default = "default_gotify_token_env")]
    pub token_env: String,
}

// Default value functions
fn default_state_db_path() -> PathBuf {
    PathBuf::from("./rss-relay.sqlite")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_http_timeout() -> u64 {
    10
}

fn default_poll_interval() -> i64 {
    rss_relay_domain::usecases::DEFAULT_POLL_INTERVAL_MINS
}

fn default_skip_prefix_categories() -> Vec<String> {
    vec!["Thoughts".to_string()]
}

fn default_mastodon_token_env() -> String {
    "MASTODON_ACCESS_TOKEN".to_string()
}

fn default_bluesky_password_env() -> String {
    "BLUESKY_PASSWORD".to_string()
}

fn default_bluesky_pds() -> String {
    rss_relay_adapters::bluesky::DEFAULT_PDS.to_string()
}

fn default_threads_token_env() -> String {
    "THREADS_TOKEN".to_string()
}

fn default_threads_api_url() -> String {
    rss_relay_adapters::threads::DEFAULT_API_URL.to_string()
}

fn default_gotify_token_env() -> String {
    "GOTIFY_TOKEN".to_string()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            state_db_path: default_state_db_path(),
            log_level: default_log_level(),
            dry_run: false,
            http_timeout_secs: default_http_timeout(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            poll_interval_mins: default_poll_interval(),
            category: String::new(),
            skip_prefix_categories: default_skip_prefix_categories(),
        }
    }
}

impl Default for MastodonConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            access_token_env: default_mastodon_token_env(),
        }
    }
}

impl Default for BlueskyConfig {
    fn default() -> Self {
        Self {
            handle: String::new(),
            password_env: default_bluesky_password_env(),
            pds: default_bluesky_pds(),
        }
    }
}

impl Default for ThreadsConfig {
    fn default() -> Self {
        Self {
            user_id: String::new(),
            token_env: default_threads_token_env(),
            api_url: default_threads_api_url(),
        }
    }
}

impl Default for GotifyConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            token_env: default_gotify_token_env(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        Self::load_with_aliases(config_path, EnvAliases::from_env())
    }

    fn load_with_aliases(config_path: Option<&Path>, aliases: EnvAliases) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Try default config path if none specified
        let default_path = PathBuf::from("./config.toml");
        let path = config_path.unwrap_or(&default_path);

        if path.exists() {
            builder = builder.add_source(config::File::from(path));
        } else if config_path.is_some() {
            // User specified a path that doesn't exist
            bail!("Config file not found: {}", path.display());
        }

        // Plain variable names, then the prefixed ones
        builder = builder.add_source(aliases);
        builder = builder.add_source(
            config::Environment::with_prefix("RSS_RELAY")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("feed.skip_prefix_categories")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Check the settings `run` cannot start without
    pub fn validate(&self) -> Result<()> {
        if self.feed.url.trim().is_empty() {
            bail!("No feed URL configured (set feed.url or pass --feed-url)");
        }

        if self.mastodon.url.trim().is_empty() {
            bail!("No Mastodon instance URL configured (set mastodon.url)");
        }

        if self.general.http_timeout_secs == 0 {
            bail!("general.http_timeout_secs must be greater than zero");
        }

        Ok(())
    }

    /// Category filter, `None` when unset
    pub fn category(&self) -> Option<String> {
        let category = self.feed.category.trim();
        (!category.is_empty()).then(|| category.to_string())
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }

    /// Generate example configuration as TOML string
    pub fn example_toml() -> String {
        r#"# rss-relay configuration

[general]
state_db_path = "./rss-relay.sqlite"
log_level = "info"
dry_run = false
http_timeout_secs = 10

[feed]
url = "https://blog.example/index.xml"
poll_interval_mins = 60
# Only relay posts whose last URL segment contains this string
category = ""
# Posts whose title starts with one of these are announced with their content
skip_prefix_categories = ["Thoughts"]

# Primary destination (required)
[mastodon]
url = "https://mastodon.social"
access_token_env = "MASTODON_ACCESS_TOKEN"

# Secondary destinations, enabled when their credentials are set
[bluesky]
handle = ""
password_env = "BLUESKY_PASSWORD"
pds = "https://bsky.social"

[threads]
user_id = ""
token_env = "THREADS_TOKEN"
api_url = "https://graph.threads.net/v1.0"

# Alerts for failed primary posts
[gotify]
url = ""
token_env = "GOTIFY_TOKEN"
"#
        .to_string()
    }
}

/// Unprefixed environment names accepted alongside `RSS_RELAY__*`, mapped to
/// configuration keys. The prefixed form wins when both are set.
const ENV_ALIASES: &[(&str, &str)] = &[
    ("FEED_URL", "feed.url"),
    ("INTERVAL", "feed.poll_interval_mins"),
    ("CATEGORY", "feed.category"),
    ("SKIP_PREFIX_CATEGORIES", "feed.skip_prefix_categories"),
    ("MASTODON_URL", "mastodon.url"),
    ("BLUESKY_HANDLE", "bluesky.handle"),
    ("BLUESKY_PDS", "bluesky.pds"),
    ("THREADS_USER_ID", "threads.user_id"),
    ("GOTIFY_URL", "gotify.url"),
];

const LIST_KEY: &str = "feed.skip_prefix_categories";

/// `config` source over [`ENV_ALIASES`]
#[derive(Debug, Clone, Default)]
struct EnvAliases {
    vars: Vec<(String, String)>,
}

impl EnvAliases {
    fn from_env() -> Self {
        Self::from_vars(
            ENV_ALIASES
                .iter()
                .filter_map(|(name, _)| std::env::var(name).ok().map(|v| (name.to_string(), v))),
        )
    }

    fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            vars: vars.into_iter().collect(),
        }
    }
}

impl config::Source for EnvAliases {
    fn clone_into_box(&self) -> Box<dyn config::Source + Send + Sync> {
        Box::new(self.clone())
    }

    fn collect(&self) -> Result<config::Map<String, config::Value>, config::ConfigError> {
        let origin = "environment".to_string();
        let mut map = config::Map::new();

        for (name, value) in &self.vars {
            let Some((_, key)) = ENV_ALIASES
                .iter()
                .find(|(alias, _)| *alias == name.as_str())
            else {
                continue;
            };
            // Empty means unset
            if value.trim().is_empty() {
                continue;
            }

            let kind = if *key == LIST_KEY {
                config::ValueKind::Array(
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|p| !p.is_empty())
                        .map(|p| config::Value::new(Some(&origin), p.to_string()))
                        .collect(),
                )
            } else {
                config::ValueKind::String(value.trim().to_string())
            };

            map.insert(key.to_string(), config::Value::new(Some(&origin), kind));
        }

        Ok(map)
    }
}

/// Read a required secret from the named environment variable
pub fn load_secret(env_var: &str, what: &str) -> Result<SecretString> {
    if env_var.trim().is_empty() {
        bail!("No env var configured for {}", what);
    }

    let value = std::env::var(env_var)
        .with_context(|| format!("Missing env var {} for {}", env_var, what))?;

    if value.trim().is_empty() {
        bail!("Env var {} is empty for {}", env_var, what);
    }

    Ok(SecretString::new(value.into()))
}

/// Read an optional secret; unset and empty are the same
pub fn optional_secret(env_var: &str) -> Option<SecretString> {
    if env_var.trim().is_empty() {
        return None;
    }

    std::env::var(env_var)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(|v| SecretString::new(v.into()))
}
