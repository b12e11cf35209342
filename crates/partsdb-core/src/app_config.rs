use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Category pages scraped on every run, in order.
pub const DEFAULT_SOURCE_URLS: [&str; 5] = [
    "https://www.partselect.com/Refrigerator-Parts.htm",
    "https://www.partselect.com/Refrigerator-Ice-Makers.htm",
    "https://www.partselect.com/Freezer-Parts.htm",
    "https://www.partselect.com/Dishwasher-Parts.htm",
    "https://www.partselect.com/Dishwasher-Pumps.htm",
];

pub const DEFAULT_SITE_ORIGIN: &str = "https://www.partselect.com";

/// Desktop browser signatures rotated across navigations.
pub const DEFAULT_USER_AGENTS: [&str; 5] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/129.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/129.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:130.0) Gecko/20100101 Firefox/130.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_6_1) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.6 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/128.0.0.0 Safari/537.36 Edg/128.0.2739.79",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub snapshot_path: PathBuf,
    pub cache_ttl_secs: u64,
    pub refresh_cron: Option<String>,
    pub chromium_path: Option<PathBuf>,
    pub scraper: ScraperSettings,
}

impl AppConfig {
    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

/// The pipeline-facing subset of the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScraperSettings {
    pub source_urls: Vec<String>,
    pub site_origin: String,
    pub user_agents: Vec<String>,
    pub delay_min_ms: u64,
    pub delay_max_ms: u64,
    pub settle_delay_ms: u64,
    pub nav_timeout_secs: u64,
    pub content_timeout_secs: u64,
    pub nav_max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub run_timeout_secs: u64,
    pub default_phone: String,
}

impl ScraperSettings {
    #[must_use]
    pub fn nav_timeout(&self) -> Duration {
        Duration::from_secs(self.nav_timeout_secs)
    }

    #[must_use]
    pub fn content_timeout(&self) -> Duration {
        Duration::from_secs(self.content_timeout_secs)
    }

    #[must_use]
    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_secs)
    }
}

impl Default for ScraperSettings {
    fn default() -> Self {
        Self {
            source_urls: DEFAULT_SOURCE_URLS.iter().map(|s| (*s).to_owned()).collect(),
            site_origin: DEFAULT_SITE_ORIGIN.to_owned(),
            user_agents: DEFAULT_USER_AGENTS.iter().map(|s| (*s).to_owned()).collect(),
            delay_min_ms: 2_000,
            delay_max_ms: 5_000,
            settle_delay_ms: 1_000,
            nav_timeout_secs: 30,
            content_timeout_secs: 10,
            nav_max_retries: 1,
            retry_backoff_base_ms: 2_000,
            run_timeout_secs: 600,
            default_phone: crate::DEFAULT_SUPPORT_PHONE.to_owned(),
        }
    }
}
