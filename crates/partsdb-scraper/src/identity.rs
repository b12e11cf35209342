//! Per-navigation browser identity and human-like timing.
//!
//! This only makes the automated browser look like an ordinary visitor. It is
//! not a security boundary.

use std::time::Duration;

use partsdb_core::ScraperSettings;
use rand::seq::IndexedRandom;
use rand::Rng;

/// Used when the configured pool is somehow empty.
const BROWSER_FALLBACK_UA: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/129.0.0.0 Safari/537.36";

const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7";

/// User-agent plus the extra request headers applied to one navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_agent: String,
    pub headers: Vec<(String, String)>,
}

impl Identity {
    /// Builds an identity carrying the standard top-level navigation header
    /// set with the given `Referer`.
    #[must_use]
    pub fn navigation(user_agent: impl Into<String>, referer: &str) -> Self {
        let headers = [
            ("Accept", ACCEPT),
            ("Accept-Language", "en-US,en;q=0.9"),
            ("Accept-Encoding", "gzip, deflate, br"),
            ("Connection", "keep-alive"),
            ("Referer", referer),
            ("Upgrade-Insecure-Requests", "1"),
            ("Sec-Fetch-Dest", "document"),
            ("Sec-Fetch-Mode", "navigate"),
            ("Sec-Fetch-Site", "same-origin"),
            ("Sec-Fetch-User", "?1"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect();

        Self {
            user_agent: user_agent.into(),
            headers,
        }
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Strategy for identities and pacing. Swapped for a deterministic double in
/// tests.
pub trait IdentityRotator: Send + Sync {
    fn next_identity(&self, referer: &str) -> Identity;

    /// Pause between consecutive source URLs.
    fn interaction_delay(&self) -> Duration;

    /// Pause after the synthetic interaction before reading the page.
    fn settle_delay(&self) -> Duration;

    /// Point for the synthetic pointer move and click.
    fn pointer_target(&self, width: u32, height: u32) -> (f64, f64);
}

/// Uniform random choice from a fixed user-agent pool with jittered delays.
#[derive(Debug, Clone)]
pub struct RandomIdentityRotator {
    user_agents: Vec<String>,
    delay_min_ms: u64,
    delay_max_ms: u64,
    settle_delay_ms: u64,
}

impl RandomIdentityRotator {
    #[must_use]
    pub fn new(
        user_agents: Vec<String>,
        delay_min_ms: u64,
        delay_max_ms: u64,
        settle_delay_ms: u64,
    ) -> Self {
        Self {
            user_agents,
            delay_min_ms: delay_min_ms.min(delay_max_ms),
            delay_max_ms: delay_max_ms.max(delay_min_ms),
            settle_delay_ms,
        }
    }

    #[must_use]
    pub fn from_settings(settings: &ScraperSettings) -> Self {
        Self::new(
            settings.user_agents.clone(),
            settings.delay_min_ms,
            settings.delay_max_ms,
            settings.settle_delay_ms,
        )
    }
}

impl IdentityRotator for RandomIdentityRotator {
    fn next_identity(&self, referer: &str) -> Identity {
        let user_agent = self
            .user_agents
            .choose(&mut rand::rng())
            .map_or(BROWSER_FALLBACK_UA, String::as_str);
        Identity::navigation(user_agent, referer)
    }

    fn interaction_delay(&self) -> Duration {
        let ms = rand::rng().random_range(self.delay_min_ms..=self.delay_max_ms);
        Duration::from_millis(ms)
    }

    fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    fn pointer_target(&self, width: u32, height: u32) -> (f64, f64) {
        let mut rng = rand::rng();
        let x = rng.random_range(0..width.max(1));
        let y = rng.random_range(0..height.max(1));
        (f64::from(x), f64::from(y))
    }
}

/// Deterministic rotator: first pool entry, zero delays, pointer at origin.
#[derive(Debug, Clone)]
pub struct FixedIdentityRotator {
    user_agent: String,
}

impl FixedIdentityRotator {
    #[must_use]
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
        }
    }

    #[must_use]
    pub fn from_settings(settings: &ScraperSettings) -> Self {
        Self::new(
            settings
                .user_agents
                .first()
                .map_or(BROWSER_FALLBACK_UA, String::as_str),
        )
    }
}

impl IdentityRotator for FixedIdentityRotator {
    fn next_identity(&self, referer: &str) -> Identity {
        Identity::navigation(self.user_agent.clone(), referer)
    }

    fn interaction_delay(&self) -> Duration {
        Duration::ZERO
    }

    fn settle_delay(&self) -> Duration {
        Duration::ZERO
    }

    fn pointer_target(&self, _width: u32, _height: u32) -> (f64, f64) {
        (0.0, 0.0)
    }
}
