use crate::app_config::{AppConfig, Environment, ScraperSettings};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is present but holds an invalid value.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is present but holds an invalid value.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every variable has a default; this only fails on values that do not parse
/// or that contradict each other.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .trim()
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .trim()
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_list = |var: &str, separator: char| -> Option<Vec<String>> {
        optional(var).map(|raw| {
            raw.split(separator)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToOwned::to_owned)
                .collect()
        })
    };

    let env = parse_environment(&or_default("PARTSDB_ENV", "development"))?;

    let bind_addr = or_default("PARTSDB_BIND_ADDR", "0.0.0.0:5000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("PARTSDB_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("PARTSDB_LOG_LEVEL", "info");
    let snapshot_path = PathBuf::from(or_default("PARTSDB_SNAPSHOT_PATH", "./partData.json"));

    let cache_ttl_secs = parse_u64("PARTSDB_CACHE_TTL_SECS", "86400")?;
    if cache_ttl_secs == 0 {
        return Err(invalid("PARTSDB_CACHE_TTL_SECS", "must be > 0".to_string()));
    }
    let refresh_cron = optional("PARTSDB_REFRESH_CRON");
    let chromium_path = optional("PARTSDB_CHROMIUM_PATH").map(PathBuf::from);

    let defaults = ScraperSettings::default();

    let source_urls = parse_list("PARTSDB_SOURCE_URLS", ',').unwrap_or(defaults.source_urls);
    if source_urls.is_empty() {
        return Err(invalid(
            "PARTSDB_SOURCE_URLS",
            "at least one source URL is required".to_string(),
        ));
    }
    let user_agents = parse_list("PARTSDB_USER_AGENTS", '|').unwrap_or(defaults.user_agents);
    if user_agents.is_empty() {
        return Err(invalid(
            "PARTSDB_USER_AGENTS",
            "identity pool must not be empty".to_string(),
        ));
    }

    let delay_min_ms = parse_u64("PARTSDB_DELAY_MIN_MS", "2000")?;
    let delay_max_ms = parse_u64("PARTSDB_DELAY_MAX_MS", "5000")?;
    if delay_min_ms > delay_max_ms {
        return Err(invalid(
            "PARTSDB_DELAY_MIN_MS",
            format!("{delay_min_ms} exceeds PARTSDB_DELAY_MAX_MS ({delay_max_ms})"),
        ));
    }

    let scraper = ScraperSettings {
        source_urls,
        site_origin: or_default("PARTSDB_SITE_ORIGIN", &defaults.site_origin)
            .trim_end_matches('/')
            .to_string(),
        user_agents,
        delay_min_ms,
        delay_max_ms,
        settle_delay_ms: parse_u64("PARTSDB_SETTLE_DELAY_MS", "1000")?,
        nav_timeout_secs: parse_u64("PARTSDB_NAV_TIMEOUT_SECS", "30")?,
        content_timeout_secs: parse_u64("PARTSDB_CONTENT_TIMEOUT_SECS", "10")?,
        nav_max_retries: parse_u32("PARTSDB_NAV_MAX_RETRIES", "1")?,
        retry_backoff_base_ms: parse_u64("PARTSDB_RETRY_BACKOFF_BASE_MS", "2000")?,
        run_timeout_secs: parse_u64("PARTSDB_RUN_TIMEOUT_SECS", "600")?,
        default_phone: or_default("PARTSDB_DEFAULT_PHONE", &defaults.default_phone),
    };

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        snapshot_path,
        cache_ttl_secs,
        refresh_cron,
        chromium_path,
        scraper,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for unrecognized values.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "PARTSDB_ENV".to_string(),
            reason: format!("expected development, test, or production; got \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
