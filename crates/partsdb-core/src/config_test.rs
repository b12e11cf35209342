use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

#[test]
fn parse_environment_development() {
    assert_eq!(
        parse_environment("development").unwrap(),
        Environment::Development
    );
}

#[test]
fn parse_environment_production() {
    assert_eq!(
        parse_environment("production").unwrap(),
        Environment::Production
    );
}

#[test]
fn parse_environment_unknown_fails() {
    let err = parse_environment("staging").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "PARTSDB_ENV"));
}

#[test]
fn build_app_config_uses_defaults_when_env_is_empty() {
    let map: HashMap<&str, &str> = HashMap::new();
    let cfg = build_app_config(lookup_from_map(&map)).expect("defaults should be valid");

    assert_eq!(cfg.env, Environment::Development);
    assert_eq!(cfg.bind_addr.port(), 5000);
    assert_eq!(cfg.cache_ttl_secs, 86_400);
    assert_eq!(cfg.snapshot_path.to_str(), Some("./partData.json"));
    assert!(cfg.refresh_cron.is_none());
    assert_eq!(cfg.scraper, ScraperSettings::default());
    assert_eq!(cfg.scraper.source_urls.len(), 5);
    assert_eq!(cfg.scraper.delay_min_ms, 2_000);
    assert_eq!(cfg.scraper.delay_max_ms, 5_000);
    assert_eq!(cfg.scraper.nav_timeout_secs, 30);
    assert_eq!(cfg.scraper.default_phone, "1-888-738-4871");
}

#[test]
fn build_app_config_splits_source_urls_in_order() {
    let mut map = HashMap::new();
    map.insert(
        "PARTSDB_SOURCE_URLS",
        "https://example.com/Dishwasher-Parts.htm, https://example.com/Freezer-Parts.htm,",
    );
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(
        cfg.scraper.source_urls,
        vec![
            "https://example.com/Dishwasher-Parts.htm".to_string(),
            "https://example.com/Freezer-Parts.htm".to_string(),
        ]
    );
}

#[test]
fn build_app_config_splits_user_agents_on_pipe() {
    let mut map = HashMap::new();
    map.insert("PARTSDB_USER_AGENTS", "agent-a (x, y) | agent-b");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.scraper.user_agents, vec!["agent-a (x, y)", "agent-b"]);
}

#[test]
fn build_app_config_rejects_inverted_delay_window() {
    let mut map = HashMap::new();
    map.insert("PARTSDB_DELAY_MIN_MS", "6000");
    map.insert("PARTSDB_DELAY_MAX_MS", "5000");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PARTSDB_DELAY_MIN_MS"),
        "expected InvalidEnvVar(PARTSDB_DELAY_MIN_MS), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_non_numeric_ttl() {
    let mut map = HashMap::new();
    map.insert("PARTSDB_CACHE_TTL_SECS", "a day");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PARTSDB_CACHE_TTL_SECS"),
        "expected InvalidEnvVar(PARTSDB_CACHE_TTL_SECS), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_zero_ttl() {
    let mut map = HashMap::new();
    map.insert("PARTSDB_CACHE_TTL_SECS", "0");
    assert!(build_app_config(lookup_from_map(&map)).is_err());
}

#[test]
fn build_app_config_fails_with_invalid_bind_addr() {
    let mut map = HashMap::new();
    map.insert("PARTSDB_BIND_ADDR", "not-a-socket-addr");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PARTSDB_BIND_ADDR"),
        "expected InvalidEnvVar(PARTSDB_BIND_ADDR), got: {result:?}"
    );
}

#[test]
fn build_app_config_trims_trailing_slash_from_origin() {
    let mut map = HashMap::new();
    map.insert("PARTSDB_SITE_ORIGIN", "https://parts.example.com/");
    map.insert("PARTSDB_REFRESH_CRON", "0 0 3 * * *");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.scraper.site_origin, "https://parts.example.com");
    assert_eq!(cfg.refresh_cron.as_deref(), Some("0 0 3 * * *"));
}
