//! Tests for configuration system.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

use pretty_assertions::assert_eq;
use soko::config::{SokoConfig, DEFAULT_BASE_URL, DEFAULT_CACHE_CAPACITY, DEFAULT_POLL_INTERVAL};
use soko::error::SokoError;

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

const CONFIG_ENV_VARS: [&str; 6] = [
    "SOKO_API_BASE_URL",
    "SOKO_CREDENTIALS_DIR",
    "SOKO_PROFILE",
    "SOKO_REQUEST_TIMEOUT_SECS",
    "SOKO_POLL_INTERVAL_SECS",
    "SOKO_CACHE_CAPACITY",
];

struct EnvGuard {
    saved: Vec<(String, Option<String>)>,
}

impl EnvGuard {
    fn capture(keys: &[&str]) -> Self {
        let saved = keys
            .iter()
            .map(|key| ((*key).to_string(), std::env::var(key).ok()))
            .collect();
        Self { saved }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.saved {
            match value {
                Some(v) => std::env::set_var(key, v),
                None => std::env::remove_var(key),
            }
        }
    }
}

fn env_lock_guard() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn defaults_apply_when_nothing_is_set() {
    let config = SokoConfig::from_lookup(lookup(&[])).unwrap();
    assert_eq!(config.base_url, DEFAULT_BASE_URL);
    assert_eq!(config.profile, "default");
    assert_eq!(config.poll_interval, DEFAULT_POLL_INTERVAL);
    assert_eq!(config.cache_capacity, DEFAULT_CACHE_CAPACITY);
}

#[test]
fn variables_override_defaults() {
    let config = SokoConfig::from_lookup(lookup(&[
        ("SOKO_API_BASE_URL", "https://api.soko.example/api/"),
        ("SOKO_CREDENTIALS_DIR", "/var/lib/soko"),
        ("SOKO_PROFILE", "seller"),
        ("SOKO_REQUEST_TIMEOUT_SECS", "10"),
        ("SOKO_POLL_INTERVAL_SECS", "2"),
        ("SOKO_CACHE_CAPACITY", "32"),
    ]))
    .unwrap();

    assert_eq!(config.base_url, "https://api.soko.example/api");
    assert_eq!(config.credentials_dir, PathBuf::from("/var/lib/soko"));
    assert_eq!(config.profile, "seller");
    assert_eq!(config.request_timeout, Duration::from_secs(10));
    assert_eq!(config.poll_interval, Duration::from_secs(2));
    assert_eq!(config.cache_capacity, 32);
}

#[test]
fn blank_values_are_ignored() {
    let config = SokoConfig::from_lookup(lookup(&[("SOKO_API_BASE_URL", "  ")])).unwrap();
    assert_eq!(config.base_url, DEFAULT_BASE_URL);
}

#[test]
fn invalid_values_are_configuration_errors() {
    let cases = [
        ("SOKO_REQUEST_TIMEOUT_SECS", "soon"),
        ("SOKO_POLL_INTERVAL_SECS", "0"),
        ("SOKO_CACHE_CAPACITY", "0"),
        ("SOKO_CACHE_CAPACITY", "-4"),
        ("SOKO_API_BASE_URL", "ftp://files.example"),
    ];
    for (key, value) in cases {
        let err = SokoConfig::from_lookup(lookup(&[(key, value)])).unwrap_err();
        assert!(
            matches!(err, SokoError::Configuration(_)),
            "{key}={value} gave {err:?}"
        );
    }
}

#[test]
fn builder_values_win_over_environment() {
    let config = SokoConfig::from_lookup(lookup(&[("SOKO_PROFILE", "buyer")]))
        .unwrap()
        .with_profile("seller")
        .with_base_url("http://localhost:8000/api/");
    assert_eq!(config.profile, "seller");
    assert_eq!(config.base_url, "http://localhost:8000/api");
    assert!(config.validate().is_ok());
}

#[test]
fn from_env_reads_process_environment() {
    let _lock = env_lock_guard();
    let _guard = EnvGuard::capture(&CONFIG_ENV_VARS);
    for key in CONFIG_ENV_VARS {
        std::env::remove_var(key);
    }
    std::env::set_var("SOKO_API_BASE_URL", "https://staging.soko.example/api");
    std::env::set_var("SOKO_POLL_INTERVAL_SECS", "3");

    let config = SokoConfig::from_env().unwrap();
    assert_eq!(config.base_url, "https://staging.soko.example/api");
    assert_eq!(config.poll_interval, Duration::from_secs(3));
}
