use std::collections::HashMap;

use super::*;

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();
    move |key: &str| map.get(key).cloned()
}

#[test]
fn required_values_only_uses_defaults() {
    let config =
        ClientConfig::from_lookup(lookup(&[("ACADEMY_BASE_URL", "https://api.test/exec"), ("ACADEMY_API_KEY", "12345")]))
            .unwrap();
    assert_eq!(config.base_url, "https://api.test/exec");
    assert_eq!(config.api_key, "12345");
    assert_eq!(config.storage_dir, PathBuf::from(DEFAULT_STORAGE_DIR));
    assert!(config.timeout.is_none());
}

#[test]
fn optional_values_are_parsed() {
    let config = ClientConfig::from_lookup(lookup(&[
        ("ACADEMY_BASE_URL", "http://127.0.0.1:8080"),
        ("ACADEMY_API_KEY", "k"),
        ("ACADEMY_STORAGE_DIR", "/tmp/academy"),
        ("ACADEMY_TIMEOUT_SECS", "10"),
    ]))
    .unwrap();
    assert_eq!(config.storage_dir, PathBuf::from("/tmp/academy"));
    assert_eq!(config.timeout, Some(Duration::from_secs(10)));
}

#[test]
fn missing_base_url_is_error() {
    let err = ClientConfig::from_lookup(lookup(&[("ACADEMY_API_KEY", "k")])).unwrap_err();
    assert!(matches!(err, ConfigError::Missing("ACADEMY_BASE_URL")));
}

#[test]
fn blank_api_key_counts_as_missing() {
    let err =
        ClientConfig::from_lookup(lookup(&[("ACADEMY_BASE_URL", "https://a.test"), ("ACADEMY_API_KEY", "  ")]))
            .unwrap_err();
    assert!(matches!(err, ConfigError::Missing("ACADEMY_API_KEY")));
}

#[test]
fn non_http_base_url_is_rejected() {
    let err = ClientConfig::from_lookup(lookup(&[("ACADEMY_BASE_URL", "ftp://a.test"), ("ACADEMY_API_KEY", "k")]))
        .unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { var: "ACADEMY_BASE_URL", .. }));
}

#[test]
fn bad_timeout_is_rejected() {
    let err = ClientConfig::from_lookup(lookup(&[
        ("ACADEMY_BASE_URL", "https://a.test"),
        ("ACADEMY_API_KEY", "k"),
        ("ACADEMY_TIMEOUT_SECS", "soon"),
    ]))
    .unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { var: "ACADEMY_TIMEOUT_SECS", .. }));
}
