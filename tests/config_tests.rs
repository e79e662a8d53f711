use glysearch::Config;
use glysearch::providers::Provider;

#[test]
fn test_default_config_populates_providers() {
    let config = Config::default();
    assert_eq!(config.default_provider, "openai");
    for provider in Provider::ALL {
        let provider_config = config
            .get_provider_config(provider.name())
            .expect("provider present");
        assert_eq!(provider_config.model, provider.default_model());
        assert!(!provider_config.has_api_key());
    }
}

#[test]
fn test_default_tunables() {
    let config = Config::default();
    assert_eq!(config.search.max_tokens, 1000);
    assert_eq!(config.search.max_retries, 2);
    assert_eq!(config.search.request_timeout_seconds, 30);
    assert_eq!(config.rate_limit.max_requests, 60);
    assert_eq!(config.rate_limit.time_window_seconds, 3600);
    assert!(config.cache.include_ai_metadata);
    assert_eq!(config.cache.collection, "search_cache");
    assert!(!config.audit.enabled);
}

#[test]
fn test_toml_round_trip() {
    let mut config = Config::default();
    config.default_provider = "google".to_string();
    config.search.max_retries = 4;
    config.cache.include_ai_metadata = false;

    let rendered = toml::to_string(&config).expect("serializes");
    let parsed: Config = toml::from_str(&rendered).expect("parses");

    assert_eq!(parsed.default_provider, "google");
    assert_eq!(parsed.search.max_retries, 4);
    assert!(!parsed.cache.include_ai_metadata);
}

#[test]
fn test_partial_config_file_uses_defaults() {
    let parsed: Config = toml::from_str(
        r#"
default_provider = "google"

[providers.google]
model = "gemini-2.0-flash"
"#,
    )
    .expect("parses");

    assert_eq!(parsed.default_provider, "google");
    assert_eq!(parsed.search.max_tokens, 1000);
    assert_eq!(parsed.rate_limit.max_requests, 60);
    assert!(parsed.cache.include_ai_metadata);
}

#[test]
fn test_provider_lookup_is_case_insensitive() {
    let config = Config::default();
    assert!(config.get_provider_config("OpenAI").is_some());
    assert!(config.get_provider_config("nonexistent").is_none());
}

#[test]
fn test_update_sets_provider_and_model() {
    let mut config = Config::default();
    config
        .update(
            Some("google".to_string()),
            Some("test-key".to_string()),
            Some("gemini-exp".to_string()),
        )
        .expect("update succeeds");

    assert_eq!(config.default_provider, "google");
    let google = config.get_provider_config("google").expect("present");
    assert_eq!(google.api_key, "test-key");
    assert_eq!(google.model, "gemini-exp");
}

#[test]
fn test_update_rejects_unknown_provider() {
    let mut config = Config::default();
    assert!(
        config
            .update(Some("skynet".to_string()), None, None)
            .is_err()
    );
}
