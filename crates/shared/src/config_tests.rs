use crate::config::AppConfig;

#[test]
fn test_defaults_without_sources() {
    temp_env::with_vars_unset(
        [
            "PUENTE__REMOTE__BASE_URL",
            "PUENTE__LEDGER__REJECT_UNIFORM_CREDITS",
        ],
        || {
            let config = AppConfig::load().unwrap();
            assert_eq!(config.remote.base_url, "http://localhost:8080/rpc");
            assert_eq!(config.remote.timeout_secs, 30);
            assert_eq!(config.cache.namespace_prefix, "puente.overlay");
            assert!(config.ledger.reject_uniform_credits);
            assert_eq!(config.listing.page_size, 20);
        },
    );
}

#[test]
fn test_environment_overrides() {
    temp_env::with_vars(
        [
            ("PUENTE__REMOTE__BASE_URL", Some("https://erp.example.org/rpc")),
            ("PUENTE__LEDGER__REJECT_UNIFORM_CREDITS", Some("false")),
        ],
        || {
            let config = AppConfig::load().unwrap();
            assert_eq!(config.remote.base_url, "https://erp.example.org/rpc");
            assert!(!config.ledger.reject_uniform_credits);
        },
    );
}

#[test]
fn test_default_impl_matches_serde_defaults() {
    let config = AppConfig::default();
    assert_eq!(config.remote.timeout_secs, 30);
    assert_eq!(config.cache.directory.to_str(), Some(".puente/cache"));
    assert!(config.ledger.reject_uniform_credits);
}
