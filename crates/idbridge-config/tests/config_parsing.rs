use std::time::Duration;
use std::{env, fs};

use idbridge_config::{ConfigError, load_config};
use idbridge_oidc::ProviderKind;

#[test]
fn config_parsing_and_env_overrides_and_validation() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("idbridge.toml");

    let toml_content = r#"
[redirect]
base_url = "https://id.example.com/"

[http]
request_timeout = "5s"
allow_http = false

[http.retry]
max_retries = 2
min_backoff = "100ms"
max_backoff = "2s"

[logging]
level = "debug"

[[providers]]
id = "linkedin"
provider = "linkedin"
client_id = "li-client"
client_secret = "li-secret"
scope = ["openid", "profile", "email"]

[[providers]]
id = "corp"
provider = "generic"
label = "Corporate SSO"
client_id = "corp-client"
issuer_url = "https://sso.example.com"
"#;
    fs::write(&path, toml_content).expect("write toml");

    // 1) Valid config parses
    let cfg = load_config(path.to_str()).expect("should parse config");
    assert_eq!(
        cfg.redirect.base_url.as_ref().map(|u| u.as_str()),
        Some("https://id.example.com/")
    );
    assert_eq!(cfg.http.request_timeout, Duration::from_secs(5));
    assert_eq!(cfg.http.retry.max_retries, 2);
    assert_eq!(cfg.http.retry.min_backoff, Duration::from_millis(100));
    assert_eq!(cfg.http.max_response_size, 1024 * 1024);
    assert_eq!(cfg.logging.level, "debug");
    assert_eq!(cfg.providers.len(), 2);
    assert_eq!(cfg.providers[0].provider, ProviderKind::LinkedIn);
    assert_eq!(cfg.providers[1].display_name(), "Corporate SSO");

    let registry = cfg.registry().expect("registry");
    assert_eq!(registry.ids(), vec!["corp", "linkedin"]);

    // 2) Env override should win over file
    unsafe {
        env::set_var("IDBRIDGE__HTTP__RETRY__MAX_RETRIES", "5");
    }
    let cfg_env = load_config(path.to_str()).expect("should parse config with env overrides");
    assert_eq!(cfg_env.http.retry.max_retries, 5);
    unsafe {
        env::remove_var("IDBRIDGE__HTTP__RETRY__MAX_RETRIES");
    }

    // 3) Generic provider without issuer should error
    let invalid_path = dir.path().join("invalid.toml");
    let invalid_toml = r#"
[[providers]]
id = "corp"
provider = "generic"
client_id = "corp-client"
"#;
    fs::write(&invalid_path, invalid_toml).expect("write invalid toml");
    let err = load_config(invalid_path.to_str()).expect_err("expected validation error");
    assert!(matches!(err, ConfigError::Provider(_)));
    assert!(err.to_string().contains("issuer_url"));

    // 4) Unknown provider kind fails to deserialize
    let unknown_path = dir.path().join("unknown.toml");
    let unknown_toml = r#"
[[providers]]
id = "myspace"
provider = "myspace"
client_id = "x"
"#;
    fs::write(&unknown_path, unknown_toml).expect("write unknown toml");
    let err = load_config(unknown_path.to_str()).expect_err("expected load error");
    assert!(matches!(err, ConfigError::Load(_)));

    // 5) Missing file falls back to defaults
    let missing = dir.path().join("missing.toml");
    let cfg = load_config(missing.to_str()).expect("defaults");
    assert!(cfg.providers.is_empty());
    assert!(cfg.redirect.base_url.is_none());
}
