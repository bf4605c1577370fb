use super::*;

use std::{collections::HashMap, io::Write};

fn no_env(_: &str) -> Option<String> {
    None
}

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| vars.get(key).cloned()
}

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write config");
    file
}

#[test]
fn defaults_apply_without_file_or_env() {
    let settings = load_settings_with_env(None, None, no_env).expect("settings");
    assert_eq!(settings, Settings::default());
    assert_eq!(settings.api_base_url, "http://localhost:5000/api");
    assert!(settings.client_config().request_timeout.is_none());
}

#[test]
fn missing_fallback_file_is_not_an_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let settings = load_settings_with_env(None, Some(dir.path().join(CONFIG_FILE_NAME)), no_env)
        .expect("settings");
    assert_eq!(settings, Settings::default());
}

#[test]
fn missing_explicit_file_is_an_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let missing = dir.path().join("nope.toml");
    let err = load_settings_with_env(Some(&missing), None, no_env).expect_err("should fail");
    assert!(err.to_string().contains("failed to read config file"));
}

#[test]
fn file_values_override_defaults() {
    let file = write_config(
        "api_base_url = \"http://study.internal:8080/api\"\nrequest_timeout_secs = 30\nconfirm_deletes = false\n",
    );
    let settings = load_settings_with_env(Some(file.path()), None, no_env).expect("settings");
    assert_eq!(settings.api_base_url, "http://study.internal:8080/api");
    assert_eq!(settings.request_timeout_secs, Some(30));
    assert!(!settings.confirm_deletes);
    assert_eq!(
        settings.client_config().request_timeout,
        Some(Duration::from_secs(30))
    );
}

#[test]
fn unknown_keys_are_rejected() {
    let file = write_config("api_url = \"http://x\"\n");
    let err = load_settings_with_env(Some(file.path()), None, no_env).expect_err("should fail");
    assert!(err.to_string().contains("failed to parse config file"));
}

#[test]
fn environment_overrides_file() {
    let file = write_config("api_base_url = \"http://from-file/api\"\n");
    let settings = load_settings_with_env(
        Some(file.path()),
        None,
        env_from(&[
            ("STUDY_DESK_API_URL", "http://from-env/api"),
            ("APP__REQUEST_TIMEOUT_SECS", "5"),
        ]),
    )
    .expect("settings");
    assert_eq!(settings.api_base_url, "http://from-env/api");
    assert_eq!(settings.request_timeout_secs, Some(5));
}

#[test]
fn unparseable_timeout_is_ignored() {
    let settings = load_settings_with_env(
        None,
        None,
        env_from(&[("STUDY_DESK_TIMEOUT_SECS", "soon")]),
    )
    .expect("settings");
    assert_eq!(settings.request_timeout_secs, None);
}

#[test]
fn zero_timeout_means_no_timeout() {
    let settings = Settings {
        request_timeout_secs: Some(0),
        ..Settings::default()
    };
    assert!(settings.client_config().request_timeout.is_none());
}
