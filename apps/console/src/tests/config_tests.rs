use super::*;

use std::{
    env,
    time::{SystemTime, UNIX_EPOCH},
};

fn temp_config(contents: &str) -> std::path::PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let dir = env::temp_dir().join(format!("cluster_console_config_test_{suffix}"));
    fs::create_dir_all(&dir).expect("temp dir");
    let path = dir.join("console.toml");
    fs::write(&path, contents).expect("write config");
    path
}

#[test]
fn defaults_match_the_console_timings() {
    let settings = Settings::default();
    assert_eq!(settings.reload_interval(), Duration::from_millis(30_000));
    assert_eq!(settings.redirect_delay(), Duration::from_millis(1_000));
    assert!(settings.credentials().is_empty());
}

#[test]
fn file_values_override_defaults() {
    let path = temp_config(
        r#"
base_url = "https://console.internal"
user_id = "alice"
reload_interval_ms = "5000"
redirect_delay_ms = "not-a-number"
"#,
    );

    let mut settings = Settings::default();
    let raw = fs::read_to_string(&path).expect("read");
    let file_cfg: HashMap<String, String> = toml::from_str(&raw).expect("toml");
    apply_file(&mut settings, &file_cfg);

    assert_eq!(settings.base_url, "https://console.internal");
    assert_eq!(settings.user_id.as_deref(), Some("alice"));
    assert_eq!(settings.access_token, None);
    assert_eq!(settings.reload_interval_ms, 5_000);
    assert_eq!(settings.redirect_delay_ms, 1_000);

    fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
}

#[test]
fn environment_overrides_file_values() {
    let mut settings = Settings {
        base_url: "https://from-file".into(),
        ..Settings::default()
    };
    let env: HashMap<&str, &str> = HashMap::from([
        ("CONSOLE_BASE_URL", "https://console-var"),
        ("APP__BASE_URL", "https://app-var"),
        ("CONSOLE_ACCESS_TOKEN", "Bearer xyz"),
        ("APP__REDIRECT_DELAY_MS", "250"),
    ]);

    apply_env(&mut settings, |key| env.get(key).map(|v| v.to_string()));

    assert_eq!(settings.base_url, "https://app-var");
    assert_eq!(settings.access_token.as_deref(), Some("Bearer xyz"));
    assert_eq!(settings.redirect_delay(), Duration::from_millis(250));
    assert_eq!(settings.reload_interval_ms, 30_000);
}

#[test]
fn unquoted_integers_are_accepted() {
    let path = temp_config(
        r#"
base_url = "https://console.internal"
reload_interval_ms = 5000
redirect_delay_ms = -1
access_token = true
"#,
    );

    let raw = fs::read_to_string(&path).expect("read");
    let table: HashMap<String, toml::Value> = toml::from_str(&raw).expect("toml");
    let mut settings = Settings::default();
    apply_file(&mut settings, &scalar_entries(table));

    assert_eq!(settings.base_url, "https://console.internal");
    assert_eq!(settings.reload_interval(), Duration::from_millis(5_000));
    assert_eq!(settings.redirect_delay_ms, 1_000);
    assert_eq!(settings.access_token, None);

    fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
}

#[test]
fn load_settings_reads_integer_timings() {
    let path = temp_config("reload_interval_ms = 5000\nredirect_delay_ms = 250\n");

    let settings = load_settings(&path).expect("load");
    let env_overrides = ["APP__RELOAD_INTERVAL_MS", "APP__REDIRECT_DELAY_MS"]
        .iter()
        .any(|key| env::var(key).is_ok());
    if !env_overrides {
        assert_eq!(settings.reload_interval_ms, 5_000);
        assert_eq!(settings.redirect_delay_ms, 250);
    }

    fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
}

#[test]
fn missing_file_falls_back_to_defaults() {
    let path = env::temp_dir().join("cluster_console_missing_dir/console.toml");
    let settings = load_settings(&path).expect("load");
    assert_eq!(settings.reload_interval_ms, Settings::default().reload_interval_ms);
}

#[test]
fn malformed_file_is_an_error() {
    let path = temp_config("base_url = [1, 2");
    let err = load_settings(&path).expect_err("must fail");
    assert!(err.to_string().contains("invalid config file"));
    fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
}
