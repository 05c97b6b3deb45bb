use super::{apply_env, apply_file, apply_table, Settings};

use std::{
    collections::HashMap,
    env, fs,
    time::{SystemTime, UNIX_EPOCH},
};

use shared::domain::{ItemType, TypeFilter};

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn defaults_point_at_local_backend() {
    let settings = Settings::default();
    assert_eq!(settings.server_url, "http://127.0.0.1:8000");
    assert_eq!(settings.log_filter, "info");
    assert_eq!(settings.default_library_type, TypeFilter::All);
    assert!(settings.server_url().is_ok());
}

#[test]
fn file_table_overrides_defaults() {
    let mut settings = Settings::default();
    let table = HashMap::from([
        ("server_url".to_string(), "http://intake.local:9000".to_string()),
        ("library_type".to_string(), "sentence".to_string()),
    ]);

    apply_table(&mut settings, &table);

    assert_eq!(settings.server_url, "http://intake.local:9000");
    assert_eq!(
        settings.default_library_type,
        TypeFilter::Only(ItemType::Sentence)
    );
    assert_eq!(settings.log_filter, "info");
}

#[test]
fn app_prefixed_env_wins_over_legacy_name() {
    let mut settings = Settings::default();
    apply_env(
        &mut settings,
        env_from(&[
            ("DASHBOARD_SERVER_URL", "http://legacy:8000"),
            ("APP__SERVER_URL", "http://preferred:8000"),
            ("APP__LOG_FILTER", "client_core=debug"),
        ]),
    );

    assert_eq!(settings.server_url, "http://preferred:8000");
    assert_eq!(settings.log_filter, "client_core=debug");
}

#[test]
fn unparseable_library_type_keeps_previous_value() {
    let mut settings = Settings::default();
    apply_env(&mut settings, env_from(&[("APP__LIBRARY_TYPE", "PODCAST")]));
    assert_eq!(settings.default_library_type, TypeFilter::All);
}

#[test]
fn server_url_rejects_non_http_schemes() {
    let settings = Settings {
        server_url: "ftp://127.0.0.1/".to_string(),
        ..Settings::default()
    };
    assert!(settings.server_url().is_err());

    let settings = Settings {
        server_url: "127.0.0.1:8000".to_string(),
        ..Settings::default()
    };
    assert!(settings.server_url().is_err());
}

#[test]
fn reads_config_file_from_disk() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let temp_root = env::temp_dir().join(format!("intake_dashboard_config_test_{suffix}"));
    fs::create_dir_all(&temp_root).expect("temp root");
    let path = temp_root.join("dashboard.toml");
    fs::write(
        &path,
        "server_url = \"http://10.0.0.5:8000\"\nlog_filter = \"warn\"\n",
    )
    .expect("write config");

    let mut settings = Settings::default();
    apply_file(&mut settings, &path);

    assert_eq!(settings.server_url, "http://10.0.0.5:8000");
    assert_eq!(settings.log_filter, "warn");

    apply_file(&mut settings, &temp_root.join("missing.toml"));
    assert_eq!(settings.log_filter, "warn");

    fs::remove_dir_all(temp_root).expect("cleanup");
}
