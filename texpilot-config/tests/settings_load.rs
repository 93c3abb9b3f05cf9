use std::{fs, path::PathBuf};

use tempfile::TempDir;
use texpilot_config::{Settings, SettingsLoader};

/// Write a YAML file in a temp dir and return its path.
fn write_yaml(tmp: &TempDir, name: &str, yaml: &str) -> PathBuf {
    let p = tmp.path().join(name);
    fs::write(&p, yaml).expect("write yaml");
    p
}

#[test]
fn loads_settings_from_a_file_with_env_placeholders() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(
        &tmp,
        "texpilot.yaml",
        r#"
api_key: "${TEXPILOT_TEST_KEY}"
model: "claude-3-haiku-20240307"
"#,
    );

    temp_env::with_var("TEXPILOT_TEST_KEY", Some("sk-ant-api03-abc"), || {
        let settings = SettingsLoader::new()
            .with_file(&p)
            .load()
            .expect("load settings");
        assert_eq!(settings.require_api_key().unwrap(), "sk-ant-api03-abc");
        assert_eq!(settings.model_or_default(), "claude-3-haiku-20240307");
    });
}

#[test]
fn a_missing_file_is_tolerated() {
    let settings = SettingsLoader::new()
        .with_file("/definitely/not/here/texpilot.yaml")
        .load()
        .expect("env-only load");
    assert!(settings.api_key.is_none());
    assert_eq!(settings.model_or_default(), "claude-3-haiku-20240307");
}

#[test]
fn store_round_trips_and_rejects_bad_keys() {
    let tmp = TempDir::new().unwrap();
    let p = tmp.path().join("texpilot.yaml");

    let bad = Settings {
        api_key: Some("not-a-key".into()),
        model: None,
    };
    assert!(bad.store(&p).is_err());
    assert!(!p.exists());

    let good = Settings {
        api_key: Some("sk-ant-api03-abc".into()),
        model: Some("claude-3-5-sonnet-20240620".into()),
    };
    good.store(&p).expect("store settings");

    let back = SettingsLoader::new().with_file(&p).load().expect("reload");
    assert_eq!(back.require_api_key().unwrap(), "sk-ant-api03-abc");
    assert_eq!(back.model_or_default(), "claude-3-5-sonnet-20240620");
}
