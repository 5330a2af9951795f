use super::*;
use tempfile::tempdir;

fn env() -> EnvSnapshot {
    EnvSnapshot::default()
}

#[test]
fn default_settings_parse_to_defaults() {
    let settings: Settings = toml::from_str(DEFAULT_SETTINGS).unwrap();
    assert!(settings.aws.profile.is_none());
    assert!(settings.aws.region.is_none());
    assert_eq!(settings.retry.max_attempts, 3);
    assert_eq!(settings.retry.delay_secs, 2);
    assert_eq!(settings.retry.timeout_secs, 120);
    assert_eq!(settings.backup.dir, PathBuf::from("quicksight-backup"));
}

#[test]
fn partial_settings_keep_other_defaults() {
    let settings: Settings = toml::from_str(
        r#"
        [aws]
        region = "eu-west-1"

        [retry]
        delay_secs = 10
        "#,
    )
    .unwrap();
    assert_eq!(settings.aws.region.as_deref(), Some("eu-west-1"));
    assert_eq!(settings.retry.delay_secs, 10);
    assert_eq!(settings.retry.max_attempts, 3);
}

#[test]
fn resolve_defaults() {
    let cfg = AppConfig::resolve(Settings::default(), env(), Overrides::default());
    assert!(cfg.profile.is_none());
    assert!(cfg.region.is_none());
    assert_eq!(cfg.log_level, "warn");
    assert!(cfg.color);
    assert!(!cfg.dry_run);
    assert!(!cfg.auto_confirm);
    assert_eq!(cfg.retry.max_attempts, 3);
    assert_eq!(cfg.retry.delay, Duration::from_secs(2));
}

#[test]
fn env_beats_settings_and_flags_beat_env() {
    let mut settings = Settings::default();
    settings.aws.profile = Some("from-file".to_string());
    settings.aws.region = Some("us-west-2".to_string());

    let snapshot = EnvSnapshot {
        aws_profile: Some("from-env".to_string()),
        aws_default_region: Some("eu-central-1".to_string()),
        ..env()
    };

    let cfg = AppConfig::resolve(settings, snapshot.clone(), Overrides::default());
    assert_eq!(cfg.profile.as_deref(), Some("from-env"));
    assert_eq!(cfg.region.as_deref(), Some("eu-central-1"));

    let flags = Overrides {
        profile: Some("from-flag".to_string()),
        region: Some("ap-south-1".to_string()),
        ..Overrides::default()
    };
    let cfg = AppConfig::resolve(Settings::default(), snapshot, flags);
    assert_eq!(cfg.profile.as_deref(), Some("from-flag"));
    assert_eq!(cfg.region.as_deref(), Some("ap-south-1"));
}

#[test]
fn aws_region_beats_default_region() {
    let snapshot = EnvSnapshot {
        aws_region: Some("us-east-2".to_string()),
        aws_default_region: Some("us-east-1".to_string()),
        ..env()
    };
    assert_eq!(snapshot.region(), Some("us-east-2"));
}

#[test]
fn debug_flag_beats_log_level() {
    let snapshot = EnvSnapshot {
        log_level: Some("ERROR".to_string()),
        ..env()
    };
    let cfg = AppConfig::resolve(Settings::default(), snapshot.clone(), Overrides::default());
    assert_eq!(cfg.log_level, "error");

    let flags = Overrides {
        debug: true,
        ..Overrides::default()
    };
    let cfg = AppConfig::resolve(Settings::default(), snapshot, flags);
    assert_eq!(cfg.log_level, "debug");
}

#[test]
fn log_file_precedence() {
    let mut settings = Settings::default();
    settings.logging.file = Some(PathBuf::from("/tmp/file.log"));
    let snapshot = EnvSnapshot {
        log_file: Some("/tmp/env.log".to_string()),
        ..env()
    };
    let cfg = AppConfig::resolve(settings, snapshot, Overrides::default());
    assert_eq!(cfg.log_file, Some(PathBuf::from("/tmp/env.log")));
}

#[test]
fn no_color_from_flag_or_env() {
    let flags = Overrides {
        no_color: true,
        ..Overrides::default()
    };
    assert!(!AppConfig::resolve(Settings::default(), env(), flags).color);

    let snapshot = EnvSnapshot {
        no_color: Some("1".to_string()),
        ..env()
    };
    assert!(!AppConfig::resolve(Settings::default(), snapshot, Overrides::default()).color);
}

#[test]
fn auto_confirm_values() {
    for value in ["1", "true", "TRUE", "yes", "y", "on"] {
        assert!(truthy(Some(value)), "{value}");
    }
    for value in ["0", "false", "no", ""] {
        assert!(!truthy(Some(value)), "{value}");
    }
    assert!(!truthy(None));

    let snapshot = EnvSnapshot {
        auto_confirm: Some("true".to_string()),
        ..env()
    };
    assert!(AppConfig::resolve(Settings::default(), snapshot, Overrides::default()).auto_confirm);
}

#[test]
fn zero_attempts_clamped_to_one() {
    let mut settings = Settings::default();
    settings.retry.max_attempts = 0;
    let cfg = AppConfig::resolve(settings, env(), Overrides::default());
    assert_eq!(cfg.retry.max_attempts, 1);
}

#[test]
fn settings_path_in_awstools_dir() {
    let path = settings_path().unwrap();
    assert!(path.to_string_lossy().contains("awstools"));
    assert!(path.to_string_lossy().ends_with("settings.toml"));
}

#[test]
fn load_missing_file_gives_defaults() {
    let dir = tempdir().unwrap();
    let settings = load_settings_from(&dir.path().join("nope.toml")).unwrap();
    assert_eq!(settings.retry.max_attempts, 3);
}

#[test]
fn init_then_load_roundtrip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("settings.toml");

    assert!(init_settings_file(&path).unwrap());
    assert!(!init_settings_file(&path).unwrap());

    let settings = load_settings_from(&path).unwrap();
    assert_eq!(settings.retry.timeout_secs, 120);
}

#[test]
fn load_invalid_toml_fails() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.toml");
    std::fs::write(&path, "[retry\nmax_attempts = ").unwrap();
    assert!(load_settings_from(&path).is_err());
}

#[test]
fn summary_rows() {
    let flags = Overrides {
        profile: Some("dev".into()),
        dry_run: true,
        ..Overrides::default()
    };
    let cfg = AppConfig::resolve(Settings::default(), env(), flags);
    let rows = cfg.summary();
    assert_eq!(rows[0], ("profile", "dev".to_string()));
    assert_eq!(rows[1], ("region", "-".to_string()));
    assert!(rows.contains(&("retry_delay", "2s".to_string())));
    assert!(rows.contains(&("dry_run", "true".to_string())));
}
