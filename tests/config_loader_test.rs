//! Hierarchical configuration loading.

use std::fs;

use insight_loop::infrastructure::config::{ConfigLoader, CONFIG_DIR};

fn project_with(config_yaml: Option<&str>, local_yaml: Option<&str>) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let config_dir = dir.path().join(CONFIG_DIR);
    fs::create_dir_all(&config_dir).unwrap();
    if let Some(yaml) = config_yaml {
        fs::write(config_dir.join("config.yaml"), yaml).unwrap();
    }
    if let Some(yaml) = local_yaml {
        fs::write(config_dir.join("local.yaml"), yaml).unwrap();
    }
    dir
}

#[test]
fn test_defaults_without_files() {
    let dir = project_with(None, None);
    temp_env::with_vars_unset(["INSIGHT_ITERATION__MAX_ITERATIONS"], || {
        let config = ConfigLoader::load_from_dir(dir.path()).unwrap();
        assert_eq!(config.iteration.max_iterations, 3);
        assert_eq!(config.workflow.data_requests.len(), 4);
        assert_eq!(config.workflow.request_delimiter, "|||");
    });
}

#[test]
fn test_local_overrides_project_file() {
    let dir = project_with(
        Some("iteration:\n  max_iterations: 4\n  quality_threshold: 0.9\n"),
        Some("iteration:\n  max_iterations: 2\n"),
    );
    temp_env::with_vars_unset(["INSIGHT_ITERATION__MAX_ITERATIONS"], || {
        let config = ConfigLoader::load_from_dir(dir.path()).unwrap();
        assert_eq!(config.iteration.max_iterations, 2);
        assert!((config.iteration.quality_threshold - 0.9).abs() < f64::EPSILON);
    });
}

#[test]
fn test_environment_wins() {
    let dir = project_with(Some("iteration:\n  max_iterations: 4\n"), None);
    temp_env::with_vars(
        [
            ("INSIGHT_ITERATION__MAX_ITERATIONS", Some("5")),
            ("INSIGHT_ITERATION__STAGNATION_DELTA", Some("0.1")),
            ("INSIGHT_LOGGING__LEVEL", Some("debug")),
        ],
        || {
            let config = ConfigLoader::load_from_dir(dir.path()).unwrap();
            assert_eq!(config.iteration.max_iterations, 5);
            assert!((config.iteration.stagnation_delta - 0.1).abs() < f64::EPSILON);
            assert_eq!(config.logging.level, "debug");
        },
    );
}

#[test]
fn test_invalid_override_is_rejected() {
    let dir = project_with(Some("iteration:\n  quality_threshold: 1.5\n"), None);
    temp_env::with_vars_unset(["INSIGHT_ITERATION__QUALITY_THRESHOLD"], || {
        let err = ConfigLoader::load_from_dir(dir.path()).unwrap_err();
        assert!(err.to_string().contains("quality_threshold"));
    });
}

#[test]
fn test_explicit_file_replaces_project_files() {
    let dir = project_with(Some("iteration:\n  max_iterations: 4\n"), None);
    let explicit = dir.path().join("custom.yaml");
    fs::write(
        &explicit,
        "judge:\n  provider: scripted\n  model: offline\n  api_key_env: NONE\n",
    )
    .unwrap();

    temp_env::with_vars_unset(["INSIGHT_ITERATION__MAX_ITERATIONS"], || {
        let config = ConfigLoader::load_from_file(&explicit).unwrap();
        assert_eq!(config.iteration.max_iterations, 3);
        assert_eq!(config.judge.provider, "scripted");
    });
}
