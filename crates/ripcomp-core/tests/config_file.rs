//! Integration tests for loading and saving the configuration file.
//!
//! These tests share the `RIPCOMP_DIR` environment variable, so they take the
//! crate's test lock for serial execution.

use std::fs;
use std::path::PathBuf;
use ripcomp_core::{paths, BackendKind, Config, SearchCasing};

fn with_test_ripcomp_dir<T>(f: impl FnOnce(&std::path::Path) -> T) -> T {
    let _lock = paths::test_env_lock();
    let dir = tempfile::tempdir().expect("Should create temp dir");
    std::env::set_var("RIPCOMP_DIR", dir.path());

    let result = f(dir.path());

    std::env::remove_var("RIPCOMP_DIR");
    result
}

#[test]
fn test_config_path_follows_ripcomp_dir() {
    with_test_ripcomp_dir(|dir| {
        assert_eq!(paths::config_path(), dir.join("config.toml"));
    });
}

#[test]
fn test_save_then_load_preserves_settings() {
    with_test_ripcomp_dir(|dir| {
        let config = Config {
            backend: BackendKind::GitGrep,
            search_casing: SearchCasing::CaseSensitive,
            context_size: 8,
            ignore_paths: vec![dir.join("vendor")],
            additional_rg_options: vec!["--hidden".to_string()],
            debug: true,
            ..Config::default()
        };

        config
            .save(&paths::config_path())
            .expect("Should save config");
        let loaded = Config::load(&paths::config_path()).expect("Should load config");

        assert_eq!(loaded, config);
    });
}

#[test]
fn test_load_expands_environment_variables() {
    with_test_ripcomp_dir(|dir| {
        fs::write(
            paths::config_path(),
            "additional_paths = [\"$RIPCOMP_DIR/notes\"]\n",
        )
        .expect("Should write config");

        let loaded = Config::load(&paths::config_path()).expect("Should load config");
        assert_eq!(loaded.additional_paths, vec![dir.join("notes")]);
    });
}

#[test]
fn test_load_reports_missing_file_as_io_error() {
    with_test_ripcomp_dir(|_| {
        let err = Config::load(&PathBuf::from("/nonexistent/ripcomp/config.toml")).unwrap_err();
        assert!(matches!(err, ripcomp_core::Error::Io(_)));
    });
}

#[test]
fn test_load_reports_invalid_toml_as_config_error() {
    with_test_ripcomp_dir(|_| {
        fs::write(paths::config_path(), "context_size = \"five\"\n").expect("Should write config");

        let err = Config::load(&paths::config_path()).unwrap_err();
        assert!(matches!(err, ripcomp_core::Error::Config(_)));
    });
}
