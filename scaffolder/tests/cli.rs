//! CLI tests that spawn the scaffolder binary.
//!
//! None of these reach a provider: they cover commands that work offline and
//! the failure paths that stop before any network call.

use std::fs;
use std::process::Command;

use scaffolder::exit_codes;
use scaffolder::io::config::{ScaffoldConfig, load_config, write_config};
use serde_json::Value;

fn scaffolder() -> Command {
    Command::new(env!("CARGO_BIN_EXE_scaffolder"))
}

#[test]
fn catalog_prints_all_tools() {
    let output = scaffolder().arg("catalog").output().expect("scaffolder catalog");
    assert_eq!(output.status.code(), Some(exit_codes::OK));

    let catalog: Value = serde_json::from_slice(&output.stdout).expect("catalog json");
    let names: Vec<&str> = catalog
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|tool| tool["function"]["name"].as_str())
        .collect();
    assert_eq!(
        names,
        vec![
            "read_file",
            "get_file_metadata",
            "list_directory_contents",
            "write_to_file",
            "run_command",
            "create_directory",
        ]
    );
}

#[test]
fn init_config_refuses_to_overwrite_without_force() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("scaffolder.toml");

    let status = scaffolder()
        .arg("init-config")
        .arg("--config")
        .arg(&path)
        .status()
        .expect("init-config");
    assert_eq!(status.code(), Some(exit_codes::OK));
    assert_eq!(load_config(&path).expect("load"), ScaffoldConfig::default());

    let status = scaffolder()
        .arg("init-config")
        .arg("--config")
        .arg(&path)
        .status()
        .expect("init-config again");
    assert_eq!(status.code(), Some(exit_codes::INVALID));

    let status = scaffolder()
        .args(["init-config", "--force", "--config"])
        .arg(&path)
        .status()
        .expect("init-config --force");
    assert_eq!(status.code(), Some(exit_codes::OK));
}

#[test]
fn generate_without_api_key_fails_before_creating_project() {
    let temp = tempfile::tempdir().expect("tempdir");
    let config_path = temp.path().join("scaffolder.toml");
    let mut cfg = ScaffoldConfig::default();
    cfg.provider.api_key_env = "SCAFFOLDER_TEST_UNSET_KEY".to_string();
    write_config(&config_path, &cfg).expect("write config");

    let output = scaffolder()
        .current_dir(temp.path())
        .env_remove("SCAFFOLDER_TEST_UNSET_KEY")
        .args([
            "generate",
            "--name",
            "demo",
            "--type",
            "Flask",
            "--description",
            "demo app",
            "--yes",
            "--config",
        ])
        .arg(&config_path)
        .output()
        .expect("generate");

    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("SCAFFOLDER_TEST_UNSET_KEY"), "stderr: {stderr}");
    assert!(!temp.path().join("projects").exists());
}

#[test]
fn extend_without_summary_fails() {
    let temp = tempfile::tempdir().expect("tempdir");
    let project = temp.path().join("project");
    fs::create_dir_all(&project).expect("mkdir");

    let output = scaffolder()
        .current_dir(temp.path())
        .args(["extend", "--feature", "auth", "--yes", "--dir"])
        .arg(&project)
        .output()
        .expect("extend");

    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no generation summary"), "stderr: {stderr}");
}
