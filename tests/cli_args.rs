//! Integration tests for CLI argument handling
//!
//! Runs the binary for flag handling and snapshot inspection, which need no
//! network access.

use std::process::Command;

use tempfile::TempDir;

/// Helper to run the CLI with given args and capture output
fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_storepick"))
        .args(args)
        .env_remove("OPENAI_API_KEY")
        .env_remove("OPENAI_BASE_URL")
        .env("RUST_LOG", "off")
        .output()
        .expect("Failed to execute storepick")
}

#[test]
fn test_help_flag_exits_successfully() {
    let output = run_cli(&["--help"]);
    assert!(
        output.status.success(),
        "Expected --help to exit successfully"
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("storepick"), "Help should mention storepick");
    assert!(stdout.contains("list"), "Help should mention the list command");
    assert!(stdout.contains("export"), "Help should mention the export command");
}

#[test]
fn test_missing_subcommand_fails() {
    let output = run_cli(&[]);
    assert!(!output.status.success());
}

#[test]
fn test_list_without_api_key_fails_with_message() {
    let output = run_cli(&["list"]);
    assert!(!output.status.success(), "Expected list without a key to fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("API key") || stderr.contains("MissingApiKey"),
        "Should explain the missing key: {}",
        stderr
    );
}

#[test]
fn test_zero_ttl_is_rejected() {
    let output = run_cli(&["--ttl-secs", "0", "--api-key", "sk-test", "list"]);
    assert!(!output.status.success());
}

#[test]
fn test_inspect_prints_exported_snapshot() {
    use storepick::snapshot::SnapshotWriter;
    use storepick::StoreRecord;

    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let path = temp_dir.path().join("snapshot.json");
    let records = vec![
        StoreRecord::new("vs_new", "Docs", 200),
        StoreRecord::new("vs_faq", "FAQ", 150),
    ];
    SnapshotWriter::default()
        .export(&records, 2, &path)
        .expect("Export should succeed");

    let output = run_cli(&["inspect", path.to_str().unwrap()]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("1. Docs (vs_new)"), "stdout: {}", stdout);
    assert!(stdout.contains("2. FAQ (vs_faq)"), "stdout: {}", stdout);
    assert!(stdout.contains("2 of 2 stores"), "stdout: {}", stdout);
}

#[test]
fn test_inspect_rejects_unknown_version() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let path = temp_dir.path().join("future.json");
    std::fs::write(
        &path,
        r#"{"latest_resources": [], "selection_metadata": {"version": "9"}}"#,
    )
    .unwrap();

    let output = run_cli(&["inspect", path.to_str().unwrap()]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.to_lowercase().contains("version"), "stderr: {}", stderr);
}

#[cfg(test)]
mod unit_tests {
    //! Unit tests for CLI parsing that don't require running the binary

    use clap::Parser;
    use storepick::cli::{Cli, Command, RuntimeConfig};

    #[test]
    fn test_cli_watch_defaults() {
        let cli = Cli::parse_from(["storepick", "watch"]);
        match cli.command {
            Command::Watch { count, interval } => {
                assert_eq!(count, 4);
                assert_eq!(interval, 300);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_inspect_path() {
        let cli = Cli::parse_from(["storepick", "inspect", "snap.json"]);
        assert!(matches!(cli.command, Command::Inspect { .. }));
    }

    #[test]
    fn test_cli_rejects_non_numeric_count() {
        let result = Cli::try_parse_from(["storepick", "list", "-n", "many"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_runtime_config_defaults() {
        let cli = Cli::parse_from([
            "storepick",
            "--api-key",
            "sk-test",
            "--base-url",
            "http://localhost:1/v1",
            "list",
        ]);
        let config = RuntimeConfig::from_args(&cli.connection).unwrap();
        assert_eq!(config.selector.ttl.as_secs(), 300);
        assert_eq!(config.selector.fetch_timeout.as_secs(), 30);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.base_url, "http://localhost:1/v1");
    }
}
