#![allow(clippy::unwrap_used)]
#![allow(missing_docs)]

use assert_cmd::cargo_bin_cmd;
use predicates::prelude::predicate;

#[test]
fn test_search_help() {
    // Arrange & Act & Assert
    let mut cmd = cargo_bin_cmd!("moviesearch");
    cmd.args(["search", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--query"))
        .stdout(predicate::str::contains("--pages"));
}

#[test]
fn test_search_missing_query() {
    // Arrange & Act & Assert
    let mut cmd = cargo_bin_cmd!("moviesearch");
    cmd.args(["search"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--query"));
}

#[test]
fn test_search_zero_pages_rejected() {
    // Arrange & Act & Assert
    let mut cmd = cargo_bin_cmd!("moviesearch");
    cmd.args(["search", "--query", "alien", "--pages", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--pages"));
}

#[test]
fn test_search_without_api_key() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();

    // Act & Assert
    let mut cmd = cargo_bin_cmd!("moviesearch");
    cmd.env_remove("OMDB_API_KEY")
        .args(["--dir", dir.path().to_str().unwrap()])
        .args(["search", "--query", "alien"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("OMDb API key is required"));
}

#[test]
fn test_plot_missing_id() {
    // Arrange & Act & Assert
    let mut cmd = cargo_bin_cmd!("moviesearch");
    cmd.args(["plot"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--id"));
}

#[test]
fn test_poster_invalid_url() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("poster.jpg");

    // Act & Assert
    let mut cmd = cargo_bin_cmd!("moviesearch");
    cmd.env("OMDB_API_KEY", "test")
        .args(["--dir", dir.path().to_str().unwrap()])
        .args(["poster", "--url", "not-a-url", "--output"])
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid URL"));
    assert!(!output.exists());
}

#[test]
fn test_invalid_base_url_in_config() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("config.toml"),
        "[omdb]\napi_key = \"k\"\nbase_url = \"::nope\"\n",
    )
    .unwrap();

    // Act & Assert
    let mut cmd = cargo_bin_cmd!("moviesearch");
    cmd.env_remove("OMDB_API_KEY")
        .args(["--dir", dir.path().to_str().unwrap()])
        .args(["plot", "--id", "tt0078748"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid omdb.base_url"));
}

#[test]
fn test_init_writes_config() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();

    // Act
    let mut cmd = cargo_bin_cmd!("moviesearch");
    cmd.args(["--dir", dir.path().to_str().unwrap()])
        .args(["init", "--api-key", "abc123", "--timeout-secs", "5"])
        .assert()
        .success();

    // Assert
    let content = std::fs::read_to_string(dir.path().join("config.toml")).unwrap();
    assert!(content.contains("api_key = \"abc123\""));
    assert!(content.contains("timeout_secs = 5"));
}
