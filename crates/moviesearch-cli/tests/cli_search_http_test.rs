#![allow(clippy::unwrap_used)]
#![allow(missing_docs)]

use std::path::Path;

use assert_cmd::cargo_bin_cmd;
use predicates::prelude::predicate;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PAGE_1: &str = include_str!("../../../fixtures/omdb/search_alien_page1.json");
const PAGE_2: &str = include_str!("../../../fixtures/omdb/search_alien_page2.json");

/// Writes a config pointing the client at `server`.
fn write_config(dir: &Path, server: &MockServer) {
    let content = format!(
        "[omdb]\napi_key = \"test-key\"\nbase_url = \"{}/\"\ntimeout_secs = 5\n",
        server.uri()
    );
    std::fs::write(dir.join("config.toml"), content).unwrap();
}

async fn mount_search_page(server: &MockServer, page: Option<&str>, body: &str, calls: u64) {
    let mock = Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("apikey", "test-key"))
        .and(query_param("s", "alien"));
    let mock = match page {
        Some(page) => mock.and(query_param("page", page)),
        None => mock.and(query_param_is_missing("page")),
    };
    mock.respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(calls)
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_search_stops_when_results_run_out() {
    // Arrange
    let server = MockServer::start().await;
    mount_search_page(&server, None, PAGE_1, 1).await;
    mount_search_page(&server, Some("2"), PAGE_2, 1).await;
    mount_search_page(&server, Some("3"), r#"{"Search": []}"#, 0).await;
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), &server);

    // Act & Assert
    let mut cmd = cargo_bin_cmd!("moviesearch");
    cmd.env_remove("OMDB_API_KEY")
        .env("RUST_LOG", "info")
        .args(["--dir", dir.path().to_str().unwrap()])
        .args(["search", "--query", "alien", "--pages", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Results: 13 of 13 (pages loaded: 2)"))
        .stdout(predicate::str::contains("tt0078748"))
        .stdout(predicate::str::contains("tt0094631"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_search_single_page_by_default() {
    // Arrange
    let server = MockServer::start().await;
    mount_search_page(&server, None, PAGE_1, 1).await;
    mount_search_page(&server, Some("2"), PAGE_2, 0).await;
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), &server);

    // Act & Assert
    let mut cmd = cargo_bin_cmd!("moviesearch");
    cmd.env_remove("OMDB_API_KEY")
        .env("RUST_LOG", "info")
        .args(["--dir", dir.path().to_str().unwrap()])
        .args(["search", "--query", "alien"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Results: 10 of 13 (pages loaded: 1)"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_search_page_failure_exits_non_zero() {
    // Arrange
    let server = MockServer::start().await;
    mount_search_page(&server, None, PAGE_1, 1).await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), &server);

    // Act & Assert
    let mut cmd = cargo_bin_cmd!("moviesearch");
    cmd.env_remove("OMDB_API_KEY")
        .env("RUST_LOG", "info")
        .args(["--dir", dir.path().to_str().unwrap()])
        .args(["search", "--query", "alien", "--pages", "2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("OMDb search page request failed"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_search_plots_fetch_each_movie_once() {
    // Arrange
    let server = MockServer::start().await;
    let page1 = r#"{"Search":[
        {"Title":"Alien","Year":"1979","imdbID":"tt0078748","Type":"movie","Poster":"N/A"},
        {"Title":"Aliens","Year":"1986","imdbID":"tt0090605","Type":"movie","Poster":"N/A"}
    ],"totalResults":"3","Response":"True"}"#;
    let page2 = r#"{"Search":[
        {"Title":"Aliens","Year":"1986","imdbID":"tt0090605","Type":"movie","Poster":"N/A"}
    ],"totalResults":"3","Response":"True"}"#;
    mount_search_page(&server, None, page1, 1).await;
    mount_search_page(&server, Some("2"), page2, 1).await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("plot", "short"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"Plot":"A crew meets a lifeform.","Response":"True"}"#),
        )
        .expect(2)
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), &server);

    // Act & Assert
    let mut cmd = cargo_bin_cmd!("moviesearch");
    cmd.env_remove("OMDB_API_KEY")
        .env("RUST_LOG", "info")
        .args(["--dir", dir.path().to_str().unwrap()])
        .args(["search", "--query", "alien", "--pages", "2", "--plots"])
        .timeout(std::time::Duration::from_secs(30))
        .assert()
        .success()
        .stdout(predicate::str::contains("Results: 3 of 3 (pages loaded: 2)"))
        .stdout(predicate::str::contains("A crew meets a lifeform."));
}
