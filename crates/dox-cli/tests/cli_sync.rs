//! End-to-end `dox sync` against a mocked HTTP server: config on disk,
//! real subprocess, real (mocked) network call, real manifest written
//! back to disk.

mod common;

use common::dox_cmd_with_config;
use predicates::prelude::*;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn sync_downloads_a_direct_url_source_and_regenerates_the_manifest() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/llms.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("# React\n\nDocs.\n"))
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let config_path = dir.path().join("dox.toml");
    std::fs::write(
        &config_path,
        format!(
            "output = \".dox\"\n\n[sources.react]\nurl = \"{}/llms.txt\"\nfilename = \"llms.txt\"\n",
            mock_server.uri()
        ),
    )
    .expect("write config");

    dox_cmd_with_config(dir.path(), &config_path)
        .arg("sync")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 sources, 1 downloaded"));

    let cached = dir.path().join(".dox/react/llms.txt");
    assert_eq!(std::fs::read_to_string(&cached).expect("read"), "# React\n\nDocs.\n");
    assert!(dir.path().join(".dox/manifest.json").exists());
    assert!(dir.path().join(".dox/.dox.lock").exists());

    dox_cmd_with_config(dir.path(), &config_path)
        .args(["list", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"react\""));
}

#[tokio::test]
async fn sync_second_run_is_skipped_via_conditional_fetch() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/llms.txt"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("# React\n")
                .insert_header("ETag", "\"v1\""),
        )
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let config_path = dir.path().join("dox.toml");
    std::fs::write(
        &config_path,
        format!(
            "output = \".dox\"\n\n[sources.react]\nurl = \"{}/llms.txt\"\nfilename = \"llms.txt\"\n",
            mock_server.uri()
        ),
    )
    .expect("write config");

    dox_cmd_with_config(dir.path(), &config_path)
        .arg("sync")
        .assert()
        .success();

    // The first mock above is exhausted after one hit; this one answers
    // every subsequent request with 304, proving the second sync sends
    // `If-None-Match` rather than re-downloading.
    Mock::given(method("GET"))
        .and(path("/llms.txt"))
        .respond_with(ResponseTemplate::new(304))
        .mount(&mock_server)
        .await;

    dox_cmd_with_config(dir.path(), &config_path)
        .arg("sync")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 skipped"));
}

#[tokio::test]
async fn sync_dry_run_reports_work_without_touching_disk() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/llms.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("# React\n"))
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let config_path = dir.path().join("dox.toml");
    std::fs::write(
        &config_path,
        format!(
            "output = \".dox\"\n\n[sources.react]\nurl = \"{}/llms.txt\"\nfilename = \"llms.txt\"\n",
            mock_server.uri()
        ),
    )
    .expect("write config");

    dox_cmd_with_config(dir.path(), &config_path)
        .args(["sync", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 downloaded"));

    assert!(!dir.path().join(".dox/react/llms.txt").exists());
}
