//! Integration tests for `sadgpt download`.

use assert_cmd::Command;
use mockito::Matcher;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const CREDENTIALS: &str = r#"{"client_id": "id", "secret_token": "secret", "username": "sad_user", "password": "pw"}"#;

#[test]
fn test_download_posts_then_prepare() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("reddit_cred.json"), CREDENTIALS).unwrap();

    let mut server = mockito::Server::new();
    server
        .mock("POST", "/api/v1/access_token")
        .with_body(r#"{"access_token": "tok"}"#)
        .create();
    server
        .mock("GET", "/r/depression/new")
        .match_header("authorization", "Bearer tok")
        .match_query(Matcher::Regex("^limit=100&raw_json=1$".to_string()))
        .with_body(
            r#"{"data": {"children": [
                {"data": {"name": "t3_a", "id": "a", "title": "I feel awful ", "selftext": "(20m) nothing feels right"}},
                {"data": {"name": "t3_b", "id": "b", "title": "Why?", "selftext": "no reason"}}
            ]}}"#,
        )
        .create();
    server
        .mock("GET", "/r/depression/new")
        .match_query(Matcher::UrlEncoded("before".to_string(), "t3_b".to_string()))
        .with_body(r#"{"data": {"children": []}}"#)
        .create();

    Command::cargo_bin("sadgpt")
        .unwrap()
        .current_dir(temp.path())
        .env("HOME", temp.path())
        .args(["download", "--subreddit", "depression", "--output", "posts.csv", "--api-base"])
        .arg(server.url())
        .assert()
        .success()
        .stdout(predicate::str::contains("Download complete"));

    let csv = fs::read_to_string(temp.path().join("posts.csv")).unwrap();
    assert!(csv.starts_with("name,title,text\n"));

    Command::cargo_bin("sadgpt")
        .unwrap()
        .current_dir(temp.path())
        .env("HOME", temp.path())
        .args(["prepare", "--input", "posts.csv"])
        .assert()
        .success();

    let corpus = fs::read_to_string(temp.path().join("posts.train.txt")).unwrap();
    assert_eq!(corpus, "I feel awful. nothing feels right\u{1e}Why? no reason");
}

#[test]
fn test_download_without_credentials_fails() {
    let temp = TempDir::new().unwrap();

    Command::cargo_bin("sadgpt")
        .unwrap()
        .current_dir(temp.path())
        .env("HOME", temp.path())
        .args(["download", "--subreddit", "depression", "--output", "posts.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("reddit_cred.json"));

    assert!(!temp.path().join("posts.csv").exists());
}
