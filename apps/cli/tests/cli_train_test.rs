//! Integration tests for `sadgpt prepare`, `train`, `inspect`, and `chat`.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const POSTS: &str = "name,title,text
t3_a,I feel awful ,(20m) nothing feels right
t3_b,Why does it always rain?,It has rained (31f) all week and I am so tired of it.
t3_c,,Nobody answers my messages anymore and the days are long.
";

fn write_posts(temp: &TempDir) -> PathBuf {
    let path = temp.path().join("posts.csv");
    fs::write(&path, POSTS).unwrap();
    path
}

fn sadgpt(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("sadgpt").unwrap();
    cmd.current_dir(dir).env("HOME", dir);
    cmd
}

#[test]
fn test_prepare_writes_corpus() {
    let temp = TempDir::new().unwrap();
    let input = write_posts(&temp);

    sadgpt(temp.path())
        .arg("prepare")
        .arg("--input")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Corpus prepared"));

    let corpus = fs::read_to_string(temp.path().join("posts.train.txt")).unwrap();
    let examples: Vec<&str> = corpus.split('\u{1e}').collect();
    assert_eq!(examples.len(), 3);
    assert_eq!(examples[0], "I feel awful. nothing feels right");
    assert_eq!(examples[1], "Why does it always rain? It has rained  all week and I am so tired of it.");
    assert!(examples[2].starts_with(" Nobody"));
}

#[test]
fn test_prepare_missing_column_fails() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("comments.csv");
    fs::write(&input, "name,title,comment\nt1_a,T,c\n").unwrap();

    sadgpt(temp.path())
        .arg("prepare")
        .arg("--input")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing required column `text`"));
}

#[test]
fn test_train_rejects_zero_batch_size() {
    let temp = TempDir::new().unwrap();
    let input = write_posts(&temp);

    sadgpt(temp.path())
        .args(["train", "--batch-size", "0", "--output", "model", "--input"])
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("batch_size"));

    assert!(!temp.path().join("model").exists());
}

#[test]
fn test_train_inspect_and_chat_with_bigram_service() {
    let temp = TempDir::new().unwrap();
    let input = write_posts(&temp);
    let output = temp.path().join("sadgpt_model");

    sadgpt(temp.path())
        .args(["train", "--block-size", "16", "--epochs", "2", "--batch-size", "4", "--json", "--input"])
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"example_count\": 3"));

    assert!(output.join("bigram_checkpoint.json").exists());
    assert!(output.join("config.json").exists());
    assert!(output.join("training_manifest.json").exists());

    sadgpt(temp.path())
        .arg("inspect")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Service:    bigram"))
        .stdout(predicate::str::contains("epochs=2 batch_size=4"));

    sadgpt(temp.path())
        .args(["chat", "--max-new-tokens", "20", "-M", "How are you?", "--model"])
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("sadgpt>"));
}

#[test]
fn test_train_refuses_existing_model_dir() {
    let temp = TempDir::new().unwrap();
    let input = write_posts(&temp);
    let output = temp.path().join("sadgpt_model");
    fs::create_dir_all(&output).unwrap();
    fs::write(output.join("pytorch_model.bin"), b"old weights").unwrap();

    sadgpt(temp.path())
        .args(["train", "--block-size", "16", "--input"])
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not empty"));

    assert_eq!(fs::read(output.join("pytorch_model.bin")).unwrap(), b"old weights");
}

#[test]
fn test_train_reads_local_config_file() {
    let temp = TempDir::new().unwrap();
    let input = write_posts(&temp);
    fs::write(temp.path().join("sadgpt.toml"), "block_size = 16\nepochs = 1\nseed = 7\n").unwrap();

    sadgpt(temp.path())
        .args(["train", "--output", "model", "--json", "--input"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"random_seed\": 7"))
        .stdout(predicate::str::contains("\"block_size\": 16"));
}

#[test]
fn test_inspect_without_manifest_fails() {
    let temp = TempDir::new().unwrap();

    sadgpt(temp.path())
        .args(["inspect", "missing_model"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No training manifest found"));
}
