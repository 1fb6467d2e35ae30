//! Integration tests for the command-line interface.
// The cargo_bin function is marked deprecated in favor of cargo_bin! macro,
// but both work correctly. Suppressing until assert_cmd stabilizes the new API.
#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use httpmock::prelude::*;
use predicates::prelude::*;
use rescache::cache::{ExternalResourceCache, ResourceKey};
use std::fs;
use tempfile::TempDir;

/// Command with an isolated home and cache directory.
fn rescache(temp: &TempDir) -> Command {
    let mut cmd = Command::new(cargo_bin("rescache"));
    cmd.env("HOME", temp.path())
        .env_remove("RESCACHE_DIR")
        .env_remove("RUST_LOG")
        .arg("--cache-dir")
        .arg(temp.path().join("cache"));
    cmd
}

fn seeded_cache(temp: &TempDir) -> ExternalResourceCache {
    let cache = ExternalResourceCache::open(temp.path().join("cache")).unwrap();
    cache
        .save_resource(&ResourceKey::new("https://repo/a.jar"), &b"abc"[..], None)
        .unwrap();
    cache
        .save_missing(&ResourceKey::new("https://repo/b.jar"), None)
        .unwrap();
    cache
}

#[test]
fn cli_shows_help() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("rescache"));
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Consistent on-disk cache"));
    Ok(())
}

#[test]
fn cli_shows_version() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("rescache"));
    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    Ok(())
}

#[test]
fn cli_list_empty_cache() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    rescache(&temp)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Cache is empty"));
    Ok(())
}

#[test]
fn cli_list_json() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    seeded_cache(&temp);

    let output = rescache(&temp).args(["list", "--json"]).output()?;
    assert!(output.status.success());

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(parsed.as_array().map(Vec::len), Some(2));
    Ok(())
}

#[test]
fn cli_show_unknown_key_fails() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    rescache(&temp)
        .args(["show", "https://repo/none.jar"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No cached entry"));
    Ok(())
}

#[test]
fn cli_show_entry() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    seeded_cache(&temp);

    rescache(&temp)
        .args(["show", "https://repo/a.jar"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Size: 3 bytes"));
    Ok(())
}

#[test]
fn cli_invalidate_removes_entry() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let cache = seeded_cache(&temp);

    rescache(&temp)
        .args(["invalidate", "https://repo/a.jar"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Invalidated"));

    assert!(cache
        .lookup(&ResourceKey::new("https://repo/a.jar"))?
        .is_none());
    Ok(())
}

#[test]
fn cli_clear_force() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let cache = seeded_cache(&temp);

    rescache(&temp)
        .args(["clear", "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleared 2 entries"));

    assert!(cache.list()?.is_empty());
    Ok(())
}

#[test]
fn cli_stats() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    seeded_cache(&temp);

    rescache(&temp)
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("Total entries: 2"))
        .stdout(predicate::str::contains("Missing: 1"));
    Ok(())
}

#[test]
fn cli_fetch_prints_cached_path() -> Result<(), Box<dyn std::error::Error>> {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/lib.jar");
        then.status(200).body("jar bytes");
    });
    let temp = TempDir::new()?;
    let url = server.url("/lib.jar");

    for _ in 0..2 {
        let output = rescache(&temp).args(["fetch", &url]).output()?;
        assert!(output.status.success());

        let path = String::from_utf8(output.stdout)?;
        assert_eq!(fs::read(path.trim())?, b"jar bytes");
    }
    mock.assert_calls(1);
    Ok(())
}

#[test]
fn cli_fetch_not_found_exits_2() -> Result<(), Box<dyn std::error::Error>> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/gone.jar");
        then.status(404);
    });
    let temp = TempDir::new()?;

    rescache(&temp)
        .args(["fetch", &server.url("/gone.jar")])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Resource not found"));
    Ok(())
}

#[test]
fn cli_rejects_bad_max_age() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    rescache(&temp)
        .args(["fetch", "http://127.0.0.1:9/x", "--max-age", "eventually"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
    Ok(())
}

#[test]
fn cli_rejects_out_of_range_max_age() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    for value in ["9999999999999999d", "-5s"] {
        rescache(&temp)
            .args(["fetch", "http://127.0.0.1:9/x"])
            .arg(format!("--max-age={}", value))
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Error"))
            .stderr(predicate::str::contains("panicked").not());
    }
    Ok(())
}

#[test]
fn cli_reads_config_file() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let config = temp.path().join("config.yml");
    fs::write(&config, "max_age: not-a-ttl\n")?;

    rescache(&temp)
        .arg("--config")
        .arg(&config)
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("max_age"));
    Ok(())
}
