//! Integration coverage for configuration loading scenarios that need real
//! files on disk — `::include` precedence in particular can't be exercised
//! through `Ini::load_buffer` alone.

use std::fs;
use zorya_core::ini::Ini;

fn scratch_dir(label: &str) -> std::path::PathBuf {
    let pid = std::process::id();
    let dir = std::env::temp_dir().join(format!("zorya-ini-test-{label}-{pid}"));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn include_precedence_lets_later_file_win() {
    let dir = scratch_dir("include-precedence");
    fs::write(dir.join("defaults.ini"), "[server]\nport:int = 80\n").unwrap();
    fs::write(
        dir.join("config.ini"),
        "::include defaults.ini\n[server]\nport:int = 8080\n",
    )
    .unwrap();

    let ini = Ini::load(dir.join("config.ini")).unwrap();
    assert_eq!(ini.get_int("server.port").unwrap(), Some(8080));
}

#[test]
fn optional_include_of_missing_file_is_silently_skipped() {
    let dir = scratch_dir("optional-include");
    fs::write(dir.join("config.ini"), "::include? missing.ini\n[a]\nk = 1\n").unwrap();

    let ini = Ini::load(dir.join("config.ini")).unwrap();
    assert_eq!(ini.get("a.k"), Some("1"));
}

#[test]
fn required_include_of_missing_file_errors() {
    let dir = scratch_dir("required-include");
    fs::write(dir.join("config.ini"), "::include missing.ini\n[a]\nk = 1\n").unwrap();

    let result = Ini::load(dir.join("config.ini"));
    assert!(result.is_err());
}

#[test]
fn nested_include_chains_resolve_relative_to_their_own_directory() {
    let dir = scratch_dir("nested-include");
    let sub = dir.join("sub");
    fs::create_dir_all(&sub).unwrap();
    fs::write(sub.join("inner.ini"), "[leaf]\nvalue = deep\n").unwrap();
    fs::write(dir.join("middle.ini"), "::include sub/inner.ini\n").unwrap();
    fs::write(dir.join("top.ini"), "::include middle.ini\n").unwrap();

    let ini = Ini::load(dir.join("top.ini")).unwrap();
    assert_eq!(ini.get("leaf.value"), Some("deep"));
}

#[test]
fn whole_file_round_trip_exercises_every_type_hint() {
    let dir = scratch_dir("type-hints");
    let text = "[paths]\nhome:path = /opt/zorya\n[net]\nendpoint:url = https://example.test/api\n\
[sched]\nstart:date = 2026-01-01\nstamp:datetime = 2026-01-01T00:00:00\n";
    fs::write(dir.join("app.ini"), text).unwrap();

    let ini = Ini::load(dir.join("app.ini")).unwrap();
    assert_eq!(ini.get("paths.home"), Some("/opt/zorya"));
    assert_eq!(ini.get("net.endpoint"), Some("https://example.test/api"));
    assert_eq!(ini.get("sched.start"), Some("2026-01-01"));
    assert_eq!(ini.get("sched.stamp"), Some("2026-01-01T00:00:00"));
}
