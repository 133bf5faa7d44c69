//! End-to-end build orchestration scenarios driven through real files on
//! disk, exercising the full `Ordinal::load` → `run` path rather than the
//! in-memory `load_buffer` shortcuts used by the unit tests alongside the
//! implementation.

use std::fs;
use std::path::PathBuf;
use zorya_core::ordinal::Ordinal;

fn scratch_dir(label: &str) -> PathBuf {
    let pid = std::process::id();
    let dir = std::env::temp_dir().join(format!("zorya-ordinal-it-{label}-{pid}"));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn full_chain_builds_dependency_then_target() {
    let dir = scratch_dir("chain");
    let lib_src = dir.join("lib.c");
    let lib_out = dir.join("lib.o");
    let app_out = dir.join("app");
    fs::write(&lib_src, "int lib(){return 0;}").unwrap();

    let ini_text = format!(
        "[project]\nname = demo\n\n[lib]\ntarget = {lib_out}\ndeps = {lib_src}\ncommand = touch ${{_target}}\n\n[app]\ntarget = {app_out}\ndeps = lib\ncommand = touch ${{_target}}\n",
        lib_out = lib_out.display(),
        lib_src = lib_src.display(),
        app_out = app_out.display(),
    );
    let ini_path = dir.join("Ordinal.ini");
    fs::write(&ini_path, ini_text).unwrap();

    let mut ordinal = Ordinal::load(Some(ini_path.as_path())).unwrap();
    let result = ordinal.run(Some("app")).unwrap();
    assert!(result.success);
    assert!(lib_out.exists());
    assert!(app_out.exists());
}

#[test]
fn default_target_prefers_a_build_named_section() {
    let ini_text = "[project]\nname = demo\n\n[clean]\ncommand =\n\n[build]\ncommand =\n";
    let mut ordinal = Ordinal::load_buffer(ini_text, ".").unwrap();
    let result = ordinal.run(None).unwrap();
    assert!(result.success);
    assert_eq!(ordinal.list_targets().len(), 2);
}

#[test]
fn keep_going_runs_independent_targets_despite_one_failure() {
    let dir = scratch_dir("keep-going");
    let ini_text = "[broken]\ncommand = sh -c 'exit 7'\n[fine]\ncommand = true\n";
    let ini_path = dir.join("Ordinal.ini");
    fs::write(&ini_path, ini_text).unwrap();

    let mut ordinal = Ordinal::load(Some(ini_path.as_path())).unwrap();
    let broken_result = ordinal.run(Some("broken"));
    assert!(broken_result.is_err());

    let fine_result = ordinal.run(Some("fine")).unwrap();
    assert!(fine_result.success);
}

#[test]
fn dry_run_never_executes_the_command() {
    use zorya_core::ordinal::OrdinalConfig;

    let dir = scratch_dir("dry-run");
    let marker = dir.join("marker");
    let ini_text = format!("[build]\ncommand = touch {}\n", marker.display());
    let ini_path = dir.join("Ordinal.ini");
    fs::write(&ini_path, ini_text).unwrap();

    let mut ordinal = Ordinal::load(Some(ini_path.as_path())).unwrap();
    ordinal.configure(OrdinalConfig { dry_run: true, ..OrdinalConfig::new() });
    ordinal.run(Some("build")).unwrap();
    assert!(!marker.exists());
}
