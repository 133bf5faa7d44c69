//! Build-DAG orchestrator: reads target sections out of a [`crate::ini`]
//! file, resolves each target's dependencies (expanding globs and runtime
//! variables), and walks the resulting graph depth-first, only re-running
//! a target's command when [`needs_rebuild`](Ordinal::needs_rebuild) says
//! its output is stale.
//!
//! Every section other than `project`, `env`, and their dotted
//! subsections is a candidate target. A section named `build:debug` names
//! the target `debug`; a section named plainly `build` names the target
//! `build`. A target with no `target = ` key is phony: it has no output
//! file, so it is always considered stale.

mod glob;
mod runtime;

use crate::arena::Arena;
use crate::dagger::DaggerTable;
use crate::ini::Ini;
use std::fmt;
use std::path::{Path, PathBuf};

pub use runtime::{detect_arch, detect_nproc, detect_platform};

/// Recursion bound for the DFS build walk; also the trigger for reporting
/// a cycle when a target keeps re-entering itself through transitively
/// long dependency chains rather than a direct cycle.
pub const MAX_RECURSION: usize = 512;
/// How many [`BuildLogRecord`]s [`Ordinal::recent_log`] keeps before
/// dropping the oldest.
pub const LOG_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub enum OrdinalError {
    NoSuchTarget { name: String },
    Circular { name: String },
    CommandFailed { target: String, command: String, exit_code: i32 },
    Glob { pattern: String, message: String },
    Io(String),
}

impl fmt::Display for OrdinalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrdinalError::NoSuchTarget { name } => write!(f, "ordinal: no such target '{name}'"),
            OrdinalError::Circular { name } => write!(f, "ordinal: circular dependency at '{name}'"),
            OrdinalError::CommandFailed { target, command, exit_code } => {
                write!(f, "ordinal: target '{target}' failed ({command}): exit code {exit_code}")
            }
            OrdinalError::Glob { pattern, message } => write!(f, "ordinal: glob '{pattern}': {message}"),
            OrdinalError::Io(message) => write!(f, "ordinal: {message}"),
        }
    }
}

impl std::error::Error for OrdinalError {}

pub type OrdinalResult<T> = Result<T, OrdinalError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetStatus {
    Pending,
    Building,
    UpToDate,
    Rebuilt,
    Failed,
    Skipped,
}

#[derive(Debug, Clone)]
pub struct Target {
    pub name: String,
    pub section: String,
    pub raw_deps: Vec<String>,
    pub resolved_deps: Vec<String>,
    pub command_template: String,
    pub resolved_command: String,
    pub output_file: Option<String>,
    pub status: TargetStatus,
    pub build_time_ms: u64,
    pub is_phony: bool,
    pub visited: bool,
    pub in_stack: bool,
}

#[derive(Debug, Clone, Default)]
pub struct OrdinalConfig {
    pub jobs: usize,
    pub verbose: bool,
    pub dry_run: bool,
    pub keep_going: bool,
    pub silent: bool,
    pub force: bool,
    pub debug: bool,
    pub directory: Option<PathBuf>,
}

impl OrdinalConfig {
    pub fn new() -> Self {
        OrdinalConfig { jobs: detect_nproc(), ..Default::default() }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunResult {
    pub processed: usize,
    pub rebuilt: usize,
    pub up_to_date: usize,
    pub failed: usize,
    pub skipped: usize,
    pub total_time_ms: u64,
    pub success: bool,
}

#[derive(Debug, Clone)]
pub struct BuildLogRecord {
    pub target: String,
    pub transition: String,
    pub detail: String,
}

/// Candidate filenames searched by [`Ordinal::discover`] when no explicit
/// path is given.
const DISCOVERY_CANDIDATES: &[&str] = &["Ordinal/Ordinal.ini", "ordinal/ordinal.ini", "Ordinal.ini"];

pub struct Ordinal {
    targets: DaggerTable<Target>,
    target_order: Vec<String>,
    project_name: String,
    project_version: String,
    config: OrdinalConfig,
    arena: Arena,
    log: Vec<BuildLogRecord>,
    last_error: Option<String>,
    result: RunResult,
}

impl Ordinal {
    /// Builds an orchestrator from an already-parsed INI file, discovering
    /// target sections from it.
    pub fn from_ini(ini: &Ini) -> Self {
        let mut ordinal = Ordinal {
            targets: DaggerTable::new(0),
            target_order: Vec::new(),
            project_name: ini.get("project.name").unwrap_or("").to_string(),
            project_version: ini.get("project.version").unwrap_or("").to_string(),
            config: OrdinalConfig::new(),
            arena: Arena::new(0),
            log: Vec::new(),
            last_error: None,
            result: RunResult::default(),
        };
        ordinal.discover_targets(ini);
        ordinal
    }

    /// Loads `path` (or, if `None`, searches [`DISCOVERY_CANDIDATES`] in
    /// the current directory) as an INI file and builds an orchestrator
    /// from it.
    pub fn load(path: Option<&Path>) -> OrdinalResult<Self> {
        let resolved = match path {
            Some(p) => p.to_path_buf(),
            None => DISCOVERY_CANDIDATES
                .iter()
                .map(PathBuf::from)
                .find(|p| p.exists())
                .ok_or_else(|| OrdinalError::Io("no Ordinal.ini found in current directory".to_string()))?,
        };
        let ini = Ini::load(&resolved).map_err(|e| OrdinalError::Io(e.to_string()))?;
        Ok(Ordinal::from_ini(&ini))
    }

    pub fn load_buffer(text: &str, base_dir: impl AsRef<Path>) -> OrdinalResult<Self> {
        let ini = Ini::load_buffer(text, base_dir).map_err(|e| OrdinalError::Io(e.to_string()))?;
        Ok(Ordinal::from_ini(&ini))
    }

    pub fn configure(&mut self, config: OrdinalConfig) {
        self.config = config;
    }

    fn discover_targets(&mut self, ini: &Ini) {
        for section in ini.sections() {
            if section == "project" || section == "env" {
                continue;
            }
            if section.starts_with("project.") || section.starts_with("env.") {
                continue;
            }

            let name = match section.split_once(':') {
                Some((_, after)) => after.to_string(),
                None => section.clone(),
            };

            let target_key = format!("{section}.target");
            let command_key = format!("{section}.command");
            let deps_key = format!("{section}.deps");

            let output_file = ini.get(&target_key).map(str::to_string);
            let command_template = ini.get(&command_key).unwrap_or("").to_string();
            let raw_deps = ini.get_array(&deps_key).unwrap_or_default().into_iter().filter(|s| !s.is_empty()).collect();

            let target = Target {
                name: name.clone(),
                section: section.clone(),
                raw_deps,
                resolved_deps: Vec::new(),
                command_template,
                resolved_command: String::new(),
                output_file: output_file.clone(),
                is_phony: output_file.is_none(),
                status: TargetStatus::Pending,
                build_time_ms: 0,
                visited: false,
                in_stack: false,
            };

            if !self.targets.contains_key(name.as_bytes()) {
                self.target_order.push(name.clone());
            }
            let _ = self.targets.set(name.as_bytes(), target, true);
        }
    }

    fn ordinal_dir(&self) -> String {
        self.config.directory.as_ref().map(|p| p.display().to_string()).unwrap_or_else(|| ".".to_string())
    }

    fn resolve_deps(&mut self, target: &mut Target) {
        let ordinal_dir = self.ordinal_dir();
        let mut resolved = Vec::new();
        for raw in target.raw_deps.clone() {
            let substituted = runtime::substitute(&raw, target, &ordinal_dir);
            if substituted.contains('*') || substituted.contains('?') {
                resolved.extend(glob::expand_glob(&substituted));
            } else {
                resolved.push(substituted);
            }
        }
        target.resolved_deps = resolved;
    }

    fn resolve_command(&mut self, target: &mut Target) {
        let ordinal_dir = self.ordinal_dir();
        if let Some(output) = target.output_file.clone() {
            target.output_file = Some(runtime::substitute(&output, target, &ordinal_dir));
        }
        target.resolved_command = runtime::substitute(&target.command_template, target, &ordinal_dir);
    }

    fn needs_rebuild(&self, target: &Target) -> bool {
        if self.config.force || target.is_phony {
            return true;
        }
        let output = match &target.output_file {
            Some(o) => o,
            None => return true,
        };
        let output_mtime = match std::fs::metadata(output).and_then(|m| m.modified()) {
            Ok(t) => t,
            Err(_) => return true,
        };
        for dep in &target.resolved_deps {
            if let Some(dep_target) = self.targets.get(dep.as_bytes()) {
                if dep_target.status == TargetStatus::Rebuilt {
                    return true;
                }
                continue;
            }
            if let Ok(dep_mtime) = std::fs::metadata(dep).and_then(|m| m.modified()) {
                if dep_mtime > output_mtime {
                    return true;
                }
            }
        }
        false
    }

    fn execute(&mut self, target: &mut Target) -> OrdinalResult<()> {
        if target.resolved_command.trim().is_empty() {
            target.status = TargetStatus::UpToDate;
            return Ok(());
        }
        self.log(&target.name, "executing", &target.resolved_command);
        if self.config.dry_run {
            target.status = TargetStatus::Skipped;
            self.log(&target.name, "skipped", "dry run");
            return Ok(());
        }

        let start = std::time::Instant::now();
        let outcome = std::process::Command::new("sh").arg("-c").arg(&target.resolved_command).status();
        target.build_time_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(status) if status.success() => {
                target.status = TargetStatus::Rebuilt;
                self.log(&target.name, "rebuilt", &format!("{}ms", target.build_time_ms));
                Ok(())
            }
            Ok(status) => {
                target.status = TargetStatus::Failed;
                let code = status.code().unwrap_or(-1);
                self.log(&target.name, "failed", &format!("exit code {code}"));
                Err(OrdinalError::CommandFailed {
                    target: target.name.clone(),
                    command: target.resolved_command.clone(),
                    exit_code: code,
                })
            }
            Err(e) => {
                target.status = TargetStatus::Failed;
                self.log(&target.name, "failed", &e.to_string());
                Err(OrdinalError::Io(e.to_string()))
            }
        }
    }

    fn log(&mut self, target: &str, transition: &str, detail: &str) {
        if self.config.silent {
            return;
        }
        self.log.push(BuildLogRecord {
            target: target.to_string(),
            transition: transition.to_string(),
            detail: detail.to_string(),
        });
        if self.log.len() > LOG_CAPACITY {
            self.log.remove(0);
        }
    }

    fn build(&mut self, name: &str, depth: usize) -> OrdinalResult<()> {
        if depth > MAX_RECURSION {
            return Err(OrdinalError::Circular { name: name.to_string() });
        }

        // `target` is a clone, not a removed entry: the table keeps the
        // authoritative copy (with `in_stack` flipped on below) for the
        // whole duration of this call, including the recursive `build`
        // calls over its dependencies below. That's what lets a sibling
        // frame reaching the same target mid-recursion observe `in_stack`
        // and report a cycle — taking the entry out of the table instead
        // would make it invisible to exactly the recursive lookup that
        // needs to see it.
        let mut target = match self.targets.get(name.as_bytes()) {
            Some(t) => t.clone(),
            None => return Ok(()),
        };

        if target.in_stack {
            return Err(OrdinalError::Circular { name: name.to_string() });
        }
        if target.visited {
            return Ok(());
        }

        target.in_stack = true;
        target.status = TargetStatus::Building;
        self.targets.set(name.as_bytes(), target.clone(), true).ok();
        self.log(&target.name, "building", "");

        self.resolve_deps(&mut target);

        let mut dependency_failed = false;
        for dep in target.resolved_deps.clone() {
            if !self.targets.contains_key(dep.as_bytes()) {
                continue;
            }
            if let Err(e) = self.build(&dep, depth + 1) {
                if matches!(e, OrdinalError::Circular { .. }) {
                    if let Some(t) = self.targets.get_mut(name.as_bytes()) {
                        t.in_stack = false;
                    }
                    return Err(e);
                }
                dependency_failed = true;
                if !self.config.keep_going {
                    // Stop building siblings the moment one dependency
                    // fails: a later dep's command has real side effects
                    // (it runs a shell command), and `keep_going = false`
                    // means the caller doesn't want those to happen once
                    // the target is already doomed to be skipped.
                    break;
                }
            }
            if let Some(dep_target) = self.targets.get(dep.as_bytes()) {
                if dep_target.status == TargetStatus::Failed {
                    dependency_failed = true;
                }
            }
        }

        self.resolve_command(&mut target);
        target.in_stack = false;

        if dependency_failed {
            target.status = TargetStatus::Skipped;
            target.visited = true;
            self.result.skipped += 1;
            self.result.processed += 1;
            self.log(&target.name, "skipped", "a dependency failed");
            self.targets.set(name.as_bytes(), target, true).ok();
            if !self.config.keep_going {
                return Err(OrdinalError::CommandFailed {
                    target: name.to_string(),
                    command: String::new(),
                    exit_code: -1,
                });
            }
            return Ok(());
        }

        if !self.needs_rebuild(&target) {
            target.status = TargetStatus::UpToDate;
            target.visited = true;
            self.result.up_to_date += 1;
            self.result.processed += 1;
            self.log(&target.name, "up-to-date", "");
            self.targets.set(name.as_bytes(), target, true).ok();
            return Ok(());
        }

        let outcome = self.execute(&mut target);
        target.visited = true;
        self.result.processed += 1;
        match &outcome {
            Ok(()) if target.status == TargetStatus::Rebuilt => self.result.rebuilt += 1,
            Ok(()) => self.result.up_to_date += 1,
            Err(_) => self.result.failed += 1,
        }
        let failed = matches!(outcome, Err(_));
        self.targets.set(name.as_bytes(), target, true).ok();

        if failed && !self.config.keep_going {
            return outcome;
        }
        Ok(())
    }

    fn reset_visit_state(&mut self) {
        let names = self.target_order.clone();
        for name in names {
            if let Some(target) = self.targets.get_mut(name.as_bytes()) {
                target.visited = false;
                target.in_stack = false;
                target.status = TargetStatus::Pending;
            }
        }
    }

    fn default_target(&self) -> OrdinalResult<String> {
        self.target_order
            .iter()
            .find(|n| n.starts_with("build"))
            .or_else(|| self.target_order.first())
            .cloned()
            .ok_or_else(|| OrdinalError::NoSuchTarget { name: "<default>".to_string() })
    }

    /// Builds `target` (or the default target if `None`), returning the
    /// run's aggregate result. A scratch [`Arena`] scope backs the
    /// per-run bookkeeping string work so repeated `run` calls don't leave
    /// growing heap fragmentation behind.
    pub fn run(&mut self, target: Option<&str>) -> OrdinalResult<RunResult> {
        let scope = self.arena.temp_begin();
        self.reset_visit_state();
        self.result = RunResult { success: true, ..Default::default() };
        let start = std::time::Instant::now();

        let name = match target {
            Some(t) => t.to_string(),
            None => self.default_target()?,
        };
        let outcome = self.build(&name, 0);
        self.result.total_time_ms = start.elapsed().as_millis() as u64;
        self.arena.temp_end(scope);

        match outcome {
            Ok(()) => Ok(self.result.clone()),
            Err(e) => {
                self.result.success = false;
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub fn run_many(&mut self, targets: &[&str]) -> OrdinalResult<RunResult> {
        self.reset_visit_state();
        self.result = RunResult { success: true, ..Default::default() };
        let start = std::time::Instant::now();

        let mut first_err = None;
        for name in targets {
            if let Err(e) = self.build(name, 0) {
                if first_err.is_none() {
                    first_err = Some(e);
                }
                if !self.config.keep_going {
                    break;
                }
            }
        }
        self.result.total_time_ms = start.elapsed().as_millis() as u64;

        if let Some(e) = first_err {
            self.result.success = false;
            self.last_error = Some(e.to_string());
            Err(e)
        } else {
            Ok(self.result.clone())
        }
    }

    pub fn get_result(&self) -> &RunResult {
        &self.result
    }

    pub fn list_targets(&self) -> &[String] {
        &self.target_order
    }

    pub fn get_target(&self, name: &str) -> Option<&Target> {
        self.targets.get(name.as_bytes())
    }

    pub fn get_project_name(&self) -> &str {
        &self.project_name
    }

    pub fn get_project_version(&self) -> &str {
        &self.project_version
    }

    pub fn get_var(&self, name: &str) -> Option<String> {
        match name {
            "jobs" => Some(self.config.jobs.to_string()),
            "platform" => Some(detect_platform().to_string()),
            "arch" => Some(detect_arch().to_string()),
            "nproc" => Some(detect_nproc().to_string()),
            _ => None,
        }
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn recent_log(&self) -> &[BuildLogRecord] {
        &self.log
    }

    pub fn print_deps(&self, name: &str) -> Option<String> {
        let target = self.get_target(name)?;
        Some(format!("{}: {}", target.name, target.resolved_deps.join(" ")))
    }

    pub fn print_summary(&self) -> String {
        let r = &self.result;
        format!(
            "processed={} rebuilt={} up_to_date={} failed={} skipped={} time_ms={} success={}",
            r.processed, r.rebuilt, r.up_to_date, r.failed, r.skipped, r.total_time_ms, r.success
        )
    }
}
