//! Runtime (underscore-prefixed) variable detection and substitution.
//! These are resolved at build time rather than at INI load time because
//! several of them (`_target`, `_all_deps`) depend on a target's resolved
//! dependency list, which doesn't exist until the build graph is walked.

use super::Target;

pub fn detect_platform() -> &'static str {
    if cfg!(target_os = "linux") {
        "linux"
    } else if cfg!(target_os = "macos") {
        "darwin"
    } else if cfg!(target_os = "windows") {
        "windows"
    } else {
        "unknown"
    }
}

pub fn detect_arch() -> &'static str {
    if cfg!(target_arch = "x86_64") {
        "x86_64"
    } else if cfg!(target_arch = "aarch64") {
        "aarch64"
    } else if cfg!(target_arch = "x86") {
        "x86"
    } else {
        "unknown"
    }
}

pub fn detect_nproc() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

/// Replaces every recognized `${_name}` token in `text` with its runtime
/// value. Plain literal substring replacement (no brace-matching needed:
/// the token set is fixed and fully known up front), mirroring the
/// original's `REPLACE_VAR` macro.
pub fn substitute(text: &str, target: &Target, ordinal_dir: &str) -> String {
    let mut out = text.to_string();
    if let Some(output) = &target.output_file {
        out = out.replace("${_target}", output);
    }
    let first_dep = target.resolved_deps.first().map(String::as_str).unwrap_or("");
    out = out.replace("${_first_dep}", first_dep);
    let all_deps = target.resolved_deps.join(" ");
    out = out.replace("${_all_deps}", &all_deps);
    out = out.replace("${_platform}", detect_platform());
    out = out.replace("${_arch}", detect_arch());
    out = out.replace("${_nproc}", &detect_nproc().to_string());
    let cwd = std::env::current_dir().map(|p| p.display().to_string()).unwrap_or_default();
    out = out.replace("${_cwd}", &cwd);
    out = out.replace("${_ordinal_dir}", ordinal_dir);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ordinal::TargetStatus;

    fn sample_target() -> Target {
        Target {
            name: "app".to_string(),
            section: "build".to_string(),
            raw_deps: vec![],
            resolved_deps: vec!["src/a.c".to_string(), "src/b.c".to_string()],
            command_template: String::new(),
            resolved_command: String::new(),
            output_file: Some("bin/app".to_string()),
            status: TargetStatus::Pending,
            build_time_ms: 0,
            is_phony: false,
            visited: false,
            in_stack: false,
        }
    }

    #[test]
    fn substitutes_target_and_deps() {
        let t = sample_target();
        let out = substitute("cc -o ${_target} ${_all_deps}", &t, ".");
        assert_eq!(out, "cc -o bin/app src/a.c src/b.c");
    }

    #[test]
    fn substitutes_first_dep() {
        let t = sample_target();
        let out = substitute("${_first_dep}", &t, ".");
        assert_eq!(out, "src/a.c");
    }

    #[test]
    fn platform_and_arch_are_nonempty() {
        assert!(!detect_platform().is_empty());
        assert!(!detect_arch().is_empty());
        assert!(detect_nproc() >= 1);
    }
}
