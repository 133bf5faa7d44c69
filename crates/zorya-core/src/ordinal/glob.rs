//! Minimal `*`/`?` glob matching, scoped to a single directory component at
//! a time (`src/*.c`, not `**`).

use std::path::Path;

/// Expands `pattern` against the filesystem. If the pattern's directory
/// doesn't exist or nothing matches, returns the pattern itself as a
/// single-element vector — the caller then treats it as a literal path,
/// which surfaces as a clear "file not found" failure later rather than
/// silently vanishing a dependency.
pub fn expand_glob(pattern: &str) -> Vec<String> {
    let path = Path::new(pattern);
    let (dir, file_pattern) = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => (parent, path.file_name()),
        _ => (Path::new("."), path.file_name()),
    };
    let file_pattern = match file_pattern.and_then(|f| f.to_str()) {
        Some(f) => f,
        None => return vec![pattern.to_string()],
    };

    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(_) => return vec![pattern.to_string()],
    };

    let mut matches = Vec::new();
    for entry in entries.flatten() {
        let name = entry.file_name();
        let name = match name.to_str() {
            Some(n) => n,
            None => continue,
        };
        if glob_match(file_pattern, name) {
            let joined = if dir == Path::new(".") {
                name.to_string()
            } else {
                dir.join(name).to_string_lossy().into_owned()
            };
            matches.push(joined);
        }
    }

    if matches.is_empty() {
        vec![pattern.to_string()]
    } else {
        matches.sort();
        matches
    }
}

/// Classic backtracking glob matcher: `*` matches any run of characters,
/// `?` matches exactly one.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    match_from(&p, 0, &t, 0)
}

fn match_from(p: &[char], pi: usize, t: &[char], ti: usize) -> bool {
    if pi == p.len() {
        return ti == t.len();
    }
    match p[pi] {
        '*' => {
            for next_ti in ti..=t.len() {
                if match_from(p, pi + 1, t, next_ti) {
                    return true;
                }
            }
            false
        }
        '?' => ti < t.len() && match_from(p, pi + 1, t, ti + 1),
        c => ti < t.len() && t[ti] == c && match_from(p, pi + 1, t, ti + 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn star_matches_any_suffix() {
        assert!(glob_match("*.c", "main.c"));
        assert!(!glob_match("*.c", "main.cpp"));
    }

    #[test]
    fn question_mark_matches_single_char() {
        assert!(glob_match("a?c", "abc"));
        assert!(!glob_match("a?c", "abbc"));
    }

    #[test]
    fn literal_pattern_without_wildcards_requires_exact_match() {
        assert!(glob_match("exact", "exact"));
        assert!(!glob_match("exact", "exactly"));
    }

    #[test]
    fn expand_glob_on_missing_directory_returns_pattern_literally() {
        let result = expand_glob("definitely/does/not/exist/*.c");
        assert_eq!(result, vec!["definitely/does/not/exist/*.c".to_string()]);
    }
}
