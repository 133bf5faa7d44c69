//! Hierarchical, section/key/value configuration parser with `::include`
//! directives, typed value hints, pipe-delimited arrays, multi-line values,
//! and a post-parse `${var}` interpolation pass.
//!
//! Storage is a [`DaggerTable`] keyed by `section.key` (or bare `key` for
//! the top-level section), with raw text interned through a [`Tablet`] so
//! repeated values — a common `command = ` prefix across a dozen build
//! targets, say — share one allocation.

mod interpolate;
mod parse;

use crate::dagger::DaggerTable;
use crate::weave::Tablet;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;

pub use parse::TypeHint;

/// Bound on `::include` nesting. Exceeding it is reported as
/// [`IniError::IncludeCycle`] even when the includes don't literally form a
/// cycle — a legitimate config is never nested this deep.
pub const MAX_INCLUDE_DEPTH: usize = 16;
/// Bound on `${var}` expansion recursion.
pub const MAX_INTERP_DEPTH: usize = 32;

#[derive(Debug, Clone, PartialEq)]
pub enum IniError {
    Syntax { line: usize, message: String },
    Io { path: String, message: String },
    IncludeCycle { path: String },
    TypeCoercion { full_key: String, hint: TypeHint },
    InterpolationOverflow { full_key: String },
}

impl fmt::Display for IniError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IniError::Syntax { line, message } => write!(f, "ini: line {line}: {message}"),
            IniError::Io { path, message } => write!(f, "ini: {path}: {message}"),
            IniError::IncludeCycle { path } => {
                write!(f, "ini: include depth exceeded at {path}")
            }
            IniError::TypeCoercion { full_key, hint } => {
                write!(f, "ini: {full_key} does not parse as {hint:?}")
            }
            IniError::InterpolationOverflow { full_key } => {
                write!(f, "ini: interpolation recursion limit hit resolving {full_key}")
            }
        }
    }
}

impl std::error::Error for IniError {}

pub type IniResult<T> = Result<T, IniError>;

#[derive(Debug, Clone)]
pub struct IniEntry {
    pub section: String,
    pub key: String,
    pub raw_value: String,
    pub resolved_value: Option<String>,
    pub hint: TypeHint,
    pub is_array: bool,
    pub line: usize,
}

impl IniEntry {
    fn effective(&self) -> &str {
        self.resolved_value.as_deref().unwrap_or(&self.raw_value)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IniStats {
    pub entry_count: usize,
    pub section_count: usize,
    pub include_count: usize,
}

/// A parsed configuration file (plus any files it transitively included).
pub struct Ini {
    entries: DaggerTable<IniEntry>,
    tablet: Tablet,
    sections: Vec<String>,
    include_count: usize,
    last_error: Option<String>,
}

impl Ini {
    pub fn new() -> Self {
        Ini {
            entries: DaggerTable::new(0),
            tablet: Tablet::new(),
            sections: Vec::new(),
            include_count: 0,
            last_error: None,
        }
    }

    pub fn full_key(section: &str, key: &str) -> String {
        if section.is_empty() {
            key.to_string()
        } else {
            format!("{section}.{key}")
        }
    }

    /// Loads and parses `path`, resolving any `::include` directives
    /// relative to its directory, then runs the interpolation pass.
    pub fn load(path: impl AsRef<Path>) -> IniResult<Self> {
        let path = path.as_ref();
        let mut ini = Ini::new();
        let text = std::fs::read_to_string(path).map_err(|e| IniError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let dir = path.parent().unwrap_or_else(|| Path::new(".")).to_path_buf();
        ini.parse_buffer(&text, &dir, 0)?;
        ini.finalize()?;
        Ok(ini)
    }

    /// Parses `text` as if it were a standalone file rooted at `base_dir`
    /// (used to resolve any `::include` directives it contains).
    pub fn load_buffer(text: &str, base_dir: impl AsRef<Path>) -> IniResult<Self> {
        let mut ini = Ini::new();
        ini.parse_buffer(text, base_dir.as_ref(), 0)?;
        ini.finalize()?;
        Ok(ini)
    }

    fn parse_buffer(&mut self, text: &str, dir: &Path, depth: usize) -> IniResult<()> {
        parse::parse_buffer(self, text, dir, depth)
    }

    fn intern_section(&mut self, section: &str) {
        if !self.sections.iter().any(|s| s == section) {
            self.sections.push(section.to_string());
        }
    }

    fn add_entry(
        &mut self,
        section: &str,
        key: &str,
        raw_value: &str,
        hint: TypeHint,
        is_array: bool,
        line: usize,
    ) -> IniResult<()> {
        self.intern_section(section);
        let full_key = Self::full_key(section, key);
        self.tablet.intern_str(raw_value);
        let entry = IniEntry {
            section: section.to_string(),
            key: key.to_string(),
            raw_value: raw_value.to_string(),
            resolved_value: None,
            hint,
            is_array: is_array || raw_value.contains('|'),
            line,
        };
        self.entries
            .set(full_key.as_bytes(), entry, true)
            .map(|_| ())
            .map_err(|e| IniError::Syntax { line, message: e.to_string() })
    }

    fn handle_include(
        &mut self,
        raw_path: &str,
        dir: &Path,
        depth: usize,
        optional: bool,
        line: usize,
    ) -> IniResult<()> {
        if depth + 1 > MAX_INCLUDE_DEPTH {
            return Err(IniError::IncludeCycle { path: raw_path.to_string() });
        }
        let resolved = dir.join(raw_path);
        let text = match std::fs::read_to_string(&resolved) {
            Ok(t) => t,
            Err(e) if optional => {
                let _ = e;
                return Ok(());
            }
            Err(e) => {
                return Err(IniError::Io { path: resolved.display().to_string(), message: e.to_string() });
            }
        };
        self.include_count += 1;
        let child_dir = resolved.parent().unwrap_or(dir).to_path_buf();
        self.parse_buffer(&text, &child_dir, depth + 1).map_err(|e| match e {
            IniError::Syntax { line: inner_line, message } => IniError::Syntax {
                line,
                message: format!("in {}: line {inner_line}: {message}", resolved.display()),
            },
            other => other,
        })
    }

    fn finalize(&mut self) -> IniResult<()> {
        interpolate::resolve_all(self)
    }

    pub fn get(&self, full_key: &str) -> Option<&str> {
        self.entries.get(full_key.as_bytes()).map(IniEntry::effective)
    }

    pub fn get_default<'a>(&'a self, full_key: &str, default: &'a str) -> &'a str {
        self.get(full_key).unwrap_or(default)
    }

    pub fn get_int(&self, full_key: &str) -> IniResult<Option<i64>> {
        match self.get(full_key) {
            None => Ok(None),
            Some(s) => s.trim().parse().map(Some).map_err(|_| IniError::TypeCoercion {
                full_key: full_key.to_string(),
                hint: TypeHint::Int,
            }),
        }
    }

    pub fn get_float(&self, full_key: &str) -> IniResult<Option<f64>> {
        match self.get(full_key) {
            None => Ok(None),
            Some(s) => s.trim().parse().map(Some).map_err(|_| IniError::TypeCoercion {
                full_key: full_key.to_string(),
                hint: TypeHint::Float,
            }),
        }
    }

    pub fn get_bool(&self, full_key: &str) -> Option<bool> {
        let s = self.get(full_key)?.trim().to_ascii_lowercase();
        Some(matches!(s.as_str(), "true" | "yes" | "on" | "1"))
    }

    pub fn get_array(&self, full_key: &str) -> Option<Vec<String>> {
        let entry = self.entries.get(full_key.as_bytes())?;
        let text = entry.effective();
        Some(text.split('|').map(|p| p.trim().to_string()).collect())
    }

    pub fn has(&self, full_key: &str) -> bool {
        self.entries.contains_key(full_key.as_bytes())
    }

    pub fn has_section(&self, section: &str) -> bool {
        self.sections.iter().any(|s| s == section || s.starts_with(&format!("{section}.")))
    }

    pub fn sections(&self) -> &[String] {
        &self.sections
    }

    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        let _ = self.add_entry(section, key, value, TypeHint::Str, false, 0);
    }

    /// Visits every entry as `(section, key, effective_value)`.
    pub fn foreach<F: FnMut(&str, &str, &str) -> bool>(&self, mut f: F) {
        self.entries.foreach(|_, entry| f(&entry.section, &entry.key, entry.effective()));
    }

    pub fn foreach_section<F: FnMut(&str, &str) -> bool>(&self, section: &str, mut f: F) {
        self.entries.foreach(|_, entry| {
            if entry.section == section {
                f(&entry.key, entry.effective())
            } else {
                false
            }
        });
    }

    pub fn stats(&self) -> IniStats {
        IniStats {
            entry_count: self.entries.len(),
            section_count: self.sections.len(),
            include_count: self.include_count,
        }
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Reconstructs an INI-syntax rendering of the current entries, grouped
    /// by section in first-seen order. Intended for debugging, not
    /// guaranteed to byte-for-byte match the original source (comments and
    /// multi-line formatting are not preserved).
    pub fn dump(&self) -> String {
        let mut grouped: HashMap<String, Vec<(String, String)>> = HashMap::new();
        self.entries.foreach(|_, entry| {
            grouped
                .entry(entry.section.clone())
                .or_default()
                .push((entry.key.clone(), entry.effective().to_string()));
            false
        });
        let mut out = String::new();
        for section in &self.sections {
            if !section.is_empty() {
                out.push_str(&format!("[{section}]\n"));
            }
            if let Some(pairs) = grouped.get(section.as_str()) {
                for (key, value) in pairs {
                    out.push_str(&format!("{key} = {value}\n"));
                }
            }
            out.push('\n');
        }
        out
    }

    pub(crate) fn entry(&self, full_key: &str) -> Option<&IniEntry> {
        self.entries.get(full_key.as_bytes())
    }

    pub(crate) fn entry_mut(&mut self, full_key: &str) -> Option<&mut IniEntry> {
        self.entries.get_mut(full_key.as_bytes())
    }

    pub(crate) fn all_full_keys(&self) -> Vec<String> {
        let mut keys = Vec::with_capacity(self.entries.len());
        self.entries.foreach(|_, entry| {
            keys.push(Self::full_key(&entry.section, &entry.key));
            false
        });
        keys
    }
}

impl Default for Ini {
    fn default() -> Self {
        Ini::new()
    }
}

pub(crate) type ResolveCache = HashMap<String, String>;
pub(crate) type Resolving = HashSet<String>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_coercion_and_arrays() {
        let text = "[server]\nport:int = 8080\nrate:float = 0.25\nenabled:bool = yes\nhosts = a.example | b.example | c.example\n";
        let ini = Ini::load_buffer(text, ".").unwrap();
        assert_eq!(ini.get_int("server.port").unwrap(), Some(8080));
        assert_eq!(ini.get_float("server.rate").unwrap(), Some(0.25));
        assert_eq!(ini.get_bool("server.enabled"), Some(true));
        assert_eq!(
            ini.get_array("server.hosts").unwrap(),
            vec!["a.example".to_string(), "b.example".to_string(), "c.example".to_string()]
        );
    }

    #[test]
    fn interpolation_with_defaults_and_cross_section() {
        let text = "[project]\nname = zorya\n\n[paths]\nbase = /opt/${project.name}\ndata = ${base}/data\nlogs = ${undef:-/var/log/${@project:name}}\n";
        let ini = Ini::load_buffer(text, ".").unwrap();
        assert_eq!(ini.get("paths.base"), Some("/opt/zorya"));
        assert_eq!(ini.get("paths.data"), Some("/opt/zorya/data"));
        assert_eq!(ini.get("paths.logs"), Some("/var/log/zorya"));
    }

    #[test]
    fn multiline_values_join_with_newline() {
        let text = "[doc]\ntext =\n    line one\n    line two\n# ignored\n";
        let ini = Ini::load_buffer(text, ".").unwrap();
        assert_eq!(ini.get("doc.text"), Some("line one\nline two"));
    }

    #[test]
    fn runtime_variables_survive_literally() {
        let text = "[build]\ncommand = ${cc} -o ${_target} ${_all_deps}\n";
        let ini = Ini::load_buffer(text, ".").unwrap();
        assert_eq!(ini.get("build.command"), Some("${cc} -o ${_target} ${_all_deps}"));
    }

    #[test]
    #[allow(unsafe_code)]
    fn env_variable_lookup() {
        unsafe {
            std::env::set_var("ZORYA_TEST_VAR", "from-env");
        }
        let text = "[x]\nv = ${env:ZORYA_TEST_VAR}\n";
        let ini = Ini::load_buffer(text, ".").unwrap();
        assert_eq!(ini.get("x.v"), Some("from-env"));
    }

    #[test]
    fn cyclic_interpolation_errors() {
        let text = "[x]\na = ${b}\nb = ${a}\n";
        let result = Ini::load_buffer(text, ".");
        assert!(result.is_err());
    }

    #[test]
    fn has_and_sections_report_structure() {
        let text = "[a]\nk = 1\n[b]\nk = 2\n";
        let ini = Ini::load_buffer(text, ".").unwrap();
        assert!(ini.has_section("a"));
        assert!(ini.has("b.k"));
        assert_eq!(ini.sections(), &["a".to_string(), "b".to_string()]);
    }
}
