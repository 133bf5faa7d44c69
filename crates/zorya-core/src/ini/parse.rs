//! Line-oriented grammar: comments, `[section]` headers, `::include`
//! directives, `key[:hint] = value` entries, pipe arrays, and multi-line
//! continuation values.

use super::{Ini, IniError, IniResult};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeHint {
    Str,
    Int,
    Float,
    Bool,
    Path,
    Url,
    Date,
    DateTime,
}

impl TypeHint {
    fn parse(s: &str) -> TypeHint {
        match s {
            "int" => TypeHint::Int,
            "float" => TypeHint::Float,
            "bool" => TypeHint::Bool,
            "path" => TypeHint::Path,
            "url" => TypeHint::Url,
            "date" => TypeHint::Date,
            "datetime" => TypeHint::DateTime,
            _ => TypeHint::Str,
        }
    }
}

/// Splits `key`, `key:hint`, `key[]`, or `key[]:hint` into
/// `(name, hint, force_array)`.
fn parse_key_decoration(raw: &str) -> (&str, TypeHint, bool) {
    let (base, force_array) = match raw.strip_suffix("[]") {
        Some(stripped) => (stripped, true),
        None => (raw, false),
    };
    match base.rsplit_once(':') {
        Some((name, hint)) => (name.trim(), TypeHint::parse(hint.trim()), force_array),
        None => (base.trim(), TypeHint::Str, force_array),
    }
}

fn is_continuation(line: &str) -> bool {
    !line.is_empty() && (line.starts_with(' ') || line.starts_with('\t'))
}

pub(super) fn parse_buffer(ini: &mut Ini, text: &str, dir: &Path, depth: usize) -> IniResult<()> {
    let lines: Vec<&str> = text.lines().collect();
    let mut current_section = String::new();
    let mut i = 0usize;

    while i < lines.len() {
        let line_no = i + 1;
        let raw_line = lines[i];
        let trimmed = raw_line.trim_start();

        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
            i += 1;
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix("::include?") {
            ini.handle_include(rest.trim(), dir, depth, true, line_no)?;
            i += 1;
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("::include") {
            ini.handle_include(rest.trim(), dir, depth, false, line_no)?;
            i += 1;
            continue;
        }

        if let Some(header) = trimmed.trim_end().strip_prefix('[') {
            let end = header.find(']').ok_or_else(|| IniError::Syntax {
                line: line_no,
                message: "unterminated section header".to_string(),
            })?;
            current_section = header[..end].trim().to_string();
            i += 1;
            continue;
        }

        let eq_pos = trimmed.find('=').ok_or_else(|| IniError::Syntax {
            line: line_no,
            message: format!("expected '=' in {trimmed:?}"),
        })?;
        let key_part = trimmed[..eq_pos].trim();
        if key_part.is_empty() {
            return Err(IniError::Syntax { line: line_no, message: "empty key".to_string() });
        }
        let (key_name, hint, force_array) = parse_key_decoration(key_part);
        let key_name = key_name.to_string();
        let mut value = trimmed[eq_pos + 1..].trim().to_string();
        i += 1;

        if value.is_empty() {
            let mut continuation = Vec::new();
            while i < lines.len() && is_continuation(lines[i]) {
                continuation.push(lines[i].trim().to_string());
                i += 1;
            }
            if !continuation.is_empty() {
                value = continuation.join("\n");
            }
        }

        ini.add_entry(&current_section, &key_name, &value, hint, force_array, line_no)?;
    }

    Ok(())
}
