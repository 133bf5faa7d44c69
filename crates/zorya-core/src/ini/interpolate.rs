//! Post-parse `${var}` resolution pass.
//!
//! Unlike [`crate::weave::interpolate`], this resolver understands
//! cross-entry references (`${var}` can name another entry's raw value,
//! which may itself contain `${...}`), the `${@SECTION:key}` explicit
//! form, `${env:NAME}`, and `${_name}` passthrough for ORDINAL's runtime
//! variables. Resolution happens once, right after parsing, with a
//! `currently_resolving` set standing in for the recursion-depth counter
//! as the primary cycle guard — a key that (directly or transitively)
//! references itself is an error, not infinite recursion.

use super::{Ini, IniError, IniResult, ResolveCache, Resolving, MAX_INTERP_DEPTH};

pub(super) fn resolve_all(ini: &mut Ini) -> IniResult<()> {
    let keys = ini.all_full_keys();
    let mut cache: ResolveCache = ResolveCache::new();
    let mut resolving: Resolving = Resolving::new();

    for full_key in &keys {
        resolve_full_key(ini, full_key, &mut cache, &mut resolving, 0)?;
    }

    for (full_key, resolved) in cache {
        if let Some(entry) = ini.entry_mut(&full_key) {
            entry.resolved_value = Some(resolved);
        }
    }
    Ok(())
}

fn resolve_full_key(
    ini: &Ini,
    full_key: &str,
    cache: &mut ResolveCache,
    resolving: &mut Resolving,
    depth: usize,
) -> IniResult<Option<String>> {
    if let Some(cached) = cache.get(full_key) {
        return Ok(Some(cached.clone()));
    }
    if resolving.contains(full_key) {
        return Err(IniError::InterpolationOverflow { full_key: full_key.to_string() });
    }
    if depth > MAX_INTERP_DEPTH {
        return Err(IniError::InterpolationOverflow { full_key: full_key.to_string() });
    }

    let entry = match ini.entry(full_key) {
        Some(e) => e,
        None => return Ok(None),
    };
    let raw = entry.raw_value.clone();
    let section = entry.section.clone();

    if !raw.contains('$') {
        cache.insert(full_key.to_string(), raw.clone());
        return Ok(Some(raw));
    }

    resolving.insert(full_key.to_string());
    let expanded = expand_template(ini, &section, &raw, cache, resolving, depth + 1)?;
    resolving.remove(full_key);

    cache.insert(full_key.to_string(), expanded.clone());
    Ok(Some(expanded))
}

fn expand_template(
    ini: &Ini,
    section: &str,
    raw: &str,
    cache: &mut ResolveCache,
    resolving: &mut Resolving,
    depth: usize,
) -> IniResult<String> {
    let bytes = raw.as_bytes();
    let mut out = String::with_capacity(raw.len());
    let mut i = 0usize;

    while i < bytes.len() {
        if bytes[i] != b'$' {
            let start = i;
            while i < bytes.len() && bytes[i] != b'$' {
                i += 1;
            }
            out.push_str(&raw[start..i]);
            continue;
        }

        if i + 1 < bytes.len() && bytes[i + 1] == b'$' {
            out.push('$');
            i += 2;
            continue;
        }

        if i + 1 < bytes.len() && bytes[i + 1] == b'{' {
            if let Some(close) = find_closing_brace(raw, i + 2) {
                let inner = &raw[i + 2..close];
                let (name, default) = split_default(inner);

                if name.starts_with('_') {
                    out.push_str(&raw[i..=close]);
                } else {
                    let resolved = resolve_variable(ini, section, name, cache, resolving, depth)?;
                    let value = match resolved {
                        Some(v) => Some(v),
                        // The default text itself may contain its own
                        // `${...}` (e.g. `${undef:-/var/log/${@project:name}}`),
                        // so it needs the same expansion pass, not a literal
                        // splice.
                        None => match default {
                            Some(d) => Some(expand_template(ini, section, d, cache, resolving, depth)?),
                            None => None,
                        },
                    };
                    if let Some(value) = value {
                        out.push_str(&value);
                    }
                }
                i = close + 1;
                continue;
            } else {
                out.push_str(&raw[i..]);
                break;
            }
        }

        out.push('$');
        i += 1;
    }

    Ok(out)
}

fn resolve_variable(
    ini: &Ini,
    current_section: &str,
    name: &str,
    cache: &mut ResolveCache,
    resolving: &mut Resolving,
    depth: usize,
) -> IniResult<Option<String>> {
    if let Some(rest) = name.strip_prefix('@') {
        return match rest.split_once(':') {
            Some((section, key)) => {
                let full_key = Ini::full_key(section, key);
                resolve_full_key(ini, &full_key, cache, resolving, depth)
            }
            None => Ok(None),
        };
    }

    if let Some(var_name) = name.strip_prefix("env:") {
        return Ok(std::env::var(var_name).ok());
    }

    let mut candidates = Vec::new();
    if !current_section.is_empty() {
        candidates.push(Ini::full_key(current_section, name));
    }
    candidates.push(Ini::full_key("", name));
    for fallback in ["default", "project", "env"] {
        if fallback != current_section {
            candidates.push(Ini::full_key(fallback, name));
        }
    }

    for full_key in candidates {
        if ini.entry(&full_key).is_some() {
            return resolve_full_key(ini, &full_key, cache, resolving, depth);
        }
    }
    Ok(None)
}

fn find_closing_brace(text: &str, from: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0u32;
    let mut i = from;
    while i < bytes.len() {
        if bytes[i] == b'$' && i + 1 < bytes.len() && bytes[i + 1] == b'{' {
            depth += 1;
            i += 2;
            continue;
        }
        if bytes[i] == b'}' {
            if depth == 0 {
                return Some(i);
            }
            depth -= 1;
        }
        i += 1;
    }
    None
}

fn split_default(inner: &str) -> (&str, Option<&str>) {
    match inner.find(":-") {
        Some(pos) => (&inner[..pos], Some(&inner[pos + 2..])),
        None => (inner, None),
    }
}
