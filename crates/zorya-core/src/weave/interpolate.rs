//! Template interpolation (`wtc_interpolate`): `$$` → literal `$`,
//! `${NAME}` → a looked-up value, `${NAME:-DEFAULT}` → the looked-up value
//! or `DEFAULT` if absent. Anything that doesn't parse as one of those
//! forms — an unclosed `${`, or a bare `$` followed by something else — is
//! copied through literally rather than treated as an error, since
//! templates are meant to be forgiving of stray dollar signs.

use super::{Cord, Weave};

/// Expands `template` against `lookup`, which maps a variable name to its
/// replacement text (or `None` if undefined).
pub fn interpolate<F: FnMut(&str) -> Option<String>>(template: &Weave, mut lookup: F) -> Weave {
    let text = template.as_str().unwrap_or_default();
    let bytes = text.as_bytes();
    let mut out = Cord::new();
    let mut i = 0usize;

    while i < bytes.len() {
        if bytes[i] != b'$' {
            let start = i;
            while i < bytes.len() && bytes[i] != b'$' {
                i += 1;
            }
            out.append_str(&text[start..i]);
            continue;
        }

        // bytes[i] == '$'
        if i + 1 < bytes.len() && bytes[i + 1] == b'$' {
            out.append_char('$');
            i += 2;
            continue;
        }

        if i + 1 < bytes.len() && bytes[i + 1] == b'{' {
            match find_closing_brace(text, i + 2) {
                Some(close) => {
                    let inner = &text[i + 2..close];
                    let (name, default) = split_default(inner);
                    let resolved = lookup(name).or_else(|| default.map(|d| d.to_string()));
                    match resolved {
                        Some(value) => out.append_str(&value),
                        None => {}
                    }
                    i = close + 1;
                    continue;
                }
                None => {
                    // Unclosed ${ — copy through literally.
                    out.append_str(&text[i..]);
                    break;
                }
            }
        }

        // Bare '$' not followed by '$' or '{': copy through literally.
        out.append_char('$');
        i += 1;
    }

    out.to_weave()
}

fn find_closing_brace(text: &str, from: usize) -> Option<usize> {
    text.as_bytes()[from..].iter().position(|&b| b == b'}').map(|p| from + p)
}

/// Splits `NAME:-DEFAULT` into `(NAME, Some(DEFAULT))`, or `NAME` into
/// `(NAME, None)`.
fn split_default(inner: &str) -> (&str, Option<&str>) {
    match inner.find(":-") {
        Some(pos) => (&inner[..pos], Some(&inner[pos + 2..])),
        None => (inner, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn substitutes_known_variable() {
        let vars = vars(&[("name", "zorya")]);
        let tpl = Weave::from_str("hello ${name}!");
        let out = interpolate(&tpl, |k| vars.get(k).cloned());
        assert_eq!(out.as_str(), Some("hello zorya!"));
    }

    #[test]
    fn escaped_dollar_is_literal() {
        let tpl = Weave::from_str("cost: $$5");
        let out = interpolate(&tpl, |_| None);
        assert_eq!(out.as_str(), Some("cost: $5"));
    }

    #[test]
    fn default_used_when_undefined() {
        let tpl = Weave::from_str("${missing:-fallback}");
        let out = interpolate(&tpl, |_| None);
        assert_eq!(out.as_str(), Some("fallback"));
    }

    #[test]
    fn defined_value_wins_over_default() {
        let vars = vars(&[("x", "present")]);
        let tpl = Weave::from_str("${x:-fallback}");
        let out = interpolate(&tpl, |k| vars.get(k).cloned());
        assert_eq!(out.as_str(), Some("present"));
    }

    #[test]
    fn unresolved_without_default_is_elided() {
        let tpl = Weave::from_str("[${missing}]");
        let out = interpolate(&tpl, |_| None);
        assert_eq!(out.as_str(), Some("[]"));
    }

    #[test]
    fn unclosed_brace_copied_literally() {
        let tpl = Weave::from_str("broken ${oops");
        let out = interpolate(&tpl, |_| None);
        assert_eq!(out.as_str(), Some("broken ${oops"));
    }

    #[test]
    fn bare_dollar_copied_literally() {
        let tpl = Weave::from_str("price is $5 exactly");
        let out = interpolate(&tpl, |_| None);
        assert_eq!(out.as_str(), Some("price is $5 exactly"));
    }
}
