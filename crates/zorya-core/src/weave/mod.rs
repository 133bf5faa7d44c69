//! Mutable byte-string type (`Weave`), an interning pool built on top of it
//! (`Tablet`), and a deferred-concatenation rope (`Cord`).
//!
//! A plain `Weave` owns its bytes outright and can be mutated freely. Once
//! a `Weave`'s bytes have been handed to a [`tablet::Tablet`] for interning
//! it is marked [`WeaveFlags::INTERNED`] and [`WeaveFlags::READONLY`]:
//! mutation methods on it return [`WeaveError::Immutable`] instead of
//! touching the bytes, since two interned `Weave`s with equal content are
//! meant to be interchangeable by pointer identity — mutating one out from
//! under that guarantee would be a correctness bug, not a convenience.

pub mod cord;
pub mod interpolate;
pub mod tablet;

use crate::nxh::nxh64;
use std::fmt;

pub use cord::Cord;
pub use tablet::Tablet;

/// Initial capacity hint used by [`Weave::new`] before any content is
/// appended.
pub const INITIAL_CAPACITY: usize = 32;

/// Hand-rolled stand-in for the `bitflags` crate: a handful of mutually
/// orthogonal `u8` masks plus the usual `contains`/`insert`/`union` methods.
/// Not worth a dependency for three bits.
macro_rules! bitflags_lite {
    (pub struct $name:ident: $repr:ty { $(const $flag:ident = $value:expr;)* }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        pub struct $name($repr);

        impl $name {
            $(pub const $flag: $name = $name($value);)*

            pub const EMPTY: $name = $name(0);

            pub fn contains(&self, other: $name) -> bool {
                self.0 & other.0 == other.0
            }

            pub fn insert(&mut self, other: $name) {
                self.0 |= other.0;
            }
        }

        impl std::ops::BitOr for $name {
            type Output = $name;
            fn bitor(self, rhs: $name) -> $name {
                $name(self.0 | rhs.0)
            }
        }
    };
}

bitflags_lite! {
    pub struct WeaveFlags: u8 {
        const INTERNED = 1 << 0;
        const READONLY = 1 << 1;
        const STATIC   = 1 << 2;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeaveError {
    Immutable,
    OutOfBounds { index: usize, len: usize },
}

impl fmt::Display for WeaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeaveError::Immutable => write!(f, "weave: cannot mutate an interned/readonly string"),
            WeaveError::OutOfBounds { index, len } => {
                write!(f, "weave: index {index} out of bounds for a string of length {len}")
            }
        }
    }
}

impl std::error::Error for WeaveError {}

pub type WeaveResult<T> = Result<T, WeaveError>;

/// A growable, flag-tagged byte string.
///
/// Content is tracked with a plain `Vec<u8>`; a trailing NUL is appended
/// on demand by [`Weave::as_cstr_bytes`] for callers that need C-string
/// interop, rather than carried at all times the way the original
/// single-allocation layout did — every other operation is driven off
/// `len()`, so no API needs to scan for a terminator.
#[derive(Debug, Clone)]
pub struct Weave {
    bytes: Vec<u8>,
    flags: WeaveFlags,
}

impl Weave {
    pub fn new() -> Self {
        Weave { bytes: Vec::with_capacity(INITIAL_CAPACITY), flags: WeaveFlags::EMPTY }
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        Weave { bytes: bytes.to_vec(), flags: WeaveFlags::EMPTY }
    }

    pub fn from_str(s: &str) -> Self {
        Weave::from_bytes(s.as_bytes())
    }

    /// A `Weave` over a `'static` literal, flagged so callers know it was
    /// never allocated fresh and never needs freeing beyond the normal
    /// `Drop`.
    pub fn from_static(s: &'static str) -> Self {
        let mut w = Weave::from_bytes(s.as_bytes());
        w.flags.insert(WeaveFlags::STATIC | WeaveFlags::READONLY);
        w
    }

    pub fn dup(&self) -> Self {
        Weave { bytes: self.bytes.clone(), flags: WeaveFlags::EMPTY }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.bytes.capacity()
    }

    pub fn flags(&self) -> WeaveFlags {
        self.flags
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.bytes).ok()
    }

    /// Returns a fresh buffer with a trailing NUL for C-string interop.
    pub fn as_cstr_bytes(&self) -> Vec<u8> {
        let mut v = self.bytes.clone();
        v.push(0);
        v
    }

    fn mutable(&self) -> WeaveResult<()> {
        if self.flags.contains(WeaveFlags::INTERNED) || self.flags.contains(WeaveFlags::READONLY) {
            Err(WeaveError::Immutable)
        } else {
            Ok(())
        }
    }

    pub fn reserve(&mut self, additional: usize) -> WeaveResult<()> {
        self.mutable()?;
        self.bytes.reserve(additional);
        Ok(())
    }

    pub fn shrink_to_fit(&mut self) -> WeaveResult<()> {
        self.mutable()?;
        self.bytes.shrink_to_fit();
        Ok(())
    }

    pub fn clear(&mut self) -> WeaveResult<()> {
        self.mutable()?;
        self.bytes.clear();
        Ok(())
    }

    pub fn truncate(&mut self, len: usize) -> WeaveResult<()> {
        self.mutable()?;
        self.bytes.truncate(len);
        Ok(())
    }

    pub fn append_bytes(&mut self, bytes: &[u8]) -> WeaveResult<()> {
        self.mutable()?;
        self.bytes.extend_from_slice(bytes);
        Ok(())
    }

    pub fn append_str(&mut self, s: &str) -> WeaveResult<()> {
        self.append_bytes(s.as_bytes())
    }

    pub fn append_char(&mut self, c: char) -> WeaveResult<()> {
        self.mutable()?;
        let mut buf = [0u8; 4];
        self.bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
        Ok(())
    }

    pub fn append_weave(&mut self, other: &Weave) -> WeaveResult<()> {
        self.append_bytes(other.as_bytes())
    }

    pub fn prepend_bytes(&mut self, bytes: &[u8]) -> WeaveResult<()> {
        self.mutable()?;
        let mut combined = Vec::with_capacity(bytes.len() + self.bytes.len());
        combined.extend_from_slice(bytes);
        combined.extend_from_slice(&self.bytes);
        self.bytes = combined;
        Ok(())
    }

    /// Splices `bytes` in at `index`, shifting everything from `index`
    /// onward to the right. `index == len()` appends.
    pub fn insert(&mut self, index: usize, bytes: &[u8]) -> WeaveResult<()> {
        self.mutable()?;
        if index > self.bytes.len() {
            return Err(WeaveError::OutOfBounds { index, len: self.bytes.len() });
        }
        self.bytes.splice(index..index, bytes.iter().copied());
        Ok(())
    }

    pub fn substring(&self, start: usize, end: usize) -> Weave {
        let end = end.min(self.bytes.len());
        let start = start.min(end);
        Weave::from_bytes(&self.bytes[start..end])
    }

    /// Like [`Weave::substring`], but `end = None` means "to the end" rather
    /// than requiring the caller to know `len()` up front.
    pub fn slice(&self, start: usize, end: Option<usize>) -> Weave {
        let end = end.unwrap_or(self.bytes.len());
        self.substring(start, end)
    }

    pub fn replace_first(&self, needle: &[u8], replacement: &[u8]) -> Weave {
        match find_bytes(&self.bytes, needle) {
            Some(pos) => {
                let mut out = Vec::with_capacity(self.bytes.len());
                out.extend_from_slice(&self.bytes[..pos]);
                out.extend_from_slice(replacement);
                out.extend_from_slice(&self.bytes[pos + needle.len()..]);
                Weave::from_bytes(&out)
            }
            None => self.dup(),
        }
    }

    pub fn replace_all(&self, needle: &[u8], replacement: &[u8]) -> Weave {
        if needle.is_empty() {
            return self.dup();
        }
        let mut out = Vec::with_capacity(self.bytes.len());
        let mut rest = &self.bytes[..];
        while let Some(pos) = find_bytes(rest, needle) {
            out.extend_from_slice(&rest[..pos]);
            out.extend_from_slice(replacement);
            rest = &rest[pos + needle.len()..];
        }
        out.extend_from_slice(rest);
        Weave::from_bytes(&out)
    }

    pub fn trim(&self) -> Weave {
        let s = String::from_utf8_lossy(&self.bytes);
        Weave::from_str(s.trim())
    }

    pub fn trim_start(&self) -> Weave {
        let s = String::from_utf8_lossy(&self.bytes);
        Weave::from_str(s.trim_start())
    }

    pub fn trim_end(&self) -> Weave {
        let s = String::from_utf8_lossy(&self.bytes);
        Weave::from_str(s.trim_end())
    }

    /// Trims any leading/trailing byte that appears in `chars`, rather than
    /// just whitespace.
    pub fn trim_chars(&self, chars: &str) -> Weave {
        let set: Vec<u8> = chars.bytes().collect();
        let mut start = 0;
        let mut end = self.bytes.len();
        while start < end && set.contains(&self.bytes[start]) {
            start += 1;
        }
        while end > start && set.contains(&self.bytes[end - 1]) {
            end -= 1;
        }
        Weave::from_bytes(&self.bytes[start..end])
    }

    pub fn to_ascii_upper(&self) -> Weave {
        let mut v = self.bytes.clone();
        v.make_ascii_uppercase();
        Weave { bytes: v, flags: WeaveFlags::EMPTY }
    }

    pub fn to_ascii_lower(&self) -> Weave {
        let mut v = self.bytes.clone();
        v.make_ascii_lowercase();
        Weave { bytes: v, flags: WeaveFlags::EMPTY }
    }

    pub fn repeat(&self, n: usize) -> Weave {
        Weave::from_bytes(&self.bytes.repeat(n))
    }

    pub fn reversed(&self) -> Weave {
        let mut v = self.bytes.clone();
        v.reverse();
        Weave { bytes: v, flags: WeaveFlags::EMPTY }
    }

    pub fn split(&self, delimiter: &[u8]) -> Vec<Weave> {
        if delimiter.is_empty() {
            return vec![self.dup()];
        }
        let mut parts = Vec::new();
        let mut rest = &self.bytes[..];
        loop {
            match find_bytes(rest, delimiter) {
                Some(pos) => {
                    parts.push(Weave::from_bytes(&rest[..pos]));
                    rest = &rest[pos + delimiter.len()..];
                }
                None => {
                    parts.push(Weave::from_bytes(rest));
                    break;
                }
            }
        }
        parts
    }

    /// Splits on any single byte in `chars`, unlike [`Weave::split`] which
    /// matches the whole `delimiter` sequence.
    pub fn split_any(&self, chars: &str) -> Vec<Weave> {
        let set: Vec<u8> = chars.bytes().collect();
        if set.is_empty() {
            return vec![self.dup()];
        }
        let mut parts = Vec::new();
        let mut start = 0;
        for (i, &b) in self.bytes.iter().enumerate() {
            if set.contains(&b) {
                parts.push(Weave::from_bytes(&self.bytes[start..i]));
                start = i + 1;
            }
        }
        parts.push(Weave::from_bytes(&self.bytes[start..]));
        parts
    }

    /// Splits on `\n`, `\r\n`, and bare `\r`.
    pub fn lines(&self) -> Vec<Weave> {
        let text = String::from_utf8_lossy(&self.bytes);
        text.lines().map(Weave::from_str).collect()
    }

    pub fn join(parts: &[Weave], delimiter: &[u8]) -> Weave {
        let mut out = Vec::new();
        for (i, part) in parts.iter().enumerate() {
            if i > 0 {
                out.extend_from_slice(delimiter);
            }
            out.extend_from_slice(part.as_bytes());
        }
        Weave::from_bytes(&out)
    }

    /// Like [`Weave::join`], for callers holding plain `&str` parts (the
    /// Rust stand-in for the original's `const char **` array) rather than
    /// already-built `Weave`s.
    pub fn join_cstr(parts: &[&str], delimiter: &str) -> Weave {
        let mut out = String::new();
        for (i, part) in parts.iter().enumerate() {
            if i > 0 {
                out.push_str(delimiter);
            }
            out.push_str(part);
        }
        Weave::from_str(&out)
    }

    /// Builds a `Weave` from pre-assembled [`std::fmt::Arguments`] — Rust has
    /// no variadic `printf`, so callers reach this the way they reach
    /// `format!`: `Weave::format(format_args!("{name}={value}"))`.
    pub fn format(args: fmt::Arguments<'_>) -> Weave {
        Weave::from_str(&fmt::format(args))
    }

    /// Appends pre-assembled [`std::fmt::Arguments`], the mutating sibling
    /// of [`Weave::format`].
    pub fn append_fmt(&mut self, args: fmt::Arguments<'_>) -> WeaveResult<()> {
        self.append_str(&fmt::format(args))
    }

    pub fn find(&self, needle: &[u8]) -> Option<usize> {
        find_bytes(&self.bytes, needle)
    }

    pub fn rfind(&self, needle: &[u8]) -> Option<usize> {
        if needle.is_empty() || needle.len() > self.bytes.len() {
            return None;
        }
        (0..=self.bytes.len() - needle.len())
            .rev()
            .find(|&i| &self.bytes[i..i + needle.len()] == needle)
    }

    /// Index of the first byte that appears in `chars`, or `None` if none do.
    pub fn find_any(&self, chars: &str) -> Option<usize> {
        let set: Vec<u8> = chars.bytes().collect();
        self.bytes.iter().position(|b| set.contains(b))
    }

    /// Index of the first byte that does *not* appear in `chars`, or `None`
    /// if every byte is in the set.
    pub fn find_not(&self, chars: &str) -> Option<usize> {
        let set: Vec<u8> = chars.bytes().collect();
        self.bytes.iter().position(|b| !set.contains(b))
    }

    pub fn contains(&self, needle: &[u8]) -> bool {
        self.find(needle).is_some()
    }

    pub fn starts_with(&self, prefix: &[u8]) -> bool {
        self.bytes.starts_with(prefix)
    }

    pub fn ends_with(&self, suffix: &[u8]) -> bool {
        self.bytes.ends_with(suffix)
    }

    pub fn count_occurrences(&self, needle: &[u8]) -> usize {
        if needle.is_empty() {
            return 0;
        }
        let mut count = 0;
        let mut rest = &self.bytes[..];
        while let Some(pos) = find_bytes(rest, needle) {
            count += 1;
            rest = &rest[pos + needle.len()..];
        }
        count
    }

    pub fn eq_ignore_ascii_case(&self, other: &Weave) -> bool {
        self.bytes.eq_ignore_ascii_case(&other.bytes)
    }

    /// Strict byte-wise ordering, `strcmp`-style.
    pub fn cmp(&self, other: &Weave) -> std::cmp::Ordering {
        self.bytes.cmp(&other.bytes)
    }

    /// Like [`Weave::cmp`] against a plain string, for callers that don't
    /// want to allocate a throwaway `Weave` just to compare.
    pub fn cmp_cstr(&self, s: &str) -> std::cmp::Ordering {
        self.bytes.as_slice().cmp(s.as_bytes())
    }

    pub fn hash(&self, seed: u64) -> u64 {
        nxh64(&self.bytes, seed)
    }
}

impl Default for Weave {
    fn default() -> Self {
        Weave::new()
    }
}

impl PartialEq for Weave {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}
impl Eq for Weave {}

impl fmt::Display for Weave {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.bytes))
    }
}

fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    (0..=haystack.len() - needle.len()).find(|&i| &haystack[i..i + needle.len()] == needle)
}
