//! String interning pool: canonicalizes byte content so that two interns
//! of equal bytes always return the same pointer.

use super::Weave;
use crate::dagger::DaggerTable;

/// An interning pool. Every [`Tablet::intern`] call for equal byte content
/// returns the same `&Weave`, so callers can compare interned strings by
/// pointer instead of by content.
pub struct Tablet {
    table: DaggerTable<Box<Weave>>,
    count: usize,
}

impl Tablet {
    pub fn new() -> Self {
        Tablet { table: DaggerTable::new(0), count: 0 }
    }

    /// Interns `bytes`, returning a stable reference. Calling this again
    /// with byte-identical content returns a reference to the exact same
    /// allocation (verify with `std::ptr::eq`), never a fresh copy.
    pub fn intern(&mut self, bytes: &[u8]) -> &Weave {
        if !self.table.contains_key(bytes) {
            let mut w = Weave::from_bytes(bytes);
            w.flags.insert(super::WeaveFlags::INTERNED | super::WeaveFlags::READONLY);
            self.table.set(bytes, Box::new(w), false).expect("key absence just checked");
            self.count += 1;
        }
        self.table.get(bytes).expect("just inserted or already present")
    }

    pub fn intern_str(&mut self, s: &str) -> &Weave {
        self.intern(s.as_bytes())
    }

    pub fn lookup(&self, bytes: &[u8]) -> Option<&Weave> {
        self.table.get(bytes).map(|b| b.as_ref())
    }

    pub fn contains(&self, bytes: &[u8]) -> bool {
        self.table.contains_key(bytes)
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Approximate bytes held across every interned string (content only,
    /// not allocator overhead).
    pub fn memory(&self) -> usize {
        let mut total = 0usize;
        self.table.foreach(|_, w| {
            total += w.len();
            false
        });
        total
    }
}

impl Default for Tablet {
    fn default() -> Self {
        Tablet::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_equal_content_shares_identity() {
        let mut t = Tablet::new();
        let a = t.intern(b"shared") as *const Weave;
        let b = t.intern(b"shared") as *const Weave;
        assert_eq!(a, b);
    }

    #[test]
    fn interning_distinct_content_differs() {
        let mut t = Tablet::new();
        let a = t.intern(b"one") as *const Weave;
        let b = t.intern(b"two") as *const Weave;
        assert_ne!(a, b);
    }

    #[test]
    fn interned_strings_are_readonly() {
        let mut t = Tablet::new();
        let w = t.intern(b"frozen");
        assert!(w.flags().contains(super::super::WeaveFlags::READONLY));
    }

    #[test]
    fn count_tracks_unique_interns() {
        let mut t = Tablet::new();
        t.intern(b"a");
        t.intern(b"b");
        t.intern(b"a");
        assert_eq!(t.count(), 2);
    }
}
