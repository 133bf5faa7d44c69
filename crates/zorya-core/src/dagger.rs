//! Hash table combining Robin Hood linear probing with a cuckoo fallback,
//! bounding worst-case probe length without abandoning the cache-friendly
//! behavior of open addressing.
//!
//! Every key carries two independent digests from [`crate::nxh`]: a primary
//! one used for the Robin Hood chain, and an alternate one used only once an
//! insertion's probe-sequence length (PSL) exceeds [`PSL_THRESHOLD`]. That
//! second chain is the "cuckoo" fallback: an entry placed there is tagged
//! `in_cuckoo` and is never evicted by ordinary Robin Hood displacement, so
//! a lookup that walks off the end of a long primary chain can jump
//! straight to the alternate chain instead of degrading to O(n).

use crate::nxh::{nxh64, nxh64_alt};
use std::fmt;

/// PSL at which an insertion gives up on the Robin Hood chain and tries the
/// alternate-hash (cuckoo) chain instead.
pub const PSL_THRESHOLD: u32 = 16;
/// Upper bound on displacement steps spent on the cuckoo chain before an
/// insertion reports [`DaggerError::TableFull`] and asks the caller to grow
/// the table.
pub const CUCKOO_CYCLE_LIMIT: usize = 500;
/// Smallest capacity a table will ever have, regardless of the capacity
/// requested at construction.
pub const MIN_CAPACITY: usize = 16;
/// Default capacity used by [`DaggerTable::new`] when given `0`.
pub const DEFAULT_CAPACITY: usize = 64;
/// Table grows when `count` reaches this fraction of `capacity`.
pub const LOAD_FACTOR: f64 = 0.75;

#[derive(Debug, Clone, PartialEq)]
pub enum DaggerError {
    EmptyKey,
    AlreadyExists,
    TableFull,
    OutOfMemory,
}

impl fmt::Display for DaggerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DaggerError::EmptyKey => write!(f, "dagger: key must not be empty"),
            DaggerError::AlreadyExists => write!(f, "dagger: key already exists"),
            DaggerError::TableFull => write!(f, "dagger: table full, resize required"),
            DaggerError::OutOfMemory => write!(f, "dagger: allocation failed during resize"),
        }
    }
}

impl std::error::Error for DaggerError {}

pub type DaggerResult<T> = Result<T, DaggerError>;

struct Entry<V> {
    hash_primary: u64,
    hash_alt: u64,
    key: Box<[u8]>,
    value: V,
    psl: u32,
    in_cuckoo: bool,
}

enum InsertAttempt<V> {
    Inserted,
    Replaced,
    AlreadyExists,
    Full(Entry<V>),
}

/// Running counters exposed via [`DaggerTable::stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DaggerStats {
    pub count: usize,
    pub capacity: usize,
    pub max_psl: u32,
    pub cuckoo_count: usize,
    pub resize_count: usize,
    pub probe_sum: u64,
    pub lookup_count: u64,
}

impl DaggerStats {
    pub fn average_probe_length(&self) -> f64 {
        if self.lookup_count == 0 {
            0.0
        } else {
            self.probe_sum as f64 / self.lookup_count as f64
        }
    }
}

/// A Robin Hood / cuckoo hash table keyed by raw byte slices, generic over
/// an owned value type `V`.
pub struct DaggerTable<V> {
    slots: Vec<Option<Entry<V>>>,
    mask: usize,
    count: usize,
    seed_primary: u64,
    seed_alt: u64,
    value_destructor: Option<Box<dyn FnMut(V)>>,
    stats: DaggerStats,
}

impl<V> DaggerTable<V> {
    /// Creates a table with room for at least `initial_capacity` entries
    /// before it resizes (rounded up to a power of two, floor
    /// [`MIN_CAPACITY`]; `0` means [`DEFAULT_CAPACITY`]).
    pub fn new(initial_capacity: usize) -> Self {
        Self::with_seeds(initial_capacity, crate::nxh::SEED_DEFAULT, crate::nxh::SEED_ALT)
    }

    /// Like [`DaggerTable::new`] but with explicit hash seeds, useful when a
    /// caller needs reproducible-but-distinct tables (e.g. tests comparing
    /// two tables for key-set equality without cross-table hash collisions
    /// masking a bug).
    pub fn with_seeds(initial_capacity: usize, seed_primary: u64, seed_alt: u64) -> Self {
        let capacity = if initial_capacity == 0 { DEFAULT_CAPACITY } else { initial_capacity }
            .next_power_of_two()
            .max(MIN_CAPACITY);
        let slots = (0..capacity).map(|_| None).collect();
        DaggerTable {
            slots,
            mask: capacity - 1,
            count: 0,
            seed_primary,
            seed_alt,
            value_destructor: None,
            stats: DaggerStats { capacity, ..Default::default() },
        }
    }

    /// Registers a callback invoked with the old value whenever one is
    /// overwritten by [`DaggerTable::set`] with `allow_replace = true`, or
    /// dropped wholesale by [`DaggerTable::clear`]. `remove` returns
    /// ownership of the value to the caller instead, since there the caller
    /// is already taking responsibility for it.
    pub fn set_value_destructor(&mut self, f: impl FnMut(V) + 'static) {
        self.value_destructor = Some(Box::new(f));
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn capacity(&self) -> usize {
        self.mask + 1
    }

    pub fn stats(&self) -> DaggerStats {
        DaggerStats { count: self.count, capacity: self.capacity(), ..self.stats }
    }

    fn load_factor_exceeded(&self) -> bool {
        (self.count + 1) as f64 > LOAD_FACTOR * self.capacity() as f64
    }

    /// Inserts `key -> value`. Returns `Ok(true)` if this created a new
    /// entry, `Ok(false)` if it replaced an existing one (only possible
    /// when `allow_replace` is set), or `Err(AlreadyExists)` when the key
    /// is already present and `allow_replace` is false.
    pub fn set(&mut self, key: &[u8], value: V, allow_replace: bool) -> DaggerResult<bool> {
        if key.is_empty() {
            return Err(DaggerError::EmptyKey);
        }
        if self.load_factor_exceeded() {
            self.grow()?;
        }

        let hash_primary = nxh64(key, self.seed_primary);
        let hash_alt = nxh64_alt(key, self.seed_alt);
        let mut candidate = Entry {
            hash_primary,
            hash_alt,
            key: key.to_vec().into_boxed_slice(),
            value,
            psl: 0,
            in_cuckoo: false,
        };

        loop {
            match self.insert_robin_hood(candidate, allow_replace) {
                InsertAttempt::Inserted => return Ok(true),
                InsertAttempt::Replaced => return Ok(false),
                InsertAttempt::AlreadyExists => return Err(DaggerError::AlreadyExists),
                InsertAttempt::Full(mut leftover) => {
                    self.grow()?;
                    leftover.psl = 0;
                    leftover.in_cuckoo = false;
                    candidate = leftover;
                }
            }
        }
    }

    fn insert_robin_hood(&mut self, mut candidate: Entry<V>, allow_replace: bool) -> InsertAttempt<V> {
        let mask = self.mask;
        let mut slot_idx = candidate.hash_primary as usize & mask;

        loop {
            match &mut self.slots[slot_idx] {
                None => {
                    self.count += 1;
                    self.stats.max_psl = self.stats.max_psl.max(candidate.psl);
                    self.slots[slot_idx] = Some(candidate);
                    return InsertAttempt::Inserted;
                }
                Some(occupant)
                    if occupant.hash_primary == candidate.hash_primary
                        && occupant.key.as_ref() == candidate.key.as_ref() =>
                {
                    if allow_replace {
                        let old = std::mem::replace(&mut occupant.value, candidate.value);
                        if let Some(d) = &mut self.value_destructor {
                            d(old);
                        }
                        return InsertAttempt::Replaced;
                    }
                    return InsertAttempt::AlreadyExists;
                }
                Some(occupant) => {
                    if !occupant.in_cuckoo && candidate.psl > occupant.psl {
                        std::mem::swap(occupant, &mut candidate);
                    }
                }
            }

            candidate.psl += 1;
            slot_idx = (slot_idx + 1) & mask;

            if candidate.psl > PSL_THRESHOLD {
                return self.insert_cuckoo(candidate, allow_replace);
            }
        }
    }

    fn insert_cuckoo(&mut self, mut candidate: Entry<V>, allow_replace: bool) -> InsertAttempt<V> {
        let mask = self.mask;
        candidate.psl = 0;
        candidate.in_cuckoo = true;
        let mut slot_idx = candidate.hash_alt as usize & mask;

        for _ in 0..CUCKOO_CYCLE_LIMIT {
            match &mut self.slots[slot_idx] {
                None => {
                    self.count += 1;
                    self.stats.cuckoo_count += 1;
                    self.slots[slot_idx] = Some(candidate);
                    return InsertAttempt::Inserted;
                }
                Some(occupant)
                    if occupant.hash_primary == candidate.hash_primary
                        && occupant.key.as_ref() == candidate.key.as_ref() =>
                {
                    if allow_replace {
                        let old = std::mem::replace(&mut occupant.value, candidate.value);
                        if let Some(d) = &mut self.value_destructor {
                            d(old);
                        }
                        return InsertAttempt::Replaced;
                    }
                    return InsertAttempt::AlreadyExists;
                }
                _ => {}
            }
            candidate.psl += 1;
            slot_idx = (slot_idx + 1) & mask;
        }

        InsertAttempt::Full(candidate)
    }

    fn grow(&mut self) -> DaggerResult<()> {
        let new_capacity = self.capacity().saturating_mul(2).max(MIN_CAPACITY);
        self.resize_to(new_capacity)
    }

    fn resize_to(&mut self, new_capacity: usize) -> DaggerResult<()> {
        let new_capacity = new_capacity.next_power_of_two().max(MIN_CAPACITY);
        let old_slots = std::mem::replace(&mut self.slots, (0..new_capacity).map(|_| None).collect());
        self.mask = new_capacity - 1;
        self.count = 0;
        self.stats.cuckoo_count = 0;
        self.stats.resize_count += 1;

        let entries: Vec<Entry<V>> = old_slots
            .into_iter()
            .flatten()
            .map(|mut e| {
                e.psl = 0;
                e.in_cuckoo = false;
                e
            })
            .collect();

        for entry in entries {
            if let InsertAttempt::Full(leftover) = self.insert_robin_hood(entry, true) {
                // `self.slots` holds everything placed so far; growing again
                // folds that in, then `leftover` needs a home in the bigger
                // table too. The remaining entries in this loop are still
                // sitting in the local `entries` Vec, untouched by either
                // resize, so the loop keeps going afterward instead of
                // returning — returning here would silently drop every
                // entry after this one.
                self.resize_to(new_capacity.saturating_mul(2))?;
                if let InsertAttempt::Full(_) = self.insert_robin_hood(leftover, true) {
                    return Err(DaggerError::OutOfMemory);
                }
            }
        }
        Ok(())
    }

    /// Explicitly grows (or shrinks-and-rehashes is not supported; `target`
    /// is always rounded up to the next power of two and never below the
    /// current population) the table to hold at least `target` slots.
    pub fn resize(&mut self, target: usize) -> DaggerResult<()> {
        self.resize_to(target.max(self.capacity()))
    }

    fn find_slot(&self, key: &[u8]) -> Option<(usize, u64)> {
        let mask = self.mask;
        let hash_primary = nxh64(key, self.seed_primary);
        let mut idx = hash_primary as usize & mask;
        let mut probe = 0u32;
        while probe <= PSL_THRESHOLD {
            match &self.slots[idx] {
                None => break,
                Some(e) if e.hash_primary == hash_primary && e.key.as_ref() == key => {
                    return Some((idx, hash_primary));
                }
                Some(e) => {
                    if !e.in_cuckoo && e.psl < probe {
                        break;
                    }
                }
            }
            idx = (idx + 1) & mask;
            probe += 1;
        }

        let hash_alt = nxh64_alt(key, self.seed_alt);
        let mut idx = hash_alt as usize & mask;
        for _ in 0..CUCKOO_CYCLE_LIMIT {
            match &self.slots[idx] {
                None => break,
                Some(e) if e.in_cuckoo && e.hash_alt == hash_alt && e.key.as_ref() == key => {
                    return Some((idx, hash_alt));
                }
                _ => {}
            }
            idx = (idx + 1) & mask;
        }
        None
    }

    pub fn get(&self, key: &[u8]) -> Option<&V> {
        let idx = self.find_slot(key)?.0;
        self.slots[idx].as_ref().map(|e| &e.value)
    }

    pub fn get_mut(&mut self, key: &[u8]) -> Option<&mut V> {
        let idx = self.find_slot(key)?.0;
        self.slots[idx].as_mut().map(|e| &mut e.value)
    }

    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.find_slot(key).is_some()
    }

    /// Removes `key`, returning its value. Unlike [`DaggerTable::clear`],
    /// this does not invoke the configured value destructor — ownership
    /// passes to the caller instead.
    pub fn remove(&mut self, key: &[u8]) -> Option<V> {
        let slot_idx = self.find_slot(key)?.0;
        let removed = self.slots[slot_idx].take()?;
        self.count -= 1;
        if removed.in_cuckoo {
            self.stats.cuckoo_count = self.stats.cuckoo_count.saturating_sub(1);
        }

        let mask = self.mask;
        let mut cur = slot_idx;
        loop {
            let next = (cur + 1) & mask;
            let should_shift = matches!(&self.slots[next], Some(e) if e.psl > 0);
            if !should_shift {
                break;
            }
            self.slots[cur] = self.slots[next].take().map(|mut e| {
                e.psl -= 1;
                e
            });
            cur = next;
        }

        Some(removed.value)
    }

    /// Drops every entry, invoking the value destructor (if any) for each.
    pub fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            if let Some(entry) = slot.take() {
                if let Some(d) = &mut self.value_destructor {
                    d(entry.value);
                }
            }
        }
        self.count = 0;
        self.stats.cuckoo_count = 0;
    }

    /// Visits every occupied slot in array order. Stops early if `f`
    /// returns `true`.
    pub fn foreach<F: FnMut(&[u8], &V) -> bool>(&self, mut f: F) {
        for slot in &self.slots {
            if let Some(entry) = slot {
                if f(entry.key.as_ref(), &entry.value) {
                    return;
                }
            }
        }
    }
}
