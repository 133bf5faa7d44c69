//! Two independent 64-bit non-cryptographic hash families over byte slices.
//!
//! `nxh64`/`nxh64_alt` are deliberately built from different primes and
//! rotation schedules so that, for a fixed key, the two digests behave as
//! statistically independent values. [`crate::dagger`] relies on that
//! independence for its cuckoo fallback: a key that collides badly under
//! the primary hash is vanishingly unlikely to also collide badly under
//! the alternate one.

const PRIME_NEXUS: u64 = 0x9E3779B185EBCA87;
const PRIME_VOID: u64 = 0xC2B2AE3D27D4EB4F;
const PRIME_ECHO: u64 = 0x165667B19E3779F9;
const PRIME_PULSE: u64 = 0x85EBCA77C2B2AE63;
const PRIME_DRIFT: u64 = 0x27D4EB2F165667C5;

const PRIME_ALT_1: u64 = 0x517CC1B727220A95;
const PRIME_ALT_2: u64 = 0x71D67FFFEDA60000;

/// Default seed used when a caller doesn't supply one.
pub const SEED_DEFAULT: u64 = 0;
/// Default seed for the alternate family, distinct from [`SEED_DEFAULT`] so
/// that callers who forget to pick their own seeds still get independence.
pub const SEED_ALT: u64 = 0xDEAD_BEEF_CAFE_BABE;

#[inline]
fn rotl64(x: u64, r: u32) -> u64 {
    x.rotate_left(r)
}

#[inline]
fn read64(bytes: &[u8]) -> u64 {
    u64::from_le_bytes(bytes[..8].try_into().unwrap())
}

#[inline]
fn read32(bytes: &[u8]) -> u64 {
    u32::from_le_bytes(bytes[..4].try_into().unwrap()) as u64
}

#[inline]
fn mix(acc: u64, word: u64) -> u64 {
    rotl64(acc.wrapping_add(word.wrapping_mul(PRIME_NEXUS)), 31).wrapping_mul(PRIME_VOID)
}

#[inline]
fn merge(acc: u64, lane: u64) -> u64 {
    (acc ^ mix(0, lane)).wrapping_mul(PRIME_NEXUS).wrapping_add(PRIME_DRIFT)
}

#[inline]
fn avalanche(mut h: u64) -> u64 {
    h ^= h >> 33;
    h = h.wrapping_mul(PRIME_VOID);
    h ^= h >> 29;
    h = h.wrapping_mul(PRIME_ECHO);
    h ^= h >> 32;
    h
}

#[inline]
fn mix_alt(acc: u64, word: u64) -> u64 {
    rotl64(acc.wrapping_add(word.wrapping_mul(PRIME_ALT_1)), 27).wrapping_mul(PRIME_ALT_2)
}

#[inline]
fn merge_alt(acc: u64, lane: u64) -> u64 {
    (acc ^ mix_alt(0, lane)).wrapping_mul(PRIME_ALT_1).wrapping_add(PRIME_PULSE)
}

#[inline]
fn avalanche_alt(mut h: u64) -> u64 {
    h ^= h >> 31;
    h = h.wrapping_mul(PRIME_ALT_2);
    h ^= h >> 27;
    h = h.wrapping_mul(PRIME_ALT_1);
    h ^= h >> 33;
    h
}

/// The primary 64-bit hash of `bytes` under `seed`.
pub fn nxh64(bytes: &[u8], seed: u64) -> u64 {
    hash64(bytes, seed, false)
}

/// The alternate 64-bit hash of `bytes` under `seed`. Statistically
/// independent of [`nxh64`] for the same input.
pub fn nxh64_alt(bytes: &[u8], seed: u64) -> u64 {
    hash64(bytes, seed, true)
}

fn hash64(bytes: &[u8], seed: u64, alt: bool) -> u64 {
    let len = bytes.len();
    let (p1, p2, p3, p4) = if alt {
        (PRIME_ALT_1, PRIME_ALT_2, PRIME_PULSE, PRIME_ECHO)
    } else {
        (PRIME_NEXUS, PRIME_VOID, PRIME_ECHO, PRIME_PULSE)
    };

    let mut cursor = bytes;
    let mut acc: u64;

    if len >= 32 {
        let mut acc1 = seed.wrapping_add(p1).wrapping_add(p2);
        let mut acc2 = seed.wrapping_add(p2);
        let mut acc3 = seed;
        let mut acc4 = seed.wrapping_sub(p1);

        while cursor.len() >= 32 {
            let lane = |off: usize| read64(&cursor[off..]);
            acc1 = if alt { mix_alt(acc1, lane(0)) } else { mix(acc1, lane(0)) };
            acc2 = if alt { mix_alt(acc2, lane(8)) } else { mix(acc2, lane(8)) };
            acc3 = if alt { mix_alt(acc3, lane(16)) } else { mix(acc3, lane(16)) };
            acc4 = if alt { mix_alt(acc4, lane(24)) } else { mix(acc4, lane(24)) };
            cursor = &cursor[32..];
        }

        acc = rotl64(acc1, 1)
            .wrapping_add(rotl64(acc2, 7))
            .wrapping_add(rotl64(acc3, 12))
            .wrapping_add(rotl64(acc4, 18));
        acc = if alt {
            merge_alt(merge_alt(merge_alt(merge_alt(acc, acc1), acc2), acc3), acc4)
        } else {
            merge(merge(merge(merge(acc, acc1), acc2), acc3), acc4)
        };
    } else {
        acc = seed.wrapping_add(p3).wrapping_add(p4);
    }

    acc = acc.wrapping_add(len as u64);

    while cursor.len() >= 8 {
        let word = read64(cursor);
        acc = if alt { mix_alt(acc, word) } else { mix(acc, word) };
        acc = rotl64(acc, 27).wrapping_mul(p1);
        cursor = &cursor[8..];
    }

    if cursor.len() >= 4 {
        let word = read32(cursor);
        acc ^= word.wrapping_mul(p2);
        acc = rotl64(acc, 23).wrapping_mul(p3).wrapping_add(p4);
        cursor = &cursor[4..];
    }

    for &b in cursor {
        acc ^= (b as u64).wrapping_mul(p4 | 1);
        acc = rotl64(acc, 11).wrapping_mul(p1);
    }

    if alt {
        avalanche_alt(acc)
    } else {
        avalanche(acc)
    }
}

/// 32-bit hash folded from the 64-bit primary digest.
pub fn nxh32(bytes: &[u8], seed: u32) -> u32 {
    let h = nxh64(bytes, seed as u64);
    ((h >> 32) ^ (h & 0xFFFF_FFFF)) as u32
}

/// Hashes a Rust string slice's UTF-8 bytes with the primary family.
pub fn nxh_string(s: &str, seed: u64) -> u64 {
    nxh64(s.as_bytes(), seed)
}

/// Hashes a Rust string slice's UTF-8 bytes with the alternate family.
pub fn nxh_string_alt(s: &str, seed: u64) -> u64 {
    nxh64_alt(s.as_bytes(), seed)
}

/// Hashes a fixed-width 64-bit integer by folding it through the avalanche
/// directly, without going through the byte-slice path.
pub fn nxh_int64(value: u64, seed: u64) -> u64 {
    avalanche(value ^ seed.wrapping_add(PRIME_NEXUS))
}

/// Hashes a fixed-width 32-bit integer.
pub fn nxh_int32(value: u32, seed: u64) -> u64 {
    nxh_int64(value as u64, seed)
}

/// Hashes a pointer-sized address. Kept for API parity with the original
/// pointer-keyed tables; of little use once keys are owned byte buffers.
pub fn nxh_ptr(addr: usize, seed: u64) -> u64 {
    nxh_int64(addr as u64, seed)
}

/// Folds two digests into one, used by [`crate::weave::Cord`] to hash a
/// rope's chunks without materializing them into a single buffer first.
pub fn nxh_combine(h1: u64, h2: u64) -> u64 {
    avalanche(h1 ^ rotl64(h2, 32).wrapping_add(PRIME_DRIFT))
}
