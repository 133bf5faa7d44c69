//! # zorya-core
//!
//! Native foundations primitives: a non-cryptographic hash (`nxh`), a hybrid
//! Robin Hood / cuckoo hash table (`dagger`), a chunked arena allocator
//! (`arena`), an interned-string/rope toolkit (`weave`), a hierarchical INI
//! configuration parser (`ini`), and a target-DAG build orchestrator
//! (`ordinal`).
//!
//! `unsafe` code is denied at the crate level; `arena` carries a targeted
//! module-level exception for its bump-pointer tricks.

#![deny(unsafe_code)]

pub mod arena;
pub mod dagger;
pub mod ini;
pub mod nxh;
pub mod ordinal;
pub mod weave;
