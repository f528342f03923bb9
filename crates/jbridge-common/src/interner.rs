//! Shared name table.
//!
//! Every identifier the scanner sees is interned into a `NameTable` and
//! carried around as an `Atom` (a `u32`). Comparing two names is an integer
//! comparison.
//!
//! The table is an explicit, reference-counted object (`SharedNames`). A
//! caller that wants to reuse interned names across compile sessions keeps one
//! `SharedNames` alive and hands a clone to every session it creates; the table
//! lives as long as the last session (or the caller) holding it. Nothing here
//! is global.

use rustc_hash::FxHashMap;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, RwLock};

use serde::Serialize;

/// An interned name.
///
/// Atoms are cheap to copy and compare. Use [`NameTable::resolve`] to get the
/// text back.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize)]
pub struct Atom(pub u32);

impl Atom {
    /// The empty name.
    pub const NONE: Atom = Atom(0);

    #[inline]
    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

const SHARD_BITS: u32 = 4;
const SHARD_COUNT: usize = 1 << SHARD_BITS;
const SHARD_MASK: u32 = (SHARD_COUNT as u32) - 1;

/// Names pre-interned by [`NameTable::with_common_names`].
const COMMON_NAMES: &[&str] = &[
    // Keywords that also show up as names in the tree
    "this",
    "super",
    "class",
    "length",
    "<init>",
    "<clinit>",
    // java.lang
    "java",
    "lang",
    "Object",
    "String",
    "Override",
    "SuppressWarnings",
    "Deprecated",
    "value",
    "restriction",
    "serialVersionUID",
];

#[derive(Default)]
struct Shard {
    map: FxHashMap<Arc<str>, Atom>,
    strings: Vec<Arc<str>>,
}

/// Sharded, thread-safe name table.
pub struct NameTable {
    shards: [RwLock<Shard>; SHARD_COUNT],
}

/// Reference-counted handle to a name table shared by several sessions.
pub type SharedNames = Arc<NameTable>;

impl Default for NameTable {
    fn default() -> Self {
        Self::new()
    }
}

impl NameTable {
    /// Create an empty table. `Atom::NONE` always resolves to `""`.
    pub fn new() -> Self {
        let shards: [RwLock<Shard>; SHARD_COUNT] = std::array::from_fn(|_| RwLock::default());
        if let Ok(mut shard) = shards[0].write() {
            let empty: Arc<str> = Arc::from("");
            shard.strings.push(empty.clone());
            shard.map.insert(empty, Atom::NONE);
        }
        NameTable { shards }
    }

    /// Create a table with the common names pre-interned.
    pub fn with_common_names() -> Self {
        let table = Self::new();
        for name in COMMON_NAMES {
            table.intern(name);
        }
        table
    }

    /// Create a shared table ready to hand to sessions.
    pub fn shared() -> SharedNames {
        Arc::new(Self::with_common_names())
    }

    /// Intern a name, returning the existing atom if it was seen before.
    pub fn intern(&self, s: &str) -> Atom {
        if s.is_empty() {
            return Atom::NONE;
        }
        let shard_idx = Self::shard_for(s);
        if let Ok(shard) = self.shards[shard_idx].read()
            && let Some(&atom) = shard.map.get(s)
        {
            return atom;
        }
        let Ok(mut shard) = self.shards[shard_idx].write() else {
            return Atom::NONE;
        };
        if let Some(&atom) = shard.map.get(s) {
            return atom;
        }
        let local_index = shard.strings.len() as u32;
        if local_index > (u32::MAX >> SHARD_BITS) {
            return Atom::NONE;
        }
        let atom = Atom((local_index << SHARD_BITS) | shard_idx as u32);
        let owned: Arc<str> = Arc::from(s);
        shard.strings.push(owned.clone());
        shard.map.insert(owned, atom);
        atom
    }

    /// Look up a name without interning it.
    pub fn lookup(&self, s: &str) -> Option<Atom> {
        if s.is_empty() {
            return Some(Atom::NONE);
        }
        let shard = self.shards[Self::shard_for(s)].read().ok()?;
        shard.map.get(s).copied()
    }

    /// Resolve an atom. Unknown atoms resolve to `""`.
    pub fn resolve(&self, atom: Atom) -> Arc<str> {
        self.try_resolve(atom).unwrap_or_else(|| Arc::from(""))
    }

    pub fn try_resolve(&self, atom: Atom) -> Option<Arc<str>> {
        if atom.is_none() {
            return Some(Arc::from(""));
        }
        let shard_idx = (atom.0 & SHARD_MASK) as usize;
        let local = (atom.0 >> SHARD_BITS) as usize;
        let shard = self.shards.get(shard_idx)?.read().ok()?;
        shard.strings.get(local).cloned()
    }

    /// Number of interned names, including the empty name.
    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| shard.read().map(|s| s.strings.len()).unwrap_or(0))
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    fn shard_for(s: &str) -> usize {
        let mut hasher = rustc_hash::FxHasher::default();
        s.hash(&mut hasher);
        (hasher.finish() as u32 & SHARD_MASK) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_is_idempotent() {
        let names = NameTable::new();
        let a = names.intern("foo");
        let b = names.intern("foo");
        assert_eq!(a, b);
        assert_eq!(&*names.resolve(a), "foo");
    }

    #[test]
    fn empty_name_is_none() {
        let names = NameTable::new();
        assert_eq!(names.intern(""), Atom::NONE);
        assert_eq!(&*names.resolve(Atom::NONE), "");
    }

    #[test]
    fn shared_table_outlives_one_holder() {
        let shared = NameTable::shared();
        let first = Arc::clone(&shared);
        let atom = first.intern("Widget");
        drop(first);
        assert_eq!(shared.lookup("Widget"), Some(atom));
        assert!(shared.lookup("Override").is_some());
    }
}
