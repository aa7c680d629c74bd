// SPDX-License-Identifier: Apache-2.0
//! Cross-cutting dirty-tracking: a narrow mutator surface so it is
//! structurally impossible to mutate an entity without marking it dirty.
//!
//! Grounded on this repository's `footprint_guard` pattern (enforcement
//! lives in one type, not scattered at call sites), simplified from
//! panic-based footprint enforcement — there is no untrusted-rule
//! sandboxing requirement here — to a guard that dirties its id the first
//! time the caller actually takes a `&mut` through it. A guard obtained
//! and then never mutably dereferenced marks nothing dirty, which is
//! correct: nothing changed.

use std::collections::HashSet;
use std::hash::Hash;
use std::ops::{Deref, DerefMut};

/// The set of entity ids whose persisted fields changed since the last
/// checkpoint flush, per entity family.
pub type DirtySet<K> = HashSet<K>;

/// A mutable handle to an entity that marks `id` dirty in `dirty` the
/// first time the caller obtains a `&mut` through it.
pub struct DirtyMut<'a, K, V> {
    id: K,
    value: &'a mut V,
    dirty: &'a mut DirtySet<K>,
}

impl<'a, K: Copy + Eq + Hash, V> DirtyMut<'a, K, V> {
    /// Constructs a guard over `value`, keyed by `id`, backed by `dirty`.
    pub fn new(id: K, value: &'a mut V, dirty: &'a mut DirtySet<K>) -> Self {
        Self { id, value, dirty }
    }
}

impl<K, V> Deref for DirtyMut<'_, K, V> {
    type Target = V;

    fn deref(&self) -> &V {
        self.value
    }
}

impl<K: Copy + Eq + Hash, V> DerefMut for DirtyMut<'_, K, V> {
    fn deref_mut(&mut self) -> &mut V {
        self.dirty.insert(self.id);
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deref_alone_does_not_dirty() {
        let mut dirty: DirtySet<u32> = HashSet::new();
        let mut value = 5i32;
        {
            let guard = DirtyMut::new(1u32, &mut value, &mut dirty);
            assert_eq!(*guard, 5);
        }
        assert!(dirty.is_empty());
    }

    #[test]
    fn deref_mut_marks_dirty() {
        let mut dirty: DirtySet<u32> = HashSet::new();
        let mut value = 5i32;
        {
            let mut guard = DirtyMut::new(1u32, &mut value, &mut dirty);
            *guard += 1;
        }
        assert_eq!(value, 6);
        assert!(dirty.contains(&1u32));
    }
}
