//! Dense identifiers and interned name tables
//!
//! Every entity in a registry (tags, scope levels, adapters, units,
//! productions, features) is addressed by a dense `u32` index assigned at
//! registration time. [`NameTable`] maps names to those indices and back.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// Common behaviour of dense registry identifiers
pub trait DenseId: Copy + Eq + Ord + std::hash::Hash + fmt::Debug {
    /// Build an identifier from a table index
    fn from_index(index: usize) -> Self;

    /// Table index of this identifier
    fn index(self) -> usize;
}

macro_rules! dense_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Raw numeric value
            #[inline]
            #[must_use]
            pub const fn raw(self) -> u32 {
                self.0
            }
        }

        impl DenseId for $name {
            #[inline]
            #[allow(clippy::cast_possible_truncation)]
            fn from_index(index: usize) -> Self {
                Self(index as u32)
            }

            #[inline]
            fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Debug::fmt(self, f)
            }
        }
    };
}

dense_id!(
    /// Capability tag identifier
    TagId,
    "tag"
);
dense_id!(
    /// Scope level ("run-on type") identifier
    ScopeId,
    "scope"
);
dense_id!(
    /// Adapter (visitor) identifier
    AdapterId,
    "adapter"
);
dense_id!(
    /// Schedulable unit identifier
    UnitId,
    "unit"
);
dense_id!(
    /// Target production identifier
    ProductionId,
    "production"
);
dense_id!(
    /// Optional feature identifier
    FeatureId,
    "feature"
);

/// Insertion-ordered name table for one identifier space
#[derive(Clone)]
pub struct NameTable<I> {
    names: IndexSet<String>,
    _id: PhantomData<I>,
}

impl<I: DenseId> NameTable<I> {
    /// Create an empty table
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            names: IndexSet::new(),
            _id: PhantomData,
        }
    }

    /// Intern a name, returning its identifier and whether it was newly added
    pub fn intern(&mut self, name: &str) -> (I, bool) {
        if let Some(index) = self.names.get_index_of(name) {
            return (I::from_index(index), false);
        }
        let (index, _) = self.names.insert_full(name.to_string());
        (I::from_index(index), true)
    }

    /// Look up a name
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<I> {
        self.names.get_index_of(name).map(I::from_index)
    }

    /// Name of an identifier
    #[inline]
    #[must_use]
    pub fn name(&self, id: I) -> Option<&str> {
        self.names.get_index(id.index()).map(String::as_str)
    }

    /// Number of interned names
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check if the table is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterate over `(id, name)` pairs in registration order
    pub fn iter(&self) -> impl Iterator<Item = (I, &str)> + '_ {
        self.names
            .iter()
            .enumerate()
            .map(|(index, name)| (I::from_index(index), name.as_str()))
    }
}

impl<I: DenseId> Default for NameTable<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I> fmt::Debug for NameTable<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_is_idempotent() {
        let mut table = NameTable::<TagId>::new();
        let (a, fresh_a) = table.intern("ssa");
        let (b, fresh_b) = table.intern("ssa");

        assert!(fresh_a);
        assert!(!fresh_b);
        assert_eq!(a, b);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn ids_follow_registration_order() {
        let mut table = NameTable::<ScopeId>::new();
        table.intern("program");
        table.intern("type");
        table.intern("method");

        let names: Vec<_> = table.iter().map(|(id, name)| (id.index(), name)).collect();
        assert_eq!(names, vec![(0, "program"), (1, "type"), (2, "method")]);
    }

    #[test]
    fn unknown_lookups_return_none() {
        let table = NameTable::<UnitId>::new();
        assert!(table.get("missing").is_none());
        assert!(table.name(UnitId::from_index(3)).is_none());
    }

    #[test]
    fn debug_format_carries_prefix() {
        assert_eq!(format!("{:?}", TagId::from_index(7)), "tag#7");
        assert_eq!(AdapterId::from_index(2).to_string(), "adapter#2");
    }
}
