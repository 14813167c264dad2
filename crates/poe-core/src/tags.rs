//! Capability tag sets
//!
//! A [`TagSet`] is an immutable bitset over the registry's tag-ID space.
//! Tag sets are cheap to clone (two inline words before spilling to the heap)
//! and every operation returns a fresh set, so a per-position snapshot can be
//! stored without defensive copying. [`TagSetBuilder`] is the mutable side.

use crate::names::{DenseId, TagId};
use smallvec::SmallVec;
use std::fmt;

const WORD_BITS: usize = u64::BITS as usize;

type Words = SmallVec<[u64; 2]>;

#[inline]
fn split(tag: TagId) -> (usize, u64) {
    let index = tag.index();
    (index / WORD_BITS, 1u64 << (index % WORD_BITS))
}

/// Drop trailing zero words so structurally equal sets compare equal
fn normalize(words: &mut Words) {
    while words.last() == Some(&0) {
        words.pop();
    }
}

/// Immutable set of capability tags
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct TagSet {
    words: Words,
}

impl TagSet {
    /// Create an empty set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check membership
    #[inline]
    #[must_use]
    pub fn contains(&self, tag: TagId) -> bool {
        let (word, mask) = split(tag);
        self.words.get(word).is_some_and(|w| w & mask != 0)
    }

    /// Tags present in either set
    #[must_use]
    pub fn union(&self, other: &TagSet) -> TagSet {
        let (long, short) = if self.words.len() >= other.words.len() {
            (self, other)
        } else {
            (other, self)
        };
        let mut words = long.words.clone();
        for (w, o) in words.iter_mut().zip(short.words.iter()) {
            *w |= o;
        }
        TagSet { words }
    }

    /// Tags present in `self` but not in `tags`
    #[must_use]
    pub fn difference(&self, tags: &TagSet) -> TagSet {
        let mut words = self.words.clone();
        for (w, o) in words.iter_mut().zip(tags.words.iter()) {
            *w &= !o;
        }
        normalize(&mut words);
        TagSet { words }
    }

    /// Tags present in both sets
    #[must_use]
    pub fn intersection(&self, other: &TagSet) -> TagSet {
        let mut words: Words = self
            .words
            .iter()
            .zip(other.words.iter())
            .map(|(a, b)| a & b)
            .collect();
        normalize(&mut words);
        TagSet { words }
    }

    /// Defensive copy, kept as a named operation for snapshot sites
    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> TagSet {
        self.clone()
    }

    /// Every tag of `self` is in `other`
    #[must_use]
    pub fn is_subset(&self, other: &TagSet) -> bool {
        self.words.iter().enumerate().all(|(i, w)| {
            let o = other.words.get(i).copied().unwrap_or(0);
            w & !o == 0
        })
    }

    /// No tag is shared with `other`
    #[must_use]
    pub fn is_disjoint(&self, other: &TagSet) -> bool {
        self.words
            .iter()
            .zip(other.words.iter())
            .all(|(a, b)| a & b == 0)
    }

    /// Number of tags in the set
    #[must_use]
    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Check if the set is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Iterate tags in ascending id order
    pub fn iter(&self) -> impl Iterator<Item = TagId> + '_ {
        self.words.iter().enumerate().flat_map(|(i, &word)| {
            let mut rest = word;
            std::iter::from_fn(move || {
                if rest == 0 {
                    return None;
                }
                let bit = rest.trailing_zeros() as usize;
                rest &= rest - 1;
                Some(TagId::from_index(i * WORD_BITS + bit))
            })
        })
    }

    /// Start a builder pre-filled with this set
    #[must_use]
    pub fn to_builder(&self) -> TagSetBuilder {
        TagSetBuilder {
            words: self.words.clone(),
        }
    }
}

impl FromIterator<TagId> for TagSet {
    fn from_iter<T: IntoIterator<Item = TagId>>(iter: T) -> Self {
        let mut builder = TagSetBuilder::new();
        builder.extend(iter);
        builder.build()
    }
}

impl fmt::Debug for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Mutable builder for [`TagSet`]
#[derive(Debug, Clone, Default)]
pub struct TagSetBuilder {
    words: Words,
}

impl TagSetBuilder {
    /// Create an empty builder
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tag
    pub fn insert(&mut self, tag: TagId) -> &mut Self {
        let (word, mask) = split(tag);
        if self.words.len() <= word {
            self.words.resize(word + 1, 0);
        }
        self.words[word] |= mask;
        self
    }

    /// Remove a tag
    pub fn remove(&mut self, tag: TagId) -> &mut Self {
        let (word, mask) = split(tag);
        if let Some(w) = self.words.get_mut(word) {
            *w &= !mask;
        }
        self
    }

    /// Add every tag of an iterator
    pub fn extend(&mut self, tags: impl IntoIterator<Item = TagId>) -> &mut Self {
        for tag in tags {
            self.insert(tag);
        }
        self
    }

    /// Freeze into an immutable set
    #[must_use]
    pub fn build(&self) -> TagSet {
        let mut words = self.words.clone();
        normalize(&mut words);
        TagSet { words }
    }
}

/// Produced-tag transform of a unit
///
/// `apply(old) = (old \ retracts) ∪ adds`. A tag listed in both sets ends up
/// present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagEffect {
    /// Tags the unit establishes
    pub adds: TagSet,
    /// Tags the unit invalidates
    pub retracts: TagSet,
}

impl TagEffect {
    /// Effect adding `adds` and retracting `retracts`
    #[inline]
    #[must_use]
    pub fn new(adds: TagSet, retracts: TagSet) -> Self {
        Self { adds, retracts }
    }

    /// Apply the transform to a tag state
    #[must_use]
    pub fn apply(&self, tags: &TagSet) -> TagSet {
        if self.retracts.is_empty() {
            return tags.union(&self.adds);
        }
        tags.difference(&self.retracts).union(&self.adds)
    }

    /// Check if the effect leaves every tag state untouched
    #[inline]
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.adds.is_empty() && self.retracts.is_empty()
    }
}
