//! Weighted candidate sets.
//!
//! An insertion-ordered list of `(element, weight)` pairs without duplicate
//! elements. Weights are never negative. Entries whose weight drops to (or
//! below) [`WEIGHT_EPSILON`] stay in place until [`WeightedCandidateSet::cleanup`]
//! compacts them away, so removals can be batched during one relaxation.
//!
//! Sets are small (bounded by the catalog's unique tile count), so lookups
//! are linear scans over a `Vec`. Insertion order is part of the contract:
//! the weighted draw walks entries in that order, which keeps generation
//! reproducible for a fixed RNG stream.

use rand::Rng;

/// Weights at or below this value are treated as removed.
pub const WEIGHT_EPSILON: f32 = 1e-6;

/// Ordered weighted multiset used for cell candidates and adjacency lists.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WeightedCandidateSet<T> {
    entries: Vec<(T, f32)>,
}

impl<T> WeightedCandidateSet<T> {
    /// Empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Empty set with room for `capacity` entries.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Number of entries (after the last cleanup).
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set has no entries.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes every entry with weight <= [`WEIGHT_EPSILON`], keeping order.
    pub fn cleanup(&mut self) {
        self.entries.retain(|&(_, w)| w > WEIGHT_EPSILON);
    }

    /// Sum of all weights.
    #[must_use]
    pub fn total_weight(&self) -> f32 {
        self.entries.iter().map(|&(_, w)| w).sum()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&T, f32)> + '_ {
        self.entries.iter().map(|(e, w)| (e, *w))
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<T: Copy + PartialEq> WeightedCandidateSet<T> {
    /// Position of `element`, if present.
    #[must_use]
    pub fn index_of(&self, element: &T) -> Option<usize> {
        self.entries.iter().position(|(e, _)| e == element)
    }

    /// Whether `element` is present.
    #[must_use]
    pub fn contains(&self, element: &T) -> bool {
        self.index_of(element).is_some()
    }

    /// Weight of `element`, `0.0` when absent.
    #[must_use]
    pub fn weight(&self, element: &T) -> f32 {
        self.index_of(element).map_or(0.0, |i| self.entries[i].1)
    }

    /// Adds `weight` to an existing entry, or appends a new one.
    pub fn add(&mut self, element: T, weight: f32) {
        let weight = weight.max(0.0);
        match self.index_of(&element) {
            Some(i) => self.entries[i].1 += weight,
            None => self.entries.push((element, weight)),
        }
    }

    /// Overwrites the weight of an existing entry. No-op when absent.
    /// A weight of zero marks the entry for the next [`Self::cleanup`].
    pub fn set(&mut self, element: T, weight: f32) {
        if let Some(i) = self.index_of(&element) {
            self.entries[i].1 = weight.max(0.0);
        }
    }

    /// Union keeping the smaller weight for elements present in both.
    pub fn merge_min(&mut self, other: &Self) {
        for &(element, weight) in &other.entries {
            match self.index_of(&element) {
                Some(i) => self.entries[i].1 = self.entries[i].1.min(weight),
                None => self.entries.push((element, weight)),
            }
        }
    }

    /// Restricts this set to `allowed`.
    ///
    /// Elements missing from `allowed` are removed; survivors take the
    /// smaller of their own and the allowed weight. Returns `true` when at
    /// least one entry was removed.
    pub fn relax(&mut self, allowed: &Self) -> bool {
        let before = self.entries.len();
        for entry in &mut self.entries {
            entry.1 = match allowed.index_of(&entry.0) {
                Some(i) => entry.1.min(allowed.entries[i].1),
                None => 0.0,
            };
        }
        self.cleanup();
        self.entries.len() != before
    }

    /// Elements in insertion order.
    pub fn elements(&self) -> impl Iterator<Item = T> + '_ {
        self.entries.iter().map(|&(e, _)| e)
    }

    /// Weighted random draw. `None` when empty or all weights are zero.
    pub fn get<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<T> {
        let total = self.total_weight();
        if total <= 0.0 || !total.is_finite() {
            return None;
        }
        let mut pick = rng.gen::<f32>() * total;
        let mut last = None;
        for &(element, weight) in &self.entries {
            if weight <= 0.0 {
                continue;
            }
            if pick < weight {
                return Some(element);
            }
            pick -= weight;
            last = Some(element);
        }
        // float rounding can leave `pick` marginally above the final weight
        last
    }
}

impl<T: Copy + PartialEq> FromIterator<(T, f32)> for WeightedCandidateSet<T> {
    fn from_iter<I: IntoIterator<Item = (T, f32)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (element, weight) in iter {
            set.add(element, weight);
        }
        set
    }
}
