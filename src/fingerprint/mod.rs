//! Content-addressable state fingerprints with an abelian combine, used to
//! recognize a configuration equivalent to one already explored (a
//! *cutoff*) so the search does not re-explore it.
//!
//! A fingerprint is built from typed, tagged *fragments* (tag numbering
//! 1..16, matching the host's event/memory-access vocabulary — this crate
//! only treats tags as opaque bytes, never branches on a specific tag) folded
//! into one of two interchangeable backends behind [`FingerprintBackend`].

pub(crate) mod bag;
pub(crate) mod hash;
#[cfg(feature = "verified-fingerprints")]
pub(crate) mod verified;

pub use bag::BagFingerprint;
pub use hash::HashFingerprint;
#[cfg(feature = "verified-fingerprints")]
pub use verified::VerifiedFingerprint;

use std::collections::HashMap;

/// Opaque identifier for a host-managed symbolic array. The core only ever
/// ref-counts these, never inspects array contents.
pub type ArrayId = u64;

/// A typed byte fragment folded into a fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fragment {
    pub tag: u8,
    pub bytes: Vec<u8>,
}

impl Fragment {
    pub fn new(tag: u8, bytes: impl Into<Vec<u8>>) -> Fragment {
        Fragment {
            tag,
            bytes: bytes.into(),
        }
    }
}

/// Ref-counted set of symbolic arrays a fingerprint's value currently
/// depends on. The identity element of its own (additive) abelian group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Delta {
    refs: HashMap<ArrayId, u64>,
}

impl Delta {
    pub fn is_identity(&self) -> bool {
        self.refs.is_empty()
    }

    pub fn add_to_delta_only(&mut self, array: ArrayId, by: u64) {
        if by == 0 {
            return;
        }
        *self.refs.entry(array).or_insert(0) += by;
    }

    pub fn remove_from_delta_only(&mut self, array: ArrayId, by: u64) {
        if let Some(count) = self.refs.get_mut(&array) {
            *count = count.saturating_sub(by);
            if *count == 0 {
                self.refs.remove(&array);
            }
        }
    }

    pub fn add_delta(&mut self, other: &Delta) {
        for (&array, &count) in &other.refs {
            self.add_to_delta_only(array, count);
        }
    }

    pub fn remove_delta(&mut self, other: &Delta) {
        for (&array, &count) in &other.refs {
            self.remove_from_delta_only(array, count);
        }
    }

    pub fn referenced_arrays(&self) -> impl Iterator<Item = &ArrayId> {
        self.refs.keys()
    }
}

/// A backend capable of combining fragments with an abelian (order-free,
/// self-inverse-removable) operation.
pub trait FingerprintBackend: Clone + std::fmt::Debug {
    fn identity() -> Self;
    fn add_fragment(&mut self, fragment: &Fragment);
    fn remove_fragment(&mut self, fragment: &Fragment);
    fn combine(&mut self, other: &Self);
    /// A value suitable as a dedup key: equal fingerprints must produce
    /// equal identifiers.
    fn identifier(&self) -> Vec<u8>;
}

/// A fingerprint value paired with the symbolic-array [`Delta`] its
/// constituent fragments depend on.
#[derive(Debug, Clone)]
pub struct Fingerprint<B: FingerprintBackend> {
    value: B,
    delta: Delta,
}

impl<B: FingerprintBackend> Fingerprint<B> {
    pub fn new() -> Fingerprint<B> {
        Fingerprint {
            value: B::identity(),
            delta: Delta::default(),
        }
    }

    pub fn value(&self) -> &B {
        &self.value
    }

    pub fn delta(&self) -> &Delta {
        &self.delta
    }

    pub fn add_to_value(&mut self, fragment: &Fragment) {
        self.value.add_fragment(fragment);
    }

    pub fn remove_from_value(&mut self, fragment: &Fragment) {
        self.value.remove_fragment(fragment);
    }

    pub fn add_to_value_and_delta(&mut self, fragment: &Fragment, arrays: &[ArrayId]) {
        self.add_to_value(fragment);
        for &array in arrays {
            self.delta.add_to_delta_only(array, 1);
        }
    }

    pub fn remove_from_value_and_delta(&mut self, fragment: &Fragment, arrays: &[ArrayId]) {
        self.remove_from_value(fragment);
        for &array in arrays {
            self.delta.remove_from_delta_only(array, 1);
        }
    }

    pub fn add_to_delta_only(&mut self, array: ArrayId, by: u64) {
        self.delta.add_to_delta_only(array, by);
    }

    pub fn remove_from_delta_only(&mut self, array: ArrayId, by: u64) {
        self.delta.remove_from_delta_only(array, by);
    }

    pub fn add_delta(&mut self, other: &Delta) {
        self.delta.add_delta(other);
    }

    pub fn remove_delta(&mut self, other: &Delta) {
        self.delta.remove_delta(other);
    }

    pub fn combine(&mut self, other: &Fingerprint<B>) {
        self.value.combine(&other.value);
        self.delta.add_delta(&other.delta);
    }

    /// Folds a temporary tag-10 fragment built from the sorted ids of every
    /// array this fingerprint's delta references, computes the identifier,
    /// then removes the temporary fragment again — the constraint block
    /// never survives past this call.
    pub fn identifier(&mut self) -> Vec<u8> {
        let mut arrays: Vec<ArrayId> = self.delta.referenced_arrays().copied().collect();
        arrays.sort_unstable();
        let mut bytes = Vec::with_capacity(arrays.len() * 8);
        for array in &arrays {
            bytes.extend_from_slice(&array.to_le_bytes());
        }
        let constraint_fragment = Fragment::new(10, bytes);

        self.value.add_fragment(&constraint_fragment);
        let id = self.value.identifier();
        self.value.remove_fragment(&constraint_fragment);
        id
    }
}

impl<B: FingerprintBackend> Default for Fingerprint<B> {
    fn default() -> Fingerprint<B> {
        Fingerprint::new()
    }
}

/// Forwards to the backend's own `Display`, when it has one — e.g. a
/// lower-case hex digest for [`HashFingerprint`].
impl<B: FingerprintBackend + std::fmt::Display> std::fmt::Display for Fingerprint<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.value, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_add_remove_is_consistent() {
        let mut d = Delta::default();
        d.add_to_delta_only(1, 2);
        d.add_to_delta_only(2, 1);
        assert!(!d.is_identity());

        d.remove_from_delta_only(1, 2);
        d.remove_from_delta_only(2, 1);
        assert!(d.is_identity());
    }

    #[test]
    fn identifier_removes_temporary_constraint_fragment() {
        let mut fp = Fingerprint::<HashFingerprint>::new();
        fp.add_to_value_and_delta(&Fragment::new(1, vec![1, 2, 3]), &[7]);

        let before = fp.value().clone();
        let _ = fp.identifier();
        assert_eq!(fp.value().clone(), before, "temporary fragment must not persist");
    }
}
