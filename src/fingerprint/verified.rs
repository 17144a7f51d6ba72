//! Debug/test-only backend (behind the `verified-fingerprints` feature) that
//! drives a [`HashFingerprint`] and a [`BagFingerprint`] in lock-step and
//! asserts they never disagree about reaching the identity state — a cheap
//! sanity check that the XOR-combine isn't silently cancelling fragments the
//! bag still holds.

use super::{BagFingerprint, FingerprintBackend, Fragment, HashFingerprint};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedFingerprint {
    hash: HashFingerprint,
    bag: BagFingerprint,
}

impl FingerprintBackend for VerifiedFingerprint {
    fn identity() -> VerifiedFingerprint {
        VerifiedFingerprint {
            hash: HashFingerprint::identity(),
            bag: BagFingerprint::identity(),
        }
    }

    fn add_fragment(&mut self, fragment: &Fragment) {
        self.hash.add_fragment(fragment);
        self.bag.add_fragment(fragment);
    }

    fn remove_fragment(&mut self, fragment: &Fragment) {
        self.hash.remove_fragment(fragment);
        self.bag.remove_fragment(fragment);
    }

    fn combine(&mut self, other: &VerifiedFingerprint) {
        self.hash.combine(&other.hash);
        self.bag.combine(&other.bag);
    }

    fn identifier(&self) -> Vec<u8> {
        debug_assert_eq!(
            self.bag == BagFingerprint::identity(),
            self.hash == HashFingerprint::identity(),
            "hash and bag fingerprints disagree about having returned to the identity state",
        );
        self.hash.identifier()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_then_remove_returns_to_identity() {
        let f = Fragment::new(4, vec![1, 2]);
        let mut fp = VerifiedFingerprint::identity();
        fp.add_fragment(&f);
        fp.remove_fragment(&f);
        assert_eq!(fp, VerifiedFingerprint::identity());
    }
}
