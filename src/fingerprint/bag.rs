//! Ref-counted multiset fingerprint backend — slower than
//! [`super::HashFingerprint`] but collision-free, useful under the
//! `verified-fingerprints` feature and for tests that want a readable
//! fingerprint diff.

use super::{Fragment, FingerprintBackend};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BagFingerprint {
    counts: HashMap<Fragment, i64>,
}

impl FingerprintBackend for BagFingerprint {
    fn identity() -> BagFingerprint {
        BagFingerprint::default()
    }

    fn add_fragment(&mut self, fragment: &Fragment) {
        let count = self.counts.entry(fragment.clone()).or_insert(0);
        *count += 1;
        if *count == 0 {
            self.counts.remove(fragment);
        }
    }

    fn remove_fragment(&mut self, fragment: &Fragment) {
        let count = self.counts.entry(fragment.clone()).or_insert(0);
        *count -= 1;
        if *count == 0 {
            self.counts.remove(fragment);
        }
    }

    fn combine(&mut self, other: &BagFingerprint) {
        for (fragment, &count) in &other.counts {
            let entry = self.counts.entry(fragment.clone()).or_insert(0);
            *entry += count;
            if *entry == 0 {
                self.counts.remove(fragment);
            }
        }
    }

    fn identifier(&self) -> Vec<u8> {
        let mut entries: Vec<_> = self.counts.iter().collect();
        entries.sort_by(|a, b| (a.0.tag, &a.0.bytes).cmp(&(b.0.tag, &b.0.bytes)));

        let mut bytes = Vec::new();
        for (fragment, count) in entries {
            bytes.push(fragment.tag);
            bytes.extend_from_slice(&(fragment.bytes.len() as u32).to_le_bytes());
            bytes.extend_from_slice(&fragment.bytes);
            bytes.extend_from_slice(&count.to_le_bytes());
        }
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_count_entries_are_dropped() {
        let f = Fragment::new(3, vec![1]);
        let mut bag = BagFingerprint::identity();
        bag.add_fragment(&f);
        bag.remove_fragment(&f);
        assert!(bag.counts.is_empty());
    }

    #[test]
    fn combine_is_order_independent() {
        let f1 = Fragment::new(1, vec![1]);
        let f2 = Fragment::new(2, vec![2]);

        let mut a = BagFingerprint::identity();
        a.add_fragment(&f1);
        let mut a_other = BagFingerprint::identity();
        a_other.add_fragment(&f2);
        a.combine(&a_other);

        let mut b = BagFingerprint::identity();
        b.add_fragment(&f2);
        let mut b_other = BagFingerprint::identity();
        b_other.add_fragment(&f1);
        b.combine(&b_other);

        assert_eq!(a, b);
    }
}
