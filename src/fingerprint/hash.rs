//! XOR-combinable BLAKE2b fingerprint backend.

use super::{Fragment, FingerprintBackend};
use blake2::{Blake2b512, Digest};

const DIGEST_LEN: usize = 32;

/// A fixed-size digest combined by XOR: order-free and self-inverse, so
/// `remove_fragment` is just `add_fragment` again.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct HashFingerprint {
    digest: [u8; DIGEST_LEN],
}

impl HashFingerprint {
    fn fragment_digest(fragment: &Fragment) -> [u8; DIGEST_LEN] {
        let mut hasher = Blake2b512::new();
        hasher.update([fragment.tag]);
        hasher.update(&fragment.bytes);
        let full = hasher.finalize();
        let mut out = [0u8; DIGEST_LEN];
        out.copy_from_slice(&full[..DIGEST_LEN]);
        out
    }
}

impl std::fmt::Debug for HashFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HashFingerprint({})", hex(&self.digest))
    }
}

/// Lower-case hex digest, e.g. for logging or as a cutoff key's display form.
impl std::fmt::Display for HashFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex(&self.digest))
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

impl FingerprintBackend for HashFingerprint {
    fn identity() -> HashFingerprint {
        HashFingerprint {
            digest: [0u8; DIGEST_LEN],
        }
    }

    fn add_fragment(&mut self, fragment: &Fragment) {
        let d = Self::fragment_digest(fragment);
        for i in 0..DIGEST_LEN {
            self.digest[i] ^= d[i];
        }
    }

    fn remove_fragment(&mut self, fragment: &Fragment) {
        self.add_fragment(fragment);
    }

    fn combine(&mut self, other: &HashFingerprint) {
        for i in 0..DIGEST_LEN {
            self.digest[i] ^= other.digest[i];
        }
    }

    fn identifier(&self) -> Vec<u8> {
        self.digest.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xor_combine_is_order_independent() {
        let f1 = Fragment::new(1, vec![1, 2, 3]);
        let f2 = Fragment::new(2, vec![4, 5, 6]);

        let mut a = HashFingerprint::identity();
        a.add_fragment(&f1);
        a.add_fragment(&f2);

        let mut b = HashFingerprint::identity();
        b.add_fragment(&f2);
        b.add_fragment(&f1);

        assert_eq!(a, b);
    }

    #[test]
    fn remove_is_self_inverse() {
        let f = Fragment::new(1, vec![9, 9, 9]);
        let mut fp = HashFingerprint::identity();
        fp.add_fragment(&f);
        fp.remove_fragment(&f);
        assert_eq!(fp, HashFingerprint::identity());
    }

    #[test]
    fn to_string_is_a_lowercase_hex_digest() {
        let s = HashFingerprint::identity().to_string();
        assert_eq!(s.len(), DIGEST_LEN * 2);
        assert!(s.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
