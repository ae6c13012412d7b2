//! Input fingerprinting.

use xxhash_rust::xxh3::Xxh3;

/// Incremental xxh3 hasher over delimited string and integer fields.
///
/// Each field is terminated so `("ab", "c")` and `("a", "bc")` hash
/// differently.
pub struct Fingerprinter {
    hasher: Xxh3,
}

impl Default for Fingerprinter {
    fn default() -> Self {
        Self::new()
    }
}

impl Fingerprinter {
    #[must_use]
    pub fn new() -> Self {
        Self { hasher: Xxh3::new() }
    }

    pub fn str(&mut self, value: &str) -> &mut Self {
        self.hasher.update(value.as_bytes());
        self.hasher.update(&[0x1f]);
        self
    }

    pub fn int(&mut self, value: i64) -> &mut Self {
        self.hasher.update(&value.to_le_bytes());
        self
    }

    /// Marks the boundary between two input lists.
    pub fn section(&mut self) -> &mut Self {
        self.hasher.update(&[0x1e]);
        self
    }

    #[must_use]
    pub fn finish(&self) -> u64 {
        self.hasher.digest()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_field_boundaries() {
        let a = Fingerprinter::new().str("ab").str("c").finish();
        let b = Fingerprinter::new().str("a").str("bc").finish();
        assert_ne!(a, b);

        let c = Fingerprinter::new().str("ab").str("c").finish();
        assert_eq!(a, c);
    }
}
