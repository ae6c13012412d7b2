//! Active-version resolution.
//!
//! The resolver is the only shared mutable state of the engine. All writes go
//! through a single `RwLock`, so concurrent activations for the same BOM code
//! serialize and the stored value is always one of the attempted tags.

use crate::error::{BomReconError, Result};
use crate::model::{BomLineItem, DEFAULT_VERSION, normalize_version_tag};
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

/// Read access to the versions that exist for a BOM code.
pub trait VersionSource {
    /// Whether any line item exists for the BOM code.
    fn has_bom(&self, bom_code: &str) -> bool;

    /// Number of line items stored under `(bom_code, version_tag)`.
    fn version_item_count(&self, bom_code: &str, version_tag: &str) -> usize;

    /// First-seen version tag of the BOM code.
    fn first_version(&self, bom_code: &str) -> Option<String>;
}

impl VersionSource for [BomLineItem] {
    fn has_bom(&self, bom_code: &str) -> bool {
        self.iter().any(|i| i.bom_code == bom_code)
    }

    fn version_item_count(&self, bom_code: &str, version_tag: &str) -> usize {
        self.iter()
            .filter(|i| {
                i.bom_code == bom_code
                    && normalize_version_tag(Some(&i.version_tag)) == version_tag
            })
            .count()
    }

    fn first_version(&self, bom_code: &str) -> Option<String> {
        self.iter()
            .find(|i| i.bom_code == bom_code)
            .map(|i| normalize_version_tag(Some(&i.version_tag)))
    }
}

/// Outcome of an activation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// The explicit pointer moved (`previous` is `None` if it was implicit)
    Changed { previous: Option<String> },
    /// The tag was already the explicit active version
    Unchanged,
}

/// Maps BOM codes to their explicitly activated version tag.
#[derive(Debug, Default)]
pub struct VersionResolver {
    active: RwLock<HashMap<String, String>>,
}

impl VersionResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a resolver from persisted explicit pointers.
    #[must_use]
    pub fn from_map(active: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            active: RwLock::new(active.into_iter().collect()),
        }
    }

    /// The explicitly activated tag, if any.
    #[must_use]
    pub fn explicit_version(&self, bom_code: &str) -> Option<String> {
        self.active
            .read()
            .expect("active version lock poisoned")
            .get(bom_code)
            .cloned()
    }

    /// The version in force for a BOM code, resolved against its line items.
    ///
    /// Without an explicit pointer, `"default"` is active when it exists and
    /// the first-seen version otherwise. An explicit pointer at a version
    /// with no items is a corrupt state and is rejected.
    pub fn get_active_version<S: VersionSource + ?Sized>(
        &self,
        source: &S,
        bom_code: &str,
    ) -> Result<String> {
        if !source.has_bom(bom_code) {
            return Err(BomReconError::unknown_bom(bom_code));
        }

        if let Some(tag) = self.explicit_version(bom_code) {
            if source.version_item_count(bom_code, &tag) > 0 {
                return Ok(tag);
            }
            tracing::error!(
                "Active version '{}' of BOM {} has no line items",
                tag,
                bom_code
            );
            return Err(BomReconError::invariant(format!(
                "active version '{tag}' of BOM {bom_code} has no line items"
            )));
        }

        if source.version_item_count(bom_code, DEFAULT_VERSION) > 0 {
            return Ok(DEFAULT_VERSION.to_string());
        }
        source
            .first_version(bom_code)
            .ok_or_else(|| BomReconError::unknown_bom(bom_code))
    }

    /// Activate `version_tag` for `bom_code`.
    ///
    /// Fails with `UnknownBomCode` when the BOM has no items and with
    /// `InvalidVersion` when the tag has no items. Re-activating the current
    /// tag succeeds without changing state.
    pub fn set_active_version<S: VersionSource + ?Sized>(
        &self,
        source: &S,
        bom_code: &str,
        version_tag: &str,
    ) -> Result<Activation> {
        let tag = normalize_version_tag(Some(version_tag));
        if !source.has_bom(bom_code) {
            return Err(BomReconError::unknown_bom(bom_code));
        }
        if source.version_item_count(bom_code, &tag) == 0 {
            return Err(BomReconError::invalid_version(bom_code, tag));
        }

        let mut active = self.active.write().expect("active version lock poisoned");
        if active.get(bom_code) == Some(&tag) {
            tracing::debug!("Version '{}' of BOM {} already active", tag, bom_code);
            return Ok(Activation::Unchanged);
        }
        let previous = active.insert(bom_code.to_string(), tag.clone());
        tracing::info!(
            "Activated version '{}' of BOM {} (was {})",
            tag,
            bom_code,
            previous.as_deref().unwrap_or("implicit")
        );
        Ok(Activation::Changed { previous })
    }

    /// Activate `version_tag` only if the explicit pointer still equals
    /// `expected`. Returns `false` when another writer got there first.
    pub fn compare_and_set<S: VersionSource + ?Sized>(
        &self,
        source: &S,
        bom_code: &str,
        expected: Option<&str>,
        version_tag: &str,
    ) -> Result<bool> {
        let tag = normalize_version_tag(Some(version_tag));
        if !source.has_bom(bom_code) {
            return Err(BomReconError::unknown_bom(bom_code));
        }
        if source.version_item_count(bom_code, &tag) == 0 {
            return Err(BomReconError::invalid_version(bom_code, tag));
        }

        let mut active = self.active.write().expect("active version lock poisoned");
        if active.get(bom_code).map(String::as_str) != expected {
            return Ok(false);
        }
        active.insert(bom_code.to_string(), tag);
        Ok(true)
    }

    /// Drop the explicit pointer if it names `version_tag`.
    pub fn clear_if(&self, bom_code: &str, version_tag: &str) -> bool {
        let mut active = self.active.write().expect("active version lock poisoned");
        if active.get(bom_code).map(String::as_str) == Some(version_tag) {
            active.remove(bom_code);
            tracing::info!(
                "Cleared active version '{}' of BOM {}",
                version_tag,
                bom_code
            );
            true
        } else {
            false
        }
    }

    /// Drop the explicit pointer for a BOM code.
    pub fn clear(&self, bom_code: &str) -> Option<String> {
        self.active
            .write()
            .expect("active version lock poisoned")
            .remove(bom_code)
    }

    /// Sorted copy of the explicit pointers, for persistence.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.active
            .read()
            .expect("active version lock poisoned")
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn item(id: u64, code: &str, tag: &str, material: &str) -> BomLineItem {
        BomLineItem {
            id,
            bom_code: code.to_string(),
            version_tag: tag.to_string(),
            part_reference: String::new(),
            material: material.to_string(),
            description: String::new(),
            qty: 1,
        }
    }

    fn items() -> Vec<BomLineItem> {
        vec![
            item(1, "BC-01", "default", "CAP-100"),
            item(2, "BC-01", "rev-b", "CAP-100"),
            item(3, "BC-02", "v1", "RES-220"),
        ]
    }

    #[test]
    fn test_default_when_never_set() {
        let resolver = VersionResolver::new();
        let source = items();
        assert_eq!(
            resolver.get_active_version(source.as_slice(), "BC-01").unwrap(),
            "default"
        );
    }

    #[test]
    fn test_first_version_when_no_default() {
        let resolver = VersionResolver::new();
        let source = items();
        assert_eq!(
            resolver.get_active_version(source.as_slice(), "BC-02").unwrap(),
            "v1"
        );
        assert_eq!(resolver.explicit_version("BC-02"), None);
        assert!(source.version_item_count("BC-02", "v1") > 0);
    }

    #[test]
    fn test_activate_missing_version_fails() {
        let resolver = VersionResolver::new();
        let err = resolver
            .set_active_version(items().as_slice(), "BC-01", "rev-z")
            .unwrap_err();
        assert!(matches!(err, BomReconError::InvalidVersion { .. }));
        assert_eq!(resolver.explicit_version("BC-01"), None);
    }

    #[test]
    fn test_activate_unknown_bom_fails() {
        let resolver = VersionResolver::new();
        let err = resolver
            .set_active_version(items().as_slice(), "BC-99", "default")
            .unwrap_err();
        assert!(matches!(err, BomReconError::UnknownBomCode(_)));
    }

    #[test]
    fn test_activate_twice_is_noop() {
        let resolver = VersionResolver::new();
        let source = items();

        let first = resolver
            .set_active_version(source.as_slice(), "BC-01", "rev-b")
            .unwrap();
        assert_eq!(first, Activation::Changed { previous: None });
        let snapshot = resolver.snapshot();

        let second = resolver
            .set_active_version(source.as_slice(), "BC-01", "rev-b")
            .unwrap();
        assert_eq!(second, Activation::Unchanged);
        assert_eq!(resolver.snapshot(), snapshot);
    }

    #[test]
    fn test_dangling_pointer_is_invariant_violation() {
        let resolver = VersionResolver::from_map([("BC-01".to_string(), "gone".to_string())]);
        let err = resolver
            .get_active_version(items().as_slice(), "BC-01")
            .unwrap_err();
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_compare_and_set() {
        let resolver = VersionResolver::new();
        let source = items();

        assert!(
            resolver
                .compare_and_set(source.as_slice(), "BC-01", None, "rev-b")
                .unwrap()
        );
        assert!(
            !resolver
                .compare_and_set(source.as_slice(), "BC-01", None, "default")
                .unwrap()
        );
        assert_eq!(
            resolver.get_active_version(source.as_slice(), "BC-01").unwrap(),
            "rev-b"
        );
    }

    #[test]
    fn test_concurrent_activation_stores_an_attempted_value() {
        let resolver = Arc::new(VersionResolver::new());
        let source = Arc::new(items());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let resolver = Arc::clone(&resolver);
                let source = Arc::clone(&source);
                std::thread::spawn(move || {
                    let tag = if i % 2 == 0 { "default" } else { "rev-b" };
                    resolver
                        .set_active_version(source.as_slice(), "BC-01", tag)
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let stored = resolver
            .get_active_version(source.as_slice(), "BC-01")
            .unwrap();
        assert!(stored == "default" || stored == "rev-b", "got {stored}");
    }

    #[test]
    fn test_clear_if() {
        let resolver = VersionResolver::new();
        resolver
            .set_active_version(items().as_slice(), "BC-01", "rev-b")
            .unwrap();
        assert!(!resolver.clear_if("BC-01", "default"));
        assert!(resolver.clear_if("BC-01", "rev-b"));
        assert_eq!(resolver.explicit_version("BC-01"), None);
    }
}
