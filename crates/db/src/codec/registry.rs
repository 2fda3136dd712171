//! Lookup from entity-type or collection key to codec.

use std::collections::HashMap;
use std::sync::Arc;

use super::catalog::CATALOG;
use super::generic::GenericCodec;
use super::table::{TableCodec, TableSpec};
use super::{CodecError, EntityCodec};

/// Maps entity keys to codecs, with [`GenericCodec`] as the fallback.
///
/// Shared across tasks via `Arc<CodecRegistry>`; it is immutable once built.
#[derive(Debug, Clone)]
pub struct CodecRegistry {
    codecs: HashMap<&'static str, Arc<dyn EntityCodec>>,
}

impl CodecRegistry {
    /// A registry with no dedicated codecs; every lookup falls back.
    pub fn empty() -> Self {
        Self {
            codecs: HashMap::new(),
        }
    }

    /// A registry holding a [`TableCodec`] for every entry in the catalog.
    pub fn with_catalog() -> Self {
        let mut registry = Self::empty();
        for spec in CATALOG {
            registry.register_table(spec);
        }
        registry
    }

    /// Register a codec under one or more keys. Later registrations win.
    pub fn register(&mut self, keys: &[&'static str], codec: Arc<dyn EntityCodec>) {
        for key in keys {
            self.codecs.insert(*key, Arc::clone(&codec));
        }
    }

    /// Register a table codec under both its entity type and collection.
    pub fn register_table(&mut self, spec: &'static TableSpec) {
        self.register(
            &[spec.entity_type, spec.collection],
            Arc::new(TableCodec::new(spec)),
        );
    }

    /// Returns `true` if `key` has a dedicated codec.
    pub fn is_registered(&self, key: &str) -> bool {
        self.codecs.contains_key(key)
    }

    /// Resolve the codec for `key`.
    ///
    /// Unregistered keys get a [`GenericCodec`], which fails with
    /// [`CodecError::InvalidIdentifier`] unless `key` is an allow-listed
    /// top-level collection.
    pub fn resolve(&self, key: &str) -> Result<Arc<dyn EntityCodec>, CodecError> {
        match self.codecs.get(key) {
            Some(codec) => Ok(Arc::clone(codec)),
            None => Ok(Arc::new(GenericCodec::new(key)?)),
        }
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::with_catalog()
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn resolves_entity_type_and_collection_to_same_table() {
        let registry = CodecRegistry::with_catalog();
        assert_eq!(registry.resolve("work_order").unwrap().collection(), "work_orders");
        assert_eq!(registry.resolve("work_orders").unwrap().collection(), "work_orders");
        assert_eq!(registry.resolve("purchase_order").unwrap().collection(), "purchase_orders");
    }

    #[test]
    fn unregistered_collection_falls_back() {
        let registry = CodecRegistry::with_catalog();
        assert!(!registry.is_registered("rmas"));
        assert_eq!(registry.resolve("rmas").unwrap().collection(), "rmas");
    }

    #[test]
    fn unknown_key_is_invalid_identifier() {
        let registry = CodecRegistry::with_catalog();
        assert_matches!(
            registry.resolve("users"),
            Err(CodecError::InvalidIdentifier(name)) if name == "users"
        );
    }

    #[test]
    fn child_table_is_not_resolvable() {
        let registry = CodecRegistry::with_catalog();
        assert_matches!(
            registry.resolve("po_lines"),
            Err(CodecError::InvalidIdentifier(name)) if name == "po_lines"
        );
    }

    #[test]
    fn empty_registry_uses_generic_for_id_keyed_collections() {
        let registry = CodecRegistry::empty();
        assert!(!registry.is_registered("work_orders"));
        assert_eq!(registry.resolve("work_orders").unwrap().collection(), "work_orders");
        assert_matches!(registry.resolve("parts"), Err(CodecError::UnsupportedEntity(_)));
    }
}
