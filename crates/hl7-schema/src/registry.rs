//! Concurrent schema registry

use crate::model::MessageSchema;
use crate::Result;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

/// Process-wide cache of resolved message schemas, keyed by message type.
///
/// Schemas are immutable once registered and handed out as `Arc`s. Loading
/// through [`ConcurrentSchemaRegistry::get_or_try_load`] holds the key's shard
/// lock for the duration of the load, so concurrent requests for the same
/// uncached type run the loader once.
#[derive(Debug, Default)]
pub struct ConcurrentSchemaRegistry {
    schemas: DashMap<String, Arc<MessageSchema>>,
}

impl ConcurrentSchemaRegistry {
    /// Create a new empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema, replacing any previous one under the same name
    pub fn register(&self, name: impl Into<String>, schema: MessageSchema) -> Arc<MessageSchema> {
        let schema = Arc::new(schema);
        self.schemas.insert(name.into(), Arc::clone(&schema));
        schema
    }

    /// Get a schema by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<MessageSchema>> {
        self.schemas.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Return the cached schema, or run `load` and cache its result.
    ///
    /// A failed load caches nothing.
    pub fn get_or_try_load<F>(&self, name: &str, load: F) -> Result<Arc<MessageSchema>>
    where
        F: FnOnce() -> Result<MessageSchema>,
    {
        let entry = self
            .schemas
            .entry(name.to_string())
            .or_try_insert_with(|| {
                debug!("Loading schema into registry: {}", name);
                load().map(Arc::new)
            })?;
        Ok(Arc::clone(entry.value()))
    }

    /// Check if a schema exists
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Names of all cached schemas
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.schemas.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Occurs, SchemaElement};
    use crate::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    fn schema(name: &str) -> MessageSchema {
        MessageSchema::new(name, vec![SchemaElement::segment("MSH", Occurs::required())])
    }

    #[test]
    fn test_register_and_get() {
        let registry = ConcurrentSchemaRegistry::new();
        assert!(registry.is_empty());
        registry.register("ADT_A01", schema("ADT_A01"));

        assert!(registry.contains("ADT_A01"));
        assert_eq!(registry.get("ADT_A01").unwrap().message_type, "ADT_A01");
        assert!(registry.get("ORU_R01").is_none());
        assert_eq!(registry.names(), vec!["ADT_A01".to_string()]);
    }

    #[test]
    fn test_failed_load_is_not_cached() {
        let registry = ConcurrentSchemaRegistry::new();
        let result = registry.get_or_try_load("ZZZ_Z01", || Err(Error::not_found("ZZZ_Z01")));
        assert!(matches!(result, Err(Error::NotFound(_))));
        assert!(!registry.contains("ZZZ_Z01"));
    }

    #[test]
    fn test_concurrent_load_runs_once() {
        let registry = Arc::new(ConcurrentSchemaRegistry::new());
        let loads = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let loads = Arc::clone(&loads);
                thread::spawn(move || {
                    registry
                        .get_or_try_load("ORU_R01", || {
                            loads.fetch_add(1, Ordering::SeqCst);
                            Ok(schema("ORU_R01"))
                        })
                        .unwrap()
                })
            })
            .collect();

        let schemas: Vec<Arc<MessageSchema>> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert!(schemas.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(registry.len(), 1);
    }
}
