use std::collections::BTreeMap;

use tracing::debug;

use crate::{SloadTracer, Tracer, TracerError};

/// A zero-argument constructor producing a fresh tracer for one transaction.
pub type TracerConstructor = fn() -> Box<dyn Tracer>;

/// Tracer constructors looked up by name.
///
/// The host decides when to instantiate a tracer and attach it to an execution; the registry
/// only maps the name a user asks for to a constructor.
#[derive(Debug, Clone, Default)]
pub struct TracerRegistry {
    constructors: BTreeMap<&'static str, TracerConstructor>,
}

impl TracerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the tracers provided by this crate.
    pub fn native() -> Self {
        let mut registry = Self::new();
        registry.register(SloadTracer::NAME, new_sload_tracer);
        registry
    }

    /// Register `constructor` under `name`, returning the constructor it replaces, if any.
    pub fn register(
        &mut self,
        name: &'static str,
        constructor: TracerConstructor,
    ) -> Option<TracerConstructor> {
        self.constructors.insert(name, constructor)
    }

    /// Instantiate the tracer registered under `name`.
    pub fn create(&self, name: &str) -> Result<Box<dyn Tracer>, TracerError> {
        let constructor =
            self.constructors.get(name).ok_or_else(|| TracerError::UnknownTracer(name.to_string()))?;
        debug!(tracer = name, "Instantiating tracer");
        Ok(constructor())
    }

    /// Returns `true` if a tracer is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Registered names, in lexical order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.constructors.keys().copied()
    }
}

fn new_sload_tracer() -> Box<dyn Tracer> {
    Box::new(SloadTracer::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_registry_has_sload_tracer() {
        let registry = TracerRegistry::native();
        assert!(registry.contains("sloadTracer"));
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["sloadTracer"]);
    }

    #[test]
    fn test_each_create_returns_fresh_tracer() {
        let registry = TracerRegistry::native();
        let first = registry.create("sloadTracer").unwrap();
        let second = registry.create("sloadTracer").unwrap();
        first.interrupt_handle().stop("cancelled");
        assert!(first.interrupt_handle().is_interrupted());
        assert!(!second.interrupt_handle().is_interrupted());
    }

    #[test]
    fn test_unknown_tracer() {
        let err = TracerRegistry::native().create("callTracer").unwrap_err();
        assert!(matches!(err, TracerError::UnknownTracer(name) if name == "callTracer"));
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = TracerRegistry::new();
        assert!(registry.register("storage", new_sload_tracer).is_none());
        assert!(registry.register("storage", new_sload_tracer).is_some());
    }
}
