//! Plugin module surface and the startup registry.
//!
//! Modules are resolved through an explicit lookup table built at
//! startup: plugin name → dependency declaration, optional pre-load
//! migration step, and a factory building the module instance from the
//! plugin's opaque configuration fragment. No filesystem scanning or
//! reflection is involved.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::error::BoxError;
use crate::hooks::{HookArgs, HookKind};

/// The surface a plugin module exposes to the lifecycle runtime.
///
/// A module declares which hook kinds it implements; only those are
/// registered, and dispatching any other kind is an explicit no-op.
#[async_trait]
pub trait PluginModule: Send + Sync {
    /// The hook kinds this module implements.
    fn hooks(&self) -> Vec<HookKind>;

    /// Invokes one of the module's hooks.
    ///
    /// Called only for kinds returned by [`hooks`](Self::hooks), always
    /// through the error boundary. Errors are attributed to this plugin
    /// and never escape as bare errors.
    async fn invoke(
        &self,
        kind: HookKind,
        args: HookArgs,
    ) -> Result<Option<serde_json::Value>, BoxError>;
}

/// Pre-load setup step (e.g. a storage migration).
///
/// Idempotent: run before every load attempt, safe to run when already
/// applied.
pub type MigrationFn = Arc<dyn Fn() -> BoxFuture<'static, Result<(), BoxError>> + Send + Sync>;

/// Builds a module instance from the plugin's configuration fragment.
pub type ModuleFactory =
    Arc<dyn Fn(serde_json::Value) -> Result<Arc<dyn PluginModule>, BoxError> + Send + Sync>;

/// One registered plugin: dependency declaration, optional migration
/// step, and the instance factory.
#[derive(Clone)]
pub struct ModuleDefinition {
    pub(crate) dependencies: Vec<String>,
    pub(crate) migration: Option<MigrationFn>,
    pub(crate) factory: ModuleFactory,
}

impl ModuleDefinition {
    /// Creates a definition from a factory closure.
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn(serde_json::Value) -> Result<Arc<dyn PluginModule>, BoxError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            dependencies: Vec::new(),
            migration: None,
            factory: Arc::new(factory),
        }
    }

    /// Declares the plugins this one depends on.
    ///
    /// The declaration is an ordered list of plain names; the runtime
    /// does not interpret versions or ranges.
    pub fn with_dependencies(mut self, dependencies: &[&str]) -> Self {
        self.dependencies = dependencies.iter().map(|d| d.to_string()).collect();
        self
    }

    /// Attaches a pre-load migration step.
    pub fn with_migration<F, Fut>(mut self, migration: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        self.migration = Some(Arc::new(move || Box::pin(migration())));
        self
    }
}

impl std::fmt::Debug for ModuleDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleDefinition")
            .field("dependencies", &self.dependencies)
            .field("has_migration", &self.migration.is_some())
            .finish()
    }
}

/// Lookup table from plugin name to module definition, built once at
/// process startup by the embedding host.
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    entries: HashMap<String, ModuleDefinition>,
}

impl ModuleRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a module definition under a plugin name.
    ///
    /// Re-registering a name replaces the previous definition.
    pub fn register(&mut self, name: &str, definition: ModuleDefinition) {
        self.entries.insert(name.to_string(), definition);
    }

    /// Returns whether a module is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Looks up a module definition.
    pub fn get(&self, name: &str) -> Option<&ModuleDefinition> {
        self.entries.get(name)
    }

    /// Returns the dependency declaration for a plugin, if it has one.
    pub fn dependencies(&self, name: &str) -> Option<&[String]> {
        self.entries
            .get(name)
            .filter(|e| !e.dependencies.is_empty())
            .map(|e| e.dependencies.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct NullModule;

    #[async_trait]
    impl PluginModule for NullModule {
        fn hooks(&self) -> Vec<HookKind> {
            Vec::new()
        }

        async fn invoke(
            &self,
            _kind: HookKind,
            _args: HookArgs,
        ) -> Result<Option<serde_json::Value>, BoxError> {
            Ok(None)
        }
    }

    #[test]
    fn absent_declaration_means_no_dependencies() {
        let mut registry = ModuleRegistry::new();
        registry.register("solo", ModuleDefinition::new(|_| Ok(Arc::new(NullModule))));

        assert!(registry.contains("solo"));
        assert!(registry.dependencies("solo").is_none());
        assert!(registry.dependencies("missing").is_none());
    }

    #[test]
    fn declared_dependencies_keep_order() {
        let mut registry = ModuleRegistry::new();
        registry.register(
            "webgui",
            ModuleDefinition::new(|_| Ok(Arc::new(NullModule)))
                .with_dependencies(&["account", "flowsaver"]),
        );

        assert_eq!(
            registry.dependencies("webgui").unwrap(),
            &["account".to_string(), "flowsaver".to_string()]
        );
    }
}
