use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use tracing::{debug, warn};

use crate::error::RegistryError;
use crate::leaf::Leaf;

/// Zero-argument constructor for a fresh leaf instance.
pub type LeafFactory = Box<dyn Fn() -> Box<dyn Leaf> + Send + Sync>;

static GLOBAL: OnceLock<LeafRegistry> = OnceLock::new();

/// Catalog of leaf factories keyed by leaf id.
///
/// Registration is a startup-time, single-writer step: fill a registry, then
/// share it immutably (`&LeafRegistry`, or [`LeafRegistry::install_global`])
/// with every engine. A frozen registry needs no lock to read.
#[derive(Default)]
pub struct LeafRegistry {
    factories: BTreeMap<String, LeafFactory>,
}

impl LeafRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` under `id`.
    ///
    /// Re-registering an id replaces the previous factory and logs a warning;
    /// the return value tells whether that happened.
    pub fn register(&mut self, id: impl Into<String>, factory: LeafFactory) -> Result<bool, RegistryError> {
        let id = id.into();
        if id.is_empty() {
            return Err(RegistryError::EmptyLeafId);
        }

        let replaced = self.factories.insert(id.clone(), factory).is_some();
        if replaced {
            warn!(leaf_id = %id, "Leaf factory re-registered; previous factory replaced");
        } else {
            debug!(leaf_id = %id, "Leaf factory registered");
        }
        Ok(replaced)
    }

    pub fn register_fn<F, L>(&mut self, id: impl Into<String>, make: F) -> Result<bool, RegistryError>
    where
        F: Fn() -> L + Send + Sync + 'static,
        L: Leaf,
    {
        self.register(id, Box::new(move || Box::new(make()) as Box<dyn Leaf>))
    }

    pub fn register_default<L>(&mut self, id: impl Into<String>) -> Result<bool, RegistryError>
    where
        L: Leaf + Default,
    {
        self.register_fn(id, L::default)
    }

    /// A fresh instance, or `None` when nothing is registered under `id`.
    pub fn create(&self, id: &str) -> Option<Box<dyn Leaf>> {
        self.factories.get(id).map(|make| make())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Freeze this registry as the process-wide one. Only the first call wins.
    pub fn install_global(self) -> Result<&'static LeafRegistry, RegistryError> {
        let mut installed = false;
        let registry = GLOBAL.get_or_init(|| {
            installed = true;
            self
        });
        if installed {
            debug!(leaves = registry.len(), "Global leaf registry installed");
            Ok(registry)
        } else {
            Err(RegistryError::GlobalAlreadyInstalled)
        }
    }

    pub fn global() -> Option<&'static LeafRegistry> {
        GLOBAL.get()
    }
}

impl fmt::Debug for LeafRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeafRegistry")
            .field("ids", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}
