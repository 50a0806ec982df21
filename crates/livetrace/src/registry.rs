use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use tracing::debug;

use crate::error::{BoxError, TracerError};
use crate::hooks::Hooks;
use crate::identifier::TracerIdentifier;

/// Builds a tracer's [`Hooks`] from the identifier it was selected with.
///
/// The identifier carries the full parsed form of the operator's value, so a
/// factory can read its own settings from the host, path or query.
pub type TracerFactory =
    Arc<dyn Fn(&TracerIdentifier) -> Result<Hooks, BoxError> + Send + Sync>;

/// Registry mapping a selector (`"firehose"`, `"noop"`, ...) to the factory of
/// that tracer kind.
///
/// The registry is filled once at startup by every compiled-in tracer and is
/// read-only afterwards: [`install_global_registry`] moves it into the process
/// global, after which only shared references exist.
#[derive(Clone, Default)]
pub struct LiveTracerRegistry {
    tracers: HashMap<String, TracerFactory>,
}

impl LiveTracerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tracer factory under `id`. Registering an `id` twice
    /// replaces the previous factory, so an operator build can override a
    /// default tracer.
    pub fn register<F>(&mut self, id: impl Into<String>, factory: F)
    where
        F: Fn(&TracerIdentifier) -> Result<Hooks, BoxError> + Send + Sync + 'static,
    {
        let id = id.into();
        if self.tracers.insert(id.clone(), Arc::new(factory)).is_some() {
            debug!(tracer = %id, "Replaced previously registered live tracer");
        }
    }

    /// Look up the factory registered under `id`.
    pub fn get_factory_by_id(&self, id: &str) -> Option<&TracerFactory> {
        self.tracers.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.tracers.contains_key(id)
    }

    /// Return all registered selectors, sorted.
    pub fn selectors(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.tracers.keys().map(|s| s.as_str()).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.tracers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracers.is_empty()
    }
}

impl fmt::Debug for LiveTracerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveTracerRegistry")
            .field("tracers", &self.selectors())
            .finish()
    }
}

static GLOBAL_LIVE_TRACER_REGISTRY: OnceLock<LiveTracerRegistry> = OnceLock::new();

/// Freezes `registry` as the process-wide registry. Must be called once,
/// after every tracer registered and before the first resolution.
pub fn install_global_registry(
    registry: LiveTracerRegistry,
) -> Result<&'static LiveTracerRegistry, TracerError> {
    GLOBAL_LIVE_TRACER_REGISTRY
        .set(registry)
        .map_err(|_| TracerError::RegistryAlreadyInstalled)?;
    let registry = GLOBAL_LIVE_TRACER_REGISTRY
        .get()
        .ok_or(TracerError::RegistryNotInstalled)?;
    debug!(tracers = ?registry.selectors(), "Installed live tracer registry");
    Ok(registry)
}

/// The process-wide registry, once installed.
pub fn global_registry() -> Option<&'static LiveTracerRegistry> {
    GLOBAL_LIVE_TRACER_REGISTRY.get()
}
