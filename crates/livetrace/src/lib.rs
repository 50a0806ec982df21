//! # livetrace
//!
//! Pluggable live tracing for block execution.
//!
//! A live tracer is a bundle of callbacks ([`Hooks`]) the execution engine
//! invokes while it processes blocks: chain lifecycle events plus the
//! engine's fine-grained [`EvmHooks`](livetrace_vm::EvmHooks). Tracer kinds
//! are compiled in and registered by name in a [`LiveTracerRegistry`]; the
//! operator selects one with a string such as `firehose` or
//! `firehose://localhost:8080?buffer=4096`.
//!
//! ## Startup
//!
//! ```text
//! 1. Every tracer kind registers its factory in a LiveTracerRegistry
//! 2. install_global_registry freezes the registry
//! 3. new_live_tracer parses the operator value, builds and initializes the bundle
//! 4. set_ctx_live_tracer binds the bundle to the execution context
//! 5. The engine reads it back with get_ctx_live_tracer while processing blocks
//! ```

pub mod context;
pub mod error;
pub mod hooks;
pub mod identifier;
pub mod registry;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use livetrace_common::types::ChainConfig;
use tracing::{debug, info};

pub use context::{
    ContextKey, ExecutionContext, LIVE_TRACER_CONTEXT_KEY, get_ctx_live_tracer,
    set_ctx_live_tracer,
};
pub use error::{BoxError, TracerError};
pub use hooks::Hooks;
pub use identifier::TracerIdentifier;
pub use registry::{LiveTracerRegistry, TracerFactory, global_registry, install_global_registry};

/// Resolves `tracer_identifier` against `registry` into an initialized bundle.
///
/// The bundle's `on_chain_init` hook has already run with `chain_config` when
/// this returns `Ok`. On error no bundle exists, and when the selector is not
/// registered no factory was invoked.
pub fn new_live_tracer(
    registry: &LiveTracerRegistry,
    tracer_identifier: &str,
    chain_config: &ChainConfig,
) -> Result<Arc<Hooks>, TracerError> {
    resolve(registry, tracer_identifier, chain_config)
        .inspect_err(|err| debug!(tracer = tracer_identifier, %err, "Failed to create live tracer"))
}

/// Same as [`new_live_tracer`], against the registry installed with
/// [`install_global_registry`].
pub fn new_live_tracer_from_global(
    tracer_identifier: &str,
    chain_config: &ChainConfig,
) -> Result<Arc<Hooks>, TracerError> {
    let registry = global_registry().ok_or(TracerError::RegistryNotInstalled)?;
    new_live_tracer(registry, tracer_identifier, chain_config)
}

fn resolve(
    registry: &LiveTracerRegistry,
    tracer_identifier: &str,
    chain_config: &ChainConfig,
) -> Result<Arc<Hooks>, TracerError> {
    let identifier = TracerIdentifier::parse(tracer_identifier)?;
    let selector = identifier.selector();

    let factory =
        registry
            .get_factory_by_id(selector)
            .ok_or_else(|| TracerError::UnknownTracer {
                selector: selector.to_owned(),
            })?;

    let hooks = factory(&identifier).map_err(|source| TracerError::TracerConstructionFailed {
        selector: selector.to_owned(),
        source,
    })?;

    hooks.chain_init(chain_config);
    info!(tracer = selector, chain_id = chain_config.chain_id, "Live tracer enabled");

    Ok(Arc::new(hooks))
}
