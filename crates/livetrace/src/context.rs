//! Per-request execution context.
//!
//! An [`ExecutionContext`] is an immutable chain of keyed values. Deriving a
//! context with [`ExecutionContext::with_value`] never touches the parent:
//! the new binding shadows any earlier one under the same key for the derived
//! context and everything derived from it. Contexts are cheap to clone and can
//! be handed to nested execution code instead of threading every collaborator
//! through function arguments.
//!
//! The live tracer travels under [`LIVE_TRACER_CONTEXT_KEY`]; use
//! [`set_ctx_live_tracer`] and [`get_ctx_live_tracer`] rather than the raw key.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::hooks::Hooks;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ContextKey(&'static str);

impl ContextKey {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn name(&self) -> &'static str {
        self.0
    }
}

/// Key the active live tracer is bound under.
pub const LIVE_TRACER_CONTEXT_KEY: ContextKey = ContextKey::new("evm_and_state_logger");

struct ContextNode {
    key: ContextKey,
    value: Arc<dyn Any + Send + Sync>,
    parent: Option<Arc<ContextNode>>,
}

#[derive(Clone, Default)]
pub struct ExecutionContext {
    head: Option<Arc<ContextNode>>,
}

impl ExecutionContext {
    /// An empty root context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a derived context where `key` maps to `value`.
    pub fn with_value<T: Any + Send + Sync>(&self, key: ContextKey, value: T) -> Self {
        Self {
            head: Some(Arc::new(ContextNode {
                key,
                value: Arc::new(value),
                parent: self.head.clone(),
            })),
        }
    }

    /// The innermost value bound under `key`, if it is a `T`.
    ///
    /// A value of another type under `key` reads as `None`; lookup does not
    /// continue to outer bindings, which stay shadowed.
    pub fn value<T: Any + Send + Sync>(&self, key: ContextKey) -> Option<&T> {
        let mut node = self.head.as_deref();
        while let Some(current) = node {
            if current.key == key {
                return current.value.downcast_ref::<T>();
            }
            node = current.parent.as_deref();
        }
        None
    }

    fn keys(&self) -> Vec<&'static str> {
        let mut keys = Vec::new();
        let mut node = self.head.as_deref();
        while let Some(current) = node {
            keys.push(current.key.name());
            node = current.parent.as_deref();
        }
        keys
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("keys", &self.keys())
            .finish()
    }
}

/// Returns a context derived from `ctx` carrying `hooks` as the live tracer.
pub fn set_ctx_live_tracer(ctx: &ExecutionContext, hooks: Arc<Hooks>) -> ExecutionContext {
    ctx.with_value(LIVE_TRACER_CONTEXT_KEY, hooks)
}

/// The live tracer bound to `ctx`, or `None` when tracing is disabled for it.
pub fn get_ctx_live_tracer(ctx: &ExecutionContext) -> Option<Arc<Hooks>> {
    ctx.value::<Arc<Hooks>>(LIVE_TRACER_CONTEXT_KEY).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_context_has_no_tracer() {
        assert!(get_ctx_live_tracer(&ExecutionContext::new()).is_none());
    }

    #[test]
    fn bound_tracer_is_returned_as_is() {
        let hooks = Arc::new(Hooks::default());
        let ctx = set_ctx_live_tracer(&ExecutionContext::new(), hooks.clone());

        let found = get_ctx_live_tracer(&ctx).expect("tracer bound");
        assert!(Arc::ptr_eq(&found, &hooks));
    }

    #[test]
    fn derived_context_inherits_tracer() {
        let hooks = Arc::new(Hooks::default());
        let ctx = set_ctx_live_tracer(&ExecutionContext::new(), hooks.clone());
        let derived = ctx
            .with_value(ContextKey::new("block_number"), 7u64)
            .with_value(ContextKey::new("tx_index"), 2usize);

        let found = get_ctx_live_tracer(&derived).expect("tracer inherited");
        assert!(Arc::ptr_eq(&found, &hooks));
        assert_eq!(derived.value::<u64>(ContextKey::new("block_number")), Some(&7));
    }

    #[test]
    fn rebinding_shadows_only_the_subtree() {
        let outer = Arc::new(Hooks::default());
        let inner = Arc::new(Hooks::default());
        let parent = set_ctx_live_tracer(&ExecutionContext::new(), outer.clone());
        let child = set_ctx_live_tracer(&parent, inner.clone());

        let in_child = get_ctx_live_tracer(&child).expect("tracer bound");
        let in_parent = get_ctx_live_tracer(&parent).expect("tracer bound");
        assert!(Arc::ptr_eq(&in_child, &inner));
        assert!(Arc::ptr_eq(&in_parent, &outer));
    }

    #[test]
    fn foreign_value_under_key_reads_as_absent() {
        let ctx = ExecutionContext::new().with_value(LIVE_TRACER_CONTEXT_KEY, "not a tracer");
        assert!(get_ctx_live_tracer(&ctx).is_none());
    }

    #[test]
    fn foreign_value_shadows_outer_tracer() {
        let hooks = Arc::new(Hooks::default());
        let ctx = set_ctx_live_tracer(&ExecutionContext::new(), hooks)
            .with_value(LIVE_TRACER_CONTEXT_KEY, 42u8);
        assert!(get_ctx_live_tracer(&ctx).is_none());
    }

    #[test]
    fn context_is_shareable_across_threads() {
        let hooks = Arc::new(Hooks::default());
        let ctx = set_ctx_live_tracer(&ExecutionContext::new(), hooks.clone());

        let found = std::thread::spawn(move || get_ctx_live_tracer(&ctx))
            .join()
            .expect("thread panicked")
            .expect("tracer bound");
        assert!(Arc::ptr_eq(&found, &hooks));
    }

    #[test]
    fn debug_lists_keys_innermost_first() {
        let ctx = ExecutionContext::new()
            .with_value(ContextKey::new("outer"), 1u8)
            .with_value(ContextKey::new("inner"), 2u8);
        assert_eq!(
            format!("{ctx:?}"),
            r#"ExecutionContext { keys: ["inner", "outer"] }"#
        );
    }
}
