//! Compiled data-access models cached per (context type, tenant schema, design-time flag).
//!
//! A model holds everything derived from the schema name: qualified table names and the
//! SQL text built from them. Keying on the schema keeps one tenant's model from ever
//! serving another tenant's request. Entries are never evicted.

use crate::tenant::{TenantContext, TenantSchema};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// A data-access context bound to one unit of work's tenant selection.
pub trait TenantDbContext: 'static {
    type Model: Send + Sync + 'static;

    fn tenant(&self) -> &TenantContext;

    /// Build the compiled model for `schema`. Called at most once per cache key.
    fn build_model(schema: &TenantSchema, design_time: bool) -> Self::Model;
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ModelCacheKey {
    context_type: TypeId,
    context_name: &'static str,
    schema: TenantSchema,
    design_time: bool,
}

impl ModelCacheKey {
    pub fn schema(&self) -> &TenantSchema {
        &self.schema
    }

    pub fn context_name(&self) -> &'static str {
        self.context_name
    }

    pub fn design_time(&self) -> bool {
        self.design_time
    }
}

pub struct ModelCacheKeyFactory;

impl ModelCacheKeyFactory {
    /// Key for `ctx` as it stands now. Reads the tenant context, never writes it.
    pub fn create<C: TenantDbContext>(ctx: &C, design_time: bool) -> ModelCacheKey {
        ModelCacheKey {
            context_type: TypeId::of::<C>(),
            context_name: std::any::type_name::<C>(),
            schema: ctx.tenant().get().clone(),
            design_time,
        }
    }
}

type Entry = Arc<dyn Any + Send + Sync>;

/// Shared across requests; read-mostly after warm-up.
pub struct ModelCache {
    entries: RwLock<HashMap<ModelCacheKey, Entry>>,
    warn_threshold: usize,
    warned: AtomicBool,
}

impl ModelCache {
    pub fn new(warn_threshold: usize) -> Self {
        ModelCache {
            entries: RwLock::new(HashMap::new()),
            warn_threshold,
            warned: AtomicBool::new(false),
        }
    }

    /// Return the model for `ctx`'s current schema, building it on first use.
    pub fn get_or_build<C: TenantDbContext>(&self, ctx: &C, design_time: bool) -> Arc<C::Model> {
        let key = ModelCacheKeyFactory::create(ctx, design_time);
        if let Some(model) = self.lookup::<C>(&key) {
            return model;
        }

        let mut guard = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(model) = guard.get(&key).cloned().and_then(|e| e.downcast::<C::Model>().ok()) {
            return model;
        }
        tracing::debug!(
            context = key.context_name,
            schema = %key.schema,
            design_time,
            "building model"
        );
        let model = Arc::new(C::build_model(&key.schema, design_time));
        guard.insert(key, model.clone() as Entry);
        let len = guard.len();
        drop(guard);
        self.check_capacity(len);
        model
    }

    fn lookup<C: TenantDbContext>(&self, key: &ModelCacheKey) -> Option<Arc<C::Model>> {
        let guard = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        guard.get(key).cloned().and_then(|e| e.downcast::<C::Model>().ok())
    }

    fn check_capacity(&self, len: usize) {
        if len > self.warn_threshold {
            if !self.warned.swap(true, Ordering::Relaxed) {
                tracing::warn!(
                    cached_models = len,
                    threshold = self.warn_threshold,
                    "model cache exceeds threshold; entries are never evicted"
                );
            }
        } else {
            self.warned.store(false, Ordering::Relaxed);
        }
    }

    pub fn contains(&self, key: &ModelCacheKey) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
