//! Statistics Registry
//!
//! A typed-slot registry passes use to publish intermediate volumes for
//! debugging and profiling tooling. It is threaded explicitly through the
//! frame context rather than living behind a process-wide singleton, so
//! tests substitute a fresh registry per test and the hot path never
//! depends on its presence for correctness.
//!
//! Publishing a volume here is purely observational: the registry holds a
//! second `Arc` to the volume and nothing else; ownership of the GPU
//! resources stays with the creating pass.

use std::any::{Any, TypeId};
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::graph::volume::RenderVolume;

/// Registry of statistics objects, keyed by concrete type.
#[derive(Default)]
pub struct StatisticsRegistry {
    objects: FxHashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl StatisticsRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The statistics object of type `T`, created on first access.
    pub fn get_or_default<T: Default + Send + Sync + 'static>(&mut self) -> &mut T {
        self.objects
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(T::default()))
            .downcast_mut::<T>()
            .expect("slot type is fixed by its TypeId key")
    }

    /// The statistics object of type `T`, if any pass published into it.
    #[must_use]
    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.objects
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref::<T>())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

// ─── Shipped statistics objects ───────────────────────────────────────────────

/// Intermediate volumes of the SSAO chain.
#[derive(Default)]
pub struct SsaoStatistics {
    pub samples_volume: Option<Arc<dyn RenderVolume>>,
    pub noise_volume: Option<Arc<dyn RenderVolume>>,
    pub ssao_map_volume: Option<Arc<dyn RenderVolume>>,
    pub blur_map_volume: Option<Arc<dyn RenderVolume>>,
    pub temporal_filter_map_volume: Option<Arc<dyn RenderVolume>>,
}

/// Intermediate volumes of the bloom chain.
#[derive(Default)]
pub struct BloomStatistics {
    pub bright_pixels_volume: Option<Arc<dyn RenderVolume>>,
    pub bloom_map_volume: Option<Arc<dyn RenderVolume>>,
}

/// Last shadow map rendered per light type.
#[derive(Default)]
pub struct ShadowMapStatistics {
    pub directional_shadow_map_volume: Option<Arc<dyn RenderVolume>>,
    pub spot_shadow_map_volume: Option<Arc<dyn RenderVolume>>,
}

/// Screen-space reflection intermediates.
#[derive(Default)]
pub struct SsrStatistics {
    pub reflection_map_volume: Option<Arc<dyn RenderVolume>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_keeps_one_slot_per_type() {
        let mut stats = StatisticsRegistry::new();
        stats.get_or_default::<SsaoStatistics>();
        stats.get_or_default::<SsaoStatistics>();
        stats.get_or_default::<BloomStatistics>();
        assert_eq!(stats.len(), 2);
    }

    #[test]
    fn absent_slot_reads_as_none() {
        let stats = StatisticsRegistry::new();
        assert!(stats.get::<ShadowMapStatistics>().is_none());
    }
}
