//! Iteration Providers
//!
//! A volume provider decides how many times, and over what dynamic set, a
//! container's children re-execute. The two shipped strategies cover the
//! tree's needs: a fixed count for multi-pass effects (blur ping-pong), and
//! per-light enumeration for the three light-type containers.
//!
//! Providers are restartable: `iterations` is re-evaluated every frame from
//! the scene alone, and `enter_iteration` recreates each per-iteration
//! context from scratch, so a provider carries no mutable frame state.

use std::sync::Arc;

use crate::errors::{RenderError, Result};
use crate::graph::collection::RenderVolumeCollection;
use crate::graph::volume::LightVolume;
use crate::scene::{LightKind, RenderScene};

/// Well-known collection key under which light providers publish the
/// current-light context for one iteration.
pub const CURRENT_LIGHT_VOLUME: &str = "currentLight";

/// Strategy deciding a container's iteration behavior.
pub trait VolumeProvider {
    /// Number of child-sequence sweeps for this frame's scene.
    fn iterations(&self, scene: &RenderScene) -> usize;

    /// Publishes per-iteration context into the freshly opened scope.
    ///
    /// Called once per sweep, after the container pushed the iteration
    /// scope and before any child runs.
    fn enter_iteration(
        &self,
        _scene: &RenderScene,
        _index: usize,
        _volumes: &mut RenderVolumeCollection,
    ) -> Result<()> {
        Ok(())
    }
}

/// Re-executes the child sequence a fixed number of times, regardless of
/// scene content. Count 1 is the plain grouping container; count 0 turns
/// the container into a no-op.
#[derive(Debug, Clone, Copy)]
pub struct IterateOverVolumeCollection {
    count: usize,
}

impl IterateOverVolumeCollection {
    #[must_use]
    pub fn new(count: usize) -> Self {
        Self { count }
    }
}

impl VolumeProvider for IterateOverVolumeCollection {
    fn iterations(&self, _scene: &RenderScene) -> usize {
        self.count
    }
}

/// Enumerates the scene's lights of one type; the child sequence runs once
/// per light with that light published under [`CURRENT_LIGHT_VOLUME`].
///
/// Zero lights of the type means zero sweeps, silently.
#[derive(Debug, Clone, Copy)]
pub struct LightVolumeCollection {
    kind: LightKind,
}

impl LightVolumeCollection {
    #[must_use]
    pub fn new(kind: LightKind) -> Self {
        Self { kind }
    }

    #[must_use]
    pub fn directional() -> Self {
        Self::new(LightKind::Directional)
    }

    #[must_use]
    pub fn point() -> Self {
        Self::new(LightKind::Point)
    }

    #[must_use]
    pub fn spot() -> Self {
        Self::new(LightKind::Spot)
    }
}

impl VolumeProvider for LightVolumeCollection {
    fn iterations(&self, scene: &RenderScene) -> usize {
        scene.light_count(self.kind)
    }

    fn enter_iteration(
        &self,
        scene: &RenderScene,
        index: usize,
        volumes: &mut RenderVolumeCollection,
    ) -> Result<()> {
        let light = scene.lights_of(self.kind).nth(index).ok_or_else(|| {
            RenderError::InvalidIteration {
                provider: "LightVolumeCollection",
                index,
                count: scene.light_count(self.kind),
            }
        })?;
        volumes.insert_scoped(
            CURRENT_LIGHT_VOLUME,
            Arc::new(LightVolume::new(light.clone(), index)),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Light;
    use glam::Vec3;

    #[test]
    fn fixed_count_ignores_scene_content() {
        let provider = IterateOverVolumeCollection::new(5);
        assert_eq!(provider.iterations(&RenderScene::new()), 5);
    }

    #[test]
    fn light_provider_counts_matching_lights_only() {
        let mut scene = RenderScene::new();
        scene.add_light(Light::point(Vec3::ONE, 1.0, Vec3::ZERO, 5.0));
        scene.add_light(Light::point(Vec3::ONE, 1.0, Vec3::X, 5.0));
        scene.add_light(Light::directional(Vec3::ONE, 1.0, Vec3::NEG_Y));

        assert_eq!(LightVolumeCollection::point().iterations(&scene), 2);
        assert_eq!(LightVolumeCollection::spot().iterations(&scene), 0);
    }

    #[test]
    fn enter_iteration_publishes_current_light_in_scope() {
        let mut scene = RenderScene::new();
        scene.add_light(Light::point(Vec3::ONE, 1.0, Vec3::ZERO, 5.0));

        let provider = LightVolumeCollection::point();
        let mut volumes = RenderVolumeCollection::new();
        volumes.push_scope();
        provider
            .enter_iteration(&scene, 0, &mut volumes)
            .expect("light 0 exists");
        assert!(volumes.contains(CURRENT_LIGHT_VOLUME));
        volumes.pop_scope();
        assert!(!volumes.contains(CURRENT_LIGHT_VOLUME));
    }

    #[test]
    fn enter_iteration_past_the_sequence_is_a_contract_violation() {
        let scene = RenderScene::new();
        let provider = LightVolumeCollection::point();
        let mut volumes = RenderVolumeCollection::new();
        volumes.push_scope();
        assert!(provider.enter_iteration(&scene, 0, &mut volumes).is_err());
    }
}
