//! Render Scene
//!
//! The per-frame set of renderable objects and lights. Read-only input to
//! every pass; the light-iteration providers enumerate it to decide how many
//! times a light container re-executes its children.

use bitflags::bitflags;
use glam::Vec3;

bitflags! {
    /// Layer mask selecting which renderables a draw submission covers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SceneLayers: u32 {
        /// Static world geometry.
        const STATIC = 1 << 0;
        /// Skinned / animated geometry.
        const ANIMATED = 1 << 1;
        /// Alpha-blended geometry, drawn by the forward pass.
        const TRANSPARENT = 1 << 2;
        /// Debug gizmo geometry.
        const GIZMOS = 1 << 3;
        /// Screen-space UI geometry.
        const GUI = 1 << 4;
    }
}

/// The light types the deferred pipeline distinguishes.
///
/// Each type has its own container in the pass tree; the container executes
/// its children once per light of that type in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightKind {
    Directional,
    Point,
    Spot,
}

/// A single light source.
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    pub color: Vec3,
    pub intensity: f32,
    /// Direction the light points at (directional and spot lights).
    pub direction: Vec3,
    /// World position (point and spot lights).
    pub position: Vec3,
    /// Attenuation range (point and spot lights).
    pub range: f32,
    /// Full cone angle in radians (spot lights).
    pub spot_angle: f32,
    /// Whether this light gets a shadow map pass in its iteration.
    pub cast_shadows: bool,
}

impl Light {
    #[must_use]
    pub fn directional(color: Vec3, intensity: f32, direction: Vec3) -> Self {
        Self {
            kind: LightKind::Directional,
            color,
            intensity,
            direction,
            position: Vec3::ZERO,
            range: f32::INFINITY,
            spot_angle: 0.0,
            cast_shadows: false,
        }
    }

    #[must_use]
    pub fn point(color: Vec3, intensity: f32, position: Vec3, range: f32) -> Self {
        Self {
            kind: LightKind::Point,
            color,
            intensity,
            direction: Vec3::NEG_Y,
            position,
            range,
            spot_angle: 0.0,
            cast_shadows: false,
        }
    }

    #[must_use]
    pub fn spot(
        color: Vec3,
        intensity: f32,
        position: Vec3,
        direction: Vec3,
        range: f32,
        spot_angle: f32,
    ) -> Self {
        Self {
            kind: LightKind::Spot,
            color,
            intensity,
            direction,
            position,
            range,
            spot_angle,
            cast_shadows: false,
        }
    }

    /// Marks the light as shadow casting.
    #[must_use]
    pub fn with_shadows(mut self) -> Self {
        self.cast_shadows = true;
        self
    }
}

/// A renderable object reference.
///
/// The core never inspects geometry; the GPU layer resolves the renderable
/// when a pass submits a layered scene draw.
#[derive(Debug, Clone)]
pub struct Renderable {
    pub name: String,
    pub layers: SceneLayers,
}

/// The set of renderables and lights for one frame.
#[derive(Debug, Clone, Default)]
pub struct RenderScene {
    renderables: Vec<Renderable>,
    lights: Vec<Light>,
    /// Cubemap path for the skybox pass; `None` skips the pass.
    pub skybox: Option<String>,
}

impl RenderScene {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_renderable(&mut self, name: impl Into<String>, layers: SceneLayers) {
        self.renderables.push(Renderable {
            name: name.into(),
            layers,
        });
    }

    pub fn add_light(&mut self, light: Light) {
        self.lights.push(light);
    }

    #[must_use]
    pub fn renderables(&self) -> &[Renderable] {
        &self.renderables
    }

    #[must_use]
    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    /// Lights of one type, in scene order.
    pub fn lights_of(&self, kind: LightKind) -> impl Iterator<Item = &Light> {
        self.lights.iter().filter(move |l| l.kind == kind)
    }

    /// Number of lights of one type; drives light-container iteration counts.
    #[must_use]
    pub fn light_count(&self, kind: LightKind) -> usize {
        self.lights_of(kind).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn light_count_filters_by_kind() {
        let mut scene = RenderScene::new();
        scene.add_light(Light::directional(Vec3::ONE, 1.0, Vec3::NEG_Y));
        scene.add_light(Light::point(Vec3::ONE, 1.0, Vec3::ZERO, 5.0));
        scene.add_light(Light::point(Vec3::ONE, 1.0, Vec3::X, 5.0));

        assert_eq!(scene.light_count(LightKind::Directional), 1);
        assert_eq!(scene.light_count(LightKind::Point), 2);
        assert_eq!(scene.light_count(LightKind::Spot), 0);
    }
}
