//! Render Volumes
//!
//! A render volume is an opaque, shared handle to a GPU-resident resource
//! produced by one pass and consumed by later passes. Volumes travel through
//! the [`RenderVolumeCollection`](super::collection::RenderVolumeCollection)
//! as `Arc<dyn RenderVolume>`, so the handle a consumer reads is the exact
//! handle the producer published; the collection never copies resources.
//!
//! Ownership of the underlying GPU handles stays with the creating pass
//! (volumes are views); registering a volume into the statistics registry is
//! purely observational and transfers nothing.

use std::any::Any;

use glam::{Mat4, Vec2};

use crate::camera::Camera;
use crate::gpu::{FramebufferHandle, GpuDevice, TextureDesc, TextureHandle};
use crate::graph::attribute::PipelineAttribute;
use crate::scene::Light;

/// Object-safe volume contract.
///
/// `attributes` returns the pipeline attributes a consuming pass binds to
/// sample this volume; the default is none. `as_any` enables typed access
/// through [`RenderVolumeCollection::get_as`](super::collection::RenderVolumeCollection::get_as).
pub trait RenderVolume: Any + Send + Sync + std::fmt::Debug {
    fn as_any(&self) -> &dyn Any;

    /// Shader bindings a consumer attaches when sampling this volume.
    fn attributes(&self) -> Vec<PipelineAttribute> {
        Vec::new()
    }
}

// ─── FramebufferVolume ────────────────────────────────────────────────────────

/// A framebuffer with one or more color attachments and an optional depth
/// attachment. The workhorse volume: every screen-space stage renders into
/// one of these.
#[derive(Debug, Clone)]
pub struct FramebufferVolume {
    label: &'static str,
    framebuffer: FramebufferHandle,
    color: Vec<TextureHandle>,
    depth: Option<TextureHandle>,
    width: u32,
    height: u32,
}

impl FramebufferVolume {
    /// Creates a single-attachment framebuffer volume.
    pub fn create(
        device: &mut dyn GpuDevice,
        label: &'static str,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
    ) -> Self {
        Self::create_mrt(device, label, width, height, &[format], false)
    }

    /// Creates a multi-render-target framebuffer volume, optionally with a
    /// depth attachment (the G-buffer shape).
    pub fn create_mrt(
        device: &mut dyn GpuDevice,
        label: &'static str,
        width: u32,
        height: u32,
        formats: &[wgpu::TextureFormat],
        with_depth: bool,
    ) -> Self {
        let color: Vec<TextureHandle> = formats
            .iter()
            .map(|format| device.create_texture(&TextureDesc::target(label, width, height, *format)))
            .collect();
        let depth = with_depth.then(|| {
            device.create_texture(&TextureDesc::target(
                label,
                width,
                height,
                wgpu::TextureFormat::Depth32Float,
            ))
        });
        let framebuffer = device.create_framebuffer(label, &color, depth);
        Self {
            label,
            framebuffer,
            color,
            depth,
            width,
            height,
        }
    }

    #[inline]
    #[must_use]
    pub fn label(&self) -> &'static str {
        self.label
    }

    #[inline]
    #[must_use]
    pub fn framebuffer(&self) -> FramebufferHandle {
        self.framebuffer
    }

    /// Color attachment `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range; attachment counts are fixed at
    /// pass-construction time, so this is an assembly bug.
    #[inline]
    #[must_use]
    pub fn color_texture(&self, index: usize) -> TextureHandle {
        self.color[index]
    }

    #[inline]
    #[must_use]
    pub fn color_count(&self) -> usize {
        self.color.len()
    }

    #[inline]
    #[must_use]
    pub fn depth_texture(&self) -> Option<TextureHandle> {
        self.depth
    }

    #[inline]
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Releases the GPU handles. Only the creating pass calls this, from its
    /// `clear`.
    pub fn destroy(&self, device: &mut dyn GpuDevice) {
        device.destroy_framebuffer(self.framebuffer);
        for texture in &self.color {
            device.destroy_texture(*texture);
        }
        if let Some(depth) = self.depth {
            device.destroy_texture(depth);
        }
    }
}

impl RenderVolume for FramebufferVolume {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn attributes(&self) -> Vec<PipelineAttribute> {
        let mut attributes = Vec::with_capacity(self.color.len() + 2);
        if self.color.len() == 1 {
            attributes.push(PipelineAttribute::texture(self.label, self.color[0]));
        } else {
            for (index, texture) in self.color.iter().enumerate() {
                attributes.push(PipelineAttribute::texture(
                    format!("{}{index}", self.label),
                    *texture,
                ));
            }
        }
        if let Some(depth) = self.depth {
            attributes.push(PipelineAttribute::texture(
                format!("{}Depth", self.label),
                depth,
            ));
        }
        attributes.push(PipelineAttribute::vec2(
            format!("{}Size", self.label),
            Vec2::new(self.width as f32, self.height as f32),
        ));
        attributes
    }
}

// ─── TextureVolume ────────────────────────────────────────────────────────────

/// A bare texture volume (no framebuffer), for sampled-only resources such
/// as generated kernels and lookup tables.
#[derive(Debug, Clone)]
pub struct TextureVolume {
    label: &'static str,
    texture: TextureHandle,
    width: u32,
    height: u32,
}

impl TextureVolume {
    pub fn create(
        device: &mut dyn GpuDevice,
        label: &'static str,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
    ) -> Self {
        let texture = device.create_texture(&TextureDesc::target(label, width, height, format));
        Self {
            label,
            texture,
            width,
            height,
        }
    }

    #[inline]
    #[must_use]
    pub fn texture(&self) -> TextureHandle {
        self.texture
    }

    #[inline]
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn destroy(&self, device: &mut dyn GpuDevice) {
        device.destroy_texture(self.texture);
    }
}

impl RenderVolume for TextureVolume {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn attributes(&self) -> Vec<PipelineAttribute> {
        vec![
            PipelineAttribute::texture(self.label, self.texture),
            PipelineAttribute::vec2(
                format!("{}Size", self.label),
                Vec2::new(self.width as f32, self.height as f32),
            ),
        ]
    }
}

// ─── LightVolume ──────────────────────────────────────────────────────────────

/// The current-light context a light-type container publishes for each
/// iteration, scoped to that iteration and discarded after it.
#[derive(Debug, Clone)]
pub struct LightVolume {
    light: Light,
    index: usize,
}

impl LightVolume {
    #[must_use]
    pub fn new(light: Light, index: usize) -> Self {
        Self { light, index }
    }

    #[inline]
    #[must_use]
    pub fn light(&self) -> &Light {
        &self.light
    }

    /// Position of this light in its type's iteration sequence.
    #[inline]
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }
}

impl RenderVolume for LightVolume {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn attributes(&self) -> Vec<PipelineAttribute> {
        vec![
            PipelineAttribute::vec3("lightColor", self.light.color),
            PipelineAttribute::float("lightIntensity", self.light.intensity),
            PipelineAttribute::vec3("lightDirection", self.light.direction),
            PipelineAttribute::vec3("lightPosition", self.light.position),
            PipelineAttribute::float("lightRange", self.light.range),
            PipelineAttribute::float("lightSpotAngle", self.light.spot_angle),
            PipelineAttribute::flag("lightShadowCasting", self.light.cast_shadows),
        ]
    }
}

// ─── Shadow map volumes ───────────────────────────────────────────────────────

/// One cascade of a cascaded shadow map: the depth target plus the light
/// camera it was rendered with and the view-space depth limit it covers.
#[derive(Debug, Clone)]
pub struct ShadowCascade {
    pub texture: TextureHandle,
    pub view_projection: Mat4,
    pub limit: f32,
}

/// Cascaded shadow map for a directional light.
///
/// Created inside the light iteration by the shadow map pass and scoped to
/// it; the deferred light pass consumes the cascade matrices and targets
/// through [`RenderVolume::attributes`]. The GPU handles belong to the
/// shadow pass, which reuses them across lights and frames.
#[derive(Debug, Clone)]
pub struct CascadedShadowMapVolume {
    cascades: Vec<ShadowCascade>,
}

impl CascadedShadowMapVolume {
    #[must_use]
    pub fn new(cascades: Vec<ShadowCascade>) -> Self {
        Self { cascades }
    }

    #[inline]
    #[must_use]
    pub fn cascades(&self) -> &[ShadowCascade] {
        &self.cascades
    }
}

impl RenderVolume for CascadedShadowMapVolume {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn attributes(&self) -> Vec<PipelineAttribute> {
        let mut attributes = Vec::with_capacity(self.cascades.len() * 3 + 1);
        attributes.push(PipelineAttribute::int(
            "cascadesCount",
            self.cascades.len() as i32,
        ));
        for (index, cascade) in self.cascades.iter().enumerate() {
            attributes.push(PipelineAttribute::mat4(
                format!("lightSpaceMatrices[{index}]"),
                cascade.view_projection,
            ));
            attributes.push(PipelineAttribute::float(
                format!("clipZLevels[{index}]"),
                cascade.limit,
            ));
            attributes.push(PipelineAttribute::texture(
                format!("shadowMaps[{index}]"),
                cascade.texture,
            ));
        }
        attributes
    }
}

/// Single shadow map for a spot light, with its transient light camera.
#[derive(Debug, Clone)]
pub struct ShadowMapVolume {
    texture: TextureHandle,
    camera: Camera,
}

impl ShadowMapVolume {
    #[must_use]
    pub fn new(texture: TextureHandle, camera: Camera) -> Self {
        Self { texture, camera }
    }

    #[inline]
    #[must_use]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }
}

impl RenderVolume for ShadowMapVolume {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn attributes(&self) -> Vec<PipelineAttribute> {
        vec![
            PipelineAttribute::texture("shadowMap", self.texture),
            PipelineAttribute::mat4("lightSpaceMatrix", self.camera.view_projection()),
        ]
    }
}
