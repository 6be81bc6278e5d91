//! Light accumulation passes.
//!
//! Per-light work runs inside the light-type containers: for every light of
//! a type, the container publishes the current light as a scoped volume, an
//! optional shadow pass publishes its map alongside it, and the deferred
//! light pass accumulates the contribution into the light accumulation
//! target. Everything scoped vanishes when the iteration ends.

use std::sync::Arc;

use glam::Vec3;

use crate::camera::Camera;
use crate::errors::{RenderError, Result};
use crate::gpu::{FramebufferHandle, GpuDevice, ShaderDesc, ShaderHandle, TextureDesc, TextureHandle};
use crate::graph::attribute::PipelineAttribute;
use crate::graph::collection::RenderVolumeCollection;
use crate::graph::iteration::CURRENT_LIGHT_VOLUME;
use crate::graph::pass::{FrameContext, RenderPass};
use crate::graph::passes::post_process::{
    camera_attributes, OutputTarget, PostProcessPass, PostProcessSpec,
};
use crate::graph::passes::{
    AMBIENT_OCCLUSION_MAP_VOLUME, G_BUFFER_VOLUME, LIGHT_ACCUMULATION_VOLUME, SHADOW_MAP_VOLUME,
};
use crate::graph::stats::ShadowMapStatistics;
use crate::graph::volume::{
    CascadedShadowMapVolume, FramebufferVolume, LightVolume, RenderVolume, ShadowCascade,
    ShadowMapVolume,
};
use crate::scene::{Light, LightKind, RenderScene, SceneLayers};
use crate::settings::RenderSettings;

const LIGHT_GEOMETRY_VERTEX_SHADER: &str = "shaders/deferred/light_geometry.vert";
const SHADOW_VERTEX_SHADER: &str = "shaders/shadow/depth.vert";
const SHADOW_FRAGMENT_SHADER: &str = "shaders/shadow/depth.frag";

// ─── Ambient light ────────────────────────────────────────────────────────────

fn ambient_attributes(
    _camera: &Camera,
    settings: &RenderSettings,
    volumes: &RenderVolumeCollection,
) -> Vec<PipelineAttribute> {
    let occlusion = settings.ssao_enabled || settings.vct_ao_enabled;
    let mut attributes = vec![
        PipelineAttribute::float("ambientIntensity", settings.ambient_intensity),
        PipelineAttribute::flag("ambientOcclusionEnabled", occlusion),
    ];
    // The AO map is only sampled when one of its producers actually ran.
    if occlusion {
        if let Some(map) = volumes.try_get(AMBIENT_OCCLUSION_MAP_VOLUME) {
            attributes.extend(map.attributes());
        }
    }
    attributes
}

/// Flat ambient term, modulated by the occlusion map when one was produced.
/// The first pass to write the light accumulation target.
#[must_use]
pub fn ambient_light() -> PostProcessPass {
    PostProcessPass::new(
        PostProcessSpec::new(
            "ambientLight",
            "shaders/deferred/ambient_light.frag",
            OutputTarget::Existing(LIGHT_ACCUMULATION_VOLUME),
        )
        .with_inputs(&[G_BUFFER_VOLUME])
        .with_attributes(ambient_attributes),
    )
}

// ─── Deferred light pass ──────────────────────────────────────────────────────

/// Accumulates one light's contribution by rasterizing its proxy geometry
/// over the G-buffer. Runs inside a light-type container and reads the
/// current light from the iteration scope.
///
/// Two shader variants are kept loaded; the shadowed one is selected when
/// the light casts shadows and a shadow pass published its map this
/// iteration.
pub struct DeferredLightPass {
    kind: LightKind,
    name: &'static str,
    fragment_path: &'static str,
    shadow_fragment_path: &'static str,
    shader: Option<ShaderHandle>,
    shadow_shader: Option<ShaderHandle>,
}

impl DeferredLightPass {
    #[must_use]
    pub fn new(kind: LightKind) -> Self {
        let (name, fragment_path, shadow_fragment_path) = match kind {
            LightKind::Directional => (
                "directionalLight",
                "shaders/deferred/directional_light.frag",
                "shaders/deferred/directional_light_shadow.frag",
            ),
            LightKind::Point => (
                "pointLight",
                "shaders/deferred/point_light.frag",
                "shaders/deferred/point_light_shadow.frag",
            ),
            LightKind::Spot => (
                "spotLight",
                "shaders/deferred/spot_light.frag",
                "shaders/deferred/spot_light_shadow.frag",
            ),
        };
        Self {
            kind,
            name,
            fragment_path,
            shadow_fragment_path,
            shader: None,
            shadow_shader: None,
        }
    }

    fn load(
        device: &mut dyn GpuDevice,
        name: &'static str,
        fragment_path: &'static str,
    ) -> Result<ShaderHandle> {
        device
            .load_shader(&ShaderDesc {
                name,
                vertex_path: LIGHT_GEOMETRY_VERTEX_SHADER,
                fragment_path,
            })
            .map_err(|reason| RenderError::ShaderLoadFailed {
                pass: name.to_owned(),
                path: fragment_path.to_owned(),
                reason,
            })
    }
}

impl RenderPass for DeferredLightPass {
    fn name(&self) -> &str {
        self.name
    }

    fn init(&mut self, device: &mut dyn GpuDevice, _settings: &RenderSettings) -> Result<()> {
        self.shader = Some(Self::load(device, self.name, self.fragment_path)?);
        self.shadow_shader = Some(Self::load(device, self.name, self.shadow_fragment_path)?);
        Ok(())
    }

    fn execute(
        &mut self,
        ctx: &mut FrameContext<'_>,
        volumes: &mut RenderVolumeCollection,
    ) -> Result<()> {
        let current = volumes.get_as::<LightVolume>(CURRENT_LIGHT_VOLUME)?;
        let shadowed = current.light().cast_shadows && volumes.contains(SHADOW_MAP_VOLUME);
        let shader = if shadowed {
            self.shadow_shader
        } else {
            self.shader
        }
        .ok_or_else(|| RenderError::NotInitialized {
            pass: self.name.to_owned(),
        })?;

        let mut attributes = camera_attributes(ctx.camera, ctx.settings);
        attributes.extend(volumes.get(G_BUFFER_VOLUME)?.attributes());
        attributes.extend(volumes.get(CURRENT_LIGHT_VOLUME)?.attributes());
        if shadowed {
            attributes.extend(volumes.get(SHADOW_MAP_VOLUME)?.attributes());
        }
        let target = volumes
            .get_as::<FramebufferVolume>(LIGHT_ACCUMULATION_VOLUME)?
            .framebuffer();

        ctx.device.bind_framebuffer(target);
        ctx.device.lock_shader(shader);
        for attribute in &attributes {
            ctx.device.set_attribute(attribute);
        }
        ctx.device.draw_light_geometry(self.kind);
        ctx.device.unlock_shader();
        ctx.device.unbind_framebuffer();
        Ok(())
    }

    fn clear(&mut self, device: &mut dyn GpuDevice) {
        if let Some(shader) = self.shader.take() {
            device.destroy_shader(shader);
        }
        if let Some(shader) = self.shadow_shader.take() {
            device.destroy_shader(shader);
        }
    }
}

// ─── Shadow map passes ────────────────────────────────────────────────────────

/// Cascade split depths blending logarithmic and uniform schemes by
/// `lambda`. Returns `cascades` far limits, the last equal to `zfar`.
#[must_use]
pub fn cascade_limits(znear: f32, zfar: f32, cascades: u32, lambda: f32) -> Vec<f32> {
    let count = cascades.max(1);
    // The logarithmic term degenerates at znear = 0.
    let log_near = znear.max(1e-4);
    let mut limits: Vec<f32> = (1..=count)
        .map(|index| {
            let fraction = index as f32 / count as f32;
            let logarithmic = log_near * (zfar / log_near).powf(fraction);
            let uniform = znear + (zfar - znear) * fraction;
            lambda * logarithmic + (1.0 - lambda) * uniform
        })
        .collect();
    // Ensure the last cascade reaches the far plane.
    if let Some(last) = limits.last_mut() {
        *last = zfar;
    }
    limits
}

fn current_light_casts_shadows(volumes: &RenderVolumeCollection) -> bool {
    volumes
        .try_get_as::<LightVolume>(CURRENT_LIGHT_VOLUME)
        .is_some_and(|current| current.light().cast_shadows)
}

struct DepthTarget {
    texture: TextureHandle,
    framebuffer: FramebufferHandle,
}

fn create_depth_target(device: &mut dyn GpuDevice, label: &'static str, side: u32) -> DepthTarget {
    let texture = device.create_texture(&TextureDesc {
        label,
        width: side,
        height: side,
        format: wgpu::TextureFormat::Depth32Float,
        filter: wgpu::FilterMode::Linear,
        address_mode: wgpu::AddressMode::ClampToEdge,
        mip_level_count: 1,
    });
    let framebuffer = device.create_framebuffer(label, &[], Some(texture));
    DepthTarget {
        texture,
        framebuffer,
    }
}

fn render_depth(
    device: &mut dyn GpuDevice,
    shader: ShaderHandle,
    target: FramebufferHandle,
    light_camera: &Camera,
    scene: &RenderScene,
) {
    device.bind_framebuffer(target);
    device.clear_target(wgpu::Color::WHITE);
    device.lock_shader(shader);
    device.set_attribute(&PipelineAttribute::mat4(
        "lightSpaceMatrix",
        light_camera.view_projection(),
    ));
    device.draw_scene(scene, SceneLayers::STATIC | SceneLayers::ANIMATED);
    device.unlock_shader();
    device.unbind_framebuffer();
}

/// Renders a cascaded shadow map for the current directional light.
///
/// The cascade targets are fixed GPU state reused across lights and frames;
/// the published volume is rebuilt each iteration from transient light
/// cameras and scoped to the iteration, so each light sees only its own
/// cascades.
pub struct DirectionalLightShadowMapPass {
    shader: Option<ShaderHandle>,
    targets: Vec<DepthTarget>,
}

impl DirectionalLightShadowMapPass {
    #[must_use]
    pub fn new() -> Self {
        Self {
            shader: None,
            targets: Vec::new(),
        }
    }

    fn light_camera(light: &Light, focus: Vec3, limit: f32) -> Camera {
        let direction = light.direction.normalize_or_zero();
        // Pull the light camera back far enough that casters behind the
        // visible slice still land in the depth range.
        Camera::orthographic(focus - direction * limit, focus, limit, 0.1, limit * 2.0)
    }
}

impl Default for DirectionalLightShadowMapPass {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderPass for DirectionalLightShadowMapPass {
    fn name(&self) -> &str {
        "directionalLightShadowMap"
    }

    fn init(&mut self, device: &mut dyn GpuDevice, settings: &RenderSettings) -> Result<()> {
        self.shader = Some(DeferredLightPass::load(
            device,
            "directionalLightShadowMap",
            SHADOW_FRAGMENT_SHADER,
        )?);
        self.targets = (0..settings.shadow_cascades.max(1))
            .map(|_| create_depth_target(device, "cascadeShadowMap", settings.shadow_map_resolution))
            .collect();
        Ok(())
    }

    fn is_available(
        &self,
        _scene: &RenderScene,
        _camera: &Camera,
        _settings: &RenderSettings,
        volumes: &RenderVolumeCollection,
    ) -> bool {
        current_light_casts_shadows(volumes)
    }

    fn execute(
        &mut self,
        ctx: &mut FrameContext<'_>,
        volumes: &mut RenderVolumeCollection,
    ) -> Result<()> {
        let shader = self.shader.ok_or_else(|| RenderError::NotInitialized {
            pass: "directionalLightShadowMap".to_owned(),
        })?;
        let light = volumes
            .get_as::<LightVolume>(CURRENT_LIGHT_VOLUME)?
            .light()
            .clone();

        let limits = cascade_limits(
            ctx.camera.znear(),
            ctx.camera.zfar(),
            self.targets.len() as u32,
            ctx.settings.shadow_split_lambda,
        );
        log::trace!("directional cascade limits: {limits:?}");

        let focus = ctx.camera.position();
        let mut cascades = Vec::with_capacity(self.targets.len());
        for (target, limit) in self.targets.iter().zip(&limits) {
            let light_camera = Self::light_camera(&light, focus, *limit);
            render_depth(ctx.device, shader, target.framebuffer, &light_camera, ctx.scene);
            cascades.push(ShadowCascade {
                texture: target.texture,
                view_projection: light_camera.view_projection(),
                limit: *limit,
            });
        }

        let volume: Arc<dyn RenderVolume> = Arc::new(CascadedShadowMapVolume::new(cascades));
        ctx.stats
            .get_or_default::<ShadowMapStatistics>()
            .directional_shadow_map_volume = Some(volume.clone());
        volumes.insert_scoped(SHADOW_MAP_VOLUME, volume);
        Ok(())
    }

    fn clear(&mut self, device: &mut dyn GpuDevice) {
        if let Some(shader) = self.shader.take() {
            device.destroy_shader(shader);
        }
        for target in self.targets.drain(..) {
            device.destroy_framebuffer(target.framebuffer);
            device.destroy_texture(target.texture);
        }
    }
}

/// Renders a single shadow map for the current spot light, with a
/// perspective light camera derived from the cone.
pub struct SpotLightShadowMapPass {
    shader: Option<ShaderHandle>,
    target: Option<DepthTarget>,
}

impl SpotLightShadowMapPass {
    #[must_use]
    pub fn new() -> Self {
        Self {
            shader: None,
            target: None,
        }
    }
}

impl Default for SpotLightShadowMapPass {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderPass for SpotLightShadowMapPass {
    fn name(&self) -> &str {
        "spotLightShadowMap"
    }

    fn init(&mut self, device: &mut dyn GpuDevice, settings: &RenderSettings) -> Result<()> {
        self.shader = Some(DeferredLightPass::load(
            device,
            "spotLightShadowMap",
            SHADOW_FRAGMENT_SHADER,
        )?);
        self.target = Some(create_depth_target(
            device,
            "spotShadowMap",
            settings.shadow_map_resolution,
        ));
        Ok(())
    }

    fn is_available(
        &self,
        _scene: &RenderScene,
        _camera: &Camera,
        _settings: &RenderSettings,
        volumes: &RenderVolumeCollection,
    ) -> bool {
        current_light_casts_shadows(volumes)
    }

    fn execute(
        &mut self,
        ctx: &mut FrameContext<'_>,
        volumes: &mut RenderVolumeCollection,
    ) -> Result<()> {
        let shader = self.shader.ok_or_else(|| RenderError::NotInitialized {
            pass: "spotLightShadowMap".to_owned(),
        })?;
        let (texture, framebuffer) = self
            .target
            .as_ref()
            .map(|target| (target.texture, target.framebuffer))
            .ok_or_else(|| RenderError::NotInitialized {
                pass: "spotLightShadowMap".to_owned(),
            })?;
        let light = volumes
            .get_as::<LightVolume>(CURRENT_LIGHT_VOLUME)?
            .light()
            .clone();

        let light_camera = Camera::perspective(
            light.position,
            light.position + light.direction,
            light.spot_angle,
            1.0,
            0.1,
            light.range.max(0.1),
        );
        render_depth(ctx.device, shader, framebuffer, &light_camera, ctx.scene);

        let volume: Arc<dyn RenderVolume> = Arc::new(ShadowMapVolume::new(texture, light_camera));
        ctx.stats
            .get_or_default::<ShadowMapStatistics>()
            .spot_shadow_map_volume = Some(volume.clone());
        volumes.insert_scoped(SHADOW_MAP_VOLUME, volume);
        Ok(())
    }

    fn clear(&mut self, device: &mut dyn GpuDevice) {
        if let Some(shader) = self.shader.take() {
            device.destroy_shader(shader);
        }
        if let Some(target) = self.target.take() {
            device.destroy_framebuffer(target.framebuffer);
            device.destroy_texture(target.texture);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cascade_limits_end_at_zfar_and_increase() {
        let limits = cascade_limits(0.1, 100.0, 4, 0.5);
        assert_eq!(limits.len(), 4);
        assert!(limits.windows(2).all(|pair| pair[0] < pair[1]));
        assert!((limits[3] - 100.0).abs() < 1e-3);
    }

    #[test]
    fn cascade_limits_with_zero_lambda_are_uniform() {
        let limits = cascade_limits(0.0, 80.0, 4, 0.0);
        assert_eq!(limits, vec![20.0, 40.0, 60.0, 80.0]);
    }

    #[test]
    fn cascade_limits_stay_finite_for_degenerate_near_plane() {
        let limits = cascade_limits(0.0, 100.0, 4, 0.75);
        assert!(limits.iter().all(|limit| limit.is_finite()));
        assert!(limits.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(limits[3], 100.0);
    }
}
