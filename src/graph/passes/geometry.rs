//! Deferred geometry pass.

use std::sync::Arc;

use crate::errors::{RenderError, Result};
use crate::gpu::{GpuDevice, ShaderDesc, ShaderHandle};
use crate::graph::attribute::PipelineAttribute;
use crate::graph::collection::RenderVolumeCollection;
use crate::graph::pass::{FrameContext, RenderPass};
use crate::graph::passes::G_BUFFER_VOLUME;
use crate::graph::volume::FramebufferVolume;
use crate::settings::RenderSettings;

const GEOMETRY_VERTEX_SHADER: &str = "shaders/deferred/geometry.vert";
const GEOMETRY_FRAGMENT_SHADER: &str = "shaders/deferred/geometry.frag";

/// G-buffer layout: world position, albedo, world normal, material
/// parameters (roughness, metalness, emissive, subsurface).
const G_BUFFER_FORMATS: &[wgpu::TextureFormat] = &[
    wgpu::TextureFormat::Rgba16Float,
    wgpu::TextureFormat::Rgba8Unorm,
    wgpu::TextureFormat::Rgba16Float,
    wgpu::TextureFormat::Rgba8Unorm,
];

/// Rasterizes opaque scene geometry into the G-buffer every frame and
/// publishes it as [`G_BUFFER_VOLUME`]. Every lighting and screen-space
/// stage downstream reads from it.
pub struct DeferredGeometryPass {
    shader: Option<ShaderHandle>,
    g_buffer: Option<Arc<FramebufferVolume>>,
}

impl DeferredGeometryPass {
    #[must_use]
    pub fn new() -> Self {
        Self {
            shader: None,
            g_buffer: None,
        }
    }
}

impl Default for DeferredGeometryPass {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderPass for DeferredGeometryPass {
    fn name(&self) -> &str {
        "deferredGeometry"
    }

    fn init(&mut self, device: &mut dyn GpuDevice, settings: &RenderSettings) -> Result<()> {
        let shader = device
            .load_shader(&ShaderDesc {
                name: "deferredGeometry",
                vertex_path: GEOMETRY_VERTEX_SHADER,
                fragment_path: GEOMETRY_FRAGMENT_SHADER,
            })
            .map_err(|reason| RenderError::ShaderLoadFailed {
                pass: "deferredGeometry".to_owned(),
                path: GEOMETRY_FRAGMENT_SHADER.to_owned(),
                reason,
            })?;
        self.shader = Some(shader);
        self.g_buffer = Some(Arc::new(FramebufferVolume::create_mrt(
            device,
            G_BUFFER_VOLUME,
            settings.resolution.width,
            settings.resolution.height,
            G_BUFFER_FORMATS,
            true,
        )));
        Ok(())
    }

    fn execute(
        &mut self,
        ctx: &mut FrameContext<'_>,
        volumes: &mut RenderVolumeCollection,
    ) -> Result<()> {
        let shader = self.shader.ok_or_else(|| RenderError::NotInitialized {
            pass: "deferredGeometry".to_owned(),
        })?;
        let g_buffer = self
            .g_buffer
            .clone()
            .ok_or_else(|| RenderError::NotInitialized {
                pass: "deferredGeometry".to_owned(),
            })?;

        ctx.device.bind_framebuffer(g_buffer.framebuffer());
        ctx.device.clear_target(wgpu::Color::TRANSPARENT);
        ctx.device.lock_shader(shader);
        ctx.device
            .set_attribute(&PipelineAttribute::mat4("viewMatrix", ctx.camera.view()));
        ctx.device.set_attribute(&PipelineAttribute::mat4(
            "projectionMatrix",
            ctx.camera.projection(),
        ));
        ctx.device.set_attribute(&PipelineAttribute::vec3(
            "cameraPosition",
            ctx.camera.position(),
        ));
        ctx.device.draw_scene(
            ctx.scene,
            crate::scene::SceneLayers::STATIC | crate::scene::SceneLayers::ANIMATED,
        );
        ctx.device.unlock_shader();
        ctx.device.unbind_framebuffer();

        volumes.insert(G_BUFFER_VOLUME, g_buffer);
        Ok(())
    }

    fn clear(&mut self, device: &mut dyn GpuDevice) {
        if let Some(shader) = self.shader.take() {
            device.destroy_shader(shader);
        }
        if let Some(g_buffer) = self.g_buffer.take() {
            g_buffer.destroy(device);
        }
    }
}
