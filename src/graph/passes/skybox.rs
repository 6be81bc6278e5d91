//! Skybox pass.

use crate::camera::Camera;
use crate::errors::{RenderError, Result};
use crate::gpu::{GpuDevice, ShaderDesc, ShaderHandle};
use crate::graph::attribute::PipelineAttribute;
use crate::graph::collection::RenderVolumeCollection;
use crate::graph::pass::{FrameContext, RenderPass};
use crate::graph::passes::{G_BUFFER_VOLUME, LIGHT_ACCUMULATION_VOLUME};
use crate::graph::volume::FramebufferVolume;
use crate::scene::RenderScene;
use crate::settings::RenderSettings;

const SKYBOX_VERTEX_SHADER: &str = "shaders/skybox/skybox.vert";
const SKYBOX_FRAGMENT_SHADER: &str = "shaders/skybox/skybox.frag";

/// Fills G-buffer background pixels with the scene's environment map.
/// Skipped entirely when the scene has no skybox assigned.
pub struct SkyboxPass {
    shader: Option<ShaderHandle>,
}

impl SkyboxPass {
    #[must_use]
    pub fn new() -> Self {
        Self { shader: None }
    }
}

impl Default for SkyboxPass {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderPass for SkyboxPass {
    fn name(&self) -> &str {
        "skybox"
    }

    fn init(&mut self, device: &mut dyn GpuDevice, _settings: &RenderSettings) -> Result<()> {
        let shader = device
            .load_shader(&ShaderDesc {
                name: "skybox",
                vertex_path: SKYBOX_VERTEX_SHADER,
                fragment_path: SKYBOX_FRAGMENT_SHADER,
            })
            .map_err(|reason| RenderError::ShaderLoadFailed {
                pass: "skybox".to_owned(),
                path: SKYBOX_FRAGMENT_SHADER.to_owned(),
                reason,
            })?;
        self.shader = Some(shader);
        Ok(())
    }

    fn is_available(
        &self,
        scene: &RenderScene,
        _camera: &Camera,
        _settings: &RenderSettings,
        _volumes: &RenderVolumeCollection,
    ) -> bool {
        scene.skybox.is_some()
    }

    fn execute(
        &mut self,
        ctx: &mut FrameContext<'_>,
        volumes: &mut RenderVolumeCollection,
    ) -> Result<()> {
        let shader = self.shader.ok_or_else(|| RenderError::NotInitialized {
            pass: "skybox".to_owned(),
        })?;
        let mut attributes = vec![
            PipelineAttribute::mat4("viewMatrix", ctx.camera.view()),
            PipelineAttribute::mat4("projectionMatrix", ctx.camera.projection()),
        ];
        attributes.extend(volumes.get(G_BUFFER_VOLUME)?.attributes());
        let target = volumes
            .get_as::<FramebufferVolume>(LIGHT_ACCUMULATION_VOLUME)?
            .framebuffer();

        ctx.device.bind_framebuffer(target);
        ctx.device.lock_shader(shader);
        for attribute in &attributes {
            ctx.device.set_attribute(attribute);
        }
        ctx.device.draw_fullscreen_quad();
        ctx.device.unlock_shader();
        ctx.device.unbind_framebuffer();
        Ok(())
    }

    fn clear(&mut self, device: &mut dyn GpuDevice) {
        if let Some(shader) = self.shader.take() {
            device.destroy_shader(shader);
        }
    }
}
