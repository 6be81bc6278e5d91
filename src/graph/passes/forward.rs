//! Forward and presentation passes.
//!
//! Everything after the deferred composite: transparent geometry rendered
//! forward over the lit result, the copy to the window surface, and the
//! overlay passes (gizmos, GUI) that draw straight onto the window.

use crate::camera::Camera;
use crate::errors::{RenderError, Result};
use crate::gpu::{GpuDevice, ShaderDesc, ShaderHandle};
use crate::graph::collection::RenderVolumeCollection;
use crate::graph::pass::{FrameContext, RenderPass};
use crate::graph::passes::post_process::camera_attributes;
use crate::graph::passes::LIGHT_ACCUMULATION_VOLUME;
use crate::graph::volume::FramebufferVolume;
use crate::scene::{RenderScene, SceneLayers};
use crate::settings::RenderSettings;

const FORWARD_VERTEX_SHADER: &str = "shaders/forward/forward.vert";
const FORWARD_FRAGMENT_SHADER: &str = "shaders/forward/forward.frag";
const GIZMOS_VERTEX_SHADER: &str = "shaders/overlay/gizmos.vert";
const GIZMOS_FRAGMENT_SHADER: &str = "shaders/overlay/gizmos.frag";

/// Renders transparent geometry forward into the light accumulation target,
/// after the deferred result has been composited back into it.
pub struct ForwardPass {
    shader: Option<ShaderHandle>,
}

impl ForwardPass {
    #[must_use]
    pub fn new() -> Self {
        Self { shader: None }
    }
}

impl Default for ForwardPass {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderPass for ForwardPass {
    fn name(&self) -> &str {
        "forward"
    }

    fn init(&mut self, device: &mut dyn GpuDevice, _settings: &RenderSettings) -> Result<()> {
        let shader = device
            .load_shader(&ShaderDesc {
                name: "forward",
                vertex_path: FORWARD_VERTEX_SHADER,
                fragment_path: FORWARD_FRAGMENT_SHADER,
            })
            .map_err(|reason| RenderError::ShaderLoadFailed {
                pass: "forward".to_owned(),
                path: FORWARD_FRAGMENT_SHADER.to_owned(),
                reason,
            })?;
        self.shader = Some(shader);
        Ok(())
    }

    fn execute(
        &mut self,
        ctx: &mut FrameContext<'_>,
        volumes: &mut RenderVolumeCollection,
    ) -> Result<()> {
        let shader = self.shader.ok_or_else(|| RenderError::NotInitialized {
            pass: "forward".to_owned(),
        })?;
        let attributes = camera_attributes(ctx.camera, ctx.settings);
        let target = volumes
            .get_as::<FramebufferVolume>(LIGHT_ACCUMULATION_VOLUME)?
            .framebuffer();

        ctx.device.bind_framebuffer(target);
        ctx.device.lock_shader(shader);
        for attribute in &attributes {
            ctx.device.set_attribute(attribute);
        }
        ctx.device.draw_scene(ctx.scene, SceneLayers::TRANSPARENT);
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

/// Copies the finished frame to the window surface.
pub struct WindowBlitPass;

impl WindowBlitPass {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for WindowBlitPass {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderPass for WindowBlitPass {
    fn name(&self) -> &str {
        "windowBlit"
    }

    fn execute(
        &mut self,
        ctx: &mut FrameContext<'_>,
        volumes: &mut RenderVolumeCollection,
    ) -> Result<()> {
        let source = volumes
            .get_as::<FramebufferVolume>(LIGHT_ACCUMULATION_VOLUME)?
            .framebuffer();
        ctx.device.blit_to_window(source);
        Ok(())
    }
}

/// Debug gizmo overlay, drawn straight onto the window surface.
pub struct GizmosPass {
    shader: Option<ShaderHandle>,
}

impl GizmosPass {
    #[must_use]
    pub fn new() -> Self {
        Self { shader: None }
    }
}

impl Default for GizmosPass {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderPass for GizmosPass {
    fn name(&self) -> &str {
        "gizmos"
    }

    fn init(&mut self, device: &mut dyn GpuDevice, _settings: &RenderSettings) -> Result<()> {
        let shader = device
            .load_shader(&ShaderDesc {
                name: "gizmos",
                vertex_path: GIZMOS_VERTEX_SHADER,
                fragment_path: GIZMOS_FRAGMENT_SHADER,
            })
            .map_err(|reason| RenderError::ShaderLoadFailed {
                pass: "gizmos".to_owned(),
                path: GIZMOS_FRAGMENT_SHADER.to_owned(),
                reason,
            })?;
        self.shader = Some(shader);
        Ok(())
    }

    fn is_available(
        &self,
        _scene: &RenderScene,
        _camera: &Camera,
        settings: &RenderSettings,
        _volumes: &RenderVolumeCollection,
    ) -> bool {
        settings.gizmos_enabled
    }

    fn execute(
        &mut self,
        ctx: &mut FrameContext<'_>,
        _volumes: &mut RenderVolumeCollection,
    ) -> Result<()> {
        let shader = self.shader.ok_or_else(|| RenderError::NotInitialized {
            pass: "gizmos".to_owned(),
        })?;
        let attributes = camera_attributes(ctx.camera, ctx.settings);
        ctx.device.lock_shader(shader);
        for attribute in &attributes {
            ctx.device.set_attribute(attribute);
        }
        ctx.device.draw_scene(ctx.scene, SceneLayers::GIZMOS);
        ctx.device.unlock_shader();
        Ok(())
    }

    fn clear(&mut self, device: &mut dyn GpuDevice) {
        if let Some(shader) = self.shader.take() {
            device.destroy_shader(shader);
        }
    }
}

/// GUI overlay. The backend owns the widget pipeline; this pass only
/// schedules it at the right point in the frame.
pub struct GuiPass;

impl GuiPass {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for GuiPass {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderPass for GuiPass {
    fn name(&self) -> &str {
        "gui"
    }

    fn is_available(
        &self,
        scene: &RenderScene,
        _camera: &Camera,
        _settings: &RenderSettings,
        _volumes: &RenderVolumeCollection,
    ) -> bool {
        scene
            .renderables()
            .iter()
            .any(|renderable| renderable.layers.contains(SceneLayers::GUI))
    }

    fn execute(
        &mut self,
        ctx: &mut FrameContext<'_>,
        _volumes: &mut RenderVolumeCollection,
    ) -> Result<()> {
        ctx.device.draw_scene(ctx.scene, SceneLayers::GUI);
        Ok(())
    }
}
