//! Framebuffer provisioning passes.
//!
//! Downstream passes never allocate the shared frame targets themselves;
//! a generation pass owns each one and republishes it at the top of every
//! frame, so consumers simply look the name up.

use std::sync::Arc;

use crate::errors::Result;
use crate::gpu::GpuDevice;
use crate::graph::collection::RenderVolumeCollection;
use crate::graph::pass::{FrameContext, RenderPass};
use crate::graph::passes::post_process::OutputResolution;
use crate::graph::volume::FramebufferVolume;
use crate::settings::RenderSettings;

/// Owns one named framebuffer volume and publishes it each frame.
pub struct FramebufferGenerationPass {
    name: &'static str,
    volume: &'static str,
    formats: &'static [wgpu::TextureFormat],
    resolution: OutputResolution,
    with_depth: bool,
    clear_each_frame: bool,
    output: Option<Arc<FramebufferVolume>>,
}

impl FramebufferGenerationPass {
    #[must_use]
    pub fn new(
        name: &'static str,
        volume: &'static str,
        formats: &'static [wgpu::TextureFormat],
        resolution: OutputResolution,
    ) -> Self {
        Self {
            name,
            volume,
            formats,
            resolution,
            with_depth: false,
            clear_each_frame: false,
            output: None,
        }
    }

    #[must_use]
    pub fn with_depth(mut self) -> Self {
        self.with_depth = true;
        self
    }

    /// Clear the target to the settings clear color before anything draws
    /// into it. Used for accumulation targets that passes add onto.
    #[must_use]
    pub fn cleared_each_frame(mut self) -> Self {
        self.clear_each_frame = true;
        self
    }
}

impl RenderPass for FramebufferGenerationPass {
    fn name(&self) -> &str {
        self.name
    }

    fn init(&mut self, device: &mut dyn GpuDevice, settings: &RenderSettings) -> Result<()> {
        let (width, height) = self.resolution.resolve(settings);
        self.output = Some(Arc::new(FramebufferVolume::create_mrt(
            device,
            self.volume,
            width,
            height,
            self.formats,
            self.with_depth,
        )));
        Ok(())
    }

    fn execute(
        &mut self,
        ctx: &mut FrameContext<'_>,
        volumes: &mut RenderVolumeCollection,
    ) -> Result<()> {
        let output = self
            .output
            .clone()
            .ok_or_else(|| crate::errors::RenderError::NotInitialized {
                pass: self.name.to_owned(),
            })?;
        if self.clear_each_frame {
            ctx.device.bind_framebuffer(output.framebuffer());
            ctx.device.clear_target(ctx.settings.clear_color);
            ctx.device.unbind_framebuffer();
        }
        volumes.insert(self.volume, output);
        Ok(())
    }

    fn clear(&mut self, device: &mut dyn GpuDevice) {
        if let Some(output) = self.output.take() {
            output.destroy(device);
        }
    }
}

/// Regenerates the mipmap chain of an already-published framebuffer volume.
///
/// Placed after the passes that wrote the volume and before the consumers
/// that sample coarse mips (glossy screen-space reflections).
pub struct FramebufferMipmapsGenerationPass {
    name: &'static str,
    volume: &'static str,
}

impl FramebufferMipmapsGenerationPass {
    #[must_use]
    pub fn new(name: &'static str, volume: &'static str) -> Self {
        Self { name, volume }
    }
}

impl RenderPass for FramebufferMipmapsGenerationPass {
    fn name(&self) -> &str {
        self.name
    }

    fn execute(
        &mut self,
        ctx: &mut FrameContext<'_>,
        volumes: &mut RenderVolumeCollection,
    ) -> Result<()> {
        let source = volumes.get_as::<FramebufferVolume>(self.volume)?;
        for index in 0..source.color_count() {
            let texture = source.color_texture(index);
            ctx.device.generate_mipmaps(texture);
        }
        Ok(())
    }
}
