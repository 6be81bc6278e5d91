//! Tonemapping and composite stages.
//!
//! The post-process container starts with [`IdlePass`], which republishes
//! the light accumulation volume under the rolling post-process name; every
//! effect then refines that name in sequence, and [`DeferredBlitPass`]
//! finally copies the refined result back into the light accumulation
//! target (skipping the copy when no effect ran and both names still point
//! at the same framebuffer).

use crate::camera::Camera;
use crate::errors::Result;
use crate::graph::attribute::PipelineAttribute;
use crate::graph::collection::RenderVolumeCollection;
use crate::graph::pass::{FrameContext, RenderPass};
use crate::graph::passes::post_process::{
    OutputResolution, OutputTarget, PostProcessPass, PostProcessSpec,
};
use crate::graph::passes::{LIGHT_ACCUMULATION_VOLUME, POST_PROCESS_MAP_VOLUME};
use crate::graph::volume::FramebufferVolume;
use crate::settings::RenderSettings;

fn hdr_available(settings: &RenderSettings) -> bool {
    settings.hdr_enabled
}

fn hdr_attributes(
    _camera: &Camera,
    settings: &RenderSettings,
    _volumes: &RenderVolumeCollection,
) -> Vec<PipelineAttribute> {
    vec![PipelineAttribute::float("hdrExposure", settings.hdr_exposure)]
}

/// Exposure-based tone mapping.
#[must_use]
pub fn hdr() -> PostProcessPass {
    PostProcessPass::new(
        PostProcessSpec::new(
            "hdr",
            "shaders/composite/hdr.frag",
            OutputTarget::Owned {
                volume: POST_PROCESS_MAP_VOLUME,
                format: wgpu::TextureFormat::Rgba16Float,
                resolution: OutputResolution::Window,
            },
        )
        .with_inputs(&[POST_PROCESS_MAP_VOLUME])
        .with_availability(hdr_available)
        .with_attributes(hdr_attributes),
    )
}

fn lut_available(settings: &RenderSettings) -> bool {
    settings.lut_enabled
}

fn lut_attributes(
    _camera: &Camera,
    settings: &RenderSettings,
    _volumes: &RenderVolumeCollection,
) -> Vec<PipelineAttribute> {
    vec![PipelineAttribute::float("lutIntensity", settings.lut_intensity)]
}

/// Color grading through a lookup table the backend binds for the shader.
#[must_use]
pub fn texture_lut() -> PostProcessPass {
    PostProcessPass::new(
        PostProcessSpec::new(
            "textureLut",
            "shaders/composite/lut.frag",
            OutputTarget::Owned {
                volume: POST_PROCESS_MAP_VOLUME,
                format: wgpu::TextureFormat::Rgba16Float,
                resolution: OutputResolution::Window,
            },
        )
        .with_inputs(&[POST_PROCESS_MAP_VOLUME])
        .with_availability(lut_available)
        .with_attributes(lut_attributes),
    )
}

fn gamma_available(settings: &RenderSettings) -> bool {
    settings.gamma_correction_enabled
}

/// Final gamma curve before presentation.
#[must_use]
pub fn gamma_correction() -> PostProcessPass {
    PostProcessPass::new(
        PostProcessSpec::new(
            "gammaCorrection",
            "shaders/composite/gamma.frag",
            OutputTarget::Owned {
                volume: POST_PROCESS_MAP_VOLUME,
                format: wgpu::TextureFormat::Rgba8Unorm,
                resolution: OutputResolution::Window,
            },
        )
        .with_inputs(&[POST_PROCESS_MAP_VOLUME])
        .with_availability(gamma_available),
    )
}

/// Seeds the rolling post-process name with the light accumulation volume.
///
/// Republishing the same `Arc` under a second name costs nothing and keeps
/// the downstream contract intact when every effect is disabled: the first
/// enabled effect always finds a defined input.
pub struct IdlePass;

impl IdlePass {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for IdlePass {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderPass for IdlePass {
    fn name(&self) -> &str {
        "idle"
    }

    fn execute(
        &mut self,
        _ctx: &mut FrameContext<'_>,
        volumes: &mut RenderVolumeCollection,
    ) -> Result<()> {
        let accumulation = volumes.get(LIGHT_ACCUMULATION_VOLUME)?.clone();
        volumes.insert(POST_PROCESS_MAP_VOLUME, accumulation);
        Ok(())
    }
}

/// Copies the refined post-process result back into the light accumulation
/// target, so the forward pass and the window blit read one fixed name.
pub struct DeferredBlitPass;

impl DeferredBlitPass {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for DeferredBlitPass {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderPass for DeferredBlitPass {
    fn name(&self) -> &str {
        "deferredBlit"
    }

    fn execute(
        &mut self,
        ctx: &mut FrameContext<'_>,
        volumes: &mut RenderVolumeCollection,
    ) -> Result<()> {
        let source = volumes
            .get_as::<FramebufferVolume>(POST_PROCESS_MAP_VOLUME)?
            .framebuffer();
        let destination = volumes
            .get_as::<FramebufferVolume>(LIGHT_ACCUMULATION_VOLUME)?
            .framebuffer();
        // Both names still point at the same target when no effect ran.
        if source != destination {
            ctx.device.blit(source, destination);
        }
        Ok(())
    }
}
