//! Screen-space lighting effects.
//!
//! Two groups live here. The per-light effects (volumetric scattering, the
//! light source map and radial light shafts) run inside the light-type
//! containers and accumulate into shared per-frame maps. The post-process
//! effects (SSDO, SSR, subsurface scattering, TAA and the accumulation
//! stages) run in the post-process container and refine
//! [`POST_PROCESS_MAP_VOLUME`] in sequence.

use std::sync::Arc;

use crate::camera::Camera;
use crate::errors::Result;
use crate::graph::attribute::PipelineAttribute;
use crate::graph::collection::RenderVolumeCollection;
use crate::graph::container::ContainerRenderPass;
use crate::graph::iteration::CURRENT_LIGHT_VOLUME;
use crate::graph::pass::{FrameContext, RenderPass};
use crate::graph::passes::framebuffer::FramebufferMipmapsGenerationPass;
use crate::graph::passes::post_process::{
    OutputResolution, OutputTarget, PostProcessPass, PostProcessSpec,
};
use crate::graph::passes::{
    G_BUFFER_VOLUME, LIGHT_SHAFTS_MAP_VOLUME, LIGHT_SOURCE_MAP_VOLUME, POST_PROCESS_MAP_VOLUME,
    VOLUMETRIC_LIGHT_MAP_VOLUME,
};
use crate::graph::stats::{SsrStatistics, StatisticsRegistry};
use crate::graph::volume::RenderVolume;
use crate::scene::RenderScene;
use crate::settings::RenderSettings;

const SSDO_MAP_VOLUME: &str = "ssdoMapVolume";
const SSDO_SAMPLES_VOLUME: &str = "ssdoSamplesVolume";
const SSR_REFLECTION_MAP_VOLUME: &str = "ssrReflectionMapVolume";

// ─── Per-light effects ────────────────────────────────────────────────────────

fn volumetric_available(settings: &RenderSettings) -> bool {
    settings.volumetric_lighting_enabled
}

fn light_shafts_available(settings: &RenderSettings) -> bool {
    settings.light_shafts_enabled
}

/// Ray-marched scattering for the current light, added onto the per-frame
/// volumetric light map.
#[must_use]
pub fn volumetric_lighting() -> PostProcessPass {
    PostProcessPass::new(
        PostProcessSpec::new(
            "volumetricLighting",
            "shaders/volumetric/scattering.frag",
            OutputTarget::Existing(VOLUMETRIC_LIGHT_MAP_VOLUME),
        )
        .with_inputs(&[G_BUFFER_VOLUME, CURRENT_LIGHT_VOLUME])
        .with_availability(volumetric_available),
    )
}

/// Draws the current light's unoccluded source disc into the light source
/// map, the input of the radial shafts blur.
#[must_use]
pub fn light_source() -> PostProcessPass {
    PostProcessPass::new(
        PostProcessSpec::new(
            "lightSource",
            "shaders/light_shafts/light_source.frag",
            OutputTarget::Existing(LIGHT_SOURCE_MAP_VOLUME),
        )
        .with_inputs(&[G_BUFFER_VOLUME, CURRENT_LIGHT_VOLUME])
        .with_availability(light_shafts_available),
    )
}

/// Radial blur away from the current light, accumulated into the per-frame
/// light shafts map.
#[must_use]
pub fn light_shafts() -> PostProcessPass {
    PostProcessPass::new(
        PostProcessSpec::new(
            "lightShafts",
            "shaders/light_shafts/radial_blur.frag",
            OutputTarget::Existing(LIGHT_SHAFTS_MAP_VOLUME),
        )
        .with_inputs(&[LIGHT_SOURCE_MAP_VOLUME, CURRENT_LIGHT_VOLUME])
        .with_availability(light_shafts_available),
    )
}

// ─── Screen-space directional occlusion ───────────────────────────────────────

fn ssdo_available(settings: &RenderSettings) -> bool {
    settings.ssdo_enabled
}

fn ssdo_temporal_available(settings: &RenderSettings) -> bool {
    settings.ssdo_enabled && settings.ssdo_temporal_filter_enabled
}

fn ssdo_resolution(settings: &RenderSettings) -> (u32, u32) {
    settings.resolution.scaled(settings.ssdo_scale)
}

fn ssdo_kernel_resolution(settings: &RenderSettings) -> (u32, u32) {
    (settings.ssdo_samples.max(1), 1)
}

fn ssdo_attributes(
    _camera: &Camera,
    settings: &RenderSettings,
    _volumes: &RenderVolumeCollection,
) -> Vec<PipelineAttribute> {
    vec![PipelineAttribute::uint(
        "ssdoSamplesCount",
        settings.ssdo_samples,
    )]
}

/// Renders the hemisphere sampling kernel the occlusion estimate reads,
/// one texel per sample direction.
#[must_use]
pub fn ssdo_samples_generation() -> PostProcessPass {
    PostProcessPass::new(
        PostProcessSpec::new(
            "ssdoSamplesGeneration",
            "shaders/ssdo/samples_generation.frag",
            OutputTarget::Owned {
                volume: SSDO_SAMPLES_VOLUME,
                format: wgpu::TextureFormat::Rgba16Float,
                resolution: OutputResolution::Custom(ssdo_kernel_resolution),
            },
        )
        .with_availability(ssdo_available),
    )
}

/// Estimates one bounce of indirect diffuse light from the lit image. The
/// lit image's mip chain is regenerated just before, so wide-radius samples
/// read prefiltered levels.
#[must_use]
pub fn ssdo() -> PostProcessPass {
    PostProcessPass::new(
        PostProcessSpec::new(
            "ssdo",
            "shaders/ssdo/ssdo.frag",
            OutputTarget::Owned {
                volume: SSDO_MAP_VOLUME,
                format: wgpu::TextureFormat::Rgba16Float,
                resolution: OutputResolution::Custom(ssdo_resolution),
            },
        )
        .with_inputs(&[G_BUFFER_VOLUME, POST_PROCESS_MAP_VOLUME, SSDO_SAMPLES_VOLUME])
        .with_availability(ssdo_available)
        .with_attributes(ssdo_attributes),
    )
}

#[must_use]
pub fn ssdo_blur() -> PostProcessPass {
    PostProcessPass::new(
        PostProcessSpec::new(
            "ssdoBlur",
            "shaders/ssdo/blur.frag",
            OutputTarget::Owned {
                volume: SSDO_MAP_VOLUME,
                format: wgpu::TextureFormat::Rgba16Float,
                resolution: OutputResolution::Custom(ssdo_resolution),
            },
        )
        .with_inputs(&[SSDO_MAP_VOLUME])
        .with_availability(ssdo_available),
    )
}

#[must_use]
pub fn ssdo_temporal_filter() -> PostProcessPass {
    PostProcessPass::new(
        PostProcessSpec::new(
            "ssdoTemporalFilter",
            "shaders/ssdo/temporal_filter.frag",
            OutputTarget::Owned {
                volume: SSDO_MAP_VOLUME,
                format: wgpu::TextureFormat::Rgba16Float,
                resolution: OutputResolution::Custom(ssdo_resolution),
            },
        )
        .with_inputs(&[SSDO_MAP_VOLUME, G_BUFFER_VOLUME])
        .with_availability(ssdo_temporal_available),
    )
}

/// Adds the filtered indirect diffuse term onto the lit image.
#[must_use]
pub fn ssdo_combine() -> PostProcessPass {
    PostProcessPass::new(
        PostProcessSpec::new(
            "ssdoCombine",
            "shaders/ssdo/combine.frag",
            OutputTarget::Owned {
                volume: POST_PROCESS_MAP_VOLUME,
                format: wgpu::TextureFormat::Rgba16Float,
                resolution: OutputResolution::Window,
            },
        )
        .with_inputs(&[POST_PROCESS_MAP_VOLUME, SSDO_MAP_VOLUME])
        .with_availability(ssdo_available),
    )
}

/// The SSDO chain as one container: mip regeneration, kernel generation,
/// the occlusion estimate, blur, optional temporal filter, and the final
/// combine.
#[must_use]
pub fn ssdo_container() -> ContainerRenderPass {
    ContainerRenderPass::builder("ssdoContainer")
        .attach(SsdoMipmapsGate::new())
        .attach(ssdo_samples_generation())
        .attach(ssdo())
        .attach(ssdo_blur())
        .attach(ssdo_temporal_filter())
        .attach(ssdo_combine())
        .build()
}

/// Mip regeneration gated on the SSDO flag, so disabling SSDO skips the
/// mipmap work too.
struct SsdoMipmapsGate {
    inner: FramebufferMipmapsGenerationPass,
}

impl SsdoMipmapsGate {
    fn new() -> Self {
        Self {
            inner: FramebufferMipmapsGenerationPass::new(
                "ssdoSourceMipmaps",
                POST_PROCESS_MAP_VOLUME,
            ),
        }
    }
}

impl RenderPass for SsdoMipmapsGate {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn is_available(
        &self,
        _scene: &RenderScene,
        _camera: &Camera,
        settings: &RenderSettings,
        _volumes: &RenderVolumeCollection,
    ) -> bool {
        settings.ssdo_enabled
    }

    fn execute(
        &mut self,
        ctx: &mut FrameContext<'_>,
        volumes: &mut RenderVolumeCollection,
    ) -> Result<()> {
        self.inner.execute(ctx, volumes)
    }
}

// ─── Screen-space reflections ─────────────────────────────────────────────────

fn ssr_available(settings: &RenderSettings) -> bool {
    settings.ssr_enabled
}

fn indirect_specular_available(settings: &RenderSettings) -> bool {
    settings.ssr_enabled && settings.indirect_specular_enabled
}

fn ssr_resolution(settings: &RenderSettings) -> (u32, u32) {
    settings.resolution.scaled(settings.ssr_scale)
}

fn record_reflection_map(stats: &mut StatisticsRegistry, volume: &Arc<dyn RenderVolume>) {
    stats.get_or_default::<SsrStatistics>().reflection_map_volume = Some(volume.clone());
}

/// Ray-marches reflections against the depth buffer into the reflection map.
#[must_use]
pub fn ssr_trace() -> PostProcessPass {
    PostProcessPass::new(
        PostProcessSpec::new(
            "ssrTrace",
            "shaders/ssr/trace.frag",
            OutputTarget::Owned {
                volume: SSR_REFLECTION_MAP_VOLUME,
                format: wgpu::TextureFormat::Rgba16Float,
                resolution: OutputResolution::Custom(ssr_resolution),
            },
        )
        .with_inputs(&[G_BUFFER_VOLUME, POST_PROCESS_MAP_VOLUME])
        .with_availability(ssr_available)
        .with_publish(record_reflection_map),
    )
}

/// Resolves the traced reflections (and the glossy indirect specular term
/// when enabled) onto the lit image.
#[must_use]
pub fn ssr_resolve() -> PostProcessPass {
    PostProcessPass::new(
        PostProcessSpec::new(
            "ssrResolve",
            "shaders/ssr/resolve.frag",
            OutputTarget::Owned {
                volume: POST_PROCESS_MAP_VOLUME,
                format: wgpu::TextureFormat::Rgba16Float,
                resolution: OutputResolution::Window,
            },
        )
        .with_inputs(&[POST_PROCESS_MAP_VOLUME, SSR_REFLECTION_MAP_VOLUME, G_BUFFER_VOLUME])
        .with_availability(ssr_available)
        .with_attributes(ssr_resolve_attributes),
    )
}

fn ssr_resolve_attributes(
    _camera: &Camera,
    settings: &RenderSettings,
    _volumes: &RenderVolumeCollection,
) -> Vec<PipelineAttribute> {
    vec![PipelineAttribute::flag(
        "indirectSpecularEnabled",
        indirect_specular_available(settings),
    )]
}

#[must_use]
pub fn ssr_container() -> ContainerRenderPass {
    ContainerRenderPass::builder("ssrContainer")
        .attach(ssr_trace())
        .attach(ssr_resolve())
        .build()
}

// ─── Surface and temporal effects ─────────────────────────────────────────────

fn sss_available(settings: &RenderSettings) -> bool {
    settings.subsurface_scattering_enabled
}

fn taa_available(settings: &RenderSettings) -> bool {
    settings.taa_enabled
}

/// Screen-space subsurface scattering over skin-flagged G-buffer pixels.
#[must_use]
pub fn subsurface_scattering() -> PostProcessPass {
    PostProcessPass::new(
        PostProcessSpec::new(
            "subsurfaceScattering",
            "shaders/sss/diffusion.frag",
            OutputTarget::Owned {
                volume: POST_PROCESS_MAP_VOLUME,
                format: wgpu::TextureFormat::Rgba16Float,
                resolution: OutputResolution::Window,
            },
        )
        .with_inputs(&[POST_PROCESS_MAP_VOLUME, G_BUFFER_VOLUME])
        .with_availability(sss_available),
    )
}

/// Temporal antialiasing resolve against the history buffer the backend
/// keeps for the shader.
#[must_use]
pub fn temporal_antialiasing() -> PostProcessPass {
    PostProcessPass::new(
        PostProcessSpec::new(
            "temporalAntialiasing",
            "shaders/taa/resolve.frag",
            OutputTarget::Owned {
                volume: POST_PROCESS_MAP_VOLUME,
                format: wgpu::TextureFormat::Rgba16Float,
                resolution: OutputResolution::Window,
            },
        )
        .with_inputs(&[POST_PROCESS_MAP_VOLUME, G_BUFFER_VOLUME])
        .with_availability(taa_available),
    )
}

/// Adds the per-frame volumetric light accumulation onto the lit image.
#[must_use]
pub fn volumetric_accumulation() -> PostProcessPass {
    PostProcessPass::new(
        PostProcessSpec::new(
            "volumetricAccumulation",
            "shaders/volumetric/accumulation.frag",
            OutputTarget::Owned {
                volume: POST_PROCESS_MAP_VOLUME,
                format: wgpu::TextureFormat::Rgba16Float,
                resolution: OutputResolution::Window,
            },
        )
        .with_inputs(&[POST_PROCESS_MAP_VOLUME, VOLUMETRIC_LIGHT_MAP_VOLUME])
        .with_availability(volumetric_available),
    )
}

/// Adds the per-frame light shafts accumulation onto the lit image.
#[must_use]
pub fn light_shafts_accumulation() -> PostProcessPass {
    PostProcessPass::new(
        PostProcessSpec::new(
            "lightShaftsAccumulation",
            "shaders/light_shafts/accumulation.frag",
            OutputTarget::Owned {
                volume: POST_PROCESS_MAP_VOLUME,
                format: wgpu::TextureFormat::Rgba16Float,
                resolution: OutputResolution::Window,
            },
        )
        .with_inputs(&[POST_PROCESS_MAP_VOLUME, LIGHT_SHAFTS_MAP_VOLUME])
        .with_availability(light_shafts_available),
    )
}
