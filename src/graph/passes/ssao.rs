//! Ambient occlusion stages.
//!
//! The SSAO chain is a container of five fullscreen stages: kernel and
//! noise generation, the occlusion estimate at a scaled resolution, a blur,
//! and an optional temporal filter. Each refinement republishes
//! [`AMBIENT_OCCLUSION_MAP_VOLUME`], so the ambient light pass always reads
//! the most refined map without knowing which stages ran.

use std::sync::Arc;

use crate::camera::Camera;
use crate::graph::attribute::PipelineAttribute;
use crate::graph::collection::RenderVolumeCollection;
use crate::graph::container::ContainerRenderPass;
use crate::graph::passes::post_process::{
    OutputResolution, OutputTarget, PostProcessPass, PostProcessSpec,
};
use crate::graph::passes::{AMBIENT_OCCLUSION_MAP_VOLUME, G_BUFFER_VOLUME};
use crate::graph::stats::{SsaoStatistics, StatisticsRegistry};
use crate::graph::volume::RenderVolume;
use crate::settings::RenderSettings;

const SAMPLES_VOLUME: &str = "ssaoSamplesVolume";
const NOISE_VOLUME: &str = "ssaoNoiseVolume";

fn ssao_available(settings: &RenderSettings) -> bool {
    settings.ssao_enabled
}

fn temporal_filter_available(settings: &RenderSettings) -> bool {
    settings.ssao_enabled && settings.ssao_temporal_filter_enabled
}

fn scaled_resolution(settings: &RenderSettings) -> (u32, u32) {
    settings.resolution.scaled(settings.ssao_scale)
}

fn kernel_resolution(settings: &RenderSettings) -> (u32, u32) {
    (settings.ssao_samples.max(1), 1)
}

fn noise_resolution(settings: &RenderSettings) -> (u32, u32) {
    let side = settings.ssao_noise_size.max(1);
    (side, side)
}

fn occlusion_attributes(
    _camera: &Camera,
    settings: &RenderSettings,
    _volumes: &RenderVolumeCollection,
) -> Vec<PipelineAttribute> {
    vec![
        PipelineAttribute::float("ssaoRadius", settings.ssao_radius),
        PipelineAttribute::float("ssaoBias", settings.ssao_bias),
        PipelineAttribute::uint("ssaoSamplesCount", settings.ssao_samples),
        PipelineAttribute::uint("ssaoNoiseSize", settings.ssao_noise_size),
    ]
}

fn record_samples(stats: &mut StatisticsRegistry, volume: &Arc<dyn RenderVolume>) {
    stats.get_or_default::<SsaoStatistics>().samples_volume = Some(volume.clone());
}

fn record_noise(stats: &mut StatisticsRegistry, volume: &Arc<dyn RenderVolume>) {
    stats.get_or_default::<SsaoStatistics>().noise_volume = Some(volume.clone());
}

fn record_occlusion(stats: &mut StatisticsRegistry, volume: &Arc<dyn RenderVolume>) {
    stats.get_or_default::<SsaoStatistics>().ssao_map_volume = Some(volume.clone());
}

fn record_blur(stats: &mut StatisticsRegistry, volume: &Arc<dyn RenderVolume>) {
    stats.get_or_default::<SsaoStatistics>().blur_map_volume = Some(volume.clone());
}

fn record_temporal_filter(stats: &mut StatisticsRegistry, volume: &Arc<dyn RenderVolume>) {
    stats.get_or_default::<SsaoStatistics>().temporal_filter_map_volume = Some(volume.clone());
}

/// Renders the hemisphere sampling kernel into a 1D texture.
#[must_use]
pub fn samples_generation() -> PostProcessPass {
    PostProcessPass::new(
        PostProcessSpec::new(
            "ssaoSamplesGeneration",
            "shaders/ssao/samples_generation.frag",
            OutputTarget::Owned {
                volume: SAMPLES_VOLUME,
                format: wgpu::TextureFormat::Rgba16Float,
                resolution: OutputResolution::Custom(kernel_resolution),
            },
        )
        .with_availability(ssao_available)
        .with_publish(record_samples),
    )
}

/// Renders the tiled rotation noise texture.
#[must_use]
pub fn noise_generation() -> PostProcessPass {
    PostProcessPass::new(
        PostProcessSpec::new(
            "ssaoNoiseGeneration",
            "shaders/ssao/noise_generation.frag",
            OutputTarget::Owned {
                volume: NOISE_VOLUME,
                format: wgpu::TextureFormat::Rgba16Float,
                resolution: OutputResolution::Custom(noise_resolution),
            },
        )
        .with_availability(ssao_available)
        .with_publish(record_noise),
    )
}

/// Estimates occlusion from the G-buffer at a scaled resolution.
#[must_use]
pub fn occlusion() -> PostProcessPass {
    PostProcessPass::new(
        PostProcessSpec::new(
            "ssao",
            "shaders/ssao/ssao.frag",
            OutputTarget::Owned {
                volume: AMBIENT_OCCLUSION_MAP_VOLUME,
                format: wgpu::TextureFormat::R16Float,
                resolution: OutputResolution::Custom(scaled_resolution),
            },
        )
        .with_inputs(&[G_BUFFER_VOLUME, SAMPLES_VOLUME, NOISE_VOLUME])
        .with_availability(ssao_available)
        .with_attributes(occlusion_attributes)
        .with_publish(record_occlusion),
    )
}

/// Smooths the raw occlusion estimate, removing the noise pattern.
#[must_use]
pub fn blur() -> PostProcessPass {
    PostProcessPass::new(
        PostProcessSpec::new(
            "ssaoBlur",
            "shaders/ssao/blur.frag",
            OutputTarget::Owned {
                volume: AMBIENT_OCCLUSION_MAP_VOLUME,
                format: wgpu::TextureFormat::R16Float,
                resolution: OutputResolution::Custom(scaled_resolution),
            },
        )
        .with_inputs(&[AMBIENT_OCCLUSION_MAP_VOLUME])
        .with_availability(ssao_available)
        .with_publish(record_blur),
    )
}

/// Blends the blurred map with the previous frame's result.
#[must_use]
pub fn temporal_filter() -> PostProcessPass {
    PostProcessPass::new(
        PostProcessSpec::new(
            "ssaoTemporalFilter",
            "shaders/ssao/temporal_filter.frag",
            OutputTarget::Owned {
                volume: AMBIENT_OCCLUSION_MAP_VOLUME,
                format: wgpu::TextureFormat::R16Float,
                resolution: OutputResolution::Custom(scaled_resolution),
            },
        )
        .with_inputs(&[AMBIENT_OCCLUSION_MAP_VOLUME, G_BUFFER_VOLUME])
        .with_availability(temporal_filter_available)
        .with_publish(record_temporal_filter),
    )
}

/// The full SSAO chain as one container.
#[must_use]
pub fn ssao_container() -> ContainerRenderPass {
    ContainerRenderPass::builder("ssaoContainer")
        .attach(samples_generation())
        .attach(noise_generation())
        .attach(occlusion())
        .attach(blur())
        .attach(temporal_filter())
        .build()
}

fn vct_available(settings: &RenderSettings) -> bool {
    settings.vct_ao_enabled
}

fn vct_attributes(
    _camera: &Camera,
    settings: &RenderSettings,
    _volumes: &RenderVolumeCollection,
) -> Vec<PipelineAttribute> {
    vec![
        PipelineAttribute::float("vctOriginBias", settings.vct_origin_bias),
        PipelineAttribute::float("vctConeRatio", settings.vct_ao_cone_ratio),
        PipelineAttribute::float("vctConeDistance", settings.vct_ao_cone_distance),
    ]
}

/// Voxel cone traced occlusion, the alternative producer of
/// [`AMBIENT_OCCLUSION_MAP_VOLUME`].
#[must_use]
pub fn vct_ambient_occlusion() -> PostProcessPass {
    PostProcessPass::new(
        PostProcessSpec::new(
            "vctAmbientOcclusion",
            "shaders/vct/ambient_occlusion.frag",
            OutputTarget::Owned {
                volume: AMBIENT_OCCLUSION_MAP_VOLUME,
                format: wgpu::TextureFormat::R16Float,
                resolution: OutputResolution::Window,
            },
        )
        .with_inputs(&[G_BUFFER_VOLUME])
        .with_availability(vct_available)
        .with_attributes(vct_attributes)
        .with_publish(record_occlusion),
    )
}
