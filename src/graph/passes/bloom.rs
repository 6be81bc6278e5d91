//! Bloom chain.
//!
//! Bright extraction at a scaled resolution, a fixed number of separable
//! blur iterations, then accumulation onto the lit image. The blur runs as
//! a counted container: its two children ping-pong between a pair of owned
//! volumes, the vertical stage republishing under the extraction's name so
//! every iteration (and the accumulation) reads the latest result from one
//! well-known key.

use std::sync::Arc;

use crate::camera::Camera;
use crate::graph::attribute::PipelineAttribute;
use crate::graph::collection::RenderVolumeCollection;
use crate::graph::container::ContainerRenderPass;
use crate::graph::iteration::IterateOverVolumeCollection;
use crate::graph::passes::post_process::{
    OutputResolution, OutputTarget, PostProcessPass, PostProcessSpec,
};
use crate::graph::passes::POST_PROCESS_MAP_VOLUME;
use crate::graph::stats::{BloomStatistics, StatisticsRegistry};
use crate::graph::volume::RenderVolume;
use crate::settings::RenderSettings;

const BRIGHT_PIXELS_MAP_VOLUME: &str = "brightPixelsMapVolume";
const HORIZONTAL_BLUR_MAP_VOLUME: &str = "bloomHorizontalMapVolume";

/// Blur iterations; each runs a horizontal and a vertical stage.
pub const BLOOM_BLUR_ITERATIONS: usize = 5;

fn bloom_available(settings: &RenderSettings) -> bool {
    settings.bloom_enabled
}

fn bloom_resolution(settings: &RenderSettings) -> (u32, u32) {
    settings.resolution.scaled(settings.bloom_scale)
}

fn record_bright_pixels(stats: &mut StatisticsRegistry, volume: &Arc<dyn RenderVolume>) {
    stats.get_or_default::<BloomStatistics>().bright_pixels_volume = Some(volume.clone());
}

fn record_bloom_map(stats: &mut StatisticsRegistry, volume: &Arc<dyn RenderVolume>) {
    stats.get_or_default::<BloomStatistics>().bloom_map_volume = Some(volume.clone());
}

fn extraction_attributes(
    _camera: &Camera,
    settings: &RenderSettings,
    _volumes: &RenderVolumeCollection,
) -> Vec<PipelineAttribute> {
    vec![PipelineAttribute::float(
        "bloomThreshold",
        settings.bloom_threshold,
    )]
}

/// Extracts pixels above the bloom luminance threshold.
#[must_use]
pub fn bright_extraction() -> PostProcessPass {
    PostProcessPass::new(
        PostProcessSpec::new(
            "bloomBrightExtraction",
            "shaders/bloom/bright_extraction.frag",
            OutputTarget::Owned {
                volume: BRIGHT_PIXELS_MAP_VOLUME,
                format: wgpu::TextureFormat::Rgba16Float,
                resolution: OutputResolution::Custom(bloom_resolution),
            },
        )
        .with_inputs(&[POST_PROCESS_MAP_VOLUME])
        .with_availability(bloom_available)
        .with_attributes(extraction_attributes)
        .with_publish(record_bright_pixels),
    )
}

#[must_use]
pub fn horizontal_blur() -> PostProcessPass {
    PostProcessPass::new(
        PostProcessSpec::new(
            "bloomHorizontalBlur",
            "shaders/bloom/horizontal_blur.frag",
            OutputTarget::Owned {
                volume: HORIZONTAL_BLUR_MAP_VOLUME,
                format: wgpu::TextureFormat::Rgba16Float,
                resolution: OutputResolution::Custom(bloom_resolution),
            },
        )
        .with_inputs(&[BRIGHT_PIXELS_MAP_VOLUME])
        .with_availability(bloom_available),
    )
}

/// Completes one separable blur round, republishing under the extraction's
/// name so the next round (or the accumulation) picks it up.
#[must_use]
pub fn vertical_blur() -> PostProcessPass {
    PostProcessPass::new(
        PostProcessSpec::new(
            "bloomVerticalBlur",
            "shaders/bloom/vertical_blur.frag",
            OutputTarget::Owned {
                volume: BRIGHT_PIXELS_MAP_VOLUME,
                format: wgpu::TextureFormat::Rgba16Float,
                resolution: OutputResolution::Custom(bloom_resolution),
            },
        )
        .with_inputs(&[HORIZONTAL_BLUR_MAP_VOLUME])
        .with_availability(bloom_available)
        .with_publish(record_bloom_map),
    )
}

/// Adds the blurred bright map onto the lit image.
#[must_use]
pub fn accumulation() -> PostProcessPass {
    PostProcessPass::new(
        PostProcessSpec::new(
            "bloomAccumulation",
            "shaders/bloom/accumulation.frag",
            OutputTarget::Owned {
                volume: POST_PROCESS_MAP_VOLUME,
                format: wgpu::TextureFormat::Rgba16Float,
                resolution: OutputResolution::Window,
            },
        )
        .with_inputs(&[POST_PROCESS_MAP_VOLUME, BRIGHT_PIXELS_MAP_VOLUME])
        .with_availability(bloom_available),
    )
}

/// The full bloom chain with `iterations` blur rounds.
#[must_use]
pub fn bloom_container(iterations: usize) -> ContainerRenderPass {
    let blur = ContainerRenderPass::builder("bloomBlur")
        .volume(IterateOverVolumeCollection::new(iterations))
        .attach(horizontal_blur())
        .attach(vertical_blur())
        .build();
    ContainerRenderPass::builder("bloom")
        .attach(bright_extraction())
        .attach(blur)
        .attach(accumulation())
        .build()
}
