//! Concrete render passes.
//!
//! Passes communicate exclusively through named volumes in the per-frame
//! [`RenderVolumeCollection`](crate::graph::collection::RenderVolumeCollection).
//! The names below are the shared contract between producers and consumers;
//! effect-private intermediates (blur ping-pong targets, SSAO kernel
//! textures) stay as string literals inside their own modules.

pub mod bloom;
pub mod composite;
pub mod forward;
pub mod framebuffer;
pub mod geometry;
pub mod lighting;
pub mod post_process;
pub mod screen_space;
pub mod skybox;
pub mod ssao;

/// The frame's light accumulation target; also the module's final output.
pub const LIGHT_ACCUMULATION_VOLUME: &str = "lightAccumulationVolume";
/// The G-buffer produced by the deferred geometry pass.
pub const G_BUFFER_VOLUME: &str = "gBufferVolume";
/// The rolling post-process result each tonemapping stage refines.
pub const POST_PROCESS_MAP_VOLUME: &str = "postProcessMapVolume";
/// The final ambient occlusion map (SSAO or voxel cone traced).
pub const AMBIENT_OCCLUSION_MAP_VOLUME: &str = "ambientOcclusionMapVolume";
/// The shadow map of the light currently being iterated.
pub const SHADOW_MAP_VOLUME: &str = "shadowMapVolume";
/// Per-frame volumetric light scattering accumulation.
pub const VOLUMETRIC_LIGHT_MAP_VOLUME: &str = "volumetricLightMapVolume";
/// Per-frame unoccluded light source map (light shafts input).
pub const LIGHT_SOURCE_MAP_VOLUME: &str = "lightSourceMapVolume";
/// Per-frame radial light shafts accumulation.
pub const LIGHT_SHAFTS_MAP_VOLUME: &str = "lightShaftsMapVolume";
