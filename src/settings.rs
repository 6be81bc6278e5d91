//! Render Settings
//!
//! Immutable-per-frame configuration read by availability predicates and
//! attribute builders. The same fixed pass tree serves every combination of
//! these flags: a disabled feature is skipped with zero GPU cost by its
//! pass's availability predicate, never by rebuilding the tree.
//!
//! # Lifecycle
//!
//! Constructed once (or mutated between frames by a configuration UI) and
//! read-only during pass execution. A resolution change is the one settings
//! edit that invalidates GPU state; it requires an explicit
//! `RenderModule::clear` + `RenderModule::init` round trip to recreate the
//! fixed per-pass volumes at the new size.

/// Output resolution in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    /// Returns the resolution scaled by `scale`, clamped to at least 1×1.
    #[must_use]
    pub fn scaled(&self, scale: f32) -> (u32, u32) {
        let w = ((self.width as f32 * scale) as u32).max(1);
        let h = ((self.height as f32 * scale) as u32).max(1);
        (w, h)
    }
}

/// Global configuration for the deferred pipeline.
///
/// Feature toggles gate entire passes; scalar tunables feed pipeline
/// attributes. Field names are the contract between the settings UI and the
/// availability predicates, so renames here are breaking changes.
#[derive(Debug, Clone)]
pub struct RenderSettings {
    // === Output ===
    /// Target resolution for full-screen volumes.
    pub resolution: Resolution,
    /// Clear color for the light accumulation target.
    pub clear_color: wgpu::Color,

    // === Ambient ===
    /// Flat ambient term strength applied by the ambient light pass.
    pub ambient_intensity: f32,

    // === Screen-Space Ambient Occlusion ===
    pub ssao_enabled: bool,
    /// Resolution scale of the AO volume relative to the output.
    pub ssao_scale: f32,
    /// Hemisphere sampling radius in view space.
    pub ssao_radius: f32,
    /// Depth bias avoiding self-occlusion.
    pub ssao_bias: f32,
    /// Kernel sample count.
    pub ssao_samples: u32,
    /// Side length of the tiled rotation noise texture.
    pub ssao_noise_size: u32,
    pub ssao_temporal_filter_enabled: bool,

    // === Voxel Cone Traced Ambient Occlusion ===
    /// Alternative AO source; mutually exclusive with SSAO by convention.
    pub vct_ao_enabled: bool,
    /// Cone origin offset along the surface normal.
    pub vct_origin_bias: f32,
    pub vct_ao_cone_ratio: f32,
    pub vct_ao_cone_distance: f32,

    // === Indirect Lighting ===
    /// Screen-space directional occlusion (indirect diffuse).
    pub ssdo_enabled: bool,
    pub ssdo_scale: f32,
    pub ssdo_samples: u32,
    pub ssdo_temporal_filter_enabled: bool,
    /// Screen-space reflections.
    pub ssr_enabled: bool,
    pub ssr_scale: f32,
    /// Indirect specular resolve on top of the reflection trace.
    pub indirect_specular_enabled: bool,

    // === Surface / Temporal Effects ===
    pub subsurface_scattering_enabled: bool,
    pub taa_enabled: bool,
    pub volumetric_lighting_enabled: bool,
    pub light_shafts_enabled: bool,

    // === Bloom ===
    pub bloom_enabled: bool,
    /// Resolution scale of the bright-pixels volume.
    pub bloom_scale: f32,
    /// Luminance threshold for bright extraction.
    pub bloom_threshold: f32,

    // === Composite ===
    pub hdr_enabled: bool,
    /// HDR exposure used by the tone-map pass.
    pub hdr_exposure: f32,
    /// Color-grading lookup table.
    pub lut_enabled: bool,
    pub lut_intensity: f32,
    pub gamma_correction_enabled: bool,

    // === Shadows ===
    /// Cascade count for directional light shadow maps.
    pub shadow_cascades: u32,
    /// Side length of one cascade target in pixels.
    pub shadow_map_resolution: u32,
    /// Blend factor between logarithmic and uniform cascade splits.
    pub shadow_split_lambda: f32,

    // === Debug ===
    pub gizmos_enabled: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            resolution: Resolution {
                width: 1280,
                height: 720,
            },
            clear_color: wgpu::Color::BLACK,

            ambient_intensity: 0.2,

            ssao_enabled: true,
            ssao_scale: 0.5,
            ssao_radius: 0.5,
            ssao_bias: 0.025,
            ssao_samples: 64,
            ssao_noise_size: 4,
            ssao_temporal_filter_enabled: true,

            vct_ao_enabled: false,
            vct_origin_bias: 0.05,
            vct_ao_cone_ratio: 1.0,
            vct_ao_cone_distance: 0.3,

            ssdo_enabled: false,
            ssdo_scale: 0.5,
            ssdo_samples: 32,
            ssdo_temporal_filter_enabled: false,
            ssr_enabled: false,
            ssr_scale: 0.5,
            indirect_specular_enabled: false,

            subsurface_scattering_enabled: false,
            taa_enabled: false,
            volumetric_lighting_enabled: false,
            light_shafts_enabled: false,

            bloom_enabled: true,
            bloom_scale: 0.5,
            bloom_threshold: 1.0,

            hdr_enabled: true,
            hdr_exposure: 1.0,
            lut_enabled: false,
            lut_intensity: 1.0,
            gamma_correction_enabled: true,

            shadow_cascades: 4,
            shadow_map_resolution: 2048,
            shadow_split_lambda: 0.5,

            gizmos_enabled: false,
        }
    }
}
