//! Render Module
//!
//! The root of the pass tree. A module owns an ordered list of top-level
//! passes, walks them once per frame with the same availability gating and
//! debug-group bracketing containers apply to their children, and hands the
//! final light accumulation volume back to the caller.
//!
//! [`RenderModule::deferred`] assembles the stock deferred tree; custom
//! trees go through [`RenderModule::new`] with any pass list.

use std::sync::Arc;

use crate::camera::Camera;
use crate::errors::{RenderError, Result};
use crate::gpu::GpuDevice;
use crate::graph::collection::RenderVolumeCollection;
use crate::graph::container::ContainerRenderPass;
use crate::graph::iteration::LightVolumeCollection;
use crate::graph::pass::{FrameContext, RenderPass};
use crate::graph::passes::bloom::{bloom_container, BLOOM_BLUR_ITERATIONS};
use crate::graph::passes::composite::{
    gamma_correction, hdr, texture_lut, DeferredBlitPass, IdlePass,
};
use crate::graph::passes::forward::{ForwardPass, GizmosPass, GuiPass, WindowBlitPass};
use crate::graph::passes::framebuffer::FramebufferGenerationPass;
use crate::graph::passes::geometry::DeferredGeometryPass;
use crate::graph::passes::lighting::{
    ambient_light, DeferredLightPass, DirectionalLightShadowMapPass, SpotLightShadowMapPass,
};
use crate::graph::passes::post_process::OutputResolution;
use crate::graph::passes::screen_space::{
    light_shafts, light_shafts_accumulation, light_source, ssdo_container, ssr_container,
    subsurface_scattering, temporal_antialiasing, volumetric_accumulation, volumetric_lighting,
};
use crate::graph::passes::skybox::SkyboxPass;
use crate::graph::passes::ssao::{ssao_container, vct_ambient_occlusion};
use crate::graph::passes::{
    LIGHT_ACCUMULATION_VOLUME, LIGHT_SHAFTS_MAP_VOLUME, LIGHT_SOURCE_MAP_VOLUME,
    VOLUMETRIC_LIGHT_MAP_VOLUME,
};
use crate::graph::stats::StatisticsRegistry;
use crate::graph::volume::RenderVolume;
use crate::scene::{LightKind, RenderScene};
use crate::settings::RenderSettings;

const ACCUMULATION_FORMAT: &[wgpu::TextureFormat] = &[wgpu::TextureFormat::Rgba16Float];

/// Owns and drives a fixed pass tree.
pub struct RenderModule {
    passes: Vec<Box<dyn RenderPass>>,
    stats: StatisticsRegistry,
    initialized: bool,
}

impl RenderModule {
    /// A module over an arbitrary top-level pass list.
    #[must_use]
    pub fn new(passes: Vec<Box<dyn RenderPass>>) -> Self {
        Self {
            passes,
            stats: StatisticsRegistry::new(),
            initialized: false,
        }
    }

    /// The stock deferred tree: G-buffer fill, ambient occlusion, ambient
    /// and per-light accumulation, skybox, the post-process chain, then
    /// forward rendering and presentation.
    #[must_use]
    pub fn deferred() -> Self {
        let directional_lights = ContainerRenderPass::builder("directionalLights")
            .volume(LightVolumeCollection::directional())
            .attach(DirectionalLightShadowMapPass::new())
            .attach(DeferredLightPass::new(LightKind::Directional))
            .attach(volumetric_lighting())
            .attach(light_source())
            .attach(light_shafts())
            .build();
        let point_lights = ContainerRenderPass::builder("pointLights")
            .volume(LightVolumeCollection::point())
            .attach(DeferredLightPass::new(LightKind::Point))
            .build();
        let spot_lights = ContainerRenderPass::builder("spotLights")
            .volume(LightVolumeCollection::spot())
            .attach(SpotLightShadowMapPass::new())
            .attach(DeferredLightPass::new(LightKind::Spot))
            .build();

        let post_process = ContainerRenderPass::builder("postProcess")
            .attach(IdlePass::new())
            .attach(ssdo_container())
            .attach(ssr_container())
            .attach(subsurface_scattering())
            .attach(temporal_antialiasing())
            .attach(volumetric_accumulation())
            .attach(light_shafts_accumulation())
            .attach(bloom_container(BLOOM_BLUR_ITERATIONS))
            .attach(hdr())
            .attach(texture_lut())
            .attach(gamma_correction())
            .attach(DeferredBlitPass::new())
            .build();

        Self::new(vec![
            Box::new(
                FramebufferGenerationPass::new(
                    "resultFramebufferGeneration",
                    LIGHT_ACCUMULATION_VOLUME,
                    ACCUMULATION_FORMAT,
                    OutputResolution::Window,
                )
                .with_depth()
                .cleared_each_frame(),
            ),
            Box::new(DeferredGeometryPass::new()),
            Box::new(
                FramebufferGenerationPass::new(
                    "volumetricLightMapGeneration",
                    VOLUMETRIC_LIGHT_MAP_VOLUME,
                    ACCUMULATION_FORMAT,
                    OutputResolution::Window,
                )
                .cleared_each_frame(),
            ),
            Box::new(
                FramebufferGenerationPass::new(
                    "lightSourceMapGeneration",
                    LIGHT_SOURCE_MAP_VOLUME,
                    ACCUMULATION_FORMAT,
                    OutputResolution::Window,
                )
                .cleared_each_frame(),
            ),
            Box::new(
                FramebufferGenerationPass::new(
                    "lightShaftsMapGeneration",
                    LIGHT_SHAFTS_MAP_VOLUME,
                    ACCUMULATION_FORMAT,
                    OutputResolution::Window,
                )
                .cleared_each_frame(),
            ),
            Box::new(ssao_container()),
            Box::new(vct_ambient_occlusion()),
            Box::new(ambient_light()),
            Box::new(directional_lights),
            Box::new(point_lights),
            Box::new(spot_lights),
            Box::new(SkyboxPass::new()),
            Box::new(post_process),
            Box::new(ForwardPass::new()),
            Box::new(WindowBlitPass::new()),
            Box::new(GizmosPass::new()),
            Box::new(GuiPass::new()),
        ])
    }

    /// Initializes every pass in order: shader loads, fixed target
    /// allocation. Any failure aborts with the failing pass named in the
    /// error chain and leaves the module unusable until a successful retry.
    pub fn init(&mut self, device: &mut dyn GpuDevice, settings: &RenderSettings) -> Result<()> {
        self.initialized = false;
        for pass in &mut self.passes {
            log::debug!("init pass '{}'", pass.name());
            pass.init(device, settings).map_err(|e| {
                let error = e.in_pass(pass.name());
                log::error!("pass initialization failed: {error}");
                error
            })?;
        }
        self.initialized = true;
        Ok(())
    }

    /// Renders one frame, returning the final light accumulation volume.
    ///
    /// The collection is created fresh each frame; nothing leaks between
    /// frames except the fixed volumes passes own and republish.
    pub fn execute(
        &mut self,
        device: &mut dyn GpuDevice,
        scene: &RenderScene,
        camera: &Camera,
        settings: &RenderSettings,
    ) -> Result<Arc<dyn RenderVolume>> {
        if !self.initialized {
            return Err(RenderError::NotInitialized {
                pass: "renderModule".to_owned(),
            });
        }

        let mut volumes = RenderVolumeCollection::new();
        let mut ctx = FrameContext {
            device,
            scene,
            camera,
            settings,
            stats: &mut self.stats,
        };
        for pass in &mut self.passes {
            if !pass.is_available(ctx.scene, ctx.camera, ctx.settings, &volumes) {
                log::trace!("skip pass '{}'", pass.name());
                continue;
            }
            ctx.device.push_debug_group(pass.name());
            let result = pass.execute(&mut ctx, &mut volumes);
            ctx.device.pop_debug_group();
            result.map_err(|e| e.in_pass(pass.name()))?;
        }

        Ok(volumes.get(LIGHT_ACCUMULATION_VOLUME)?.clone())
    }

    /// Per-frame observability snapshot populated by the last `execute`.
    #[must_use]
    pub fn statistics(&self) -> &StatisticsRegistry {
        &self.stats
    }

    /// Tears down every pass's fixed GPU state. Required (followed by
    /// [`RenderModule::init`]) after a resolution change.
    pub fn clear(&mut self, device: &mut dyn GpuDevice) {
        for pass in &mut self.passes {
            pass.clear(device);
        }
        self.initialized = false;
    }

    #[must_use]
    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }
}
