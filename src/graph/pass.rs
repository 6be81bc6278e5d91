//! Render Pass Contract
//!
//! The atomic unit of frame work. Every stage, from the G-buffer fill to the
//! GUI overlay, implements this one flat trait; composite behavior comes
//! from [`ContainerRenderPass`](super::container::ContainerRenderPass)
//! rather than a deeper hierarchy.
//!
//! # Design Principles
//!
//! - `is_available` is a pure predicate over immutable per-frame state,
//!   re-evaluated on every invocation. Cheap flag checks only, never a GPU
//!   query; this is what lets one fixed tree serve every quality preset.
//! - `init` is the only place fixed GPU state is created. A shader that
//!   fails to load here is fatal and aborts module construction with the
//!   pass name and resource path.
//! - `execute` submits GPU work and threads the volume collection forward.
//!   Reading a required volume that is absent is a contract violation.
//! - A pass that locks a shader unlocks it before returning, on all paths.

use crate::camera::Camera;
use crate::errors::Result;
use crate::gpu::GpuDevice;
use crate::graph::collection::RenderVolumeCollection;
use crate::graph::stats::StatisticsRegistry;
use crate::scene::RenderScene;
use crate::settings::RenderSettings;

/// Everything a pass execution may touch, bundled so the walker hands a
/// single context down the tree.
///
/// The device and statistics registry are the only mutable members; scene,
/// camera and settings stay read-only for the whole frame.
pub struct FrameContext<'a> {
    pub device: &'a mut dyn GpuDevice,
    pub scene: &'a RenderScene,
    pub camera: &'a Camera,
    pub settings: &'a RenderSettings,
    pub stats: &'a mut StatisticsRegistry,
}

/// One stage of frame rendering.
pub trait RenderPass {
    /// Pass name, used for debug groups and diagnostics.
    fn name(&self) -> &str;

    /// One-time setup: load shaders, allocate fixed targets.
    ///
    /// Called once at module build time, and again after a settings-driven
    /// teardown (resolution change).
    fn init(&mut self, _device: &mut dyn GpuDevice, _settings: &RenderSettings) -> Result<()> {
        Ok(())
    }

    /// Whether this pass runs this invocation.
    ///
    /// Must be pure and side-effect free: same inputs, same answer. A pass
    /// skipped here costs nothing on the GPU and leaves the collection
    /// untouched.
    fn is_available(
        &self,
        _scene: &RenderScene,
        _camera: &Camera,
        _settings: &RenderSettings,
        _volumes: &RenderVolumeCollection,
    ) -> bool {
        true
    }

    /// Submits this stage's GPU work.
    ///
    /// May create volumes and publish them, read required volumes by name,
    /// and mutate existing volumes in place.
    fn execute(
        &mut self,
        ctx: &mut FrameContext<'_>,
        volumes: &mut RenderVolumeCollection,
    ) -> Result<()>;

    /// Releases fixed per-pass resources. Called at module teardown and
    /// before a re-`init`.
    fn clear(&mut self, _device: &mut dyn GpuDevice) {}
}
