//! Pass-tree orchestration core for a real-time deferred renderer.
//!
//! The crate drives frame rendering as a fixed tree of render passes.
//! Passes never call each other: producers publish named volumes into a
//! per-frame collection, consumers look them up, and container passes scope
//! per-iteration context (the current light, its shadow map) so it never
//! leaks past its iteration. GPU work goes through the [`gpu::GpuDevice`]
//! capability trait, which keeps the whole tree testable without a device.
//!
//! ```no_run
//! use ember_render::{Camera, GpuDevice, RenderModule, RenderScene, RenderSettings};
//! use glam::Vec3;
//!
//! fn frame(device: &mut dyn GpuDevice, scene: &RenderScene) -> ember_render::Result<()> {
//!     let settings = RenderSettings::default();
//!     let camera = Camera::perspective(
//!         Vec3::new(0.0, 2.0, 5.0),
//!         Vec3::ZERO,
//!         std::f32::consts::FRAC_PI_3,
//!         16.0 / 9.0,
//!         0.1,
//!         100.0,
//!     );
//!     let mut module = RenderModule::deferred();
//!     module.init(device, &settings)?;
//!     let _frame = module.execute(device, scene, &camera, &settings)?;
//!     Ok(())
//! }
//! ```

pub mod camera;
pub mod errors;
pub mod gpu;
pub mod graph;
pub mod scene;
pub mod settings;

pub use camera::Camera;
pub use errors::{RenderError, Result};
pub use gpu::{FramebufferHandle, GpuDevice, ShaderDesc, ShaderHandle, TextureDesc, TextureHandle};
pub use graph::attribute::{AttributeValue, PipelineAttribute};
pub use graph::collection::RenderVolumeCollection;
pub use graph::container::{ContainerBuilder, ContainerRenderPass};
pub use graph::iteration::{
    IterateOverVolumeCollection, LightVolumeCollection, VolumeProvider, CURRENT_LIGHT_VOLUME,
};
pub use graph::module::RenderModule;
pub use graph::pass::{FrameContext, RenderPass};
pub use graph::stats::StatisticsRegistry;
pub use graph::volume::{FramebufferVolume, LightVolume, RenderVolume, TextureVolume};
pub use scene::{Light, LightKind, RenderScene, Renderable, SceneLayers};
pub use settings::{RenderSettings, Resolution};
