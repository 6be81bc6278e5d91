//! Render pass orchestration.
//!
//! The tree is data: a [`module::RenderModule`] owns top-level passes,
//! [`container::ContainerRenderPass`] nests sequences with iteration
//! strategies from [`iteration`], and passes exchange results through the
//! per-frame [`collection::RenderVolumeCollection`].

pub mod attribute;
pub mod collection;
pub mod container;
pub mod iteration;
pub mod module;
pub mod pass;
pub mod passes;
pub mod stats;
pub mod volume;
