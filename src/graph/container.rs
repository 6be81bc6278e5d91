//! Container Render Pass
//!
//! A composite pass holding an ordered list of child passes and a volume
//! provider that decides how many times, and over what dynamic set, the
//! child sequence re-executes.
//!
//! The tree is fixed at build time: the builder attaches children in the
//! exact order they must execute, `build` seals the container, and nothing
//! inserts or removes passes afterward. Children are owned exclusively;
//! nesting containers inside containers is unrestricted and is how the tree
//! scopes sub-collections and localized iteration counts.
//!
//! # Iteration Semantics
//!
//! Each sweep opens a collection scope, lets the provider publish its
//! per-iteration context (the current light), runs every *available* child
//! in attachment order, then closes the scope. Scoped entries expire with
//! the sweep; frame-global publications made by children survive it. One
//! sweep sees everything previous sweeps published globally, which is what
//! ping-pong blur chains rely on.
//!
//! Availability gating is per-child and consulted on every sweep; a
//! container never bypasses it.

use smallvec::SmallVec;

use crate::camera::Camera;
use crate::errors::Result;
use crate::gpu::GpuDevice;
use crate::graph::collection::RenderVolumeCollection;
use crate::graph::iteration::{IterateOverVolumeCollection, VolumeProvider};
use crate::graph::pass::{FrameContext, RenderPass};
use crate::scene::RenderScene;
use crate::settings::RenderSettings;

/// A render pass composed of an ordered list of child passes.
pub struct ContainerRenderPass {
    name: &'static str,
    provider: Box<dyn VolumeProvider>,
    children: Vec<Box<dyn RenderPass>>,
}

impl ContainerRenderPass {
    /// Starts a builder for a named container.
    #[must_use]
    pub fn builder(name: &'static str) -> ContainerBuilder {
        ContainerBuilder {
            name,
            provider: None,
            children: SmallVec::new(),
        }
    }

    #[must_use]
    pub fn child_count(&self) -> usize {
        self.children.len()
    }
}

impl RenderPass for ContainerRenderPass {
    fn name(&self) -> &str {
        self.name
    }

    /// A container is available when any of its children is; gating stays
    /// per-child, so a partially disabled group still runs its enabled
    /// members.
    fn is_available(
        &self,
        scene: &RenderScene,
        camera: &Camera,
        settings: &RenderSettings,
        volumes: &RenderVolumeCollection,
    ) -> bool {
        self.children
            .iter()
            .any(|child| child.is_available(scene, camera, settings, volumes))
    }

    fn init(&mut self, device: &mut dyn GpuDevice, settings: &RenderSettings) -> Result<()> {
        for child in &mut self.children {
            log::debug!("init pass '{}'", child.name());
            child
                .init(device, settings)
                .map_err(|e| e.in_pass(child.name()))?;
        }
        Ok(())
    }

    fn execute(
        &mut self,
        ctx: &mut FrameContext<'_>,
        volumes: &mut RenderVolumeCollection,
    ) -> Result<()> {
        let iterations = self.provider.iterations(ctx.scene);
        for index in 0..iterations {
            volumes.push_scope();
            let sweep = self.run_sweep(ctx, volumes, index);
            volumes.pop_scope();
            sweep?;
        }
        Ok(())
    }

    fn clear(&mut self, device: &mut dyn GpuDevice) {
        for child in &mut self.children {
            child.clear(device);
        }
    }
}

impl ContainerRenderPass {
    /// Runs one full child sweep inside an already-opened scope.
    fn run_sweep(
        &mut self,
        ctx: &mut FrameContext<'_>,
        volumes: &mut RenderVolumeCollection,
        index: usize,
    ) -> Result<()> {
        self.provider.enter_iteration(ctx.scene, index, volumes)?;
        for child in &mut self.children {
            if !child.is_available(ctx.scene, ctx.camera, ctx.settings, volumes) {
                log::trace!("skip pass '{}'", child.name());
                continue;
            }
            ctx.device.push_debug_group(child.name());
            let result = child.execute(ctx, volumes);
            ctx.device.pop_debug_group();
            result.map_err(|e| e.in_pass(child.name()))?;
        }
        Ok(())
    }
}

/// Builder sealing a fixed, ordered child list into a container.
pub struct ContainerBuilder {
    name: &'static str,
    provider: Option<Box<dyn VolumeProvider>>,
    children: SmallVec<[Box<dyn RenderPass>; 8]>,
}

impl ContainerBuilder {
    /// Sets the iteration strategy. Without one, the container executes its
    /// children exactly once per frame.
    #[must_use]
    pub fn volume(mut self, provider: impl VolumeProvider + 'static) -> Self {
        self.provider = Some(Box::new(provider));
        self
    }

    /// Attaches a child; children execute in attachment order.
    #[must_use]
    pub fn attach(mut self, pass: impl RenderPass + 'static) -> Self {
        self.children.push(Box::new(pass));
        self
    }

    /// Attaches an already-boxed child.
    #[must_use]
    pub fn attach_boxed(mut self, pass: Box<dyn RenderPass>) -> Self {
        self.children.push(pass);
        self
    }

    /// Seals the container.
    #[must_use]
    pub fn build(self) -> ContainerRenderPass {
        ContainerRenderPass {
            name: self.name,
            provider: self
                .provider
                .unwrap_or_else(|| Box::new(IterateOverVolumeCollection::new(1))),
            children: self.children.into_vec(),
        }
    }
}
