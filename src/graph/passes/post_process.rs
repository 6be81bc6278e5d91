//! Post-Process Pass Shape
//!
//! Almost every screen-space stage in the tree has the same skeleton: load
//! one fragment shader over a shared fullscreen vertex shader, read a few
//! named input volumes, bind a target, draw one quad, publish the result.
//! Instead of a subclass per effect, the shape is a single
//! [`PostProcessPass`] driven by a [`PostProcessSpec`]: a data-plus-strategy
//! bundle of shader path, output descriptor, resolution function,
//! availability predicate and custom attribute builder. Concrete effects
//! are constructor functions over this one struct.

use std::sync::Arc;

use glam::Vec2;

use crate::camera::Camera;
use crate::errors::{RenderError, Result};
use crate::gpu::{FramebufferHandle, GpuDevice, ShaderDesc, ShaderHandle};
use crate::graph::attribute::PipelineAttribute;
use crate::graph::collection::RenderVolumeCollection;
use crate::graph::pass::{FrameContext, RenderPass};
use crate::graph::stats::StatisticsRegistry;
use crate::graph::volume::{FramebufferVolume, RenderVolume};
use crate::scene::RenderScene;
use crate::settings::RenderSettings;

/// Shared fullscreen-triangle vertex shader for all post-process stages.
pub const POST_PROCESS_VERTEX_SHADER: &str = "shaders/post_process/post_process.vert";

/// Availability predicate over the per-frame settings.
pub type AvailabilityFn = fn(&RenderSettings) -> bool;
/// Per-frame custom attribute builder.
pub type AttributesFn =
    fn(&Camera, &RenderSettings, &RenderVolumeCollection) -> Vec<PipelineAttribute>;
/// Statistics publication hook for the produced volume.
pub type PublishFn = fn(&mut StatisticsRegistry, &Arc<dyn RenderVolume>);
/// Settings-driven resolution function.
pub type ResolutionFn = fn(&RenderSettings) -> (u32, u32);

/// The resolution of an owned output volume.
#[derive(Debug, Clone, Copy)]
pub enum OutputResolution {
    /// Full output resolution.
    Window,
    /// Fixed size independent of the output (kernels, noise tiles).
    Fixed(u32, u32),
    /// Computed from settings (feature-specific scale factors).
    Custom(ResolutionFn),
}

impl OutputResolution {
    #[must_use]
    pub fn resolve(&self, settings: &RenderSettings) -> (u32, u32) {
        match self {
            Self::Window => (settings.resolution.width, settings.resolution.height),
            Self::Fixed(width, height) => (*width, *height),
            Self::Custom(f) => f(settings),
        }
    }
}

/// Where a post-process stage renders.
pub enum OutputTarget {
    /// The pass owns a framebuffer volume, created at `init`, and publishes
    /// it under `volume` after every execution. Publishing under a name an
    /// earlier stage used replaces the entry; refinement chains (blur,
    /// temporal filter) and ping-pong pairs rely on exactly that.
    Owned {
        volume: &'static str,
        format: wgpu::TextureFormat,
        resolution: OutputResolution,
    },
    /// The pass renders into a volume some earlier pass owns and publishes
    /// nothing (in-place accumulation).
    Existing(&'static str),
}

/// Data-plus-strategy description of one post-process stage.
pub struct PostProcessSpec {
    pub name: &'static str,
    pub fragment_shader_path: &'static str,
    pub target: OutputTarget,
    /// Required input volumes; their attributes are bound automatically.
    /// A missing name is a contract violation.
    pub inputs: &'static [&'static str],
    pub availability: AvailabilityFn,
    pub attributes: AttributesFn,
    pub publish: Option<PublishFn>,
}

fn always_available(_: &RenderSettings) -> bool {
    true
}

fn no_attributes(
    _: &Camera,
    _: &RenderSettings,
    _: &RenderVolumeCollection,
) -> Vec<PipelineAttribute> {
    Vec::new()
}

impl PostProcessSpec {
    /// A stage with no inputs, unconditional availability, no custom
    /// attributes and no statistics hook.
    #[must_use]
    pub fn new(name: &'static str, fragment_shader_path: &'static str, target: OutputTarget) -> Self {
        Self {
            name,
            fragment_shader_path,
            target,
            inputs: &[],
            availability: always_available,
            attributes: no_attributes,
            publish: None,
        }
    }

    #[must_use]
    pub fn with_inputs(mut self, inputs: &'static [&'static str]) -> Self {
        self.inputs = inputs;
        self
    }

    #[must_use]
    pub fn with_availability(mut self, availability: AvailabilityFn) -> Self {
        self.availability = availability;
        self
    }

    #[must_use]
    pub fn with_attributes(mut self, attributes: AttributesFn) -> Self {
        self.attributes = attributes;
        self
    }

    #[must_use]
    pub fn with_publish(mut self, publish: PublishFn) -> Self {
        self.publish = Some(publish);
        self
    }
}

/// The one pass struct behind every post-process stage.
pub struct PostProcessPass {
    spec: PostProcessSpec,
    shader: Option<ShaderHandle>,
    output: Option<Arc<FramebufferVolume>>,
}

impl PostProcessPass {
    #[must_use]
    pub fn new(spec: PostProcessSpec) -> Self {
        Self {
            spec,
            shader: None,
            output: None,
        }
    }
}

impl RenderPass for PostProcessPass {
    fn name(&self) -> &str {
        self.spec.name
    }

    fn init(&mut self, device: &mut dyn GpuDevice, settings: &RenderSettings) -> Result<()> {
        let shader = device
            .load_shader(&ShaderDesc {
                name: self.spec.name,
                vertex_path: POST_PROCESS_VERTEX_SHADER,
                fragment_path: self.spec.fragment_shader_path,
            })
            .map_err(|reason| RenderError::ShaderLoadFailed {
                pass: self.spec.name.to_owned(),
                path: self.spec.fragment_shader_path.to_owned(),
                reason,
            })?;
        self.shader = Some(shader);

        if let OutputTarget::Owned {
            volume,
            format,
            resolution,
        } = &self.spec.target
        {
            let (width, height) = resolution.resolve(settings);
            self.output = Some(Arc::new(FramebufferVolume::create(
                device, *volume, width, height, *format,
            )));
        }
        Ok(())
    }

    fn is_available(
        &self,
        _scene: &RenderScene,
        _camera: &Camera,
        settings: &RenderSettings,
        _volumes: &RenderVolumeCollection,
    ) -> bool {
        (self.spec.availability)(settings)
    }

    fn execute(
        &mut self,
        ctx: &mut FrameContext<'_>,
        volumes: &mut RenderVolumeCollection,
    ) -> Result<()> {
        let shader = self.shader.ok_or_else(|| RenderError::NotInitialized {
            pass: self.spec.name.to_owned(),
        })?;

        // Inputs are resolved before any publication, so a stage that
        // republishes under one of its input names still reads the
        // predecessor's volume.
        let mut attributes = camera_attributes(ctx.camera, ctx.settings);
        for input in self.spec.inputs {
            attributes.extend(volumes.get(input)?.attributes());
        }
        attributes.extend((self.spec.attributes)(ctx.camera, ctx.settings, volumes));

        match &self.spec.target {
            OutputTarget::Owned { volume, .. } => {
                let output = self
                    .output
                    .clone()
                    .ok_or_else(|| RenderError::NotInitialized {
                        pass: self.spec.name.to_owned(),
                    })?;
                draw_fullscreen(ctx.device, shader, output.framebuffer(), &attributes);

                let published: Arc<dyn RenderVolume> = output;
                volumes.insert(*volume, published.clone());
                if let Some(publish) = self.spec.publish {
                    publish(ctx.stats, &published);
                }
            }
            OutputTarget::Existing(name) => {
                let framebuffer = volumes.get_as::<FramebufferVolume>(name)?.framebuffer();
                draw_fullscreen(ctx.device, shader, framebuffer, &attributes);
            }
        }
        Ok(())
    }

    fn clear(&mut self, device: &mut dyn GpuDevice) {
        if let Some(shader) = self.shader.take() {
            device.destroy_shader(shader);
        }
        if let Some(output) = self.output.take() {
            output.destroy(device);
        }
    }
}

/// Binds the target, runs one fullscreen draw under the given shader, and
/// restores bind/lock state.
pub(crate) fn draw_fullscreen(
    device: &mut dyn GpuDevice,
    shader: ShaderHandle,
    framebuffer: FramebufferHandle,
    attributes: &[PipelineAttribute],
) {
    device.bind_framebuffer(framebuffer);
    device.lock_shader(shader);
    for attribute in attributes {
        device.set_attribute(attribute);
    }
    device.draw_fullscreen_quad();
    device.unlock_shader();
    device.unbind_framebuffer();
}

/// The camera/screen attributes every fullscreen stage binds.
pub(crate) fn camera_attributes(
    camera: &Camera,
    settings: &RenderSettings,
) -> Vec<PipelineAttribute> {
    vec![
        PipelineAttribute::mat4("viewMatrix", camera.view()),
        PipelineAttribute::mat4("projectionMatrix", camera.projection()),
        PipelineAttribute::mat4(
            "inverseViewProjectionMatrix",
            camera.view_projection().inverse(),
        ),
        PipelineAttribute::vec3("cameraPosition", camera.position()),
        PipelineAttribute::vec2(
            "screenSize",
            Vec2::new(
                settings.resolution.width as f32,
                settings.resolution.height as f32,
            ),
        ),
    ]
}
