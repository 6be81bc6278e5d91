#![allow(dead_code)]

//! Shared test support: a recording GPU device.
//!
//! The device hands out sequential handles, appends every call to an event
//! log, and can be told to fail specific shader loads by name. Assertions
//! read the log instead of GPU state, so the whole pass tree runs headless.

use ember_render::gpu::{
    FramebufferHandle, GpuDevice, ShaderDesc, ShaderHandle, TextureDesc, TextureHandle,
};
use ember_render::{LightKind, PipelineAttribute, RenderScene, SceneLayers};

#[derive(Debug, Clone, PartialEq)]
pub enum GpuEvent {
    CreateTexture(&'static str),
    CreateFramebuffer(&'static str),
    DestroyTexture(u64),
    DestroyFramebuffer(u64),
    LoadShader(&'static str),
    DestroyShader(u64),
    LockShader(u64),
    UnlockShader,
    BindFramebuffer(u64),
    UnbindFramebuffer,
    ClearTarget,
    SetAttribute(String),
    DrawFullscreenQuad,
    DrawScene(SceneLayers),
    DrawLightGeometry(LightKind),
    Blit { src: u64, dst: u64 },
    BlitToWindow(u64),
    GenerateMipmaps(u64),
    PushDebugGroup(String),
    PopDebugGroup,
}

#[derive(Default)]
pub struct RecordingDevice {
    next_handle: u64,
    pub events: Vec<GpuEvent>,
    /// Shader names whose load is reported as a compile failure.
    pub fail_shaders: Vec<&'static str>,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(fail_shaders: Vec<&'static str>) -> Self {
        Self {
            fail_shaders,
            ..Self::default()
        }
    }

    fn handle(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    /// Pass names in execution order, from the debug-group bracketing.
    pub fn executed_passes(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|event| match event {
                GpuEvent::PushDebugGroup(name) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn executions_of(&self, pass: &str) -> usize {
        self.executed_passes()
            .iter()
            .filter(|name| **name == pass)
            .count()
    }

    /// Checks that every lock, bind and debug group was closed, in order.
    pub fn assert_balanced(&self) {
        let mut locks = 0i64;
        let mut binds = 0i64;
        let mut groups = 0i64;
        for event in &self.events {
            match event {
                GpuEvent::LockShader(_) => locks += 1,
                GpuEvent::UnlockShader => locks -= 1,
                GpuEvent::BindFramebuffer(_) => binds += 1,
                GpuEvent::UnbindFramebuffer => binds -= 1,
                GpuEvent::PushDebugGroup(_) => groups += 1,
                GpuEvent::PopDebugGroup => groups -= 1,
                _ => {}
            }
            assert!(locks >= 0, "unlock without a lock");
            assert!(binds >= 0, "unbind without a bind");
            assert!(groups >= 0, "pop without a push");
        }
        assert_eq!(locks, 0, "shader left locked");
        assert_eq!(binds, 0, "framebuffer left bound");
        assert_eq!(groups, 0, "debug group left open");
    }
}

impl GpuDevice for RecordingDevice {
    fn create_texture(&mut self, desc: &TextureDesc) -> TextureHandle {
        self.events.push(GpuEvent::CreateTexture(desc.label));
        TextureHandle(self.handle())
    }

    fn create_framebuffer(
        &mut self,
        label: &'static str,
        _color: &[TextureHandle],
        _depth: Option<TextureHandle>,
    ) -> FramebufferHandle {
        self.events.push(GpuEvent::CreateFramebuffer(label));
        FramebufferHandle(self.handle())
    }

    fn destroy_texture(&mut self, texture: TextureHandle) {
        self.events.push(GpuEvent::DestroyTexture(texture.0));
    }

    fn destroy_framebuffer(&mut self, framebuffer: FramebufferHandle) {
        self.events.push(GpuEvent::DestroyFramebuffer(framebuffer.0));
    }

    fn load_shader(&mut self, desc: &ShaderDesc) -> Result<ShaderHandle, String> {
        if self.fail_shaders.contains(&desc.name) {
            return Err(format!("compile error in '{}'", desc.name));
        }
        self.events.push(GpuEvent::LoadShader(desc.name));
        Ok(ShaderHandle(self.handle()))
    }

    fn destroy_shader(&mut self, shader: ShaderHandle) {
        self.events.push(GpuEvent::DestroyShader(shader.0));
    }

    fn lock_shader(&mut self, shader: ShaderHandle) {
        self.events.push(GpuEvent::LockShader(shader.0));
    }

    fn unlock_shader(&mut self) {
        self.events.push(GpuEvent::UnlockShader);
    }

    fn bind_framebuffer(&mut self, framebuffer: FramebufferHandle) {
        self.events.push(GpuEvent::BindFramebuffer(framebuffer.0));
    }

    fn unbind_framebuffer(&mut self) {
        self.events.push(GpuEvent::UnbindFramebuffer);
    }

    fn clear_target(&mut self, _color: wgpu::Color) {
        self.events.push(GpuEvent::ClearTarget);
    }

    fn set_attribute(&mut self, attribute: &PipelineAttribute) {
        self.events
            .push(GpuEvent::SetAttribute(attribute.name.clone().into_owned()));
    }

    fn draw_fullscreen_quad(&mut self) {
        self.events.push(GpuEvent::DrawFullscreenQuad);
    }

    fn draw_scene(&mut self, _scene: &RenderScene, layers: SceneLayers) {
        self.events.push(GpuEvent::DrawScene(layers));
    }

    fn draw_light_geometry(&mut self, kind: LightKind) {
        self.events.push(GpuEvent::DrawLightGeometry(kind));
    }

    fn blit(&mut self, src: FramebufferHandle, dst: FramebufferHandle) {
        self.events.push(GpuEvent::Blit {
            src: src.0,
            dst: dst.0,
        });
    }

    fn blit_to_window(&mut self, src: FramebufferHandle) {
        self.events.push(GpuEvent::BlitToWindow(src.0));
    }

    fn generate_mipmaps(&mut self, texture: TextureHandle) {
        self.events.push(GpuEvent::GenerateMipmaps(texture.0));
    }

    fn push_debug_group(&mut self, label: &str) {
        self.events.push(GpuEvent::PushDebugGroup(label.to_owned()));
    }

    fn pop_debug_group(&mut self) {
        self.events.push(GpuEvent::PopDebugGroup);
    }
}
