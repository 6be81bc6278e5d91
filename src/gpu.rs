//! GPU Capability Layer
//!
//! The narrow contract the orchestration core consumes from the concrete
//! GPU backend. The core treats this as an opaque capability set: it creates
//! resources, locks shaders, binds targets and issues draws through this
//! trait, and never inspects backend state beyond the returned handles.
//!
//! # Shader-Lock Discipline
//!
//! A pass that calls [`GpuDevice::lock_shader`] must call
//! [`GpuDevice::unlock_shader`] before returning on every path, so the next
//! pass starts from a known state. Failing to unlock is a correctness bug:
//! subsequent draw submissions would run under a stale program.
//!
//! # Debug Groups
//!
//! The module walker brackets every pass execution in a debug group named
//! after the pass, mirroring how command encoders annotate GPU captures.

use crate::graph::attribute::PipelineAttribute;
use crate::scene::{LightKind, RenderScene, SceneLayers};

/// Opaque handle to a GPU texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u64);

/// Opaque handle to a GPU framebuffer (render target set).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FramebufferHandle(pub u64);

/// Opaque handle to a compiled shader program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderHandle(pub u64);

/// Descriptor for requesting a texture.
#[derive(Debug, Clone)]
pub struct TextureDesc {
    pub label: &'static str,
    pub width: u32,
    pub height: u32,
    pub format: wgpu::TextureFormat,
    pub filter: wgpu::FilterMode,
    pub address_mode: wgpu::AddressMode,
    pub mip_level_count: u32,
}

impl TextureDesc {
    /// A single-mip, linearly filtered, edge-clamped 2D target.
    #[must_use]
    pub fn target(label: &'static str, width: u32, height: u32, format: wgpu::TextureFormat) -> Self {
        Self {
            label,
            width,
            height,
            format,
            filter: wgpu::FilterMode::Linear,
            address_mode: wgpu::AddressMode::ClampToEdge,
            mip_level_count: 1,
        }
    }
}

/// Descriptor for loading a shader program.
///
/// Paths are opaque strings resolved by the resource layer; the core never
/// opens them itself.
#[derive(Debug, Clone)]
pub struct ShaderDesc {
    pub name: &'static str,
    pub vertex_path: &'static str,
    pub fragment_path: &'static str,
}

/// The capability set the render core consumes from the GPU backend.
///
/// All calls are submitted in pass-tree traversal order on a single logical
/// thread; submission order is the cross-pass ordering guarantee, so the
/// backend must preserve it.
pub trait GpuDevice {
    // ── Resource creation / teardown ───────────────────────────────────────
    fn create_texture(&mut self, desc: &TextureDesc) -> TextureHandle;

    /// Creates a framebuffer from color attachments and an optional depth
    /// attachment. A depth-only framebuffer (empty `color`) is valid and is
    /// what shadow passes use.
    fn create_framebuffer(
        &mut self,
        label: &'static str,
        color: &[TextureHandle],
        depth: Option<TextureHandle>,
    ) -> FramebufferHandle;

    fn destroy_texture(&mut self, texture: TextureHandle);
    fn destroy_framebuffer(&mut self, framebuffer: FramebufferHandle);

    /// Loads and links a shader program.
    ///
    /// # Errors
    ///
    /// Returns the backend diagnostic when compilation or linking fails; the
    /// owning pass converts it into a fatal initialization error naming the
    /// pass and path.
    fn load_shader(&mut self, desc: &ShaderDesc) -> std::result::Result<ShaderHandle, String>;
    fn destroy_shader(&mut self, shader: ShaderHandle);

    // ── Per-draw state ─────────────────────────────────────────────────────
    fn lock_shader(&mut self, shader: ShaderHandle);
    fn unlock_shader(&mut self);

    fn bind_framebuffer(&mut self, framebuffer: FramebufferHandle);
    fn unbind_framebuffer(&mut self);

    fn clear_target(&mut self, color: wgpu::Color);

    /// Uploads one typed uniform for the locked shader.
    fn set_attribute(&mut self, attribute: &PipelineAttribute);

    // ── Draw submission ────────────────────────────────────────────────────
    fn draw_fullscreen_quad(&mut self);
    fn draw_scene(&mut self, scene: &RenderScene, layers: SceneLayers);
    /// Draws the proxy geometry for a light type (sphere, cone, quad).
    fn draw_light_geometry(&mut self, kind: LightKind);

    // ── Blits / mipmaps ────────────────────────────────────────────────────
    fn blit(&mut self, src: FramebufferHandle, dst: FramebufferHandle);
    fn blit_to_window(&mut self, src: FramebufferHandle);
    fn generate_mipmaps(&mut self, texture: TextureHandle);

    // ── Diagnostics ────────────────────────────────────────────────────────
    fn push_debug_group(&mut self, label: &str);
    fn pop_debug_group(&mut self);
}
