//! Native graphics backend seam.
//!
//! Responsibilities:
//! - define the calls the interpreter and resource creation make into a native API
//! - keep native object names opaque (`NativeId`, `UniformLocation`)
//!
//! `trace` provides a headless backend that records every call.

mod trace;

pub use trace::{COMPILE_ERROR_MARKER, TraceBackend, TraceCall};

use super::desc::{
    AccessType, Attachment, BlendState, BufferKind, BufferUpdate, BufferUsage, ClearValues,
    DepthFunc, FaceCulling, IndexType, PixelRect, PrimitiveType, ShaderDesc, StencilState,
    TextureDesc, TextureFormat, UniformData, VertexAttributeFormat, WindingOrder,
};
use super::ShaderCompileError;

/// Name of a native object (program, buffer, texture, framebuffer).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct NativeId(pub u32);

/// Native location of a uniform or uniform block within a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub u32);

/// Vertex attribute setup computed from a pipeline layout and the bound buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttributeBinding {
    pub buffer: NativeId,
    pub format: VertexAttributeFormat,
    pub stride: usize,
    pub offset: usize,
    pub divisor: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawArrays {
    pub primitive: PrimitiveType,
    pub first: u32,
    pub count: u32,
    pub instances: u32,
    pub instanced: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawIndexed {
    pub primitive: PrimitiveType,
    pub index_type: IndexType,
    /// First index, in elements.
    pub first: u32,
    pub count: u32,
    pub instances: u32,
    pub instanced: bool,
    pub base_vertex: i32,
    /// Inclusive index value range hint; `(0, 0)` when unknown.
    pub range: (u32, u32),
}

/// Calls into a native graphics API.
///
/// All methods are infallible except program compilation: the interpreter
/// validates handles and state before calling, and a native backend reports
/// driver-level problems through its own logging.
pub trait GraphicsBackend {
    // ── resources ────────────────────────────────────────────────────────────

    fn compile_program(&mut self, desc: &ShaderDesc) -> Result<NativeId, ShaderCompileError>;
    fn delete_program(&mut self, program: NativeId);

    fn create_texture(&mut self, desc: &TextureDesc, data: Option<&[u8]>) -> NativeId;
    fn update_texture(&mut self, texture: NativeId, desc: &TextureDesc, data: &[u8]);
    fn delete_texture(&mut self, texture: NativeId);

    fn create_buffer(&mut self, kind: BufferKind, usage: BufferUsage, size: usize, data: Option<&[u8]>) -> NativeId;
    fn update_buffer(&mut self, buffer: NativeId, kind: BufferKind, usage: BufferUsage, update: BufferUpdate, data: &[u8]);
    fn delete_buffer(&mut self, buffer: NativeId);

    fn create_framebuffer(&mut self) -> NativeId;
    fn delete_framebuffer(&mut self, framebuffer: NativeId);

    // ── passes ───────────────────────────────────────────────────────────────

    /// `None` selects the default target.
    fn bind_framebuffer(&mut self, framebuffer: Option<NativeId>);
    fn attach_texture(&mut self, attachment: Attachment, texture: NativeId);
    fn clear(&mut self, values: ClearValues);
    fn set_viewport(&mut self, rect: PixelRect);
    /// Also enables the scissor test until the next state reset.
    fn set_scissor(&mut self, rect: PixelRect);
    /// Unbinds buffers and textures and disables scissor, depth, stencil and blending.
    fn reset_state(&mut self);

    // ── pipeline state ───────────────────────────────────────────────────────

    fn set_depth_test(&mut self, func: Option<DepthFunc>);
    fn set_stencil_test(&mut self, state: Option<&StencilState>);
    fn set_blend(&mut self, state: Option<&BlendState>);
    fn set_face_culling(&mut self, culling: Option<FaceCulling>);
    fn set_winding_order(&mut self, winding: WindingOrder);
    fn use_program(&mut self, program: NativeId);

    // ── bindings ─────────────────────────────────────────────────────────────

    fn bind_vertex_buffer(&mut self, slot: u32, buffer: NativeId, offset: usize);
    fn bind_index_buffer(&mut self, buffer: NativeId);

    fn uniform_location(&mut self, program: NativeId, name: &str) -> Option<UniformLocation>;
    fn upload_uniform(&mut self, location: UniformLocation, data: UniformData<'_>);
    fn bind_texture_unit(&mut self, unit: u32, texture: NativeId);

    fn uniform_block_index(&mut self, program: NativeId, name: &str) -> Option<UniformLocation>;
    fn bind_uniform_block(&mut self, program: NativeId, block: UniformLocation, binding: u32);
    fn bind_uniform_buffer_range(&mut self, binding: u32, buffer: NativeId, offset: usize, size: usize);

    fn bind_image_texture(&mut self, unit: u32, texture: NativeId, access: AccessType, format: TextureFormat);

    // ── work ─────────────────────────────────────────────────────────────────

    fn vertex_attribute(&mut self, index: u32, binding: VertexAttributeBinding);
    fn draw_arrays(&mut self, draw: DrawArrays);
    fn draw_indexed(&mut self, draw: DrawIndexed);
    fn dispatch_compute(&mut self, groups: [u32; 3]);
}
