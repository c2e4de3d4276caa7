use nergal_collections::{HashTable, hash_str};

use super::{
    DrawArrays, DrawIndexed, GraphicsBackend, NativeId, UniformLocation, VertexAttributeBinding,
};
use crate::graphics::ShaderCompileError;
use crate::graphics::desc::{
    AccessType, Attachment, BlendState, BufferKind, BufferUpdate, BufferUsage, ClearValues,
    DepthFunc, FaceCulling, PixelRect, ShaderDesc, StencilState, TextureDesc, TextureFormat,
    UniformData, UniformKind, WindingOrder,
};

/// Shader sources containing this marker fail to compile.
pub const COMPILE_ERROR_MARKER: &str = "#error";

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum TraceCall {
    CompileProgram { program: NativeId, name: String },
    DeleteProgram(NativeId),
    CreateTexture { texture: NativeId, desc: TextureDesc, with_data: bool },
    UpdateTexture { texture: NativeId, desc: TextureDesc, len: usize },
    DeleteTexture(NativeId),
    CreateBuffer { buffer: NativeId, kind: BufferKind, usage: BufferUsage, size: usize },
    UpdateBuffer { buffer: NativeId, kind: BufferKind, update: BufferUpdate, data: Vec<u8> },
    DeleteBuffer(NativeId),
    CreateFramebuffer(NativeId),
    DeleteFramebuffer(NativeId),
    BindFramebuffer(Option<NativeId>),
    AttachTexture { attachment: Attachment, texture: NativeId },
    Clear(ClearValues),
    Viewport(PixelRect),
    Scissor(PixelRect),
    ResetState,
    DepthTest(Option<DepthFunc>),
    StencilTest(Option<StencilState>),
    Blend(Option<BlendState>),
    FaceCulling(Option<FaceCulling>),
    Winding(WindingOrder),
    UseProgram(NativeId),
    BindVertexBuffer { slot: u32, buffer: NativeId, offset: usize },
    BindIndexBuffer(NativeId),
    UniformLocationQuery { program: NativeId, name: String },
    UploadUniform { location: UniformLocation, kind: UniformKind, words: Vec<u32> },
    BindTextureUnit { unit: u32, texture: NativeId },
    UniformBlockQuery { program: NativeId, name: String },
    BindUniformBlock { program: NativeId, block: UniformLocation, binding: u32 },
    BindUniformBufferRange { binding: u32, buffer: NativeId, offset: usize, size: usize },
    BindImageTexture { unit: u32, texture: NativeId, access: AccessType, format: TextureFormat },
    VertexAttribute { index: u32, binding: VertexAttributeBinding },
    DrawArrays(DrawArrays),
    DrawIndexed(DrawIndexed),
    DispatchCompute([u32; 3]),
}

/// Headless backend that records every call in order.
///
/// Native ids are handed out sequentially from 1. Uniform and block names
/// resolve to stable locations unless registered as missing.
#[derive(Debug, Default)]
pub struct TraceBackend {
    calls: Vec<TraceCall>,
    next_id: u32,
    locations: HashTable<u64, u32>,
    missing: HashTable<u64, ()>,
}

impl TraceBackend {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes lookups of `name` report no location.
    pub fn with_missing_uniform(mut self, name: &str) -> Self {
        self.missing.insert(hash_str(name), ());
        self
    }

    #[inline]
    pub fn calls(&self) -> &[TraceCall] {
        &self.calls
    }

    /// Returns recorded calls and starts a fresh trace.
    pub fn take_calls(&mut self) -> Vec<TraceCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Number of recorded calls matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&TraceCall) -> bool) -> usize {
        self.calls.iter().filter(|call| predicate(call)).count()
    }

    fn allocate(&mut self) -> NativeId {
        self.next_id += 1;
        NativeId(self.next_id)
    }

    fn resolve(&mut self, name: &str) -> Option<UniformLocation> {
        let key = hash_str(name);
        if self.missing.contains_key(&key) {
            return None;
        }

        let next = self.locations.len() as u32;
        let location = match self.locations.get(&key) {
            Some(&location) => location,
            None => {
                self.locations.insert(key, next);
                next
            }
        };
        Some(UniformLocation(location))
    }
}

impl GraphicsBackend for TraceBackend {
    fn compile_program(&mut self, desc: &ShaderDesc) -> Result<NativeId, ShaderCompileError> {
        if let Some(failing) = desc.sources.iter().find(|s| s.source.contains(COMPILE_ERROR_MARKER)) {
            return Err(ShaderCompileError::Compile {
                stage: failing.stage,
                log: format!("0:1: error: {COMPILE_ERROR_MARKER} directive encountered"),
            });
        }

        let program = self.allocate();
        self.calls.push(TraceCall::CompileProgram {
            program,
            name: desc.name.clone(),
        });
        Ok(program)
    }

    fn delete_program(&mut self, program: NativeId) {
        self.calls.push(TraceCall::DeleteProgram(program));
    }

    fn create_texture(&mut self, desc: &TextureDesc, data: Option<&[u8]>) -> NativeId {
        let texture = self.allocate();
        self.calls.push(TraceCall::CreateTexture {
            texture,
            desc: *desc,
            with_data: data.is_some(),
        });
        texture
    }

    fn update_texture(&mut self, texture: NativeId, desc: &TextureDesc, data: &[u8]) {
        self.calls.push(TraceCall::UpdateTexture {
            texture,
            desc: *desc,
            len: data.len(),
        });
    }

    fn delete_texture(&mut self, texture: NativeId) {
        self.calls.push(TraceCall::DeleteTexture(texture));
    }

    fn create_buffer(&mut self, kind: BufferKind, usage: BufferUsage, size: usize, _data: Option<&[u8]>) -> NativeId {
        let buffer = self.allocate();
        self.calls.push(TraceCall::CreateBuffer { buffer, kind, usage, size });
        buffer
    }

    fn update_buffer(&mut self, buffer: NativeId, kind: BufferKind, _usage: BufferUsage, update: BufferUpdate, data: &[u8]) {
        self.calls.push(TraceCall::UpdateBuffer {
            buffer,
            kind,
            update,
            data: data.to_vec(),
        });
    }

    fn delete_buffer(&mut self, buffer: NativeId) {
        self.calls.push(TraceCall::DeleteBuffer(buffer));
    }

    fn create_framebuffer(&mut self) -> NativeId {
        let framebuffer = self.allocate();
        self.calls.push(TraceCall::CreateFramebuffer(framebuffer));
        framebuffer
    }

    fn delete_framebuffer(&mut self, framebuffer: NativeId) {
        self.calls.push(TraceCall::DeleteFramebuffer(framebuffer));
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<NativeId>) {
        self.calls.push(TraceCall::BindFramebuffer(framebuffer));
    }

    fn attach_texture(&mut self, attachment: Attachment, texture: NativeId) {
        self.calls.push(TraceCall::AttachTexture { attachment, texture });
    }

    fn clear(&mut self, values: ClearValues) {
        self.calls.push(TraceCall::Clear(values));
    }

    fn set_viewport(&mut self, rect: PixelRect) {
        self.calls.push(TraceCall::Viewport(rect));
    }

    fn set_scissor(&mut self, rect: PixelRect) {
        self.calls.push(TraceCall::Scissor(rect));
    }

    fn reset_state(&mut self) {
        self.calls.push(TraceCall::ResetState);
    }

    fn set_depth_test(&mut self, func: Option<DepthFunc>) {
        self.calls.push(TraceCall::DepthTest(func));
    }

    fn set_stencil_test(&mut self, state: Option<&StencilState>) {
        self.calls.push(TraceCall::StencilTest(state.copied()));
    }

    fn set_blend(&mut self, state: Option<&BlendState>) {
        self.calls.push(TraceCall::Blend(state.copied()));
    }

    fn set_face_culling(&mut self, culling: Option<FaceCulling>) {
        self.calls.push(TraceCall::FaceCulling(culling));
    }

    fn set_winding_order(&mut self, winding: WindingOrder) {
        self.calls.push(TraceCall::Winding(winding));
    }

    fn use_program(&mut self, program: NativeId) {
        self.calls.push(TraceCall::UseProgram(program));
    }

    fn bind_vertex_buffer(&mut self, slot: u32, buffer: NativeId, offset: usize) {
        self.calls.push(TraceCall::BindVertexBuffer { slot, buffer, offset });
    }

    fn bind_index_buffer(&mut self, buffer: NativeId) {
        self.calls.push(TraceCall::BindIndexBuffer(buffer));
    }

    fn uniform_location(&mut self, program: NativeId, name: &str) -> Option<UniformLocation> {
        self.calls.push(TraceCall::UniformLocationQuery {
            program,
            name: name.to_owned(),
        });
        self.resolve(name)
    }

    fn upload_uniform(&mut self, location: UniformLocation, data: UniformData<'_>) {
        self.calls.push(TraceCall::UploadUniform {
            location,
            kind: data.kind(),
            words: data.words().to_vec(),
        });
    }

    fn bind_texture_unit(&mut self, unit: u32, texture: NativeId) {
        self.calls.push(TraceCall::BindTextureUnit { unit, texture });
    }

    fn uniform_block_index(&mut self, program: NativeId, name: &str) -> Option<UniformLocation> {
        self.calls.push(TraceCall::UniformBlockQuery {
            program,
            name: name.to_owned(),
        });
        self.resolve(name)
    }

    fn bind_uniform_block(&mut self, program: NativeId, block: UniformLocation, binding: u32) {
        self.calls.push(TraceCall::BindUniformBlock { program, block, binding });
    }

    fn bind_uniform_buffer_range(&mut self, binding: u32, buffer: NativeId, offset: usize, size: usize) {
        self.calls.push(TraceCall::BindUniformBufferRange {
            binding,
            buffer,
            offset,
            size,
        });
    }

    fn bind_image_texture(&mut self, unit: u32, texture: NativeId, access: AccessType, format: TextureFormat) {
        self.calls.push(TraceCall::BindImageTexture {
            unit,
            texture,
            access,
            format,
        });
    }

    fn vertex_attribute(&mut self, index: u32, binding: VertexAttributeBinding) {
        self.calls.push(TraceCall::VertexAttribute { index, binding });
    }

    fn draw_arrays(&mut self, draw: DrawArrays) {
        self.calls.push(TraceCall::DrawArrays(draw));
    }

    fn draw_indexed(&mut self, draw: DrawIndexed) {
        self.calls.push(TraceCall::DrawIndexed(draw));
    }

    fn dispatch_compute(&mut self, groups: [u32; 3]) {
        self.calls.push(TraceCall::DispatchCompute(groups));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::ShaderStage;

    #[test]
    fn native_ids_are_sequential() {
        let mut backend = TraceBackend::new();
        let a = backend.create_framebuffer();
        let b = backend.create_buffer(BufferKind::Vertex, BufferUsage::Static, 4, None);
        assert_eq!((a, b), (NativeId(1), NativeId(2)));
        assert_eq!(backend.calls().len(), 2);
    }

    #[test]
    fn marker_fails_compilation() {
        let mut backend = TraceBackend::new();
        let desc = ShaderDesc::new("broken")
            .with_stage(ShaderStage::Vertex, "void main() {}")
            .with_stage(ShaderStage::Fragment, "#error nope");

        let err = backend.compile_program(&desc).unwrap_err();
        assert!(matches!(err, ShaderCompileError::Compile { stage: ShaderStage::Fragment, .. }));
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn locations_are_stable_per_name() {
        let mut backend = TraceBackend::new().with_missing_uniform("u_gone");
        let program = NativeId(1);

        let first = backend.uniform_location(program, "u_mvp");
        let other = backend.uniform_location(program, "u_tint");
        assert_eq!(backend.uniform_location(program, "u_mvp"), first);
        assert_ne!(first, other);
        assert_eq!(backend.uniform_location(program, "u_gone"), None);
        assert_eq!(backend.take_calls().len(), 4);
        assert!(backend.calls().is_empty());
    }
}
