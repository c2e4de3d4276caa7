use crate::graphics::backend::{NativeId, UniformLocation};
use crate::graphics::desc::{UniformKind, VertexDataType};
use crate::graphics::handle::{Handle, IndexBuffer, Pipeline};

/// A vertex buffer bound by the last bindings command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexBufferDecl {
    pub buffer: NativeId,
    pub offset: usize,
    pub data_type: VertexDataType,
}

/// Pipeline state as seen by draws and dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineBinding {
    /// Nothing bound since the last cache reset.
    #[default]
    Unbound,
    /// The last bind named a pipeline that does not exist. Carries the raw id.
    Stale(u32),
    Bound(Handle<Pipeline>),
}

/// State carried between commands of one render pass.
#[derive(Debug, Clone, Default)]
pub struct InterpreterCache {
    pub vertex_buffers: Vec<VertexBufferDecl>,
    pub index_buffer: Option<Handle<IndexBuffer>>,
    pub index_element_size: u32,
    pub pipeline: PipelineBinding,
}

impl InterpreterCache {
    /// Forgets every binding. Keeps the vertex buffer allocation.
    pub fn reset(&mut self) {
        self.vertex_buffers.clear();
        self.index_buffer = None;
        self.index_element_size = 0;
        self.pipeline = PipelineBinding::Unbound;
    }

    #[inline]
    pub fn bound_pipeline(&self) -> Option<Handle<Pipeline>> {
        match self.pipeline {
            PipelineBinding::Bound(handle) => Some(handle),
            _ => None,
        }
    }
}

/// One uniform field resolved against the bound shader.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ResolvedField {
    pub kind: UniformKind,
    pub count: u32,
    /// Byte offset into the bind payload.
    pub offset: usize,
    pub location: Option<UniformLocation>,
}

impl ResolvedField {
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.kind.size() * self.count as usize
    }
}

/// Aligned staging for uniform payloads read out of the byte stream.
#[derive(Debug, Default)]
pub(crate) struct UniformScratch {
    pub floats: Vec<f32>,
    pub ints: Vec<i32>,
    pub fields: Vec<ResolvedField>,
}

/// Copies `bytes` into `out` as a run of `T`. Trailing partial elements are dropped.
pub(crate) fn decode_into<T: bytemuck::Pod>(out: &mut Vec<T>, bytes: &[u8]) {
    let count = bytes.len() / size_of::<T>();
    out.clear();
    out.resize(count, T::zeroed());
    bytemuck::cast_slice_mut::<T, u8>(out.as_mut_slice()).copy_from_slice(&bytes[..count * size_of::<T>()]);
}
