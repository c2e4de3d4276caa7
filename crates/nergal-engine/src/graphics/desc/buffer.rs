use crate::graphics::handle::{Handle, IndexBuffer, UniformBuffer, VertexBuffer};
use crate::graphics::wire::wire_enum;

wire_enum! {
    #[derive(Default)]
    pub enum BufferUsage {
        #[default]
        Static = 0,
        Stream = 1,
        Dynamic = 2,
    }
}

wire_enum! {
    pub enum BufferKind {
        Vertex = 0,
        Index = 1,
        Uniform = 2,
    }
}

wire_enum! {
    #[derive(Default)]
    pub enum BufferUpdateKind {
        #[default]
        Recreate = 0,
        SubData = 1,
    }
}

/// How new contents replace a buffer's storage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BufferUpdate {
    /// Reallocate storage sized to the new data.
    #[default]
    Recreate,
    /// Overwrite a byte range starting at `offset`.
    SubData { offset: usize },
}

impl BufferUpdate {
    pub const fn kind(self) -> BufferUpdateKind {
        match self {
            Self::Recreate => BufferUpdateKind::Recreate,
            Self::SubData { .. } => BufferUpdateKind::SubData,
        }
    }

    pub const fn offset(self) -> usize {
        match self {
            Self::Recreate => 0,
            Self::SubData { offset } => offset,
        }
    }

    pub(crate) const fn from_parts(kind: BufferUpdateKind, offset: usize) -> Self {
        match kind {
            BufferUpdateKind::Recreate => Self::Recreate,
            BufferUpdateKind::SubData => Self::SubData { offset },
        }
    }

    /// Storage size after applying `len` bytes to a buffer of `current` bytes.
    pub const fn resulting_size(self, current: usize, len: usize) -> usize {
        match self {
            Self::Recreate => len,
            Self::SubData { offset } => {
                let end = offset.saturating_add(len);
                if end > current { end } else { current }
            }
        }
    }
}

/// `data` may be `None` for stream/dynamic buffers that are filled later;
/// `size` then reserves storage.
#[derive(Debug, Clone, Copy, Default)]
pub struct VertexBufferDesc<'a> {
    pub data: Option<&'a [u8]>,
    pub size: usize,
    pub usage: BufferUsage,
}

impl<'a> VertexBufferDesc<'a> {
    pub fn with_data(data: &'a [u8]) -> Self {
        Self {
            data: Some(data),
            size: data.len(),
            usage: BufferUsage::Static,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct IndexBufferDesc<'a> {
    pub data: Option<&'a [u8]>,
    pub size: usize,
    pub usage: BufferUsage,
    /// Bytes per index: 1, 2 or 4.
    pub element_size: u32,
}

impl Default for IndexBufferDesc<'_> {
    fn default() -> Self {
        Self {
            data: None,
            size: 0,
            usage: BufferUsage::Static,
            element_size: 4,
        }
    }
}

impl<'a> IndexBufferDesc<'a> {
    pub fn with_data(data: &'a [u8], element_size: u32) -> Self {
        Self {
            data: Some(data),
            size: data.len(),
            element_size,
            ..Self::default()
        }
    }
}

/// `name` is the uniform block name the buffer is bound to in shaders.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformBufferDesc<'a> {
    pub name: &'a str,
    pub data: Option<&'a [u8]>,
    pub size: usize,
    pub usage: BufferUsage,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BufferUpdateDesc<'a> {
    pub data: &'a [u8],
    pub usage: BufferUsage,
    pub update: BufferUpdate,
}

/// Buffer addressed by a deferred update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferTarget {
    Vertex(Handle<VertexBuffer>),
    Index(Handle<IndexBuffer>),
    Uniform(Handle<UniformBuffer>),
}

impl BufferTarget {
    pub const fn kind(self) -> BufferKind {
        match self {
            Self::Vertex(_) => BufferKind::Vertex,
            Self::Index(_) => BufferKind::Index,
            Self::Uniform(_) => BufferKind::Uniform,
        }
    }

    pub const fn id(self) -> u32 {
        match self {
            Self::Vertex(h) => h.id(),
            Self::Index(h) => h.id(),
            Self::Uniform(h) => h.id(),
        }
    }
}
