use crate::graphics::handle::{Handle, IndexBuffer, Texture, Uniform, UniformBuffer, VertexBuffer};
use crate::graphics::wire::wire_enum;

wire_enum! {
    /// Tag of one entry in a bindings command.
    pub enum BindKind {
        VertexBuffer = 0,
        IndexBuffer = 1,
        UniformBuffer = 2,
        Uniform = 3,
        ImageBuffer = 4,
    }
}

wire_enum! {
    #[derive(Default)]
    pub enum VertexDataType {
        /// Attributes of one vertex are adjacent.
        #[default]
        Interleaved = 0,
        /// Each attribute lives in its own contiguous block starting at the binding offset.
        NonInterleaved = 1,
    }
}

wire_enum! {
    #[derive(Default)]
    pub enum AccessType {
        Read = 0,
        Write = 1,
        #[default]
        ReadWrite = 2,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VertexBufferBinding {
    pub buffer: Handle<VertexBuffer>,
    pub offset: usize,
    pub data_type: VertexDataType,
}

impl VertexBufferBinding {
    pub fn new(buffer: Handle<VertexBuffer>) -> Self {
        Self {
            buffer,
            ..Self::default()
        }
    }
}

/// `range` is `(offset, size)` in bytes; `None` binds the whole buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UniformBufferBinding {
    pub buffer: Handle<UniformBuffer>,
    pub binding: u32,
    pub range: Option<(usize, usize)>,
}

/// `data` must match the uniform's layout byte for byte.
///
/// `binding` is the first texture unit (samplers) or image unit (images) the
/// uniform's texture fields occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UniformBinding<'a> {
    pub uniform: Handle<Uniform>,
    pub binding: u32,
    pub data: &'a [u8],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImageBufferBinding {
    pub texture: Handle<Texture>,
    pub binding: u32,
    pub access: AccessType,
}

/// Everything one bindings command attaches.
///
/// Binding any vertex buffer replaces the previously bound vertex buffers.
#[derive(Debug, Clone, Copy, Default)]
pub struct BindDesc<'a> {
    pub vertex_buffers: &'a [VertexBufferBinding],
    pub index_buffer: Option<Handle<IndexBuffer>>,
    pub uniform_buffers: &'a [UniformBufferBinding],
    pub uniforms: &'a [UniformBinding<'a>],
    pub image_buffers: &'a [ImageBufferBinding],
}

impl BindDesc<'_> {
    /// Number of entries the command carries.
    pub fn len(&self) -> usize {
        self.vertex_buffers.len()
            + usize::from(self.index_buffer.is_some())
            + self.uniform_buffers.len()
            + self.uniforms.len()
            + self.image_buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
