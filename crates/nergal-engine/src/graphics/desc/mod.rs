//! Resource descriptors and the cross-platform enums they are built from.
//!
//! Every enum uses its first variant (or `None`) as the default, matching a
//! zero-initialized descriptor.

mod bind;
mod buffer;
mod draw;
mod pass;
mod pipeline;
mod shader;
mod texture;
mod uniform;

pub use bind::{
    AccessType, BindDesc, BindKind, ImageBufferBinding, UniformBinding, UniformBufferBinding,
    VertexBufferBinding, VertexDataType,
};
pub use buffer::{
    BufferKind, BufferTarget, BufferUpdate, BufferUpdateDesc, BufferUpdateKind, BufferUsage,
    IndexBufferDesc, UniformBufferDesc, VertexBufferDesc,
};
pub use draw::DrawDesc;
pub use pass::{Attachment, ClearAction, ClearFlags, ClearValues, PixelRect, RenderPassDesc};
pub use pipeline::{
    BlendEquation, BlendMode, BlendState, ComputeState, DepthFunc, FaceCulling, IndexType,
    PipelineDesc, PrimitiveType, RasterState, StencilFunc, StencilOp, StencilState,
    VertexAttributeDesc, VertexAttributeFormat, WindingOrder,
};
pub use shader::{ShaderDesc, ShaderSource, ShaderStage};
pub use texture::{TextureDesc, TextureFilter, TextureFormat, TextureWrap};
pub use uniform::{UniformData, UniformDesc, UniformKind, UniformLayoutDesc};
