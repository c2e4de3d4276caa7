//! Graphics resources and deferred command execution.
//!
//! Responsibilities:
//! - create and destroy resources immediately through a [`GraphicsContext`]
//! - record draw work into a [`CommandBuffer`] from anywhere in a frame
//! - execute recorded work in order on [`GraphicsContext::submit`]
//!
//! Resources are addressed by typed [`Handle`]s into a [`ResourceRegistry`].
//! Native calls go through the [`backend::GraphicsBackend`] trait.

mod wire;

pub mod backend;
mod command;
mod config;
mod context;
mod desc;
mod error;
mod handle;
mod interpreter;
mod registry;
mod resources;

pub use command::{CommandBuffer, Opcode};
pub use config::GraphicsConfig;
pub use context::GraphicsContext;
pub use desc::*;
pub use error::{GraphicsError, ShaderCompileError};
pub use handle::{
    Framebuffer, Handle, IndexBuffer, Pipeline, RenderPass, Shader, Texture, Uniform,
    UniformBuffer, VertexBuffer,
};
pub use interpreter::{InterpreterCache, PipelineBinding, SubmitStats, VertexBufferDecl};
pub use registry::{
    BufferRecord, FramebufferRecord, IndexBufferRecord, LocationCache, PipelineRecord,
    RenderPassRecord, Resource, ResourceKind, ResourceRegistry, ShaderRecord, TextureRecord,
    UniformBufferRecord, UniformField, UniformRecord,
};
