use nergal_collections::ByteBufferError;

use super::ShaderStage;
use super::registry::ResourceKind;

/// Errors raised by resource creation, immediate updates and command submission.
#[derive(Debug, thiserror::Error)]
pub enum GraphicsError {
    /// A shader stage was rejected by the native compiler.
    #[error("shader `{name}` failed to compile ({stage:?} stage)\n{log}\n--- source ---\n{shader_source}")]
    ShaderCompile {
        name: String,
        stage: ShaderStage,
        log: String,
        shader_source: String,
    },

    #[error("shader `{name}` failed to link\n{log}")]
    ShaderLink { name: String, log: String },

    #[error("invalid descriptor: {0}")]
    InvalidDescriptor(String),

    /// A precondition of the command protocol was violated.
    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("{kind:?} handle {id} does not refer to a live resource")]
    StaleHandle { kind: ResourceKind, id: u32 },

    #[error("corrupt command stream: {0}")]
    CorruptStream(#[from] ByteBufferError),

    #[error("unknown opcode {opcode} at command {index}")]
    UnknownOpcode { index: u32, opcode: u32 },

    #[error("invalid {what} value {value} in command stream")]
    InvalidEnum { what: &'static str, value: u32 },
}

/// Failure reported by a backend while building a shader program.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShaderCompileError {
    #[error("{stage:?} stage failed to compile: {log}")]
    Compile { stage: ShaderStage, log: String },

    #[error("program failed to link: {log}")]
    Link { log: String },
}
