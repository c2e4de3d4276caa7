//! Deferred command recording.
//!
//! Responsibilities:
//! - encode graphics operations as `(opcode, payload)` units in a byte stream
//! - preserve recording order for the interpreter

mod buffer;
mod opcode;

pub use buffer::CommandBuffer;
pub use opcode::Opcode;
