//! Nergal collections.
//!
//! Growth-array containers shared by the engine:
//! - `ByteBuffer`: cursor-based byte stream, the wire format for recorded commands
//! - `HashTable`: open-addressing map over plain-old-data keys
//! - `SlotTable`: stable integer handles over dense, relocatable storage
//! - `SlotMap`: keyed access to a `SlotTable` through a `HashTable`

mod byte_buffer;
mod hash_table;
mod slot_map;
mod slot_table;

pub use byte_buffer::{ByteBuffer, ByteBufferError, DEFAULT_CAPACITY};
pub use hash_table::{HASH_SEED, HashTable, hash_bytes, hash_str};
pub use slot_map::SlotMap;
pub use slot_table::{INVALID_SLOT, SlotTable};
