//! Nergal engine crate.
//!
//! This crate owns the resource store and the deferred command pipeline that a
//! native graphics backend is driven through.

pub mod graphics;
pub mod logging;
