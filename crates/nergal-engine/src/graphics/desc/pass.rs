use bitflags::bitflags;
use nergal_collections::ByteBuffer;

use crate::graphics::GraphicsError;
use crate::graphics::handle::{Framebuffer, Handle, Texture};

bitflags! {
    /// Targets a clear action touches. An empty set clears everything.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ClearFlags: u32 {
        const COLOR = 0x01;
        const DEPTH = 0x02;
        const STENCIL = 0x04;
        /// Suppresses the action entirely.
        const NONE = 0x08;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearAction {
    pub flags: ClearFlags,
    pub color: [f32; 4],
    pub depth: f32,
    pub stencil: u32,
}

impl Default for ClearAction {
    fn default() -> Self {
        Self {
            flags: ClearFlags::empty(),
            color: [0.0, 0.0, 0.0, 1.0],
            depth: 1.0,
            stencil: 0,
        }
    }
}

impl ClearAction {
    pub fn color(color: [f32; 4]) -> Self {
        Self {
            flags: ClearFlags::COLOR,
            color,
            ..Self::default()
        }
    }

    pub fn depth(depth: f32) -> Self {
        Self {
            flags: ClearFlags::DEPTH,
            depth,
            ..Self::default()
        }
    }

    pub fn stencil(stencil: u32) -> Self {
        Self {
            flags: ClearFlags::STENCIL,
            stencil,
            ..Self::default()
        }
    }

    /// Values the backend should clear to, or `None` when the action is suppressed.
    pub fn values(&self) -> Option<ClearValues> {
        if self.flags.contains(ClearFlags::NONE) {
            return None;
        }

        let all = self.flags.is_empty();
        Some(ClearValues {
            color: (all || self.flags.contains(ClearFlags::COLOR)).then_some(self.color),
            depth: (all || self.flags.contains(ClearFlags::DEPTH)).then_some(self.depth),
            stencil: (all || self.flags.contains(ClearFlags::STENCIL)).then_some(self.stencil),
        })
    }

    pub(crate) fn encode(&self, out: &mut ByteBuffer) {
        out.write(self.flags.bits());
        out.write(self.color);
        out.write(self.depth);
        out.write(self.stencil);
    }

    pub(crate) fn decode(input: &mut ByteBuffer) -> Result<Self, GraphicsError> {
        Ok(Self {
            flags: ClearFlags::from_bits_truncate(input.read()?),
            color: input.read()?,
            depth: input.read()?,
            stencil: input.read()?,
        })
    }
}

/// Resolved clear request for the backend.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClearValues {
    pub color: Option<[f32; 4]>,
    pub depth: Option<f32>,
    pub stencil: Option<u32>,
}

/// Rectangle in framebuffer pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    #[inline]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attachment {
    Color(u32),
    Depth,
    Stencil,
    DepthStencil,
}

/// Render target for a pass.
///
/// A null `framebuffer` renders to the default (window) target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderPassDesc {
    pub framebuffer: Handle<Framebuffer>,
    pub color: Vec<Handle<Texture>>,
    pub depth: Handle<Texture>,
    pub stencil: Handle<Texture>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_flags_clear_everything() {
        let values = ClearAction::default().values().unwrap();
        assert_eq!(values.color, Some([0.0, 0.0, 0.0, 1.0]));
        assert_eq!(values.depth, Some(1.0));
        assert_eq!(values.stencil, Some(0));
    }

    #[test]
    fn flags_select_targets() {
        let values = ClearAction {
            flags: ClearFlags::COLOR | ClearFlags::STENCIL,
            stencil: 7,
            ..ClearAction::color([1.0, 0.0, 0.0, 1.0])
        }
        .values()
        .unwrap();

        assert_eq!(values.color, Some([1.0, 0.0, 0.0, 1.0]));
        assert_eq!(values.depth, None);
        assert_eq!(values.stencil, Some(7));
    }

    #[test]
    fn none_flag_suppresses_action() {
        let action = ClearAction {
            flags: ClearFlags::NONE | ClearFlags::COLOR,
            ..ClearAction::default()
        };
        assert_eq!(action.values(), None);
    }
}
