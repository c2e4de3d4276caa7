use nergal_collections::ByteBuffer;

use super::{SubmitStats, skip};
use crate::graphics::GraphicsError;
use crate::graphics::backend::GraphicsBackend;
use crate::graphics::context::{GraphicsContext, warn_throttled};
use crate::graphics::desc::{Attachment, ClearAction, PixelRect};
use crate::graphics::handle::{Handle, RenderPass, Texture};

/// Result of pointing the backend at a pass's render target.
enum PassTarget {
    Bound { missing_attachments: u32 },
    Unknown,
}

impl<B: GraphicsBackend> GraphicsContext<B> {
    pub(super) fn begin_render_pass(&mut self, input: &mut ByteBuffer, stats: &mut SubmitStats) -> Result<(), GraphicsError> {
        let id: u32 = input.read()?;
        if self.in_pass {
            return Err(GraphicsError::InvalidState(
                "render pass begun while another pass is active".into(),
            ));
        }
        self.in_pass = true;
        self.cache.reset();

        match self.bind_pass_target(Handle::from_raw(id)) {
            PassTarget::Bound { missing_attachments } => {
                if missing_attachments > 0 {
                    stats.skipped += missing_attachments;
                    warn_throttled!(
                        self,
                        "render_pass_attachment",
                        "render pass {id} skipped {missing_attachments} missing attachment(s)"
                    );
                }
                self.apply_clears(input)
            }
            PassTarget::Unknown => {
                skip!(self, stats, "begin_render_pass", "begin of unknown render pass {id}");
                skip_clears(input)
            }
        }
    }

    pub(super) fn end_render_pass(&mut self) -> Result<(), GraphicsError> {
        if !self.in_pass {
            return Err(GraphicsError::InvalidState(
                "render pass ended without a matching begin".into(),
            ));
        }
        self.in_pass = false;
        self.cache.reset();
        self.backend.reset_state();
        self.backend.bind_framebuffer(None);
        Ok(())
    }

    pub(super) fn set_viewport(&mut self, input: &mut ByteBuffer) -> Result<(), GraphicsError> {
        let rect = read_rect(input)?;
        self.backend.set_viewport(rect);
        Ok(())
    }

    pub(super) fn set_scissor(&mut self, input: &mut ByteBuffer) -> Result<(), GraphicsError> {
        let rect = read_rect(input)?;
        self.backend.set_scissor(rect);
        Ok(())
    }

    pub(super) fn clear_targets(&mut self, input: &mut ByteBuffer) -> Result<(), GraphicsError> {
        self.apply_clears(input)
    }

    fn apply_clears(&mut self, input: &mut ByteBuffer) -> Result<(), GraphicsError> {
        let count: u32 = input.read()?;
        for _ in 0..count {
            if let Some(values) = ClearAction::decode(input)?.values() {
                self.backend.clear(values);
            }
        }
        Ok(())
    }

    /// Binds the pass framebuffer and its attachments, or the default target for the null pass.
    fn bind_pass_target(&mut self, pass: Handle<RenderPass>) -> PassTarget {
        if pass.is_null() {
            self.backend.bind_framebuffer(None);
            return PassTarget::Bound { missing_attachments: 0 };
        }

        let Some(record) = self.registry.get(pass) else {
            return PassTarget::Unknown;
        };
        let desc = &record.desc;
        if desc.framebuffer.is_null() {
            self.backend.bind_framebuffer(None);
            return PassTarget::Bound { missing_attachments: 0 };
        }
        let Some(framebuffer) = self.registry.get(desc.framebuffer) else {
            return PassTarget::Unknown;
        };
        self.backend.bind_framebuffer(Some(framebuffer.native));

        let mut missing_attachments = 0;
        let mut attach = |attachment: Attachment, texture: Handle<Texture>| match self.registry.get(texture) {
            Some(record) => self.backend.attach_texture(attachment, record.native),
            None => missing_attachments += 1,
        };

        for (index, &texture) in desc.color.iter().enumerate() {
            attach(Attachment::Color(index as u32), texture);
        }
        if !desc.depth.is_null() {
            let shared = desc.stencil == desc.depth;
            attach(if shared { Attachment::DepthStencil } else { Attachment::Depth }, desc.depth);
        }
        if !desc.stencil.is_null() && desc.stencil != desc.depth {
            attach(Attachment::Stencil, desc.stencil);
        }

        PassTarget::Bound { missing_attachments }
    }
}

fn read_rect(input: &mut ByteBuffer) -> Result<PixelRect, GraphicsError> {
    let [x, y, width, height]: [u32; 4] = input.read()?;
    Ok(PixelRect::new(x, y, width, height))
}

fn skip_clears(input: &mut ByteBuffer) -> Result<(), GraphicsError> {
    let count: u32 = input.read()?;
    for _ in 0..count {
        ClearAction::decode(input)?;
    }
    Ok(())
}
