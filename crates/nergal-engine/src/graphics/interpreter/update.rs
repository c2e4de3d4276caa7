use nergal_collections::ByteBuffer;

use super::{SubmitStats, skip};
use crate::graphics::GraphicsError;
use crate::graphics::backend::GraphicsBackend;
use crate::graphics::context::GraphicsContext;
use crate::graphics::desc::{BufferKind, BufferUpdate, BufferUpdateKind, BufferUsage, TextureDesc};
use crate::graphics::handle::{Handle, Texture};

impl<B: GraphicsBackend> GraphicsContext<B> {
    pub(super) fn request_buffer_update(&mut self, input: &mut ByteBuffer, stats: &mut SubmitStats) -> Result<(), GraphicsError> {
        let kind = BufferKind::try_from(input.read::<u32>()?)?;
        let id: u32 = input.read()?;
        let usage = BufferUsage::try_from(input.read::<u32>()?)?;
        let update_kind = BufferUpdateKind::try_from(input.read::<u32>()?)?;
        let offset = input.read::<u64>()? as usize;
        let len = input.read::<u64>()? as usize;
        let data = input.read_bytes(len)?;

        let update = BufferUpdate::from_parts(update_kind, offset);
        if !self.apply_buffer_update(kind, id, usage, update, data) {
            skip!(self, stats, "buffer_update", "update of unknown {kind:?} buffer {id}");
        }
        Ok(())
    }

    pub(super) fn request_texture_update(&mut self, input: &mut ByteBuffer, stats: &mut SubmitStats) -> Result<(), GraphicsError> {
        let id: u32 = input.read()?;
        let desc = TextureDesc::decode(input)?;
        let len = input.read::<u64>()? as usize;
        let data = input.read_bytes(len)?;

        if data.len() != desc.byte_len() {
            skip!(
                self,
                stats,
                "texture_update_size",
                "texture {id} update carries {} bytes, description needs {}",
                data.len(),
                desc.byte_len()
            );
            return Ok(());
        }

        match self.registry.get_mut(Handle::<Texture>::from_raw(id)) {
            Some(record) => {
                record.desc = desc;
                self.backend.update_texture(record.native, &desc, data);
            }
            None => skip!(self, stats, "texture_update", "update of unknown texture {id}"),
        }
        Ok(())
    }
}
