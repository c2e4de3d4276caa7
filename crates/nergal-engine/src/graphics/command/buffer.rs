use nergal_collections::ByteBuffer;

use super::Opcode;
use crate::graphics::desc::{
    BindDesc, BindKind, BufferTarget, BufferUpdateDesc, ClearAction, DrawDesc, PixelRect,
    TextureDesc,
};
use crate::graphics::handle::{Handle, Pipeline, RenderPass, Texture};

/// Ordered log of recorded graphics operations.
///
/// Recording only appends bytes; nothing touches the backend until the buffer
/// is submitted. Commands from unrelated call sites interleave in call order.
///
/// Performance characteristics:
/// - recording is amortized O(payload size)
/// - submission clears the buffer but keeps its allocation
#[derive(Debug, Clone, Default)]
pub struct CommandBuffer {
    commands: ByteBuffer,
    num_commands: u32,
}

impl CommandBuffer {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a buffer with `bytes` of initial stream capacity.
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            commands: ByteBuffer::with_capacity(bytes),
            num_commands: 0,
        }
    }

    /// Number of recorded commands.
    #[inline]
    pub fn len(&self) -> u32 {
        self.num_commands
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.num_commands == 0
    }

    /// Encoded size of the recorded commands.
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.commands.len()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.commands.capacity()
    }

    /// Drops recorded commands. Keeps allocated capacity for reuse.
    #[inline]
    pub fn clear(&mut self) {
        self.commands.clear();
        self.num_commands = 0;
    }

    #[inline]
    pub(crate) fn stream_mut(&mut self) -> &mut ByteBuffer {
        &mut self.commands
    }

    /// Appends `opcode` followed by whatever `payload` writes.
    ///
    /// The payload must be decodable by the interpreter's handler for `opcode`.
    pub fn write_command(&mut self, opcode: Opcode, payload: impl FnOnce(&mut ByteBuffer)) {
        self.commands.write(opcode.to_wire());
        payload(&mut self.commands);
        self.num_commands += 1;
    }

    // ── passes ───────────────────────────────────────────────────────────────

    /// Binds `pass` (null for the default target) and applies `clears` in order.
    pub fn begin_render_pass(&mut self, pass: Handle<RenderPass>, clears: &[ClearAction]) {
        self.write_command(Opcode::BeginRenderPass, |out| {
            out.write(pass.id());
            write_clear_actions(out, clears);
        });
    }

    pub fn end_render_pass(&mut self) {
        self.write_command(Opcode::EndRenderPass, |_| {});
    }

    pub fn set_viewport(&mut self, rect: PixelRect) {
        self.write_command(Opcode::SetViewport, |out| write_rect(out, rect));
    }

    pub fn set_scissor(&mut self, rect: PixelRect) {
        self.write_command(Opcode::SetScissor, |out| write_rect(out, rect));
    }

    pub fn clear_targets(&mut self, clears: &[ClearAction]) {
        self.write_command(Opcode::Clear, |out| write_clear_actions(out, clears));
    }

    // ── updates ──────────────────────────────────────────────────────────────

    /// Records new contents for a buffer. The data is copied into the stream.
    pub fn request_buffer_update(&mut self, target: BufferTarget, desc: &BufferUpdateDesc<'_>) {
        self.write_command(Opcode::RequestBufferUpdate, |out| {
            out.write(target.kind().to_wire());
            out.write(target.id());
            out.write(desc.usage.to_wire());
            out.write(desc.update.kind().to_wire());
            out.write(desc.update.offset() as u64);
            out.write(desc.data.len() as u64);
            out.write_bulk(desc.data);
        });
    }

    /// Records a texture re-upload with a possibly changed description.
    pub fn request_texture_update(&mut self, texture: Handle<Texture>, desc: &TextureDesc, data: &[u8]) {
        self.write_command(Opcode::RequestTextureUpdate, |out| {
            out.write(texture.id());
            desc.encode(out);
            out.write(data.len() as u64);
            out.write_bulk(data);
        });
    }

    // ── pipeline and bindings ────────────────────────────────────────────────

    pub fn bind_pipeline(&mut self, pipeline: Handle<Pipeline>) {
        self.write_command(Opcode::BindPipeline, |out| out.write(pipeline.id()));
    }

    pub fn apply_bindings(&mut self, binds: &BindDesc<'_>) {
        self.write_command(Opcode::BindBindings, |out| {
            out.write(binds.len() as u32);
            out.write(u32::from(!binds.vertex_buffers.is_empty()));

            for vb in binds.vertex_buffers {
                out.write(BindKind::VertexBuffer.to_wire());
                out.write(vb.buffer.id());
                out.write(vb.offset as u64);
                out.write(vb.data_type.to_wire());
            }

            if let Some(ib) = binds.index_buffer {
                out.write(BindKind::IndexBuffer.to_wire());
                out.write(ib.id());
            }

            for ub in binds.uniform_buffers {
                let (offset, size) = ub.range.unwrap_or((0, 0));
                out.write(BindKind::UniformBuffer.to_wire());
                out.write(ub.buffer.id());
                out.write(ub.binding);
                out.write(u32::from(ub.range.is_some()));
                out.write(offset as u64);
                out.write(size as u64);
            }

            for u in binds.uniforms {
                out.write(BindKind::Uniform.to_wire());
                out.write(u.uniform.id());
                out.write(u.binding);
                out.write(u.data.len() as u64);
                out.write_bulk(u.data);
            }

            for img in binds.image_buffers {
                out.write(BindKind::ImageBuffer.to_wire());
                out.write(img.texture.id());
                out.write(img.binding);
                out.write(img.access.to_wire());
            }
        });
    }

    // ── work ─────────────────────────────────────────────────────────────────

    pub fn draw(&mut self, draw: &DrawDesc) {
        self.write_command(Opcode::Draw, |out| {
            out.write(draw.start);
            out.write(draw.count);
            out.write(draw.instances);
            out.write(draw.base_vertex);
            out.write(draw.range.0);
            out.write(draw.range.1);
        });
    }

    pub fn dispatch_compute(&mut self, x: u32, y: u32, z: u32) {
        self.write_command(Opcode::DispatchCompute, |out| out.write([x, y, z]));
    }
}

fn write_rect(out: &mut ByteBuffer, rect: PixelRect) {
    out.write([rect.x, rect.y, rect.width, rect.height]);
}

fn write_clear_actions(out: &mut ByteBuffer, clears: &[ClearAction]) {
    out.write(clears.len() as u32);
    for action in clears {
        action.encode(out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::desc::VertexBufferBinding;

    #[test]
    fn commands_are_counted_and_encoded_in_order() {
        let mut cb = CommandBuffer::new();
        cb.bind_pipeline(Handle::from_raw(3));
        cb.draw(&DrawDesc::new(0, 6));
        assert_eq!(cb.len(), 2);

        let stream = cb.stream_mut();
        stream.seek_to_beg();
        assert_eq!(stream.read::<u32>().unwrap(), Opcode::BindPipeline.to_wire());
        assert_eq!(stream.read::<u32>().unwrap(), 3);
        assert_eq!(stream.read::<u32>().unwrap(), Opcode::Draw.to_wire());
        assert_eq!(stream.read::<[u32; 2]>().unwrap(), [0, 6]);
    }

    #[test]
    fn bindings_header_counts_every_entry() {
        let vbs = [VertexBufferBinding::new(Handle::from_raw(1))];
        let binds = BindDesc {
            vertex_buffers: &vbs,
            index_buffer: Some(Handle::from_raw(2)),
            ..BindDesc::default()
        };

        let mut cb = CommandBuffer::new();
        cb.apply_bindings(&binds);

        let stream = cb.stream_mut();
        stream.seek_to_beg();
        stream.advance(4).unwrap();
        assert_eq!(stream.read::<u32>().unwrap(), 2);
        assert_eq!(stream.read::<u32>().unwrap(), 1);
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut cb = CommandBuffer::with_capacity(16);
        for _ in 0..32 {
            cb.set_viewport(PixelRect::new(0, 0, 800, 600));
        }
        let capacity = cb.capacity();
        assert!(capacity > 16);

        cb.clear();
        assert!(cb.is_empty());
        assert_eq!(cb.byte_len(), 0);
        assert_eq!(cb.capacity(), capacity);
    }
}
