use nergal_collections::ByteBuffer;

use super::{SubmitStats, skip};
use super::cache::{ResolvedField, VertexBufferDecl, decode_into};
use crate::graphics::GraphicsError;
use crate::graphics::backend::{GraphicsBackend, NativeId};
use crate::graphics::context::{GraphicsContext, warn_throttled};
use crate::graphics::desc::{
    AccessType, BindKind, TextureFormat, UniformData, UniformKind, VertexDataType,
};
use crate::graphics::handle::{
    Handle, IndexBuffer, Shader, Texture, Uniform, UniformBuffer, VertexBuffer,
};
use crate::graphics::registry::LocationCache;

/// Shader and program the bindings are applied against.
type BoundShader = Option<(Handle<Shader>, NativeId)>;

impl<B: GraphicsBackend> GraphicsContext<B> {
    pub(super) fn apply_bindings(&mut self, input: &mut ByteBuffer, stats: &mut SubmitStats) -> Result<(), GraphicsError> {
        let count: u32 = input.read()?;
        let replaces_vertex_buffers: u32 = input.read()?;
        if replaces_vertex_buffers != 0 {
            self.cache.vertex_buffers.clear();
        }

        let shader = self.bound_shader();
        for _ in 0..count {
            match BindKind::try_from(input.read::<u32>()?)? {
                BindKind::VertexBuffer => self.bind_vertex_buffer(input, stats)?,
                BindKind::IndexBuffer => self.bind_index_buffer(input, stats)?,
                BindKind::UniformBuffer => self.bind_uniform_buffer(input, shader, stats)?,
                BindKind::Uniform => self.bind_uniform(input, shader, stats)?,
                BindKind::ImageBuffer => self.bind_image_buffer(input, stats)?,
            }
        }
        Ok(())
    }

    fn bind_vertex_buffer(&mut self, input: &mut ByteBuffer, stats: &mut SubmitStats) -> Result<(), GraphicsError> {
        let id: u32 = input.read()?;
        let offset = input.read::<u64>()? as usize;
        let data_type = VertexDataType::try_from(input.read::<u32>()?)?;

        let Some(buffer) = self.registry.get(Handle::<VertexBuffer>::from_raw(id)).map(|r| r.native) else {
            skip!(self, stats, "bind_vertex_buffer", "bind of unknown vertex buffer {id}");
            return Ok(());
        };

        let slot = self.cache.vertex_buffers.len() as u32;
        self.backend.bind_vertex_buffer(slot, buffer, offset);
        self.cache.vertex_buffers.push(VertexBufferDecl {
            buffer,
            offset,
            data_type,
        });
        Ok(())
    }

    fn bind_index_buffer(&mut self, input: &mut ByteBuffer, stats: &mut SubmitStats) -> Result<(), GraphicsError> {
        let id: u32 = input.read()?;
        let handle = Handle::<IndexBuffer>::from_raw(id);

        let Some((buffer, element_size)) = self
            .registry
            .get(handle)
            .map(|r| (r.buffer.native, r.element_size))
        else {
            self.cache.index_buffer = None;
            skip!(self, stats, "bind_index_buffer", "bind of unknown index buffer {id}");
            return Ok(());
        };

        self.backend.bind_index_buffer(buffer);
        self.cache.index_buffer = Some(handle);
        self.cache.index_element_size = element_size;
        Ok(())
    }

    fn bind_uniform_buffer(&mut self, input: &mut ByteBuffer, shader: BoundShader, stats: &mut SubmitStats) -> Result<(), GraphicsError> {
        let id: u32 = input.read()?;
        let binding: u32 = input.read()?;
        let has_range = input.read::<u32>()? != 0;
        let offset = input.read::<u64>()? as usize;
        let size = input.read::<u64>()? as usize;

        let Some((shader, program)) = shader else {
            skip!(
                self,
                stats,
                "bind_uniform_buffer_unbound",
                "uniform buffer {id} bound without a pipeline"
            );
            return Ok(());
        };

        // Outer `None`: unknown buffer. Inner `None`: the shader has no such block.
        let resolved = self
            .registry
            .get_mut(Handle::<UniformBuffer>::from_raw(id))
            .map(|record| {
                let block = match record.block.lookup(shader) {
                    Some(block) => block,
                    None => {
                        let block = self.backend.uniform_block_index(program, &record.name);
                        record.block = LocationCache::Resolved { shader, location: block };
                        block
                    }
                };
                block.map(|block| (block, record.buffer.native, record.buffer.size))
            });

        match resolved {
            Some(Some((block, buffer, buffer_size))) => {
                let (offset, size) = if has_range { (offset, size) } else { (0, buffer_size) };
                self.backend.bind_uniform_block(program, block, binding);
                self.backend.bind_uniform_buffer_range(binding, buffer, offset, size);
            }
            Some(None) => skip!(
                self,
                stats,
                "bind_uniform_buffer_block",
                "uniform buffer {id} has no block in shader {}",
                shader.id()
            ),
            None => skip!(self, stats, "bind_uniform_buffer", "bind of unknown uniform buffer {id}"),
        }
        Ok(())
    }

    fn bind_uniform(&mut self, input: &mut ByteBuffer, shader: BoundShader, stats: &mut SubmitStats) -> Result<(), GraphicsError> {
        let id: u32 = input.read()?;
        let binding: u32 = input.read()?;
        let len = input.read::<u64>()? as usize;
        let data = input.read_bytes(len)?;

        let Some((shader, program)) = shader else {
            skip!(self, stats, "bind_uniform_unbound", "uniform {id} bound without a pipeline");
            return Ok(());
        };

        let mut fields = std::mem::take(&mut self.scratch.fields);
        fields.clear();

        let expected = self
            .registry
            .get_mut(Handle::<Uniform>::from_raw(id))
            .map(|record| {
                if record.size != data.len() {
                    return record.size;
                }
                let mut offset = 0;
                for field in &mut record.fields {
                    let location = match field.location.lookup(shader) {
                        Some(location) => location,
                        None => {
                            let location = self.backend.uniform_location(program, &field.name);
                            if location.is_none() {
                                log::debug!("uniform `{}` is not active in shader {}", field.name, shader.id());
                            }
                            field.location = LocationCache::Resolved { shader, location };
                            location
                        }
                    };
                    fields.push(ResolvedField {
                        kind: field.kind,
                        count: field.count,
                        offset,
                        location,
                    });
                    offset += field.byte_len();
                }
                record.size
            });

        match expected {
            None => skip!(self, stats, "bind_uniform", "bind of unknown uniform {id}"),
            Some(expected) if expected != data.len() => skip!(
                self,
                stats,
                "bind_uniform_size",
                "uniform {id} expects {expected} bytes, bind carries {}",
                data.len()
            ),
            Some(_) => {
                let mut next_unit = binding;
                let mut missing_textures = 0;
                for field in &fields {
                    let bytes = &data[field.offset..field.offset + field.byte_len()];
                    missing_textures += self.upload_field(field, bytes, &mut next_unit);
                }
                if missing_textures > 0 {
                    stats.skipped += missing_textures;
                    warn_throttled!(
                        self,
                        "bind_uniform_texture",
                        "uniform {id} references {missing_textures} unknown texture(s)"
                    );
                }
            }
        }

        self.scratch.fields = fields;
        Ok(())
    }

    /// Uploads one field and binds any textures it names. Returns how many textures did not resolve.
    fn upload_field(&mut self, field: &ResolvedField, bytes: &[u8], next_unit: &mut u32) -> u32 {
        let mut missing = 0;

        match field.kind {
            UniformKind::Float | UniformKind::Vec2 | UniformKind::Vec3 | UniformKind::Vec4 | UniformKind::Mat4 => {
                decode_into(&mut self.scratch.floats, bytes);
            }
            UniformKind::Int => decode_into(&mut self.scratch.ints, bytes),
            UniformKind::Sampler2D | UniformKind::ImageRgba32F => {
                self.scratch.ints.clear();
                for chunk in bytes.chunks_exact(4) {
                    let id: u32 = bytemuck::pod_read_unaligned(chunk);
                    let unit = *next_unit;
                    *next_unit += 1;

                    match self.registry.get(Handle::<Texture>::from_raw(id)) {
                        Some(texture) if field.kind == UniformKind::Sampler2D => {
                            self.backend.bind_texture_unit(unit, texture.native);
                        }
                        Some(texture) => {
                            self.backend.bind_image_texture(unit, texture.native, AccessType::ReadWrite, TextureFormat::Rgba32F);
                        }
                        None => missing += 1,
                    }
                    self.scratch.ints.push(unit as i32);
                }
            }
            UniformKind::Block => return 0,
        }

        let Some(location) = field.location else {
            return missing;
        };
        let floats = self.scratch.floats.as_slice();
        let ints = self.scratch.ints.as_slice();
        let data = match field.kind {
            UniformKind::Float => UniformData::Float(floats),
            UniformKind::Vec2 => UniformData::Vec2(bytemuck::cast_slice(floats)),
            UniformKind::Vec3 => UniformData::Vec3(bytemuck::cast_slice(floats)),
            UniformKind::Vec4 => UniformData::Vec4(bytemuck::cast_slice(floats)),
            UniformKind::Mat4 => UniformData::Mat4(bytemuck::cast_slice(floats)),
            UniformKind::Int | UniformKind::ImageRgba32F => UniformData::Int(ints),
            UniformKind::Sampler2D => UniformData::Sampler(ints),
            UniformKind::Block => return missing,
        };
        self.backend.upload_uniform(location, data);
        missing
    }

    fn bind_image_buffer(&mut self, input: &mut ByteBuffer, stats: &mut SubmitStats) -> Result<(), GraphicsError> {
        let id: u32 = input.read()?;
        let binding: u32 = input.read()?;
        let access = AccessType::try_from(input.read::<u32>()?)?;

        let Some((texture, format)) = self
            .registry
            .get(Handle::<Texture>::from_raw(id))
            .map(|r| (r.native, r.desc.format))
        else {
            skip!(self, stats, "bind_image_buffer", "bind of unknown image texture {id}");
            return Ok(());
        };

        self.backend.bind_image_texture(binding, texture, access, format);
        Ok(())
    }
}
