//! Immediate resource creation, destruction and updates.

use super::backend::GraphicsBackend;
use super::context::GraphicsContext;
use super::desc::{
    BufferKind, BufferUpdate, BufferUpdateDesc, BufferUsage, IndexBufferDesc, IndexType,
    PipelineDesc, RenderPassDesc, ShaderDesc, TextureDesc, UniformBufferDesc,
    UniformDesc, VertexBufferDesc,
};
use super::error::{GraphicsError, ShaderCompileError};
use super::handle::{
    Framebuffer, Handle, IndexBuffer, Pipeline, RenderPass, Shader, Texture, Uniform,
    UniformBuffer, VertexBuffer,
};
use super::registry::{
    BufferRecord, FramebufferRecord, IndexBufferRecord, LocationCache, PipelineRecord,
    RenderPassRecord, Resource, ShaderRecord, TextureRecord, UniformBufferRecord, UniformField,
    UniformRecord,
};

impl<B: GraphicsBackend> GraphicsContext<B> {
    // ── shaders ──────────────────────────────────────────────────────────────

    /// Compiles and links a program.
    ///
    /// A compile or link failure leaves no usable program behind; the error
    /// carries the compiler log and the offending source and callers are
    /// expected to treat it as fatal.
    pub fn create_shader(&mut self, desc: &ShaderDesc) -> Result<Handle<Shader>, GraphicsError> {
        if desc.sources.is_empty() {
            return Err(GraphicsError::InvalidDescriptor(format!(
                "shader `{}` has no stage sources",
                desc.name
            )));
        }
        let compute = desc.is_compute();
        if compute && desc.sources.len() > 1 {
            return Err(GraphicsError::InvalidDescriptor(format!(
                "shader `{}` mixes a compute stage with graphics stages",
                desc.name
            )));
        }

        let program = self.backend.compile_program(desc).map_err(|err| {
            let err = compile_failure(desc, err);
            log::error!("{err}");
            err
        })?;

        let handle = self.registry.insert(ShaderRecord {
            name: desc.name.clone(),
            program,
            compute,
        });
        if !desc.name.is_empty() {
            self.registry.register_name(&desc.name, handle);
        }

        log::debug!("created shader `{}` as {handle:?}", desc.name);
        Ok(handle)
    }

    pub fn destroy_shader(&mut self, handle: Handle<Shader>) -> bool {
        let Some(record) = self.release(handle) else {
            return false;
        };
        self.registry.unregister_name(&record.name, handle);
        self.registry.forget_locations(handle);
        self.backend.delete_program(record.program);
        true
    }

    pub fn find_shader(&self, name: &str) -> Option<Handle<Shader>> {
        self.registry.find(name)
    }

    // ── textures ─────────────────────────────────────────────────────────────

    pub fn create_texture(&mut self, desc: &TextureDesc, data: Option<&[u8]>) -> Result<Handle<Texture>, GraphicsError> {
        validate_texture(desc, data)?;
        let native = self.backend.create_texture(desc, data);
        let handle = self.registry.insert(TextureRecord { native, desc: *desc });
        log::debug!("created {}x{} {:?} texture as {handle:?}", desc.width, desc.height, desc.format);
        Ok(handle)
    }

    /// Re-uploads a texture now, outside any command buffer.
    pub fn update_texture(&mut self, handle: Handle<Texture>, desc: &TextureDesc, data: &[u8]) -> Result<(), GraphicsError> {
        validate_texture(desc, Some(data))?;
        let record = self.registry.get_mut(handle).ok_or(stale(handle))?;
        record.desc = *desc;
        self.backend.update_texture(record.native, desc, data);
        Ok(())
    }

    pub fn destroy_texture(&mut self, handle: Handle<Texture>) -> bool {
        self.release(handle)
            .map(|record| self.backend.delete_texture(record.native))
            .is_some()
    }

    // ── buffers ──────────────────────────────────────────────────────────────

    pub fn create_vertex_buffer(&mut self, desc: &VertexBufferDesc<'_>) -> Result<Handle<VertexBuffer>, GraphicsError> {
        let size = validate_buffer("vertex", desc.data, desc.size, desc.usage)?;
        let native = self.backend.create_buffer(BufferKind::Vertex, desc.usage, size, desc.data);
        let handle = self.registry.insert(BufferRecord {
            native,
            usage: desc.usage,
            size,
        });
        log::debug!("created {size} byte vertex buffer as {handle:?}");
        Ok(handle)
    }

    pub fn create_index_buffer(&mut self, desc: &IndexBufferDesc<'_>) -> Result<Handle<IndexBuffer>, GraphicsError> {
        if IndexType::from_element_size(desc.element_size).is_none() {
            return Err(GraphicsError::InvalidDescriptor(format!(
                "index element size {} is not 1, 2 or 4",
                desc.element_size
            )));
        }
        let size = validate_buffer("index", desc.data, desc.size, desc.usage)?;
        let native = self.backend.create_buffer(BufferKind::Index, desc.usage, size, desc.data);
        let handle = self.registry.insert(IndexBufferRecord {
            buffer: BufferRecord {
                native,
                usage: desc.usage,
                size,
            },
            element_size: desc.element_size,
        });
        log::debug!("created {size} byte index buffer as {handle:?}");
        Ok(handle)
    }

    pub fn create_uniform_buffer(&mut self, desc: &UniformBufferDesc<'_>) -> Result<Handle<UniformBuffer>, GraphicsError> {
        if desc.name.is_empty() {
            return Err(GraphicsError::InvalidDescriptor(
                "uniform buffer requires the name of its shader block".into(),
            ));
        }
        let size = validate_buffer("uniform", desc.data, desc.size, desc.usage)?;
        let native = self.backend.create_buffer(BufferKind::Uniform, desc.usage, size, desc.data);
        let handle = self.registry.insert(UniformBufferRecord {
            name: desc.name.to_owned(),
            buffer: BufferRecord {
                native,
                usage: desc.usage,
                size,
            },
            block: LocationCache::Unresolved,
        });
        self.registry.register_name(desc.name, handle);
        log::debug!("created uniform buffer `{}` as {handle:?}", desc.name);
        Ok(handle)
    }

    pub fn update_vertex_buffer(&mut self, handle: Handle<VertexBuffer>, desc: &BufferUpdateDesc<'_>) -> Result<(), GraphicsError> {
        self.update_buffer_now(BufferKind::Vertex, handle.id(), desc.usage, desc.update, desc.data)
    }

    pub fn update_index_buffer(&mut self, handle: Handle<IndexBuffer>, desc: &BufferUpdateDesc<'_>) -> Result<(), GraphicsError> {
        self.update_buffer_now(BufferKind::Index, handle.id(), desc.usage, desc.update, desc.data)
    }

    pub fn update_uniform_buffer(&mut self, handle: Handle<UniformBuffer>, desc: &BufferUpdateDesc<'_>) -> Result<(), GraphicsError> {
        self.update_buffer_now(BufferKind::Uniform, handle.id(), desc.usage, desc.update, desc.data)
    }

    fn update_buffer_now(
        &mut self,
        kind: BufferKind,
        id: u32,
        usage: BufferUsage,
        update: BufferUpdate,
        data: &[u8],
    ) -> Result<(), GraphicsError> {
        if self.apply_buffer_update(kind, id, usage, update, data) {
            Ok(())
        } else {
            Err(GraphicsError::StaleHandle {
                kind: match kind {
                    BufferKind::Index => IndexBuffer::KIND,
                    BufferKind::Uniform => UniformBuffer::KIND,
                    BufferKind::Vertex => VertexBuffer::KIND,
                },
                id,
            })
        }
    }

    /// Updates buffer metadata and forwards `data` to the backend.
    ///
    /// Returns `false` when `id` names no live buffer of `kind`.
    pub(super) fn apply_buffer_update(
        &mut self,
        kind: BufferKind,
        id: u32,
        usage: BufferUsage,
        update: BufferUpdate,
        data: &[u8],
    ) -> bool {
        let len = data.len();
        let native = match kind {
            BufferKind::Vertex => self
                .registry
                .get_mut(Handle::<VertexBuffer>::from_raw(id))
                .map(|r| r.note_update(usage, update, len)),
            BufferKind::Index => self
                .registry
                .get_mut(Handle::<IndexBuffer>::from_raw(id))
                .map(|r| r.buffer.note_update(usage, update, len)),
            BufferKind::Uniform => self
                .registry
                .get_mut(Handle::<UniformBuffer>::from_raw(id))
                .map(|r| r.buffer.note_update(usage, update, len)),
        };

        match native {
            Some(native) => {
                self.backend.update_buffer(native, kind, usage, update, data);
                true
            }
            None => false,
        }
    }

    pub fn destroy_vertex_buffer(&mut self, handle: Handle<VertexBuffer>) -> bool {
        self.release(handle)
            .map(|record| self.backend.delete_buffer(record.native))
            .is_some()
    }

    pub fn destroy_index_buffer(&mut self, handle: Handle<IndexBuffer>) -> bool {
        self.release(handle)
            .map(|record| self.backend.delete_buffer(record.buffer.native))
            .is_some()
    }

    pub fn destroy_uniform_buffer(&mut self, handle: Handle<UniformBuffer>) -> bool {
        let Some(record) = self.release(handle) else {
            return false;
        };
        self.registry.unregister_name(&record.name, handle);
        self.backend.delete_buffer(record.buffer.native);
        true
    }

    pub fn find_uniform_buffer(&self, name: &str) -> Option<Handle<UniformBuffer>> {
        self.registry.find(name)
    }

    // ── uniforms ─────────────────────────────────────────────────────────────

    /// Declares a uniform. Locations are resolved on first bind per shader.
    pub fn create_uniform(&mut self, desc: &UniformDesc) -> Result<Handle<Uniform>, GraphicsError> {
        if desc.name.is_empty() {
            return Err(GraphicsError::InvalidDescriptor("uniform requires a name".into()));
        }
        if desc.layout.is_empty() {
            return Err(GraphicsError::InvalidDescriptor(format!(
                "uniform `{}` has an empty layout",
                desc.name
            )));
        }

        let fields = desc
            .layout
            .iter()
            .map(|field| UniformField {
                kind: field.kind,
                count: field.count.max(1),
                name: format!("{}{}", desc.name, field.name),
                location: LocationCache::Unresolved,
            })
            .collect::<Vec<_>>();
        let size = fields.iter().map(UniformField::byte_len).sum();

        let handle = self.registry.insert(UniformRecord {
            name: desc.name.clone(),
            fields,
            size,
        });
        self.registry.register_name(&desc.name, handle);
        log::debug!("created uniform `{}` ({size} bytes) as {handle:?}", desc.name);
        Ok(handle)
    }

    pub fn destroy_uniform(&mut self, handle: Handle<Uniform>) -> bool {
        let Some(record) = self.release(handle) else {
            return false;
        };
        self.registry.unregister_name(&record.name, handle);
        true
    }

    pub fn find_uniform(&self, name: &str) -> Option<Handle<Uniform>> {
        self.registry.find(name)
    }

    // ── targets ──────────────────────────────────────────────────────────────

    pub fn create_framebuffer(&mut self) -> Handle<Framebuffer> {
        let native = self.backend.create_framebuffer();
        self.registry.insert(FramebufferRecord { native })
    }

    pub fn destroy_framebuffer(&mut self, handle: Handle<Framebuffer>) -> bool {
        self.release(handle)
            .map(|record| self.backend.delete_framebuffer(record.native))
            .is_some()
    }

    /// Stores a pass description. Attachments are resolved when the pass begins.
    pub fn create_render_pass(&mut self, desc: &RenderPassDesc) -> Handle<RenderPass> {
        if !desc.framebuffer.is_null() && !self.registry.contains(desc.framebuffer) {
            log::warn!("render pass references missing {:?}", desc.framebuffer);
        }
        self.registry.insert(RenderPassRecord { desc: desc.clone() })
    }

    pub fn destroy_render_pass(&mut self, handle: Handle<RenderPass>) -> bool {
        self.release(handle).is_some()
    }

    // ── pipelines ────────────────────────────────────────────────────────────

    pub fn create_pipeline(&mut self, desc: &PipelineDesc) -> Result<Handle<Pipeline>, GraphicsError> {
        let shader = desc.shader();
        let Some(record) = self.registry.get(shader) else {
            return Err(GraphicsError::InvalidDescriptor(format!(
                "pipeline references missing {shader:?}"
            )));
        };
        if record.compute != desc.is_compute() {
            return Err(GraphicsError::InvalidDescriptor(format!(
                "pipeline kind does not match shader `{}`",
                record.name
            )));
        }
        let element_size = desc.raster.index_element_size;
        if element_size != 0 && IndexType::from_element_size(element_size).is_none() {
            return Err(GraphicsError::InvalidDescriptor(format!(
                "pipeline index element size {element_size} is not 1, 2 or 4"
            )));
        }

        let handle = self.registry.insert(PipelineRecord { desc: desc.clone() });
        log::debug!("created pipeline {handle:?} with {shader:?}");
        Ok(handle)
    }

    /// Description a pipeline was created with.
    pub fn pipeline_desc(&self, handle: Handle<Pipeline>) -> Option<&PipelineDesc> {
        self.registry.get(handle).map(|record| &record.desc)
    }

    pub fn destroy_pipeline(&mut self, handle: Handle<Pipeline>) -> bool {
        self.release(handle).is_some()
    }

    fn release<R: Resource>(&mut self, handle: Handle<R>) -> Option<R::Record> {
        let record = self.registry.remove(handle);
        if record.is_none() {
            log::warn!("destroy of unknown {:?} handle {}", R::KIND, handle.id());
        }
        record
    }
}

fn stale<R: Resource>(handle: Handle<R>) -> GraphicsError {
    GraphicsError::StaleHandle {
        kind: R::KIND,
        id: handle.id(),
    }
}

fn compile_failure(desc: &ShaderDesc, err: ShaderCompileError) -> GraphicsError {
    match err {
        ShaderCompileError::Compile { stage, log } => GraphicsError::ShaderCompile {
            name: desc.name.clone(),
            stage,
            log,
            shader_source: desc.source(stage).unwrap_or_default().to_owned(),
        },
        ShaderCompileError::Link { log } => GraphicsError::ShaderLink {
            name: desc.name.clone(),
            log,
        },
    }
}

fn validate_texture(desc: &TextureDesc, data: Option<&[u8]>) -> Result<(), GraphicsError> {
    if desc.width == 0 || desc.height == 0 {
        return Err(GraphicsError::InvalidDescriptor(format!(
            "texture has zero size ({}x{})",
            desc.width, desc.height
        )));
    }
    match data {
        Some(data) if data.len() != desc.byte_len() => Err(GraphicsError::InvalidDescriptor(format!(
            "texture data is {} bytes, {}x{} {:?} needs {}",
            data.len(),
            desc.width,
            desc.height,
            desc.format,
            desc.byte_len()
        ))),
        _ => Ok(()),
    }
}

/// Checks a buffer description and returns the storage size to allocate.
fn validate_buffer(what: &str, data: Option<&[u8]>, size: usize, usage: BufferUsage) -> Result<usize, GraphicsError> {
    if usage == BufferUsage::Static && data.is_none() {
        return Err(GraphicsError::InvalidDescriptor(format!(
            "static {what} buffer created without data"
        )));
    }
    let size = size.max(data.map_or(0, <[u8]>::len));
    if size == 0 {
        return Err(GraphicsError::InvalidDescriptor(format!("{what} buffer has zero size")));
    }
    Ok(size)
}
