use nergal_collections::{HashTable, SlotTable, hash_str};

use super::backend::{NativeId, UniformLocation};
use super::desc::{BufferUpdate, BufferUsage, PipelineDesc, RenderPassDesc, TextureDesc, UniformKind};
use super::handle::{
    Framebuffer, Handle, IndexBuffer, Pipeline, RenderPass, Shader, Texture, Uniform,
    UniformBuffer, VertexBuffer,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Shader,
    Texture,
    VertexBuffer,
    IndexBuffer,
    UniformBuffer,
    Uniform,
    Framebuffer,
    RenderPass,
    Pipeline,
}

/// Lazily resolved shader-side location.
///
/// Resolution is tied to the shader it was queried against; binding under a
/// different shader resolves again. A miss is cached as `location: None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocationCache {
    #[default]
    Unresolved,
    Resolved {
        shader: Handle<Shader>,
        location: Option<UniformLocation>,
    },
}

impl LocationCache {
    /// Cached result for `shader`, if one exists.
    #[inline]
    pub fn lookup(&self, shader: Handle<Shader>) -> Option<Option<UniformLocation>> {
        match *self {
            Self::Resolved { shader: cached, location } if cached == shader => Some(location),
            _ => None,
        }
    }

    /// Drops a result cached against `shader`.
    #[inline]
    pub fn forget(&mut self, shader: Handle<Shader>) {
        if self.lookup(shader).is_some() {
            *self = Self::Unresolved;
        }
    }
}

// ── records ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct ShaderRecord {
    pub name: String,
    pub program: NativeId,
    pub compute: bool,
}

#[derive(Debug, Clone, Default)]
pub struct TextureRecord {
    pub native: NativeId,
    pub desc: TextureDesc,
}

/// Native buffer plus the metadata updates keep current.
#[derive(Debug, Clone, Copy, Default)]
pub struct BufferRecord {
    pub native: NativeId,
    pub usage: BufferUsage,
    pub size: usize,
}

impl BufferRecord {
    /// Applies an update's effect on metadata and returns the native buffer.
    pub fn note_update(&mut self, usage: BufferUsage, update: BufferUpdate, len: usize) -> NativeId {
        self.usage = usage;
        self.size = update.resulting_size(self.size, len);
        self.native
    }
}

#[derive(Debug, Clone, Default)]
pub struct IndexBufferRecord {
    pub buffer: BufferRecord,
    pub element_size: u32,
}

#[derive(Debug, Clone, Default)]
pub struct UniformBufferRecord {
    pub name: String,
    pub buffer: BufferRecord,
    pub block: LocationCache,
}

#[derive(Debug, Clone, Default)]
pub struct UniformField {
    pub kind: UniformKind,
    pub count: u32,
    /// Full shader-side name.
    pub name: String,
    pub location: LocationCache,
}

impl UniformField {
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.kind.size() * self.count as usize
    }
}

#[derive(Debug, Clone, Default)]
pub struct UniformRecord {
    pub name: String,
    pub fields: Vec<UniformField>,
    pub size: usize,
}

#[derive(Debug, Clone, Default)]
pub struct FramebufferRecord {
    pub native: NativeId,
}

#[derive(Debug, Clone, Default)]
pub struct RenderPassRecord {
    pub desc: RenderPassDesc,
}

#[derive(Debug, Clone, Default)]
pub struct PipelineRecord {
    pub desc: PipelineDesc,
}

// ── registry ─────────────────────────────────────────────────────────────────

/// A resource kind stored in the registry.
pub trait Resource: Sized + 'static {
    type Record: Default;
    const KIND: ResourceKind;

    fn table(registry: &ResourceRegistry) -> &SlotTable<Self::Record>;
    fn table_mut(registry: &mut ResourceRegistry) -> &mut SlotTable<Self::Record>;
}

macro_rules! impl_resource {
    ($marker:ty, $record:ty, $field:ident, $kind:ident) => {
        impl Resource for $marker {
            type Record = $record;
            const KIND: ResourceKind = ResourceKind::$kind;

            #[inline]
            fn table(registry: &ResourceRegistry) -> &SlotTable<Self::Record> {
                &registry.$field
            }

            #[inline]
            fn table_mut(registry: &mut ResourceRegistry) -> &mut SlotTable<Self::Record> {
                &mut registry.$field
            }
        }
    };
}

impl_resource!(Shader, ShaderRecord, shaders, Shader);
impl_resource!(Texture, TextureRecord, textures, Texture);
impl_resource!(VertexBuffer, BufferRecord, vertex_buffers, VertexBuffer);
impl_resource!(IndexBuffer, IndexBufferRecord, index_buffers, IndexBuffer);
impl_resource!(UniformBuffer, UniformBufferRecord, uniform_buffers, UniformBuffer);
impl_resource!(Uniform, UniformRecord, uniforms, Uniform);
impl_resource!(Framebuffer, FramebufferRecord, framebuffers, Framebuffer);
impl_resource!(RenderPass, RenderPassRecord, render_passes, RenderPass);
impl_resource!(Pipeline, PipelineRecord, pipelines, Pipeline);

/// Every graphics resource, one slot table per kind.
///
/// Slot 0 of each table holds a default sentinel record inserted at
/// construction. It is never returned by lookups and never removed, so handle
/// id 0 is the null handle for every kind.
#[derive(Debug)]
pub struct ResourceRegistry {
    shaders: SlotTable<ShaderRecord>,
    textures: SlotTable<TextureRecord>,
    vertex_buffers: SlotTable<BufferRecord>,
    index_buffers: SlotTable<IndexBufferRecord>,
    uniform_buffers: SlotTable<UniformBufferRecord>,
    uniforms: SlotTable<UniformRecord>,
    framebuffers: SlotTable<FramebufferRecord>,
    render_passes: SlotTable<RenderPassRecord>,
    pipelines: SlotTable<PipelineRecord>,

    /// `[kind, hash(name)]` to handle id.
    names: HashTable<[u64; 2], u32>,
}

impl Default for ResourceRegistry {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

impl ResourceRegistry {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with room for `per_kind` resources in every table.
    pub fn with_capacity(per_kind: usize) -> Self {
        fn table<T: Default>(capacity: usize) -> SlotTable<T> {
            let mut table = SlotTable::with_capacity(capacity + 1);
            table.insert(T::default());
            table
        }

        Self {
            shaders: table(per_kind),
            textures: table(per_kind),
            vertex_buffers: table(per_kind),
            index_buffers: table(per_kind),
            uniform_buffers: table(per_kind),
            uniforms: table(per_kind),
            framebuffers: table(per_kind),
            render_passes: table(per_kind),
            pipelines: table(per_kind),
            names: HashTable::new(),
        }
    }

    pub fn insert<R: Resource>(&mut self, record: R::Record) -> Handle<R> {
        Handle::from_raw(R::table_mut(self).insert(record))
    }

    #[inline]
    pub fn get<R: Resource>(&self, handle: Handle<R>) -> Option<&R::Record> {
        if handle.is_null() {
            return None;
        }
        R::table(self).get(handle.id())
    }

    #[inline]
    pub fn get_mut<R: Resource>(&mut self, handle: Handle<R>) -> Option<&mut R::Record> {
        if handle.is_null() {
            return None;
        }
        R::table_mut(self).get_mut(handle.id())
    }

    #[inline]
    pub fn contains<R: Resource>(&self, handle: Handle<R>) -> bool {
        self.get(handle).is_some()
    }

    pub fn remove<R: Resource>(&mut self, handle: Handle<R>) -> Option<R::Record> {
        if handle.is_null() || !R::table(self).contains(handle.id()) {
            return None;
        }
        R::table_mut(self).remove(handle.id())
    }

    /// Live resources of kind `R`, excluding the sentinel.
    pub fn count<R: Resource>(&self) -> usize {
        R::table(self).len() - 1
    }

    /// Live handles of kind `R` in handle order.
    pub fn handles<R: Resource>(&self) -> impl Iterator<Item = Handle<R>> {
        R::table(self).handles().filter(|&id| id != 0).map(Handle::from_raw)
    }

    /// Forgets every uniform location resolved against `shader`.
    ///
    /// Shader ids are recycled, so a location must not outlive the program it
    /// was queried from.
    pub fn forget_locations(&mut self, shader: Handle<Shader>) {
        for (_, record) in self.uniform_buffers.iter_mut() {
            record.block.forget(shader);
        }
        for (_, record) in self.uniforms.iter_mut() {
            for field in &mut record.fields {
                field.location.forget(shader);
            }
        }
    }

    // ── names ────────────────────────────────────────────────────────────────

    pub fn register_name<R: Resource>(&mut self, name: &str, handle: Handle<R>) {
        if let Some(previous) = self.names.insert(name_key::<R>(name), handle.id()) {
            log::debug!("{:?} name `{name}` rebound from id {previous} to {}", R::KIND, handle.id());
        }
    }

    pub fn unregister_name<R: Resource>(&mut self, name: &str, handle: Handle<R>) {
        let key = name_key::<R>(name);
        if self.names.get(&key) == Some(&handle.id()) {
            self.names.remove(&key);
        }
    }

    /// Resolves a name registered for kind `R` to a live handle.
    pub fn find<R: Resource>(&self, name: &str) -> Option<Handle<R>> {
        let id = *self.names.get(&name_key::<R>(name))?;
        let handle = Handle::from_raw(id);
        self.contains(handle).then_some(handle)
    }
}

#[inline]
fn name_key<R: Resource>(name: &str) -> [u64; 2] {
    [R::KIND as u64, hash_str(name)]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texture(width: u32) -> TextureRecord {
        TextureRecord {
            native: NativeId(width),
            desc: TextureDesc {
                width,
                ..TextureDesc::default()
            },
        }
    }

    #[test]
    fn null_handle_never_resolves() {
        let mut registry = ResourceRegistry::new();
        assert!(registry.get(Handle::<Texture>::NULL).is_none());
        assert!(registry.remove(Handle::<Pipeline>::NULL).is_none());
        assert_eq!(registry.count::<Texture>(), 0);
    }

    #[test]
    fn first_handle_is_one() {
        let mut registry = ResourceRegistry::new();
        let handle: Handle<Texture> = registry.insert(texture(8));
        assert_eq!(handle.id(), 1);
        assert_eq!(registry.get(handle).map(|t| t.desc.width), Some(8));
    }

    #[test]
    fn kinds_are_independent() {
        let mut registry = ResourceRegistry::new();
        let tex: Handle<Texture> = registry.insert(texture(4));
        let pip: Handle<Pipeline> = registry.insert(PipelineRecord::default());

        assert_eq!(tex.id(), pip.id());
        registry.remove(tex);
        assert!(!registry.contains(tex));
        assert!(registry.contains(pip));
    }

    #[test]
    fn removing_last_resource_keeps_sentinel() {
        let mut registry = ResourceRegistry::new();
        let a: Handle<Texture> = registry.insert(texture(1));
        registry.remove(a);

        let b: Handle<Texture> = registry.insert(texture(2));
        assert_eq!(b.id(), 1);
        assert_eq!(registry.count::<Texture>(), 1);
        assert_eq!(registry.handles::<Texture>().collect::<Vec<_>>(), vec![b]);
    }

    #[test]
    fn names_follow_lifetime() {
        let mut registry = ResourceRegistry::new();
        let shader: Handle<Shader> = registry.insert(ShaderRecord::default());
        registry.register_name("sprite", shader);
        assert_eq!(registry.find::<Shader>("sprite"), Some(shader));
        assert_eq!(registry.find::<Uniform>("sprite"), None);

        registry.remove(shader);
        assert_eq!(registry.find::<Shader>("sprite"), None);

        registry.unregister_name("sprite", shader);
        assert_eq!(registry.find::<Shader>("sprite"), None);
    }

    #[test]
    fn location_cache_is_per_shader() {
        let a = Handle::<Shader>::from_raw(1);
        let b = Handle::<Shader>::from_raw(2);
        let cache = LocationCache::Resolved {
            shader: a,
            location: None,
        };

        assert_eq!(cache.lookup(a), Some(None));
        assert_eq!(cache.lookup(b), None);
        assert_eq!(LocationCache::Unresolved.lookup(a), None);
    }

    #[test]
    fn forget_locations_only_drops_matching_shader() {
        let mut registry = ResourceRegistry::new();
        let a: Handle<Shader> = registry.insert(ShaderRecord::default());
        let b: Handle<Shader> = registry.insert(ShaderRecord::default());

        let block: Handle<UniformBuffer> = registry.insert(UniformBufferRecord {
            block: LocationCache::Resolved { shader: a, location: None },
            ..Default::default()
        });
        let uniform: Handle<Uniform> = registry.insert(UniformRecord {
            fields: vec![
                UniformField {
                    location: LocationCache::Resolved { shader: a, location: None },
                    ..Default::default()
                },
                UniformField {
                    location: LocationCache::Resolved { shader: b, location: None },
                    ..Default::default()
                },
            ],
            ..Default::default()
        });

        registry.forget_locations(a);

        assert_eq!(registry.get(block).map(|r| r.block), Some(LocationCache::Unresolved));
        let fields = &registry.get(uniform).unwrap().fields;
        assert_eq!(fields[0].location, LocationCache::Unresolved);
        assert_eq!(fields[1].location.lookup(b), Some(None));
    }
}
