use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Typed handle into one of the registry's slot tables.
///
/// Id 0 addresses the sentinel record every table is created with, so a
/// zero-valued handle never refers to a live resource.
pub struct Handle<T> {
    id: u32,
    marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    pub const NULL: Self = Self::from_raw(0);

    #[inline]
    pub const fn from_raw(id: u32) -> Self {
        Self {
            id,
            marker: PhantomData,
        }
    }

    #[inline]
    pub const fn id(self) -> u32 {
        self.id
    }

    #[inline]
    pub const fn is_null(self) -> bool {
        self.id == 0
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> Default for Handle<T> {
    fn default() -> Self {
        Self::NULL
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = std::any::type_name::<T>().rsplit("::").next().unwrap_or("?");
        write!(f, "Handle<{name}>({})", self.id)
    }
}

// Marker types naming each resource kind. They are never instantiated.

pub enum Shader {}
pub enum Texture {}
pub enum VertexBuffer {}
pub enum IndexBuffer {}
pub enum UniformBuffer {}
pub enum Uniform {}
pub enum Framebuffer {}
pub enum RenderPass {}
pub enum Pipeline {}
