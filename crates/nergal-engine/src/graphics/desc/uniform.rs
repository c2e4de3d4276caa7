use crate::graphics::wire::wire_enum;

wire_enum! {
    #[derive(Default)]
    pub enum UniformKind {
        #[default]
        Float = 0,
        Int = 1,
        Vec2 = 2,
        Vec3 = 3,
        Vec4 = 4,
        Mat4 = 5,
        /// Payload is a texture handle id; the texture is bound to a texture unit.
        Sampler2D = 6,
        /// Payload is a texture handle id; the texture is bound as an RGBA32F image.
        ImageRgba32F = 7,
        /// Declares a uniform block. Carries no payload.
        Block = 8,
    }
}

impl UniformKind {
    /// Payload bytes per element.
    pub const fn size(self) -> usize {
        match self {
            Self::Float | Self::Int | Self::Sampler2D | Self::ImageRgba32F => 4,
            Self::Vec2 => 8,
            Self::Vec3 => 12,
            Self::Vec4 => 16,
            Self::Mat4 => 64,
            Self::Block => 0,
        }
    }
}

/// One field of a uniform.
///
/// `name` is appended to the uniform's name to form the shader-side name,
/// e.g. uniform `u_light` with field `.color` resolves `u_light.color`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformLayoutDesc {
    pub kind: UniformKind,
    pub name: String,
    /// Array length; 1 for scalars.
    pub count: u32,
}

impl UniformLayoutDesc {
    pub fn new(kind: UniformKind) -> Self {
        Self {
            kind,
            name: String::new(),
            count: 1,
        }
    }

    pub fn named(kind: UniformKind, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::new(kind)
        }
    }

    pub fn array(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    pub fn byte_len(&self) -> usize {
        self.kind.size() * self.count as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformDesc {
    pub name: String,
    pub layout: Vec<UniformLayoutDesc>,
}

impl UniformDesc {
    pub fn new(name: impl Into<String>, layout: Vec<UniformLayoutDesc>) -> Self {
        Self {
            name: name.into(),
            layout,
        }
    }

    /// Bytes a bind of this uniform must carry.
    pub fn byte_len(&self) -> usize {
        self.layout.iter().map(UniformLayoutDesc::byte_len).sum()
    }
}

/// Decoded uniform values handed to the backend for upload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformData<'a> {
    Float(&'a [f32]),
    Int(&'a [i32]),
    Vec2(&'a [[f32; 2]]),
    Vec3(&'a [[f32; 3]]),
    Vec4(&'a [[f32; 4]]),
    Mat4(&'a [[f32; 16]]),
    /// Texture units the sampler array reads from.
    Sampler(&'a [i32]),
}

impl UniformData<'_> {
    pub fn kind(&self) -> UniformKind {
        match self {
            Self::Float(_) => UniformKind::Float,
            Self::Int(_) => UniformKind::Int,
            Self::Vec2(_) => UniformKind::Vec2,
            Self::Vec3(_) => UniformKind::Vec3,
            Self::Vec4(_) => UniformKind::Vec4,
            Self::Mat4(_) => UniformKind::Mat4,
            Self::Sampler(_) => UniformKind::Sampler2D,
        }
    }

    /// Raw 32-bit words of the payload.
    pub fn words(&self) -> &[u32] {
        match self {
            Self::Float(v) => bytemuck::cast_slice(*v),
            Self::Int(v) | Self::Sampler(v) => bytemuck::cast_slice(*v),
            Self::Vec2(v) => bytemuck::cast_slice(*v),
            Self::Vec3(v) => bytemuck::cast_slice(*v),
            Self::Vec4(v) => bytemuck::cast_slice(*v),
            Self::Mat4(v) => bytemuck::cast_slice(*v),
        }
    }
}
