use crate::graphics::handle::{Handle, Shader};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthFunc {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StencilFunc {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    #[default]
    Always,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StencilOp {
    #[default]
    Keep,
    Zero,
    Replace,
    Incr,
    IncrWrap,
    Decr,
    DecrWrap,
    Invert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StencilState {
    pub func: StencilFunc,
    pub reference: u32,
    pub comp_mask: u32,
    pub write_mask: u32,
    /// Applied when the stencil test fails.
    pub sfail: StencilOp,
    /// Applied when the stencil test passes and the depth test fails.
    pub dpfail: StencilOp,
    /// Applied when both tests pass.
    pub dppass: StencilOp,
}

impl Default for StencilState {
    fn default() -> Self {
        Self {
            func: StencilFunc::Always,
            reference: 0,
            comp_mask: 0xFF,
            write_mask: 0xFF,
            sfail: StencilOp::Keep,
            dpfail: StencilOp::Keep,
            dppass: StencilOp::Keep,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendEquation {
    #[default]
    Add,
    Subtract,
    ReverseSubtract,
    Min,
    Max,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    DstColor,
    OneMinusDstColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
    ConstantColor,
    OneMinusConstantColor,
    ConstantAlpha,
    OneMinusConstantAlpha,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlendState {
    pub equation: BlendEquation,
    pub src: BlendMode,
    pub dst: BlendMode,
}

impl BlendState {
    /// Non-premultiplied alpha blending.
    pub const ALPHA: Self = Self {
        equation: BlendEquation::Add,
        src: BlendMode::SrcAlpha,
        dst: BlendMode::OneMinusSrcAlpha,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceCulling {
    Front,
    Back,
    FrontAndBack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindingOrder {
    Cw,
    #[default]
    Ccw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrimitiveType {
    Lines,
    #[default]
    Triangles,
    Quads,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexType {
    U8,
    U16,
    U32,
}

impl IndexType {
    pub const fn from_element_size(size: u32) -> Option<Self> {
        match size {
            1 => Some(Self::U8),
            2 => Some(Self::U16),
            4 => Some(Self::U32),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexAttributeFormat {
    Float4,
    Float3,
    Float2,
    Float,
    Uint4,
    Uint3,
    Uint2,
    Uint,
    Byte4,
    Byte3,
    Byte2,
    Byte,
}

impl VertexAttributeFormat {
    pub const fn components(self) -> u32 {
        match self {
            Self::Float4 | Self::Uint4 | Self::Byte4 => 4,
            Self::Float3 | Self::Uint3 | Self::Byte3 => 3,
            Self::Float2 | Self::Uint2 | Self::Byte2 => 2,
            Self::Float | Self::Uint | Self::Byte => 1,
        }
    }

    pub const fn size(self) -> usize {
        let component = match self {
            Self::Byte4 | Self::Byte3 | Self::Byte2 | Self::Byte => 1,
            _ => 4,
        };
        component * self.components() as usize
    }
}

/// One vertex attribute of a pipeline layout.
///
/// A zero `stride` means attributes are tightly packed in layout order and
/// `offset` is computed; a non-zero `stride` uses `stride`/`offset` as given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexAttributeDesc {
    pub name: String,
    pub format: VertexAttributeFormat,
    pub stride: usize,
    pub offset: usize,
    /// Instance step rate; 0 advances per vertex.
    pub divisor: u32,
    /// Which bound vertex buffer feeds this attribute.
    pub buffer_index: u32,
}

impl VertexAttributeDesc {
    pub fn new(name: impl Into<String>, format: VertexAttributeFormat) -> Self {
        Self {
            name: name.into(),
            format,
            stride: 0,
            offset: 0,
            divisor: 0,
            buffer_index: 0,
        }
    }

    pub fn per_instance(mut self, divisor: u32) -> Self {
        self.divisor = divisor;
        self
    }

    pub fn from_buffer(mut self, buffer_index: u32) -> Self {
        self.buffer_index = buffer_index;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RasterState {
    pub cull: Option<FaceCulling>,
    pub winding: WindingOrder,
    pub primitive: PrimitiveType,
    pub shader: Handle<Shader>,
    /// Index size used by indexed draws; 0 defers to the bound index buffer.
    pub index_element_size: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ComputeState {
    pub shader: Handle<Shader>,
}

/// Complete fixed-function + program state bound by one pipeline.
///
/// `None` disables the corresponding test or stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineDesc {
    pub blend: Option<BlendState>,
    pub depth: Option<DepthFunc>,
    pub stencil: Option<StencilState>,
    pub raster: RasterState,
    pub compute: Option<ComputeState>,
    pub layout: Vec<VertexAttributeDesc>,
}

impl PipelineDesc {
    #[inline]
    pub fn is_compute(&self) -> bool {
        self.compute.is_some()
    }

    /// Program the pipeline runs.
    pub fn shader(&self) -> Handle<Shader> {
        match &self.compute {
            Some(compute) => compute.shader,
            None => self.raster.shader,
        }
    }

    /// Stride of the layout when every attribute is tightly packed.
    pub fn packed_stride(&self) -> usize {
        self.layout.iter().map(|attr| attr.format.size()).sum()
    }

    /// Whether draws with this layout step any attribute per instance.
    pub fn has_instanced_attributes(&self) -> bool {
        self.layout.iter().any(|attr| attr.divisor != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_sizes() {
        assert_eq!(VertexAttributeFormat::Float3.size(), 12);
        assert_eq!(VertexAttributeFormat::Uint2.size(), 8);
        assert_eq!(VertexAttributeFormat::Byte4.size(), 4);
        assert_eq!(VertexAttributeFormat::Byte.size(), 1);
    }

    #[test]
    fn packed_stride_sums_layout() {
        let desc = PipelineDesc {
            layout: vec![
                VertexAttributeDesc::new("a_pos", VertexAttributeFormat::Float3),
                VertexAttributeDesc::new("a_uv", VertexAttributeFormat::Float2),
                VertexAttributeDesc::new("a_color", VertexAttributeFormat::Byte4),
            ],
            ..PipelineDesc::default()
        };
        assert_eq!(desc.packed_stride(), 24);
        assert!(!desc.has_instanced_attributes());
    }

    #[test]
    fn compute_pipeline_reports_compute_shader() {
        let desc = PipelineDesc {
            compute: Some(ComputeState {
                shader: Handle::from_raw(5),
            }),
            ..PipelineDesc::default()
        };
        assert!(desc.is_compute());
        assert_eq!(desc.shader().id(), 5);
    }

    #[test]
    fn index_type_from_size() {
        assert_eq!(IndexType::from_element_size(2), Some(IndexType::U16));
        assert_eq!(IndexType::from_element_size(3), None);
    }
}
