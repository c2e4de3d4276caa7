use nergal_collections::ByteBuffer;

use crate::graphics::GraphicsError;
use crate::graphics::wire::wire_enum;

wire_enum! {
    #[derive(Default)]
    pub enum TextureFormat {
        #[default]
        Rgba8 = 0,
        Rgb8 = 1,
        Rgba16F = 2,
        Rgba32F = 3,
        A8 = 4,
        R8 = 5,
        Depth8 = 6,
        Depth16 = 7,
        Depth24 = 8,
        Depth32F = 9,
        Depth24Stencil8 = 10,
        Depth32FStencil8 = 11,
        Stencil8 = 12,
    }
}

impl TextureFormat {
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::A8 | Self::R8 | Self::Depth8 | Self::Stencil8 => 1,
            Self::Depth16 => 2,
            Self::Rgb8 | Self::Depth24 => 3,
            Self::Rgba8 | Self::Depth32F | Self::Depth24Stencil8 => 4,
            Self::Rgba16F | Self::Depth32FStencil8 => 8,
            Self::Rgba32F => 16,
        }
    }
}

wire_enum! {
    #[derive(Default)]
    pub enum TextureWrap {
        #[default]
        Repeat = 0,
        MirroredRepeat = 1,
        ClampToEdge = 2,
        ClampToBorder = 3,
    }
}

wire_enum! {
    #[derive(Default)]
    pub enum TextureFilter {
        Nearest = 0,
        #[default]
        Linear = 1,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub wrap_s: TextureWrap,
    pub wrap_t: TextureWrap,
    pub min_filter: TextureFilter,
    pub mag_filter: TextureFilter,
    pub mip_filter: TextureFilter,
    /// Mip levels to allocate; 0 means no mip chain.
    pub num_mips: u32,
    /// Usable as a framebuffer attachment.
    pub render_target: bool,
}

impl TextureDesc {
    pub fn new(width: u32, height: u32, format: TextureFormat) -> Self {
        Self {
            width,
            height,
            format,
            ..Self::default()
        }
    }

    /// Byte length of the base level.
    pub fn byte_len(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }

    pub(crate) fn encode(&self, out: &mut ByteBuffer) {
        out.write(self.width);
        out.write(self.height);
        out.write(self.format.to_wire());
        out.write(self.wrap_s.to_wire());
        out.write(self.wrap_t.to_wire());
        out.write(self.min_filter.to_wire());
        out.write(self.mag_filter.to_wire());
        out.write(self.mip_filter.to_wire());
        out.write(self.num_mips);
        out.write(u32::from(self.render_target));
    }

    pub(crate) fn decode(input: &mut ByteBuffer) -> Result<Self, GraphicsError> {
        Ok(Self {
            width: input.read()?,
            height: input.read()?,
            format: TextureFormat::try_from(input.read::<u32>()?)?,
            wrap_s: TextureWrap::try_from(input.read::<u32>()?)?,
            wrap_t: TextureWrap::try_from(input.read::<u32>()?)?,
            min_filter: TextureFilter::try_from(input.read::<u32>()?)?,
            mag_filter: TextureFilter::try_from(input.read::<u32>()?)?,
            mip_filter: TextureFilter::try_from(input.read::<u32>()?)?,
            num_mips: input.read()?,
            render_target: input.read::<u32>()? != 0,
        })
    }
}
