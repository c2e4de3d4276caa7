use anyhow::{Context, Result};
use nergal_collections::{SlotMap, hash_str};
use nergal_engine::graphics::backend::GraphicsBackend;
use nergal_engine::graphics::{
    BindDesc, BlendState, BufferTarget, BufferUpdate, BufferUpdateDesc, BufferUsage, ClearAction,
    CommandBuffer, ComputeState, DepthFunc, DrawDesc, GraphicsContext, Handle, ImageBufferBinding,
    IndexBuffer, IndexBufferDesc, Pipeline, PipelineDesc, PixelRect, RasterState, RenderPass,
    RenderPassDesc, ShaderDesc, ShaderStage, Texture, TextureDesc, TextureFormat, Uniform,
    UniformBinding, UniformDesc, UniformKind, UniformLayoutDesc, VertexAttributeDesc,
    VertexAttributeFormat, VertexBuffer, VertexBufferBinding, VertexBufferDesc,
};

const SPRITE_VS: &str = "\
layout(location = 0) in vec2 a_pos;
layout(location = 1) in vec2 a_uv;
uniform mat4 u_mvp;
out vec2 v_uv;
void main() { v_uv = a_uv; gl_Position = u_mvp * vec4(a_pos, 0.0, 1.0); }
";

const SPRITE_FS: &str = "\
in vec2 v_uv;
uniform sampler2D u_albedo;
uniform vec4 u_tint;
out vec4 o_color;
void main() { o_color = texture(u_albedo, v_uv) * u_tint; }
";

const BLUR_CS: &str = "\
layout(local_size_x = 8, local_size_y = 8) in;
layout(rgba32f) uniform image2D u_target;
void main() {}
";

pub const TARGET_SIZE: u32 = 64;

/// Geometry drawn by the sprite system.
#[derive(Debug, Clone, Copy)]
pub struct Mesh {
    pub vertices: Handle<VertexBuffer>,
    pub indices: Handle<IndexBuffer>,
    pub index_count: u32,
}

/// Resources shared by the demo systems.
pub struct Scene {
    meshes: SlotMap<u64, Mesh>,
    sprite: Handle<Pipeline>,
    blur: Handle<Pipeline>,
    offscreen: Handle<RenderPass>,
    target: Handle<Texture>,
    checker: Handle<Texture>,
    material: Handle<Uniform>,
}

impl Scene {
    pub fn build<B: GraphicsBackend>(gfx: &mut GraphicsContext<B>) -> Result<Self> {
        let sprite_shader = gfx
            .create_shader(
                &ShaderDesc::new("sprite")
                    .with_stage(ShaderStage::Vertex, SPRITE_VS)
                    .with_stage(ShaderStage::Fragment, SPRITE_FS),
            )
            .context("sprite shader")?;
        let blur_shader = gfx
            .create_shader(&ShaderDesc::new("blur").with_stage(ShaderStage::Compute, BLUR_CS))
            .context("blur shader")?;

        let sprite = gfx.create_pipeline(&PipelineDesc {
            blend: Some(BlendState::ALPHA),
            depth: Some(DepthFunc::LessEqual),
            raster: RasterState {
                shader: sprite_shader,
                ..RasterState::default()
            },
            layout: vec![
                VertexAttributeDesc::new("a_pos", VertexAttributeFormat::Float2),
                VertexAttributeDesc::new("a_uv", VertexAttributeFormat::Float2),
            ],
            ..PipelineDesc::default()
        })?;
        let blur = gfx.create_pipeline(&PipelineDesc {
            compute: Some(ComputeState { shader: blur_shader }),
            ..PipelineDesc::default()
        })?;

        let checker = gfx.create_texture(&TextureDesc::new(2, 2, TextureFormat::Rgba8), Some(&checker_pixels(0)))?;
        let target = gfx.create_texture(
            &TextureDesc {
                render_target: true,
                ..TextureDesc::new(TARGET_SIZE, TARGET_SIZE, TextureFormat::Rgba32F)
            },
            None,
        )?;
        let framebuffer = gfx.create_framebuffer();
        let offscreen = gfx.create_render_pass(&RenderPassDesc {
            framebuffer,
            color: vec![target],
            ..RenderPassDesc::default()
        });

        let material = gfx.create_uniform(&UniformDesc::new(
            "u_",
            vec![
                UniformLayoutDesc::named(UniformKind::Mat4, "mvp"),
                UniformLayoutDesc::named(UniformKind::Vec4, "tint"),
                UniformLayoutDesc::named(UniformKind::Sampler2D, "albedo"),
            ],
        ))?;

        let mut meshes = SlotMap::new();
        meshes.insert(hash_str("quad"), mesh(gfx, &quad(0.5))?);
        meshes.insert(hash_str("banner"), mesh(gfx, &quad(0.9))?);

        log::info!("scene ready: {} meshes", meshes.len());
        Ok(Self {
            meshes,
            sprite,
            blur,
            offscreen,
            target,
            checker,
            material,
        })
    }

    /// Records one frame. Each system appends to the same buffer in call order.
    pub fn record_frame(&self, cb: &mut CommandBuffer, frame: u32) {
        self.upload_system(cb, frame);
        self.sprite_system(cb, frame);
        self.compute_system(cb);
    }

    fn upload_system(&self, cb: &mut CommandBuffer, frame: u32) {
        cb.request_texture_update(self.checker, &TextureDesc::new(2, 2, TextureFormat::Rgba8), &checker_pixels(frame));
        if let Some(banner) = self.meshes.get(&hash_str("banner")) {
            let scale = 0.5 + 0.1 * frame as f32;
            cb.request_buffer_update(
                BufferTarget::Vertex(banner.vertices),
                &BufferUpdateDesc {
                    data: bytemuck::cast_slice(&quad(scale)),
                    usage: BufferUsage::Dynamic,
                    update: BufferUpdate::SubData { offset: 0 },
                },
            );
        }
    }

    fn sprite_system(&self, cb: &mut CommandBuffer, frame: u32) {
        let clears = [ClearAction::color([0.05, 0.05, 0.08, 1.0]), ClearAction::depth(1.0)];
        cb.begin_render_pass(self.offscreen, &clears);
        cb.set_viewport(PixelRect::new(0, 0, TARGET_SIZE, TARGET_SIZE));

        for (index, mesh) in self.meshes.values().iter().enumerate() {
            let uniforms = MaterialBlock::new(frame, index, self.checker);
            cb.bind_pipeline(self.sprite);
            cb.apply_bindings(&BindDesc {
                vertex_buffers: &[VertexBufferBinding::new(mesh.vertices)],
                index_buffer: Some(mesh.indices),
                uniforms: &[UniformBinding {
                    uniform: self.material,
                    binding: 0,
                    data: bytemuck::bytes_of(&uniforms),
                }],
                ..BindDesc::default()
            });
            cb.draw(&DrawDesc::new(0, mesh.index_count));
        }

        cb.end_render_pass();
    }

    fn compute_system(&self, cb: &mut CommandBuffer) {
        let groups = TARGET_SIZE.div_ceil(8);
        cb.bind_pipeline(self.blur);
        cb.apply_bindings(&BindDesc {
            image_buffers: &[ImageBufferBinding {
                texture: self.target,
                binding: 0,
                ..ImageBufferBinding::default()
            }],
            ..BindDesc::default()
        });
        cb.dispatch_compute(groups, groups, 1);
    }

    /// Destroys the checker texture while recorded frames still reference it.
    pub fn drop_checker<B: GraphicsBackend>(&self, gfx: &mut GraphicsContext<B>) {
        gfx.destroy_texture(self.checker);
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }
}

/// `u_mvp`, `u_tint` and `u_albedo` packed as the material uniform expects.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::NoUninit)]
struct MaterialBlock {
    mvp: [f32; 16],
    tint: [f32; 4],
    albedo: u32,
}

impl MaterialBlock {
    fn new(frame: u32, index: usize, albedo: Handle<Texture>) -> Self {
        let offset = index as f32 * 0.25;
        let mut mvp = [0.0; 16];
        for i in 0..4 {
            mvp[i * 5] = 1.0;
        }
        mvp[12] = offset;

        let pulse = (frame % 4) as f32 / 4.0;
        Self {
            mvp,
            tint: [1.0, pulse, 1.0 - pulse, 1.0],
            albedo: albedo.id(),
        }
    }
}

fn quad(half: f32) -> [[f32; 4]; 4] {
    [
        [-half, -half, 0.0, 0.0],
        [half, -half, 1.0, 0.0],
        [half, half, 1.0, 1.0],
        [-half, half, 0.0, 1.0],
    ]
}

fn mesh<B: GraphicsBackend>(gfx: &mut GraphicsContext<B>, vertices: &[[f32; 4]; 4]) -> Result<Mesh> {
    const INDICES: [u16; 6] = [0, 1, 2, 2, 3, 0];

    let vertices = gfx.create_vertex_buffer(&VertexBufferDesc {
        usage: BufferUsage::Dynamic,
        ..VertexBufferDesc::with_data(bytemuck::cast_slice(vertices))
    })?;
    let indices = gfx.create_index_buffer(&IndexBufferDesc::with_data(bytemuck::cast_slice(&INDICES), 2))?;
    Ok(Mesh {
        vertices,
        indices,
        index_count: INDICES.len() as u32,
    })
}

fn checker_pixels(frame: u32) -> [u8; 16] {
    let (a, b) = if frame % 2 == 0 { (255, 32) } else { (32, 255) };
    [a, a, a, 255, b, b, b, 255, b, b, b, 255, a, a, a, 255]
}
