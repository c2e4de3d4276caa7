use super::*;
use crate::graphics::backend::{DrawArrays, NativeId, TraceBackend, TraceCall, VertexAttributeBinding};
use crate::graphics::{
    Attachment, BindDesc, BufferTarget, BufferUpdate, BufferUpdateDesc, BufferUsage, ClearAction,
    ComputeState, DrawDesc, GraphicsConfig, Handle, IndexBufferDesc, IndexType, Pipeline,
    PipelineDesc, PixelRect, PrimitiveType, RasterState, RenderPassDesc, Shader, ShaderDesc,
    ShaderStage, TextureDesc, TextureFormat, UniformBinding, UniformBufferBinding,
    UniformBufferDesc, UniformDesc, UniformKind, UniformLayoutDesc, VertexAttributeDesc,
    VertexAttributeFormat, VertexBuffer, VertexBufferBinding, VertexBufferDesc,
};

struct Scene {
    gfx: GraphicsContext<TraceBackend>,
    shader: Handle<Shader>,
    pipeline: Handle<Pipeline>,
    vbo: Handle<VertexBuffer>,
}

fn flat_pipeline(gfx: &mut GraphicsContext<TraceBackend>, name: &str) -> (Handle<Shader>, Handle<Pipeline>) {
    let shader = gfx
        .create_shader(
            &ShaderDesc::new(name)
                .with_stage(ShaderStage::Vertex, "void main() {}")
                .with_stage(ShaderStage::Fragment, "void main() {}"),
        )
        .unwrap();
    let pipeline = gfx
        .create_pipeline(&PipelineDesc {
            raster: RasterState {
                shader,
                ..RasterState::default()
            },
            layout: vec![VertexAttributeDesc::new("a_pos", VertexAttributeFormat::Float3)],
            ..PipelineDesc::default()
        })
        .unwrap();
    (shader, pipeline)
}

fn scene_with(backend: TraceBackend, config: GraphicsConfig) -> Scene {
    let mut gfx = GraphicsContext::new(backend, config);
    let (shader, pipeline) = flat_pipeline(&mut gfx, "flat");
    let vbo = gfx.create_vertex_buffer(&VertexBufferDesc::with_data(&[0; 72])).unwrap();

    gfx.backend_mut().clear_calls();
    Scene { gfx, shader, pipeline, vbo }
}

fn scene() -> Scene {
    scene_with(TraceBackend::new(), GraphicsConfig::default())
}

fn program(gfx: &GraphicsContext<TraceBackend>, shader: Handle<Shader>) -> NativeId {
    gfx.registry().get(shader).unwrap().program
}

fn record_triangle(cb: &mut CommandBuffer, pipeline: Handle<Pipeline>, vbo: Handle<VertexBuffer>) {
    cb.bind_pipeline(pipeline);
    cb.apply_bindings(&BindDesc {
        vertex_buffers: &[VertexBufferBinding::new(vbo)],
        ..BindDesc::default()
    });
    cb.draw(&DrawDesc::new(0, 6));
}

// ── ordering and reuse ───────────────────────────────────────────────────────

#[test]
fn commands_execute_in_recorded_order() {
    let Scene { mut gfx, shader, pipeline, vbo } = scene();
    let vbo_native = gfx.registry().get(vbo).unwrap().native;

    let mut cb = gfx.command_buffer();
    record_triangle(&mut cb, pipeline, vbo);
    let stats = gfx.submit(&mut cb).unwrap();

    let core: Vec<TraceCall> = gfx
        .backend()
        .calls()
        .iter()
        .filter(|call| {
            matches!(
                call,
                TraceCall::UseProgram(_) | TraceCall::BindVertexBuffer { .. } | TraceCall::DrawArrays(_)
            )
        })
        .cloned()
        .collect();

    assert_eq!(
        core,
        vec![
            TraceCall::UseProgram(program(&gfx, shader)),
            TraceCall::BindVertexBuffer {
                slot: 0,
                buffer: vbo_native,
                offset: 0,
            },
            TraceCall::DrawArrays(DrawArrays {
                primitive: PrimitiveType::Triangles,
                first: 0,
                count: 6,
                instances: 1,
                instanced: false,
            }),
        ]
    );
    assert_eq!(stats.commands, 3);
    assert_eq!(stats.draws, 1);
    assert_eq!(stats.skipped, 0);
    assert!(cb.is_empty());
}

#[test]
fn buffer_is_reusable_after_submit() {
    let Scene { mut gfx, pipeline, vbo, .. } = scene();
    let mut cb = gfx.command_buffer();

    for _ in 0..3 {
        record_triangle(&mut cb, pipeline, vbo);
        assert_eq!(cb.len(), 3);
        assert_eq!(gfx.submit(&mut cb).unwrap().draws, 1);
        assert_eq!(cb.len(), 0);
        assert_eq!(cb.byte_len(), 0);
    }
    assert_eq!(gfx.backend().count(|call| matches!(call, TraceCall::DrawArrays(_))), 3);
    assert_eq!(gfx.backend().count(|call| matches!(call, TraceCall::UseProgram(_))), 3);
}

#[test]
fn recycled_pipeline_handle_is_rebound() {
    let Scene { mut gfx, shader, pipeline, vbo } = scene();
    let mut cb = gfx.command_buffer();
    record_triangle(&mut cb, pipeline, vbo);
    gfx.submit(&mut cb).unwrap();

    assert!(gfx.destroy_pipeline(pipeline));
    assert!(gfx.destroy_shader(shader));
    let (shader2, pipeline2) = flat_pipeline(&mut gfx, "flat2");
    assert_eq!(pipeline2, pipeline);
    assert_eq!(shader2, shader);
    gfx.backend_mut().clear_calls();

    record_triangle(&mut cb, pipeline2, vbo);
    let stats = gfx.submit(&mut cb).unwrap();

    assert_eq!(stats.elided_pipeline_binds, 0);
    assert_eq!(stats.draws, 1);
    assert_eq!(
        gfx.backend().calls().iter().find(|call| matches!(call, TraceCall::UseProgram(_))),
        Some(&TraceCall::UseProgram(program(&gfx, shader2)))
    );
}

#[test]
fn failed_submit_still_clears_buffer() {
    let Scene { mut gfx, .. } = scene();
    let mut cb = gfx.command_buffer();
    cb.draw(&DrawDesc::new(0, 3));

    assert!(gfx.submit(&mut cb).is_err());
    assert!(cb.is_empty());
}

// ── failure policy ───────────────────────────────────────────────────────────

#[test]
fn stale_handles_degrade_to_no_ops() {
    let Scene { mut gfx, pipeline, vbo, .. } = scene();
    assert!(gfx.destroy_vertex_buffer(vbo));
    gfx.backend_mut().clear_calls();

    let mut cb = gfx.command_buffer();
    record_triangle(&mut cb, pipeline, vbo);
    cb.set_viewport(PixelRect::new(0, 0, 320, 240));
    let stats = gfx.submit(&mut cb).unwrap();

    // The vertex buffer bind and the draw that needed it.
    assert_eq!(stats.skipped, 2);
    assert_eq!(gfx.throttle.hits("bind_vertex_buffer"), 1);
    assert_eq!(gfx.throttle.hits("draw_vertices"), 1);
    assert_eq!(stats.commands, 4);
    assert_eq!(stats.draws, 0);
    assert_eq!(gfx.backend().count(|call| matches!(call, TraceCall::DrawArrays(_))), 0);
    assert!(matches!(
        gfx.backend().calls().last(),
        Some(TraceCall::Viewport(rect)) if rect.width == 320
    ));
}

#[test]
fn draw_without_pipeline_is_invalid_state() {
    let Scene { mut gfx, vbo, .. } = scene();
    let mut cb = gfx.command_buffer();
    cb.apply_bindings(&BindDesc {
        vertex_buffers: &[VertexBufferBinding::new(vbo)],
        ..BindDesc::default()
    });
    cb.draw(&DrawDesc::new(0, 3));

    assert!(matches!(gfx.submit(&mut cb), Err(GraphicsError::InvalidState(_))));
}

#[test]
fn stale_pipeline_skips_draws() {
    let Scene { mut gfx, vbo, .. } = scene();
    let mut cb = gfx.command_buffer();
    record_triangle(&mut cb, Handle::from_raw(99), vbo);

    let stats = gfx.submit(&mut cb).unwrap();
    assert_eq!(stats.skipped, 2);
    assert_eq!(gfx.cache().pipeline, PipelineBinding::Stale(99));
    assert_eq!(gfx.backend().count(|call| matches!(call, TraceCall::DrawArrays(_))), 0);
}

#[test]
fn unknown_opcode_is_reported() {
    let Scene { mut gfx, .. } = scene();
    let mut cb = gfx.command_buffer();
    cb.write_command(Opcode::SetViewport, |out| {
        out.write([0u32, 0, 8, 8]);
        out.write(77u32);
    });
    cb.set_viewport(PixelRect::new(0, 0, 16, 16));

    let err = gfx.submit(&mut cb).unwrap_err();
    assert!(matches!(err, GraphicsError::UnknownOpcode { index: 1, opcode: 77 }));
}

#[test]
fn truncated_payload_is_corrupt() {
    let Scene { mut gfx, .. } = scene();
    let mut cb = gfx.command_buffer();
    cb.write_command(Opcode::Draw, |out| out.write(0u32));

    assert!(matches!(gfx.submit(&mut cb), Err(GraphicsError::CorruptStream(_))));
}

#[test]
fn invalid_enum_in_payload_is_reported() {
    let Scene { mut gfx, .. } = scene();
    let mut cb = gfx.command_buffer();
    cb.write_command(Opcode::BindBindings, |out| {
        out.write(1u32);
        out.write(0u32);
        out.write(42u32);
    });

    assert!(matches!(
        gfx.submit(&mut cb),
        Err(GraphicsError::InvalidEnum { what: "BindKind", value: 42 })
    ));
}

// ── render passes ────────────────────────────────────────────────────────────

#[test]
fn pass_nesting_is_checked() {
    let Scene { mut gfx, .. } = scene();
    let mut cb = gfx.command_buffer();
    cb.begin_render_pass(Handle::NULL, &[]);
    cb.begin_render_pass(Handle::NULL, &[]);
    assert!(matches!(gfx.submit(&mut cb), Err(GraphicsError::InvalidState(_))));

    cb.end_render_pass();
    assert!(matches!(gfx.submit(&mut cb), Err(GraphicsError::InvalidState(_))));
}

#[test]
fn open_pass_is_closed_at_end_of_submit() {
    let Scene { mut gfx, .. } = scene();
    let mut cb = gfx.command_buffer();
    cb.begin_render_pass(Handle::NULL, &[]);
    gfx.submit(&mut cb).unwrap();

    let calls = gfx.backend().calls();
    assert_eq!(
        &calls[calls.len() - 2..],
        &[TraceCall::ResetState, TraceCall::BindFramebuffer(None)]
    );

    cb.begin_render_pass(Handle::NULL, &[]);
    cb.end_render_pass();
    assert_eq!(gfx.submit(&mut cb).unwrap().commands, 2);
}

#[test]
fn pass_binds_target_and_clears() {
    let Scene { mut gfx, .. } = scene();
    let color_desc = TextureDesc {
        render_target: true,
        ..TextureDesc::new(64, 64, TextureFormat::Rgba8)
    };
    let depth_desc = TextureDesc {
        render_target: true,
        ..TextureDesc::new(64, 64, TextureFormat::Depth24Stencil8)
    };
    let color = gfx.create_texture(&color_desc, None).unwrap();
    let depth = gfx.create_texture(&depth_desc, None).unwrap();
    let framebuffer = gfx.create_framebuffer();
    let pass = gfx.create_render_pass(&RenderPassDesc {
        framebuffer,
        color: vec![color],
        depth,
        stencil: depth,
    });
    gfx.backend_mut().clear_calls();

    let mut cb = gfx.command_buffer();
    cb.begin_render_pass(pass, &[ClearAction::color([0.1, 0.2, 0.3, 1.0])]);
    cb.end_render_pass();
    gfx.submit(&mut cb).unwrap();

    let calls = gfx.backend().calls().to_vec();
    let fb_native = gfx.registry().get(framebuffer).unwrap().native;
    let color_native = gfx.registry().get(color).unwrap().native;
    let depth_native = gfx.registry().get(depth).unwrap().native;

    assert_eq!(calls[0], TraceCall::BindFramebuffer(Some(fb_native)));
    assert_eq!(
        calls[1],
        TraceCall::AttachTexture {
            attachment: Attachment::Color(0),
            texture: color_native,
        }
    );
    assert_eq!(
        calls[2],
        TraceCall::AttachTexture {
            attachment: Attachment::DepthStencil,
            texture: depth_native,
        }
    );
    assert!(matches!(
        &calls[3],
        TraceCall::Clear(values) if values.color == Some([0.1, 0.2, 0.3, 1.0]) && values.depth.is_none()
    ));
    assert_eq!(&calls[4..], &[TraceCall::ResetState, TraceCall::BindFramebuffer(None)]);
}

#[test]
fn unknown_pass_still_consumes_clears() {
    let Scene { mut gfx, .. } = scene();
    let mut cb = gfx.command_buffer();
    cb.begin_render_pass(Handle::from_raw(12), &[ClearAction::default(), ClearAction::depth(0.0)]);
    cb.end_render_pass();

    let stats = gfx.submit(&mut cb).unwrap();
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.commands, 2);
    assert_eq!(gfx.backend().count(|call| matches!(call, TraceCall::Clear(_))), 0);
}

// ── pipelines ────────────────────────────────────────────────────────────────

#[test]
fn redundant_pipeline_bind_is_elided() {
    let Scene { mut gfx, pipeline, .. } = scene();
    let mut cb = gfx.command_buffer();
    cb.bind_pipeline(pipeline);
    cb.bind_pipeline(pipeline);

    let stats = gfx.submit(&mut cb).unwrap();
    assert_eq!(stats.elided_pipeline_binds, 1);
    assert_eq!(gfx.backend().count(|call| matches!(call, TraceCall::UseProgram(_))), 1);
    assert_eq!(gfx.cache().pipeline, PipelineBinding::Bound(pipeline));
}

#[test]
fn elision_can_be_disabled() {
    let config = GraphicsConfig {
        elide_redundant_pipeline_binds: false,
        ..GraphicsConfig::default()
    };
    let Scene { mut gfx, pipeline, .. } = scene_with(TraceBackend::new(), config);
    let mut cb = gfx.command_buffer();
    cb.bind_pipeline(pipeline);
    cb.bind_pipeline(pipeline);

    let stats = gfx.submit(&mut cb).unwrap();
    assert_eq!(stats.elided_pipeline_binds, 0);
    assert_eq!(gfx.backend().count(|call| matches!(call, TraceCall::UseProgram(_))), 2);
}

#[test]
fn pipeline_bind_resets_vertex_bindings() {
    let Scene { mut gfx, pipeline, vbo, .. } = scene();
    let mut cb = gfx.command_buffer();
    cb.apply_bindings(&BindDesc {
        vertex_buffers: &[VertexBufferBinding::new(vbo)],
        ..BindDesc::default()
    });
    cb.bind_pipeline(pipeline);
    cb.draw(&DrawDesc::new(0, 3));

    let stats = gfx.submit(&mut cb).unwrap();
    assert_eq!(stats.draws, 0);
    assert_eq!(stats.skipped, 1);
}

#[test]
fn interleaved_layout_is_packed() {
    let mut gfx = GraphicsContext::new(TraceBackend::new(), GraphicsConfig::default());
    let shader = gfx
        .create_shader(&ShaderDesc::new("lit").with_stage(ShaderStage::Vertex, "void main() {}"))
        .unwrap();
    let pipeline = gfx
        .create_pipeline(&PipelineDesc {
            raster: RasterState {
                shader,
                ..RasterState::default()
            },
            layout: vec![
                VertexAttributeDesc::new("a_pos", VertexAttributeFormat::Float3),
                VertexAttributeDesc::new("a_uv", VertexAttributeFormat::Float2),
            ],
            ..PipelineDesc::default()
        })
        .unwrap();
    let vbo = gfx.create_vertex_buffer(&VertexBufferDesc::with_data(&[0; 60])).unwrap();
    let vbo_native = gfx.registry().get(vbo).unwrap().native;

    let mut cb = gfx.command_buffer();
    cb.bind_pipeline(pipeline);
    cb.apply_bindings(&BindDesc {
        vertex_buffers: &[VertexBufferBinding {
            offset: 8,
            ..VertexBufferBinding::new(vbo)
        }],
        ..BindDesc::default()
    });
    cb.draw(&DrawDesc::new(0, 3));
    gfx.submit(&mut cb).unwrap();

    let attributes: Vec<(u32, VertexAttributeBinding)> = gfx
        .backend()
        .calls()
        .iter()
        .filter_map(|call| match call {
            TraceCall::VertexAttribute { index, binding } => Some((*index, *binding)),
            _ => None,
        })
        .collect();

    assert_eq!(attributes.len(), 2);
    assert_eq!(attributes[0].1.buffer, vbo_native);
    assert_eq!((attributes[0].1.stride, attributes[0].1.offset), (20, 8));
    assert_eq!((attributes[1].0, attributes[1].1.stride, attributes[1].1.offset), (1, 20, 20));
}

#[test]
fn indexed_draw_uses_buffer_element_size() {
    let Scene { mut gfx, pipeline, vbo, .. } = scene();
    let ibo = gfx.create_index_buffer(&IndexBufferDesc::with_data(&[0; 12], 2)).unwrap();

    let mut cb = gfx.command_buffer();
    cb.bind_pipeline(pipeline);
    cb.apply_bindings(&BindDesc {
        vertex_buffers: &[VertexBufferBinding::new(vbo)],
        index_buffer: Some(ibo),
        ..BindDesc::default()
    });
    cb.draw(&DrawDesc::new(0, 6).instanced(4));
    gfx.submit(&mut cb).unwrap();

    let Some(TraceCall::DrawIndexed(draw)) = gfx.backend().calls().last() else {
        panic!("expected an indexed draw");
    };
    assert_eq!(draw.index_type, IndexType::U16);
    assert_eq!(draw.instances, 4);
    assert!(draw.instanced);
    assert_eq!(gfx.cache().index_buffer, Some(ibo));
}

#[test]
fn compute_dispatch_binds_only_program() {
    let mut gfx = GraphicsContext::new(TraceBackend::new(), GraphicsConfig::default());
    let shader = gfx
        .create_shader(&ShaderDesc::new("blur").with_stage(ShaderStage::Compute, "void main() {}"))
        .unwrap();
    let pipeline = gfx
        .create_pipeline(&PipelineDesc {
            compute: Some(ComputeState { shader }),
            ..PipelineDesc::default()
        })
        .unwrap();
    gfx.backend_mut().clear_calls();

    let mut cb = gfx.command_buffer();
    cb.bind_pipeline(pipeline);
    cb.dispatch_compute(8, 4, 1);
    let stats = gfx.submit(&mut cb).unwrap();

    assert_eq!(stats.dispatches, 1);
    assert_eq!(
        gfx.backend().calls(),
        &[
            TraceCall::UseProgram(program(&gfx, shader)),
            TraceCall::DispatchCompute([8, 4, 1]),
        ]
    );
}

#[test]
fn dispatch_with_graphics_pipeline_is_invalid_state() {
    let Scene { mut gfx, pipeline, .. } = scene();
    let mut cb = gfx.command_buffer();
    cb.bind_pipeline(pipeline);
    cb.dispatch_compute(1, 1, 1);

    assert!(matches!(gfx.submit(&mut cb), Err(GraphicsError::InvalidState(_))));
}

// ── uniforms ─────────────────────────────────────────────────────────────────

fn tint_uniform(gfx: &mut GraphicsContext<TraceBackend>) -> Handle<crate::graphics::Uniform> {
    gfx.create_uniform(&UniformDesc::new(
        "u_tint",
        vec![UniformLayoutDesc::new(UniformKind::Vec4)],
    ))
    .unwrap()
}

#[test]
fn uniform_location_is_resolved_once_per_shader() {
    let Scene { mut gfx, pipeline, .. } = scene();
    let tint = tint_uniform(&mut gfx);
    let values = [1.0f32, 0.5, 0.25, 1.0];

    let mut cb = gfx.command_buffer();
    for _ in 0..2 {
        cb.bind_pipeline(pipeline);
        cb.apply_bindings(&BindDesc {
            uniforms: &[UniformBinding {
                uniform: tint,
                binding: 0,
                data: bytemuck::bytes_of(&values),
            }],
            ..BindDesc::default()
        });
        gfx.submit(&mut cb).unwrap();
    }

    let backend = gfx.backend();
    assert_eq!(backend.count(|call| matches!(call, TraceCall::UniformLocationQuery { .. })), 1);
    assert_eq!(backend.count(|call| matches!(call, TraceCall::UploadUniform { .. })), 2);
    assert!(matches!(
        backend.calls().last(),
        Some(TraceCall::UploadUniform { kind: UniformKind::Vec4, words, .. }) if words[1] == 0.5f32.to_bits()
    ));
}

#[test]
fn uniform_location_is_requeried_after_shader_recreation() {
    let Scene { mut gfx, shader, pipeline, .. } = scene();
    let tint = tint_uniform(&mut gfx);
    let values = [1.0f32; 4];
    let bind = |cb: &mut CommandBuffer, pipeline: Handle<Pipeline>| {
        cb.bind_pipeline(pipeline);
        cb.apply_bindings(&BindDesc {
            uniforms: &[UniformBinding {
                uniform: tint,
                binding: 0,
                data: bytemuck::bytes_of(&values),
            }],
            ..BindDesc::default()
        });
    };

    let mut cb = gfx.command_buffer();
    bind(&mut cb, pipeline);
    gfx.submit(&mut cb).unwrap();

    assert!(gfx.destroy_pipeline(pipeline));
    assert!(gfx.destroy_shader(shader));
    let (shader2, pipeline2) = flat_pipeline(&mut gfx, "flat2");
    assert_eq!(shader2, shader);
    gfx.backend_mut().clear_calls();

    bind(&mut cb, pipeline2);
    gfx.submit(&mut cb).unwrap();

    let queries: Vec<&TraceCall> = gfx
        .backend()
        .calls()
        .iter()
        .filter(|call| matches!(call, TraceCall::UniformLocationQuery { .. }))
        .collect();
    assert_eq!(
        queries,
        vec![&TraceCall::UniformLocationQuery {
            program: program(&gfx, shader2),
            name: "u_tint".into(),
        }]
    );
    assert_eq!(gfx.backend().count(|call| matches!(call, TraceCall::UploadUniform { .. })), 1);
}

#[test]
fn missing_uniform_location_is_cached() {
    let Scene { mut gfx, pipeline, .. } =
        scene_with(TraceBackend::new().with_missing_uniform("u_tint"), GraphicsConfig::default());
    let tint = tint_uniform(&mut gfx);
    let values = [0.0f32; 4];

    let mut cb = gfx.command_buffer();
    cb.bind_pipeline(pipeline);
    for _ in 0..3 {
        cb.apply_bindings(&BindDesc {
            uniforms: &[UniformBinding {
                uniform: tint,
                binding: 0,
                data: bytemuck::bytes_of(&values),
            }],
            ..BindDesc::default()
        });
    }
    let stats = gfx.submit(&mut cb).unwrap();

    assert_eq!(stats.skipped, 0);
    assert_eq!(gfx.backend().count(|call| matches!(call, TraceCall::UniformLocationQuery { .. })), 1);
    assert_eq!(gfx.backend().count(|call| matches!(call, TraceCall::UploadUniform { .. })), 0);
}

#[test]
fn uniform_size_mismatch_is_skipped() {
    let Scene { mut gfx, pipeline, .. } = scene();
    let tint = tint_uniform(&mut gfx);

    let mut cb = gfx.command_buffer();
    cb.bind_pipeline(pipeline);
    cb.apply_bindings(&BindDesc {
        uniforms: &[UniformBinding {
            uniform: tint,
            binding: 0,
            data: &[0; 12],
        }],
        ..BindDesc::default()
    });
    cb.set_viewport(PixelRect::new(0, 0, 1, 1));

    let stats = gfx.submit(&mut cb).unwrap();
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.commands, 3);
    assert_eq!(gfx.backend().count(|call| matches!(call, TraceCall::UploadUniform { .. })), 0);
}

#[test]
fn sampler_uniform_binds_texture_units() {
    let Scene { mut gfx, pipeline, .. } = scene();
    let texture = gfx
        .create_texture(&TextureDesc::new(1, 1, TextureFormat::Rgba8), Some(&[255; 4]))
        .unwrap();
    let texture_native = gfx.registry().get(texture).unwrap().native;
    let sampler = gfx
        .create_uniform(&UniformDesc::new(
            "u_albedo",
            vec![UniformLayoutDesc::new(UniformKind::Sampler2D)],
        ))
        .unwrap();

    let mut cb = gfx.command_buffer();
    cb.bind_pipeline(pipeline);
    cb.apply_bindings(&BindDesc {
        uniforms: &[UniformBinding {
            uniform: sampler,
            binding: 3,
            data: bytemuck::bytes_of(&texture.id()),
        }],
        ..BindDesc::default()
    });
    gfx.submit(&mut cb).unwrap();

    let calls = gfx.backend().calls();
    assert!(calls.contains(&TraceCall::BindTextureUnit {
        unit: 3,
        texture: texture_native,
    }));
    assert!(matches!(
        calls.last(),
        Some(TraceCall::UploadUniform { kind: UniformKind::Sampler2D, words, .. }) if words == &[3]
    ));
}

#[test]
fn uniform_block_is_resolved_lazily() {
    let Scene { mut gfx, pipeline, .. } = scene();
    let lights = gfx
        .create_uniform_buffer(&UniformBufferDesc {
            name: "Lights",
            data: None,
            size: 256,
            usage: BufferUsage::Dynamic,
        })
        .unwrap();
    let lights_native = gfx.registry().get(lights).unwrap().buffer.native;

    let mut cb = gfx.command_buffer();
    cb.bind_pipeline(pipeline);
    for _ in 0..2 {
        cb.apply_bindings(&BindDesc {
            uniform_buffers: &[UniformBufferBinding {
                buffer: lights,
                binding: 1,
                range: None,
            }],
            ..BindDesc::default()
        });
    }
    gfx.submit(&mut cb).unwrap();

    let backend = gfx.backend();
    assert_eq!(backend.count(|call| matches!(call, TraceCall::UniformBlockQuery { .. })), 1);
    assert_eq!(
        backend.calls().last(),
        Some(&TraceCall::BindUniformBufferRange {
            binding: 1,
            buffer: lights_native,
            offset: 0,
            size: 256,
        })
    );
}

// ── deferred updates ─────────────────────────────────────────────────────────

#[test]
fn deferred_buffer_update_applies_at_submit() {
    let Scene { mut gfx, vbo, .. } = scene();
    let mut cb = gfx.command_buffer();
    cb.request_buffer_update(
        BufferTarget::Vertex(vbo),
        &BufferUpdateDesc {
            data: &[7; 24],
            usage: BufferUsage::Stream,
            update: BufferUpdate::SubData { offset: 64 },
        },
    );
    assert_eq!(gfx.backend().calls().len(), 0);

    gfx.submit(&mut cb).unwrap();
    let record = gfx.registry().get(vbo).unwrap();
    assert_eq!(record.size, 88);
    assert_eq!(record.usage, BufferUsage::Stream);
    assert!(matches!(
        gfx.backend().calls(),
        [TraceCall::UpdateBuffer { update: BufferUpdate::SubData { offset: 64 }, data, .. }] if data.len() == 24
    ));
}

#[test]
fn stale_buffer_update_is_skipped() {
    let Scene { mut gfx, vbo, .. } = scene();
    gfx.destroy_vertex_buffer(vbo);
    gfx.backend_mut().clear_calls();

    let mut cb = gfx.command_buffer();
    cb.request_buffer_update(BufferTarget::Vertex(vbo), &BufferUpdateDesc {
        data: &[1; 8],
        ..BufferUpdateDesc::default()
    });
    cb.set_scissor(PixelRect::new(1, 2, 3, 4));

    let stats = gfx.submit(&mut cb).unwrap();
    assert_eq!(stats.skipped, 1);
    assert_eq!(gfx.backend().calls(), &[TraceCall::Scissor(PixelRect::new(1, 2, 3, 4))]);
}

#[test]
fn deferred_texture_update_replaces_description() {
    let Scene { mut gfx, .. } = scene();
    let texture = gfx
        .create_texture(&TextureDesc::new(2, 2, TextureFormat::Rgba8), Some(&[0; 16]))
        .unwrap();
    let grown = TextureDesc::new(4, 4, TextureFormat::R8);

    let mut cb = gfx.command_buffer();
    cb.request_texture_update(texture, &grown, &[9; 16]);
    cb.request_texture_update(texture, &grown, &[9; 3]);
    let stats = gfx.submit(&mut cb).unwrap();

    assert_eq!(stats.skipped, 1);
    assert_eq!(gfx.registry().get(texture).unwrap().desc, grown);
    assert_eq!(gfx.backend().count(|call| matches!(call, TraceCall::UpdateTexture { len: 16, .. })), 1);
}
