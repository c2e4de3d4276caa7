mod scene;

use anyhow::{Context, Result};
use nergal_engine::graphics::backend::{TraceBackend, TraceCall};
use nergal_engine::graphics::{
    GraphicsConfig, GraphicsContext, Pipeline, Shader, SubmitStats, Texture, VertexBuffer,
};
use nergal_engine::logging::{LoggingConfig, init_logging};

use scene::Scene;

const FRAMES: u32 = 4;
/// Frame after which the checker texture is destroyed out from under the recorders.
const DROP_CHECKER_AFTER: u32 = 1;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    println!();
    println!("  ╔════════════════════════════════════════╗");
    println!("  ║          NERGAL STUDIO v0.1            ║");
    println!("  ║   trace backend  ·  deferred commands  ║");
    println!("  ╚════════════════════════════════════════╝");
    println!();

    let mut gfx = GraphicsContext::new(TraceBackend::new(), GraphicsConfig::default());
    let scene = Scene::build(&mut gfx).context("failed to build the demo scene")?;
    let mut cb = gfx.command_buffer();

    let mut totals = SubmitStats::default();
    for frame in 0..FRAMES {
        gfx.backend_mut().clear_calls();
        scene.record_frame(&mut cb, frame);
        log::debug!("frame {frame}: {} commands, {} bytes", cb.len(), cb.byte_len());

        let stats = gfx
            .submit(&mut cb)
            .with_context(|| format!("frame {frame} failed to execute"))?;
        log::info!(
            "frame {frame}: {} draws, {} dispatches, {} skipped, {} native calls",
            stats.draws,
            stats.dispatches,
            stats.skipped,
            gfx.backend().calls().len()
        );
        accumulate(&mut totals, stats);

        if frame == DROP_CHECKER_AFTER {
            log::info!("destroying the checker texture; later frames keep referencing it");
            scene.drop_checker(&mut gfx);
        }
    }

    print_summary(&gfx, &scene, &totals);
    Ok(())
}

fn accumulate(totals: &mut SubmitStats, stats: SubmitStats) {
    totals.commands += stats.commands;
    totals.draws += stats.draws;
    totals.dispatches += stats.dispatches;
    totals.skipped += stats.skipped;
    totals.elided_pipeline_binds += stats.elided_pipeline_binds;
}

fn print_summary(gfx: &GraphicsContext<TraceBackend>, scene: &Scene, totals: &SubmitStats) {
    let registry = gfx.registry();
    let uploads = gfx
        .backend()
        .count(|call| matches!(call, TraceCall::UploadUniform { .. }));

    println!();
    println!("  [SUMMARY] {FRAMES} frames submitted");
    println!();
    println!("  Commands     >  {}", totals.commands);
    println!("  Draws        >  {}", totals.draws);
    println!("  Dispatches   >  {}", totals.dispatches);
    println!("  Skipped      >  {}", totals.skipped);
    println!("  Elided binds >  {}", totals.elided_pipeline_binds);
    println!();
    println!("  Shaders      >  {}", registry.count::<Shader>());
    println!("  Pipelines    >  {}", registry.count::<Pipeline>());
    println!("  Textures     >  {}", registry.count::<Texture>());
    println!("  Vertex bufs  >  {}", registry.count::<VertexBuffer>());
    println!("  Meshes       >  {}", scene.mesh_count());
    println!("  Uniform uploads in last frame >  {uploads}");
    println!();
}
