use nergal_collections::ByteBuffer;

use super::{PipelineBinding, SubmitStats, skip};
use crate::graphics::GraphicsError;
use crate::graphics::backend::{GraphicsBackend, NativeId};
use crate::graphics::context::GraphicsContext;
use crate::graphics::handle::{Handle, Pipeline, Shader};

impl<B: GraphicsBackend> GraphicsContext<B> {
    /// Resets the cache, then applies the pipeline's fixed-function state and program.
    pub(super) fn bind_pipeline(&mut self, input: &mut ByteBuffer, stats: &mut SubmitStats) -> Result<(), GraphicsError> {
        let id: u32 = input.read()?;
        let handle = Handle::<Pipeline>::from_raw(id);
        let previous = self.cache.pipeline;
        self.cache.reset();

        let Some(shader) = self.registry.get(handle).map(|record| record.desc.shader()) else {
            self.cache.pipeline = PipelineBinding::Stale(id);
            skip!(self, stats, "bind_pipeline", "bind of unknown pipeline {id}");
            return Ok(());
        };

        if self.config.elide_redundant_pipeline_binds && previous == PipelineBinding::Bound(handle) {
            self.cache.pipeline = previous;
            stats.elided_pipeline_binds += 1;
            return Ok(());
        }

        let Some(program) = self.registry.get(shader).map(|record| record.program) else {
            self.cache.pipeline = PipelineBinding::Stale(id);
            skip!(
                self,
                stats,
                "bind_pipeline_shader",
                "pipeline {id} uses unknown shader {}",
                shader.id()
            );
            return Ok(());
        };

        self.apply_pipeline_state(handle, program);
        self.cache.pipeline = PipelineBinding::Bound(handle);
        Ok(())
    }

    fn apply_pipeline_state(&mut self, handle: Handle<Pipeline>, program: NativeId) {
        if let Some(record) = self.registry.get(handle) {
            let desc = &record.desc;
            // Compute programs carry no fixed-function state.
            if !desc.is_compute() {
                self.backend.set_depth_test(desc.depth);
                self.backend.set_stencil_test(desc.stencil.as_ref());
                self.backend.set_blend(desc.blend.as_ref());
                self.backend.set_face_culling(desc.raster.cull);
                self.backend.set_winding_order(desc.raster.winding);
            }
        }
        self.backend.use_program(program);
    }

    /// Shader and native program of the bound pipeline.
    pub(super) fn bound_shader(&self) -> Option<(Handle<Shader>, NativeId)> {
        let pipeline = self.cache.bound_pipeline()?;
        let shader = self.registry.get(pipeline)?.desc.shader();
        let program = self.registry.get(shader)?.program;
        Some((shader, program))
    }
}
