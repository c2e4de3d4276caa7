//! Command stream interpreter.
//!
//! Responsibilities:
//! - decode `(opcode, payload)` units in recording order
//! - drive the backend with the resolved native objects
//! - keep per-pass binding state in an [`InterpreterCache`]
//!
//! A handle that no longer resolves degrades its command to a no-op with a
//! throttled warning. The payload is consumed either way so the stream stays
//! in sync. Protocol violations and corrupt streams abort the submit.

mod bindings;
mod cache;
mod draw;
mod pass;
mod pipeline;
mod update;

pub use cache::{InterpreterCache, PipelineBinding, VertexBufferDecl};
pub(crate) use cache::UniformScratch;

use nergal_collections::ByteBuffer;

use super::backend::GraphicsBackend;
use super::command::{CommandBuffer, Opcode};
use super::context::GraphicsContext;
use super::error::GraphicsError;

/// What one submit did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmitStats {
    /// Commands decoded, including skipped ones.
    pub commands: u32,
    pub draws: u32,
    pub dispatches: u32,
    /// Commands or sub-bindings dropped because a handle did not resolve.
    pub skipped: u32,
    pub elided_pipeline_binds: u32,
}

impl<B: GraphicsBackend> GraphicsContext<B> {
    /// Executes every recorded command against the backend, then clears `commands`.
    ///
    /// The buffer is cleared even when execution fails, keeping its allocation.
    pub fn submit(&mut self, commands: &mut CommandBuffer) -> Result<SubmitStats, GraphicsError> {
        // Handles recycle between submits, so no binding survives into the next one.
        self.cache.reset();

        let result = self.execute(commands);
        commands.clear();

        if self.in_pass {
            if result.is_ok() {
                log::warn!("render pass still open at end of submit");
            }
            self.backend.reset_state();
            self.backend.bind_framebuffer(None);
            self.in_pass = false;
        }

        if let Ok(stats) = &result {
            log::trace!("submit: {stats:?}");
        }
        result
    }

    fn execute(&mut self, commands: &mut CommandBuffer) -> Result<SubmitStats, GraphicsError> {
        let count = commands.len();
        let input = commands.stream_mut();
        input.seek_to_beg();

        let mut stats = SubmitStats::default();
        for index in 0..count {
            let raw: u32 = input.read()?;
            let opcode = Opcode::try_from(raw).map_err(|_| GraphicsError::UnknownOpcode { index, opcode: raw })?;
            self.dispatch(opcode, input, &mut stats).inspect_err(|err| {
                log::error!("command {index} ({opcode:?}) failed: {err}");
            })?;
            stats.commands += 1;
        }

        if input.remaining() != 0 {
            log::warn!("{} trailing bytes after {count} commands", input.remaining());
        }
        Ok(stats)
    }

    fn dispatch(&mut self, opcode: Opcode, input: &mut ByteBuffer, stats: &mut SubmitStats) -> Result<(), GraphicsError> {
        match opcode {
            Opcode::BeginRenderPass => self.begin_render_pass(input, stats),
            Opcode::EndRenderPass => self.end_render_pass(),
            Opcode::SetViewport => self.set_viewport(input),
            Opcode::SetScissor => self.set_scissor(input),
            Opcode::Clear => self.clear_targets(input),
            Opcode::RequestBufferUpdate => self.request_buffer_update(input, stats),
            Opcode::RequestTextureUpdate => self.request_texture_update(input, stats),
            Opcode::BindPipeline => self.bind_pipeline(input, stats),
            Opcode::BindBindings => self.apply_bindings(input, stats),
            Opcode::DispatchCompute => self.dispatch_compute(input, stats),
            Opcode::Draw => self.draw(input, stats),
        }
    }
}

/// Counts a dropped command in `stats` and logs it through the throttle.
macro_rules! skip {
    ($ctx:expr, $stats:expr, $site:expr, $($arg:tt)+) => {{
        $stats.skipped += 1;
        crate::graphics::context::warn_throttled!($ctx, $site, $($arg)+);
    }};
}

pub(crate) use skip;

#[cfg(test)]
mod tests;
