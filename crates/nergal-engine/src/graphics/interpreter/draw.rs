use nergal_collections::ByteBuffer;

use super::{PipelineBinding, SubmitStats, VertexBufferDecl, skip};
use crate::graphics::GraphicsError;
use crate::graphics::backend::{DrawArrays, DrawIndexed, GraphicsBackend, VertexAttributeBinding};
use crate::graphics::context::GraphicsContext;
use crate::graphics::desc::{IndexType, PipelineDesc, VertexDataType};
use crate::graphics::handle::{Handle, Pipeline};

impl<B: GraphicsBackend> GraphicsContext<B> {
    pub(super) fn draw(&mut self, input: &mut ByteBuffer, stats: &mut SubmitStats) -> Result<(), GraphicsError> {
        let start: u32 = input.read()?;
        let count: u32 = input.read()?;
        let instances: u32 = input.read()?;
        let base_vertex: i32 = input.read()?;
        let range: [u32; 2] = input.read()?;

        let Some(pipeline) = self.resolve_pipeline("draw", stats)? else {
            return Ok(());
        };
        let Some((compute, needs_vertices)) = self
            .registry
            .get(pipeline)
            .map(|r| (r.desc.is_compute(), !r.desc.layout.is_empty()))
        else {
            skip!(self, stats, "draw_pipeline", "draw with destroyed pipeline {}", pipeline.id());
            return Ok(());
        };
        if compute {
            return Err(GraphicsError::InvalidState("draw with a compute pipeline bound".into()));
        }
        if needs_vertices && self.cache.vertex_buffers.is_empty() {
            skip!(self, stats, "draw_vertices", "draw with no vertex buffer bound");
            return Ok(());
        }

        let Some(record) = self.registry.get(pipeline) else {
            return Ok(());
        };
        let desc = &record.desc;
        configure_attributes(&mut self.backend, &self.cache.vertex_buffers, desc);

        let primitive = desc.raster.primitive;
        let instanced = instances > 1 || desc.has_instanced_attributes();
        if self.cache.index_buffer.is_some() {
            let element_size = match desc.raster.index_element_size {
                0 => self.cache.index_element_size,
                size => size,
            };
            self.backend.draw_indexed(DrawIndexed {
                primitive,
                index_type: IndexType::from_element_size(element_size).unwrap_or(IndexType::U32),
                first: start,
                count,
                instances,
                instanced,
                base_vertex,
                range: (range[0], range[1]),
            });
        } else {
            self.backend.draw_arrays(DrawArrays {
                primitive,
                first: start,
                count,
                instances,
                instanced,
            });
        }

        stats.draws += 1;
        Ok(())
    }

    pub(super) fn dispatch_compute(&mut self, input: &mut ByteBuffer, stats: &mut SubmitStats) -> Result<(), GraphicsError> {
        let groups: [u32; 3] = input.read()?;

        let Some(pipeline) = self.resolve_pipeline("dispatch", stats)? else {
            return Ok(());
        };
        let Some(compute) = self.registry.get(pipeline).map(|r| r.desc.is_compute()) else {
            skip!(self, stats, "dispatch_pipeline", "dispatch with destroyed pipeline {}", pipeline.id());
            return Ok(());
        };
        if !compute {
            return Err(GraphicsError::InvalidState("dispatch with a graphics pipeline bound".into()));
        }

        self.backend.dispatch_compute(groups);
        stats.dispatches += 1;
        Ok(())
    }

    /// Bound pipeline for `what`, `None` when the last bind was stale.
    fn resolve_pipeline(&mut self, what: &str, stats: &mut SubmitStats) -> Result<Option<Handle<Pipeline>>, GraphicsError> {
        match self.cache.pipeline {
            PipelineBinding::Bound(pipeline) => Ok(Some(pipeline)),
            PipelineBinding::Stale(id) => {
                skip!(self, stats, what, "{what} skipped, pipeline {id} does not exist");
                Ok(None)
            }
            PipelineBinding::Unbound => Err(GraphicsError::InvalidState(format!(
                "{what} without a bound pipeline"
            ))),
        }
    }
}

/// Points every attribute of the layout at its vertex buffer.
///
/// Attributes with a zero stride are packed in layout order; within an
/// interleaved buffer the stride is the packed vertex size, within a
/// non-interleaved buffer it is the attribute size.
fn configure_attributes<B: GraphicsBackend>(backend: &mut B, buffers: &[VertexBufferDecl], desc: &PipelineDesc) {
    let Some(last) = buffers.len().checked_sub(1) else {
        return;
    };

    let packed_stride = desc.packed_stride();
    let mut packed_offset = 0;
    for (index, attr) in desc.layout.iter().enumerate() {
        let decl = buffers[(attr.buffer_index as usize).min(last)];
        let manual = attr.stride != 0;
        let size = attr.format.size();

        let (stride, offset) = match (decl.data_type, manual) {
            (_, true) => (attr.stride, attr.offset),
            (VertexDataType::Interleaved, false) => (packed_stride, packed_offset),
            (VertexDataType::NonInterleaved, false) => (size, 0),
        };
        packed_offset += size;

        backend.vertex_attribute(
            index as u32,
            VertexAttributeBinding {
                buffer: decl.buffer,
                format: attr.format,
                stride,
                offset: decl.offset + offset,
                divisor: attr.divisor,
            },
        );
    }
}
