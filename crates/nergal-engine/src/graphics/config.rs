/// Construction parameters for a [`GraphicsContext`](super::GraphicsContext).
#[derive(Debug, Clone)]
pub struct GraphicsConfig {
    /// Initial stream capacity, in bytes, of buffers from `GraphicsContext::command_buffer`.
    pub command_buffer_capacity: usize,

    /// A repeated warning at one site is logged on its first hit and then once
    /// per this many hits.
    pub warn_interval: u32,

    /// Slots reserved up front in every resource table.
    pub resources_per_kind: usize,

    /// Skip re-applying native pipeline state when the bound pipeline is bound again.
    ///
    /// The interpreter cache is reset either way.
    pub elide_redundant_pipeline_binds: bool,
}

impl Default for GraphicsConfig {
    fn default() -> Self {
        Self {
            command_buffer_capacity: nergal_collections::DEFAULT_CAPACITY,
            warn_interval: 60,
            resources_per_kind: 32,
            elide_redundant_pipeline_binds: true,
        }
    }
}
