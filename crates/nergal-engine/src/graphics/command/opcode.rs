use crate::graphics::wire::wire_enum;

wire_enum! {
    /// Tag written ahead of every recorded command.
    pub enum Opcode {
        BeginRenderPass = 0,
        EndRenderPass = 1,
        SetViewport = 2,
        SetScissor = 3,
        Clear = 4,
        RequestBufferUpdate = 5,
        RequestTextureUpdate = 6,
        BindPipeline = 7,
        BindBindings = 8,
        DispatchCompute = 9,
        Draw = 10,
    }
}
