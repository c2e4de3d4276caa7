/// Parameters of one draw.
///
/// `start` and `count` are vertices for non-indexed draws and indices for
/// indexed draws. `range` is an optional hint of the index values referenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawDesc {
    pub start: u32,
    pub count: u32,
    pub instances: u32,
    pub base_vertex: i32,
    pub range: (u32, u32),
}

impl Default for DrawDesc {
    fn default() -> Self {
        Self {
            start: 0,
            count: 0,
            instances: 1,
            base_vertex: 0,
            range: (0, 0),
        }
    }
}

impl DrawDesc {
    pub fn new(start: u32, count: u32) -> Self {
        Self {
            start,
            count,
            ..Self::default()
        }
    }

    pub fn instanced(mut self, instances: u32) -> Self {
        self.instances = instances;
        self
    }
}
