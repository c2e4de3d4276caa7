use crate::graphics::wire::wire_enum;

wire_enum! {
    pub enum ShaderStage {
        Vertex = 0,
        Fragment = 1,
        Compute = 2,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSource {
    pub stage: ShaderStage,
    pub source: String,
}

/// Source for every stage of one program.
///
/// A program is either a compute program (one compute stage) or a graphics
/// program (vertex and/or fragment stages), never both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderDesc {
    pub name: String,
    pub sources: Vec<ShaderSource>,
}

impl ShaderDesc {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sources: Vec::new(),
        }
    }

    pub fn with_stage(mut self, stage: ShaderStage, source: impl Into<String>) -> Self {
        self.sources.push(ShaderSource {
            stage,
            source: source.into(),
        });
        self
    }

    pub fn is_compute(&self) -> bool {
        self.sources.iter().any(|s| s.stage == ShaderStage::Compute)
    }

    pub fn source(&self, stage: ShaderStage) -> Option<&str> {
        self.sources
            .iter()
            .find(|s| s.stage == stage)
            .map(|s| s.source.as_str())
    }
}
