/// Platform event as seen by the application.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Event {
    /// The user or the system asked the application to quit.
    Quit,
    /// The window drawable changed size (physical pixels).
    Resized { width: u32, height: u32 },
    /// Anything else the platform delivered.
    Other,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

/// Source for one shader stage.
#[derive(Debug, Copy, Clone)]
pub struct ShaderDesc<'a> {
    pub label: &'a str,
    pub stage: ShaderStage,
    /// WGSL source text.
    pub source: &'a str,
    pub entry_point: &'a str,
}

/// Component layout of a single vertex attribute.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum AttributeFormat {
    Float32x2,
    Float32x3,
    Float32x4,
}

impl AttributeFormat {
    /// Size of one attribute value in bytes.
    pub const fn size(self) -> u64 {
        match self {
            Self::Float32x2 => 8,
            Self::Float32x3 => 12,
            Self::Float32x4 => 16,
        }
    }

    pub(crate) fn to_wgpu(self) -> wgpu::VertexFormat {
        match self {
            Self::Float32x2 => wgpu::VertexFormat::Float32x2,
            Self::Float32x3 => wgpu::VertexFormat::Float32x3,
            Self::Float32x4 => wgpu::VertexFormat::Float32x4,
        }
    }
}

/// Describes how a vertex buffer feeds one shader input.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct VertexAttribute {
    /// Shader input location.
    pub location: u32,
    pub format: AttributeFormat,
    /// Byte offset of the attribute within one vertex.
    pub offset: u64,
    /// Byte distance between consecutive vertices.
    pub stride: u64,
}

impl VertexAttribute {
    /// Tightly packed attribute starting at offset zero.
    pub const fn packed(location: u32, format: AttributeFormat) -> Self {
        Self {
            location,
            format,
            offset: 0,
            stride: format.size(),
        }
    }
}
