use bytemuck::{Pod, Zeroable};

use crate::platform::{AttributeFormat, ShaderDesc, ShaderStage, VertexAttribute};

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub pos: [f32; 2], // NDC
}

pub static TRIANGLE_VERTICES: [Vertex; 3] = [
    Vertex { pos: [-0.5, -0.5] },
    Vertex { pos: [0.5, -0.5] },
    Vertex { pos: [0.0, 0.5] },
];

pub const TRIANGLE_VERTEX_COUNT: u32 = 3;

/// Position input of the vertex shader: two floats, tightly packed.
pub const POSITION_ATTRIBUTE: VertexAttribute =
    VertexAttribute::packed(0, AttributeFormat::Float32x2);

pub const VERTEX_SHADER: ShaderDesc<'static> = ShaderDesc {
    label: "triangle.vert",
    stage: ShaderStage::Vertex,
    source: include_str!("shaders/triangle.vert.wgsl"),
    entry_point: "vs_main",
};

pub const FRAGMENT_SHADER: ShaderDesc<'static> = ShaderDesc {
    label: "triangle.frag",
    stage: ShaderStage::Fragment,
    source: include_str!("shaders/triangle.frag.wgsl"),
    entry_point: "fs_main",
};

/// Raw bytes of [`TRIANGLE_VERTICES`] for upload.
pub fn vertex_bytes() -> &'static [u8] {
    bytemuck::cast_slice(&TRIANGLE_VERTICES)
}
