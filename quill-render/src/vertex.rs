//! GPU vertex type for text quads.
//!
//! Matches the interleaved `[x, y, u, v]` layout produced by
//! [`quill_text::to_buffers`], so the flat float buffer can be viewed as
//! `&[TextVertex]` without copying.

use bytemuck::{Pod, Zeroable};
use wgpu::{BufferAddress, VertexAttribute, VertexBufferLayout, VertexFormat, VertexStepMode};

/// One corner of a glyph quad.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct TextVertex {
    /// Pixel position, y-up.
    pub position: [f32; 2],
    /// Normalized atlas coordinate.
    pub uv: [f32; 2],
}

impl TextVertex {
    pub fn layout() -> VertexBufferLayout<'static> {
        static ATTRS: &[VertexAttribute] = &[
            // location(0) = position
            VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: VertexFormat::Float32x2,
            },
            // location(1) = uv
            VertexAttribute {
                offset: 8,
                shader_location: 1,
                format: VertexFormat::Float32x2,
            },
        ];
        VertexBufferLayout {
            array_stride: std::mem::size_of::<TextVertex>() as BufferAddress,
            step_mode: VertexStepMode::Vertex,
            attributes: ATTRS,
        }
    }

    /// View a flat `[x, y, u, v, ...]` slice as vertices.
    ///
    /// Returns `None` when the length is not a multiple of four.
    pub fn from_floats(floats: &[f32]) -> Option<&[TextVertex]> {
        bytemuck::try_cast_slice(floats).ok()
    }
}
