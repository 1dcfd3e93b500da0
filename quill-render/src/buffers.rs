//! Vertex and index buffers for one laid-out line.

use quill_text::GlyphGeometry;
use wgpu::util::DeviceExt;
use wgpu::{Buffer, BufferUsages, Device, IndexFormat};

/// Index format of every text index buffer.
pub const INDEX_FORMAT: IndexFormat = IndexFormat::Uint16;

/// GPU copies of a [`GlyphGeometry`].
pub struct GeometryBuffers {
    pub vertex_buffer: Buffer,
    pub index_buffer: Buffer,
    index_count: u32,
}

impl GeometryBuffers {
    /// Upload `geometry`. Returns `None` for empty geometry, which has
    /// nothing to draw and would create zero-sized buffers.
    pub fn upload(device: &Device, geometry: &GlyphGeometry) -> Option<Self> {
        if geometry.is_empty() {
            return None;
        }

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("text_vertices"),
            contents: bytemuck::cast_slice(&geometry.vertices),
            usage: BufferUsages::VERTEX,
        });

        // Buffer sizes must be 4-byte aligned; pad an odd u16 count.
        let mut indices = geometry.indices.clone();
        if indices.len() % 2 == 1 {
            indices.push(0);
        }
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("text_indices"),
            contents: bytemuck::cast_slice(&indices),
            usage: BufferUsages::INDEX,
        });

        log::trace!(
            "GeometryBuffers: {} quads, {} vertices",
            geometry.quad_count(),
            geometry.vertex_count()
        );

        Some(Self {
            vertex_buffer,
            index_buffer,
            index_count: geometry.indices.len() as u32,
        })
    }

    /// Count for `draw_indexed`.
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Bind both buffers and issue the indexed draw.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), INDEX_FORMAT);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}
