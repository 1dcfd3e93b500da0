//! # quill-render
//!
//! GPU hand-off for `quill-text`, built on `wgpu`.
//!
//! ## Architecture
//!
//! ```text
//!  AtlasBuilder::build() (quill-text)
//!       │
//!       ▼
//!  AtlasTexture::upload(bitmap)     ◀─── R8Unorm, one mip, CPU copy dropped
//!
//!  LayoutEngine::layout() (quill-text)
//!       │
//!       ▼
//!  TextLayout::to_buffers()         ◀─── [x, y, u, v] + u16 indices
//!       │
//!       ▼
//!  GeometrySlot::publish()          ◀─── immutable snapshot, swapped
//!       │
//!       ▼
//!  GeometryBuffers::upload()        ◀─── render loop, one indexed draw
//! ```
//!
//! ## Crate modules
//!
//! - [`context`]: GPU device/queue initialisation
//! - [`texture`]: atlas texture upload and sampler
//! - [`vertex`]: text vertex type and layout
//! - [`buffers`]: per-line vertex/index buffers
//! - [`publish`]: swap-on-publish geometry slot

pub mod buffers;
pub mod context;
pub mod publish;
pub mod texture;
pub mod vertex;

// Re-exports for convenience
pub use buffers::{GeometryBuffers, INDEX_FORMAT};
pub use context::{GpuContext, GpuError};
pub use publish::{GeometrySlot, PublishSlot, SlotReader};
pub use texture::{AtlasFilter, AtlasTexture, TextureError, ATLAS_FORMAT};
pub use vertex::TextVertex;
