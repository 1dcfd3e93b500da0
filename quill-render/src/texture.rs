//! Atlas texture: the GPU copy of an [`AtlasBitmap`].
//!
//! The texture is single-channel (`R8Unorm`), one mip level, and only
//! sampled by shaders. Uploading consumes the CPU bitmap: once the
//! texture exists the pixels live on the GPU only.

use quill_text::AtlasBitmap;
use thiserror::Error;
use wgpu::{
    AddressMode, Extent3d, FilterMode, Sampler, SamplerDescriptor, Texture, TextureDescriptor,
    TextureDimension, TextureFormat, TextureUsages, TextureView,
};

use crate::context::GpuContext;

/// Pixel format of the atlas texture.
pub const ATLAS_FORMAT: TextureFormat = TextureFormat::R8Unorm;

#[derive(Error, Debug)]
pub enum TextureError {
    #[error("Atlas of {size}×{size} exceeds the device limit of {max}")]
    TooLarge { size: u32, max: u32 },
    #[error("Out of GPU memory while creating the atlas texture")]
    OutOfMemory,
    #[error("Failed to create atlas texture: {0}")]
    Creation(String),
}

/// How the shader should filter atlas samples.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AtlasFilter {
    #[default]
    Linear,
    Nearest,
}

impl From<AtlasFilter> for FilterMode {
    fn from(filter: AtlasFilter) -> Self {
        match filter {
            AtlasFilter::Linear => FilterMode::Linear,
            AtlasFilter::Nearest => FilterMode::Nearest,
        }
    }
}

/// GPU-resident glyph atlas.
pub struct AtlasTexture {
    texture: Texture,
    view: TextureView,
    size: u32,
}

impl AtlasTexture {
    /// Create the texture and upload `bitmap` into it.
    ///
    /// Fails without creating anything if the atlas exceeds the device's
    /// texture limit; allocation and validation failures are caught via
    /// error scopes and reported as distinct errors.
    pub async fn upload(ctx: &GpuContext, bitmap: AtlasBitmap) -> Result<Self, TextureError> {
        let size = bitmap.size();
        let max = ctx.max_texture_size();
        if size > max {
            return Err(TextureError::TooLarge { size, max });
        }

        let extent = Extent3d {
            width: size,
            height: size,
            depth_or_array_layers: 1,
        };

        ctx.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        ctx.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let texture = ctx.device.create_texture(&TextureDescriptor {
            label: Some("glyph_atlas"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format: ATLAS_FORMAT,
            usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let validation = ctx.device.pop_error_scope().await;
        let out_of_memory = ctx.device.pop_error_scope().await;

        if out_of_memory.is_some() {
            return Err(TextureError::OutOfMemory);
        }
        if let Some(err) = validation {
            return Err(TextureError::Creation(err.to_string()));
        }

        ctx.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bitmap.pixels(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(size), // R8 = 1 byte per pixel
                rows_per_image: Some(size),
            },
            extent,
        );
        // The CPU copy is no longer needed.
        drop(bitmap);

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        log::info!("AtlasTexture: uploaded {size}×{size} R8 atlas");
        Ok(Self {
            texture,
            view,
            size,
        })
    }

    pub fn texture(&self) -> &Texture {
        &self.texture
    }

    pub fn view(&self) -> &TextureView {
        &self.view
    }

    /// Width = height in pixels.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Clamp-to-edge sampler for the atlas.
    pub fn create_sampler(&self, ctx: &GpuContext, filter: AtlasFilter) -> Sampler {
        let mode = FilterMode::from(filter);
        ctx.device.create_sampler(&SamplerDescriptor {
            label: Some("glyph_atlas_sampler"),
            address_mode_u: AddressMode::ClampToEdge,
            address_mode_v: AddressMode::ClampToEdge,
            mag_filter: mode,
            min_filter: mode,
            ..Default::default()
        })
    }
}

// ===================================================================
// Tests
// ===================================================================
