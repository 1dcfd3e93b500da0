//! GPU context: owns the `wgpu::Device` and `Queue` the atlas texture
//! and text buffers are created on.
//!
//! Two construction paths:
//!
//! 1. **Headless** (`GpuContext::new_headless`): no window, no surface.
//!    Used for tests and the atlas tool.
//!
//! 2. **Borrowed** (`GpuContext::from_device`): wraps the device a host
//!    application already renders with, so the atlas lands on the device
//!    that presents its frames.

use thiserror::Error;
use wgpu::{
    Adapter, Device, DeviceDescriptor, Instance, InstanceDescriptor, Limits, Queue,
    RequestAdapterOptions,
};

#[derive(Error, Debug)]
pub enum GpuError {
    #[error("No suitable GPU adapter found")]
    NoAdapter,
    #[error("Failed to request device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
}

/// Device state shared by the texture and buffer uploads.
pub struct GpuContext {
    pub device: Device,
    pub queue: Queue,
    /// Absent when wrapping a host device.
    pub adapter: Option<Adapter>,
}

impl GpuContext {
    /// Create a headless context (no window, no surface).
    pub async fn new_headless() -> Result<Self, GpuError> {
        let instance = Instance::new(&InstanceDescriptor::default());

        let adapter = instance
            .request_adapter(&RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        let (device, queue) = request_device(&adapter).await?;
        log::info!("GpuContext: headless on {:?}", adapter.get_info().name);

        Ok(Self {
            device,
            queue,
            adapter: Some(adapter),
        })
    }

    /// Wrap a device and queue owned by the host application.
    pub fn from_device(device: Device, queue: Queue) -> Self {
        Self {
            device,
            queue,
            adapter: None,
        }
    }

    /// Largest square texture the device accepts.
    pub fn max_texture_size(&self) -> u32 {
        self.device.limits().max_texture_dimension_2d
    }
}

/// Request a device with downlevel limits but the adapter's own texture
/// resolution. The default atlas is 4096², above the downlevel 2048.
async fn request_device(adapter: &Adapter) -> Result<(Device, Queue), GpuError> {
    let required_limits = Limits::downlevel_defaults().using_resolution(adapter.limits());
    let pair = adapter
        .request_device(
            &DeviceDescriptor {
                label: Some("quill"),
                required_limits,
                ..Default::default()
            },
            None,
        )
        .await?;
    Ok(pair)
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headless_context() {
        let ctx = pollster::block_on(GpuContext::new_headless());
        // Skip when no GPU adapter is available.
        if let Ok(ctx) = ctx {
            assert!(ctx.adapter.is_some());
            assert!(ctx.max_texture_size() >= 2048);
        }
    }

    #[test]
    fn test_from_device_shares_the_device() {
        let Ok(headless) = pollster::block_on(GpuContext::new_headless()) else { return };
        let limit = headless.max_texture_size();
        let ctx = GpuContext::from_device(headless.device, headless.queue);
        assert!(ctx.adapter.is_none());
        assert_eq!(ctx.max_texture_size(), limit);
    }
}
