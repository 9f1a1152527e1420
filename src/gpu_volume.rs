use crate::render::{Extent, RenderCollaborator, RenderSettings, VolumeImport};

use log::info;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GpuVolumeError {
    #[error("Upload cancelled by abort check")]
    Aborted,

    #[error("Volume extent {extent:?} does not fit a 3D texture of at most {limit} texels per axis")]
    ExceedsLimits { extent: Extent, limit: u32 },

    #[error("No suitable GPU adapter: {0}")]
    NoAdapter(#[from] wgpu::RequestAdapterError),

    #[error("GPU device request failed: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
}

/// A volume resident in GPU memory as a single channel `R16Uint` 3D texture.
///
/// Texture x runs along the volume height (the fastest axis of the import
/// buffer), y along depth and z along width.
pub struct GpuVolume {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub size: wgpu::Extent3d,
}

impl GpuVolume {
    pub fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        import: VolumeImport<'_>,
        settings: &RenderSettings,
    ) -> Result<Self, GpuVolumeError> {
        if settings.should_abort() {
            return Err(GpuVolumeError::Aborted);
        }
        let size = texture_size(import.extent, device.limits().max_texture_dimension_3d)?;

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Volume 3D Texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D3,
            format: wgpu::TextureFormat::R16Uint,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfoBase {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bytemuck::cast_slice(import.samples),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(size.width * std::mem::size_of::<u16>() as u32),
                rows_per_image: Some(size.height),
            },
            size,
        );
        queue.submit(std::iter::empty::<wgpu::CommandBuffer>());

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        info!(
            "Uploaded {}x{}x{} volume texture",
            size.width, size.height, size.depth_or_array_layers
        );

        Ok(Self {
            texture,
            view,
            size,
        })
    }
}

fn texture_size(extent: Extent, limit: u32) -> Result<wgpu::Extent3d, GpuVolumeError> {
    let axis = |voxels: usize| {
        u32::try_from(voxels)
            .ok()
            .filter(|&voxels| voxels > 0 && voxels <= limit)
    };
    match (axis(extent.height), axis(extent.depth), axis(extent.width)) {
        (Some(width), Some(height), Some(depth_or_array_layers)) => Ok(wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers,
        }),
        _ => Err(GpuVolumeError::ExceedsLimits { extent, limit }),
    }
}

/// Collaborator that keeps the most recently presented volume on the GPU.
pub struct GpuUploader {
    device: wgpu::Device,
    queue: wgpu::Queue,
    volume: Option<GpuVolume>,
}

impl GpuUploader {
    /// Request the default adapter and a device with default limits.
    pub async fn new() -> Result<Self, GpuVolumeError> {
        let instance = wgpu::Instance::default();
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions::default())
            .await?;
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Volume Device"),
                ..Default::default()
            })
            .await?;

        Ok(Self {
            device,
            queue,
            volume: None,
        })
    }

    pub fn volume(&self) -> Option<&GpuVolume> {
        self.volume.as_ref()
    }
}

impl RenderCollaborator for GpuUploader {
    type Error = GpuVolumeError;

    fn present(
        &mut self,
        import: VolumeImport<'_>,
        settings: &RenderSettings,
    ) -> Result<(), Self::Error> {
        self.volume = Some(GpuVolume::upload(
            &self.device,
            &self.queue,
            import,
            settings,
        )?);
        Ok(())
    }
}
