use crate::context::GpuContext;
use pathfiddle_render::{BackendError, FramePresenter};
use wgpu::util::TextureBlitter;

struct UploadTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

/// Presents CPU-rasterized RGBA8 frames on a window surface by uploading
/// them to a texture and blitting to the swapchain.
pub struct SurfacePresenter {
    upload: Option<UploadTexture>,
    blitter: TextureBlitter,
    ctx: GpuContext,
    presented: u64,
}

impl SurfacePresenter {
    pub fn new(ctx: GpuContext) -> Self {
        let blitter = TextureBlitter::new(&ctx.device, ctx.present_format());
        Self {
            upload: None,
            blitter,
            ctx,
            presented: 0,
        }
    }

    pub fn presented(&self) -> u64 {
        self.presented
    }
}

fn create_upload(device: &wgpu::Device, width: u32, height: u32) -> UploadTexture {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("cpu_frame_upload"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    UploadTexture {
        texture,
        view,
        width,
        height,
    }
}

impl FramePresenter for SurfacePresenter {
    fn resize(&mut self, width: u32, height: u32) -> Result<(), BackendError> {
        self.ctx.resize_surface(width, height);
        Ok(())
    }

    fn present(&mut self, rgba: &[u8], width: u32, height: u32) -> Result<(), BackendError> {
        if self.ctx.is_headless() || width == 0 || height == 0 {
            return Ok(());
        }
        let Some(frame) = self.ctx.acquire()? else {
            return Ok(());
        };

        if self
            .upload
            .as_ref()
            .is_some_and(|u| u.width != width || u.height != height)
        {
            self.upload = None;
        }
        let device = &self.ctx.device;
        let upload = self
            .upload
            .get_or_insert_with(|| create_upload(device, width, height));
        self.ctx.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &upload.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );

        let target = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("cpu_present_encoder"),
            });
        self.blitter.copy(&self.ctx.device, &mut encoder, &upload.view, &target);
        self.ctx.queue.submit(Some(encoder.finish()));
        frame.present();
        self.presented += 1;
        Ok(())
    }
}
