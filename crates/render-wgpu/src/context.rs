use pathfiddle_render::{ApiKind, BackendError, BackendOptions};

/// Instance, adapter, device and (optionally) window surface for one API.
pub struct GpuContext {
    pub instance: wgpu::Instance,
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    surface: Option<wgpu::Surface<'static>>,
    config: Option<wgpu::SurfaceConfiguration>,
    api: ApiKind,
}

/// Maps a harness API onto wgpu's backend set.
pub fn wgpu_backends(api: ApiKind) -> Result<wgpu::Backends, BackendError> {
    match api {
        ApiKind::Gl => Ok(wgpu::Backends::GL),
        ApiKind::Metal => Ok(wgpu::Backends::METAL),
        ApiKind::D3d12 => Ok(wgpu::Backends::DX12),
        ApiKind::Vulkan => Ok(wgpu::Backends::VULKAN),
        ApiKind::D3d11 | ApiKind::Dawn => Err(BackendError::Unsupported(api.to_string())),
    }
}

pub fn instance_flags(options: &BackendOptions) -> wgpu::InstanceFlags {
    let mut flags = wgpu::InstanceFlags::from_build_config();
    if options.enable_validation_layers {
        flags |= wgpu::InstanceFlags::VALIDATION | wgpu::InstanceFlags::DEBUG;
    }
    if options.disable_debug_callbacks {
        flags.remove(wgpu::InstanceFlags::DEBUG);
    }
    flags
}

fn pick_surface_format(caps: &wgpu::SurfaceCapabilities, srgb: bool) -> Option<wgpu::TextureFormat> {
    let preferred = caps.formats.iter().copied().find(|f| {
        if srgb {
            f.is_srgb()
        } else {
            matches!(f, wgpu::TextureFormat::Rgba8Unorm | wgpu::TextureFormat::Bgra8Unorm)
        }
    });
    preferred.or_else(|| caps.formats.first().copied())
}

impl GpuContext {
    /// Brings up `api` and, when `window` is given, a surface configured at
    /// `width`x`height`.
    pub fn new(
        api: ApiKind,
        options: &BackendOptions,
        window: Option<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
    ) -> Result<Self, BackendError> {
        let backends = wgpu_backends(api)?;
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends,
            flags: instance_flags(options),
            ..Default::default()
        });

        let surface = match window {
            Some(target) => Some(
                instance
                    .create_surface(target)
                    .map_err(|e| BackendError::Surface(e.to_string()))?,
            ),
            None if options.allow_headless_rendering => None,
            None => {
                return Err(BackendError::Surface(
                    "no window and headless rendering is not allowed".into(),
                ));
            }
        };

        let adapter = match &options.gpu_name_filter {
            Some(filter) => {
                let needle = filter.to_lowercase();
                instance
                    .enumerate_adapters(backends)
                    .into_iter()
                    .find(|a| {
                        a.get_info().name.to_lowercase().contains(&needle)
                            && surface.as_ref().is_none_or(|s| a.is_surface_supported(s))
                    })
                    .ok_or_else(|| BackendError::NoAdapter(Some(filter.clone())))?
            }
            None => pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: surface.as_ref(),
                force_fallback_adapter: options.force_fallback_adapter,
            }))
            .map_err(|_| BackendError::NoAdapter(None))?,
        };

        let info = adapter.get_info();
        tracing::info!(
            api = %api,
            adapter = %info.name,
            backend = info.backend.to_str(),
            "GPU adapter selected"
        );

        let (required_features, required_limits) = if options.core_features_only {
            (
                wgpu::Features::empty(),
                wgpu::Limits::downlevel_defaults().using_resolution(adapter.limits()),
            )
        } else {
            (
                adapter.features() & (wgpu::Features::CLEAR_TEXTURE | wgpu::Features::PIPELINE_CACHE),
                wgpu::Limits::default().using_resolution(adapter.limits()),
            )
        };

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("pathfiddle_device"),
            required_features,
            required_limits,
            experimental_features: wgpu::ExperimentalFeatures::default(),
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::Off,
        }))
        .map_err(|e| BackendError::Device(e.to_string()))?;

        let config = match &surface {
            Some(surface) => {
                let caps = surface.get_capabilities(&adapter);
                let format = pick_surface_format(&caps, options.srgb)
                    .ok_or_else(|| BackendError::Surface("surface reports no formats".into()))?;
                let config = wgpu::SurfaceConfiguration {
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                    format,
                    width: width.max(1),
                    height: height.max(1),
                    present_mode: wgpu::PresentMode::AutoNoVsync,
                    alpha_mode: caps.alpha_modes.first().copied().unwrap_or(wgpu::CompositeAlphaMode::Auto),
                    view_formats: vec![],
                    desired_maximum_frame_latency: 2,
                };
                surface.configure(&device, &config);
                Some(config)
            }
            None => None,
        };

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
            surface,
            config,
            api,
        })
    }

    pub fn api(&self) -> ApiKind {
        self.api
    }

    pub fn is_headless(&self) -> bool {
        self.surface.is_none()
    }

    /// Format presented frames end up in.
    pub fn present_format(&self) -> wgpu::TextureFormat {
        self.config
            .as_ref()
            .map(|c| c.format)
            .unwrap_or(wgpu::TextureFormat::Rgba8Unorm)
    }

    pub fn max_texture_dimension(&self) -> u32 {
        self.device.limits().max_texture_dimension_2d
    }

    pub fn resize_surface(&mut self, width: u32, height: u32) {
        if let (Some(surface), Some(config)) = (&self.surface, &mut self.config) {
            config.width = width.max(1);
            config.height = height.max(1);
            surface.configure(&self.device, config);
        }
    }

    /// Acquires the next swapchain texture, reconfiguring once on a lost or
    /// outdated surface. `Ok(None)` when headless or the frame should be
    /// skipped.
    pub fn acquire(&self) -> Result<Option<wgpu::SurfaceTexture>, BackendError> {
        let (Some(surface), Some(config)) = (&self.surface, &self.config) else {
            return Ok(None);
        };
        match surface.get_current_texture() {
            Ok(t) => Ok(Some(t)),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                surface.configure(&self.device, config);
                tracing::debug!("surface reconfigured");
                Ok(None)
            }
            Err(wgpu::SurfaceError::Timeout) => {
                tracing::warn!("surface acquire timed out");
                Ok(None)
            }
            Err(e) => Err(BackendError::Surface(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_apis_rejected() {
        assert!(matches!(wgpu_backends(ApiKind::D3d11), Err(BackendError::Unsupported(_))));
        assert!(matches!(wgpu_backends(ApiKind::Dawn), Err(BackendError::Unsupported(_))));
        assert_eq!(wgpu_backends(ApiKind::Vulkan).unwrap(), wgpu::Backends::VULKAN);
    }

    #[test]
    fn validation_flags_follow_options() {
        let mut options = BackendOptions {
            enable_validation_layers: true,
            ..BackendOptions::default()
        };
        let flags = instance_flags(&options);
        assert!(flags.contains(wgpu::InstanceFlags::VALIDATION | wgpu::InstanceFlags::DEBUG));

        options.disable_debug_callbacks = true;
        let flags = instance_flags(&options);
        assert!(flags.contains(wgpu::InstanceFlags::VALIDATION));
        assert!(!flags.contains(wgpu::InstanceFlags::DEBUG));
    }

    #[test]
    fn headless_without_permission_fails_before_device_init() {
        let options = BackendOptions {
            allow_headless_rendering: false,
            ..BackendOptions::default()
        };
        assert!(matches!(
            GpuContext::new(ApiKind::Vulkan, &options, None, 64, 64),
            Err(BackendError::Surface(_))
        ));
    }
}
