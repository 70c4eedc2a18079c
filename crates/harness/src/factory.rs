use pathfiddle_render::{Backend, BackendError, BackendOptions, BackendSelection, EngineKind};
use pathfiddle_render_cpu::CpuBackend;
use pathfiddle_render_wgpu::{GpuContext, SurfacePresenter, VelloBackend, wgpu_backends};

/// Builds the one backend a session renders with.
///
/// Without a window, the GPU engine needs `allow_headless_rendering`; the
/// CPU engine always renders into its own pixmap.
pub fn create_backend(
    selection: &BackendSelection,
    options: &BackendOptions,
    window: Option<wgpu::SurfaceTarget<'static>>,
    width: u32,
    height: u32,
) -> Result<Box<dyn Backend>, BackendError> {
    let _span = tracing::info_span!("create_backend", api = %selection.api, engine = ?selection.engine).entered();
    wgpu_backends(selection.api)?;

    let backend: Box<dyn Backend> = match selection.engine {
        EngineKind::Vello => {
            let ctx = GpuContext::new(selection.api, options, window, width, height)?;
            Box::new(VelloBackend::new(ctx, options.clone())?)
        }
        EngineKind::VelloCpu => {
            let backend = CpuBackend::new(options.clone());
            match window {
                Some(window) => {
                    let ctx = GpuContext::new(selection.api, options, Some(window), width, height)?;
                    Box::new(backend.with_presenter(Box::new(SurfacePresenter::new(ctx))))
                }
                None => Box::new(backend),
            }
        }
    };
    tracing::info!(label = %backend.label(), "backend ready");
    Ok(backend)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathfiddle_render::ApiKind;

    fn cpu(api: ApiKind) -> BackendSelection {
        BackendSelection {
            engine: EngineKind::VelloCpu,
            ..BackendSelection::new(api)
        }
    }

    #[test]
    fn unavailable_apis_are_fatal() {
        for api in [ApiKind::D3d11, ApiKind::Dawn] {
            let err = create_backend(&cpu(api), &BackendOptions::default(), None, 64, 64)
                .err()
                .unwrap();
            assert!(matches!(err, BackendError::Unsupported(_)));
        }
    }

    #[test]
    fn cpu_engine_runs_without_window() {
        let backend = create_backend(&cpu(ApiKind::Gl), &BackendOptions::default(), None, 64, 64).unwrap();
        assert_eq!(backend.label(), EngineKind::VelloCpu.label());
    }

    #[test]
    fn gpu_engine_without_window_needs_headless_opt_in() {
        let options = BackendOptions {
            allow_headless_rendering: false,
            ..BackendOptions::default()
        };
        let err = create_backend(&BackendSelection::new(ApiKind::Gl), &options, None, 64, 64)
            .err()
            .unwrap();
        assert!(matches!(err, BackendError::Surface(_)));
    }
}
