use anyhow::{Context, Result};
use clap::Parser;
use pathfiddle_common::PixelSize;
use pathfiddle_harness::{Capture, FrameController, HarnessArgs, HostEvent, create_backend};
use pathfiddle_render::HostSurface;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "pathfiddle-desktop", about = "Render a vector document through one GPU or CPU backend")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Where `P` writes captured frames
    #[arg(long, default_value = "pathfiddle_capture.png")]
    capture: PathBuf,

    #[command(flatten)]
    harness: HarnessArgs,
}

/// The winit window seen through the harness surface contract.
struct WindowSurface {
    window: Arc<Window>,
    /// Logical pointer position while inside the window.
    cursor: Option<(f64, f64)>,
}

impl HostSurface for WindowSurface {
    fn logical_size(&self) -> PixelSize {
        let size = self.window.inner_size().to_logical::<u32>(self.window.scale_factor());
        PixelSize::new(size.width, size.height)
    }

    fn pixel_size(&self) -> PixelSize {
        let size = self.window.inner_size();
        PixelSize::new(size.width, size.height)
    }

    fn scale_factor(&self) -> f64 {
        self.window.scale_factor()
    }

    fn cursor_position(&self) -> Option<(f64, f64)> {
        self.cursor
    }

    fn set_title(&mut self, title: &str) {
        self.window.set_title(title);
    }
}

fn save_capture(capture: Capture, path: &Path) -> Result<()> {
    let image = image::RgbaImage::from_raw(capture.width, capture.height, capture.pixels)
        .context("capture size does not match its pixel buffer")?;
    image
        .save(path)
        .with_context(|| format!("writing {}", path.display()))?;
    tracing::info!(path = %path.display(), "capture saved");
    Ok(())
}

struct DesktopApp {
    controller: FrameController,
    surface: Option<WindowSurface>,
    capture_path: PathBuf,
    /// First fatal error; the event loop exits once it is set.
    error: Option<anyhow::Error>,
}

impl DesktopApp {
    fn new(controller: FrameController, capture_path: PathBuf) -> Self {
        Self {
            controller,
            surface: None,
            capture_path,
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        tracing::error!("{error:#}");
        self.error.get_or_insert(error);
        event_loop.exit();
    }

    fn render(&mut self, event_loop: &ActiveEventLoop) {
        let Some(surface) = &mut self.surface else {
            return;
        };
        match self.controller.tick(surface, Instant::now()) {
            Ok(Some(capture)) => {
                if let Err(e) = save_capture(capture, &self.capture_path) {
                    tracing::warn!("{e:#}");
                }
            }
            Ok(None) => {}
            Err(e) => self.fail(event_loop, e.into()),
        }
    }

    fn send(&mut self, event_loop: &ActiveEventLoop, event: HostEvent) {
        if let Err(e) = self.controller.handle_event(event) {
            self.fail(event_loop, e.into());
        }
    }
}

impl ApplicationHandler for DesktopApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.surface.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title("pathfiddle")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, anyhow::Error::new(e).context("creating window")),
        };

        let size = window.inner_size();
        let config = self.controller.config();
        let backend = match create_backend(
            &config.selection,
            &config.options,
            Some(Arc::clone(&window).into()),
            size.width,
            size.height,
        ) {
            Ok(backend) => backend,
            Err(e) => return self.fail(event_loop, anyhow::Error::new(e).context("creating backend")),
        };
        self.controller.init(backend);
        self.surface = Some(WindowSurface { window, cursor: None });
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                self.send(event_loop, HostEvent::Quit);
                event_loop.exit();
            }
            WindowEvent::Resized(_) => {
                self.send(event_loop, HostEvent::Resized);
                self.render(event_loop);
            }
            WindowEvent::CursorMoved { position, .. } => {
                if let Some(surface) = &mut self.surface {
                    let logical = position.to_logical::<f64>(surface.window.scale_factor());
                    surface.cursor = Some((logical.x, logical.y));
                }
            }
            WindowEvent::CursorLeft { .. } => {
                if let Some(surface) = &mut self.surface {
                    surface.cursor = None;
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => match key {
                KeyCode::Escape => {
                    self.send(event_loop, HostEvent::Quit);
                    event_loop.exit();
                }
                KeyCode::KeyZ => self.send(event_loop, HostEvent::ToggleZoom),
                KeyCode::KeyH => self.send(event_loop, HostEvent::HotloadShaders),
                KeyCode::KeyP => self.send(event_loop, HostEvent::CaptureFrame),
                _ => {}
            },
            WindowEvent::RedrawRequested => self.render(event_loop),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(surface) = &self.surface {
            surface.window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    tracing::info!("pathfiddle-desktop starting");

    let config = cli.harness.into_config(false);
    config.apply_loader_override();

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = DesktopApp::new(FrameController::new(config), cli.capture);
    event_loop.run_app(&mut app)?;

    app.controller.shutdown();
    drop(app.surface.take());
    match app.error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
