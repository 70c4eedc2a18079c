use pathfiddle_common::PixelSize;

/// The host window (or stand-in) a frame is produced for.
///
/// Backends only query it; the window itself stays owned by the host.
pub trait HostSurface {
    /// Size in logical (scale-independent) units.
    fn logical_size(&self) -> PixelSize;
    /// Size of the backing store in physical pixels.
    fn pixel_size(&self) -> PixelSize;
    fn scale_factor(&self) -> f64;
    /// Last known pointer position in logical units, if the pointer is inside.
    fn cursor_position(&self) -> Option<(f64, f64)>;
    fn set_title(&mut self, title: &str);
}

/// Windowless surface for headless rendering and tests.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessSurface {
    pub size: PixelSize,
    pub scale_factor: f64,
    pub cursor: Option<(f64, f64)>,
    pub title: String,
}

impl HeadlessSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: PixelSize::new(width, height),
            scale_factor: 1.0,
            cursor: None,
            title: String::new(),
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.size = PixelSize::new(width, height);
    }
}

impl HostSurface for HeadlessSurface {
    fn logical_size(&self) -> PixelSize {
        PixelSize::new(
            (self.size.width as f64 / self.scale_factor).round() as u32,
            (self.size.height as f64 / self.scale_factor).round() as u32,
        )
    }

    fn pixel_size(&self) -> PixelSize {
        self.size
    }

    fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    fn cursor_position(&self) -> Option<(f64, f64)> {
        self.cursor
    }

    fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }
}
