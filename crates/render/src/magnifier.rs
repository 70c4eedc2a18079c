//! Magnifier overlay: a pointer-centered region of the finished frame redrawn
//! scaled into a fixed inset at the bottom-left corner.
//!
//! Layout math and the CPU compositor live here; GPU backends implement the
//! same steps with copies and scissored draws.

/// Source region size in backing pixels.
pub const ZOOM_WINDOW_WIDTH: u32 = 70;
pub const ZOOM_WINDOW_HEIGHT: u32 = 42;
/// Integer magnification factor.
pub const ZOOM_WINDOW_SCALE: u32 = 7;
/// Gray level of the one-pixel backdrop border.
pub const ZOOM_BORDER_GRAY: f32 = 0.6;

/// Inset plus its one-pixel border on each side.
pub const ZOOM_BACKDROP_WIDTH: u32 = ZOOM_WINDOW_WIDTH * ZOOM_WINDOW_SCALE + 2;
pub const ZOOM_BACKDROP_HEIGHT: u32 = ZOOM_WINDOW_HEIGHT * ZOOM_WINDOW_SCALE + 2;

/// Bytes in the intermediate RGBA8 zoom surface.
pub const ZOOM_SURFACE_BYTES: usize = (ZOOM_WINDOW_WIDTH * ZOOM_WINDOW_HEIGHT * 4) as usize;

/// Rectangle in top-left-origin pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoomLayout {
    /// Region sampled from the frame.
    pub source: PixelRect,
    /// Cleared to gray before the inset is drawn.
    pub backdrop: PixelRect,
    /// Destination of the scaled source.
    pub inset: PixelRect,
}

/// Converts a logical pointer position into backing pixels.
pub fn pointer_to_backing(pointer: (f64, f64), dpi_scale: f32) -> (f64, f64) {
    (pointer.0 * dpi_scale as f64, pointer.1 * dpi_scale as f64)
}

/// Computes the overlay layout for a target, or `None` if the target is too
/// small to hold the inset.
///
/// A missing pointer centers the source on the target.
pub fn zoom_layout(pointer: Option<(f64, f64)>, target_width: u32, target_height: u32) -> Option<ZoomLayout> {
    if target_width < ZOOM_BACKDROP_WIDTH || target_height < ZOOM_BACKDROP_HEIGHT {
        return None;
    }

    let (px, py) = pointer.unwrap_or((target_width as f64 / 2.0, target_height as f64 / 2.0));
    let clamp_axis = |p: f64, window: u32, extent: u32| -> u32 {
        let start = p.floor() as i64 - (window / 2) as i64;
        start.clamp(0, (extent - window) as i64) as u32
    };

    let source = PixelRect::new(
        clamp_axis(px, ZOOM_WINDOW_WIDTH, target_width),
        clamp_axis(py, ZOOM_WINDOW_HEIGHT, target_height),
        ZOOM_WINDOW_WIDTH,
        ZOOM_WINDOW_HEIGHT,
    );
    let backdrop = PixelRect::new(
        0,
        target_height - ZOOM_BACKDROP_HEIGHT,
        ZOOM_BACKDROP_WIDTH,
        ZOOM_BACKDROP_HEIGHT,
    );
    let inset = PixelRect::new(
        1,
        backdrop.y + 1,
        ZOOM_WINDOW_WIDTH * ZOOM_WINDOW_SCALE,
        ZOOM_WINDOW_HEIGHT * ZOOM_WINDOW_SCALE,
    );

    Some(ZoomLayout {
        source,
        backdrop,
        inset,
    })
}

/// Binary magnifier state: off, or on with its intermediate surface.
#[derive(Debug, Default)]
pub enum Magnifier<S> {
    #[default]
    Off,
    On(S),
}

impl<S> Magnifier<S> {
    pub fn is_on(&self) -> bool {
        matches!(self, Magnifier::On(_))
    }

    pub fn surface(&self) -> Option<&S> {
        match self {
            Magnifier::On(s) => Some(s),
            Magnifier::Off => None,
        }
    }

    pub fn surface_mut(&mut self) -> Option<&mut S> {
        match self {
            Magnifier::On(s) => Some(s),
            Magnifier::Off => None,
        }
    }

    /// Flips the state. Off to on allocates through `allocate`; on to off
    /// drops the surface. Returns the new on/off state.
    pub fn toggle<E>(&mut self, allocate: impl FnOnce() -> Result<S, E>) -> Result<bool, E> {
        match self {
            Magnifier::On(_) => {
                *self = Magnifier::Off;
                tracing::debug!("magnifier off");
                Ok(false)
            }
            Magnifier::Off => {
                *self = Magnifier::On(allocate()?);
                tracing::debug!("magnifier on");
                Ok(true)
            }
        }
    }
}

/// Composites the overlay into a tightly packed RGBA8 frame.
///
/// `zoom` is the intermediate surface and must hold [`ZOOM_SURFACE_BYTES`].
pub fn composite_zoom_rgba(frame: &mut [u8], frame_width: u32, layout: &ZoomLayout, zoom: &mut [u8]) {
    let stride = frame_width as usize * 4;
    let zoom_stride = ZOOM_WINDOW_WIDTH as usize * 4;
    debug_assert_eq!(zoom.len(), ZOOM_SURFACE_BYTES);

    let src = layout.source;
    for row in 0..src.height as usize {
        let from = (src.y as usize + row) * stride + src.x as usize * 4;
        zoom[row * zoom_stride..(row + 1) * zoom_stride].copy_from_slice(&frame[from..from + zoom_stride]);
    }

    let gray = (ZOOM_BORDER_GRAY * 255.0).round() as u8;
    let back = layout.backdrop;
    for y in back.y..back.bottom() {
        let row = y as usize * stride;
        for px in frame[row + back.x as usize * 4..row + back.right() as usize * 4].chunks_exact_mut(4) {
            px.copy_from_slice(&[gray, gray, gray, 0xff]);
        }
    }

    let inset = layout.inset;
    let scale = ZOOM_WINDOW_SCALE as usize;
    for y in 0..inset.height as usize {
        let zoom_row = (y / scale) * zoom_stride;
        let row = (inset.y as usize + y) * stride + inset.x as usize * 4;
        for x in 0..inset.width as usize {
            let z = zoom_row + (x / scale) * 4;
            frame[row + x * 4..row + x * 4 + 4].copy_from_slice(&zoom[z..z + 4]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_requires_room_for_inset() {
        assert!(zoom_layout(None, 491, 1000).is_none());
        assert!(zoom_layout(None, 1000, 295).is_none());
        assert!(zoom_layout(None, 492, 296).is_some());
    }

    #[test]
    fn layout_centers_on_pointer() {
        let l = zoom_layout(Some((400.0, 300.0)), 800, 600).unwrap();
        assert_eq!(l.source, PixelRect::new(365, 279, 70, 42));
        assert_eq!(l.backdrop, PixelRect::new(0, 304, 492, 296));
        assert_eq!(l.inset, PixelRect::new(1, 305, 490, 294));
        assert_eq!(l.inset.bottom(), 599);
    }

    #[test]
    fn layout_clamps_source_at_edges() {
        let l = zoom_layout(Some((2.0, 1000.0)), 800, 600).unwrap();
        assert_eq!(l.source.x, 0);
        assert_eq!(l.source.bottom(), 600);
        let l = zoom_layout(Some((-50.0, -50.0)), 800, 600).unwrap();
        assert_eq!((l.source.x, l.source.y), (0, 0));
    }

    #[test]
    fn missing_pointer_uses_center() {
        let l = zoom_layout(None, 800, 600).unwrap();
        assert_eq!((l.source.x, l.source.y), (365, 279));
    }

    #[test]
    fn pointer_scaled_to_backing_pixels() {
        assert_eq!(pointer_to_backing((10.0, 20.0), 2.0), (20.0, 40.0));
    }

    #[test]
    fn toggle_allocates_then_releases() {
        let mut m: Magnifier<Vec<u8>> = Magnifier::default();
        assert!(!m.is_on());
        let on = m.toggle(|| Ok::<_, ()>(vec![0u8; 4])).unwrap();
        assert!(on && m.is_on());
        assert_eq!(m.surface().map(Vec::len), Some(4));
        let on = m.toggle(|| Err::<Vec<u8>, _>("unused")).unwrap();
        assert!(!on);
        assert!(m.surface().is_none());
    }

    #[test]
    fn failed_allocation_stays_off() {
        let mut m: Magnifier<Vec<u8>> = Magnifier::Off;
        assert!(m.toggle(|| Err::<Vec<u8>, _>("oom")).is_err());
        assert!(!m.is_on());
    }

    #[test]
    fn cpu_composite_scales_source_into_inset() {
        let (w, h) = (600u32, 400u32);
        let mut frame = vec![0u8; (w * h * 4) as usize];
        let layout = zoom_layout(Some((300.0, 100.0)), w, h).unwrap();
        let s = layout.source;
        let first = ((s.y * w + s.x) * 4) as usize;
        frame[first..first + 4].copy_from_slice(&[255, 0, 0, 255]);

        let mut zoom = vec![0u8; ZOOM_SURFACE_BYTES];
        composite_zoom_rgba(&mut frame, w, &layout, &mut zoom);

        assert_eq!(&zoom[0..4], &[255, 0, 0, 255]);
        let at = |x: u32, y: u32| {
            let i = ((y * w + x) * 4) as usize;
            [frame[i], frame[i + 1], frame[i + 2], frame[i + 3]]
        };
        let inset = layout.inset;
        assert_eq!(at(inset.x, inset.y), [255, 0, 0, 255]);
        assert_eq!(at(inset.x + 6, inset.y + 6), [255, 0, 0, 255]);
        assert_eq!(at(inset.x + 7, inset.y), [0, 0, 0, 0]);
        assert_eq!(at(0, layout.backdrop.y), [153, 153, 153, 255]);
    }
}
