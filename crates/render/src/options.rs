use pathfiddle_common::Color;

/// Startup configuration consumed once by the backend factory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendOptions {
    /// Render at backing-pixel resolution on high-DPI displays.
    pub retina_display: bool,
    /// Compile pipelines on the calling thread before the first frame.
    pub synchronous_shader_compilations: bool,
    /// Allow `Backend::end` to copy the finished frame back to memory.
    /// Readback requests fail while this is off.
    pub enable_read_pixels: bool,
    pub disable_raster_ordering: bool,
    /// Request only downlevel device limits.
    pub core_features_only: bool,
    pub srgb: bool,
    pub allow_headless_rendering: bool,
    pub enable_validation_layers: bool,
    pub disable_debug_callbacks: bool,
    /// Case-insensitive substring an adapter name must contain.
    pub gpu_name_filter: Option<String>,
    /// Request the platform's software adapter (WARP on D3D12).
    pub force_fallback_adapter: bool,
}

impl Default for BackendOptions {
    fn default() -> Self {
        Self {
            retina_display: true,
            synchronous_shader_compilations: false,
            enable_read_pixels: true,
            disable_raster_ordering: false,
            core_features_only: false,
            srgb: false,
            allow_headless_rendering: false,
            enable_validation_layers: cfg!(debug_assertions),
            disable_debug_callbacks: false,
            gpu_name_filter: None,
            force_fallback_adapter: false,
        }
    }
}

/// Per-frame parameters passed to `Backend::begin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameDescriptor {
    pub render_target_width: u32,
    pub render_target_height: u32,
    pub clear_color: Color,
    pub msaa_sample_count: u32,
    pub disable_raster_ordering: bool,
    /// Draw fills as hairline outlines.
    pub wireframe: bool,
    pub fills_disabled: bool,
    pub strokes_disabled: bool,
    /// Approximates a clockwise-only fill rule by drawing every fill with
    /// non-zero winding. Counter-clockwise contours still fill, so this is
    /// broader than a strict clockwise rule.
    pub clockwise_fill_override: bool,
}

impl FrameDescriptor {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            render_target_width: width,
            render_target_height: height,
            ..Self::default()
        }
    }
}

impl Default for FrameDescriptor {
    fn default() -> Self {
        Self {
            render_target_width: 0,
            render_target_height: 0,
            clear_color: Color::BACKGROUND,
            msaa_sample_count: 0,
            disable_raster_ordering: false,
            wireframe: false,
            fills_disabled: false,
            strokes_disabled: false,
            clockwise_fill_override: false,
        }
    }
}

/// Resource and activity counters reported by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BackendStats {
    /// Targets and intermediate surfaces currently held.
    pub live_allocations: usize,
    pub offscreen_targets: usize,
    pub frames: u64,
    pub flushes: u64,
    pub readbacks: u64,
}
