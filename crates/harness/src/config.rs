use pathfiddle_common::Color;
use pathfiddle_render::{BackendOptions, BackendSelection, FrameDescriptor, LoaderOverride};
use std::path::PathBuf;

/// Typed startup configuration for one harness session.
#[derive(Debug, Clone, PartialEq)]
pub struct HarnessConfig {
    pub selection: BackendSelection,
    pub options: BackendOptions,
    pub msaa_sample_count: u32,
    pub clear_color: Color,
    pub wireframe: bool,
    pub fills_disabled: bool,
    pub strokes_disabled: bool,
    /// Explicit animation index; loses to `state_machine` when both are set.
    pub animation: Option<usize>,
    pub state_machine: Option<usize>,
    pub document_path: Option<PathBuf>,
    /// External command run before pipelines are rebuilt on hot reload.
    pub shader_rebuild_command: Option<String>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            selection: BackendSelection::default(),
            options: BackendOptions::default(),
            msaa_sample_count: 0,
            clear_color: Color::BACKGROUND,
            wireframe: false,
            fills_disabled: false,
            strokes_disabled: false,
            animation: None,
            state_machine: None,
            document_path: None,
            shader_rebuild_command: None,
        }
    }
}

impl HarnessConfig {
    /// Descriptor handed to `Backend::begin` for a frame of the given size.
    pub fn frame_descriptor(&self, width: u32, height: u32) -> FrameDescriptor {
        FrameDescriptor {
            render_target_width: width,
            render_target_height: height,
            clear_color: self.clear_color,
            msaa_sample_count: self.msaa_sample_count,
            disable_raster_ordering: self.selection.atomic || self.options.disable_raster_ordering,
            wireframe: self.wireframe,
            fills_disabled: self.fills_disabled,
            strokes_disabled: self.strokes_disabled,
            clockwise_fill_override: self.selection.clockwise_fill,
        }
    }

    /// Points the Vulkan loader at the selected ICD manifest, if any.
    ///
    /// Must run before any graphics instance is created.
    pub fn apply_loader_override(&self) -> Option<&'static str> {
        let loader = self.selection.loader?;
        let path = loader.icd_path();
        if let Ok(existing) = std::env::var(LoaderOverride::ENV_VAR) {
            tracing::warn!(
                "{} is already set to {existing:?}; overriding with {path:?}",
                LoaderOverride::ENV_VAR
            );
        }
        // SAFETY: called once at startup before any threads are spawned.
        unsafe { std::env::set_var(LoaderOverride::ENV_VAR, path) };
        tracing::info!(loader = ?loader, "vulkan loader override applied");
        Some(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathfiddle_render::ApiKind;

    #[test]
    fn frame_descriptor_carries_flags() {
        let mut cfg = HarnessConfig {
            selection: "glcw".parse().unwrap(),
            msaa_sample_count: 4,
            wireframe: true,
            ..HarnessConfig::default()
        };
        let frame = cfg.frame_descriptor(320, 200);
        assert_eq!(frame.render_target_width, 320);
        assert_eq!(frame.msaa_sample_count, 4);
        assert!(frame.disable_raster_ordering);
        assert!(frame.clockwise_fill_override);
        assert!(frame.wireframe);
        assert!(!frame.fills_disabled);

        cfg.selection = BackendSelection::new(ApiKind::Vulkan);
        let frame = cfg.frame_descriptor(1, 1);
        assert!(!frame.disable_raster_ordering);
        assert!(!frame.clockwise_fill_override);
    }

    #[test]
    fn no_loader_override_leaves_env_alone() {
        let cfg = HarnessConfig {
            selection: BackendSelection::new(ApiKind::Gl),
            ..HarnessConfig::default()
        };
        assert_eq!(cfg.apply_loader_override(), None);
    }
}
