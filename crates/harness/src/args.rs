use crate::config::HarnessConfig;
use pathfiddle_render::{BackendOptions, BackendSelection, EngineKind};
use std::path::PathBuf;

/// Command-line flags shared by the desktop and headless front ends.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct HarnessArgs {
    /// Backend selector: gl, glatomic, glcw, metal, metalcw, metalatomic,
    /// d3d, d3datomic, d3d12, d3d12atomic, vulkan/vk, vkcw, vkatomic,
    /// dawn, mvk, mvkatomic, sw, swatomic
    #[arg(long, value_name = "API")]
    pub api: Option<BackendSelection>,

    /// Force raster ordering off
    #[arg(long)]
    pub atomic: bool,

    /// Render with the CPU engine instead of the GPU engine
    #[arg(long)]
    pub cpu: bool,

    /// Animation index to play
    #[arg(short = 'a', long)]
    pub animation: Option<usize>,

    /// State machine index to run (wins over --animation)
    #[arg(short = 's', long = "state-machine")]
    pub state_machine: Option<usize>,

    /// MSAA sample count, 0 for analytic antialiasing
    #[arg(long, default_value_t = 0)]
    pub msaa: u32,

    /// Only use a GPU whose name contains NAME
    #[arg(short = 'G', long = "gpu", value_name = "NAME")]
    pub gpu: Option<String>,

    /// Use the software fallback adapter (WARP on D3D12)
    #[arg(long = "d3d12-warp")]
    pub d3d12_warp: bool,

    /// Enable graphics API validation
    #[arg(long)]
    pub validation: bool,

    /// Draw fills as hairline outlines
    #[arg(long)]
    pub wireframe: bool,

    #[arg(long = "no-fill")]
    pub no_fill: bool,

    #[arg(long = "no-stroke")]
    pub no_stroke: bool,

    /// Compile pipelines before the first frame
    #[arg(long = "sync-shaders")]
    pub sync_shaders: bool,

    /// Prefer an sRGB surface format
    #[arg(long)]
    pub srgb: bool,

    /// Render at logical rather than backing resolution
    #[arg(long = "no-retina")]
    pub no_retina: bool,

    /// Refuse frame readback; captures are ignored
    #[arg(long = "no-read-pixels")]
    pub no_read_pixels: bool,

    /// Request only downlevel device limits
    #[arg(long = "core-features")]
    pub core_features: bool,

    /// Command run before shaders are hot reloaded
    #[arg(long = "shader-rebuild", value_name = "CMD")]
    pub shader_rebuild: Option<String>,

    /// Document to load
    pub document: Option<PathBuf>,
}

impl HarnessArgs {
    pub fn into_config(self, headless: bool) -> HarnessConfig {
        let mut selection = self.api.unwrap_or_default();
        selection.atomic |= self.atomic;
        if self.cpu {
            selection.engine = EngineKind::VelloCpu;
        }
        let defaults = BackendOptions::default();
        let options = BackendOptions {
            retina_display: !self.no_retina,
            synchronous_shader_compilations: self.sync_shaders,
            enable_read_pixels: !self.no_read_pixels,
            core_features_only: self.core_features,
            srgb: self.srgb,
            allow_headless_rendering: headless,
            enable_validation_layers: self.validation || defaults.enable_validation_layers,
            gpu_name_filter: self.gpu,
            force_fallback_adapter: self.d3d12_warp,
            ..defaults
        };
        HarnessConfig {
            selection,
            options,
            msaa_sample_count: self.msaa,
            wireframe: self.wireframe,
            fills_disabled: self.no_fill,
            strokes_disabled: self.no_stroke,
            animation: self.animation,
            state_machine: self.state_machine,
            document_path: self.document,
            shader_rebuild_command: self.shader_rebuild,
            ..HarnessConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pathfiddle_render::{ApiKind, LoaderOverride};

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: HarnessArgs,
    }

    fn parse(argv: &[&str]) -> HarnessConfig {
        let mut full = vec!["test"];
        full.extend_from_slice(argv);
        TestCli::try_parse_from(full).unwrap().args.into_config(false)
    }

    #[test]
    fn defaults() {
        let cfg = parse(&[]);
        assert_eq!(cfg.selection, BackendSelection::default());
        assert!(cfg.options.retina_display);
        assert!(!cfg.options.allow_headless_rendering);
        assert_eq!(cfg.document_path, None);
    }

    #[test]
    fn full_flag_set() {
        let cfg = parse(&[
            "--api", "mvk", "--atomic", "--cpu", "-a", "2", "-s", "0", "--msaa", "4", "-G", "nvidia",
            "--wireframe", "--no-fill", "--no-retina", "--sync-shaders", "--shader-rebuild", "make shaders",
            "doc.pfd",
        ]);
        assert_eq!(cfg.selection.api, ApiKind::Vulkan);
        assert_eq!(cfg.selection.loader, Some(LoaderOverride::MoltenVk));
        assert_eq!(cfg.selection.engine, EngineKind::VelloCpu);
        assert!(cfg.selection.atomic);
        assert_eq!((cfg.animation, cfg.state_machine), (Some(2), Some(0)));
        assert_eq!(cfg.msaa_sample_count, 4);
        assert_eq!(cfg.options.gpu_name_filter.as_deref(), Some("nvidia"));
        assert!(cfg.wireframe && cfg.fills_disabled && !cfg.strokes_disabled);
        assert!(!cfg.options.retina_display);
        assert!(cfg.options.synchronous_shader_compilations);
        assert_eq!(cfg.shader_rebuild_command.as_deref(), Some("make shaders"));
        assert_eq!(cfg.document_path, Some(PathBuf::from("doc.pfd")));
    }

    #[test]
    fn unknown_api_rejected() {
        assert!(TestCli::try_parse_from(["test", "--api", "opengl9"]).is_err());
    }

    #[test]
    fn headless_enables_offscreen_rendering() {
        let cfg = TestCli::try_parse_from(["test"]).unwrap().args.into_config(true);
        assert!(cfg.options.allow_headless_rendering);
        assert!(cfg.options.enable_read_pixels);
    }

    #[test]
    fn readback_and_fallback_adapter_flags() {
        let cfg = parse(&[]);
        assert!(cfg.options.enable_read_pixels);
        assert!(!cfg.options.force_fallback_adapter);

        let cfg = parse(&["--api", "d3d12", "--d3d12-warp", "--no-read-pixels"]);
        assert!(!cfg.options.enable_read_pixels);
        assert!(cfg.options.force_fallback_adapter);
    }
}
