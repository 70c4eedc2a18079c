use std::fmt;
use std::str::FromStr;

/// GPU API a backend presents through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiKind {
    Gl,
    Metal,
    D3d11,
    D3d12,
    Vulkan,
    Dawn,
}

impl ApiKind {
    /// Platform default: Metal on macOS, D3D12 on Windows, GL elsewhere.
    pub fn platform_default() -> Self {
        if cfg!(target_os = "macos") {
            ApiKind::Metal
        } else if cfg!(target_os = "windows") {
            ApiKind::D3d12
        } else {
            ApiKind::Gl
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ApiKind::Gl => "gl",
            ApiKind::Metal => "metal",
            ApiKind::D3d11 => "d3d",
            ApiKind::D3d12 => "d3d12",
            ApiKind::Vulkan => "vulkan",
            ApiKind::Dawn => "dawn",
        }
    }
}

impl fmt::Display for ApiKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which vector engine draws the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EngineKind {
    /// GPU compute rasterizer.
    #[default]
    Vello,
    /// Alternate CPU rasterizer, used as a comparison engine.
    VelloCpu,
}

impl EngineKind {
    pub fn label(&self) -> &'static str {
        match self {
            EngineKind::Vello => "VELLO Renderer",
            EngineKind::VelloCpu => "VELLO_CPU Renderer",
        }
    }
}

/// Vulkan loader manifest override requested by a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderOverride {
    MoltenVk,
    SwiftShader,
}

impl LoaderOverride {
    pub const ENV_VAR: &'static str = "VK_ICD_FILENAMES";

    pub fn icd_path(&self) -> &'static str {
        match self {
            LoaderOverride::MoltenVk => {
                "dependencies/MoltenVK/Package/Release/MoltenVK/dynamic/dylib/macOS/MoltenVK_icd.json"
            }
            LoaderOverride::SwiftShader => {
                if cfg!(target_os = "macos") {
                    "dependencies/SwiftShader/build/Darwin/vk_swiftshader_icd.json"
                } else if cfg!(target_os = "windows") {
                    "dependencies/SwiftShader/build/Windows/vk_swiftshader_icd.json"
                } else {
                    "dependencies/SwiftShader/build/Linux/vk_swiftshader_icd.json"
                }
            }
        }
    }
}

/// A parsed backend selector such as `glatomic` or `vkcw`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendSelection {
    pub api: ApiKind,
    pub engine: EngineKind,
    /// Forces raster ordering off ("atomic" mode).
    pub atomic: bool,
    pub clockwise_fill: bool,
    pub loader: Option<LoaderOverride>,
}

impl BackendSelection {
    pub fn new(api: ApiKind) -> Self {
        Self {
            api,
            engine: EngineKind::Vello,
            atomic: false,
            clockwise_fill: false,
            loader: None,
        }
    }

    fn atomic(mut self) -> Self {
        self.atomic = true;
        self
    }

    fn clockwise(mut self) -> Self {
        self.clockwise_fill = true;
        self
    }

    fn loader(mut self, loader: LoaderOverride) -> Self {
        self.loader = Some(loader);
        self
    }
}

impl Default for BackendSelection {
    fn default() -> Self {
        Self::new(ApiKind::platform_default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown backend selector: {0}")]
pub struct UnknownSelector(pub String);

impl FromStr for BackendSelection {
    type Err = UnknownSelector;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use ApiKind::*;
        let sel = BackendSelection::new;
        let parsed = match s.trim_start_matches('-') {
            "gl" => sel(Gl),
            "glatomic" => sel(Gl).atomic(),
            "glcw" => sel(Gl).atomic().clockwise(),
            "metal" => sel(Metal),
            "metalcw" => sel(Metal).clockwise(),
            "metalatomic" => sel(Metal).atomic(),
            "mvk" | "moltenvk" => sel(Vulkan).loader(LoaderOverride::MoltenVk),
            "mvkatomic" | "moltenvkatomic" => {
                sel(Vulkan).loader(LoaderOverride::MoltenVk).atomic()
            }
            "sw" | "swiftshader" => sel(Vulkan).loader(LoaderOverride::SwiftShader),
            "swatomic" | "swiftshaderatomic" => {
                sel(Vulkan).loader(LoaderOverride::SwiftShader).atomic()
            }
            "dawn" => sel(Dawn),
            "d3d" => sel(D3d11),
            "d3d12" => sel(D3d12),
            "d3datomic" => sel(D3d11).atomic(),
            "d3d12atomic" => sel(D3d12).atomic(),
            "vulkan" | "vk" => sel(Vulkan),
            "vkcw" => sel(Vulkan).clockwise(),
            "vulkanatomic" | "vkatomic" => sel(Vulkan).atomic(),
            other => return Err(UnknownSelector(other.to_string())),
        };
        Ok(parsed)
    }
}
