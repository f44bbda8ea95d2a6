use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Top-level configuration, loaded from xthunk.toml.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThunkConfig {
    #[serde(default)]
    pub host: HostConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub surface: SurfaceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    /// Host Vulkan loader to open
    #[serde(default = "default_vulkan_library")]
    pub vulkan_library: String,
    /// Host OpenXR loader to open (None = OpenXR disabled)
    #[serde(default = "default_openxr_library")]
    pub openxr_library: Option<String>,
    /// Host extension substituted for VK_KHR_win32_surface
    #[serde(default = "default_surface_extension")]
    pub surface_extension: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Use the register-word path for hot vkCmd* calls
    #[serde(default = "default_true")]
    pub fast_path: bool,
    /// Serve 32-bit clients (parameter blocks in 32-bit layout)
    #[serde(default)]
    pub wow64: bool,
    /// Application names whose devices get the GET_DEVICE_PROC_ADDR quirk
    #[serde(default)]
    pub device_proc_addr_quirk_apps: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurfaceConfig {
    /// RGBA fill used when a drawable has no pixel content yet
    #[serde(default = "default_diagnostic_color")]
    pub diagnostic_color: [f32; 4],
    /// Check lock ranks at runtime (debug builds only)
    #[serde(default = "default_true")]
    pub lock_order_checks: bool,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            vulkan_library: default_vulkan_library(),
            openxr_library: default_openxr_library(),
            surface_extension: default_surface_extension(),
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            fast_path: true,
            wow64: false,
            device_proc_addr_quirk_apps: Vec::new(),
        }
    }
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            diagnostic_color: default_diagnostic_color(),
            lock_order_checks: true,
        }
    }
}

impl SurfaceConfig {
    /// The diagnostic color as a packed 0xAARRGGBB pixel.
    pub fn diagnostic_pixel(&self) -> u32 {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u32;
        let [r, g, b, a] = self.diagnostic_color;
        (channel(a) << 24) | (channel(r) << 16) | (channel(g) << 8) | channel(b)
    }
}

impl ThunkConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, CoreError> {
        toml::from_str(content).map_err(|e| CoreError::ConfigError(e.to_string()))
    }

    /// Load configuration from file if it exists, otherwise return defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => config,
            Err(CoreError::Io(_)) => Self::default(),
            Err(e) => {
                tracing::warn!("ignoring {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn to_toml(&self) -> Result<String, CoreError> {
        toml::to_string_pretty(self).map_err(|e| CoreError::ConfigError(e.to_string()))
    }
}

fn default_vulkan_library() -> String {
    xthunk_common::platform::default_vulkan_library().to_string()
}

fn default_openxr_library() -> Option<String> {
    Some(xthunk_common::platform::default_openxr_library().to_string())
}

fn default_surface_extension() -> String {
    "VK_KHR_xlib_surface".to_string()
}

fn default_diagnostic_color() -> [f32; 4] {
    [1.0, 0.0, 0.0, 1.0]
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = ThunkConfig::parse(
            r#"
            [dispatch]
            fast_path = false
            device_proc_addr_quirk_apps = ["GameOfOld.exe"]
            "#,
        )
        .unwrap();
        assert!(!config.dispatch.fast_path);
        assert!(!config.dispatch.wow64);
        assert_eq!(config.dispatch.device_proc_addr_quirk_apps, ["GameOfOld.exe"]);
        assert_eq!(config.host.surface_extension, "VK_KHR_xlib_surface");
        assert_eq!(config.surface.diagnostic_pixel(), 0xffff_0000);
    }

    #[test]
    fn bad_toml_is_a_config_error() {
        assert!(matches!(
            ThunkConfig::parse("[dispatch]\nfast_path = 3"),
            Err(CoreError::ConfigError(_))
        ));
    }
}
