use std::path::PathBuf;

/// Environment variable overriding the configuration file location.
pub const CONFIG_ENV: &str = "XTHUNK_CONFIG";

/// Returns the default location of `xthunk.toml`.
pub fn default_config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return PathBuf::from(path);
    }
    #[cfg(unix)]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))
            .unwrap_or_else(|| PathBuf::from("/etc"));
        base.join("xthunk").join("xthunk.toml")
    }
    #[cfg(windows)]
    {
        let base = std::env::var_os("APPDATA")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(r"C:\ProgramData"));
        base.join("xthunk").join("xthunk.toml")
    }
}

/// Default file name of the host Vulkan loader.
pub fn default_vulkan_library() -> &'static str {
    #[cfg(target_os = "windows")]
    {
        "vulkan-1.dll"
    }
    #[cfg(target_os = "macos")]
    {
        "libvulkan.1.dylib"
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        "libvulkan.so.1"
    }
}

/// Default file name of the host OpenXR loader.
pub fn default_openxr_library() -> &'static str {
    #[cfg(target_os = "windows")]
    {
        "openxr_loader.dll"
    }
    #[cfg(target_os = "macos")]
    {
        "libopenxr_loader.dylib"
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        "libopenxr_loader.so.1"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(target_os = "linux")]
    #[test]
    fn linux_loader_names() {
        assert_eq!(default_vulkan_library(), "libvulkan.so.1");
        assert_eq!(default_openxr_library(), "libopenxr_loader.so.1");
    }

    #[test]
    fn config_path_names_the_config_file() {
        assert!(default_config_path().ends_with("xthunk.toml") || std::env::var_os(CONFIG_ENV).is_some());
    }
}
