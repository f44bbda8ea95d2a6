//! Dynamic loading of the host Vulkan and OpenXR runtimes.
//!
//! The libraries are opened with `libloading`; everything else is resolved
//! through their `GetInstanceProcAddr` entry point. Tests build a driver
//! straight from a resolver function instead.

use std::ffi::{c_char, CStr};

use ash::vk;
use libloading::{Library, Symbol};
use tracing::{debug, info};
use xthunk_protocol::xr::{
    PfnXrCreateInstance, PfnXrEnumerateInstanceExtensionProperties, PfnXrGetInstanceProcAddr,
    PfnXrVoidFunction, XrHandle,
};

use crate::error::HostError;
use crate::funcs::GlobalFuncs;

/// The host Vulkan driver.
pub struct HostDriver {
    _lib: Option<Library>,
    get_instance_proc_addr: vk::PFN_vkGetInstanceProcAddr,
    pub global: GlobalFuncs,
}

impl HostDriver {
    /// Opens the Vulkan loader at `path`.
    pub fn load(path: &str) -> Result<Self, HostError> {
        let lib = open_library(path)?;
        // SAFETY: the symbol has this signature in every Vulkan loader.
        let gipa = unsafe { load_fn::<vk::PFN_vkGetInstanceProcAddr>(&lib, "vkGetInstanceProcAddr") }
            .ok_or(HostError::MissingEntry("vkGetInstanceProcAddr"))?;
        // SAFETY: resolved from the library just opened.
        let mut driver = unsafe { Self::from_proc_addr(gipa) };
        driver._lib = Some(lib);
        info!("loaded host Vulkan driver from {}", path);
        Ok(driver)
    }

    /// Wraps an already-resolved `vkGetInstanceProcAddr`.
    ///
    /// # Safety
    /// `gipa` must behave as the Vulkan entry point does for as long as the
    /// driver is used.
    pub unsafe fn from_proc_addr(gipa: vk::PFN_vkGetInstanceProcAddr) -> Self {
        // SAFETY: global names are resolved with a null instance.
        let global = unsafe { GlobalFuncs::load(|name| gipa(vk::Instance::null(), name.as_ptr())) };
        Self {
            _lib: None,
            get_instance_proc_addr: gipa,
            global,
        }
    }

    /// Host `vkGetInstanceProcAddr`.
    ///
    /// # Safety
    /// `instance` must be null or a live host instance.
    pub unsafe fn instance_proc_addr(&self, instance: vk::Instance, name: *const c_char) -> vk::PFN_vkVoidFunction {
        // SAFETY: forwarded from caller.
        unsafe { (self.get_instance_proc_addr)(instance, name) }
    }
}

/// The host OpenXR runtime.
pub struct XrDriver {
    _lib: Option<Library>,
    get_instance_proc_addr: PfnXrGetInstanceProcAddr,
    pub enumerate_instance_extension_properties: Option<PfnXrEnumerateInstanceExtensionProperties>,
    pub create_instance: Option<PfnXrCreateInstance>,
}

impl XrDriver {
    pub fn load(path: &str) -> Result<Self, HostError> {
        let lib = open_library(path)?;
        // SAFETY: the symbol has this signature in every OpenXR loader.
        let gipa = unsafe { load_fn::<PfnXrGetInstanceProcAddr>(&lib, "xrGetInstanceProcAddr") }
            .ok_or(HostError::MissingEntry("xrGetInstanceProcAddr"))?;
        // SAFETY: resolved from the library just opened.
        let mut driver = unsafe { Self::from_proc_addr(gipa) };
        driver._lib = Some(lib);
        info!("loaded host OpenXR runtime from {}", path);
        Ok(driver)
    }

    /// # Safety
    /// `gipa` must behave as `xrGetInstanceProcAddr` does.
    pub unsafe fn from_proc_addr(gipa: PfnXrGetInstanceProcAddr) -> Self {
        let mut driver = Self {
            _lib: None,
            get_instance_proc_addr: gipa,
            enumerate_instance_extension_properties: None,
            create_instance: None,
        };
        // SAFETY: null instance resolves global names.
        unsafe {
            driver.enumerate_instance_extension_properties =
                driver.resolve(0, c"xrEnumerateInstanceExtensionProperties");
            driver.create_instance = driver.resolve(0, c"xrCreateInstance");
        }
        driver
    }

    /// Raw `xrGetInstanceProcAddr`; `None` unless the runtime reports
    /// success with a non-null pointer.
    ///
    /// # Safety
    /// `instance` must be 0 or a live host instance.
    pub unsafe fn proc_addr(&self, instance: XrHandle, name: *const c_char) -> PfnXrVoidFunction {
        let mut func: PfnXrVoidFunction = None;
        // SAFETY: forwarded from caller.
        let result = unsafe { (self.get_instance_proc_addr)(instance, name, &mut func) };
        if result.is_success() {
            func
        } else {
            None
        }
    }

    /// Typed [`proc_addr`](Self::proc_addr).
    ///
    /// # Safety
    /// `F` must be the function pointer type of `name`.
    pub unsafe fn resolve<F: Copy>(&self, instance: XrHandle, name: &CStr) -> Option<F> {
        debug_assert_eq!(std::mem::size_of::<F>(), std::mem::size_of::<unsafe extern "system" fn()>());
        // SAFETY: forwarded from caller.
        let func = unsafe { self.proc_addr(instance, name.as_ptr()) }?;
        // SAFETY: F is a function pointer of the same size.
        Some(unsafe { std::mem::transmute_copy::<unsafe extern "system" fn(), F>(&func) })
    }
}

fn open_library(path: &str) -> Result<Library, HostError> {
    // SAFETY: loading a driver runs its initializers; that is the point.
    match unsafe { Library::new(path) } {
        Ok(lib) => Ok(lib),
        Err(source) => {
            debug!("failed to load {}: {}", path, source);
            Err(HostError::LibraryLoad {
                name: path.to_string(),
                source,
            })
        }
    }
}

unsafe fn load_fn<F: Copy>(lib: &Library, name: &str) -> Option<F> {
    // SAFETY: caller names a symbol of type F.
    unsafe { lib.get(name.as_bytes()) }.ok().map(|s: Symbol<F>| *s)
}
