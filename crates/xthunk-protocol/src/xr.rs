//! The slice of the OpenXR ABI the boundary forwards.
//!
//! Create-info structures are forwarded untouched, so they appear here only
//! as opaque pointers.

use std::ffi::{c_char, c_void};
use std::fmt;

#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct XrResult(pub i32);

impl XrResult {
    pub const SUCCESS: Self = Self(0);
    pub const ERROR_VALIDATION_FAILURE: Self = Self(-1);
    pub const ERROR_RUNTIME_FAILURE: Self = Self(-2);
    pub const ERROR_OUT_OF_MEMORY: Self = Self(-3);
    pub const ERROR_INITIALIZATION_FAILED: Self = Self(-6);
    pub const ERROR_FUNCTION_UNSUPPORTED: Self = Self(-7);
    pub const ERROR_SIZE_INSUFFICIENT: Self = Self(-11);
    pub const ERROR_HANDLE_INVALID: Self = Self(-12);

    pub fn is_success(self) -> bool {
        self.0 >= 0
    }
}

impl fmt::Debug for XrResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "XrResult({})", self.0)
    }
}

/// Host-side OpenXR handle; the runtime's handles are 64 bits on every ABI.
pub type XrHandle = u64;

pub const XR_MAX_EXTENSION_NAME_SIZE: usize = 128;
pub const XR_TYPE_EXTENSION_PROPERTIES: i32 = 2;

#[repr(C)]
#[derive(Clone, Copy)]
pub struct XrExtensionProperties {
    pub ty: i32,
    pub next: *mut c_void,
    pub extension_name: [c_char; XR_MAX_EXTENSION_NAME_SIZE],
    pub extension_version: u32,
}

impl XrExtensionProperties {
    pub fn new(name: &str, version: u32) -> Self {
        let mut props = Self {
            ty: XR_TYPE_EXTENSION_PROPERTIES,
            next: std::ptr::null_mut(),
            extension_name: [0; XR_MAX_EXTENSION_NAME_SIZE],
            extension_version: version,
        };
        props.set_name(name);
        props
    }

    pub fn name(&self) -> &str {
        let bytes: &[u8] = bytemuck::cast_slice(&self.extension_name[..]);
        let len = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
        std::str::from_utf8(&bytes[..len]).unwrap_or("")
    }

    pub fn set_name(&mut self, name: &str) {
        self.extension_name = [0; XR_MAX_EXTENSION_NAME_SIZE];
        for (dst, src) in self
            .extension_name
            .iter_mut()
            .zip(name.bytes().take(XR_MAX_EXTENSION_NAME_SIZE - 1))
        {
            *dst = src as c_char;
        }
    }
}

pub const XR_MAX_APPLICATION_NAME_SIZE: usize = 128;
pub const XR_MAX_ENGINE_NAME_SIZE: usize = 128;
pub const XR_TYPE_INSTANCE_CREATE_INFO: i32 = 3;

#[repr(C)]
#[derive(Clone, Copy)]
pub struct XrApplicationInfo {
    pub application_name: [c_char; XR_MAX_APPLICATION_NAME_SIZE],
    pub application_version: u32,
    pub engine_name: [c_char; XR_MAX_ENGINE_NAME_SIZE],
    pub engine_version: u32,
    pub api_version: u64,
}

/// `XrInstanceCreateInfo`. The host rewrites its extension list; the rest
/// is forwarded as is.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct XrInstanceCreateInfo {
    pub ty: i32,
    pub next: *const c_void,
    pub create_flags: u64,
    pub application_info: XrApplicationInfo,
    pub enabled_api_layer_count: u32,
    pub enabled_api_layer_names: *const *const c_char,
    pub enabled_extension_count: u32,
    pub enabled_extension_names: *const *const c_char,
}

pub type PfnXrVoidFunction = Option<unsafe extern "system" fn()>;

pub type PfnXrGetInstanceProcAddr = unsafe extern "system" fn(
    instance: XrHandle,
    name: *const c_char,
    function: *mut PfnXrVoidFunction,
) -> XrResult;

pub type PfnXrEnumerateInstanceExtensionProperties = unsafe extern "system" fn(
    layer_name: *const c_char,
    capacity: u32,
    count: *mut u32,
    properties: *mut XrExtensionProperties,
) -> XrResult;

pub type PfnXrCreateInstance =
    unsafe extern "system" fn(create_info: *const c_void, instance: *mut XrHandle) -> XrResult;

pub type PfnXrDestroyHandle = unsafe extern "system" fn(handle: XrHandle) -> XrResult;

/// Shape shared by `xrCreateSession`, `xrCreateSwapchain` and
/// `xrCreateReferenceSpace`: parent, create info, out handle.
pub type PfnXrCreateChild = unsafe extern "system" fn(
    parent: XrHandle,
    create_info: *const c_void,
    out: *mut XrHandle,
) -> XrResult;

pub const XR_KHR_VULKAN_ENABLE: &str = "XR_KHR_vulkan_enable";
pub const XR_KHR_D3D11_ENABLE: &str = "XR_KHR_D3D11_enable";
pub const XR_KHR_D3D12_ENABLE: &str = "XR_KHR_D3D12_enable";
pub const XR_KHR_CONVERT_TIMESPEC_TIME: &str = "XR_KHR_convert_timespec_time";
pub const XR_KHR_WIN32_CONVERT_PERFORMANCE_COUNTER_TIME: &str =
    "XR_KHR_win32_convert_performance_counter_time";
pub const XR_KHR_D3D11_ENABLE_SPEC_VERSION: u32 = 9;
pub const XR_KHR_D3D12_ENABLE_SPEC_VERSION: u32 = 9;
pub const XR_KHR_WIN32_CONVERT_PERFORMANCE_COUNTER_TIME_SPEC_VERSION: u32 = 1;
