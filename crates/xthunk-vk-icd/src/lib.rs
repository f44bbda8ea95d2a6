//! xthunk client ICD
//!
//! The client half of the thunk: exported Vulkan and OpenXR entry points
//! that pack their arguments into parameter blocks and cross to the host
//! library through an attached [`UnixCallDispatcher`]. Dispatchable handles
//! are client-owned headers the host binds its wrappers to.
//!
//! [`UnixCallDispatcher`]: xthunk_protocol::UnixCallDispatcher

use ash::vk;

pub mod command;
pub mod debug;
pub mod deferred;
pub mod device;
pub mod instance;
pub mod loader;
pub mod objects;
pub mod openxr;
pub mod proc_addr;
pub mod sync;

pub use loader::{attach, is_attached, LoaderOptions};

/// Highest loader interface version this ICD speaks.
pub const MAX_LOADER_INTERFACE_VERSION: u32 = 5;

/// Negotiate the ICD interface version with the Vulkan loader.
#[no_mangle]
pub unsafe extern "system" fn vk_icdNegotiateLoaderICDInterfaceVersion(supported_version: *mut u32) -> vk::Result {
    if supported_version.is_null() || !loader::is_attached() {
        return vk::Result::ERROR_INCOMPATIBLE_DRIVER;
    }
    // SAFETY: non-null per check above.
    unsafe { *supported_version = (*supported_version).min(MAX_LOADER_INTERFACE_VERSION) };
    vk::Result::SUCCESS
}

/// The loader's view of `vkGetInstanceProcAddr`.
#[no_mangle]
pub unsafe extern "system" fn vk_icdGetInstanceProcAddr(
    instance: vk::Instance,
    name: *const std::ffi::c_char,
) -> vk::PFN_vkVoidFunction {
    // SAFETY: forwarded.
    unsafe { proc_addr::vkGetInstanceProcAddr(instance, name) }
}
