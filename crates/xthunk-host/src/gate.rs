//! Capability gate: an entry point is available to the client exactly when
//! the host resolver returns a non-null pointer for it.

use std::ffi::{c_char, CStr};

use ash::vk;
use tracing::trace;

use crate::context::HostContext;
use crate::objects::{HostDevice, HostInstance, XrHostInstance};

fn bool32(available: bool, name: *const c_char) -> vk::Bool32 {
    if !available && !name.is_null() {
        // SAFETY: gate names are strings.
        trace!("{:?} is not available on the host", unsafe { CStr::from_ptr(name) });
    }
    vk::Bool32::from(available)
}

/// # Safety
/// `name` must be a string.
pub(crate) unsafe fn is_available_instance_function(
    ctx: &HostContext,
    instance: &HostInstance,
    name: *const c_char,
) -> vk::Bool32 {
    // SAFETY: live instance; name per caller.
    let available = unsafe { ctx.driver().instance_proc_addr(instance.handle, name) }.is_some();
    bool32(available, name)
}

/// # Safety
/// `name` must be a string.
pub(crate) unsafe fn is_available_device_function(device: &HostDevice, name: *const c_char) -> vk::Bool32 {
    let available = match device.instance().funcs.get_device_proc_addr {
        // SAFETY: live device; name per caller.
        Some(get) => unsafe { get(device.handle, name) }.is_some(),
        None => false,
    };
    bool32(available, name)
}

/// # Safety
/// `name` must be a string.
pub(crate) unsafe fn xr_is_available_instance_function(
    ctx: &HostContext,
    instance: &XrHostInstance,
    name: *const c_char,
) -> vk::Bool32 {
    let available = match ctx.xr() {
        // SAFETY: live instance; name per caller.
        Some(xr) => unsafe { xr.proc_addr(instance.handle, name) }.is_some(),
        None => false,
    };
    bool32(available, name)
}
