//! Name resolution for the loader and the application.
//!
//! Names resolve from three static tables (instance, physical device and
//! device level). A name in a table is handed out only when the host driver
//! also exposes it, so the application never sees an entry point the host
//! cannot serve.

use std::ffi::{c_char, CStr};

use ash::vk;
use tracing::trace;
use xthunk_protocol::client::LoaderQuirks;
use xthunk_protocol::params::{IsAvailableDeviceFunctionParams, IsAvailableInstanceFunctionParams};
use xthunk_protocol::FuncCode;

use crate::loader::unix_call;
use crate::{command, debug, deferred, device, instance, sync};

pub(crate) struct ProcEntry {
    pub(crate) name: &'static CStr,
    pub(crate) func: unsafe extern "system" fn(),
}

/// `proc_entry!(module::vkName: PFN_vkName)` builds a table entry whose
/// name is the function's own identifier.
macro_rules! proc_entry {
    ($module:ident :: $name:ident : $pfn:ty) => {
        $crate::proc_addr::ProcEntry {
            // SAFETY: the literal ends in exactly one nul.
            name: unsafe { ::std::ffi::CStr::from_bytes_with_nul_unchecked(concat!(stringify!($name), "\0").as_bytes()) },
            // SAFETY: only the signature is erased; callers cast back to `$pfn`.
            func: unsafe { ::std::mem::transmute::<$pfn, unsafe extern "system" fn()>($module::$name as $pfn) },
        }
    };
    ($name:ident : $pfn:ty) => {
        $crate::proc_addr::ProcEntry {
            // SAFETY: the literal ends in exactly one nul.
            name: unsafe { ::std::ffi::CStr::from_bytes_with_nul_unchecked(concat!(stringify!($name), "\0").as_bytes()) },
            // SAFETY: only the signature is erased; callers cast back to `$pfn`.
            func: unsafe { ::std::mem::transmute::<$pfn, unsafe extern "system" fn()>($name as $pfn) },
        }
    };
}
pub(crate) use proc_entry;

pub(crate) fn find(table: &[ProcEntry], name: &CStr) -> vk::PFN_vkVoidFunction {
    table.iter().find(|e| e.name == name).map(|e| e.func)
}

/// Answered without an instance.
static GLOBAL: &[ProcEntry] = &[
    proc_entry!(instance::vkCreateInstance: vk::PFN_vkCreateInstance),
    proc_entry!(instance::vkEnumerateInstanceVersion: vk::PFN_vkEnumerateInstanceVersion),
    proc_entry!(instance::vkEnumerateInstanceExtensionProperties: vk::PFN_vkEnumerateInstanceExtensionProperties),
    proc_entry!(instance::vkEnumerateInstanceLayerProperties: vk::PFN_vkEnumerateInstanceLayerProperties),
    proc_entry!(vkGetInstanceProcAddr: vk::PFN_vkGetInstanceProcAddr),
];

static INSTANCE: &[ProcEntry] = &[
    proc_entry!(instance::vkDestroyInstance: vk::PFN_vkDestroyInstance),
    proc_entry!(instance::vkEnumeratePhysicalDevices: vk::PFN_vkEnumeratePhysicalDevices),
    proc_entry!(debug::vkCreateDebugUtilsMessengerEXT: vk::PFN_vkCreateDebugUtilsMessengerEXT),
    proc_entry!(debug::vkDestroyDebugUtilsMessengerEXT: vk::PFN_vkDestroyDebugUtilsMessengerEXT),
];

static PHYSICAL_DEVICE: &[ProcEntry] = &[
    proc_entry!(instance::vkGetPhysicalDeviceProperties: vk::PFN_vkGetPhysicalDeviceProperties),
    proc_entry!(instance::vkGetPhysicalDeviceFeatures2: vk::PFN_vkGetPhysicalDeviceFeatures2),
    proc_entry!(instance::vkEnumerateDeviceExtensionProperties: vk::PFN_vkEnumerateDeviceExtensionProperties),
    proc_entry!(instance::vkEnumerateDeviceLayerProperties: vk::PFN_vkEnumerateDeviceLayerProperties),
    proc_entry!(device::vkCreateDevice: vk::PFN_vkCreateDevice),
];

static DEVICE: &[ProcEntry] = &[
    proc_entry!(vkGetDeviceProcAddr: vk::PFN_vkGetDeviceProcAddr),
    proc_entry!(device::vkDestroyDevice: vk::PFN_vkDestroyDevice),
    proc_entry!(device::vkGetDeviceQueue: vk::PFN_vkGetDeviceQueue),
    proc_entry!(device::vkDeviceWaitIdle: vk::PFN_vkDeviceWaitIdle),
    proc_entry!(command::vkCreateCommandPool: vk::PFN_vkCreateCommandPool),
    proc_entry!(command::vkDestroyCommandPool: vk::PFN_vkDestroyCommandPool),
    proc_entry!(command::vkAllocateCommandBuffers: vk::PFN_vkAllocateCommandBuffers),
    proc_entry!(command::vkFreeCommandBuffers: vk::PFN_vkFreeCommandBuffers),
    proc_entry!(command::vkBeginCommandBuffer: vk::PFN_vkBeginCommandBuffer),
    proc_entry!(command::vkEndCommandBuffer: vk::PFN_vkEndCommandBuffer),
    proc_entry!(command::vkCmdDraw: vk::PFN_vkCmdDraw),
    proc_entry!(command::vkCmdDrawIndexed: vk::PFN_vkCmdDrawIndexed),
    proc_entry!(command::vkCmdDispatch: vk::PFN_vkCmdDispatch),
    proc_entry!(command::vkCmdSetLineWidth: vk::PFN_vkCmdSetLineWidth),
    proc_entry!(command::vkCmdSetDepthBias: vk::PFN_vkCmdSetDepthBias),
    proc_entry!(command::vkCmdSetStencilReference: vk::PFN_vkCmdSetStencilReference),
    proc_entry!(command::vkCmdSetBlendConstants: vk::PFN_vkCmdSetBlendConstants),
    proc_entry!(command::vkCmdBindPipeline: vk::PFN_vkCmdBindPipeline),
    proc_entry!(sync::vkCreateFence: vk::PFN_vkCreateFence),
    proc_entry!(sync::vkDestroyFence: vk::PFN_vkDestroyFence),
    proc_entry!(sync::vkWaitForFences: vk::PFN_vkWaitForFences),
    proc_entry!(sync::vkCreateSemaphore: vk::PFN_vkCreateSemaphore),
    proc_entry!(sync::vkDestroySemaphore: vk::PFN_vkDestroySemaphore),
    proc_entry!(sync::vkQueueSubmit: vk::PFN_vkQueueSubmit),
    proc_entry!(sync::vkQueueWaitIdle: vk::PFN_vkQueueWaitIdle),
    proc_entry!(deferred::vkCreateDeferredOperationKHR: vk::PFN_vkCreateDeferredOperationKHR),
    proc_entry!(deferred::vkDestroyDeferredOperationKHR: vk::PFN_vkDestroyDeferredOperationKHR),
    proc_entry!(deferred::vkGetDeferredOperationResultKHR: vk::PFN_vkGetDeferredOperationResultKHR),
    proc_entry!(deferred::vkCopyAccelerationStructureKHR: vk::PFN_vkCopyAccelerationStructureKHR),
];

fn is_available_instance_function(instance: vk::Instance, name: *const c_char) -> bool {
    let mut params = IsAvailableInstanceFunctionParams {
        instance,
        name,
        result: vk::FALSE,
    };
    unix_call(FuncCode::IsAvailableInstanceFunction, &mut params);
    params.result != vk::FALSE
}

fn is_available_device_function(device: vk::Device, name: *const c_char) -> bool {
    let mut params = IsAvailableDeviceFunctionParams {
        device,
        name,
        result: vk::FALSE,
    };
    unix_call(FuncCode::IsAvailableDeviceFunction, &mut params);
    params.result != vk::FALSE
}

/// Every name any table can resolve, for diagnostics.
pub fn table_names() -> impl Iterator<Item = &'static CStr> {
    [GLOBAL, INSTANCE, PHYSICAL_DEVICE, DEVICE]
        .into_iter()
        .flat_map(|table| table.iter().map(|e| e.name))
}

#[no_mangle]
pub unsafe extern "system" fn vkGetInstanceProcAddr(instance: vk::Instance, name: *const c_char) -> vk::PFN_vkVoidFunction {
    if name.is_null() {
        return None;
    }
    // SAFETY: non-null names are strings.
    let wanted = unsafe { CStr::from_ptr(name) };

    if let Some(func) = find(GLOBAL, wanted) {
        return Some(func);
    }
    if instance == vk::Instance::null() {
        trace!("{:?} requested without an instance", wanted);
        return None;
    }
    if !is_available_instance_function(instance, name) {
        return None;
    }
    // Instance-level lookups also return child-level functions.
    find(INSTANCE, wanted)
        .or_else(|| find(PHYSICAL_DEVICE, wanted))
        .or_else(|| find(DEVICE, wanted))
}

#[no_mangle]
pub unsafe extern "system" fn vkGetDeviceProcAddr(device: vk::Device, name: *const c_char) -> vk::PFN_vkVoidFunction {
    if device == vk::Device::null() || name.is_null() {
        return None;
    }
    // SAFETY: as above.
    let wanted = unsafe { CStr::from_ptr(name) };

    if is_available_device_function(device, name) {
        if let Some(func) = find(DEVICE, wanted) {
            return Some(func);
        }
    }

    // Some applications resolve instance functions through the device.
    // SAFETY: device is a live client device.
    if unsafe { device::quirks(device) }.contains(LoaderQuirks::GET_DEVICE_PROC_ADDR) {
        if let Some(func) = find(INSTANCE, wanted).or_else(|| find(PHYSICAL_DEVICE, wanted)) {
            trace!("{:?} resolved through the device for a quirked application", wanted);
            return Some(func);
        }
    }
    None
}

/// Physical-device-level names for the loader's trampolines.
#[no_mangle]
pub unsafe extern "system" fn vk_icdGetPhysicalDeviceProcAddr(
    _instance: vk::Instance,
    name: *const c_char,
) -> vk::PFN_vkVoidFunction {
    if name.is_null() {
        return None;
    }
    // SAFETY: non-null names are strings.
    find(PHYSICAL_DEVICE, unsafe { CStr::from_ptr(name) })
}
