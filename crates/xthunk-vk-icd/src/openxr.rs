//! OpenXR stubs.
//!
//! OpenXR handles are opaque 64-bit values to the application; the client
//! hands out the address of a [`ClientObject`] header the host binds its
//! wrapper to, the same way dispatchable Vulkan handles work.

use std::ffi::{c_char, c_void, CStr};
use std::ptr::NonNull;

use tracing::{debug, trace};
use xthunk_protocol::client::ClientObject;
use xthunk_protocol::params::*;
use xthunk_protocol::xr::{
    PfnXrCreateChild, PfnXrCreateInstance, PfnXrDestroyHandle, PfnXrEnumerateInstanceExtensionProperties,
    PfnXrGetInstanceProcAddr, PfnXrVoidFunction, XrExtensionProperties, XrHandle, XrResult,
};
use xthunk_protocol::FuncCode;

use crate::loader::{openxr_status, unix_call};
use crate::objects::{alloc_object, free_object, raw};
use crate::proc_addr::{find, proc_entry, ProcEntry};

fn object(handle: XrHandle) -> Option<NonNull<ClientObject>> {
    NonNull::new(handle as usize as *mut ClientObject)
}

#[no_mangle]
pub unsafe extern "system" fn xrEnumerateInstanceExtensionProperties(
    layer_name: *const c_char,
    capacity: u32,
    count: *mut u32,
    properties: *mut XrExtensionProperties,
) -> XrResult {
    let init = openxr_status();
    if !init.is_success() {
        return init;
    }
    let mut params = XrEnumerateInstanceExtensionPropertiesParams {
        layer_name,
        capacity,
        count,
        properties,
        result: XrResult::ERROR_RUNTIME_FAILURE,
    };
    unix_call(FuncCode::XrEnumerateInstanceExtensionProperties, &mut params);
    params.result
}

#[no_mangle]
pub unsafe extern "system" fn xrCreateInstance(create_info: *const c_void, instance: *mut XrHandle) -> XrResult {
    let init = openxr_status();
    if !init.is_success() {
        return init;
    }
    let client = alloc_object();
    let mut params = XrCreateInstanceParams {
        create_info,
        instance: client.as_ptr(),
        result: XrResult::ERROR_RUNTIME_FAILURE,
    };
    unix_call(FuncCode::XrCreateInstance, &mut params);
    if !params.result.is_success() {
        // SAFETY: the host bound nothing to the header.
        unsafe { free_object(client) };
        return params.result;
    }
    // SAFETY: out pointer per API contract.
    unsafe { *instance = raw(client) };
    debug!("OpenXR instance {:p}", client);
    params.result
}

/// Creates a child object of `parent` through `code`.
unsafe fn create_child(code: FuncCode, parent: XrHandle, create_info: *const c_void, out: *mut XrHandle) -> XrResult {
    let Some(parent) = object(parent) else {
        return XrResult::ERROR_HANDLE_INVALID;
    };
    let client = alloc_object();
    let mut params = XrCreateChildParams {
        parent: parent.as_ptr(),
        create_info,
        child: client.as_ptr(),
        result: XrResult::ERROR_RUNTIME_FAILURE,
    };
    unix_call(code, &mut params);
    if !params.result.is_success() {
        // SAFETY: the host bound nothing to the header.
        unsafe { free_object(client) };
        return params.result;
    }
    // SAFETY: out pointer per API contract.
    unsafe { *out = raw(client) };
    trace!("{} -> {:p}", code.name(), client);
    params.result
}

unsafe fn destroy(code: FuncCode, handle: XrHandle) -> XrResult {
    let Some(client) = object(handle) else {
        return XrResult::ERROR_HANDLE_INVALID;
    };
    let mut params = XrDestroyParams {
        handle: client.as_ptr(),
        result: XrResult::ERROR_RUNTIME_FAILURE,
    };
    unix_call(code, &mut params);
    if params.result.is_success() {
        // SAFETY: the host unregistered its wrapper.
        unsafe { free_object(client) };
    }
    params.result
}

#[no_mangle]
pub unsafe extern "system" fn xrDestroyInstance(instance: XrHandle) -> XrResult {
    // SAFETY: forwarded.
    unsafe { destroy(FuncCode::XrDestroyInstance, instance) }
}

#[no_mangle]
pub unsafe extern "system" fn xrCreateSession(instance: XrHandle, create_info: *const c_void, session: *mut XrHandle) -> XrResult {
    // SAFETY: forwarded.
    unsafe { create_child(FuncCode::XrCreateSession, instance, create_info, session) }
}

#[no_mangle]
pub unsafe extern "system" fn xrDestroySession(session: XrHandle) -> XrResult {
    // SAFETY: forwarded.
    unsafe { destroy(FuncCode::XrDestroySession, session) }
}

#[no_mangle]
pub unsafe extern "system" fn xrCreateSwapchain(
    session: XrHandle,
    create_info: *const c_void,
    swapchain: *mut XrHandle,
) -> XrResult {
    // SAFETY: forwarded.
    unsafe { create_child(FuncCode::XrCreateSwapchain, session, create_info, swapchain) }
}

#[no_mangle]
pub unsafe extern "system" fn xrDestroySwapchain(swapchain: XrHandle) -> XrResult {
    // SAFETY: forwarded.
    unsafe { destroy(FuncCode::XrDestroySwapchain, swapchain) }
}

#[no_mangle]
pub unsafe extern "system" fn xrCreateReferenceSpace(
    session: XrHandle,
    create_info: *const c_void,
    space: *mut XrHandle,
) -> XrResult {
    // SAFETY: forwarded.
    unsafe { create_child(FuncCode::XrCreateReferenceSpace, session, create_info, space) }
}

#[no_mangle]
pub unsafe extern "system" fn xrDestroySpace(space: XrHandle) -> XrResult {
    // SAFETY: forwarded.
    unsafe { destroy(FuncCode::XrDestroySpace, space) }
}

/// Entry points that need no instance.
static XR_GLOBAL: &[ProcEntry] = &[
    proc_entry!(xrGetInstanceProcAddr: PfnXrGetInstanceProcAddr),
    proc_entry!(xrEnumerateInstanceExtensionProperties: PfnXrEnumerateInstanceExtensionProperties),
    proc_entry!(xrCreateInstance: PfnXrCreateInstance),
];

static XR_INSTANCE: &[ProcEntry] = &[
    proc_entry!(xrDestroyInstance: PfnXrDestroyHandle),
    proc_entry!(xrCreateSession: PfnXrCreateChild),
    proc_entry!(xrDestroySession: PfnXrDestroyHandle),
    proc_entry!(xrCreateSwapchain: PfnXrCreateChild),
    proc_entry!(xrDestroySwapchain: PfnXrDestroyHandle),
    proc_entry!(xrCreateReferenceSpace: PfnXrCreateChild),
    proc_entry!(xrDestroySpace: PfnXrDestroyHandle),
];

/// Resolves OpenXR names. Instance-level names resolve only when the host
/// runtime exposes them for `instance`.
#[no_mangle]
pub unsafe extern "system" fn xrGetInstanceProcAddr(
    instance: XrHandle,
    name: *const c_char,
    function: *mut PfnXrVoidFunction,
) -> XrResult {
    if name.is_null() || function.is_null() {
        return XrResult::ERROR_VALIDATION_FAILURE;
    }
    // SAFETY: non-null names are strings.
    let wanted = unsafe { CStr::from_ptr(name) };
    // SAFETY: checked non-null above.
    unsafe { *function = None };

    if let Some(func) = find(XR_GLOBAL, wanted) {
        // SAFETY: as above.
        unsafe { *function = Some(func) };
        return XrResult::SUCCESS;
    }
    let Some(client) = object(instance) else {
        return XrResult::ERROR_HANDLE_INVALID;
    };

    let mut params = XrIsAvailableInstanceFunctionParams {
        instance: client.as_ptr(),
        name,
        result: 0,
    };
    unix_call(FuncCode::XrIsAvailableInstanceFunction, &mut params);
    if params.result == 0 {
        trace!("{:?} is not available", wanted);
        return XrResult::ERROR_FUNCTION_UNSUPPORTED;
    }
    match find(XR_INSTANCE, wanted) {
        Some(func) => {
            // SAFETY: as above.
            unsafe { *function = Some(func) };
            XrResult::SUCCESS
        }
        None => XrResult::ERROR_FUNCTION_UNSUPPORTED,
    }
}
