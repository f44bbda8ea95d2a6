//! `VK_EXT_debug_utils` messengers.
//!
//! The host driver calls back into [`debug_utils_callback`], which swaps
//! every host object handle in the message for the client handle the
//! application knows before calling the application's callback.

use std::ffi::c_void;
use std::ptr;

use ash::vk;
use ash::vk::Handle;
use tracing::{debug, trace};
use xthunk_core::registry::{client_handle_from_host, lookup_by_client, register, unregister};
use xthunk_core::{ClientHandle, VulkanObject};

use crate::funcs::require;
use crate::objects::{HostDebugMessenger, HostInstance};
use crate::HostResult;

unsafe extern "system" fn debug_utils_callback(
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    types: vk::DebugUtilsMessageTypeFlagsEXT,
    data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>,
    user_data: *mut c_void,
) -> vk::Bool32 {
    // SAFETY: user_data is the messenger wrapper registered below, alive
    // until the host messenger is destroyed.
    let messenger = unsafe { &*user_data.cast::<HostDebugMessenger>() };
    let Some(callback) = messenger.user_callback else {
        return vk::FALSE;
    };
    if data.is_null() {
        // SAFETY: forwarding the driver's message unchanged.
        return unsafe { callback(severity, types, data, messenger.user_data) };
    }
    // SAFETY: messengers die before their instance.
    let instance = unsafe { messenger.instance.as_ref() };
    // SAFETY: the driver passes valid callback data.
    let mut data = unsafe { *data };
    let objects: Vec<vk::DebugUtilsObjectNameInfoEXT<'_>> = if data.p_objects.is_null() {
        Vec::new()
    } else {
        // SAFETY: object_count entries per the callback contract.
        unsafe { std::slice::from_raw_parts(data.p_objects, data.object_count as usize) }
            .iter()
            .map(|object| {
                let mut object = *object;
                object.object_handle =
                    client_handle_from_host(&instance.registry, object.object_type, object.object_handle);
                object
            })
            .collect()
    };
    data.p_objects = objects.as_ptr();
    trace!("debug message {:?} with {} objects", severity, objects.len());
    // SAFETY: the translated copy lives for the duration of the call.
    unsafe { callback(severity, types, &data, messenger.user_data) }
}

/// # Safety
/// `info` must be valid; `out` writable for one handle.
pub(crate) unsafe fn create_debug_messenger(
    instance: &HostInstance,
    info: *const vk::DebugUtilsMessengerCreateInfoEXT<'_>,
    out: *mut vk::DebugUtilsMessengerEXT,
) -> HostResult<vk::Result> {
    let create = require(instance.funcs.create_debug_utils_messenger_ext, "vkCreateDebugUtilsMessengerEXT")?;
    // SAFETY: valid per caller.
    let info = unsafe { &*info };
    let mut wrapper = Box::new(HostDebugMessenger {
        obj: VulkanObject::default(),
        handle: vk::DebugUtilsMessengerEXT::null(),
        instance: instance.into(),
        user_callback: info.pfn_user_callback,
        user_data: info.p_user_data,
    });
    let mut host_info = *info;
    host_info.pfn_user_callback = Some(debug_utils_callback);
    // The box keeps its address through `register`.
    host_info.p_user_data = ptr::from_mut(&mut *wrapper).cast();

    let mut handle = vk::DebugUtilsMessengerEXT::null();
    // SAFETY: the wrapper outlives the host messenger.
    let res = unsafe { create(instance.handle, &host_info, ptr::null(), &mut handle) };
    if res != vk::Result::SUCCESS {
        return Ok(res);
    }
    wrapper.handle = handle;
    wrapper.obj = VulkanObject::new(handle.as_raw());
    // SAFETY: the wrapper address becomes the client handle.
    unsafe {
        let messenger = register(wrapper, None, Some(&instance.registry));
        out.write_unaligned(vk::DebugUtilsMessengerEXT::from_raw(messenger.as_ref().obj.client_handle));
    }
    debug!("created debug messenger {:#x}", handle.as_raw());
    Ok(vk::Result::SUCCESS)
}

/// # Safety
/// `raw` must be 0 or a live messenger of `instance`.
pub(crate) unsafe fn destroy_debug_messenger(instance: &HostInstance, raw: u64) -> HostResult<()> {
    let Some(handle) = ClientHandle::opaque(raw) else {
        return Ok(());
    };
    let destroy = require(instance.funcs.destroy_debug_utils_messenger_ext, "vkDestroyDebugUtilsMessengerEXT")?;
    // SAFETY: live per caller; the host stops calling back once destroyed.
    unsafe {
        let messenger = lookup_by_client::<HostDebugMessenger>(handle);
        destroy(instance.handle, messenger.as_ref().handle, ptr::null());
        drop(unregister(messenger, Some(&instance.registry)));
    }
    Ok(())
}
