//! Instance and physical device stubs.

use std::ffi::c_char;
use std::ptr::NonNull;

use ash::vk;
use ash::vk::Handle;
use tracing::{debug, trace};
use xthunk_protocol::client::ClientInstance;
use xthunk_protocol::params::*;
use xthunk_protocol::FuncCode;

use crate::loader::{unix_call, vulkan_status};
use crate::objects::{alloc_instance, free_instance, raw};

/// Physical device slots reserved on the first creation attempt.
const INITIAL_PHYS_DEV_CAPACITY: u32 = 8;

#[no_mangle]
pub unsafe extern "system" fn vkCreateInstance(
    create_info: *const vk::InstanceCreateInfo<'_>,
    allocator: *const vk::AllocationCallbacks<'_>,
    instance: *mut vk::Instance,
) -> vk::Result {
    let init = vulkan_status();
    if init != vk::Result::SUCCESS {
        return init;
    }

    let mut capacity = INITIAL_PHYS_DEV_CAPACITY;
    loop {
        let Some(client) = alloc_instance(capacity) else {
            return vk::Result::ERROR_OUT_OF_HOST_MEMORY;
        };
        let mut slot = client.as_ptr();
        let mut params = CreateInstanceParams {
            create_info: create_info.cast(),
            allocator: allocator.cast(),
            instance: &mut slot,
            result: vk::Result::ERROR_INITIALIZATION_FAILED,
        };
        unix_call(FuncCode::CreateInstance, &mut params);

        // SAFETY: the header stays ours until we free or return it.
        let wanted = unsafe { client.as_ref() }.phys_dev_count;
        match params.result {
            vk::Result::SUCCESS => {
                trace!("instance {:p} with {} physical devices", client, wanted);
                // SAFETY: out pointer per API contract.
                unsafe { *instance = vk::Instance::from_raw(raw(client)) };
                return vk::Result::SUCCESS;
            }
            vk::Result::ERROR_OUT_OF_POOL_MEMORY if wanted > capacity => {
                debug!("retrying instance creation with room for {} physical devices", wanted);
                // SAFETY: the host bound nothing to the header.
                unsafe { free_instance(client) };
                capacity = wanted;
            }
            err => {
                // SAFETY: as above.
                unsafe { free_instance(client) };
                return err;
            }
        }
    }
}

#[no_mangle]
pub unsafe extern "system" fn vkDestroyInstance(instance: vk::Instance, allocator: *const vk::AllocationCallbacks<'_>) {
    let mut params = DestroyInstanceParams {
        instance,
        allocator: allocator.cast(),
    };
    unix_call(FuncCode::DestroyInstance, &mut params);
    if let Some(client) = NonNull::new(instance.as_raw() as usize as *mut ClientInstance) {
        // SAFETY: the host has dropped every reference to the header.
        unsafe { free_instance(client) };
    }
}

#[no_mangle]
pub unsafe extern "system" fn vkEnumerateInstanceVersion(api_version: *mut u32) -> vk::Result {
    let mut params = EnumerateInstanceVersionParams {
        api_version,
        result: vk::Result::ERROR_INITIALIZATION_FAILED,
    };
    unix_call(FuncCode::EnumerateInstanceVersion, &mut params);
    params.result
}

#[no_mangle]
pub unsafe extern "system" fn vkEnumerateInstanceExtensionProperties(
    layer_name: *const c_char,
    property_count: *mut u32,
    properties: *mut vk::ExtensionProperties,
) -> vk::Result {
    let init = vulkan_status();
    if init != vk::Result::SUCCESS {
        return init;
    }
    let mut params = EnumerateInstanceExtensionPropertiesParams {
        layer_name,
        property_count,
        properties,
        result: vk::Result::ERROR_INITIALIZATION_FAILED,
    };
    unix_call(FuncCode::EnumerateInstanceExtensionProperties, &mut params);
    params.result
}

/// No layers are exposed through the boundary.
#[no_mangle]
pub unsafe extern "system" fn vkEnumerateInstanceLayerProperties(
    property_count: *mut u32,
    _properties: *mut vk::LayerProperties,
) -> vk::Result {
    // SAFETY: out pointer per API contract.
    unsafe { *property_count = 0 };
    vk::Result::SUCCESS
}

#[no_mangle]
pub unsafe extern "system" fn vkEnumeratePhysicalDevices(
    instance: vk::Instance,
    physical_device_count: *mut u32,
    physical_devices: *mut vk::PhysicalDevice,
) -> vk::Result {
    let mut params = EnumeratePhysicalDevicesParams {
        instance,
        physical_device_count,
        physical_devices,
        result: vk::Result::ERROR_INITIALIZATION_FAILED,
    };
    unix_call(FuncCode::EnumeratePhysicalDevices, &mut params);
    params.result
}

#[no_mangle]
pub unsafe extern "system" fn vkGetPhysicalDeviceProperties(
    physical_device: vk::PhysicalDevice,
    properties: *mut vk::PhysicalDeviceProperties,
) {
    let mut params = GetPhysicalDevicePropertiesParams {
        physical_device,
        properties,
    };
    unix_call(FuncCode::GetPhysicalDeviceProperties, &mut params);
}

#[no_mangle]
pub unsafe extern "system" fn vkGetPhysicalDeviceFeatures2(
    physical_device: vk::PhysicalDevice,
    features: *mut vk::PhysicalDeviceFeatures2<'_>,
) {
    let mut params = GetPhysicalDeviceFeatures2Params {
        physical_device,
        features: features.cast(),
    };
    unix_call(FuncCode::GetPhysicalDeviceFeatures2, &mut params);
}

#[no_mangle]
pub unsafe extern "system" fn vkEnumerateDeviceExtensionProperties(
    physical_device: vk::PhysicalDevice,
    layer_name: *const c_char,
    property_count: *mut u32,
    properties: *mut vk::ExtensionProperties,
) -> vk::Result {
    let mut params = EnumerateDeviceExtensionPropertiesParams {
        physical_device,
        layer_name,
        property_count,
        properties,
        result: vk::Result::ERROR_INITIALIZATION_FAILED,
    };
    unix_call(FuncCode::EnumerateDeviceExtensionProperties, &mut params);
    params.result
}

#[no_mangle]
pub unsafe extern "system" fn vkEnumerateDeviceLayerProperties(
    _physical_device: vk::PhysicalDevice,
    property_count: *mut u32,
    _properties: *mut vk::LayerProperties,
) -> vk::Result {
    // SAFETY: out pointer per API contract.
    unsafe { *property_count = 0 };
    vk::Result::SUCCESS
}
