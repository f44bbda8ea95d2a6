//! `VK_EXT_debug_utils` messengers. The host wraps the messenger and maps
//! every object handle in a callback back to the client's handle.

use ash::vk;
use xthunk_protocol::params::*;
use xthunk_protocol::FuncCode;

use crate::loader::unix_call;

#[no_mangle]
pub unsafe extern "system" fn vkCreateDebugUtilsMessengerEXT(
    instance: vk::Instance,
    create_info: *const vk::DebugUtilsMessengerCreateInfoEXT<'_>,
    allocator: *const vk::AllocationCallbacks<'_>,
    messenger: *mut vk::DebugUtilsMessengerEXT,
) -> vk::Result {
    let mut params = CreateDebugUtilsMessengerEXTParams {
        instance,
        create_info: create_info.cast(),
        allocator: allocator.cast(),
        messenger,
        result: vk::Result::ERROR_OUT_OF_HOST_MEMORY,
    };
    unix_call(FuncCode::CreateDebugUtilsMessengerEXT, &mut params);
    params.result
}

#[no_mangle]
pub unsafe extern "system" fn vkDestroyDebugUtilsMessengerEXT(
    instance: vk::Instance,
    messenger: vk::DebugUtilsMessengerEXT,
    allocator: *const vk::AllocationCallbacks<'_>,
) {
    let mut params = DestroyDebugUtilsMessengerEXTParams {
        instance,
        messenger,
        allocator: allocator.cast(),
    };
    unix_call(FuncCode::DestroyDebugUtilsMessengerEXT, &mut params);
}
