//! Deferred host operations.
//!
//! The host keeps converted arguments of a deferred call alive until the
//! operation is destroyed, so these stubs only forward.

use ash::vk;
use xthunk_protocol::params::*;
use xthunk_protocol::FuncCode;

use crate::loader::unix_call;

#[no_mangle]
pub unsafe extern "system" fn vkCreateDeferredOperationKHR(
    device: vk::Device,
    allocator: *const vk::AllocationCallbacks<'_>,
    deferred_operation: *mut vk::DeferredOperationKHR,
) -> vk::Result {
    let mut params = CreateDeferredOperationKHRParams {
        device,
        allocator: allocator.cast(),
        deferred_operation,
        result: vk::Result::ERROR_OUT_OF_HOST_MEMORY,
    };
    unix_call(FuncCode::CreateDeferredOperationKHR, &mut params);
    params.result
}

#[no_mangle]
pub unsafe extern "system" fn vkDestroyDeferredOperationKHR(
    device: vk::Device,
    operation: vk::DeferredOperationKHR,
    allocator: *const vk::AllocationCallbacks<'_>,
) {
    let mut params = DestroyDeferredOperationKHRParams {
        device,
        operation,
        allocator: allocator.cast(),
    };
    unix_call(FuncCode::DestroyDeferredOperationKHR, &mut params);
}

#[no_mangle]
pub unsafe extern "system" fn vkGetDeferredOperationResultKHR(
    device: vk::Device,
    operation: vk::DeferredOperationKHR,
) -> vk::Result {
    let mut params = GetDeferredOperationResultKHRParams {
        device,
        operation,
        result: vk::Result::ERROR_UNKNOWN,
    };
    unix_call(FuncCode::GetDeferredOperationResultKHR, &mut params);
    params.result
}

#[no_mangle]
pub unsafe extern "system" fn vkCopyAccelerationStructureKHR(
    device: vk::Device,
    deferred_operation: vk::DeferredOperationKHR,
    info: *const vk::CopyAccelerationStructureInfoKHR<'_>,
) -> vk::Result {
    let mut params = CopyAccelerationStructureKHRParams {
        device,
        deferred_operation,
        info: info.cast(),
        result: vk::Result::ERROR_OUT_OF_HOST_MEMORY,
    };
    unix_call(FuncCode::CopyAccelerationStructureKHR, &mut params);
    params.result
}
