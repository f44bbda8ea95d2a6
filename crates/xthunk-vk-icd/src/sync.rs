//! Fences, semaphores and queue submission.

use ash::vk;
use xthunk_protocol::params::*;
use xthunk_protocol::FuncCode;

use crate::loader::unix_call;

#[no_mangle]
pub unsafe extern "system" fn vkCreateFence(
    device: vk::Device,
    create_info: *const vk::FenceCreateInfo<'_>,
    allocator: *const vk::AllocationCallbacks<'_>,
    fence: *mut vk::Fence,
) -> vk::Result {
    let mut params = CreateFenceParams {
        device,
        create_info: create_info.cast(),
        allocator: allocator.cast(),
        fence,
        result: vk::Result::ERROR_OUT_OF_HOST_MEMORY,
    };
    unix_call(FuncCode::CreateFence, &mut params);
    params.result
}

#[no_mangle]
pub unsafe extern "system" fn vkDestroyFence(
    device: vk::Device,
    fence: vk::Fence,
    allocator: *const vk::AllocationCallbacks<'_>,
) {
    let mut params = DestroyFenceParams {
        device,
        fence,
        allocator: allocator.cast(),
    };
    unix_call(FuncCode::DestroyFence, &mut params);
}

#[no_mangle]
pub unsafe extern "system" fn vkWaitForFences(
    device: vk::Device,
    fence_count: u32,
    fences: *const vk::Fence,
    wait_all: vk::Bool32,
    timeout: u64,
) -> vk::Result {
    let mut params = WaitForFencesParams {
        device,
        fence_count,
        fences,
        wait_all,
        timeout,
        result: vk::Result::ERROR_DEVICE_LOST,
    };
    unix_call(FuncCode::WaitForFences, &mut params);
    params.result
}

#[no_mangle]
pub unsafe extern "system" fn vkCreateSemaphore(
    device: vk::Device,
    create_info: *const vk::SemaphoreCreateInfo<'_>,
    allocator: *const vk::AllocationCallbacks<'_>,
    semaphore: *mut vk::Semaphore,
) -> vk::Result {
    let mut params = CreateSemaphoreParams {
        device,
        create_info: create_info.cast(),
        allocator: allocator.cast(),
        semaphore,
        result: vk::Result::ERROR_OUT_OF_HOST_MEMORY,
    };
    unix_call(FuncCode::CreateSemaphore, &mut params);
    params.result
}

#[no_mangle]
pub unsafe extern "system" fn vkDestroySemaphore(
    device: vk::Device,
    semaphore: vk::Semaphore,
    allocator: *const vk::AllocationCallbacks<'_>,
) {
    let mut params = DestroySemaphoreParams {
        device,
        semaphore,
        allocator: allocator.cast(),
    };
    unix_call(FuncCode::DestroySemaphore, &mut params);
}

#[no_mangle]
pub unsafe extern "system" fn vkQueueSubmit(
    queue: vk::Queue,
    submit_count: u32,
    submits: *const vk::SubmitInfo<'_>,
    fence: vk::Fence,
) -> vk::Result {
    let mut params = QueueSubmitParams {
        queue,
        submit_count,
        submits: submits.cast(),
        fence,
        result: vk::Result::ERROR_DEVICE_LOST,
    };
    unix_call(FuncCode::QueueSubmit, &mut params);
    params.result
}

#[no_mangle]
pub unsafe extern "system" fn vkQueueWaitIdle(queue: vk::Queue) -> vk::Result {
    let mut params = QueueWaitIdleParams {
        queue,
        result: vk::Result::ERROR_DEVICE_LOST,
    };
    unix_call(FuncCode::QueueWaitIdle, &mut params);
    params.result
}
