//! A fake host Vulkan driver for the thunk tests.
//!
//! Handles are plain numbers in recognizable ranges; every call that the
//! tests check is recorded in [`FakeState`]. `vkCmdDispatch` is missing on
//! purpose.

#![allow(dead_code, unsafe_op_in_unsafe_fn)]

use std::ffi::{c_char, c_void, CStr};
use std::ptr::{self, NonNull};

use ash::vk;
use ash::vk::Handle;
use parking_lot::{Mutex, MutexGuard};
use xthunk_core::ThunkConfig;
use xthunk_host::{HostContext, HostDriver, UnixLib};
use xthunk_protocol::client::{alloc_trailing, ClientDevice, ClientInstance, ClientObject};
use xthunk_protocol::params::{CreateDeviceParams, CreateInstanceParams};
use xthunk_protocol::{FuncCode, NtStatus, UnixCallDispatcher};

pub const HOST_INSTANCE: u64 = 0x1000;
pub const HOST_PHYSICAL_DEVICE: u64 = 0x2000;
pub const HOST_DEVICE: u64 = 0x3000;
pub const HOST_QUEUE: u64 = 0x4000;
pub const HOST_MESSENGER: u64 = 0x9000;

pub const FAKE_DEVICE_NAME: &str = "Fake GPU";
pub const FAKE_VENDOR_ID: u32 = 0x1234;
pub const FAKE_MAP_ALIGNMENT: usize = 64;

pub struct FakeState {
    pub physical_devices: usize,
    pub enabled_instance_extensions: Vec<String>,
    pub draws: Vec<(u64, [u32; 4])>,
    pub blend_constants: Vec<(u64, [f32; 4])>,
    pub depth_bias: Vec<(u64, [f32; 3])>,
    pub submitted: Vec<u64>,
    pub allocated_in_pool: Vec<(u64, u64)>,
    pub freed: Vec<u64>,
    /// Host instances and devices in destruction order.
    pub destroyed: Vec<u64>,
    pub semaphore_initial_values: Vec<u64>,
    /// Pending deferred copies: operation and the info pointer as given.
    pub pending_copies: Vec<(u64, usize)>,
    /// Source and destination read when a deferred copy completed.
    pub completed_copies: Vec<(u64, u64)>,
    pub messenger: Option<(vk::PFN_vkDebugUtilsMessengerCallbackEXT, usize)>,
    next_handle: u64,
}

impl FakeState {
    const fn new() -> Self {
        Self {
            physical_devices: 2,
            enabled_instance_extensions: Vec::new(),
            draws: Vec::new(),
            blend_constants: Vec::new(),
            depth_bias: Vec::new(),
            submitted: Vec::new(),
            allocated_in_pool: Vec::new(),
            freed: Vec::new(),
            destroyed: Vec::new(),
            semaphore_initial_values: Vec::new(),
            pending_copies: Vec::new(),
            completed_copies: Vec::new(),
            messenger: None,
            next_handle: 0x10_0000,
        }
    }

    fn next(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }
}

static STATE: Mutex<FakeState> = Mutex::new(FakeState::new());
static SERIAL: Mutex<()> = Mutex::new(());

pub fn state() -> MutexGuard<'static, FakeState> {
    STATE.lock()
}

/// Serializes tests over the shared fake and resets it.
pub fn setup() -> (MutexGuard<'static, ()>, UnixLib) {
    setup_with(ThunkConfig::default())
}

pub fn setup_with(config: ThunkConfig) -> (MutexGuard<'static, ()>, UnixLib) {
    let guard = serial();
    let lib = UnixLib::new(context(config)).unwrap();
    (guard, lib)
}

/// Takes the test lock and resets the fake.
pub fn serial() -> MutexGuard<'static, ()> {
    let guard = SERIAL.lock();
    *STATE.lock() = FakeState::new();
    guard
}

pub fn context(config: ThunkConfig) -> HostContext {
    xthunk_common::logging::try_init_test_logging();
    // SAFETY: the fake resolver returns pointers of the right types.
    let driver = unsafe { HostDriver::from_proc_addr(get_instance_proc_addr) };
    HostContext::new(driver, config)
}

pub fn call<P>(lib: &UnixLib, code: FuncCode, params: &mut P) -> NtStatus {
    unsafe { lib.call(code, ptr::from_mut(params).cast()) }
}

pub fn raw<T>(ptr: NonNull<T>) -> u64 {
    ptr.as_ptr() as usize as u64
}

pub fn client_instance(capacity: u32) -> NonNull<ClientInstance> {
    let layout = ClientInstance::layout(capacity as usize);
    let inst = unsafe { alloc_trailing::<ClientInstance>(layout, capacity as usize) }.unwrap();
    unsafe { (*inst.as_ptr()).capacity = capacity };
    inst
}

pub fn client_device(queue_count: u32) -> NonNull<ClientDevice> {
    let layout = ClientDevice::layout(queue_count as usize);
    let dev = unsafe { alloc_trailing::<ClientDevice>(layout, queue_count as usize) }.unwrap();
    unsafe { (*dev.as_ptr()).queue_count = queue_count };
    dev
}

pub fn client_object() -> NonNull<ClientObject> {
    NonNull::from(Box::leak(Box::new(ClientObject::new())))
}

/// Creates an instance with enough physical device slots.
pub fn create_instance(lib: &UnixLib, extensions: &[&CStr]) -> (vk::Result, NonNull<ClientInstance>) {
    let names: Vec<*const c_char> = extensions.iter().map(|e| e.as_ptr()).collect();
    let app = vk::ApplicationInfo::default().application_name(c"thunk-test");
    let info = vk::InstanceCreateInfo::default()
        .application_info(&app)
        .enabled_extension_names(&names);
    let mut client = client_instance(4).as_ptr();
    let mut params = CreateInstanceParams {
        create_info: ptr::from_ref(&info).cast(),
        allocator: ptr::null(),
        instance: &mut client,
        result: vk::Result::ERROR_UNKNOWN,
    };
    assert_eq!(call(lib, FuncCode::CreateInstance, &mut params), NtStatus::SUCCESS);
    (params.result, NonNull::new(client).unwrap())
}

pub fn first_physical_device(instance: NonNull<ClientInstance>) -> vk::PhysicalDevice {
    let header = unsafe { ClientInstance::phys_dev(instance, 0) };
    vk::PhysicalDevice::from_raw(raw(header))
}

/// Creates a device with `queue_count` queues in family 0.
pub fn create_device(lib: &UnixLib, pd: vk::PhysicalDevice, queue_count: u32) -> NonNull<ClientDevice> {
    let priorities = vec![1.0f32; queue_count as usize];
    let queues = [vk::DeviceQueueCreateInfo::default()
        .queue_family_index(0)
        .queue_priorities(&priorities)];
    let info = vk::DeviceCreateInfo::default().queue_create_infos(&queues);
    let mut client = client_device(queue_count).as_ptr();
    let mut params = CreateDeviceParams {
        physical_device: pd,
        create_info: ptr::from_ref(&info).cast(),
        allocator: ptr::null(),
        device: &mut client,
        result: vk::Result::ERROR_UNKNOWN,
    };
    assert_eq!(call(lib, FuncCode::CreateDevice, &mut params), NtStatus::SUCCESS);
    assert_eq!(params.result, vk::Result::SUCCESS);
    NonNull::new(client).unwrap()
}

/// Calls the registered messenger the way a driver would, naming the host
/// instance, the host device and an unwrapped image.
pub fn fire_debug_message(image: u64) -> vk::Bool32 {
    let (callback, user_data) = state().messenger.expect("no messenger registered");
    let callback = callback.expect("messenger without callback");
    let object = |object_type, object_handle| vk::DebugUtilsObjectNameInfoEXT {
        object_type,
        object_handle,
        ..Default::default()
    };
    let objects = [
        object(vk::ObjectType::INSTANCE, HOST_INSTANCE),
        object(vk::ObjectType::DEVICE, HOST_DEVICE),
        object(vk::ObjectType::IMAGE, image),
    ];
    let data = vk::DebugUtilsMessengerCallbackDataEXT::default()
        .message(c"fake validation message")
        .objects(&objects);
    unsafe {
        callback(
            vk::DebugUtilsMessageSeverityFlagsEXT::WARNING,
            vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION,
            &data,
            user_data as *mut c_void,
        )
    }
}

fn write_name(dst: &mut [c_char], name: &str) {
    dst.fill(0);
    for (d, s) in dst.iter_mut().zip(name.bytes()) {
        *d = s as c_char;
    }
}

unsafe fn enumerate<T: Copy>(items: &[T], count: *mut u32, out: *mut T) -> vk::Result {
    if out.is_null() {
        *count = items.len() as u32;
        return vk::Result::SUCCESS;
    }
    let n = (*count as usize).min(items.len());
    ptr::copy_nonoverlapping(items.as_ptr(), out, n);
    *count = n as u32;
    if n < items.len() {
        vk::Result::INCOMPLETE
    } else {
        vk::Result::SUCCESS
    }
}

fn extension_list(names: &[&str]) -> Vec<vk::ExtensionProperties> {
    names
        .iter()
        .map(|name| {
            let mut props = vk::ExtensionProperties::default();
            write_name(&mut props.extension_name, name);
            props.spec_version = 1;
            props
        })
        .collect()
}

unsafe extern "system" fn enumerate_instance_version(version: *mut u32) -> vk::Result {
    *version = vk::API_VERSION_1_3;
    vk::Result::SUCCESS
}

unsafe extern "system" fn enumerate_instance_extension_properties(
    _layer: *const c_char,
    count: *mut u32,
    out: *mut vk::ExtensionProperties,
) -> vk::Result {
    let exts = extension_list(&[
        "VK_KHR_surface",
        "VK_KHR_xlib_surface",
        "VK_KHR_wayland_surface",
        "VK_EXT_debug_utils",
    ]);
    enumerate(&exts, count, out)
}

unsafe extern "system" fn fake_create_instance(
    info: *const vk::InstanceCreateInfo<'_>,
    _alloc: *const vk::AllocationCallbacks<'_>,
    out: *mut vk::Instance,
) -> vk::Result {
    let info = &*info;
    let mut state = state();
    state.enabled_instance_extensions = (0..info.enabled_extension_count as usize)
        .map(|i| CStr::from_ptr(*info.pp_enabled_extension_names.add(i)).to_string_lossy().into_owned())
        .collect();
    *out = vk::Instance::from_raw(HOST_INSTANCE);
    vk::Result::SUCCESS
}

unsafe extern "system" fn destroy_instance(instance: vk::Instance, _alloc: *const vk::AllocationCallbacks<'_>) {
    state().destroyed.push(instance.as_raw());
}

unsafe extern "system" fn enumerate_physical_devices(
    _instance: vk::Instance,
    count: *mut u32,
    out: *mut vk::PhysicalDevice,
) -> vk::Result {
    let n = state().physical_devices as u64;
    let devices: Vec<vk::PhysicalDevice> =
        (0..n).map(|i| vk::PhysicalDevice::from_raw(HOST_PHYSICAL_DEVICE + i)).collect();
    enumerate(&devices, count, out)
}

unsafe extern "system" fn get_physical_device_properties(
    _pd: vk::PhysicalDevice,
    out: *mut vk::PhysicalDeviceProperties,
) {
    let mut props = vk::PhysicalDeviceProperties {
        api_version: vk::API_VERSION_1_3,
        vendor_id: FAKE_VENDOR_ID,
        device_type: vk::PhysicalDeviceType::DISCRETE_GPU,
        ..Default::default()
    };
    write_name(&mut props.device_name, FAKE_DEVICE_NAME);
    props.limits.max_image_dimension2_d = 16384;
    props.limits.min_memory_map_alignment = FAKE_MAP_ALIGNMENT;
    props.limits.min_texel_buffer_offset_alignment = 16;
    *out = props;
}

unsafe extern "system" fn get_physical_device_features2(
    _pd: vk::PhysicalDevice,
    out: *mut vk::PhysicalDeviceFeatures2<'_>,
) {
    (*out).features.geometry_shader = vk::TRUE;
    let mut next = (*out).p_next.cast::<vk::BaseOutStructure<'_>>();
    while !next.is_null() {
        if (*next).s_type == vk::StructureType::PHYSICAL_DEVICE_TIMELINE_SEMAPHORE_FEATURES {
            (*next.cast::<vk::PhysicalDeviceTimelineSemaphoreFeatures<'_>>()).timeline_semaphore = vk::TRUE;
        }
        next = (*next).p_next;
    }
}

unsafe extern "system" fn enumerate_device_extension_properties(
    _pd: vk::PhysicalDevice,
    _layer: *const c_char,
    count: *mut u32,
    out: *mut vk::ExtensionProperties,
) -> vk::Result {
    let exts = extension_list(&[
        "VK_KHR_swapchain",
        "VK_KHR_external_memory_fd",
        "VK_KHR_deferred_host_operations",
    ]);
    enumerate(&exts, count, out)
}

unsafe extern "system" fn fake_create_device(
    _pd: vk::PhysicalDevice,
    _info: *const vk::DeviceCreateInfo<'_>,
    _alloc: *const vk::AllocationCallbacks<'_>,
    out: *mut vk::Device,
) -> vk::Result {
    *out = vk::Device::from_raw(HOST_DEVICE);
    vk::Result::SUCCESS
}

unsafe extern "system" fn destroy_device(device: vk::Device, _alloc: *const vk::AllocationCallbacks<'_>) {
    state().destroyed.push(device.as_raw());
}

unsafe extern "system" fn get_device_queue(_device: vk::Device, family: u32, index: u32, out: *mut vk::Queue) {
    *out = vk::Queue::from_raw(HOST_QUEUE + (family as u64) * 16 + index as u64);
}

unsafe extern "system" fn device_wait_idle(_device: vk::Device) -> vk::Result {
    vk::Result::SUCCESS
}

unsafe extern "system" fn create_command_pool(
    _device: vk::Device,
    _info: *const vk::CommandPoolCreateInfo<'_>,
    _alloc: *const vk::AllocationCallbacks<'_>,
    out: *mut vk::CommandPool,
) -> vk::Result {
    *out = vk::CommandPool::from_raw(state().next());
    vk::Result::SUCCESS
}

unsafe extern "system" fn destroy_command_pool(
    _device: vk::Device,
    _pool: vk::CommandPool,
    _alloc: *const vk::AllocationCallbacks<'_>,
) {
}

unsafe extern "system" fn allocate_command_buffers(
    _device: vk::Device,
    info: *const vk::CommandBufferAllocateInfo<'_>,
    out: *mut vk::CommandBuffer,
) -> vk::Result {
    let info = &*info;
    let mut state = state();
    for i in 0..info.command_buffer_count as usize {
        let handle = state.next();
        state.allocated_in_pool.push((info.command_pool.as_raw(), handle));
        *out.add(i) = vk::CommandBuffer::from_raw(handle);
    }
    vk::Result::SUCCESS
}

unsafe extern "system" fn free_command_buffers(
    _device: vk::Device,
    _pool: vk::CommandPool,
    count: u32,
    buffers: *const vk::CommandBuffer,
) {
    let mut state = state();
    for i in 0..count as usize {
        state.freed.push((*buffers.add(i)).as_raw());
    }
}

unsafe extern "system" fn begin_command_buffer(
    _cb: vk::CommandBuffer,
    _info: *const vk::CommandBufferBeginInfo<'_>,
) -> vk::Result {
    vk::Result::SUCCESS
}

unsafe extern "system" fn end_command_buffer(_cb: vk::CommandBuffer) -> vk::Result {
    vk::Result::SUCCESS
}

unsafe extern "system" fn cmd_draw(cb: vk::CommandBuffer, vertices: u32, instances: u32, first_vertex: u32, first_instance: u32) {
    state().draws.push((cb.as_raw(), [vertices, instances, first_vertex, first_instance]));
}

unsafe extern "system" fn cmd_set_depth_bias(cb: vk::CommandBuffer, constant: f32, clamp: f32, slope: f32) {
    state().depth_bias.push((cb.as_raw(), [constant, clamp, slope]));
}

unsafe extern "system" fn cmd_set_blend_constants(cb: vk::CommandBuffer, constants: *const [f32; 4]) {
    state().blend_constants.push((cb.as_raw(), *constants));
}

unsafe extern "system" fn create_fence(
    _device: vk::Device,
    _info: *const vk::FenceCreateInfo<'_>,
    _alloc: *const vk::AllocationCallbacks<'_>,
    out: *mut vk::Fence,
) -> vk::Result {
    *out = vk::Fence::from_raw(state().next());
    vk::Result::SUCCESS
}

unsafe extern "system" fn destroy_fence(_device: vk::Device, _fence: vk::Fence, _alloc: *const vk::AllocationCallbacks<'_>) {}

unsafe extern "system" fn create_semaphore(
    _device: vk::Device,
    info: *const vk::SemaphoreCreateInfo<'_>,
    _alloc: *const vk::AllocationCallbacks<'_>,
    out: *mut vk::Semaphore,
) -> vk::Result {
    let mut state = state();
    let mut next = (*info).p_next.cast::<vk::BaseInStructure<'_>>();
    while !next.is_null() {
        if (*next).s_type == vk::StructureType::SEMAPHORE_TYPE_CREATE_INFO {
            let timeline = &*next.cast::<vk::SemaphoreTypeCreateInfo<'_>>();
            state.semaphore_initial_values.push(timeline.initial_value);
        }
        next = (*next).p_next;
    }
    *out = vk::Semaphore::from_raw(state.next());
    vk::Result::SUCCESS
}

unsafe extern "system" fn queue_submit(
    _queue: vk::Queue,
    count: u32,
    submits: *const vk::SubmitInfo<'_>,
    _fence: vk::Fence,
) -> vk::Result {
    let mut state = state();
    for i in 0..count as usize {
        let submit = &*submits.add(i);
        for j in 0..submit.command_buffer_count as usize {
            state.submitted.push((*submit.p_command_buffers.add(j)).as_raw());
        }
    }
    vk::Result::SUCCESS
}

unsafe extern "system" fn queue_wait_idle(_queue: vk::Queue) -> vk::Result {
    vk::Result::SUCCESS
}

unsafe extern "system" fn create_deferred_operation(
    _device: vk::Device,
    _alloc: *const vk::AllocationCallbacks<'_>,
    out: *mut vk::DeferredOperationKHR,
) -> vk::Result {
    *out = vk::DeferredOperationKHR::from_raw(state().next());
    vk::Result::SUCCESS
}

unsafe extern "system" fn destroy_deferred_operation(
    _device: vk::Device,
    _op: vk::DeferredOperationKHR,
    _alloc: *const vk::AllocationCallbacks<'_>,
) {
}

/// Completes a pending copy by reading the info it was given only now.
unsafe extern "system" fn get_deferred_operation_result(_device: vk::Device, op: vk::DeferredOperationKHR) -> vk::Result {
    let mut state = state();
    let Some(index) = state.pending_copies.iter().position(|(o, _)| *o == op.as_raw()) else {
        return vk::Result::SUCCESS;
    };
    let (_, info) = state.pending_copies.remove(index);
    let info = &*(info as *const vk::CopyAccelerationStructureInfoKHR<'_>);
    state.completed_copies.push((info.src.as_raw(), info.dst.as_raw()));
    vk::Result::SUCCESS
}

unsafe extern "system" fn copy_acceleration_structure(
    _device: vk::Device,
    op: vk::DeferredOperationKHR,
    info: *const vk::CopyAccelerationStructureInfoKHR<'_>,
) -> vk::Result {
    let mut state = state();
    if op == vk::DeferredOperationKHR::null() {
        state.completed_copies.push(((*info).src.as_raw(), (*info).dst.as_raw()));
        return vk::Result::SUCCESS;
    }
    state.pending_copies.push((op.as_raw(), info as usize));
    vk::Result::OPERATION_DEFERRED_KHR
}

unsafe extern "system" fn create_debug_utils_messenger(
    _instance: vk::Instance,
    info: *const vk::DebugUtilsMessengerCreateInfoEXT<'_>,
    _alloc: *const vk::AllocationCallbacks<'_>,
    out: *mut vk::DebugUtilsMessengerEXT,
) -> vk::Result {
    state().messenger = Some(((*info).pfn_user_callback, (*info).p_user_data as usize));
    *out = vk::DebugUtilsMessengerEXT::from_raw(HOST_MESSENGER);
    vk::Result::SUCCESS
}

unsafe extern "system" fn destroy_debug_utils_messenger(
    _instance: vk::Instance,
    _messenger: vk::DebugUtilsMessengerEXT,
    _alloc: *const vk::AllocationCallbacks<'_>,
) {
    state().messenger = None;
}

fn void<F: Copy>(f: F) -> vk::PFN_vkVoidFunction {
    assert_eq!(std::mem::size_of::<F>(), std::mem::size_of::<unsafe extern "system" fn()>());
    Some(unsafe { std::mem::transmute_copy::<F, unsafe extern "system" fn()>(&f) })
}

fn resolve(name: &[u8]) -> vk::PFN_vkVoidFunction {
    match name {
        b"vkGetInstanceProcAddr" => void(get_instance_proc_addr as vk::PFN_vkGetInstanceProcAddr),
        b"vkEnumerateInstanceVersion" => void(enumerate_instance_version as vk::PFN_vkEnumerateInstanceVersion),
        b"vkEnumerateInstanceExtensionProperties" => {
            void(enumerate_instance_extension_properties as vk::PFN_vkEnumerateInstanceExtensionProperties)
        }
        b"vkCreateInstance" => void(fake_create_instance as vk::PFN_vkCreateInstance),
        b"vkDestroyInstance" => void(destroy_instance as vk::PFN_vkDestroyInstance),
        b"vkEnumeratePhysicalDevices" => void(enumerate_physical_devices as vk::PFN_vkEnumeratePhysicalDevices),
        b"vkGetPhysicalDeviceProperties" => {
            void(get_physical_device_properties as vk::PFN_vkGetPhysicalDeviceProperties)
        }
        b"vkGetPhysicalDeviceFeatures2" => void(get_physical_device_features2 as vk::PFN_vkGetPhysicalDeviceFeatures2),
        b"vkEnumerateDeviceExtensionProperties" => {
            void(enumerate_device_extension_properties as vk::PFN_vkEnumerateDeviceExtensionProperties)
        }
        b"vkCreateDevice" => void(fake_create_device as vk::PFN_vkCreateDevice),
        b"vkGetDeviceProcAddr" => void(get_device_proc_addr as vk::PFN_vkGetDeviceProcAddr),
        b"vkDestroyDevice" => void(destroy_device as vk::PFN_vkDestroyDevice),
        b"vkGetDeviceQueue" => void(get_device_queue as vk::PFN_vkGetDeviceQueue),
        b"vkDeviceWaitIdle" => void(device_wait_idle as vk::PFN_vkDeviceWaitIdle),
        b"vkCreateCommandPool" => void(create_command_pool as vk::PFN_vkCreateCommandPool),
        b"vkDestroyCommandPool" => void(destroy_command_pool as vk::PFN_vkDestroyCommandPool),
        b"vkAllocateCommandBuffers" => void(allocate_command_buffers as vk::PFN_vkAllocateCommandBuffers),
        b"vkFreeCommandBuffers" => void(free_command_buffers as vk::PFN_vkFreeCommandBuffers),
        b"vkBeginCommandBuffer" => void(begin_command_buffer as vk::PFN_vkBeginCommandBuffer),
        b"vkEndCommandBuffer" => void(end_command_buffer as vk::PFN_vkEndCommandBuffer),
        b"vkCmdDraw" => void(cmd_draw as vk::PFN_vkCmdDraw),
        b"vkCmdSetDepthBias" => void(cmd_set_depth_bias as vk::PFN_vkCmdSetDepthBias),
        b"vkCmdSetBlendConstants" => void(cmd_set_blend_constants as vk::PFN_vkCmdSetBlendConstants),
        b"vkCreateFence" => void(create_fence as vk::PFN_vkCreateFence),
        b"vkDestroyFence" => void(destroy_fence as vk::PFN_vkDestroyFence),
        b"vkCreateSemaphore" => void(create_semaphore as vk::PFN_vkCreateSemaphore),
        b"vkQueueSubmit" => void(queue_submit as vk::PFN_vkQueueSubmit),
        b"vkQueueWaitIdle" => void(queue_wait_idle as vk::PFN_vkQueueWaitIdle),
        b"vkCreateDeferredOperationKHR" => void(create_deferred_operation as vk::PFN_vkCreateDeferredOperationKHR),
        b"vkDestroyDeferredOperationKHR" => {
            void(destroy_deferred_operation as vk::PFN_vkDestroyDeferredOperationKHR)
        }
        b"vkGetDeferredOperationResultKHR" => {
            void(get_deferred_operation_result as vk::PFN_vkGetDeferredOperationResultKHR)
        }
        b"vkCopyAccelerationStructureKHR" => {
            void(copy_acceleration_structure as vk::PFN_vkCopyAccelerationStructureKHR)
        }
        b"vkCreateDebugUtilsMessengerEXT" => {
            void(create_debug_utils_messenger as vk::PFN_vkCreateDebugUtilsMessengerEXT)
        }
        b"vkDestroyDebugUtilsMessengerEXT" => {
            void(destroy_debug_utils_messenger as vk::PFN_vkDestroyDebugUtilsMessengerEXT)
        }
        _ => None,
    }
}

pub unsafe extern "system" fn get_instance_proc_addr(
    _instance: vk::Instance,
    name: *const c_char,
) -> vk::PFN_vkVoidFunction {
    resolve(CStr::from_ptr(name).to_bytes())
}

unsafe extern "system" fn get_device_proc_addr(_device: vk::Device, name: *const c_char) -> vk::PFN_vkVoidFunction {
    resolve(CStr::from_ptr(name).to_bytes())
}
