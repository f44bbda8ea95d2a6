//! A mock host for the client stub tests.
//!
//! [`MockHost`] answers the function codes the stubs send the way the host
//! library does: it fills client headers, honors the physical device
//! capacity handshake and records command recording in one decoded form
//! whichever path (fast or generic) carried it.

#![allow(dead_code, unsafe_op_in_unsafe_fn)]

use std::ffi::{c_void, CStr, CString};
use std::ptr::{self, NonNull};
use std::sync::Once;

use ash::vk;
use ash::vk::Handle;
use parking_lot::{Mutex, MutexGuard};
use xthunk_protocol::client::{ClientDevice, ClientInstance, ClientObject, LoaderQuirks};
use xthunk_protocol::fast::{unpack_f32_pair, FastWord};
use xthunk_protocol::params::*;
use xthunk_protocol::xr::{XrExtensionProperties, XrResult};
use xthunk_protocol::{FastArgs, FastCode, FuncCode, NtStatus, TableSignature, UnixCallDispatcher};
use xthunk_vk_icd::LoaderOptions;

pub const MOCK_VENDOR_ID: u32 = 0x1234;

/// One recorded command, floats kept as bits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cmd {
    Draw(u64, [u32; 4]),
    DrawIndexed(u64, u32, u32, u32, i32, u32),
    Dispatch(u64, [u32; 3]),
    LineWidth(u64, u32),
    DepthBias(u64, [u32; 3]),
    StencilReference(u64, u32, u32),
    BlendConstants(u64, [u32; 4]),
    BindPipeline(u64, i32, u64),
}

pub struct MockState {
    pub physical_devices: u32,
    /// Capacity of every instance creation attempt.
    pub instance_capacities: Vec<u32>,
    pub commands: Vec<Cmd>,
    pub fast_calls: usize,
    pub generic_calls: usize,
    /// Names the capability gate refuses.
    pub unavailable: Vec<CString>,
    pub quirk_devices: bool,
    pub fail_allocation: bool,
    pub fail_xr_create: bool,
    pub freed_command_buffers: Vec<u64>,
    pub destroyed_pools: Vec<u64>,
    pub openxr_inits: usize,
    next_handle: u64,
}

impl MockState {
    const fn new() -> Self {
        Self {
            physical_devices: 2,
            instance_capacities: Vec::new(),
            commands: Vec::new(),
            fast_calls: 0,
            generic_calls: 0,
            unavailable: Vec::new(),
            quirk_devices: false,
            fail_allocation: false,
            fail_xr_create: false,
            freed_command_buffers: Vec::new(),
            destroyed_pools: Vec::new(),
            openxr_inits: 0,
            next_handle: 0x50_0000,
        }
    }

    fn next(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    fn available(&self, name: *const std::ffi::c_char) -> vk::Bool32 {
        // SAFETY: gate names are strings.
        let name = unsafe { CStr::from_ptr(name) };
        vk::Bool32::from(!self.unavailable.iter().any(|n| n.as_c_str() == name))
    }

    fn record(&mut self, cmd: Cmd, fast: bool) {
        if fast {
            self.fast_calls += 1;
        } else {
            self.generic_calls += 1;
        }
        self.commands.push(cmd);
    }
}

static STATE: Mutex<MockState> = Mutex::new(MockState::new());
static SERIAL: Mutex<()> = Mutex::new(());
static ATTACH: Once = Once::new();

pub fn state() -> MutexGuard<'static, MockState> {
    STATE.lock()
}

/// Serializes the test, attaches the mock once per binary and resets the
/// recorded state. OpenXR init counts persist for the whole binary.
pub fn setup(fast_path: bool) -> MutexGuard<'static, ()> {
    let guard = SERIAL.lock();
    xthunk_common::logging::try_init_test_logging();
    ATTACH.call_once(|| {
        xthunk_vk_icd::attach(Box::new(MockHost::new()), LoaderOptions { fast_path }).unwrap();
    });
    let mut state = state();
    let inits = state.openxr_inits;
    *state = MockState::new();
    state.openxr_inits = inits;
    guard
}

pub struct MockHost {
    signature: TableSignature,
}

impl MockHost {
    pub fn new() -> Self {
        Self {
            signature: TableSignature::current(),
        }
    }

    pub fn with_signature(signature: TableSignature) -> Self {
        Self { signature }
    }
}

fn client_header(raw: u64) -> NonNull<ClientObject> {
    NonNull::new(raw as usize as *mut ClientObject).expect("client header")
}

fn bits<const N: usize>(values: [f32; N]) -> [u32; N] {
    values.map(f32::to_bits)
}

unsafe fn block<'a, P>(params: *mut c_void) -> &'a mut P {
    &mut *params.cast::<P>()
}

impl UnixCallDispatcher for MockHost {
    fn signature(&self) -> TableSignature {
        self.signature
    }

    unsafe fn call(&self, code: FuncCode, params: *mut c_void) -> NtStatus {
        let mut state = state();
        match code {
            FuncCode::InitVulkan => block::<InitVulkanParams>(params).result = vk::Result::SUCCESS,
            FuncCode::InitOpenxr => {
                state.openxr_inits += 1;
                block::<InitOpenxrParams>(params).result = XrResult::SUCCESS;
            }
            FuncCode::IsAvailableInstanceFunction => {
                let p = block::<IsAvailableInstanceFunctionParams>(params);
                p.result = state.available(p.name);
            }
            FuncCode::IsAvailableDeviceFunction => {
                let p = block::<IsAvailableDeviceFunctionParams>(params);
                p.result = state.available(p.name);
            }
            FuncCode::XrIsAvailableInstanceFunction => {
                let p = block::<XrIsAvailableInstanceFunctionParams>(params);
                p.result = state.available(p.name);
            }
            FuncCode::CreateInstance => {
                let p = block::<CreateInstanceParams>(params);
                let client = NonNull::new(*p.instance).expect("client instance");
                let inst = &mut *client.as_ptr();
                state.instance_capacities.push(inst.capacity);
                inst.phys_dev_count = state.physical_devices;
                if state.physical_devices > inst.capacity {
                    p.result = vk::Result::ERROR_OUT_OF_POOL_MEMORY;
                    return NtStatus::SUCCESS;
                }
                inst.obj.unix_handle = state.next();
                for i in 0..state.physical_devices as usize {
                    let pd = ClientInstance::phys_dev(client, i);
                    (*pd.as_ptr()).unix_handle = state.next();
                }
                p.result = vk::Result::SUCCESS;
            }
            FuncCode::DestroyInstance => {}
            FuncCode::EnumerateInstanceVersion => {
                let p = block::<EnumerateInstanceVersionParams>(params);
                *p.api_version = vk::API_VERSION_1_3;
                p.result = vk::Result::SUCCESS;
            }
            FuncCode::EnumeratePhysicalDevices => {
                let p = block::<EnumeratePhysicalDevicesParams>(params);
                let client = NonNull::new(p.instance.as_raw() as usize as *mut ClientInstance).expect("instance");
                let count = client.as_ref().phys_dev_count;
                if p.physical_devices.is_null() {
                    *p.physical_device_count = count;
                    p.result = vk::Result::SUCCESS;
                } else {
                    let n = (*p.physical_device_count).min(count);
                    for i in 0..n as usize {
                        let pd = ClientInstance::phys_dev(client, i);
                        *p.physical_devices.add(i) = vk::PhysicalDevice::from_raw(pd.as_ptr() as usize as u64);
                    }
                    *p.physical_device_count = n;
                    p.result = if n < count { vk::Result::INCOMPLETE } else { vk::Result::SUCCESS };
                }
            }
            FuncCode::GetPhysicalDeviceProperties => {
                let p = block::<GetPhysicalDevicePropertiesParams>(params);
                (*p.properties).vendor_id = MOCK_VENDOR_ID;
            }
            FuncCode::CreateDevice => {
                let p = block::<CreateDeviceParams>(params);
                let client = NonNull::new(*p.device).expect("client device");
                let info = &*p.create_info;
                let wanted: u32 = std::slice::from_raw_parts(info.p_queue_create_infos, info.queue_create_info_count as usize)
                    .iter()
                    .map(|q| q.queue_count)
                    .sum();
                if wanted != client.as_ref().queue_count {
                    return NtStatus::INVALID_PARAMETER;
                }
                let dev = &mut *client.as_ptr();
                dev.obj.unix_handle = state.next();
                if state.quirk_devices {
                    dev.quirks = LoaderQuirks::GET_DEVICE_PROC_ADDR.bits();
                }
                for i in 0..wanted as usize {
                    (*ClientDevice::queue(client, i).as_ptr()).unix_handle = state.next();
                }
                p.result = vk::Result::SUCCESS;
            }
            FuncCode::DestroyDevice => {}
            FuncCode::GetDeviceQueue => {
                let p = block::<GetDeviceQueueParams>(params);
                let client = NonNull::new(p.device.as_raw() as usize as *mut ClientDevice).expect("device");
                let queue = ClientDevice::queue(client, p.queue_index as usize);
                *p.queue = vk::Queue::from_raw(queue.as_ptr() as usize as u64);
            }
            FuncCode::CreateCommandPool => {
                let p = block::<CreateCommandPoolParams>(params);
                *p.command_pool = vk::CommandPool::from_raw(state.next());
                p.result = vk::Result::SUCCESS;
            }
            FuncCode::DestroyCommandPool => {
                let p = block::<DestroyCommandPoolParams>(params);
                state.destroyed_pools.push(p.command_pool.as_raw());
            }
            FuncCode::AllocateCommandBuffers => {
                let p = block::<AllocateCommandBuffersParams>(params);
                if state.fail_allocation {
                    p.result = vk::Result::ERROR_OUT_OF_DEVICE_MEMORY;
                    return NtStatus::SUCCESS;
                }
                let count = (*p.allocate_info).command_buffer_count as usize;
                for cb in std::slice::from_raw_parts(p.command_buffers, count) {
                    let header = client_header(cb.as_raw());
                    (*header.as_ptr()).unix_handle = state.next();
                }
                p.result = vk::Result::SUCCESS;
            }
            FuncCode::FreeCommandBuffers => {
                let p = block::<FreeCommandBuffersParams>(params);
                let freed = std::slice::from_raw_parts(p.command_buffers, p.command_buffer_count as usize);
                state.freed_command_buffers.extend(freed.iter().map(|cb| cb.as_raw()));
            }
            FuncCode::BeginCommandBuffer => block::<BeginCommandBufferParams>(params).result = vk::Result::SUCCESS,
            FuncCode::EndCommandBuffer => block::<EndCommandBufferParams>(params).result = vk::Result::SUCCESS,
            FuncCode::CmdDraw => {
                let p = block::<CmdDrawParams>(params);
                let cmd = Cmd::Draw(
                    p.command_buffer.as_raw(),
                    [p.vertex_count, p.instance_count, p.first_vertex, p.first_instance],
                );
                state.record(cmd, false);
            }
            FuncCode::CmdDrawIndexed => {
                let p = block::<CmdDrawIndexedParams>(params);
                let cmd = Cmd::DrawIndexed(
                    p.command_buffer.as_raw(),
                    p.index_count,
                    p.instance_count,
                    p.first_index,
                    p.vertex_offset,
                    p.first_instance,
                );
                state.record(cmd, false);
            }
            FuncCode::CmdDispatch => {
                let p = block::<CmdDispatchParams>(params);
                let cmd = Cmd::Dispatch(p.command_buffer.as_raw(), [p.group_count_x, p.group_count_y, p.group_count_z]);
                state.record(cmd, false);
            }
            FuncCode::CmdSetLineWidth => {
                let p = block::<CmdSetLineWidthParams>(params);
                state.record(Cmd::LineWidth(p.command_buffer.as_raw(), p.line_width.to_bits()), false);
            }
            FuncCode::CmdSetDepthBias => {
                let p = block::<CmdSetDepthBiasParams>(params);
                let values = bits([p.depth_bias_constant_factor, p.depth_bias_clamp, p.depth_bias_slope_factor]);
                state.record(Cmd::DepthBias(p.command_buffer.as_raw(), values), false);
            }
            FuncCode::CmdSetStencilReference => {
                let p = block::<CmdSetStencilReferenceParams>(params);
                let cmd = Cmd::StencilReference(p.command_buffer.as_raw(), p.face_mask.as_raw(), p.reference);
                state.record(cmd, false);
            }
            FuncCode::CmdSetBlendConstants => {
                let p = block::<CmdSetBlendConstantsParams>(params);
                state.record(Cmd::BlendConstants(p.command_buffer.as_raw(), bits(*p.blend_constants)), false);
            }
            FuncCode::CmdBindPipeline => {
                let p = block::<CmdBindPipelineParams>(params);
                let cmd = Cmd::BindPipeline(p.command_buffer.as_raw(), p.pipeline_bind_point.as_raw(), p.pipeline.as_raw());
                state.record(cmd, false);
            }
            FuncCode::XrEnumerateInstanceExtensionProperties => {
                let p = block::<XrEnumerateInstanceExtensionPropertiesParams>(params);
                *p.count = 1;
                if p.capacity >= 1 {
                    *p.properties = XrExtensionProperties::new("XR_KHR_D3D11_enable", 9);
                }
                p.result = XrResult::SUCCESS;
            }
            FuncCode::XrCreateInstance => {
                let p = block::<XrCreateInstanceParams>(params);
                if state.fail_xr_create {
                    p.result = XrResult::ERROR_INITIALIZATION_FAILED;
                } else {
                    (*p.instance).unix_handle = state.next();
                    p.result = XrResult::SUCCESS;
                }
            }
            FuncCode::XrCreateSession | FuncCode::XrCreateSwapchain | FuncCode::XrCreateReferenceSpace => {
                let p = block::<XrCreateChildParams>(params);
                if (*p.parent).unix_handle == 0 {
                    return NtStatus::INVALID_PARAMETER;
                }
                (*p.child).unix_handle = state.next();
                p.result = XrResult::SUCCESS;
            }
            FuncCode::XrDestroyInstance
            | FuncCode::XrDestroySession
            | FuncCode::XrDestroySwapchain
            | FuncCode::XrDestroySpace => block::<XrDestroyParams>(params).result = XrResult::SUCCESS,
            _ => return NtStatus::NOT_IMPLEMENTED,
        }
        NtStatus::SUCCESS
    }

    unsafe fn fast_call(&self, code: FastCode, args: FastArgs) -> NtStatus {
        let cb = args[0];
        let u = |i: usize| u32::from_word(args[i]);
        let f = |i: usize| f32::from_word(args[i]).to_bits();
        let cmd = match code {
            FastCode::CmdDraw => Cmd::Draw(cb, [u(1), u(2), u(3), u(4)]),
            FastCode::CmdDrawIndexed => Cmd::DrawIndexed(cb, u(1), u(2), u(3), i32::from_word(args[4]), u(5)),
            FastCode::CmdDispatch => Cmd::Dispatch(cb, [u(1), u(2), u(3)]),
            FastCode::CmdSetLineWidth => Cmd::LineWidth(cb, f(1)),
            FastCode::CmdSetDepthBias => Cmd::DepthBias(cb, [f(1), f(2), f(3)]),
            FastCode::CmdSetStencilReference => Cmd::StencilReference(cb, u(1), u(2)),
            FastCode::CmdSetBlendConstants => {
                let (r, g) = unpack_f32_pair(args[1]);
                let (b, a) = unpack_f32_pair(args[2]);
                Cmd::BlendConstants(cb, bits([r, g, b, a]))
            }
            FastCode::CmdBindPipeline => Cmd::BindPipeline(cb, i32::from_word(args[1]), args[2]),
        };
        state().record(cmd, true);
        NtStatus::SUCCESS
    }
}

// ── Client helpers ──────────────────────────────────────────

pub fn create_instance() -> vk::Instance {
    let app = vk::ApplicationInfo::default().application_name(c"icd-test");
    let info = vk::InstanceCreateInfo::default().application_info(&app);
    let mut instance = vk::Instance::null();
    let res = unsafe { xthunk_vk_icd::instance::vkCreateInstance(&info, ptr::null(), &mut instance) };
    assert_eq!(res, vk::Result::SUCCESS);
    instance
}

pub fn physical_devices(instance: vk::Instance) -> Vec<vk::PhysicalDevice> {
    let mut count = 0;
    unsafe {
        let res = xthunk_vk_icd::instance::vkEnumeratePhysicalDevices(instance, &mut count, ptr::null_mut());
        assert_eq!(res, vk::Result::SUCCESS);
        let mut devices = vec![vk::PhysicalDevice::null(); count as usize];
        let res = xthunk_vk_icd::instance::vkEnumeratePhysicalDevices(instance, &mut count, devices.as_mut_ptr());
        assert_eq!(res, vk::Result::SUCCESS);
        devices
    }
}

pub fn create_device(pd: vk::PhysicalDevice, queue_count: u32) -> vk::Device {
    let priorities = vec![1.0f32; queue_count as usize];
    let queue = vk::DeviceQueueCreateInfo::default()
        .queue_family_index(0)
        .queue_priorities(&priorities);
    let queues = [queue];
    let info = vk::DeviceCreateInfo::default().queue_create_infos(&queues);
    let mut device = vk::Device::null();
    let res = unsafe { xthunk_vk_icd::device::vkCreateDevice(pd, &info, ptr::null(), &mut device) };
    assert_eq!(res, vk::Result::SUCCESS);
    device
}

pub fn create_pool(device: vk::Device) -> vk::CommandPool {
    let info = vk::CommandPoolCreateInfo::default();
    let mut pool = vk::CommandPool::null();
    let res = unsafe { xthunk_vk_icd::command::vkCreateCommandPool(device, &info, ptr::null(), &mut pool) };
    assert_eq!(res, vk::Result::SUCCESS);
    pool
}

pub fn allocate(device: vk::Device, pool: vk::CommandPool, count: u32) -> (vk::Result, Vec<vk::CommandBuffer>) {
    let info = vk::CommandBufferAllocateInfo::default()
        .command_pool(pool)
        .command_buffer_count(count);
    let mut buffers = vec![vk::CommandBuffer::from_raw(0xdead); count as usize];
    let res = unsafe { xthunk_vk_icd::command::vkAllocateCommandBuffers(device, &info, buffers.as_mut_ptr()) };
    (res, buffers)
}

/// A device with one queue and one recording command buffer.
pub fn recording() -> (vk::Device, vk::CommandBuffer) {
    let instance = create_instance();
    let device = create_device(physical_devices(instance)[0], 1);
    let pool = create_pool(device);
    let (res, buffers) = allocate(device, pool, 1);
    assert_eq!(res, vk::Result::SUCCESS);
    (device, buffers[0])
}

pub const NAN_PAYLOAD: u32 = 0x7fc0_0001;

/// Records one of every hot command.
pub fn record_sample(cb: vk::CommandBuffer) {
    use xthunk_vk_icd::command::*;
    unsafe {
        vkCmdDraw(cb, 3, 1, 0, 7);
        vkCmdDrawIndexed(cb, 36, 2, 6, -4, 1);
        vkCmdDispatch(cb, 8, 4, 1);
        vkCmdSetLineWidth(cb, 1.5);
        vkCmdSetDepthBias(cb, 0.25, -1.0, 2.0);
        vkCmdSetStencilReference(cb, vk::StencilFaceFlags::FRONT_AND_BACK, 0x80);
        vkCmdSetBlendConstants(cb, &[0.1, f32::from_bits(NAN_PAYLOAD), -0.0, 1.0]);
        vkCmdBindPipeline(cb, vk::PipelineBindPoint::COMPUTE, vk::Pipeline::from_raw(0xfeed_0000_0001));
    }
}

/// What the host must see for [`record_sample`].
pub fn expected_sample(cb: vk::CommandBuffer) -> Vec<Cmd> {
    let cb = cb.as_raw();
    vec![
        Cmd::Draw(cb, [3, 1, 0, 7]),
        Cmd::DrawIndexed(cb, 36, 2, 6, -4, 1),
        Cmd::Dispatch(cb, [8, 4, 1]),
        Cmd::LineWidth(cb, 1.5f32.to_bits()),
        Cmd::DepthBias(cb, bits([0.25, -1.0, 2.0])),
        Cmd::StencilReference(cb, vk::StencilFaceFlags::FRONT_AND_BACK.as_raw(), 0x80),
        Cmd::BlendConstants(cb, [0.1f32.to_bits(), NAN_PAYLOAD, (-0.0f32).to_bits(), 1.0f32.to_bits()]),
        Cmd::BindPipeline(cb, vk::PipelineBindPoint::COMPUTE.as_raw(), 0xfeed_0000_0001),
    ]
}
