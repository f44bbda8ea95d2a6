//! Integration test: 32-bit structure adapter
//!
//! Builds 32-bit client structures inside an `Arena32` and checks chain
//! walking, conversion to host layout and write-back of outputs.

use std::ffi::CStr;
use std::mem::offset_of;

use ash::vk;
use ash::vk::Handle;
use bytemuck::{Pod, Zeroable};
use xthunk_core::conversion::ConversionContext;
use xthunk_core::registry::VulkanObject;
use xthunk_core::wow64::convert::copy_chain_out;
use xthunk_core::wow64::schema::{self, Width};
use xthunk_core::wow64::{
    find_next_struct, find_next_struct32, AddressSpace32, Arena32, BaseStructure32, ChainReader,
    Converter,
};

const UNKNOWN_TAG: i32 = 1_000_999_000;

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct SemaphoreCreateInfo32 {
    s_type: i32,
    next: u32,
    flags: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct SemaphoreTypeCreateInfo32 {
    s_type: i32,
    next: u32,
    semaphore_type: i32,
    _pad: u32,
    initial_value: u64,
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct Unknown32 {
    s_type: i32,
    next: u32,
    payload: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct SubmitInfo32 {
    s_type: i32,
    next: u32,
    wait_semaphore_count: u32,
    wait_semaphores: u32,
    wait_dst_stage_mask: u32,
    command_buffer_count: u32,
    command_buffers: u32,
    signal_semaphore_count: u32,
    signal_semaphores: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct ApplicationInfo32 {
    s_type: i32,
    next: u32,
    application_name: u32,
    application_version: u32,
    engine_name: u32,
    engine_version: u32,
    api_version: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct InstanceCreateInfo32 {
    s_type: i32,
    next: u32,
    flags: u32,
    application_info: u32,
    enabled_layer_count: u32,
    enabled_layer_names: u32,
    enabled_extension_count: u32,
    enabled_extension_names: u32,
}

/// `{SEMAPHORE_CREATE_INFO -> [unknown ->] SEMAPHORE_TYPE_CREATE_INFO}`.
fn semaphore_chain(arena: &Arena32, with_unknown: bool) -> (u32, u32) {
    let timeline = arena
        .alloc_value(&SemaphoreTypeCreateInfo32 {
            s_type: vk::StructureType::SEMAPHORE_TYPE_CREATE_INFO.as_raw(),
            next: 0,
            semaphore_type: vk::SemaphoreType::TIMELINE.as_raw(),
            _pad: 0,
            initial_value: 42,
        })
        .unwrap();
    let mut next = timeline;
    if with_unknown {
        next = arena
            .alloc_value(&Unknown32 {
                s_type: UNKNOWN_TAG,
                next: timeline,
                payload: 7,
            })
            .unwrap();
    }
    let head = arena
        .alloc_value(&SemaphoreCreateInfo32 {
            s_type: vk::StructureType::SEMAPHORE_CREATE_INFO.as_raw(),
            next,
            flags: 0,
        })
        .unwrap();
    (head, timeline)
}

#[test]
fn test_find_next_struct32_returns_match_or_none() {
    let arena = Arena32::new(4096);
    let (head, timeline) = semaphore_chain(&arena, true);

    unsafe {
        assert_eq!(
            find_next_struct32(&arena, head, vk::StructureType::SEMAPHORE_TYPE_CREATE_INFO),
            Some(timeline)
        );
        assert_eq!(
            find_next_struct32(&arena, head, vk::StructureType::SEMAPHORE_CREATE_INFO),
            Some(head)
        );
        assert_eq!(
            find_next_struct32(&arena, head, vk::StructureType::EXPORT_FENCE_CREATE_INFO),
            None
        );
        assert_eq!(find_next_struct32(&arena, 0, vk::StructureType::SUBMIT_INFO), None);
    }
}

#[test]
fn test_native_walk_finds_middle_link() {
    let c = vk::ExportFenceCreateInfo::default();
    let mut b = vk::SemaphoreTypeCreateInfo::default().initial_value(9);
    b.p_next = (&c as *const vk::ExportFenceCreateInfo).cast();
    let mut a = vk::SemaphoreCreateInfo::default();
    a.p_next = (&b as *const vk::SemaphoreTypeCreateInfo).cast();

    unsafe {
        let head = (&a as *const vk::SemaphoreCreateInfo).cast();
        let found = find_next_struct(head, vk::StructureType::SEMAPHORE_TYPE_CREATE_INFO).unwrap();
        assert_eq!(found.as_ptr() as usize, &b as *const _ as usize);
        assert!(find_next_struct(head, vk::StructureType::SUBMIT_INFO).is_none());
    }
}

#[test]
fn test_adapted_chain_matches_client_contents() {
    let arena = Arena32::new(4096);
    let (head, timeline) = semaphore_chain(&arena, false);

    let found32 = unsafe {
        find_next_struct32(&arena, head, vk::StructureType::SEMAPHORE_TYPE_CREATE_INFO)
    }
    .unwrap();
    assert_eq!(found32, timeline);
    let client: SemaphoreTypeCreateInfo32 = arena.read(found32);

    let mut ctx = ConversionContext::new();
    let native = unsafe {
        Converter::new(ChainReader::wow64(&arena), &mut ctx)
            .convert_in(head as u64, &schema::SEMAPHORE_CREATE_INFO)
    };
    let found = unsafe { find_next_struct(native, vk::StructureType::SEMAPHORE_TYPE_CREATE_INFO) }
        .unwrap();
    let native_timeline = unsafe { &*found.as_ptr().cast::<vk::SemaphoreTypeCreateInfo>() };

    assert_eq!(native_timeline.initial_value, client.initial_value);
    assert_eq!(native_timeline.semaphore_type.as_raw(), client.semaphore_type);
    assert!(native_timeline.p_next.is_null());
}

#[test]
fn test_unknown_tags_are_dropped_from_converted_chain() {
    let arena = Arena32::new(4096);
    let (head, _) = semaphore_chain(&arena, true);

    let mut ctx = ConversionContext::new();
    let native = unsafe {
        Converter::new(ChainReader::wow64(&arena), &mut ctx)
            .convert_in(head as u64, &schema::SEMAPHORE_CREATE_INFO)
    };
    let root = unsafe { &*native.cast::<vk::SemaphoreCreateInfo>() };
    let next = unsafe { &*root.p_next.cast::<vk::BaseInStructure>() };
    assert_eq!(next.s_type, vk::StructureType::SEMAPHORE_TYPE_CREATE_INFO);
}

#[test]
fn test_outputs_are_copied_back() {
    let arena = Arena32::new(4096);
    let timeline = arena
        .alloc_value(&Unknown32 {
            s_type: vk::StructureType::PHYSICAL_DEVICE_TIMELINE_SEMAPHORE_FEATURES.as_raw(),
            next: 0,
            payload: 0,
        })
        .unwrap();
    // VkPhysicalDeviceFeatures2: header plus 55 VkBool32.
    let features = arena.alloc(8 + 55 * 4, 4).unwrap();
    arena.write(
        features,
        &BaseStructure32 {
            s_type: vk::StructureType::PHYSICAL_DEVICE_FEATURES_2.as_raw(),
            next: timeline,
        },
    );

    let mut ctx = ConversionContext::new();
    let reader = ChainReader::wow64(&arena);
    let native = unsafe {
        Converter::new(reader, &mut ctx).convert_in(features as u64, &schema::PHYSICAL_DEVICE_FEATURES_2)
    };

    // What a driver would write.
    unsafe {
        let f2 = &mut *native.cast_mut().cast::<vk::PhysicalDeviceFeatures2>();
        f2.features.robust_buffer_access = vk::TRUE;
        f2.features.sparse_residency_aliased = vk::TRUE;
        let tl = find_next_struct(native, vk::StructureType::PHYSICAL_DEVICE_TIMELINE_SEMAPHORE_FEATURES)
            .unwrap();
        (*tl.as_ptr().cast::<vk::PhysicalDeviceTimelineSemaphoreFeatures>()).timeline_semaphore = vk::TRUE;
        copy_chain_out(reader, native, features as u64);
    }

    assert_eq!(arena.read::<u32>(features + 8), vk::TRUE);
    let aliased_offset = offset_of!(vk::PhysicalDeviceFeatures, sparse_residency_aliased) as u32;
    assert_eq!(arena.read::<u32>(features + 8 + aliased_offset), vk::TRUE);
    assert_eq!(arena.read::<Unknown32>(timeline).payload, vk::TRUE);
    // Links are never written back.
    assert_eq!(arena.read::<BaseStructure32>(features).next, timeline);
}

#[test]
fn test_submit_info_unwraps_command_buffers() {
    let arena = Arena32::new(4096);
    let host_cb = Box::new(VulkanObject {
        host_handle: 0xcb01,
        client_handle: 0,
    });
    let header = arena
        .alloc_value(&[0x01CD_C0DEu64, &*host_cb as *const VulkanObject as u64])
        .unwrap();
    let cbs = arena.alloc_value(&[header]).unwrap();
    let waits32 = arena.alloc_slice(&[0x51u64, 0x52]).unwrap();
    let submit = arena
        .alloc_value(&SubmitInfo32 {
            s_type: vk::StructureType::SUBMIT_INFO.as_raw(),
            next: 0,
            wait_semaphore_count: 2,
            wait_semaphores: waits32,
            wait_dst_stage_mask: 0,
            command_buffer_count: 1,
            command_buffers: cbs,
            signal_semaphore_count: 0,
            signal_semaphores: 0,
        })
        .unwrap();

    let mut ctx = ConversionContext::new();
    let native = unsafe {
        Converter::new(ChainReader::wow64(&arena), &mut ctx)
            .convert_array_in(submit as u64, 1, &schema::SUBMIT_INFO)
    };
    let info = unsafe { &*native.cast::<vk::SubmitInfo>() };
    assert_eq!(info.command_buffer_count, 1);
    assert_eq!(unsafe { *info.p_command_buffers }.as_raw(), 0xcb01);
    let waits = unsafe { std::slice::from_raw_parts(info.p_wait_semaphores, 2) };
    assert_eq!(waits[1].as_raw(), 0x52);
    assert!(info.p_signal_semaphores.is_null());
    // Width-independent arrays are widened in place, not copied.
    assert_eq!(arena.narrow(info.p_wait_semaphores.cast()), Some(waits32));
}

#[test]
fn test_instance_create_info_strings_and_app_info() {
    let arena = Arena32::new(4096);
    let app_name = arena.alloc_cstr("demo").unwrap();
    let app = arena
        .alloc_value(&ApplicationInfo32 {
            s_type: vk::StructureType::APPLICATION_INFO.as_raw(),
            next: 0,
            application_name: app_name,
            application_version: 3,
            engine_name: 0,
            engine_version: 0,
            api_version: vk::API_VERSION_1_1,
        })
        .unwrap();
    let ext_a = arena.alloc_cstr("VK_KHR_surface").unwrap();
    let ext_b = arena.alloc_cstr("VK_KHR_win32_surface").unwrap();
    let exts = arena.alloc_value(&[ext_a, ext_b]).unwrap();
    let create = arena
        .alloc_value(&InstanceCreateInfo32 {
            s_type: vk::StructureType::INSTANCE_CREATE_INFO.as_raw(),
            next: 0,
            flags: 0,
            application_info: app,
            enabled_layer_count: 0,
            enabled_layer_names: 0,
            enabled_extension_count: 2,
            enabled_extension_names: exts,
        })
        .unwrap();

    let mut ctx = ConversionContext::new();
    let native = unsafe {
        Converter::new(ChainReader::wow64(&arena), &mut ctx)
            .convert_in(create as u64, &schema::INSTANCE_CREATE_INFO)
    };
    let info = unsafe { &*native.cast::<vk::InstanceCreateInfo>() };
    let app = unsafe { &*info.p_application_info };
    assert_eq!(app.application_version, 3);
    assert_eq!(app.api_version, vk::API_VERSION_1_1);
    assert_eq!(unsafe { CStr::from_ptr(app.p_application_name) }, c"demo");
    assert!(app.p_engine_name.is_null());
    assert!(info.pp_enabled_layer_names.is_null());
    let names = unsafe { std::slice::from_raw_parts(info.pp_enabled_extension_names, 2) };
    assert_eq!(unsafe { CStr::from_ptr(names[1]) }, c"VK_KHR_win32_surface");
}

#[test]
fn test_native_layouts_match_vulkan_headers() {
    fn offsets(schema: &schema::StructSchema, width: Width) -> Vec<usize> {
        let layout = schema.layout(width);
        layout.offsets[..schema.fields.len()].to_vec()
    }

    let submit = offsets(&schema::SUBMIT_INFO, Width::W64);
    assert_eq!(submit[6], offset_of!(vk::SubmitInfo, p_command_buffers));
    assert_eq!(submit[8], offset_of!(vk::SubmitInfo, p_signal_semaphores));
    assert_eq!(schema::SUBMIT_INFO.layout(Width::W64).size, std::mem::size_of::<vk::SubmitInfo>());

    let device = offsets(&schema::DEVICE_CREATE_INFO, Width::W64);
    assert_eq!(device[9], offset_of!(vk::DeviceCreateInfo, p_enabled_features));
    assert_eq!(
        schema::DEVICE_CREATE_INFO.layout(Width::W64).size,
        std::mem::size_of::<vk::DeviceCreateInfo>()
    );

    let timeline = offsets(&schema::SEMAPHORE_TYPE_CREATE_INFO, Width::W64);
    assert_eq!(timeline[3], offset_of!(vk::SemaphoreTypeCreateInfo, initial_value));

    let inheritance = offsets(&schema::COMMAND_BUFFER_INHERITANCE_INFO, Width::W64);
    assert_eq!(inheritance[4], offset_of!(vk::CommandBufferInheritanceInfo, framebuffer));

    assert_eq!(
        schema::PHYSICAL_DEVICE_FEATURES_2.layout(Width::W64).size,
        std::mem::size_of::<vk::PhysicalDeviceFeatures2>()
    );
    assert_eq!(
        schema::APPLICATION_INFO.layout(Width::W64).size,
        std::mem::size_of::<vk::ApplicationInfo>()
    );

    // 32-bit: pointers shrink, 64-bit members keep 8-byte alignment.
    assert_eq!(schema::SUBMIT_INFO.layout(Width::W32).size, 36);
    assert_eq!(offsets(&schema::SEMAPHORE_TYPE_CREATE_INFO, Width::W32), [0, 4, 8, 16]);
    assert_eq!(schema::SEMAPHORE_TYPE_CREATE_INFO.layout(Width::W32).size, 24);
}
