//! Integration test: host/client handle registry
//!
//! Verifies that every registered wrapper is reachable from its client
//! handle and, when indexed, from its host handle.

use std::ptr::NonNull;
use std::sync::Arc;

use ash::vk;
use xthunk_core::registry::{
    self, client_handle_from_host, lookup_by_client, ClientHandle, HostObject, ObjectRegistry,
    VulkanObject,
};
use xthunk_protocol::client::ClientObject;

#[repr(C)]
struct TestWrapper {
    obj: VulkanObject,
    label: &'static str,
}

unsafe impl HostObject for TestWrapper {
    fn object(&self) -> &VulkanObject {
        &self.obj
    }
    fn object_mut(&mut self) -> &mut VulkanObject {
        &mut self.obj
    }
}

fn wrapper(host: u64, label: &'static str) -> Box<TestWrapper> {
    Box::new(TestWrapper {
        obj: VulkanObject::new(host),
        label,
    })
}

#[test]
fn test_dispatchable_round_trip() {
    let registry = ObjectRegistry::new();
    let mut header = Box::new(ClientObject::new());
    let header_ptr = NonNull::from(&mut *header);

    let ptr = unsafe { registry::register(wrapper(0xd00d, "device"), Some(header_ptr), Some(&registry)) };

    assert_eq!(header.unix_handle, ptr.as_ptr() as u64);
    let handle = ClientHandle::dispatchable(header_ptr.as_ptr() as u64).unwrap();
    let found = unsafe { lookup_by_client::<TestWrapper>(handle) };
    assert_eq!(found, ptr);
    assert_eq!(unsafe { found.as_ref() }.label, "device");
    assert_eq!(unsafe { found.as_ref() }.obj.client_handle, header_ptr.as_ptr() as u64);
    assert_eq!(registry.lookup_by_host(0xd00d), Some(header_ptr.as_ptr() as u64));
    assert_eq!(unsafe { registry::host_handle_of(header_ptr) }, 0xd00d);

    let boxed = unsafe { registry::unregister(ptr, Some(&registry)) };
    assert_eq!(boxed.obj.host_handle, 0xd00d);
    assert_eq!(registry.lookup_by_host(0xd00d), None);
}

#[test]
fn test_opaque_round_trip() {
    let registry = ObjectRegistry::new();
    let ptr = unsafe { registry::register(wrapper(0x5151, "pool"), None, Some(&registry)) };
    let client = unsafe { ptr.as_ref() }.obj.client_handle;

    assert_eq!(client, ptr.as_ptr() as u64);
    let found = unsafe { lookup_by_client::<TestWrapper>(ClientHandle::opaque(client).unwrap()) };
    assert_eq!(found, ptr);
    assert_eq!(registry.lookup_by_host(0x5151), Some(client));

    drop(unsafe { registry::unregister(ptr, Some(&registry)) });
    assert!(registry.is_empty());
}

#[test]
fn test_null_handles_are_none() {
    assert!(ClientHandle::dispatchable(0).is_none());
    assert!(ClientHandle::opaque(0).is_none());
}

#[test]
fn test_unwrapped_types_pass_through() {
    let registry = ObjectRegistry::new();
    assert_eq!(client_handle_from_host(&registry, vk::ObjectType::FENCE, 0x77), 0x77);
    assert_eq!(client_handle_from_host(&registry, vk::ObjectType::DEVICE, 0x77), 0);

    let ptr = unsafe { registry::register(wrapper(0x77, "queue"), None, Some(&registry)) };
    let client = unsafe { ptr.as_ref() }.obj.client_handle;
    assert_eq!(client_handle_from_host(&registry, vk::ObjectType::QUEUE, 0x77), client);
    drop(unsafe { registry::unregister(ptr, Some(&registry)) });
}

#[test]
fn test_concurrent_lookups_during_registration() {
    let registry = Arc::new(ObjectRegistry::new());
    let long_lived = unsafe { registry::register(wrapper(1, "instance"), None, Some(&registry)) };
    let expected = unsafe { long_lived.as_ref() }.obj.client_handle;

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || {
                for _ in 0..10_000 {
                    assert_eq!(registry.lookup_by_host(1), Some(expected));
                }
            })
        })
        .collect();

    let writer = {
        let registry = Arc::clone(&registry);
        std::thread::spawn(move || {
            for host in 100..1100u64 {
                let obj = VulkanObject {
                    host_handle: host,
                    client_handle: host + 1,
                };
                registry.insert(&obj);
                registry.remove(&obj);
            }
        })
    };

    for reader in readers {
        reader.join().unwrap();
    }
    writer.join().unwrap();
    assert_eq!(registry.len(), 1);
    drop(unsafe { registry::unregister(long_lived, Some(&registry)) });
}
