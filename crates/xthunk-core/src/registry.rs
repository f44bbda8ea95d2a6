//! Host/client handle pairing.
//!
//! A wrapped object lives on the host heap and starts with a
//! [`VulkanObject`]. For dispatchable types the client holds a
//! [`ClientObject`] header whose `unix_handle` points at the wrapper; for
//! wrapped non-dispatchable types the client handle is the wrapper address
//! itself. Instance-scoped objects are also indexed by host handle so
//! driver callbacks can be mapped back to client handles.

use std::collections::BTreeMap;
use std::ptr::NonNull;

use ash::vk;
use parking_lot::RwLock;
use xthunk_protocol::client::ClientObject;

/// Common prefix of every host wrapper.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct VulkanObject {
    pub host_handle: u64,
    pub client_handle: u64,
}

impl VulkanObject {
    pub fn new(host_handle: u64) -> Self {
        Self {
            host_handle,
            client_handle: 0,
        }
    }
}

/// A host wrapper.
///
/// # Safety
/// Implementors must be `#[repr(C)]` with a [`VulkanObject`] as their first
/// field, so a wrapper address can be read as a `VulkanObject` address.
pub unsafe trait HostObject: Sized {
    fn object(&self) -> &VulkanObject;
    fn object_mut(&mut self) -> &mut VulkanObject;
}

/// A handle value as the client sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientHandle {
    /// Points at a client-allocated header.
    Dispatchable(NonNull<ClientObject>),
    /// Opaque integer; for wrapped types it is the host wrapper address.
    Opaque(u64),
}

impl ClientHandle {
    /// `None` for a null handle.
    pub fn dispatchable(raw: u64) -> Option<Self> {
        NonNull::new(raw as usize as *mut ClientObject).map(Self::Dispatchable)
    }

    pub fn opaque(raw: u64) -> Option<Self> {
        (raw != 0).then_some(Self::Opaque(raw))
    }

    pub fn raw(self) -> u64 {
        match self {
            Self::Dispatchable(ptr) => ptr.as_ptr() as usize as u64,
            Self::Opaque(raw) => raw,
        }
    }
}

/// Per-instance index of host handle to client handle.
#[derive(Debug, Default)]
pub struct ObjectRegistry {
    objects: RwLock<BTreeMap<u64, u64>>,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, obj: &VulkanObject) {
        let prev = self.objects.write().insert(obj.host_handle, obj.client_handle);
        if let Some(prev) = prev.filter(|prev| *prev != obj.client_handle) {
            tracing::warn!(
                "host handle {:#x} re-registered: {:#x} -> {:#x}",
                obj.host_handle,
                prev,
                obj.client_handle
            );
        }
    }

    pub fn remove(&self, obj: &VulkanObject) {
        self.objects.write().remove(&obj.host_handle);
    }

    /// Client handle registered for `host_handle`.
    pub fn lookup_by_host(&self, host_handle: u64) -> Option<u64> {
        self.objects.read().get(&host_handle).copied()
    }

    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Moves `wrapper` to the heap and binds it to its client handle.
///
/// With `client`, the header's `unix_handle` is pointed at the wrapper and
/// the header address becomes the client handle. Without it, the wrapper
/// address is the client handle. The pair is indexed in `registry` when one
/// is given.
///
/// # Safety
/// `client`, when given, must point to a live, writable header.
pub unsafe fn register<T: HostObject>(
    wrapper: Box<T>,
    client: Option<NonNull<ClientObject>>,
    registry: Option<&ObjectRegistry>,
) -> NonNull<T> {
    let ptr = NonNull::from(Box::leak(wrapper));
    let client_handle = match client {
        Some(header) => {
            // SAFETY: caller guarantees the header is live.
            unsafe { (*header.as_ptr()).unix_handle = ptr.as_ptr() as usize as u64 };
            header.as_ptr() as usize as u64
        }
        None => ptr.as_ptr() as usize as u64,
    };
    // SAFETY: freshly leaked, uniquely owned.
    let obj = unsafe { (*ptr.as_ptr()).object_mut() };
    obj.client_handle = client_handle;
    if let Some(registry) = registry {
        registry.insert(obj);
    }
    ptr
}

/// Finds the wrapper behind a client handle. O(1), no locking.
///
/// # Safety
/// The handle must have been produced by [`register`] for a `T` that is
/// still alive.
pub unsafe fn lookup_by_client<T: HostObject>(handle: ClientHandle) -> NonNull<T> {
    let raw = match handle {
        // SAFETY: dispatchable handles always point at a header.
        ClientHandle::Dispatchable(header) => unsafe { header.as_ref() }.unix_handle,
        ClientHandle::Opaque(raw) => raw,
    };
    match NonNull::new(raw as usize as *mut T) {
        Some(ptr) => ptr,
        None => {
            tracing::error!("client handle {:#x} has no host object", handle.raw());
            debug_assert!(false, "client handle {:#x} has no host object", handle.raw());
            // Release builds trap on the dereference that follows.
            NonNull::dangling()
        }
    }
}

/// Unlinks `ptr` from `registry` and hands ownership back to the caller.
///
/// # Safety
/// `ptr` must come from [`register`] and not have been unregistered.
pub unsafe fn unregister<T: HostObject>(ptr: NonNull<T>, registry: Option<&ObjectRegistry>) -> Box<T> {
    // SAFETY: caller guarantees `ptr` is the leaked box from `register`.
    let wrapper = unsafe { Box::from_raw(ptr.as_ptr()) };
    if let Some(registry) = registry {
        registry.remove(wrapper.object());
    }
    wrapper
}

/// Host handle of the wrapper behind a dispatchable client header.
///
/// # Safety
/// `header` must be a registered dispatchable client header.
pub unsafe fn host_handle_of(header: NonNull<ClientObject>) -> u64 {
    // SAFETY: every wrapper starts with a VulkanObject.
    unsafe {
        let obj = header.as_ref().unix_handle as usize as *const VulkanObject;
        debug_assert!(!obj.is_null(), "unbound client header");
        (*obj).host_handle
    }
}

/// Object types whose client handle differs from the host handle.
pub fn is_wrapped(object_type: vk::ObjectType) -> bool {
    matches!(
        object_type,
        vk::ObjectType::INSTANCE
            | vk::ObjectType::PHYSICAL_DEVICE
            | vk::ObjectType::DEVICE
            | vk::ObjectType::QUEUE
            | vk::ObjectType::COMMAND_BUFFER
            | vk::ObjectType::COMMAND_POOL
            | vk::ObjectType::DEFERRED_OPERATION_KHR
            | vk::ObjectType::DEBUG_UTILS_MESSENGER_EXT
    )
}

/// Client handle a driver callback should report for a host handle.
/// Unwrapped types pass through; unknown wrapped handles map to 0.
pub fn client_handle_from_host(
    registry: &ObjectRegistry,
    object_type: vk::ObjectType,
    host_handle: u64,
) -> u64 {
    if !is_wrapped(object_type) || host_handle == 0 {
        return host_handle;
    }
    registry.lookup_by_host(host_handle).unwrap_or_else(|| {
        tracing::warn!("no client handle for {:?} {:#x}", object_type, host_handle);
        0
    })
}
