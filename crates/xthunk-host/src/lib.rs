//! Host half of the thunking layer.
//!
//! Receives parameter blocks from the client stubs, maps client handles to
//! host objects, converts structures where the client's layout differs, and
//! calls the host Vulkan and OpenXR loaders.

mod command;
mod context;
mod debug;
mod deferred;
mod device;
mod driver;
mod error;
mod fast;
mod funcs;
mod gate;
mod instance;
mod objects;
mod openxr;
mod sync;
mod thunks;
mod thunks32;
mod unix_lib;

pub use context::HostContext;
pub use deferred::deferred_scratch_bytes;
pub use device::queue_count;
pub use driver::{HostDriver, XrDriver};
pub use error::HostError;
pub use unix_lib::UnixLib;

/// Boundary status for a thunk that could not run; API results travel in
/// the parameter block.
pub(crate) type HostResult<T> = Result<T, xthunk_protocol::NtStatus>;
