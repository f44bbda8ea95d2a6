//! Shared vocabulary of the call boundary.
//!
//! Both sides of the boundary (the client-facing ICD stubs and the host
//! library) are compiled against this crate, so everything here is plain
//! `#[repr(C)]` layout: function codes, parameter blocks, client object
//! headers and the dispatcher trait that carries a call across.

pub mod client;
pub mod codes;
pub mod dispatcher;
pub mod error;
pub mod fast;
pub mod params;
pub mod params32;
pub mod status;
pub mod xr;

pub use codes::{FuncCode, TableSignature};
pub use dispatcher::UnixCallDispatcher;
pub use error::DispatchError;
pub use fast::{FastArgs, FastCode, FastWord, FAST_THUNK_MAX_ARGS};
pub use status::NtStatus;

/// A pointer as seen by a 32-bit client.
pub type Ptr32 = u32;
