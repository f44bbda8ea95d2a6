use std::ffi::c_void;

use crate::codes::{FuncCode, TableSignature};
use crate::fast::{FastArgs, FastCode};
use crate::status::NtStatus;

/// The boundary-call primitive: invoke the function numbered `code` with a
/// parameter block.
///
/// Calls are synchronous. The implementation may block for as long as the
/// underlying driver call does.
pub trait UnixCallDispatcher: Send + Sync {
    /// Signature of the table this dispatcher was built from.
    fn signature(&self) -> TableSignature;

    /// # Safety
    /// `params` must point to the parameter block type matching `code`, in
    /// the layout (native or 32-bit) this dispatcher serves, and every
    /// pointer inside it must be valid for the call.
    unsafe fn call(&self, code: FuncCode, params: *mut c_void) -> NtStatus;

    /// Register-word variant of [`call`](Self::call) with the same status
    /// contract.
    ///
    /// # Safety
    /// The first `code.arg_count()` words must hold valid arguments for the
    /// entry point.
    unsafe fn fast_call(&self, code: FastCode, args: FastArgs) -> NtStatus;
}
