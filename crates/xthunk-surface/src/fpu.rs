//! Floating-point control state around backend drawing.

#[cfg(target_arch = "x86")]
use std::arch::x86 as arch;
#[cfg(target_arch = "x86_64")]
use std::arch::x86_64 as arch;

/// MXCSR exception mask bits (invalid, denormal, divide, overflow,
/// underflow, precision).
pub const MXCSR_EXCEPTION_MASK: u32 = 0x1f80;

/// The SSE control/status word, or 0 where there is none.
#[allow(deprecated)]
pub fn control_word() -> u32 {
    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    {
        // SAFETY: SSE is part of every x86 target this builds for.
        unsafe { arch::_mm_getcsr() }
    }
    #[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
    {
        0
    }
}

/// Replace the SSE control/status word.
///
/// # Safety
/// Unmasking exceptions makes later float operations trap.
#[allow(deprecated)]
pub unsafe fn set_control_word(value: u32) {
    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    {
        // SAFETY: caller contract.
        unsafe { arch::_mm_setcsr(value) }
    }
    #[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
    {
        let _ = value;
    }
}

/// Masks every floating-point exception until dropped, then restores the
/// caller's control and status bits exactly.
pub struct FpuGuard {
    saved: u32,
}

impl FpuGuard {
    pub fn mask_all() -> Self {
        let saved = control_word();
        // SAFETY: only adds mask bits.
        unsafe { set_control_word(saved | MXCSR_EXCEPTION_MASK) };
        Self { saved }
    }
}

impl Drop for FpuGuard {
    fn drop(&mut self) {
        // SAFETY: the value was read from this thread on entry.
        unsafe { set_control_word(self.saved) };
    }
}

#[cfg(all(test, any(target_arch = "x86", target_arch = "x86_64")))]
mod tests {
    use super::*;

    /// Round toward zero: harmless for the test harness, easy to spot.
    const ROUND_TOWARD_ZERO: u32 = 0x6000;

    #[test]
    fn guard_masks_and_restores() {
        let original = control_word();
        let custom = original | ROUND_TOWARD_ZERO;
        unsafe { set_control_word(custom) };
        {
            let _guard = FpuGuard::mask_all();
            assert_eq!(control_word() & MXCSR_EXCEPTION_MASK, MXCSR_EXCEPTION_MASK);
            assert_eq!(control_word() & ROUND_TOWARD_ZERO, ROUND_TOWARD_ZERO);
        }
        assert_eq!(control_word(), custom);
        unsafe { set_control_word(original) };
    }
}
