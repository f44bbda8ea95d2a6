//! Integration test: ConversionContext
//!
//! Allocations must stay valid and untouched across overflow and moves.

use xthunk_core::conversion::{ConversionContext, INLINE_BYTES};

#[test]
fn test_small_allocations_stay_inline_and_aligned() {
    let mut ctx = ConversionContext::new();
    let a = ctx.alloc(3);
    let b = ctx.alloc(13);
    assert_eq!(a.as_ptr() as usize % 8, 0);
    assert_eq!(b.as_ptr() as usize % 8, 0);
    assert_eq!(b.as_ptr() as usize - a.as_ptr() as usize, 8);
    assert_eq!(ctx.inline_used(), 24);
    assert_eq!(ctx.overflow_blocks(), 0);
}

#[test]
fn test_overflow_keeps_earlier_allocations() {
    let mut ctx = ConversionContext::new();
    let first = ctx.alloc_slice(&[0xaaaa_u64; 200]);
    let big = ctx.alloc_slice(&[0x5555_u32; 1024]);
    assert_eq!(ctx.overflow_blocks(), 1);

    // Moving the context must not move its blocks.
    let moved = Box::new(ctx);
    let first = unsafe { std::slice::from_raw_parts(first, 200) };
    let big = unsafe { std::slice::from_raw_parts(big, 1024) };
    assert!(first.iter().all(|v| *v == 0xaaaa));
    assert!(big.iter().all(|v| *v == 0x5555));
    assert!(moved.inline_used() <= INLINE_BYTES);
}

#[test]
fn test_allocations_are_zeroed() {
    let mut ctx = ConversionContext::new();
    let arr = ctx.alloc_array::<u64>(400);
    let arr = unsafe { std::slice::from_raw_parts(arr, 400) };
    assert!(arr.iter().all(|v| *v == 0));
}
