//! Integration test: client stubs with the fast path disabled
//!
//! Every hot command must reach the host through its parameter block and
//! arrive with exactly the arguments the fast path would carry.

mod common;

use ash::vk;
use xthunk_vk_icd::loader;

const FAST: bool = false;

#[test]
fn test_hot_commands_use_parameter_blocks() {
    let _guard = common::setup(FAST);
    assert!(!loader::fast_path());
    let (_device, cb) = common::recording();

    common::record_sample(cb);
    let state = common::state();
    assert_eq!(state.commands, common::expected_sample(cb));
    assert_eq!(state.generic_calls, 8);
    assert_eq!(state.fast_calls, 0);
}

#[test]
fn test_recording_on_two_buffers_keeps_handles_apart() {
    let _guard = common::setup(FAST);
    let (device, first) = common::recording();
    let pool = common::create_pool(device);
    let (res, buffers) = common::allocate(device, pool, 1);
    assert_eq!(res, vk::Result::SUCCESS);
    let second = buffers[0];

    common::record_sample(first);
    common::record_sample(second);
    let mut expected = common::expected_sample(first);
    expected.extend(common::expected_sample(second));
    assert_eq!(common::state().commands, expected);
}
