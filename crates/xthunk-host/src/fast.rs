//! Fast-path handlers for command recording.
//!
//! Arguments arrive as raw words. A failure returns the same status the
//! parameter-block thunk would.

use ash::vk;
use tracing::error;
use xthunk_core::wow64::Width;
use xthunk_protocol::fast::{unpack_f32_pair, FastArgs, FastCode, FastWord};
use xthunk_protocol::NtStatus;

use crate::command;
use crate::context::HostContext;
use crate::objects::{dispatchable, HostCommandBuffer};
use crate::HostResult;

/// Client handle of the command buffer in word 0. A 32-bit client passes a
/// 32-bit address.
fn command_buffer_raw(ctx: &HostContext, width: Width, word: u64) -> u64 {
    match width {
        Width::W64 => word,
        Width::W32 => ctx.space().widen(word as u32) as usize as u64,
    }
}

/// # Safety
/// Word 0 must be a live command buffer; the remaining words must be valid
/// arguments for `code`.
pub(crate) unsafe fn fast_call(ctx: &HostContext, width: Width, code: FastCode, args: &FastArgs) -> NtStatus {
    let raw = command_buffer_raw(ctx, width, args[0]);
    // SAFETY: forwarded from caller.
    let res = unsafe { dispatchable::<HostCommandBuffer>(raw) }.and_then(|cb| record(cb, code, args));
    match res {
        Ok(()) => NtStatus::SUCCESS,
        Err(status) => {
            error!("fast call {} failed: {:?}", code.name(), status);
            status
        }
    }
}

fn record(cb: &HostCommandBuffer, code: FastCode, args: &FastArgs) -> HostResult<()> {
    match code {
        FastCode::CmdDraw => command::cmd_draw(
            cb,
            u32::from_word(args[1]),
            u32::from_word(args[2]),
            u32::from_word(args[3]),
            u32::from_word(args[4]),
        ),
        FastCode::CmdDrawIndexed => command::cmd_draw_indexed(
            cb,
            u32::from_word(args[1]),
            u32::from_word(args[2]),
            u32::from_word(args[3]),
            i32::from_word(args[4]),
            u32::from_word(args[5]),
        ),
        FastCode::CmdDispatch => command::cmd_dispatch(
            cb,
            u32::from_word(args[1]),
            u32::from_word(args[2]),
            u32::from_word(args[3]),
        ),
        FastCode::CmdSetLineWidth => command::cmd_set_line_width(cb, f32::from_word(args[1])),
        FastCode::CmdSetDepthBias => command::cmd_set_depth_bias(
            cb,
            f32::from_word(args[1]),
            f32::from_word(args[2]),
            f32::from_word(args[3]),
        ),
        FastCode::CmdSetStencilReference => command::cmd_set_stencil_reference(
            cb,
            vk::StencilFaceFlags::from_word(args[1]),
            u32::from_word(args[2]),
        ),
        FastCode::CmdSetBlendConstants => {
            let (r, g) = unpack_f32_pair(args[1]);
            let (b, a) = unpack_f32_pair(args[2]);
            command::cmd_set_blend_constants(cb, &[r, g, b, a])
        }
        FastCode::CmdBindPipeline => command::cmd_bind_pipeline(
            cb,
            vk::PipelineBindPoint::from_word(args[1]),
            vk::Pipeline::from_word(args[2]),
        ),
    }
}
