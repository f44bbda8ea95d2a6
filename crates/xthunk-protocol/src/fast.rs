//! Register-word fast path for hot command-recording calls.
//!
//! A fast call carries its arguments as raw machine words instead of a
//! parameter block and has no result. Only entry points whose arguments fit
//! in [`FAST_THUNK_MAX_ARGS`] words qualify.

use ash::vk;
use ash::vk::Handle;

pub const FAST_THUNK_MAX_ARGS: usize = 7;

pub type FastArgs = [u64; FAST_THUNK_MAX_ARGS];

macro_rules! fast_funcs {
    ($($variant:ident => ($name:literal, $args:literal),)*) => {
        #[repr(u32)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum FastCode {
            $($variant,)*
        }

        impl FastCode {
            pub const ALL: &'static [FastCode] = &[$(FastCode::$variant,)*];
            pub const COUNT: usize = Self::ALL.len();

            pub const fn name(self) -> &'static str {
                match self {
                    $(FastCode::$variant => $name,)*
                }
            }

            /// Number of meaningful words in [`FastArgs`].
            pub const fn arg_count(self) -> usize {
                match self {
                    $(FastCode::$variant => $args,)*
                }
            }
        }

        $(const _: () = assert!($args <= FAST_THUNK_MAX_ARGS);)*
    };
}

fast_funcs! {
    CmdDraw => ("vkCmdDraw", 5),
    CmdDrawIndexed => ("vkCmdDrawIndexed", 6),
    CmdDispatch => ("vkCmdDispatch", 4),
    CmdSetLineWidth => ("vkCmdSetLineWidth", 2),
    CmdSetDepthBias => ("vkCmdSetDepthBias", 4),
    CmdSetStencilReference => ("vkCmdSetStencilReference", 3),
    CmdSetBlendConstants => ("vkCmdSetBlendConstants", 3),
    CmdBindPipeline => ("vkCmdBindPipeline", 3),
}

impl FastCode {
    pub fn from_raw(raw: u32) -> Option<Self> {
        Self::ALL.get(raw as usize).copied()
    }
}

/// A value that travels in one fast-path word.
pub trait FastWord: Sized {
    fn to_word(self) -> u64;
    fn from_word(word: u64) -> Self;
}

impl FastWord for u32 {
    fn to_word(self) -> u64 {
        self as u64
    }
    fn from_word(word: u64) -> Self {
        word as u32
    }
}

impl FastWord for i32 {
    fn to_word(self) -> u64 {
        self as u32 as u64
    }
    fn from_word(word: u64) -> Self {
        word as u32 as i32
    }
}

impl FastWord for u64 {
    fn to_word(self) -> u64 {
        self
    }
    fn from_word(word: u64) -> Self {
        word
    }
}

// Floats travel as their IEEE bits so no conversion can perturb them.
impl FastWord for f32 {
    fn to_word(self) -> u64 {
        self.to_bits() as u64
    }
    fn from_word(word: u64) -> Self {
        f32::from_bits(word as u32)
    }
}

macro_rules! handle_word {
    ($($ty:ty),*) => {
        $(impl FastWord for $ty {
            fn to_word(self) -> u64 {
                self.as_raw()
            }
            fn from_word(word: u64) -> Self {
                <$ty>::from_raw(word)
            }
        })*
    };
}

handle_word!(vk::CommandBuffer, vk::Pipeline);

impl FastWord for vk::PipelineBindPoint {
    fn to_word(self) -> u64 {
        self.as_raw().to_word()
    }
    fn from_word(word: u64) -> Self {
        Self::from_raw(i32::from_word(word))
    }
}

impl FastWord for vk::StencilFaceFlags {
    fn to_word(self) -> u64 {
        self.as_raw().to_word()
    }
    fn from_word(word: u64) -> Self {
        Self::from_raw(u32::from_word(word))
    }
}

/// Two floats in one word, low half first.
pub fn pack_f32_pair(lo: f32, hi: f32) -> u64 {
    lo.to_bits() as u64 | ((hi.to_bits() as u64) << 32)
}

pub fn unpack_f32_pair(word: u64) -> (f32, f32) {
    (f32::from_bits(word as u32), f32::from_bits((word >> 32) as u32))
}

/// Packs arguments into a [`FastArgs`] array; rejects more than
/// [`FAST_THUNK_MAX_ARGS`] arguments at compile time.
#[macro_export]
macro_rules! fast_args {
    ($($arg:expr),+ $(,)?) => {{
        const _: () = assert!(
            [$(stringify!($arg)),+].len() <= $crate::fast::FAST_THUNK_MAX_ARGS
        );
        let words = [$($crate::fast::FastWord::to_word($arg)),+];
        let mut args: $crate::fast::FastArgs = [0; $crate::fast::FAST_THUNK_MAX_ARGS];
        args[..words.len()].copy_from_slice(&words);
        args
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_and_float_words_survive() {
        assert_eq!(i32::from_word((-7i32).to_word()), -7);
        let nan_bits = f32::from_bits(0x7fc0_1234);
        assert_eq!(f32::from_word(nan_bits.to_word()).to_bits(), 0x7fc0_1234);
        assert_eq!(unpack_f32_pair(pack_f32_pair(0.25, -1.5)), (0.25, -1.5));
    }

    #[test]
    fn fast_args_pads_with_zero() {
        let args = fast_args![1u32, 2.0f32, -1i32];
        assert_eq!(args[0], 1);
        assert_eq!(args[1], 2.0f32.to_bits() as u64);
        assert_eq!(args[2], 0xffff_ffff);
        assert!(args[3..].iter().all(|w| *w == 0));
    }
}
