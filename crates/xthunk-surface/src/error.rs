use crate::types::{Hwnd, NativeId, NativeSurface};

#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error("window {0} has no native id")]
    NoNativeId(Hwnd),

    #[error("backend could not create a toplevel for native window {0:#x}")]
    ToplevelFailed(NativeId),

    #[error("unknown native surface {0:?}")]
    UnknownSurface(NativeSurface),
}
