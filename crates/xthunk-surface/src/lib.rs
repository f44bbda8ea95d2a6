//! Window surfaces: the registry of top-level compositing targets, the
//! drawables presented onto them, and an in-memory backend.

pub mod backend;
pub mod error;
pub mod fpu;
pub mod lock_order;
pub mod manager;
pub mod software;
pub mod types;
pub mod window_surface;
pub mod windowing;

pub use backend::{Drawable, Present, SurfaceBackend};
pub use error::SurfaceError;
pub use manager::{SurfaceManager, ToplevelSurface};
pub use software::{PresentStats, SoftwareCompositor};
pub use types::{Hwnd, NativeId, NativeSurface, Point, Rect, Region, SurfaceDesc};
pub use window_surface::{SurfaceLock, WindowSurface};
pub use windowing::{WindowSystem, WindowTable, NATIVE_ID_PROPERTY};
