use std::collections::HashMap;

use parking_lot::Mutex;

use crate::types::{Hwnd, Rect};

/// Window property holding the native id of a toplevel's backing window.
pub const NATIVE_ID_PROPERTY: &str = "__xthunk_native_id";

/// The windowing system the surfaces belong to.
///
/// Queries about a window that no longer exists return a zero rectangle
/// or no property.
pub trait WindowSystem: Send + Sync {
    fn is_window(&self, hwnd: Hwnd) -> bool;

    /// Client area, relative to the window's toplevel.
    fn client_rect(&self, hwnd: Hwnd) -> Rect;

    /// Whole window, in screen coordinates.
    fn window_rect(&self, hwnd: Hwnd) -> Rect;

    fn get_property(&self, hwnd: Hwnd, name: &str) -> Option<u64>;

    fn set_property(&self, hwnd: Hwnd, name: &str, value: u64);
}

#[derive(Debug, Default)]
struct WindowEntry {
    client: Rect,
    window: Rect,
    properties: HashMap<String, u64>,
}

/// In-memory window table.
#[derive(Debug, Default)]
pub struct WindowTable {
    windows: Mutex<HashMap<Hwnd, WindowEntry>>,
}

impl WindowTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or move a window.
    pub fn insert(&self, hwnd: Hwnd, window: Rect, client: Rect) {
        let mut windows = self.windows.lock();
        let entry = windows.entry(hwnd).or_default();
        entry.window = window;
        entry.client = client;
    }

    pub fn remove(&self, hwnd: Hwnd) {
        self.windows.lock().remove(&hwnd);
    }
}

impl WindowSystem for WindowTable {
    fn is_window(&self, hwnd: Hwnd) -> bool {
        self.windows.lock().contains_key(&hwnd)
    }

    fn client_rect(&self, hwnd: Hwnd) -> Rect {
        self.windows.lock().get(&hwnd).map(|w| w.client).unwrap_or_default()
    }

    fn window_rect(&self, hwnd: Hwnd) -> Rect {
        self.windows.lock().get(&hwnd).map(|w| w.window).unwrap_or_default()
    }

    fn get_property(&self, hwnd: Hwnd, name: &str) -> Option<u64> {
        self.windows.lock().get(&hwnd)?.properties.get(name).copied()
    }

    fn set_property(&self, hwnd: Hwnd, name: &str, value: u64) {
        if let Some(w) = self.windows.lock().get_mut(&hwnd) {
            w.properties.insert(name.to_string(), value);
        }
    }
}
