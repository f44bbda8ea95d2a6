//! `xthunk present-demo`: windows drawing into the software compositor.

use std::sync::Arc;

use anyhow::Context;
use tracing::debug;
use xthunk_core::ThunkConfig;
use xthunk_surface::{Hwnd, Rect, SoftwareCompositor, SurfaceManager, WindowSurface, WindowTable};

/// Root window handles start here.
const FIRST_HWND: u64 = 0x1_0000;

pub fn run(config: &ThunkConfig, windows: u32, frames: u32, size: u32) -> anyhow::Result<()> {
    let backend = Arc::new(SoftwareCompositor::new(&config.surface));
    let table = Arc::new(WindowTable::new());
    let manager = SurfaceManager::new(backend.clone(), table.clone(), &config.surface);
    let edge = i32::try_from(size).context("size out of range")?;

    let mut surfaces: Vec<(Hwnd, Option<Arc<WindowSurface>>)> = Vec::new();
    for i in 0..u64::from(windows) {
        let hwnd = Hwnd(FIRST_HWND + i);
        table.insert(hwnd, Rect::from_size(edge + 16, edge + 32), Rect::new(8, 24, edge + 8, edge + 24));
        manager
            .create_toplevel_notify(hwnd, 0x100 + i)
            .with_context(|| format!("creating toplevel {}", hwnd))?;
        let mut slot = None;
        manager.update_window_surface(hwnd, hwnd, Rect::from_size(edge, edge), &mut slot);
        surfaces.push((hwnd, slot));
    }

    for frame in 0..frames {
        for (i, (hwnd, slot)) in surfaces.iter_mut().enumerate() {
            // Same rect every frame: the drawable is reused.
            manager.update_window_surface(*hwnd, *hwnd, Rect::from_size(edge, edge), slot);
            let Some(surface) = slot else { continue };
            let band = (frame as i32 * 4) % edge.max(1);
            let shade = 0xff00_0000 | ((frame * 3 + i as u32 * 64) & 0xff) << 8;
            surface.lock().fill(Rect::new(0, band, edge, band + 4), shade);
            surface.flush();
        }
        debug!(frame, "flushed");
    }

    let stats = backend.stats();
    println!("Windows:           {}", windows);
    println!("Frames:            {}", frames);
    println!("Presents:          {}", stats.presents);
    println!("Skipped:           {}", stats.skipped);
    println!("Pixels:            {}", stats.pixels);
    println!("Diagnostic fills:  {}", stats.diagnostic_fills);

    for (hwnd, _) in &surfaces {
        manager.delete_toplevel(*hwnd);
    }
    drop(surfaces);
    println!("Live surfaces:     {}", backend.live_surfaces());
    Ok(())
}
