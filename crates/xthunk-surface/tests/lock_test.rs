//! Integration test: lock discipline under contention
//!
//! Updaters take `surfaces_cs` alone while flushers take a drawable lock and
//! then `surfaces_cs`. Running both at once must finish.

mod common;

use std::sync::Arc;
use std::thread;

use common::{Desktop, GREEN};
use xthunk_surface::lock_order::held_ranks;
use xthunk_surface::{Hwnd, Rect, WindowSurface};

const UPDATERS: u64 = 4;
const FLUSHERS: u64 = 4;
const ROUNDS: u64 = 200;

#[test]
fn test_updaters_and_flushers_do_not_deadlock() {
    let desktop = Desktop::new();
    let shared_root = Hwnd(0x100);
    desktop.mapped(shared_root);

    let flushed: Vec<Arc<WindowSurface>> = (0..FLUSHERS)
        .map(|i| {
            let mut slot = None;
            desktop
                .manager
                .update_window_surface(shared_root, Hwnd(0x200 + i), Rect::from_size(32, 32), &mut slot);
            slot.expect("surface")
        })
        .collect();
    for i in 0..UPDATERS {
        desktop.mapped(Hwnd(0x300 + i));
    }

    thread::scope(|s| {
        for i in 0..UPDATERS {
            let manager = &desktop.manager;
            s.spawn(move || {
                let root = Hwnd(0x300 + i);
                let mut slot = None;
                for round in 0..ROUNDS {
                    let size = 16 + (round % 3) as i32 * 8;
                    manager.update_window_surface(root, root, Rect::from_size(size, size), &mut slot);
                    // Same size again is a reuse.
                    manager.update_window_surface(root, root, Rect::from_size(size, size), &mut slot);
                }
                assert!(held_ranks().is_empty());
            });
        }
        for surface in &flushed {
            s.spawn(move || {
                for round in 0..ROUNDS {
                    let at = (round % 32) as i32;
                    surface.lock().fill(Rect::new(at, 0, at + 1, 32), GREEN);
                    surface.flush();
                }
                assert!(held_ranks().is_empty());
            });
        }
    });

    assert_eq!(desktop.backend.stats().presents, FLUSHERS * ROUNDS);
    for surface in &flushed {
        assert_eq!(surface.bounds(), Rect::RESET_BOUNDS);
    }
}

#[test]
#[cfg(debug_assertions)]
#[should_panic(expected = "lock order violation")]
fn test_flushing_while_drawing_elsewhere_is_caught() {
    let desktop = Desktop::new();
    let root = Hwnd(0x400);
    desktop.mapped(root);
    let mut first = None;
    let mut second = None;
    desktop
        .manager
        .update_window_surface(root, Hwnd(0x401), Rect::from_size(8, 8), &mut first);
    desktop
        .manager
        .update_window_surface(root, Hwnd(0x402), Rect::from_size(8, 8), &mut second);

    let _drawing = first.as_ref().unwrap().lock();
    second.as_ref().unwrap().flush();
}
