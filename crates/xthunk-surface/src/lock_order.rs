//! Ranked mutexes.
//!
//! Each thread keeps the ranks it holds. Taking a lock whose rank is not
//! strictly above every held rank panics, so a reversed acquisition shows
//! up on the first run instead of as a rare deadlock. Checks only run in
//! debug builds.

use std::cell::RefCell;
use std::ops::{Deref, DerefMut};

use parking_lot::{Mutex, MutexGuard};

/// Rank of a drawable's own lock.
pub const DRAWABLE_RANK: u32 = 10;
/// Rank of the window to toplevel registry lock.
pub const SURFACES_RANK: u32 = 20;

thread_local! {
    static HELD: RefCell<Vec<u32>> = const { RefCell::new(Vec::new()) };
}

pub struct RankedMutex<T> {
    rank: u32,
    name: &'static str,
    checked: bool,
    inner: Mutex<T>,
}

impl<T> RankedMutex<T> {
    pub fn new(rank: u32, name: &'static str, value: T) -> Self {
        Self::with_checks(rank, name, value, true)
    }

    pub fn with_checks(rank: u32, name: &'static str, value: T, checks: bool) -> Self {
        Self {
            rank,
            name,
            checked: checks && cfg!(debug_assertions),
            inner: Mutex::new(value),
        }
    }

    pub fn rank(&self) -> u32 {
        self.rank
    }

    pub fn lock(&self) -> RankedGuard<'_, T> {
        if self.checked {
            HELD.with(|held| {
                let mut held = held.borrow_mut();
                if let Some(&top) = held.iter().max() {
                    assert!(
                        self.rank > top,
                        "lock order violation: taking {} (rank {}) while holding rank {}",
                        self.name,
                        self.rank,
                        top
                    );
                }
                held.push(self.rank);
            });
        }
        RankedGuard {
            guard: self.inner.lock(),
            rank: self.checked.then_some(self.rank),
        }
    }

    pub fn get_mut(&mut self) -> &mut T {
        self.inner.get_mut()
    }
}

pub struct RankedGuard<'a, T> {
    guard: MutexGuard<'a, T>,
    rank: Option<u32>,
}

impl<T> Deref for RankedGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T> DerefMut for RankedGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}

impl<T> Drop for RankedGuard<'_, T> {
    fn drop(&mut self) {
        if let Some(rank) = self.rank {
            HELD.with(|held| {
                let mut held = held.borrow_mut();
                if let Some(pos) = held.iter().rposition(|&r| r == rank) {
                    held.remove(pos);
                }
            });
        }
    }
}

/// Ranks the calling thread holds, innermost last.
pub fn held_ranks() -> Vec<u32> {
    HELD.with(|held| held.borrow().clone())
}
