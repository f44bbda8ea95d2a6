//! Pieces shared by every xthunk crate: logging setup and platform paths.

pub mod logging;
pub mod platform;
