//! Process lifecycle.
//!
//! # Design Decisions
//! - One broadcast-based coordinator shared by every long-running task
//! - Ctrl-C is the only shutdown source in the daemon; tests trigger directly

pub mod shutdown;

pub use shutdown::Shutdown;
