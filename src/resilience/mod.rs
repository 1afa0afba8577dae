//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Guard call to provider:
//!     → stop_manager.rs (kill-switch check, first)
//!     → circuit_breaker.rs (failure-streak gate, second)
//!     → On outcome: guard records success/failure back into the breaker,
//!       and escalates refresh-token-invalid errors into the stop manager
//! ```
//!
//! # Design Decisions
//! - The two gates are mutually independent singletons; either can deny
//! - The breaker self-heals on a timer; the stop manager never does
//! - Only the guard's classification path and the explicit recovery
//!   operations mutate either one

pub mod circuit_breaker;
pub mod stop_manager;

pub use circuit_breaker::{BreakerSnapshot, CircuitBreaker};
pub use stop_manager::{StopInfo, StopManager};
