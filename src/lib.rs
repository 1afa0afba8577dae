//! Auth Sentinel: authentication resilience service.
//!
//! A client-held state machine that protects an application from cascading
//! failures when its external session/token provider misbehaves (expired
//! refresh tokens, rate limits, infinite refresh loops).
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────┐
//!                 │                  AUTH SENTINEL                   │
//!                 │                                                  │
//!   Callers       │  ┌──────────┐      ┌───────────────┐             │
//!   ──────────────┼─▶│  admin   │      │  AuthMonitor  │ (periodic)  │
//!   (UI, routes,  │  │   API    │      └──────┬────────┘             │
//!    operators)   │  └────┬─────┘             │                      │
//!                 │       │                   ▼                      │
//!                 │       │           ┌──────────────┐               │
//!                 │       └──────────▶│ SessionGuard │               │
//!                 │                   └──────┬───────┘               │
//!                 │            ┌─────────────┼─────────────┐         │
//!                 │            ▼             ▼             ▼         │
//!                 │     ┌───────────┐ ┌────────────┐ ┌───────────┐   │
//!                 │     │StopManager│ │CircuitBrkr │ │ provider  │───┼──▶ Session
//!                 │     └───────────┘ └────────────┘ │  client   │   │    Provider
//!                 │                                  └───────────┘   │
//!                 │  Cross-cutting: config, storage, observability,  │
//!                 │  lifecycle                                       │
//!                 └──────────────────────────────────────────────────┘
//! ```
//!
//! Control flow: monitor → guard → {stop manager, circuit breaker} →
//! provider. Outcomes flow back up and update both gates before being
//! returned to callers.

// Core subsystems
pub mod config;
pub mod guard;
pub mod monitor;
pub mod provider;
pub mod resilience;
pub mod storage;

// Cross-cutting concerns
pub mod admin;
pub mod lifecycle;
pub mod observability;

pub use config::SentinelConfig;
pub use guard::{AuthStatus, SessionGuard};
pub use lifecycle::Shutdown;
pub use monitor::AuthMonitor;
