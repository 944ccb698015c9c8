//! Deterministic Simulation Testing Kit
//!
//! `TigerStyle`: Same seed, same run. All randomness in the sim collaborators
//! flows through [`DeterministicRng`]; all failure paths are exercised through
//! [`FaultInjector`].

mod fault;
mod rng;

pub use fault::{FaultConfig, FaultInjector, FaultType};
pub use rng::DeterministicRng;
