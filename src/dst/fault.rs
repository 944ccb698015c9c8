//! `FaultInjector` - Probabilistic Fault Injection
//!
//! `TigerStyle`: Explicit fault injection for exercising every degradation
//! path the pipelines promise to survive.

use std::collections::HashMap;
use std::sync::Mutex;

use super::rng::DeterministicRng;
use crate::constants::FAULT_PROBABILITY_MAX;

/// Faults the sim collaborators can inject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultType {
    /// LLM request times out
    LlmTimeout,
    /// LLM backend unavailable
    LlmUnavailable,
    /// LLM returns an unusable response
    LlmInvalidResponse,
    /// Durable store write fails
    StoreWriteFail,
    /// Durable store read fails
    StoreReadFail,
    /// Vector upsert fails
    VectorUpsertFail,
    /// Vector query fails
    VectorQueryFail,
}

impl FaultType {
    /// String form for operation matching and logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LlmTimeout => "llm_timeout",
            Self::LlmUnavailable => "llm_unavailable",
            Self::LlmInvalidResponse => "llm_invalid_response",
            Self::StoreWriteFail => "store_write_fail",
            Self::StoreReadFail => "store_read_fail",
            Self::VectorUpsertFail => "vector_upsert_fail",
            Self::VectorQueryFail => "vector_query_fail",
        }
    }
}

/// Configuration for a single fault.
#[derive(Debug, Clone)]
pub struct FaultConfig {
    /// The fault to inject
    pub fault_type: FaultType,
    /// Probability of injection, 0.0 to 1.0
    pub probability: f64,
    /// Optional operation filter (substring match against the op name)
    pub operation_filter: Option<String>,
    /// Maximum injections (None = unlimited)
    pub max_injections: Option<u64>,
}

impl FaultConfig {
    /// Create a fault configuration.
    ///
    /// # Panics
    /// Panics if probability is outside [0, 1].
    #[must_use]
    pub fn new(fault_type: FaultType, probability: f64) -> Self {
        assert!(
            (0.0..=FAULT_PROBABILITY_MAX).contains(&probability),
            "probability must be in [0, {FAULT_PROBABILITY_MAX}], got {probability}"
        );
        Self {
            fault_type,
            probability,
            operation_filter: None,
            max_injections: None,
        }
    }

    /// Restrict the fault to operations whose name contains `filter`.
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.operation_filter = Some(filter.into());
        self
    }

    /// Cap the number of injections.
    ///
    /// # Panics
    /// Panics if max is zero.
    #[must_use]
    pub fn with_max_injections(mut self, max: u64) -> Self {
        assert!(max > 0, "max_injections must be positive");
        self.max_injections = Some(max);
        self
    }
}

/// Probabilistic fault injector shared across sim collaborators.
///
/// Interior mutability via `Mutex` so a single injector can be shared
/// through `Arc` by the LLM, store, and vector sims at once.
#[derive(Debug)]
pub struct FaultInjector {
    rng: Mutex<DeterministicRng>,
    configs: Vec<FaultConfig>,
    injection_counts: Mutex<HashMap<FaultType, u64>>,
}

impl FaultInjector {
    /// Create an injector with no registered faults.
    #[must_use]
    pub fn new(rng: DeterministicRng) -> Self {
        Self {
            rng: Mutex::new(rng),
            configs: Vec::new(),
            injection_counts: Mutex::new(HashMap::new()),
        }
    }

    /// Register a fault. Registration must happen before sharing via `Arc`.
    pub fn register(&mut self, config: FaultConfig) {
        self.configs.push(config);
    }

    /// Decide whether a fault fires for the named operation.
    ///
    /// Deterministic given the seed and call sequence. Returns the fault type
    /// to raise, or None.
    pub fn should_inject(&self, operation: &str) -> Option<FaultType> {
        for config in &self.configs {
            if let Some(filter) = &config.operation_filter {
                if !operation.contains(filter.as_str()) {
                    continue;
                }
            }

            if let Some(max) = config.max_injections {
                let counts = self.injection_counts.lock().unwrap_or_else(|e| e.into_inner());
                if counts.get(&config.fault_type).copied().unwrap_or(0) >= max {
                    continue;
                }
            }

            let fires = {
                let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
                rng.next_bool(config.probability)
            };
            if fires {
                let mut counts = self.injection_counts.lock().unwrap_or_else(|e| e.into_inner());
                *counts.entry(config.fault_type).or_insert(0) += 1;
                return Some(config.fault_type);
            }
        }
        None
    }

    /// Times the given fault has fired so far.
    #[must_use]
    pub fn injection_count(&self, fault_type: FaultType) -> u64 {
        let counts = self.injection_counts.lock().unwrap_or_else(|e| e.into_inner());
        counts.get(&fault_type).copied().unwrap_or(0)
    }
}
