//! `SimLlmProvider` - Deterministic Generation for Tests
//!
//! `TigerStyle`: Primary implementation for all tests and development; real
//! providers live in the routing collaborator, outside this crate.
//!
//! Routes prompts by content to small deterministic generators: ranking
//! prompts get a digit, importance prompts get a decimal, summarization
//! prompts get a condensed echo of the embedded text. Same seed and prompt,
//! same response.

use std::sync::Arc;

use async_trait::async_trait;

use super::{GenerationError, GenerationRequest, LlmProvider, TaskType};
use crate::dst::{FaultInjector, FaultType};

/// Deterministic LLM provider with optional fault injection.
#[derive(Debug, Clone)]
pub struct SimLlmProvider {
    seed: u64,
    fault_injector: Option<Arc<FaultInjector>>,
}

impl SimLlmProvider {
    /// Create a provider with the given seed.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            fault_injector: None,
        }
    }

    /// Create a provider with fault injection.
    #[must_use]
    pub fn with_faults(seed: u64, faults: Arc<FaultInjector>) -> Self {
        Self {
            seed,
            fault_injector: Some(faults),
        }
    }

    /// The seed in use.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// FNV-1a over seed and prompt, the stable source for pseudo-judgments.
    fn prompt_hash(&self, prompt: &str) -> u64 {
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325 ^ self.seed;
        for byte in prompt.bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
        }
        hash
    }

    /// Pull the text embedded after the last "Marker:" line of a template.
    fn embedded_text(prompt: &str) -> &str {
        for marker in [
            "Message:",
            "Memory:",
            "Question:",
            "Conversation:",
        ] {
            if let Some(pos) = prompt.rfind(marker) {
                let after = prompt[pos + marker.len()..].trim();
                if !after.is_empty() {
                    return after;
                }
            }
        }
        prompt.trim()
    }

    fn first_words(text: &str, count: usize) -> String {
        text.split_whitespace()
            .take(count)
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn route(&self, prompt: &str) -> String {
        let hash = self.prompt_hash(prompt);

        if prompt.contains("assign it a rank") {
            // Plausible ranks only: 3, 4, or 5
            let rank = 3 + (hash % 3);
            return rank.to_string();
        }

        if prompt.contains("Rate the importance") {
            let tenths = 1 + (hash % 9);
            return format!("0.{tenths}");
        }

        if prompt.contains("Declarative:") {
            let question = Self::embedded_text(prompt)
                .trim_end_matches("Declarative:")
                .trim()
                .trim_end_matches('?');
            return format!("{question}.");
        }

        if prompt.contains("Generate a concise title") {
            return format!("Notes: {}", Self::first_words(Self::embedded_text(prompt), 5));
        }

        if prompt.contains("Did the assistant understand") {
            return format!(
                "Evaluation Summary\nThe assistant broadly followed the user's intent.\n\n\
                 Lessons\n- {}",
                Self::first_words(Self::embedded_text(prompt), 10)
            );
        }

        if prompt.to_lowercase().contains("summar") {
            return format!("Summary: {}", Self::first_words(Self::embedded_text(prompt), 12));
        }

        // Generic echo
        format!("Response: {}", Self::first_words(prompt, 12))
    }
}

#[async_trait]
impl LlmProvider for SimLlmProvider {
    #[tracing::instrument(skip(self, request), fields(task = task.as_str()))]
    async fn generate(
        &self,
        task: TaskType,
        request: &GenerationRequest,
    ) -> Result<String, GenerationError> {
        if let Some(injector) = &self.fault_injector {
            if let Some(fault) = injector.should_inject("llm_generate") {
                return Err(match fault {
                    FaultType::LlmTimeout => GenerationError::timeout(),
                    FaultType::LlmInvalidResponse => {
                        GenerationError::invalid_response("simulated garbled output")
                    }
                    _ => GenerationError::unavailable(fault.as_str()),
                });
            }
        }

        let response = self.route(&request.prompt);

        // Postcondition
        debug_assert!(!response.is_empty(), "sim response must not be empty");
        Ok(response)
    }

    fn name(&self) -> &'static str {
        "sim"
    }
}

// =============================================================================
// Tests
// =============================================================================
