//! Prompt Templates
//!
//! All prompts the engine sends to the generation collaborator, centralized.
//! Utility calls share a terse system prompt that suppresses conversational
//! framing.

/// System prompt for single-output utility calls.
pub const UTILITY_SYSTEM_PROMPT: &str = "You are a highly efficient, single-output processing module. \
     Your ONLY purpose is to produce the requested output. \
     You will NEVER engage in conversation, offer greetings, ask questions, \
     or add any introductory or concluding remarks. \
     Respond with nothing but the requested output.";

/// Rank a memory 1-5.
#[must_use]
pub fn rank_memory(text: &str) -> String {
    format!(
        "You are evaluating a message to determine how informative or meaningful it is.\n\n\
         Based on the content, assign it a rank from 1 to 5:\n\n\
         1 - Noise / Fluff: Boilerplate, repetitive, off-topic, or lacking meaningful content.\n\
         2 - Minor: Light emotional context or vague thought, lacks depth or specificity.\n\
         3 - Useful: Contains at least one clear idea, insight, or point worth keeping.\n\
         4 - Important: Clear relevance, meaningful insight, decision, realization, or reflective moment.\n\
         5 - Critical: Core to identity, evolution, or decision-making. Key turning points.\n\n\
         Respond with ONLY the rank (1-5).\n\n\
         Message: {text}"
    )
}

/// Rephrase a question as a declarative, memory-styled sentence.
#[must_use]
pub fn rephrase_as_memory_style(text: &str) -> String {
    format!(
        "Rephrase the question as a direct, factual sentence someone might have said \
         in a conversation. Avoid emotional or poetic language. Be concise and declarative.\n\n\
         Question: {text}\n\
         Declarative:"
    )
}

/// Summarize a single memory in one sentence.
#[must_use]
pub fn summarize_memory(text: &str) -> String {
    format!(
        "Summarize the following memory in 1 concise, factual sentence. \
         Avoid lists or multiple versions. Focus on core details.\n\n\
         Memory: {text}"
    )
}

/// Summarize a conversation overflow chunk.
#[must_use]
pub fn summarize_overflow(text: &str) -> String {
    format!(
        "Summarize the following conversation in 1-2 concise sentences. \
         Focus only on what was discussed, decided, or explored. \
         Avoid filler, repetition, or quoting directly -- rephrase in your own words.\n\n\
         Conversation: {text}"
    )
}

/// Summarize a full session conversation.
#[must_use]
pub fn summarize_session_conversation(text: &str) -> String {
    format!(
        "Summarize the following conversation in 2-3 concise sentences. \
         Focus only on what was discussed, decided, or explored. \
         Avoid filler, repetition, or quoting directly -- rephrase in your own words. \
         Ensure the summary is in third-person, objective voice, \
         without any 'I', 'we', or 'you' pronouns.\n\n\
         [{text}]"
    )
}

/// Meta-summarize a set of chunk summaries.
#[must_use]
pub fn summarize_session_summaries(text: &str) -> String {
    format!(
        "Please summarize these summaries into 3-5 sentences that reflect \
         the overall conversation.\n\n\
         [{text}]"
    )
}

/// Generate a session title from a summary.
#[must_use]
pub fn generate_session_title(text: &str) -> String {
    format!(
        "Generate a concise title for this conversation, 1 sentence or less. \
         Respond with only the title.\n\n\
         Conversation: {text}"
    )
}

/// Rate memory importance 0.0-1.0.
#[must_use]
pub fn ask_importance(text: &str) -> String {
    format!(
        "Rate the importance of the following memory on a scale from 0.0 to 1.0.\n\
         Use the following guidelines:\n\
         - 1.0 = Deeply personal, emotionally significant, critical fact, or core belief\n\
         - 0.7 = Important context or recurring theme\n\
         - 0.4 = Useful but minor detail\n\
         - 0.1 = Casual, generic, or low-impact\n\n\
         Respond ONLY with a single numeric value.\n\n\
         Memory: {text}"
    )
}

/// Extract behavioral lessons from a conversation excerpt.
#[must_use]
pub fn extract_lesson(text: &str) -> String {
    format!(
        "Looking at the following conversation:\n\
         1. Did the assistant understand the user's intention?\n\
         2. What did it miss?\n\
         3. What 3-5 lessons should it internalize to improve in the future?\n\
         4. Growth Trajectory?\n\n\
         Please separate your response into:\n\
         Evaluation Summary\n\
         Lessons\n\n\
         Conversation: {text}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompts_embed_the_text() {
        let text = "the deploy broke at midnight";
        assert!(rank_memory(text).contains(text));
        assert!(summarize_memory(text).contains(text));
        assert!(ask_importance(text).contains(text));
        assert!(rephrase_as_memory_style(text).contains(text));
        assert!(extract_lesson(text).contains(text));
        assert!(generate_session_title(text).contains(text));
    }

    #[test]
    fn test_rank_prompt_demands_bare_rank() {
        assert!(rank_memory("x").contains("ONLY the rank"));
    }
}
