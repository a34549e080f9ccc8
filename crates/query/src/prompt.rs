//! Prompt assembly
//!
//! Builds the structured prompt sent to the language model. The prompt
//! embeds the retrieved context and its similarity score between
//! `[START]` and `[END]` markers; generation stops at `[END]`.

use chrono::Utc;

/// Sentinel context used when no match clears the relevance threshold.
pub const NO_CONTEXT_FOUND: &str = "NO CONTEXT FOUND";

/// Marker the model is instructed to end its response with.
pub const STOP_SEQUENCE: &str = "[END]";

/// Assemble the prompt for one conversation turn.
pub fn build_prompt(query: &str, context: &str, score: f32) -> String {
    let today = Utc::now().format("%Y-%m-%d");
    let thought = if context == NO_CONTEXT_FOUND {
        "No relevant context was found."
    } else {
        "This context has sufficient information to answer the question."
    };

    format!(
        "Today is {today}. Use the provided context to answer the user's \
         question. If no context is available, respond appropriately.\n\
         \n\
         [START]\n\
         User Input: {query}\n\
         Context: {context}\n\
         Context Score: {score}\n\
         Assistant Thought: {thought}\n\
         Assistant Response: \n\
         [END]"
    )
}
