//! Prompt templates and fixed response strings.

/// System instruction prepended to every generation prompt.
pub const SYSTEM_PROMPT: &str = "You are a careful assistant that answers questions using only the \
provided document context. If the context does not contain the answer, say that you cannot answer \
from the document. Do not use outside knowledge.";

/// The exact refusal string: emitted whenever the grounding gate fails
/// and matched verbatim by the test suite.
pub const REFUSAL_TEXT: &str = "I cannot answer this question based on the provided document.";

/// Canned response for greetings and conversational filler.
pub const GREETING_TEXT: &str =
    "Hello! Ask me a question about the uploaded document and I will answer from its contents.";

/// Assemble the full generation prompt from retrieved context and the
/// user's question.
pub fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "{}\n\nContext:\n{}\n\nQuestion:\n{}",
        SYSTEM_PROMPT, context, question
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_contains_context_and_question() {
        let prompt = build_prompt("some retrieved text", "what is this?");

        assert!(prompt.starts_with(SYSTEM_PROMPT));
        assert!(prompt.contains("Context:\nsome retrieved text"));
        assert!(prompt.ends_with("Question:\nwhat is this?"));
    }

    #[test]
    fn test_empty_context_still_builds() {
        let prompt = build_prompt("", "anything?");
        assert!(prompt.contains("Context:\n\n"));
    }
}
