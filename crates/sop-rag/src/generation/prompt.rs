//! Prompt templates for grounded answering

use crate::types::QueryResult;

/// Separator between context blocks
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Prompt builder for grounded queries
pub struct PromptBuilder;

impl PromptBuilder {
    /// Build the context block from retrieved chunks, in retrieval order,
    /// each tagged with its source document
    pub fn build_context(result: &QueryResult<'_>) -> String {
        result
            .iter()
            .enumerate()
            .map(|(i, m)| {
                format!(
                    "[{}] Source: {}\n{}",
                    i + 1,
                    m.chunk.document_id,
                    m.chunk.content.trim()
                )
            })
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR)
    }

    /// Build the full prompt with strict grounding
    pub fn build_grounded_prompt(question: &str, context: &str) -> String {
        format!(
            r#"You are a GxP compliance assistant that answers ONLY from the provided documents.

GROUNDING RULES:
1. Answer only using the provided context below
2. If the context is insufficient to answer, state explicitly: "The provided documents do not contain enough information to answer this question."
3. Never use external knowledge or make assumptions beyond what the context states
4. If the documents contain conflicting information, highlight both and name their sources
5. Refer to sources by the document name shown in the context

CONTEXT FROM DOCUMENTS:
{context}

QUESTION: {question}

ANSWER:"#,
            context = context,
            question = question.trim()
        )
    }
}
