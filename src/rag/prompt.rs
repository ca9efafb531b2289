//! Grounded prompt construction and context-window budgeting.

use tiktoken_rs::{cl100k_base, CoreBPE};

use crate::error::{RagError, Result};

/// Refusal the model is told to give when the context is insufficient.
pub const REFUSAL: &str =
    "I am sorry, but I cannot answer that question with the information I have.";

const INSTRUCTIONS: &str = "You are a \"Digital Krishi Officer,\" an expert in coconut cultivation in Kerala.
You must answer the user's question accurately and concisely based ONLY on the provided context.
If the information required to answer the question is not present in the context, simply state: ";

/// Renders the prompt. `context` must be non-empty; callers answer empty
/// retrievals without reaching this point.
pub fn build_prompt(context: &str, question: &str, language: &str) -> String {
    format!(
        "\n{INSTRUCTIONS}\n\"{REFUSAL}\" Do not add any other information.\n\nContext: {context}\n\nQuestion: {question}\n\nAnswer in {language}:\n"
    )
}

/// Keeps the rendered prompt plus the generated answer inside the model's
/// context window. Token counts are estimated with `cl100k_base`, which is
/// close to, but not the same as, the runtime's own tokenizer.
pub struct TokenBudget {
    bpe: CoreBPE,
    context_window: usize,
    max_tokens: usize,
}

impl TokenBudget {
    pub fn new(context_window: usize, max_tokens: usize) -> Result<Self> {
        let bpe = cl100k_base().map_err(|e| RagError::config(format!("Failed to load tokenizer: {}", e)))?;
        Ok(Self {
            bpe,
            context_window,
            max_tokens,
        })
    }

    pub fn count(&self, text: &str) -> usize {
        self.bpe.encode_with_special_tokens(text).len()
    }

    /// Joins retrieved passages (best first) with blank lines, dropping
    /// lower-ranked passages that would overflow the window. If even the
    /// best passage does not fit it is cut at the token limit. Returns an
    /// empty string when no room is left at all.
    pub fn fit_context(&self, passages: &[String], question: &str, language: &str) -> String {
        let skeleton = self.count(&build_prompt("", question, language));
        let Some(mut remaining) = self
            .context_window
            .checked_sub(self.max_tokens + skeleton)
            .filter(|r| *r > 0)
        else {
            return String::new();
        };

        let separator = self.count("\n\n");
        let mut kept: Vec<&str> = Vec::new();

        for passage in passages {
            let cost = self.count(passage) + if kept.is_empty() { 0 } else { separator };
            if cost > remaining {
                break;
            }
            remaining -= cost;
            kept.push(passage);
        }

        if kept.is_empty() {
            return match passages.first() {
                Some(first) => self.truncate(first, remaining),
                None => String::new(),
            };
        }

        if kept.len() < passages.len() {
            tracing::debug!(
                "Context trimmed to {} of {} passages to fit {} tokens",
                kept.len(),
                passages.len(),
                self.context_window
            );
        }
        kept.join("\n\n")
    }

    fn truncate(&self, text: &str, limit: usize) -> String {
        let mut tokens = self.bpe.encode_with_special_tokens(text);
        tokens.truncate(limit);
        // A cut through a multi-byte character does not decode; back off.
        while !tokens.is_empty() {
            if let Ok(decoded) = self.bpe.decode(tokens.clone()) {
                return decoded;
            }
            tokens.pop();
        }
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_contains_grounding_instruction() {
        let prompt = build_prompt("Coconut seedlings need NPK.", "What fertilizer?", "en");
        assert!(prompt.contains("Digital Krishi Officer"));
        assert!(prompt.contains("based ONLY on the provided context"));
        assert!(prompt.contains(REFUSAL));
        assert!(prompt.contains("Context: Coconut seedlings need NPK."));
        assert!(prompt.contains("Question: What fertilizer?"));
        assert!(prompt.trim_end().ends_with("Answer in en:"));
    }

    #[test]
    fn test_fit_context_keeps_everything_that_fits() {
        let budget = TokenBudget::new(4096, 256).unwrap();
        let passages = vec!["first passage".to_string(), "second passage".to_string()];
        let context = budget.fit_context(&passages, "question", "en");
        assert_eq!(context, "first passage\n\nsecond passage");
    }

    #[test]
    fn test_fit_context_drops_lower_ranked_passages() {
        let budget = TokenBudget::new(600, 100).unwrap();
        let small = "Coconut palms like sandy loam.".to_string();
        let large = "fertilizer ".repeat(800);
        let context = budget.fit_context(&[small.clone(), large], "question", "en");
        assert_eq!(context, small);
    }

    #[test]
    fn test_fit_context_truncates_oversized_best_passage() {
        let budget = TokenBudget::new(400, 100).unwrap();
        let large = "manure ".repeat(1000);
        let context = budget.fit_context(&[large.clone()], "question", "en");
        assert!(!context.is_empty());
        assert!(large.starts_with(&context));
        let skeleton = budget.count(&build_prompt("", "question", "en"));
        assert!(budget.count(&context) <= 400 - 100 - skeleton);
    }

    #[test]
    fn test_fit_context_with_no_room_is_empty() {
        let budget = TokenBudget::new(100, 100).unwrap();
        let context = budget.fit_context(&["anything".to_string()], "question", "en");
        assert!(context.is_empty());
    }
}
