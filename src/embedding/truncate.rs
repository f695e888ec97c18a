//! Input-length safety for embedding calls.
//!
//! Embedding backends reject over-long inputs after the request is already
//! paid for, so the budget is enforced client-side. When a tokenizer file is
//! configured the cut is exact; otherwise a conservative character estimate
//! is used.

use std::borrow::Cow;
use std::path::Path;

use tokenizers::Tokenizer;

/// Assumed characters per token when no tokenizer is available.
const CHARS_PER_TOKEN: usize = 4;

pub struct TokenBudget {
    max_tokens: usize,
    tokenizer: Option<Tokenizer>,
}

impl TokenBudget {
    pub fn new(max_tokens: usize, tokenizer_path: Option<&Path>) -> Self {
        let tokenizer = tokenizer_path.and_then(|path| match Tokenizer::from_file(path) {
            Ok(tokenizer) => Some(tokenizer),
            Err(err) => {
                tracing::warn!(
                    "failed to load tokenizer {}: {}; using character-count truncation",
                    path.display(),
                    err
                );
                None
            }
        });

        Self {
            max_tokens,
            tokenizer,
        }
    }

    /// Cut `text` down to the token budget. The result is always a prefix
    /// of the input; short inputs are returned unchanged.
    pub fn clamp<'a>(&self, text: &'a str) -> Cow<'a, str> {
        if let Some(tokenizer) = &self.tokenizer {
            match self.clamp_tokenized(tokenizer, text) {
                Ok(clamped) => return clamped,
                Err(err) => {
                    tracing::warn!(
                        "tokenizer truncation failed: {}; using character-count truncation",
                        err
                    );
                }
            }
        }

        self.clamp_chars(text)
    }

    fn clamp_tokenized<'a>(
        &self,
        tokenizer: &Tokenizer,
        text: &'a str,
    ) -> Result<Cow<'a, str>, tokenizers::Error> {
        let encoding = tokenizer.encode(text, false)?;
        let ids = encoding.get_ids();
        if ids.len() <= self.max_tokens {
            return Ok(Cow::Borrowed(text));
        }

        let truncated = tokenizer.decode(&ids[..self.max_tokens], true)?;
        tracing::warn!(
            "embedding input truncated from {} to {} tokens",
            ids.len(),
            self.max_tokens
        );
        Ok(Cow::Owned(truncated))
    }

    fn clamp_chars<'a>(&self, text: &'a str) -> Cow<'a, str> {
        let max_chars = self.max_tokens * CHARS_PER_TOKEN;
        if text.chars().count() <= max_chars {
            return Cow::Borrowed(text);
        }

        tracing::warn!("embedding input truncated to {} characters", max_chars);
        Cow::Owned(text.chars().take(max_chars).collect())
    }
}
