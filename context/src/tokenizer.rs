//! Model-specific tokenization via tiktoken.
//!
//! Newlines are normalized to spaces before encoding. The replacement is
//! byte-for-byte (`\n` and ` ` are both one byte), so a decoded token prefix
//! has the same byte length as the matching prefix of the original text. The
//! truncator relies on this to cut the original text, newlines intact.

use std::sync::Arc;

use tiktoken_rs::{CoreBPE, cl100k_base, get_bpe_from_model};

/// Encoding used when the model name is not recognized.
pub const FALLBACK_ENCODING: &str = "cl100k_base";

#[derive(Debug, thiserror::Error)]
#[error("failed to load {encoding} encoding: {message}")]
pub struct TokenizerError {
    encoding: &'static str,
    message: String,
}

/// Text <-> token mapping for one model.
///
/// Cloning is cheap; the BPE tables are shared.
#[derive(Clone)]
pub struct Tokenizer {
    bpe: Arc<CoreBPE>,
    model: String,
    fallback: bool,
}

impl std::fmt::Debug for Tokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tokenizer")
            .field("model", &self.model)
            .field("fallback", &self.fallback)
            .finish_non_exhaustive()
    }
}

impl Tokenizer {
    /// Resolve the encoding for `model`.
    ///
    /// An unknown model logs a warning and uses [`FALLBACK_ENCODING`]. The
    /// choice is deterministic, but counts for the unknown model may differ
    /// from its real tokenizer.
    pub fn for_model(model: &str) -> Result<Self, TokenizerError> {
        let (bpe, fallback) = match get_bpe_from_model(model) {
            Ok(bpe) => (bpe.clone(), false),
            Err(_) => {
                tracing::warn!(
                    model,
                    encoding = FALLBACK_ENCODING,
                    "Model not found, using fallback encoding"
                );
                let bpe = cl100k_base().map_err(|e| TokenizerError {
                    encoding: FALLBACK_ENCODING,
                    message: e.to_string(),
                })?;
                (bpe, true)
            }
        };

        Ok(Self {
            bpe: Arc::new(bpe),
            model: model.to_string(),
            fallback,
        })
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// True when the model was unknown and [`FALLBACK_ENCODING`] is in use.
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.fallback
    }

    #[must_use]
    pub fn encode(&self, text: &str) -> Vec<u32> {
        if text.contains('\n') {
            self.bpe.encode_ordinary(&text.replace('\n', " "))
        } else {
            self.bpe.encode_ordinary(text)
        }
    }

    #[must_use]
    pub fn count(&self, text: &str) -> usize {
        self.encode(text).len()
    }

    /// Raw bytes of `tokens`, or `None` if a token id is not in the vocabulary.
    #[must_use]
    pub fn decode_bytes(&self, tokens: &[u32]) -> Option<Vec<u8>> {
        self.bpe.decode_bytes(tokens).ok()
    }

    /// Decode, rejecting sequences that start or end inside a code point.
    #[must_use]
    pub fn decode_bytes_safe(&self, tokens: &[u32]) -> Option<String> {
        self.decode_bytes(tokens)
            .and_then(|bytes| String::from_utf8(bytes).ok())
    }

    /// Decode, replacing partial code points with U+FFFD.
    #[must_use]
    pub fn decode(&self, tokens: &[u32]) -> String {
        self.decode_bytes(tokens)
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .unwrap_or_default()
    }
}
