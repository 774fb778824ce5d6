//! Token-count truncation that never splits a code point.
//!
//! A token boundary can fall inside a multi-byte character. Rather than
//! decode lossily, the cut point backs off until the kept tokens decode to
//! valid UTF-8. When no boundary exists at or below the requested count (one
//! character spans more tokens than requested), the cut grows past the
//! request to the first complete character, so a non-zero request on
//! non-empty text always yields non-empty text.
//!
//! Reported counts are re-encoded counts of the returned text, which can
//! differ from the requested count in both directions.

use shorten_types::TextSlice;

use crate::Tokenizer;

/// Which end of the text is cut away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TruncateFrom {
    /// Keep a prefix.
    Back,
    /// Keep a suffix.
    Front,
}

/// Truncate `text` to about `token_count` tokens.
///
/// `None` keeps the whole text. The returned slice is always a substring of
/// `text` taken at a character boundary.
#[must_use]
pub fn truncate_by_token_count(
    tokenizer: &Tokenizer,
    text: &str,
    token_count: Option<usize>,
    from: TruncateFrom,
) -> TextSlice {
    let tokens = tokenizer.encode(text);
    let requested = token_count.map_or(tokens.len(), |n| n.min(tokens.len()));

    if requested == tokens.len() {
        return TextSlice::new(text, tokens.len());
    }
    if requested == 0 {
        return TextSlice::empty();
    }

    let kept = match from {
        TruncateFrom::Back => text.get(..prefix_len(tokenizer, &tokens, requested)),
        TruncateFrom::Front => text.get(text.len() - suffix_len(tokenizer, &tokens, requested)..),
    };

    match kept {
        Some(kept) => TextSlice::new(kept, tokenizer.count(kept)),
        None => {
            // Unreachable for text produced by the same tokenizer.
            tracing::warn!(requested, "Token boundary did not map onto the text");
            let window = match from {
                TruncateFrom::Back => &tokens[..requested],
                TruncateFrom::Front => &tokens[tokens.len() - requested..],
            };
            let decoded = tokenizer.decode(window);
            let count = tokenizer.count(&decoded);
            TextSlice::new(decoded, count)
        }
    }
}

/// Truncate an arbitrary token sequence.
///
/// Same back-off as [`truncate_by_token_count`], but the sequence need not
/// come from valid text. When no cut decodes cleanly the requested window is
/// decoded lossily.
#[must_use]
pub fn truncate_tokens(
    tokenizer: &Tokenizer,
    tokens: &[u32],
    token_count: Option<usize>,
    from: TruncateFrom,
) -> TextSlice {
    let requested = token_count.map_or(tokens.len(), |n| n.min(tokens.len()));
    if requested == 0 {
        return TextSlice::empty();
    }

    let total = tokens.len();
    let found = match from {
        TruncateFrom::Back => (1..=requested)
            .rev()
            .chain(requested + 1..=total)
            .find_map(|k| tokenizer.decode_bytes_safe(&tokens[..k])),
        TruncateFrom::Front => {
            let start = total - requested;
            (start..total)
                .chain((0..start).rev())
                .find_map(|s| tokenizer.decode_bytes_safe(&tokens[s..]))
        }
    };

    let text = found.unwrap_or_else(|| match from {
        TruncateFrom::Back => tokenizer.decode(&tokens[..requested]),
        TruncateFrom::Front => tokenizer.decode(&tokens[total - requested..]),
    });
    let count = tokenizer.count(&text);
    TextSlice::new(text, count)
}

/// Byte length of the longest clean prefix of at most `requested` tokens,
/// or of the shortest clean prefix above it.
fn prefix_len(tokenizer: &Tokenizer, tokens: &[u32], requested: usize) -> usize {
    (1..=requested)
        .rev()
        .chain(requested + 1..tokens.len())
        .find_map(|k| clean_len(tokenizer, &tokens[..k]))
        .unwrap_or_else(|| byte_len(tokenizer, tokens))
}

/// Byte length of the longest clean suffix of at most `requested` tokens,
/// or of the shortest clean suffix above it.
fn suffix_len(tokenizer: &Tokenizer, tokens: &[u32], requested: usize) -> usize {
    let start = tokens.len() - requested;
    (start..tokens.len())
        .chain((1..start).rev())
        .find_map(|s| clean_len(tokenizer, &tokens[s..]))
        .unwrap_or_else(|| byte_len(tokenizer, tokens))
}

fn clean_len(tokenizer: &Tokenizer, tokens: &[u32]) -> Option<usize> {
    let bytes = tokenizer.decode_bytes(tokens)?;
    std::str::from_utf8(&bytes).ok().map(str::len)
}

fn byte_len(tokenizer: &Tokenizer, tokens: &[u32]) -> usize {
    tokenizer.decode_bytes(tokens).map_or(0, |bytes| bytes.len())
}
