use crate::Tokenizer;

/// Placed between consecutive rewritten chunks.
pub const CHUNK_SEPARATOR: &str = "\n";

/// Before/after sizes of one shortened document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShortenStats {
    pub original_chars: usize,
    pub final_chars: usize,
    pub original_tokens: usize,
    pub final_tokens: usize,
}

fn ratio(after: usize, before: usize) -> f64 {
    if before == 0 {
        0.0
    } else {
        after as f64 / before as f64
    }
}

impl ShortenStats {
    /// `final_chars / original_chars`, 0 for empty input.
    #[must_use]
    pub fn char_ratio(&self) -> f64 {
        ratio(self.final_chars, self.original_chars)
    }

    #[must_use]
    pub fn token_ratio(&self) -> f64 {
        ratio(self.final_tokens, self.original_tokens)
    }
}

/// A shortened document: its chunks in window order and the joined text.
#[derive(Debug, Clone, PartialEq)]
pub struct ShortenResult {
    chunks: Vec<String>,
    text: String,
    stats: ShortenStats,
}

impl ShortenResult {
    #[must_use]
    pub fn chunks(&self) -> &[String] {
        &self.chunks
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub const fn stats(&self) -> ShortenStats {
        self.stats
    }

    #[must_use]
    pub fn into_text(self) -> String {
        self.text
    }

    pub(crate) fn with_stats(self, stats: ShortenStats) -> Self {
        Self { stats, ..self }
    }
}

/// Join `chunks` and measure the result against `original`.
///
/// Chunk contents are not modified. Each side is counted with one encode.
#[must_use]
pub fn assemble(tokenizer: &Tokenizer, original: &str, chunks: Vec<String>) -> ShortenResult {
    let text = chunks.join(CHUNK_SEPARATOR);
    let stats = ShortenStats {
        original_chars: original.chars().count(),
        final_chars: text.chars().count(),
        original_tokens: tokenizer.count(original),
        final_tokens: tokenizer.count(&text),
    };

    tracing::info!(
        original_chars = stats.original_chars,
        final_chars = stats.final_chars,
        char_percent = format_args!("{:.2}", stats.char_ratio() * 100.0),
        original_tokens = stats.original_tokens,
        final_tokens = stats.final_tokens,
        token_percent = format_args!("{:.2}", stats.token_ratio() * 100.0),
        "Shortened text result"
    );

    ShortenResult {
        chunks,
        text,
        stats,
    }
}
