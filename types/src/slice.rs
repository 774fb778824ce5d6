//! Text fragments paired with their token length.

/// A decoded text fragment and its token count under one tokenizer.
///
/// Invariant: `token_count` is what the producing tokenizer reports for
/// `text`. Slices are immutable once built; only the tokenizer layer
/// constructs them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextSlice {
    text: String,
    token_count: usize,
}

impl TextSlice {
    #[must_use]
    pub fn new(text: impl Into<String>, token_count: usize) -> Self {
        Self {
            text: text.into(),
            token_count,
        }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub const fn token_count(&self) -> usize {
        self.token_count
    }

    #[must_use]
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    #[must_use]
    pub fn into_text(self) -> String {
        self.text
    }
}

/// One unit of chunked work: the slice to rewrite plus a look-ahead view.
///
/// `next` is a view into text that later windows cover; it is never extra
/// content. Concatenating every window's `current` in order yields the
/// source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    current: TextSlice,
    next: TextSlice,
}

impl Window {
    #[must_use]
    pub fn new(current: TextSlice, next: TextSlice) -> Self {
        Self { current, next }
    }

    #[must_use]
    pub fn current(&self) -> &TextSlice {
        &self.current
    }

    #[must_use]
    pub fn next(&self) -> &TextSlice {
        &self.next
    }
}
