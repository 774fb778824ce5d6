//! Markdown rendered to its visible text.

use pulldown_cmark::{Event, Options, Parser, TagEnd};

use crate::markup::html_to_text;
use crate::tidy_lines;

pub(crate) fn markdown_to_text(source: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let mut out = String::with_capacity(source.len());
    for event in Parser::new_ext(source, options) {
        match event {
            Event::Text(text) | Event::Code(text) => out.push_str(&text),
            // Embedded HTML keeps its text, not its tags.
            Event::Html(html) | Event::InlineHtml(html) => out.push_str(&html_to_text(&html)),
            Event::SoftBreak | Event::HardBreak => out.push('\n'),
            Event::End(
                TagEnd::Paragraph
                | TagEnd::Heading(_)
                | TagEnd::Item
                | TagEnd::CodeBlock
                | TagEnd::TableHead
                | TagEnd::TableRow
                | TagEnd::BlockQuote(_),
            ) => out.push('\n'),
            Event::End(TagEnd::TableCell) => out.push('\t'),
            _ => {}
        }
    }

    tidy_lines(&out)
}
