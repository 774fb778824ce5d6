//! HTML and XML text extraction.

use scraper::{Html, Node};

use crate::tidy_lines;

/// Elements whose text is never document content.
const SKIPPED: &[&str] = &["script", "style", "noscript", "template"];

/// Elements that start a new line of text.
const BLOCKS: &[&str] = &[
    "p", "div", "br", "li", "tr", "h1", "h2", "h3", "h4", "h5", "h6", "title", "section",
    "article", "blockquote", "pre", "table", "ul", "ol",
];

fn name_in(node: &Node, names: &[&str]) -> bool {
    node.as_element().is_some_and(|el| names.contains(&el.name()))
}

pub(crate) fn html_to_text(source: &str) -> String {
    let document = Html::parse_document(source);
    let mut raw = String::new();

    for node in document.tree.root().descendants() {
        match node.value() {
            Node::Text(text) => {
                if !node.ancestors().any(|a| name_in(a.value(), SKIPPED)) {
                    raw.push_str(text);
                }
            }
            Node::Element(el) if BLOCKS.contains(&el.name()) => raw.push('\n'),
            _ => {}
        }
    }

    tidy_lines(&raw)
}

/// Every text node in document order, markup stripped. CDATA sections count
/// as text.
pub(crate) fn xml_to_text(source: &str) -> Result<String, roxmltree::Error> {
    let document = parse_xml(source)?;
    let raw: String = document
        .descendants()
        .filter(roxmltree::Node::is_text)
        .filter_map(|node| node.text())
        .collect();
    Ok(tidy_lines(&raw))
}

/// XML parsing shared with the DOCX reader. Internal DTDs are accepted.
pub(crate) fn parse_xml(source: &str) -> Result<roxmltree::Document<'_>, roxmltree::Error> {
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    };
    roxmltree::Document::parse_with_options(source, options)
}
