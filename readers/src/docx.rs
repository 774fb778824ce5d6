//! Word `.docx`: paragraphs of `word/document.xml` inside the zip archive.

use std::io::Read;
use std::path::Path;

use crate::markup::parse_xml;
use crate::{DocumentFormat, ReadError};

const DOCUMENT_XML: &str = "word/document.xml";
const WORDML: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

pub(crate) fn read(path: &Path) -> Result<String, ReadError> {
    let file = std::fs::File::open(path).map_err(|e| ReadError::io(path, e))?;
    let mut archive =
        zip::ZipArchive::new(file).map_err(|e| ReadError::parse(path, DocumentFormat::Docx, e))?;
    let mut entry = archive
        .by_name(DOCUMENT_XML)
        .map_err(|e| ReadError::parse(path, DocumentFormat::Docx, format!("{DOCUMENT_XML}: {e}")))?;

    let mut xml = String::new();
    entry
        .read_to_string(&mut xml)
        .map_err(|e| ReadError::parse(path, DocumentFormat::Docx, format!("{DOCUMENT_XML}: {e}")))?;

    document_xml_to_text(&xml)
        .map_err(|e| ReadError::parse(path, DocumentFormat::Docx, format!("{DOCUMENT_XML}: {e}")))
}

/// Text runs (`w:t`) grouped by paragraph (`w:p`), one paragraph per line.
fn document_xml_to_text(xml: &str) -> Result<String, roxmltree::Error> {
    let document = parse_xml(xml)?;
    let mut paragraphs: Vec<String> = Vec::new();

    for node in document.descendants() {
        if node.is_element() && node.tag_name().namespace() == Some(WORDML) {
            match node.tag_name().name() {
                "p" => paragraphs.push(String::new()),
                "tab" => push_run(&mut paragraphs, "\t"),
                "br" | "cr" => push_run(&mut paragraphs, "\n"),
                _ => {}
            }
        } else if node.is_text() {
            let in_run = node.parent_element().is_some_and(|parent| {
                parent.tag_name().namespace() == Some(WORDML) && parent.tag_name().name() == "t"
            });
            if in_run {
                push_run(&mut paragraphs, node.text().unwrap_or_default());
            }
        }
    }

    Ok(paragraphs.join("\n"))
}

fn push_run(paragraphs: &mut Vec<String>, run: &str) {
    match paragraphs.last_mut() {
        Some(paragraph) => paragraph.push_str(run),
        None => paragraphs.push(run.to_string()),
    }
}
