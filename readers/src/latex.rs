//! LaTeX source reduced to its prose.
//!
//! Comments, command names, optional arguments and math delimiters go; the
//! text inside brace groups stays. A few commands whose arguments are never
//! prose (labels, citations, preamble) are dropped together with them.

use crate::tidy_lines;

const DROP_WITH_ARGUMENT: &[&str] = &[
    "label",
    "ref",
    "eqref",
    "cite",
    "citep",
    "citet",
    "usepackage",
    "documentclass",
    "begin",
    "end",
    "includegraphics",
    "bibliography",
    "bibliographystyle",
];

pub(crate) fn latex_to_text(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '%' => {
                // Drop to end of line, keeping the newline.
                while chars.next_if(|&c| c != '\n').is_some() {}
            }
            '\\' => match chars.peek().copied() {
                Some('\\') => {
                    chars.next();
                    out.push('\n');
                }
                Some(escaped) if !escaped.is_ascii_alphabetic() => {
                    chars.next();
                    out.push(match escaped {
                        '~' | ',' | ';' | ' ' => ' ',
                        other => other,
                    });
                }
                Some(_) => {
                    let mut name = String::new();
                    while let Some(c) = chars.next_if(char::is_ascii_alphabetic) {
                        name.push(c);
                    }
                    chars.next_if_eq(&'*');
                    skip_optional_arguments(&mut chars);
                    if DROP_WITH_ARGUMENT.contains(&name.as_str()) {
                        skip_group(&mut chars);
                        skip_optional_arguments(&mut chars);
                    }
                }
                None => {}
            },
            '{' | '}' | '$' => {}
            '~' => out.push(' '),
            other => out.push(other),
        }
    }

    let collapsed: String = out
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\n");
    tidy_lines(&collapsed)
}

fn skip_optional_arguments(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) {
    while chars.next_if_eq(&'[').is_some() {
        let mut depth = 1usize;
        for c in chars.by_ref() {
            match c {
                '[' => depth += 1,
                ']' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
        }
    }
}

/// Skip one `{...}` group, nested braces included.
fn skip_group(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) {
    if chars.next_if_eq(&'{').is_none() {
        return;
    }
    let mut depth = 1usize;
    for c in chars.by_ref() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return;
                }
            }
            _ => {}
        }
    }
}
