//! Markdown to XML section conversion
//!
//! Headings `##` through `######` open sections; each becomes one child of
//! the root element with its content wrapped in CDATA. Text before the first
//! heading becomes a `preamble` section.

use std::collections::HashSet;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::models::Diagnostic;

pub const DEFAULT_ROOT: &str = "ruleset";
pub const PREAMBLE_TAG: &str = "preamble";
pub const BODY_TAG: &str = "body";

/// XML emission settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlOptions {
    /// Root element name, normalized like section tags
    pub root: String,
    /// Emit `<?xml version="1.0" encoding="UTF-8"?>`
    pub declaration: bool,
}

impl Default for XmlOptions {
    fn default() -> Self {
        Self {
            root: DEFAULT_ROOT.to_string(),
            declaration: true,
        }
    }
}

/// Converted document plus findings about tag names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlConversion {
    pub contents: String,
    pub diagnostics: Vec<Diagnostic>,
}

struct RawSection<'a> {
    heading: Option<String>,
    lines: Vec<&'a str>,
}

/// Convert rendered Markdown into XML sections
pub fn markdown_to_xml(markdown: &str, options: &XmlOptions) -> XmlConversion {
    let mut diagnostics = Vec::new();
    let mut sections = vec![RawSection {
        heading: None,
        lines: Vec::new(),
    }];
    let mut fence: Option<char> = None;

    for line in markdown.lines() {
        if let Some(marker) = fence_marker(line) {
            match fence {
                None => fence = Some(marker),
                Some(open) if open == marker => fence = None,
                Some(_) => {}
            }
        } else if fence.is_none() {
            if let Some(text) = parse_heading(line) {
                sections.push(RawSection {
                    heading: Some(text.to_string()),
                    lines: Vec::new(),
                });
                continue;
            }
        }
        if let Some(current) = sections.last_mut() {
            current.lines.push(line);
        }
    }

    let mut elements: Vec<(String, String)> = Vec::new();
    if sections.len() == 1 {
        elements.push((BODY_TAG.to_string(), markdown.trim().to_string()));
    } else {
        let mut used = HashSet::new();
        for (index, section) in sections.into_iter().enumerate() {
            let content = trim_blank_lines(&section.lines);
            let tag = match &section.heading {
                None if content.is_empty() => continue,
                None => PREAMBLE_TAG.to_string(),
                Some(heading) => section_tag(heading, index, &mut diagnostics),
            };
            let tag = dedupe_tag(tag, section.heading.as_deref(), &mut used, &mut diagnostics);
            elements.push((tag, content));
        }
    }

    let root = match derive_tag(&options.root) {
        tag if is_valid_tag(&tag) => tag,
        _ => DEFAULT_ROOT.to_string(),
    };

    let mut out = String::new();
    if options.declaration {
        out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    }
    out.push_str(&format!("<{root}>\n"));
    for (tag, content) in &elements {
        if content.is_empty() {
            out.push_str(&format!("  <{tag}></{tag}>\n"));
        } else {
            out.push_str(&format!("  <{tag}>{}</{tag}>\n", cdata(content)));
        }
    }
    out.push_str(&format!("</{root}>\n"));

    XmlConversion {
        contents: out,
        diagnostics,
    }
}

/// Heading text for `##`..`######` lines; `#` titles are plain content
fn parse_heading(line: &str) -> Option<&str> {
    let indent = line.len() - line.trim_start_matches(' ').len();
    if indent > 3 {
        return None;
    }
    let rest = &line[indent..];
    let level = rest.len() - rest.trim_start_matches('#').len();
    if !(2..=6).contains(&level) {
        return None;
    }
    let rest = &rest[level..];
    if !(rest.is_empty() || rest.starts_with([' ', '\t'])) {
        return None;
    }

    let text = rest.trim();
    // Optional closing sequence: `## Title ##`
    let without_closing = text.trim_end_matches('#');
    let text = if without_closing.len() < text.len()
        && (without_closing.is_empty() || without_closing.ends_with([' ', '\t']))
    {
        without_closing.trim_end()
    } else {
        text
    };
    Some(text)
}

fn fence_marker(line: &str) -> Option<char> {
    let trimmed = line.trim_start();
    if trimmed.starts_with("```") {
        Some('`')
    } else if trimmed.starts_with("~~~") {
        Some('~')
    } else {
        None
    }
}

fn trim_blank_lines(lines: &[&str]) -> String {
    let start = lines.iter().position(|l| !l.trim().is_empty());
    let end = lines.iter().rposition(|l| !l.trim().is_empty());
    match (start, end) {
        (Some(start), Some(end)) => lines[start..=end].join("\n"),
        _ => String::new(),
    }
}

/// Normalize heading text into a tag candidate
///
/// Lowercases, strips diacritics, collapses runs of anything but ASCII
/// letters and digits into `_` and trims edge underscores. The result may be
/// empty or start with a digit.
pub fn derive_tag(text: &str) -> String {
    let mut tag = String::with_capacity(text.len());
    let mut pending_underscore = false;
    for c in text.to_lowercase().nfd().filter(|c| !is_combining_mark(*c)) {
        if c.is_ascii_alphanumeric() {
            if pending_underscore && !tag.is_empty() {
                tag.push('_');
            }
            pending_underscore = false;
            tag.push(c.to_ascii_lowercase());
        } else {
            pending_underscore = true;
        }
    }
    tag
}

/// A tag must start with a lowercase ASCII letter or `_`
pub fn is_valid_tag(tag: &str) -> bool {
    tag.chars()
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_')
}

fn section_tag(heading: &str, index: usize, diagnostics: &mut Vec<Diagnostic>) -> String {
    let base = derive_tag(heading);
    if is_valid_tag(&base) {
        return base;
    }
    let fallback = if base.is_empty() {
        format!("section_{index}")
    } else {
        format!("section_{index}_{base}")
    };
    diagnostics.push(
        Diagnostic::info(format!(
            "Heading \"{heading}\" does not produce a valid XML tag; using <{fallback}>"
        ))
        .with_tags(["renderer", "xml"]),
    );
    fallback
}

fn dedupe_tag(
    base: String,
    heading: Option<&str>,
    used: &mut HashSet<String>,
    diagnostics: &mut Vec<Diagnostic>,
) -> String {
    if used.insert(base.clone()) {
        return base;
    }
    let mut suffix = 2;
    let tag = loop {
        let candidate = format!("{base}_{suffix}");
        if used.insert(candidate.clone()) {
            break candidate;
        }
        suffix += 1;
    };
    diagnostics.push(
        Diagnostic::warning(format!(
            "Duplicate heading \"{}\" renamed to <{tag}>",
            heading.unwrap_or(&base)
        ))
        .with_tags(["renderer", "xml"]),
    );
    tag
}

/// Wrap text in CDATA, splitting any `]]>` across adjacent runs
pub fn cdata(text: &str) -> String {
    format!("<![CDATA[{}]]>", text.replace("]]>", "]]]]><![CDATA[>"))
}
