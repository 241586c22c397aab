// ============================================================================
// File: src/render.rs
// Terminal rendering of parsed answers and source lists
// ============================================================================

use colored::*;
use std::borrow::Cow;

use crate::models::Source;
use crate::parser::ParsedNode;

const CHAT_SOURCE_PREVIEW: usize = 3;

/// Render parsed nodes as terminal text
pub fn render_answer(nodes: &[ParsedNode<'_>]) -> String {
    let mut out = String::new();
    for node in nodes {
        render_node(node, &mut out, false);
    }
    out
}

fn render_node(node: &ParsedNode<'_>, out: &mut String, bold: bool) {
    match node {
        ParsedNode::Text(text) => {
            if bold {
                out.push_str(&sanitize(text).bold().to_string());
            } else {
                out.push_str(&sanitize(text));
            }
        }
        ParsedNode::Citation { number, .. } => {
            out.push_str(&format!("[{}]", number).bright_cyan().bold().to_string());
        }
        ParsedNode::InlineCode(code) => {
            out.push_str(&sanitize(code).yellow().to_string());
        }
        ParsedNode::Bold(children) => {
            for child in children {
                render_node(child, out, true);
            }
        }
        ParsedNode::CodeBlock { language, code, .. } => {
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            let header = format!("┌─ {}", sanitize(language.unwrap_or("code")));
            out.push_str(&header.bright_black().to_string());
            out.push('\n');
            for line in code.lines() {
                out.push_str("│ ");
                out.push_str(&sanitize(line).green().to_string());
                out.push('\n');
            }
            out.push_str(&"└─".bright_black().to_string());
            out.push('\n');
        }
    }
}

/// Numbered source list, numbered the same way citations are
pub fn render_sources(sources: &[Source], limit: usize) -> String {
    if sources.is_empty() {
        return String::new();
    }

    let mut out = format!("{}\n", "Sources".green().bold());
    for (i, source) in sources.iter().take(limit).enumerate() {
        out.push_str(&format!(
            "{} {}",
            format!("[{}]", i + 1).bright_cyan().bold(),
            sanitize(&source.title).bright_white()
        ));
        if !source.domain.is_empty() {
            let domain = format!("({})", sanitize(&source.domain));
            out.push_str(&format!(" {}", domain.bright_black()));
        }
        out.push('\n');
        if !source.url.is_empty() {
            out.push_str(&format!("    {}\n", sanitize(&source.url).blue().underline()));
        }
        if !source.snippet.is_empty() {
            let snippet = truncate(&sanitize(&source.snippet), 160);
            out.push_str(&format!("    {}\n", snippet.bright_black()));
        }
    }
    if sources.len() > limit {
        let more = format!("    … {} more\n", sources.len() - limit);
        out.push_str(&more.bright_black().to_string());
    }
    out
}

/// Short link list shown under an assistant chat message
pub fn render_source_preview(sources: &[Source]) -> String {
    sources
        .iter()
        .take(CHAT_SOURCE_PREVIEW)
        .map(|s| {
            let label = if s.title.is_empty() { &s.domain } else { &s.title };
            format!(
                "  {} {} {}",
                "↗".bright_black(),
                sanitize(label),
                sanitize(&s.url).blue().underline()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Replace control characters other than newline and tab with U+FFFD so
/// upstream text cannot carry terminal escape sequences
fn sanitize(text: &str) -> Cow<'_, str> {
    let unsafe_char = |c: char| c.is_control() && c != '\n' && c != '\t';
    if !text.chars().any(unsafe_char) {
        return Cow::Borrowed(text);
    }
    Cow::Owned(
        text.chars()
            .map(|c| if unsafe_char(c) { '\u{FFFD}' } else { c })
            .collect(),
    )
}

fn truncate(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}…", head)
    } else {
        head
    }
}
