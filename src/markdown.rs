// ============================================================================
// File: src/markdown.rs
// Markdown export functionality
// ============================================================================

use anyhow::Result;
use chrono::Local;
use std::fs;
use std::path::Path;

use crate::conversation::ConversationSession;
use crate::models::{Role, Source};
use crate::parser::{parse_answer, ParsedNode};
use crate::session::SearchTurn;

/// What gets exported
pub enum Transcript<'a> {
    Search(&'a [SearchTurn]),
    Chat(&'a ConversationSession),
}

pub struct MarkdownExporter<'a> {
    transcript: Transcript<'a>,
}

impl<'a> MarkdownExporter<'a> {
    pub fn new(transcript: Transcript<'a>) -> Self {
        Self { transcript }
    }

    pub fn export(&self, path: &Path) -> Result<()> {
        fs::write(path, self.render())?;
        Ok(())
    }

    pub fn render(&self) -> String {
        let mut content = String::new();

        match &self.transcript {
            Transcript::Search(turns) => {
                let title = turns.first().map_or("", |t| t.query.as_str());
                self.write_header(&mut content, "Search", title);
                self.write_search_thread(&mut content, turns);
            }
            Transcript::Chat(session) => {
                self.write_header(&mut content, "Chat", &session.title);
                self.write_chat(&mut content, session);
            }
        }

        content
    }

    fn write_header(&self, content: &mut String, kind: &str, title: &str) {
        content.push_str(&format!("# {}: {}\n\n", kind, title));
        content.push_str(&format!(
            "**Date**: {}\n\n",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        ));
    }

    fn write_search_thread(&self, content: &mut String, turns: &[SearchTurn]) {
        for (i, turn) in turns.iter().enumerate() {
            let heading = if i == 0 { "Question" } else { "Follow-up" };
            content.push_str(&format!("## {}: {}\n\n", heading, turn.query));
            write_answer(content, &turn.result.answer, &turn.result.sources);
            write_sources(content, &turn.result.sources);
            content.push_str("---\n\n");
        }
    }

    fn write_chat(&self, content: &mut String, session: &ConversationSession) {
        for message in &session.messages {
            let speaker = match message.role {
                Role::User => "You",
                Role::Assistant => "Assistant",
            };
            content.push_str(&format!(
                "### {} ({})\n\n",
                speaker,
                message.timestamp.with_timezone(&Local).format("%H:%M")
            ));
            write_answer(content, &message.content, &message.sources);
            write_sources(content, &message.sources);
        }
    }
}

fn write_answer(content: &mut String, answer: &str, sources: &[Source]) {
    let nodes = parse_answer(answer, sources);
    for node in &nodes {
        write_node(content, node);
    }
    content.push_str("\n\n");
}

fn write_node(content: &mut String, node: &ParsedNode<'_>) {
    match node {
        ParsedNode::Citation { number, source, .. } => {
            content.push_str(&format!("[[{}]]({})", number, link_target(&source.url)));
        }
        ParsedNode::Bold(children) => {
            content.push_str("**");
            for child in children {
                write_node(content, child);
            }
            content.push_str("**");
        }
        other => other.write_source(content),
    }
}

fn write_sources(content: &mut String, sources: &[Source]) {
    if sources.is_empty() {
        return;
    }
    content.push_str("**Sources**\n\n");
    for (i, source) in sources.iter().enumerate() {
        content.push_str(&format!(
            "{}. [{}]({})",
            i + 1,
            link_text(&source.title),
            link_target(&source.url)
        ));
        if !source.domain.is_empty() {
            content.push_str(&format!(" ({})", source.domain));
        }
        content.push('\n');
    }
    content.push('\n');
}

/// Escape characters that would end or nest link text
fn link_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '[' | ']') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Angle-bracket destination so spaces and parentheses stay inside the link
fn link_target(url: &str) -> String {
    format!("<{}>", url.replace('<', "%3C").replace('>', "%3E"))
}
