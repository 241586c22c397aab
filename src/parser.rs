// ============================================================================
// File: src/parser.rs
// Answer text to renderable nodes
// ============================================================================
//
// Two phases. Fenced code blocks are cut out first; the prose between them is
// then parsed by an ordered list of inline rules. Each rule splits the text it
// receives and hands the gaps to the next rule, so precedence is exactly the
// order of `INLINE_PRECEDENCE`: citation markers, then inline code, then bold.
// Anything no rule matches is emitted verbatim as text, so parsing is total.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::citation::{self, Citation};
use crate::models::Source;

static FENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)```(.*?)```").unwrap());
static CITATION_MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[([0-9]+)\]").unwrap());
static INLINE_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([^`]+)`").unwrap());
static BOLD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*([^*]+)\*\*").unwrap());

/// One piece of a parsed answer. Borrows from the answer text and source list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedNode<'a> {
    Text(&'a str),
    Citation {
        number: usize,
        source: &'a Source,
        marker: &'a str,
    },
    InlineCode(&'a str),
    Bold(Vec<ParsedNode<'a>>),
    CodeBlock {
        language: Option<&'a str>,
        code: &'a str,
        fence: &'a str,
    },
}

impl ParsedNode<'_> {
    /// Append the text this node was parsed from
    pub fn write_source(&self, out: &mut String) {
        match self {
            ParsedNode::Text(text) => out.push_str(text),
            ParsedNode::Citation { marker, .. } => out.push_str(marker),
            ParsedNode::InlineCode(code) => {
                out.push('`');
                out.push_str(code);
                out.push('`');
            }
            ParsedNode::Bold(children) => {
                out.push_str("**");
                for child in children {
                    child.write_source(out);
                }
                out.push_str("**");
            }
            ParsedNode::CodeBlock { fence, .. } => out.push_str(fence),
        }
    }
}

/// Reassemble the original answer text from parsed nodes
#[cfg(test)]
pub fn source_text(nodes: &[ParsedNode<'_>]) -> String {
    let mut out = String::new();
    for node in nodes {
        node.write_source(&mut out);
    }
    out
}

/// Inline rules, highest precedence first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InlineRule {
    Citation,
    InlineCode,
    Bold,
}

pub const INLINE_PRECEDENCE: [InlineRule; 3] =
    [InlineRule::Citation, InlineRule::InlineCode, InlineRule::Bold];

impl InlineRule {
    fn pattern(self) -> &'static Regex {
        match self {
            InlineRule::Citation => &CITATION_MARKER,
            InlineRule::InlineCode => &INLINE_CODE,
            InlineRule::Bold => &BOLD,
        }
    }

    fn node<'a>(self, whole: &'a str, inner: &'a str, sources: &'a [Source]) -> ParsedNode<'a> {
        match self {
            InlineRule::Citation => match citation::resolve(inner, sources) {
                Citation::Resolved { number, source } => ParsedNode::Citation {
                    number,
                    source,
                    marker: whole,
                },
                Citation::OutOfRange => ParsedNode::Text(whole),
            },
            InlineRule::InlineCode => ParsedNode::InlineCode(inner),
            InlineRule::Bold => ParsedNode::Bold(vec![ParsedNode::Text(inner)]),
        }
    }
}

/// Parse an answer against its ordered source list
pub fn parse_answer<'a>(text: &'a str, sources: &'a [Source]) -> Vec<ParsedNode<'a>> {
    let mut out = Vec::new();
    let mut last = 0;

    for caps in FENCE.captures_iter(text) {
        let Some((whole, inner)) = whole_and_inner(&caps) else {
            continue;
        };
        parse_inline(&text[last..whole.start()], &INLINE_PRECEDENCE, sources, &mut out);
        out.push(code_block(whole.as_str(), inner));
        last = whole.end();
    }
    parse_inline(&text[last..], &INLINE_PRECEDENCE, sources, &mut out);

    out
}

/// Parse prose with the given rules, in order
pub fn parse_inline<'a>(
    text: &'a str,
    rules: &[InlineRule],
    sources: &'a [Source],
    out: &mut Vec<ParsedNode<'a>>,
) {
    if text.is_empty() {
        return;
    }
    let Some((rule, rest)) = rules.split_first() else {
        out.push(ParsedNode::Text(text));
        return;
    };

    let mut last = 0;
    for caps in rule.pattern().captures_iter(text) {
        let Some((whole, inner)) = whole_and_inner(&caps) else {
            continue;
        };
        parse_inline(&text[last..whole.start()], rest, sources, out);
        out.push(rule.node(whole.as_str(), inner, sources));
        last = whole.end();
    }
    parse_inline(&text[last..], rest, sources, out);
}

fn whole_and_inner<'a>(caps: &Captures<'a>) -> Option<(regex::Match<'a>, &'a str)> {
    Some((caps.get(0)?, caps.get(1)?.as_str()))
}

/// Split a fence body into its language line and code payload. Without a
/// non-empty first line the whole body is code, leading newline included.
fn code_block<'a>(fence: &'a str, content: &'a str) -> ParsedNode<'a> {
    let (language, code) = match content.split_once('\n') {
        Some((first, rest)) if !first.trim().is_empty() => (Some(first.trim()), rest),
        _ => (None, content),
    };
    ParsedNode::CodeBlock {
        language,
        code,
        fence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(title: &str, url: &str) -> Source {
        Source {
            title: title.into(),
            url: url.into(),
            snippet: String::new(),
            domain: String::new(),
            favicon: String::new(),
        }
    }

    fn two_sources() -> Vec<Source> {
        vec![source("A", "http://a"), source("B", "http://b")]
    }

    #[test]
    fn text_without_markers_round_trips() {
        let inputs = [
            "",
            "plain answer",
            "line one\n\nline two",
            "uses `Vec<T>` and **ownership**",
            "unterminated `tick and ** star",
            "a ``` dangling fence",
            "```rust\nfn main() {}\n```\nafter",
            "before ```\nno lang``` after **b** `c`",
            "brackets [a] [] [ 1] stay",
            "****",
        ];
        let sources = two_sources();
        for input in inputs {
            let nodes = parse_answer(input, &sources);
            assert_eq!(source_text(&nodes), input, "input: {:?}", input);
        }
    }

    #[test]
    fn in_range_markers_become_citations() {
        let sources = two_sources();
        let nodes = parse_answer("X [1] Y [2]", &sources);
        assert_eq!(
            nodes,
            vec![
                ParsedNode::Text("X "),
                ParsedNode::Citation { number: 1, source: &sources[0], marker: "[1]" },
                ParsedNode::Text(" Y "),
                ParsedNode::Citation { number: 2, source: &sources[1], marker: "[2]" },
            ]
        );
    }

    #[test]
    fn out_of_range_markers_stay_literal() {
        let sources = two_sources();
        let nodes = parse_answer("See [9]", &sources);
        assert_eq!(nodes, vec![ParsedNode::Text("See "), ParsedNode::Text("[9]")]);

        let nodes = parse_answer("[0]", &sources);
        assert_eq!(nodes, vec![ParsedNode::Text("[0]")]);
    }

    #[test]
    fn leading_zero_marker_resolves() {
        let sources = two_sources();
        let nodes = parse_answer("[01]", &sources);
        assert!(matches!(nodes[0], ParsedNode::Citation { number: 1, marker: "[01]", .. }));
    }

    #[test]
    fn mixed_scenario() {
        let sources = two_sources();
        let nodes = parse_answer("A says X [1]. B says Y [2]. Unverified [3].", &sources);

        let cited: Vec<_> = nodes
            .iter()
            .filter_map(|n| match n {
                ParsedNode::Citation { source, .. } => Some(source.url.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(cited, ["http://a", "http://b"]);
        assert!(nodes.contains(&ParsedNode::Text("[3]")));
        assert_eq!(source_text(&nodes), "A says X [1]. B says Y [2]. Unverified [3].");
    }

    #[test]
    fn fenced_block_with_language() {
        let nodes = parse_answer("```python\nprint(1)\n```", &[]);
        assert_eq!(
            nodes,
            vec![ParsedNode::CodeBlock {
                language: Some("python"),
                code: "print(1)\n",
                fence: "```python\nprint(1)\n```",
            }]
        );
    }

    #[test]
    fn fenced_block_without_language() {
        let nodes = parse_answer("```\nls -la\n```", &[]);
        assert!(matches!(
            nodes[0],
            ParsedNode::CodeBlock { language: None, code: "\nls -la\n", .. }
        ));

        let nodes = parse_answer("```  \nls\n```", &[]);
        assert!(matches!(
            nodes[0],
            ParsedNode::CodeBlock { language: None, code: "  \nls\n", .. }
        ));

        let nodes = parse_answer("```x = 1```", &[]);
        assert!(matches!(nodes[0], ParsedNode::CodeBlock { language: None, code: "x = 1", .. }));
    }

    #[test]
    fn code_block_payload_is_not_parsed() {
        let sources = two_sources();
        let nodes = parse_answer("```md\n**not bold** [1] `x`\n```", &sources);
        assert_eq!(nodes.len(), 1);
        assert!(matches!(
            nodes[0],
            ParsedNode::CodeBlock { code: "**not bold** [1] `x`\n", .. }
        ));
    }

    #[test]
    fn unterminated_fence_is_text() {
        let nodes = parse_answer("start ```rust\nfn x()", &[]);
        assert!(nodes.iter().all(|n| matches!(n, ParsedNode::Text(_))));
    }

    #[test]
    fn inline_code_and_bold() {
        let nodes = parse_answer("Use `cargo` with **care**.", &[]);
        assert_eq!(
            nodes,
            vec![
                ParsedNode::Text("Use "),
                ParsedNode::InlineCode("cargo"),
                ParsedNode::Text(" with "),
                ParsedNode::Bold(vec![ParsedNode::Text("care")]),
                ParsedNode::Text("."),
            ]
        );
    }

    #[test]
    fn inline_code_shields_bold() {
        let nodes = parse_answer("`**x**`", &[]);
        assert_eq!(nodes, vec![ParsedNode::InlineCode("**x**")]);
    }

    #[test]
    fn bold_is_non_greedy() {
        let nodes = parse_answer("**a** and **b**", &[]);
        assert_eq!(
            nodes,
            vec![
                ParsedNode::Bold(vec![ParsedNode::Text("a")]),
                ParsedNode::Text(" and "),
                ParsedNode::Bold(vec![ParsedNode::Text("b")]),
            ]
        );
    }

    #[test]
    fn citation_splits_before_inline_spans() {
        let sources = two_sources();
        let nodes = parse_answer("**see [1]**", &sources);
        assert_eq!(
            nodes,
            vec![
                ParsedNode::Text("**see "),
                ParsedNode::Citation { number: 1, source: &sources[0], marker: "[1]" },
                ParsedNode::Text("**"),
            ]
        );
    }

    #[test]
    fn rules_can_be_exercised_alone() {
        let mut out = Vec::new();
        parse_inline("**b** `c`", &[InlineRule::Bold], &[], &mut out);
        assert_eq!(
            out,
            vec![ParsedNode::Bold(vec![ParsedNode::Text("b")]), ParsedNode::Text(" `c`")]
        );
    }
}
