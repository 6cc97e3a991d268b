// ABOUTME: Splits agent replies into prose and fenced Mermaid diagram segments
// ABOUTME: Pure function over the reply text, no I/O and no shared state besides the cached regex
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MaaS Workflow Creator contributors

//! Reply parser
//!
//! A diagram block opens with the literal ```` ```mermaid ```` immediately
//! followed by a line break and closes at the next ```` ``` ````. Every
//! block in the reply is extracted in document order. Text between blocks
//! is kept verbatim; diagram sources are trimmed. An opening marker without
//! a closing one is left in the text.

use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use tracing::error;

/// Opening fence including the mandatory line break
pub const DIAGRAM_OPEN: &str = "```mermaid";
/// Closing fence
pub const DIAGRAM_CLOSE: &str = "```";

static DIAGRAM_FENCE: OnceLock<Option<Regex>> = OnceLock::new();

fn diagram_fence() -> Option<&'static Regex> {
    DIAGRAM_FENCE
        .get_or_init(|| match Regex::new(r"(?s)```mermaid\r?\n(.*?)```") {
            Ok(regex) => Some(regex),
            Err(e) => {
                error!("Failed to compile diagram fence pattern: {e}");
                None
            }
        })
        .as_ref()
}

/// One piece of a parsed reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Segment {
    /// Prose, a verbatim slice of the reply
    Text {
        /// The slice
        content: String,
        /// Byte range within the reply
        span: Range<usize>,
    },
    /// Diagram source with surrounding whitespace trimmed
    Diagram {
        /// Mermaid source
        source: String,
        /// Byte range of the whole fenced block, fences included
        span: Range<usize>,
    },
}

impl Segment {
    /// Byte range within the reply
    #[must_use]
    pub const fn span(&self) -> &Range<usize> {
        match self {
            Self::Text { span, .. } | Self::Diagram { span, .. } => span,
        }
    }
}

/// A reply split into ordered segments
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedReply {
    /// Segments in document order
    pub segments: Vec<Segment>,
}

impl ParsedReply {
    /// Diagram sources in document order
    pub fn diagrams(&self) -> impl Iterator<Item = &str> + '_ {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Diagram { source, .. } => Some(source.as_str()),
            Segment::Text { .. } => None,
        })
    }

    /// Number of diagram blocks
    #[must_use]
    pub fn diagram_count(&self) -> usize {
        self.diagrams().count()
    }

    /// First diagram source, for callers that only render one
    #[must_use]
    pub fn first_diagram(&self) -> Option<&str> {
        self.diagrams().next()
    }

    /// Span of the n-th diagram block
    #[must_use]
    pub fn diagram_span(&self, index: usize) -> Option<Range<usize>> {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Diagram { .. }))
            .nth(index)
            .map(|s| s.span().clone())
    }

    /// All text segments concatenated, fences removed
    #[must_use]
    pub fn text_without_diagrams(&self) -> String {
        self.segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Text { content, .. } => Some(content.as_str()),
                Segment::Diagram { .. } => None,
            })
            .collect()
    }

    /// Prose with every fenced block stripped, trimmed
    #[must_use]
    pub fn prose(&self) -> String {
        self.text_without_diagrams().trim().to_owned()
    }

    /// Rebuild a reply from the segments, re-fencing every diagram
    ///
    /// Equal to the original reply except for whitespace inside fences.
    #[must_use]
    pub fn reassemble(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text { content, .. } => out.push_str(content),
                Segment::Diagram { source, .. } => out.push_str(&fence(source)),
            }
        }
        out
    }
}

/// Wrap a diagram source in fences
#[must_use]
pub fn fence(source: &str) -> String {
    format!("{DIAGRAM_OPEN}\n{source}\n{DIAGRAM_CLOSE}")
}

/// Split an agent reply into text and diagram segments
#[must_use]
pub fn parse_reply(reply: &str) -> ParsedReply {
    let Some(regex) = diagram_fence() else {
        return ParsedReply {
            segments: text_segment(reply, 0..reply.len()).into_iter().collect(),
        };
    };

    let mut segments = Vec::new();
    let mut cursor = 0;

    for captures in regex.captures_iter(reply) {
        let (Some(whole), Some(inner)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        segments.extend(text_segment(reply, cursor..whole.start()));
        segments.push(Segment::Diagram {
            source: inner.as_str().trim().to_owned(),
            span: whole.range(),
        });
        cursor = whole.end();
    }
    segments.extend(text_segment(reply, cursor..reply.len()));

    ParsedReply { segments }
}

fn text_segment(reply: &str, span: Range<usize>) -> Option<Segment> {
    let content = reply.get(span.clone())?;
    if content.is_empty() {
        return None;
    }
    Some(Segment::Text {
        content: content.to_owned(),
        span,
    })
}
