//! Maps the AST nodes of a match to the source lines and columns they cover.
use std::collections::HashSet;
use crate::backend::markers::{LineMarkerIndex, Marker, SpanMarker};
use crate::error::Result;
use crate::frontend::ast::{AnnotatedAst, AstNode, Span};
use crate::frontend::data::Match;

/// Everything needed to locate one match. Built fresh for every match.
pub struct MatchContext<'a> {
    ast: &'a AnnotatedAst,
    lines: &'a [String],
    /// IDs of the match's direct children.
    matched: HashSet<u32>,
    index: LineMarkerIndex,
}

/// What a matched node turns into.
#[derive(Debug, Clone, PartialEq)]
enum Located {
    /// Highlight every line of the range.
    Lines(usize, usize),
    Variable(Span, String),
    Dummy(Span, String),
    /// Structural nodes (modules, function roots, ...) highlight nothing.
    Nothing,
}

impl<'a> MatchContext<'a> {
    pub fn new(node_ids: &[u32], ast: &'a AnnotatedAst, lines: &'a [String]) -> Self {
        MatchContext {
            ast,
            lines,
            matched: node_ids.iter().copied().collect(),
            index: LineMarkerIndex::new(),
        }
    }

    pub fn is_matched(&self, id: u32) -> bool {
        self.matched.contains(&id)
    }

    /// A compound node is a dummy match when one of its children is not part
    /// of the match. Children without an ID are not considered.
    pub fn is_dummy(&self, node: &AstNode) -> bool {
        self.ast
            .children(node)
            .filter_map(|child| child.id)
            .any(|id| !self.is_matched(id))
    }

    /// First non-blank text among the node's grandchildren, e.g. the name of
    /// a function definition.
    pub fn dummy_text(&self, node: &AstNode) -> Option<String> {
        self.ast
            .children(node)
            .flat_map(|child| self.ast.child_texts(child))
            .map(|text| text.trim().to_owned())
            .find(|text| !text.is_empty())
    }

    fn classify(&self, node: &AstNode) -> Result<Located> {
        let span = node.span()?;
        let is_leaf = node.child_count() == 1;
        if span.is_multi_line() && is_leaf {
            return Ok(Located::Lines(span.line, span.end_line));
        }
        if is_leaf {
            let text = self.ast.text_content(node).trim().to_owned();
            return Ok(Located::Variable(span, text));
        }
        if !self.is_dummy(node) {
            return Ok(Located::Nothing);
        }
        let located = match self.dummy_text(node) {
            Some(_) if span.is_multi_line() => Located::Lines(span.line, span.end_line),
            Some(text) => Located::Dummy(span, text),
            None => Located::Nothing,
        };
        Ok(located)
    }

    /// Locates the node with the given ID and records its markers.
    pub fn locate_node(&mut self, id: u32) {
        let ast = self.ast;
        let node = match ast.get(id) {
            Some(node) => node,
            None => {
                tracing::debug!(id, "matched node not found in the annotated AST");
                return;
            }
        };
        match self.classify(node) {
            Ok(Located::Lines(first, last)) => self.mark_lines(id, first, last),
            Ok(Located::Variable(span, text)) => {
                self.mark_span(id, span, SpanMarker::variable(span.column, span.end_column, text))
            }
            Ok(Located::Dummy(span, text)) => {
                self.mark_span(id, span, SpanMarker::dummy(span.column, span.end_column, text))
            }
            Ok(Located::Nothing) => {}
            Err(error) => {
                tracing::warn!(id, element = %node.name, %error, "cannot locate matched node");
            }
        }
    }

    fn mark_lines(&mut self, id: u32, first: usize, last: usize) {
        let last = if last > self.lines.len() {
            tracing::warn!(id, last, lines = self.lines.len(), "node ends past the end of the source");
            self.lines.len()
        } else {
            last
        };
        if first == 0 || first > last {
            tracing::warn!(id, first, last, "node starts outside the source");
            return;
        }
        self.index.insert_lines(first, last);
    }

    fn mark_span(&mut self, id: u32, span: Span, marker: SpanMarker) {
        let lines = self.lines;
        let line = match span.line.checked_sub(1).and_then(|ix| lines.get(ix)) {
            Some(line) => line,
            None => {
                tracing::warn!(id, line = span.line, "node line is outside the source");
                return;
            }
        };
        let length = line.chars().count();
        if marker.start == 0 || marker.start > marker.end || marker.end > length {
            tracing::warn!(
                id,
                line = span.line,
                start = marker.start,
                end = marker.end,
                length,
                "node columns are outside the line"
            );
            return;
        }
        // A node covering the whole trimmed line is a full-line comment. The
        // miner counts it as one column shorter than its text.
        let trimmed = line.trim().chars().count();
        if span.width() == trimmed as isize - 1 {
            self.index.insert(span.line, Marker::WholeLine);
        } else {
            self.index.insert(span.line, Marker::Span(marker));
        }
    }

    pub fn into_index(self) -> LineMarkerIndex {
        self.index
    }
}

/// Computes the line markers of `m` against the annotated AST and the source
/// lines of its file.
pub fn locate(m: &Match, ast: &AnnotatedAst, lines: &[String]) -> LineMarkerIndex {
    let mut cx = MatchContext::new(&m.node_ids, ast, lines);
    for id in &m.node_ids {
        cx.locate_node(*id);
    }
    cx.into_index()
}
