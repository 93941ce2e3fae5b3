//! Per-line highlight markers of a single match.
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MarkerKind {
    /// A matched leaf token.
    Variable,
    /// A compound node matched through one of its descendants.
    Dummy,
}

/// Columns are 1-based and inclusive, counted in characters of the
/// original line.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SpanMarker {
    pub start: usize,
    pub end: usize,
    pub kind: MarkerKind,
    pub text: String,
}

impl SpanMarker {
    pub fn new(kind: MarkerKind, start: usize, end: usize, text: impl Into<String>) -> Self {
        SpanMarker {start, end, kind, text: text.into()}
    }
    pub fn variable(start: usize, end: usize, text: impl Into<String>) -> Self {
        SpanMarker::new(MarkerKind::Variable, start, end, text)
    }
    pub fn dummy(start: usize, end: usize, text: impl Into<String>) -> Self {
        SpanMarker::new(MarkerKind::Dummy, start, end, text)
    }
    pub fn overlaps(&self, other: &SpanMarker) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker {
    /// Highlight the entire line (comments, full-line matches).
    WholeLine,
    Span(SpanMarker),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineMarkers {
    whole_line: bool,
    spans: BTreeSet<SpanMarker>,
}

impl LineMarkers {
    /// A whole-line marker wins over any span on the same line.
    pub fn is_whole_line(&self) -> bool {
        self.whole_line
    }
    pub fn spans(&self) -> &BTreeSet<SpanMarker> {
        &self.spans
    }
}

/// Source line number (1-based) to the markers on that line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineMarkerIndex {
    lines: BTreeMap<usize, LineMarkers>,
}

impl LineMarkerIndex {
    pub fn new() -> Self {
        LineMarkerIndex::default()
    }
    pub fn insert(&mut self, line: usize, marker: Marker) {
        let entry = self.lines.entry(line).or_default();
        match marker {
            Marker::WholeLine => entry.whole_line = true,
            Marker::Span(span) => {
                entry.spans.insert(span);
            }
        }
    }
    pub fn insert_lines(&mut self, first: usize, last: usize) {
        for line in first..=last {
            self.insert(line, Marker::WholeLine);
        }
    }
    pub fn get(&self, line: usize) -> Option<&LineMarkers> {
        self.lines.get(&line)
    }
    pub fn iter(&self) -> impl Iterator<Item = (usize, &LineMarkers)> {
        self.lines.iter().map(|(line, markers)| (*line, markers))
    }
    pub fn len(&self) -> usize {
        self.lines.len()
    }
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_line_markers_are_deduplicated() {
        let mut index = LineMarkerIndex::new();
        index.insert(3, Marker::WholeLine);
        index.insert(3, Marker::WholeLine);
        index.insert(3, Marker::Span(SpanMarker::variable(1, 2, "ab")));
        let line = index.get(3).unwrap();
        assert!(line.is_whole_line());
        assert_eq!(line.spans().len(), 1);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn spans_are_a_set() {
        let mut index = LineMarkerIndex::new();
        index.insert(1, Marker::Span(SpanMarker::variable(5, 7, "foo")));
        index.insert(1, Marker::Span(SpanMarker::variable(5, 7, "foo")));
        index.insert(1, Marker::Span(SpanMarker::dummy(1, 3, "bar")));
        let starts = index.get(1).unwrap().spans().iter().map(|x| x.start).collect::<Vec<_>>();
        assert_eq!(starts, vec![1, 5]);
        assert!(!index.get(1).unwrap().is_whole_line());
    }

    #[test]
    fn inserts_line_ranges() {
        let mut index = LineMarkerIndex::new();
        index.insert_lines(2, 4);
        let lines = index.iter().map(|(line, _)| line).collect::<Vec<_>>();
        assert_eq!(lines, vec![2, 3, 4]);
        assert!(index.get(1).is_none());
    }

    #[test]
    fn overlap_is_inclusive() {
        let a = SpanMarker::variable(1, 4, "abcd");
        assert!(a.overlaps(&SpanMarker::variable(4, 6, "def")));
        assert!(!a.overlaps(&SpanMarker::variable(5, 6, "ef")));
    }
}
