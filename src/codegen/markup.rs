//! Source-to-HTML highlighting of a single match.
//!
//! Markup is spliced into the raw line with two private-use characters in
//! place of `<` and `>`, so column arithmetic keeps counting characters of
//! the original text. The pair is picked per line among characters the line
//! does not contain. [`materialize`] escapes the source text and turns the
//! delimiters into real tags once a line is done.
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::iter::FromIterator;
use std::ops::Range;
use lazy_static::lazy_static;
use crate::backend::markers::{LineMarkerIndex, LineMarkers, MarkerKind, SpanMarker};
use crate::codegen::html::escape;
use crate::error::{Error, Result};

///////////////////////////////////////////////////////////////////////////////
// TAGS
///////////////////////////////////////////////////////////////////////////////

/// Stand-ins for `<` and `>` while a line is being marked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delimiters {
    open: char,
    close: char,
}

impl Delimiters {
    /// The first two private-use characters absent from `line`.
    pub fn for_line(line: &str) -> Option<Self> {
        let mut free = ('\u{E000}'..='\u{F8FF}').filter(|x| !line.contains(*x));
        Some(Delimiters {
            open: free.next()?,
            close: free.next()?,
        })
    }
}

pub const VARIABLE_CLASS: &'static str = "var";
pub const DUMMY_CLASS: &'static str = "dum";
pub const KEYWORD_CLASS: &'static str = "key";
pub const COMMENT_CLASS: &'static str = "com";

/// Characters one color tag adds around the text it wraps. Every class name
/// has the same length.
pub const ADDED_CHARACTERS: usize =
    "<span class=\"\">".len() + VARIABLE_CLASS.len() + "</span>".len();

pub static KEYWORD_LIST: &'static [&'static str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await",
    "break", "class", "continue", "def", "del", "elif", "else", "except",
    "finally", "for", "from", "global", "if", "import", "in", "is",
    "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try",
    "while", "with", "yield",
];

lazy_static! {
    pub static ref KEYWORDS: HashSet<&'static str> = {
        HashSet::from_iter(
            KEYWORD_LIST.to_vec()
        )
    };
}

fn class_of(kind: MarkerKind) -> &'static str {
    match kind {
        MarkerKind::Variable => VARIABLE_CLASS,
        MarkerKind::Dummy => DUMMY_CLASS,
    }
}

fn color_tag(d: Delimiters, class: &str, text: &str) -> String {
    format!("{o}span class=\"{class}\"{c}{text}{o}/span{c}", o = d.open, c = d.close, class = class, text = text)
}

/// Byte offset of the `column`-th character (0-based); the line length is a
/// valid column.
fn byte_offset(line: &str, column: usize) -> Option<usize> {
    line.char_indices()
        .map(|(ix, _)| ix)
        .chain(std::iter::once(line.len()))
        .nth(column)
}

/// Wraps the characters of columns `start..=end` (1-based) in a color tag.
fn splice(d: Delimiters, line: &str, start: usize, end: usize, class: &str) -> Result<String> {
    let error = || Error::Markup {line: line.to_owned(), start, end};
    if start == 0 || start > end {
        return Err(error());
    }
    let from = byte_offset(line, start - 1).ok_or_else(error)?;
    let to = byte_offset(line, end).ok_or_else(error)?;
    Ok(format!("{}{}{}", &line[..from], color_tag(d, class, &line[from..to]), &line[to..]))
}

/// Turns delimited markup into HTML, escaping everything else.
pub fn materialize(d: Delimiters, line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut text = String::new();
    let mut in_tag = false;
    for ch in line.chars() {
        match ch {
            ch if ch == d.open => {
                out.push_str(&escape(&text));
                text.clear();
                in_tag = true;
                out.push('<');
            }
            ch if ch == d.close => {
                in_tag = false;
                out.push('>');
            }
            ch if in_tag => out.push(ch),
            ch => text.push(ch),
        }
    }
    out.push_str(&escape(&text));
    out
}

///////////////////////////////////////////////////////////////////////////////
// VARIABLES
///////////////////////////////////////////////////////////////////////////////

/// Drops spans that overlap an earlier one, so no text is wrapped twice.
fn without_overlaps(spans: &BTreeSet<SpanMarker>) -> VecDeque<SpanMarker> {
    let mut kept: VecDeque<SpanMarker> = VecDeque::new();
    for span in spans {
        match kept.iter().find(|x| x.overlaps(span)) {
            Some(other) => {
                tracing::debug!(?span, ?other, "dropping overlapping marker");
            }
            None => kept.push_back(span.clone()),
        }
    }
    kept
}

/// Splices every queued marker into `line`. After each splice, markers that
/// start right of the spliced one move by [`ADDED_CHARACTERS`]; markers on
/// its left keep their columns. Any processing order gives the same result.
pub fn apply_markers(d: Delimiters, line: &str, mut queue: VecDeque<SpanMarker>) -> Result<String> {
    let mut line = line.to_owned();
    while let Some(marker) = queue.pop_front() {
        line = splice(d, &line, marker.start, marker.end, class_of(marker.kind))?;
        for other in queue.iter_mut().filter(|x| x.start > marker.start) {
            other.start += ADDED_CHARACTERS;
            other.end += ADDED_CHARACTERS;
        }
    }
    Ok(line)
}

pub fn mark_variables(d: Delimiters, line: &str, spans: &BTreeSet<SpanMarker>) -> Result<String> {
    apply_markers(d, line, without_overlaps(spans))
}

///////////////////////////////////////////////////////////////////////////////
// KEYWORDS
///////////////////////////////////////////////////////////////////////////////

/// Byte ranges covered by spliced elements, from the opening tag through
/// the closing one.
fn marked_ranges(d: Delimiters, line: &str) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut closing = false;
    let mut chars = line.char_indices().peekable();
    while let Some((ix, ch)) = chars.next() {
        match ch {
            ch if ch == d.open => {
                closing = chars.peek().map(|(_, x)| *x == '/').unwrap_or(false);
                if !closing {
                    if depth == 0 {
                        start = ix;
                    }
                    depth += 1;
                }
            }
            ch if ch == d.close && closing => {
                closing = false;
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    ranges.push(start..ix + ch.len_utf8());
                }
            }
            _ => {}
        }
    }
    ranges
}

/// First occurrence of `token` that lies outside existing markup.
fn find_unmarked(d: Delimiters, line: &str, token: &str) -> Option<usize> {
    let marked = marked_ranges(d, line);
    line.match_indices(token)
        .map(|(ix, _)| ix)
        .find(|ix| {
            let end = ix + token.len();
            !marked.iter().any(|range| *ix < range.end && range.start < end)
        })
}

/// Naive keyword highlighting: the line is split on single spaces and each
/// token that is a keyword once trimmed gets its first unmarked occurrence
/// in the current line wrapped. The occurrence may sit inside a longer word.
pub fn mark_keywords(d: Delimiters, line: &str) -> String {
    let mut out = line.to_owned();
    for token in line.split(' ').filter(|x| !x.is_empty()) {
        if !KEYWORDS.contains(token.trim()) {
            continue;
        }
        if let Some(ix) = find_unmarked(d, &out, token) {
            out = format!(
                "{}{}{}",
                &out[..ix],
                color_tag(d, KEYWORD_CLASS, token),
                &out[ix + token.len()..]
            );
        }
    }
    out
}

///////////////////////////////////////////////////////////////////////////////
// LINES
///////////////////////////////////////////////////////////////////////////////

pub fn render_line(line: &str, markers: Option<&LineMarkers>) -> String {
    let markers = match markers {
        None => return format!("<pre>{}</pre>\n", escape(line)),
        Some(markers) => markers,
    };
    if markers.is_whole_line() {
        return format!(
            "<pre><mark><span class=\"{}\">{}</span></mark></pre>\n",
            COMMENT_CLASS,
            escape(line)
        );
    }
    let d = match Delimiters::for_line(line) {
        Some(d) => d,
        None => {
            tracing::warn!(line, "no free delimiters, falling back to the unmarked line");
            return format!("<pre><mark>{}</mark></pre>\n", escape(line));
        }
    };
    let marked = match mark_variables(d, line, markers.spans()) {
        Ok(marked) => marked,
        Err(error) => {
            tracing::warn!(%error, markers = ?markers.spans(), "falling back to the unmarked line");
            line.to_owned()
        }
    };
    let marked = mark_keywords(d, &marked);
    format!("<pre><mark>{}</mark></pre>\n", materialize(d, &marked))
}

/// Renders every source line, highlighting the ones in `index`.
pub fn render(lines: &[String], index: &LineMarkerIndex) -> String {
    lines
        .iter()
        .enumerate()
        .map(|(ix, line)| render_line(line, index.get(ix + 1)))
        .collect()
}
