//! HTML pages of the viewer.
use itertools::Itertools;

///////////////////////////////////////////////////////////////////////////////
// FILE NAMES
///////////////////////////////////////////////////////////////////////////////

pub static PATTERNS_FILE: &'static str = "patterns.html";
pub static INDEX_FILE: &'static str = "index.html";

pub fn pattern_matches_file(pattern_id: usize, label: &str) -> String {
    format!("pattern_{}_matches_{}.html", pattern_id, label)
}

pub fn match_file(pattern_id: usize, match_ix: usize, label: &str) -> String {
    format!("patternID_{}_matchID_{}_{}.html", pattern_id, match_ix, label)
}

///////////////////////////////////////////////////////////////////////////////
// HTML
///////////////////////////////////////////////////////////////////////////////

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            ch => out.push(ch),
        }
    }
    out
}

#[derive(Debug, Clone)]
pub struct Element {
    pub name: &'static str,
    /// Rendered in order, so pages are byte-for-byte reproducible.
    pub attributes: Vec<(&'static str, String)>,
    pub children: Vec<Node>,
}

#[derive(Debug, Clone)]
pub enum Node {
    Element(Element),
    Text(String),
    /// Already rendered markup, e.g. highlighted source.
    Raw(String),
    Fragment(Vec<Node>),
}

impl Node {
    pub fn element(name: &'static str, children: Vec<Node>) -> Self {
        Node::Element(Element {name, attributes: Vec::new(), children})
    }
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }
    pub fn with_attribute(self, key: &'static str, value: impl Into<String>) -> Self {
        match self {
            Node::Element(mut element) => {
                element.attributes.push((key, value.into()));
                Node::Element(element)
            }
            node => node,
        }
    }
    pub fn render_to(&self, out: &mut String) {
        match self {
            Node::Element(Element {name, attributes, children}) => {
                out.push('<');
                out.push_str(name);
                for (key, value) in attributes {
                    out.push_str(&format!(" {}=\"{}\"", key, escape(value)));
                }
                out.push('>');
                for child in children {
                    child.render_to(out);
                }
                out.push_str(&format!("</{}>", name));
            }
            Node::Text(text) => out.push_str(&escape(text)),
            Node::Raw(html) => out.push_str(html),
            Node::Fragment(nodes) => {
                for node in nodes {
                    node.render_to(out);
                }
            }
        }
    }
    pub fn to_html_string(&self) -> String {
        let mut out = String::new();
        self.render_to(&mut out);
        out
    }
}

pub fn link(href: &str, target: &str, text: impl Into<String>) -> Node {
    Node::element("a", vec![Node::text(text)])
        .with_attribute("href", href)
        .with_attribute("target", target)
}

///////////////////////////////////////////////////////////////////////////////
// DOCUMENT
///////////////////////////////////////////////////////////////////////////////

static STYLESHEET: &'static str = "\
body { font-family: sans-serif; font-size: 14px; }
pre { margin: 0; font-family: monospace; }
mark { background-color: #fff3a8; }
.var { color: #d01010; font-weight: bold; }
.dum { color: #e07000; font-style: italic; }
.key { color: #1030c0; }
.com { color: #208020; }
";

#[derive(Debug, Clone)]
pub struct Document {
    pub title: String,
    pub body: Vec<Node>,
}

impl Document {
    pub fn new(title: impl Into<String>, body: Vec<Node>) -> Self {
        Document {title: title.into(), body}
    }
    pub fn render_to_string(&self) -> String {
        let body = self.body.iter().map(Node::to_html_string).join("\n");
        format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n<style>\n{css}</style>\n</head>\n<body>\n{body}\n</body>\n</html>\n",
            title = escape(&self.title),
            css = STYLESHEET,
            body = body,
        )
    }
}

///////////////////////////////////////////////////////////////////////////////
// PAGES
///////////////////////////////////////////////////////////////////////////////

fn heading(text: String) -> Node {
    Node::element("p", vec![Node::element("h3", vec![Node::text(text)])])
}

/// Root listing of every pattern.
pub fn patterns_page(results_name: &str, links: Vec<Node>) -> Document {
    let mut body = vec![heading(format!("List patterns: {}", results_name))];
    body.extend(links);
    Document::new("Patterns", body)
}

pub fn one_class_pattern_link(pattern_id: usize, label: &str) -> Node {
    Node::element("p", vec![link(
        &pattern_matches_file(pattern_id, label),
        "center",
        format!("[{}]- pattern {}", pattern_id, pattern_id),
    )])
}

pub fn two_class_pattern_link(pattern_id: usize, old: usize, new: usize) -> Node {
    Node::element("p", vec![
        Node::text(format!("pattern-{}: ( ", pattern_id)),
        link(&pattern_matches_file(pattern_id, "old"), "center", format!("{} matches old", old)),
        Node::text(" / "),
        link(&pattern_matches_file(pattern_id, "new"), "center", format!("{} matches new", new)),
        Node::text(" )"),
    ])
}

/// Listing of the matches of one pattern in one corpus.
pub fn matches_page(pattern_id: usize, links: Vec<Node>) -> Document {
    let mut body = vec![heading(format!("Matches of pattern-{}", pattern_id))];
    body.extend(links);
    Document::new(format!("Pattern {}", pattern_id), body)
}

pub fn match_link(file: &str, match_ix: usize, full_name: &str) -> Node {
    Node::element("p", vec![link(file, "right", format!("[{}]-{}", match_ix, full_name))])
}

/// Highlighted source of one match; `highlighted` is rendered markup.
pub fn source_page(source_path: &str, highlighted: String) -> Document {
    Document::new(source_path, vec![
        Node::text(format!("Source code: {}", source_path)),
        Node::element("code", vec![Node::Raw(format!("\n{}", highlighted))]),
    ])
}

/// Three-frame entry page: patterns, matches of a pattern, match source.
pub fn index_page() -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>Patterns</title>\n</head>\n\
<frameset cols=\"18%,22%,60%\">\n\
<frame src=\"{}\" name=\"left\">\n\
<frame src=\"about:blank\" name=\"center\">\n\
<frame src=\"about:blank\" name=\"right\">\n\
</frameset>\n</html>\n",
        PATTERNS_FILE
    )
}
