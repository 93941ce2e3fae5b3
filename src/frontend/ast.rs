//! Annotated syntax tree documents.
//!
//! The mining pipeline dumps every source file as an XML tree whose elements
//! optionally carry an `ID` and a `LineNr`/`EndLineNr`/`ColNr`/`EndColNr`
//! span. We copy that tree into an owned arena once and index it by `ID`, so
//! a match can look up each of its nodes directly.
use std::collections::HashMap;
use std::path::Path;
use crate::error::{Error, Result};

///////////////////////////////////////////////////////////////////////////////
// SPANS
///////////////////////////////////////////////////////////////////////////////

/// 1-based lines and columns, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub line: usize,
    pub end_line: usize,
    pub column: usize,
    pub end_column: usize,
}

impl Span {
    pub fn is_multi_line(&self) -> bool {
        self.end_line > self.line
    }
    /// Same arithmetic as the mining tool: `EndColNr - ColNr`.
    pub fn width(&self) -> isize {
        self.end_column as isize - self.column as isize
    }
}

/// Span attributes as written in the document. Only parsed on demand, since
/// most nodes of a file are never looked at.
#[derive(Debug, Clone, Default)]
struct RawSpan {
    line: Option<String>,
    end_line: Option<String>,
    column: Option<String>,
    end_column: Option<String>,
}

///////////////////////////////////////////////////////////////////////////////
// NODES
///////////////////////////////////////////////////////////////////////////////

/// A DOM child of an element.
#[derive(Debug, Clone)]
enum Child {
    Element(usize),
    Text(String),
    Comment(String),
    Other,
}

#[derive(Debug, Clone)]
pub struct AstNode {
    pub name: String,
    pub id: Option<u32>,
    raw_span: RawSpan,
    /// Every child of the element, text and comment nodes included.
    children: Vec<Child>,
}

impl AstNode {
    pub fn child_count(&self) -> usize {
        self.children.len()
    }
    pub fn span(&self) -> Result<Span> {
        let field = |value: &Option<String>, attribute: &'static str| -> Result<usize> {
            let value = value.as_ref().ok_or_else(|| Error::MissingAttribute {
                element: self.name.clone(),
                attribute,
            })?;
            value.trim().parse::<usize>().map_err(|_| Error::InvalidAttribute {
                element: self.name.clone(),
                attribute,
                value: value.clone(),
            })
        };
        Ok(Span {
            line: field(&self.raw_span.line, "LineNr")?,
            end_line: field(&self.raw_span.end_line, "EndLineNr")?,
            column: field(&self.raw_span.column, "ColNr")?,
            end_column: field(&self.raw_span.end_column, "EndColNr")?,
        })
    }
}

///////////////////////////////////////////////////////////////////////////////
// DOCUMENT
///////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone)]
pub struct AnnotatedAst {
    nodes: Vec<AstNode>,
    index: HashMap<u32, usize>,
}

impl AnnotatedAst {
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        AnnotatedAst::parse(&source).map_err(|source| Error::Xml {
            path: path.to_owned(),
            source,
        })
    }
    pub fn parse(source: &str) -> std::result::Result<Self, roxmltree::Error> {
        let doc = roxmltree::Document::parse(source)?;
        let mut ast = AnnotatedAst {
            nodes: Vec::new(),
            index: HashMap::new(),
        };
        ast.push(doc.root_element());
        Ok(ast)
    }
    /// Copies `node` and its element descendants into the arena, pre-order,
    /// returning the index of `node`.
    fn push(&mut self, node: roxmltree::Node) -> usize {
        let ix = self.nodes.len();
        let id = match node.attribute("ID") {
            Some(value) => match value.trim().parse::<u32>() {
                Ok(id) => Some(id),
                Err(_) => {
                    tracing::warn!(element = node.tag_name().name(), value, "ignoring non-numeric ID");
                    None
                }
            },
            None => None,
        };
        let attr = |name: &str| node.attribute(name).map(str::to_owned);
        self.nodes.push(AstNode {
            name: node.tag_name().name().to_owned(),
            id,
            raw_span: RawSpan {
                line: attr("LineNr"),
                end_line: attr("EndLineNr"),
                column: attr("ColNr"),
                end_column: attr("EndColNr"),
            },
            children: Vec::new(),
        });
        if let Some(id) = id {
            // First depth-first occurrence wins.
            self.index.entry(id).or_insert(ix);
        }
        let children: Vec<Child> = node
            .children()
            .map(|child| match child.node_type() {
                roxmltree::NodeType::Element => Child::Element(self.push(child)),
                roxmltree::NodeType::Text => Child::Text(child.text().unwrap_or_default().to_owned()),
                roxmltree::NodeType::Comment => Child::Comment(child.text().unwrap_or_default().to_owned()),
                _ => Child::Other,
            })
            .collect();
        self.nodes[ix].children = children;
        ix
    }
    pub fn root(&self) -> &AstNode {
        &self.nodes[0]
    }
    pub fn get(&self, id: u32) -> Option<&AstNode> {
        self.index.get(&id).map(|ix| &self.nodes[*ix])
    }
    /// Element children of `node`.
    pub fn children<'a>(&'a self, node: &'a AstNode) -> impl Iterator<Item = &'a AstNode> + 'a {
        node.children.iter().filter_map(move |child| match child {
            Child::Element(ix) => Some(&self.nodes[*ix]),
            _ => None,
        })
    }
    /// Concatenated text of every descendant text node.
    pub fn text_content(&self, node: &AstNode) -> String {
        let mut text = String::new();
        self.collect_text(node, &mut text);
        text
    }
    fn collect_text(&self, node: &AstNode, text: &mut String) {
        for child in &node.children {
            match child {
                Child::Element(ix) => self.collect_text(&self.nodes[*ix], text),
                Child::Text(x) => text.push_str(x),
                Child::Comment(_) | Child::Other => {}
            }
        }
    }
    /// Text content of each DOM child of `node`, in order. A comment child
    /// yields its own text, as in the DOM.
    pub fn child_texts<'a>(&'a self, node: &'a AstNode) -> impl Iterator<Item = String> + 'a {
        node.children.iter().map(move |child| match child {
            Child::Element(ix) => self.text_content(&self.nodes[*ix]),
            Child::Text(x) | Child::Comment(x) => x.clone(),
            Child::Other => String::new(),
        })
    }
    pub fn len(&self) -> usize {
        self.nodes.len()
    }
}
