//! Pattern and match records.
use std::path::Path;
use crate::error::{Error, Result};

pub static PATTERN_TAG: &'static str = "subtree";
pub static MATCH_TAG: &'static str = "match";
pub static SUPPORT_SEPARATOR: char = '-';

///////////////////////////////////////////////////////////////////////////////
// PATTERNS
///////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    /// 1-based position in the patterns document.
    pub id: usize,
    /// Raw `Support` attribute, if any.
    pub support: Option<String>,
}

impl Pattern {
    /// Old and new corpus support of a two-class pattern (`"5-3"`).
    pub fn class_support(&self) -> Result<(usize, usize)> {
        let invalid = || Error::InvalidAttribute {
            element: PATTERN_TAG.to_owned(),
            attribute: "Support",
            value: self.support.clone().unwrap_or_default(),
        };
        let support = self.support.as_ref().ok_or_else(|| Error::MissingAttribute {
            element: PATTERN_TAG.to_owned(),
            attribute: "Support",
        })?;
        let (old, new) = support.split_once(SUPPORT_SEPARATOR).ok_or_else(invalid)?;
        let old = old.trim().parse::<usize>().map_err(|_| invalid())?;
        let new = new.trim().parse::<usize>().map_err(|_| invalid())?;
        Ok((old, new))
    }
}

///////////////////////////////////////////////////////////////////////////////
// MATCHES
///////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub pattern_id: usize,
    pub full_name: String,
    /// Source file as recorded by the miner.
    pub file_name: String,
    /// IDs of the matched AST nodes, in document order.
    pub node_ids: Vec<u32>,
}

/// Matches of `pattern_id`, in document order.
pub fn matches_of<'a>(matches: &'a [Match], pattern_id: usize) -> impl Iterator<Item = &'a Match> + 'a {
    matches.iter().filter(move |x| x.pattern_id == pattern_id)
}

///////////////////////////////////////////////////////////////////////////////
// READERS
///////////////////////////////////////////////////////////////////////////////

fn read_xml(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| Error::io(path, e))
}

fn parse_xml<'a>(path: &Path, source: &'a str) -> Result<roxmltree::Document<'a>> {
    roxmltree::Document::parse(source).map_err(|source| Error::Xml {
        path: path.to_owned(),
        source,
    })
}

pub fn parse_patterns(path: &Path, source: &str) -> Result<Vec<Pattern>> {
    let doc = parse_xml(path, source)?;
    let patterns = doc
        .descendants()
        .filter(|x| x.has_tag_name(PATTERN_TAG))
        .enumerate()
        .map(|(ix, node)| Pattern {
            id: ix + 1,
            support: node.attribute("Support").map(str::to_owned),
        })
        .collect();
    Ok(patterns)
}

pub fn read_patterns(path: &Path) -> Result<Vec<Pattern>> {
    parse_patterns(path, &read_xml(path)?)
}

fn parse_match<'a, 'input>(node: roxmltree::Node<'a, 'input>) -> Result<Match> {
    let attribute = |attribute: &'static str| -> Result<&'a str> {
        node.attribute(attribute).ok_or_else(|| Error::MissingAttribute {
            element: MATCH_TAG.to_owned(),
            attribute,
        })
    };
    let pattern_id = attribute("PatternID")?;
    let pattern_id = pattern_id.trim().parse::<usize>().map_err(|_| Error::InvalidAttribute {
        element: MATCH_TAG.to_owned(),
        attribute: "PatternID",
        value: pattern_id.to_owned(),
    })?;
    let node_ids = node
        .children()
        .filter(|x| x.is_element())
        .filter_map(|child| {
            let id = child.attribute("ID").and_then(|x| x.trim().parse::<u32>().ok());
            if id.is_none() {
                tracing::warn!(
                    pattern_id,
                    element = child.tag_name().name(),
                    "match node without a numeric ID"
                );
            }
            id
        })
        .collect();
    Ok(Match {
        pattern_id,
        full_name: attribute("FullName")?.to_owned(),
        file_name: attribute("FileName")?.to_owned(),
        node_ids,
    })
}

/// Malformed `match` elements are logged and skipped.
pub fn parse_matches(path: &Path, source: &str) -> Result<Vec<Match>> {
    let doc = parse_xml(path, source)?;
    let matches = doc
        .descendants()
        .filter(|x| x.has_tag_name(MATCH_TAG))
        .filter_map(|node| match parse_match(node) {
            Ok(x) => Some(x),
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "skipping match");
                None
            }
        })
        .collect();
    Ok(matches)
}

pub fn read_matches(path: &Path) -> Result<Vec<Match>> {
    parse_matches(path, &read_xml(path)?)
}
