//! The miner's run configuration.
//!
//! A `key = value` properties file in the results directory names the
//! pattern and matches documents and, for two-class runs, the two corpus
//! directories.
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use serde::de::value::MapDeserializer;
use serde::Deserialize;
use crate::error::{Error, Result};

pub static CONFIG_EXTENSIONS: &'static [&'static str] = &["properties", "conf"];

#[derive(Debug, Clone, Default, Deserialize)]
struct RawConfig {
    #[serde(rename = "2Class", default)]
    two_class: String,
    #[serde(rename = "outputPath", default)]
    output_path: String,
    #[serde(rename = "outputMatches", default)]
    output_matches: String,
    #[serde(rename = "outputMatches1", default)]
    output_matches1: String,
    #[serde(rename = "outputMatches2", default)]
    output_matches2: String,
    #[serde(rename = "inputFiles1", default)]
    input_files1: String,
    #[serde(rename = "inputFiles2", default)]
    input_files2: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    OneClass {
        matches: String,
    },
    TwoClass {
        old_matches: String,
        new_matches: String,
        old_inputs: String,
        new_inputs: String,
    },
}

/// File names only; directories recorded by the miner are dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub patterns: String,
    pub mode: Mode,
}

/// Last component of a path written on any platform.
pub fn last_name(path: &str) -> String {
    path.trim()
        .trim_end_matches(|c: char| c == '/' || c == '\\')
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or_default()
        .to_owned()
}

///////////////////////////////////////////////////////////////////////////////
// PROPERTIES
///////////////////////////////////////////////////////////////////////////////

/// Joins lines ending in an odd number of backslashes with the next one,
/// whose leading whitespace is dropped. Comment lines never continue.
fn logical_lines(source: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut pending: Option<String> = None;
    for line in source.lines() {
        let line = line.trim_start();
        let mut text = match pending.take() {
            Some(mut text) => {
                text.push_str(line);
                text
            }
            None if line.starts_with('#') || line.starts_with('!') => continue,
            None => line.to_owned(),
        };
        let backslashes = text.chars().rev().take_while(|c| *c == '\\').count();
        if backslashes % 2 == 1 {
            text.pop();
            pending = Some(text);
        } else {
            lines.push(text);
        }
    }
    lines.extend(pending);
    lines
}

/// Key and raw value of an entry. The key ends at the first unescaped `=`,
/// `:` or whitespace.
fn split_entry(line: &str) -> (&str, &str) {
    let mut escaped = false;
    let key_end = line
        .char_indices()
        .find(|(_, c)| {
            let separator = !escaped && (*c == '=' || *c == ':' || c.is_whitespace());
            escaped = !escaped && *c == '\\';
            separator
        })
        .map(|(ix, _)| ix)
        .unwrap_or_else(|| line.len());
    let rest = line[key_end..].trim_start();
    let rest = rest
        .strip_prefix(|c: char| c == '=' || c == ':')
        .unwrap_or(rest)
        .trim_start();
    (&line[..key_end], rest)
}

/// Resolves `\t`, `\n`, `\r`, `\f`, `\uXXXX`; any other escaped character
/// stands for itself, so `C\:\\runs` reads `C:\runs`.
fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let hex = chars.clone().take(4).collect::<String>();
                let decoded = u32::from_str_radix(&hex, 16).ok().and_then(std::char::from_u32);
                match decoded {
                    Some(decoded) if hex.len() == 4 => {
                        out.push(decoded);
                        chars.nth(3);
                    }
                    _ => out.push('u'),
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

/// Entries of a Java-style properties document.
pub fn parse_properties(source: &str) -> BTreeMap<String, String> {
    logical_lines(source)
        .iter()
        .filter(|line| !line.is_empty())
        .map(|line| {
            let (key, value) = split_entry(line);
            (unescape(key), unescape(value))
        })
        .collect()
}

impl Config {
    pub fn parse(path: &Path, source: &str) -> Result<Self> {
        let invalid = |message: String| Error::Config {path: path.to_owned(), message};
        let properties = parse_properties(source);
        let de: MapDeserializer<_, serde::de::value::Error> = MapDeserializer::new(properties.into_iter());
        let raw = RawConfig::deserialize(de).map_err(|e| invalid(e.to_string()))?;
        let required = |value: &str, key: &str| -> Result<String> {
            match last_name(value) {
                name if name.is_empty() => Err(invalid(format!("missing `{}`", key))),
                name => Ok(name),
            }
        };
        let two_class = match raw.two_class.trim().to_ascii_lowercase().as_str() {
            "true" => true,
            "false" | "" => false,
            other => return Err(invalid(format!("`2Class` must be true or false, not {:?}", other))),
        };
        let mode = if two_class {
            Mode::TwoClass {
                old_matches: required(&raw.output_matches1, "outputMatches1")?,
                new_matches: required(&raw.output_matches2, "outputMatches2")?,
                old_inputs: required(&raw.input_files1, "inputFiles1")?,
                new_inputs: required(&raw.input_files2, "inputFiles2")?,
            }
        } else {
            Mode::OneClass {
                matches: required(&raw.output_matches, "outputMatches")?,
            }
        };
        Ok(Config {
            patterns: required(&raw.output_path, "outputPath")?,
            mode,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Config::parse(path, &source)
    }

    /// The configuration file of a results directory.
    pub fn find(results_dir: &Path) -> Result<PathBuf> {
        let entries = std::fs::read_dir(results_dir).map_err(|e| Error::io(results_dir, e))?;
        let mut candidates = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| {
                path.extension()
                    .and_then(|x| x.to_str())
                    .map(|x| CONFIG_EXTENSIONS.contains(&x))
                    .unwrap_or(false)
            })
            .collect::<Vec<_>>();
        candidates.sort();
        if candidates.len() > 1 {
            tracing::warn!(?candidates, "several configuration files, using the first");
        }
        candidates
            .into_iter()
            .next()
            .ok_or_else(|| Error::MissingConfig(results_dir.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path() -> &'static Path {
        Path::new("run.properties")
    }

    #[test]
    fn last_name_drops_directories() {
        assert_eq!(last_name("out/q1_patterns.xml"), "q1_patterns.xml");
        assert_eq!(last_name("C:\\runs\\pos\\"), "pos");
        assert_eq!(last_name("plain.xml"), "plain.xml");
        assert_eq!(last_name(""), "");
    }

    #[test]
    fn properties_separators_and_comments() {
        let props = parse_properties("# c\n! c\n\n  a = 1\nb:2\nc 3\nd\ne==x\n");
        let pairs = props.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect::<Vec<_>>();
        assert_eq!(pairs, vec![("a", "1"), ("b", "2"), ("c", "3"), ("d", ""), ("e", "=x")]);
    }

    #[test]
    fn properties_escapes_are_resolved() {
        let props = parse_properties(
            "inputFiles1 = C\\:\\\\runs\\\\pos\nkey\\=with\\ space = v\nsnow = \\u2603\nbad = \\uZZ\n"
        );
        assert_eq!(props["inputFiles1"], "C:\\runs\\pos");
        assert_eq!(last_name(&props["inputFiles1"]), "pos");
        assert_eq!(props["key=with space"], "v");
        assert_eq!(props["snow"], "\u{2603}");
        assert_eq!(props["bad"], "uZZ");
    }

    #[test]
    fn properties_lines_continue() {
        let props = parse_properties("outputPath = out/\\\n    patterns.xml\n# end \\\nx = 1\n");
        assert_eq!(props["outputPath"], "out/patterns.xml");
        assert_eq!(props["x"], "1");
    }

    #[test]
    fn windows_paths_in_two_class_config() {
        let source = "2Class=true\noutputPath=C\\:\\\\runs\\\\p.xml\noutputMatches1=m1.xml\noutputMatches2=m2.xml\ninputFiles1=C\\:\\\\data\\\\pos\ninputFiles2=C\\:\\\\data\\\\neg\n";
        let config = Config::parse(path(), source).unwrap();
        assert_eq!(config.patterns, "p.xml");
        assert_eq!(config.mode, Mode::TwoClass {
            old_matches: "m1.xml".to_owned(),
            new_matches: "m2.xml".to_owned(),
            old_inputs: "pos".to_owned(),
            new_inputs: "neg".to_owned(),
        });
    }

    #[test]
    fn one_class_config() {
        let source = "# run\n2Class = false\noutputPath = out/patterns.xml\noutputMatches=out/matches.xml\nminSupport = 4\n";
        let config = Config::parse(path(), source).unwrap();
        assert_eq!(config.patterns, "patterns.xml");
        assert_eq!(config.mode, Mode::OneClass {matches: "matches.xml".to_owned()});
    }

    #[test]
    fn two_class_config() {
        let source = "2Class=TRUE\noutputPath=p.xml\noutputMatches1=m1.xml\noutputMatches2=m2.xml\ninputFiles1=data/pos\ninputFiles2=data/neg\n";
        let config = Config::parse(path(), source).unwrap();
        assert_eq!(config.mode, Mode::TwoClass {
            old_matches: "m1.xml".to_owned(),
            new_matches: "m2.xml".to_owned(),
            old_inputs: "pos".to_owned(),
            new_inputs: "neg".to_owned(),
        });
    }

    #[test]
    fn missing_keys_are_errors() {
        let error = Config::parse(path(), "2Class=true\noutputPath=p.xml\n").unwrap_err();
        assert!(error.to_string().contains("outputMatches1"));
        assert!(Config::parse(path(), "outputMatches=m.xml\n").is_err());
        assert!(Config::parse(path(), "2Class=maybe\noutputPath=p\noutputMatches=m\n").is_err());
    }

    #[test]
    fn finds_the_config_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(Config::find(dir.path()), Err(Error::MissingConfig(_))));
        std::fs::write(dir.path().join("patterns.xml"), "<a/>").unwrap();
        std::fs::write(dir.path().join("run.conf"), "outputPath=p.xml").unwrap();
        assert_eq!(Config::find(dir.path()).unwrap(), dir.path().join("run.conf"));
    }
}
