//! Drives locating and rendering across every pattern and match, and writes
//! the cross-linked pages.
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use crate::backend::locate::locate;
use crate::backend::markers::LineMarkerIndex;
use crate::codegen::{html, markup};
use crate::config::{last_name, Config, Mode};
use crate::error::{Error, Result};
use crate::frontend::ast::AnnotatedAst;
use crate::frontend::data::{self, matches_of, Match, Pattern};

/// Extension of the annotated-AST document next to every source file.
pub static ANNOTATED_AST_EXTENSION: &'static str = "xml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corpus {
    Old,
    New,
}

impl Corpus {
    pub fn label(self) -> &'static str {
        match self {
            Corpus::Old => "old",
            Corpus::New => "new",
        }
    }
}

/// What a run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub patterns: usize,
    pub match_pages: usize,
    pub index: PathBuf,
}

///////////////////////////////////////////////////////////////////////////////
// CORPUS
///////////////////////////////////////////////////////////////////////////////

/// Renders the matches of one corpus.
struct CorpusRenderer<'a> {
    corpus: Corpus,
    source_dir: PathBuf,
    output_dir: &'a Path,
    matches: Vec<Match>,
    /// Several matches usually share a file.
    asts: HashMap<PathBuf, Rc<AnnotatedAst>>,
}

impl<'a> CorpusRenderer<'a> {
    fn new(corpus: Corpus, source_dir: PathBuf, output_dir: &'a Path, matches: Vec<Match>) -> Self {
        CorpusRenderer {
            corpus,
            source_dir,
            output_dir,
            matches,
            asts: HashMap::new(),
        }
    }

    fn count_of(&self, pattern_id: usize) -> usize {
        matches_of(&self.matches, pattern_id).count()
    }

    /// The recorded file under the corpus directory, or failing that its
    /// bare file name.
    fn source_path(&self, m: &Match) -> PathBuf {
        let recorded = self.source_dir.join(&m.file_name);
        if recorded.is_file() {
            recorded
        } else {
            self.source_dir.join(last_name(&m.file_name))
        }
    }

    fn annotated_ast(&mut self, path: &Path) -> Result<Rc<AnnotatedAst>> {
        if let Some(ast) = self.asts.get(path) {
            return Ok(ast.clone());
        }
        let ast = Rc::new(AnnotatedAst::load(path)?);
        self.asts.insert(path.to_owned(), ast.clone());
        Ok(ast)
    }

    /// Source page of one match. Without a readable annotated AST the source
    /// is rendered without highlights.
    fn render_match(&mut self, m: &Match) -> Result<String> {
        let source_path = self.source_path(m);
        let bytes = std::fs::read(&source_path).map_err(|e| Error::io(&source_path, e))?;
        let lines = String::from_utf8_lossy(&bytes)
            .lines()
            .map(str::to_owned)
            .collect::<Vec<_>>();
        let ast_path = source_path.with_extension(ANNOTATED_AST_EXTENSION);
        let index = match self.annotated_ast(&ast_path) {
            Ok(ast) => locate(m, &ast, &lines),
            Err(error) => {
                tracing::warn!(%error, full_name = %m.full_name, "rendering match without highlights");
                LineMarkerIndex::new()
            }
        };
        tracing::debug!(
            full_name = %m.full_name,
            file = %source_path.display(),
            marked_lines = index.len(),
            "located match"
        );
        let highlighted = markup::render(&lines, &index);
        let page = html::source_page(&source_path.display().to_string(), highlighted);
        Ok(page.render_to_string())
    }

    fn write(&self, file: &str, contents: &str) -> Result<()> {
        let path = self.output_dir.join(file);
        std::fs::write(&path, contents).map_err(|e| Error::io(path, e))
    }

    /// Writes one page per match of `pattern_id` and the page listing them.
    /// A match that cannot be rendered is skipped; the rest still are.
    fn write_pattern(&mut self, pattern_id: usize) -> Result<usize> {
        let label = self.corpus.label();
        let matches = matches_of(&self.matches, pattern_id).cloned().collect::<Vec<_>>();
        let mut links = Vec::new();
        for m in &matches {
            let page = match self.render_match(m) {
                Ok(page) => page,
                Err(error) => {
                    tracing::warn!(%error, pattern_id, full_name = %m.full_name, "skipping match");
                    continue;
                }
            };
            let match_ix = links.len() + 1;
            let file = html::match_file(pattern_id, match_ix, label);
            self.write(&file, &page)?;
            links.push(html::match_link(&file, match_ix, &m.full_name));
        }
        let written = links.len();
        let page = html::matches_page(pattern_id, links);
        self.write(&html::pattern_matches_file(pattern_id, label), &page.render_to_string())?;
        Ok(written)
    }
}

///////////////////////////////////////////////////////////////////////////////
// VIEWER
///////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone)]
pub struct Viewer {
    pub results_dir: PathBuf,
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Defaults to the configuration file found in `results_dir`.
    pub config: Option<PathBuf>,
}

impl Viewer {
    pub fn new(results_dir: impl Into<PathBuf>, source_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Viewer {
            results_dir: results_dir.into(),
            source_dir: source_dir.into(),
            output_dir: output_dir.into(),
            config: None,
        }
    }

    pub fn with_config(mut self, config: impl Into<PathBuf>) -> Self {
        self.config = Some(config.into());
        self
    }

    fn results_name(&self) -> String {
        self.results_dir
            .file_name()
            .map(|x| x.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.results_dir.display().to_string())
    }

    fn write_page(&self, file: &str, contents: &str) -> Result<PathBuf> {
        let path = self.output_dir.join(file);
        std::fs::write(&path, contents).map_err(|e| Error::io(&path, e))?;
        Ok(path)
    }

    /// Reads the configuration and every input document, then writes all
    /// pages. Only unusable configuration or documents abort the run.
    pub fn run(&self) -> Result<Report> {
        let config_path = match &self.config {
            Some(path) => path.clone(),
            None => Config::find(&self.results_dir)?,
        };
        let config = Config::load(&config_path)?;
        tracing::info!(config = %config_path.display(), mode = ?config.mode, "loaded configuration");
        std::fs::create_dir_all(&self.output_dir).map_err(|e| Error::io(&self.output_dir, e))?;
        let patterns = data::read_patterns(&self.results_dir.join(&config.patterns))?;
        let (links, match_pages) = match &config.mode {
            Mode::OneClass {matches} => self.one_class(&patterns, matches)?,
            Mode::TwoClass {old_matches, new_matches, old_inputs, new_inputs} => {
                self.two_class(
                    &patterns,
                    (old_matches.as_str(), new_matches.as_str()),
                    (old_inputs.as_str(), new_inputs.as_str()),
                )?
            }
        };
        let page = html::patterns_page(&self.results_name(), links);
        self.write_page(html::PATTERNS_FILE, &page.render_to_string())?;
        let index = self.write_page(html::INDEX_FILE, &html::index_page())?;
        tracing::info!(patterns = patterns.len(), match_pages, "wrote {}", index.display());
        Ok(Report {
            patterns: patterns.len(),
            match_pages,
            index,
        })
    }

    fn one_class(&self, patterns: &[Pattern], matches: &str) -> Result<(Vec<html::Node>, usize)> {
        let matches = data::read_matches(&self.results_dir.join(matches))?;
        let mut corpus = CorpusRenderer::new(Corpus::Old, self.source_dir.clone(), &self.output_dir, matches);
        let mut links = Vec::new();
        let mut match_pages = 0;
        for pattern in patterns {
            links.push(html::one_class_pattern_link(pattern.id, corpus.corpus.label()));
            match_pages += corpus.write_pattern(pattern.id)?;
        }
        Ok((links, match_pages))
    }

    fn two_class(
        &self,
        patterns: &[Pattern],
        (old_matches, new_matches): (&str, &str),
        (old_inputs, new_inputs): (&str, &str),
    ) -> Result<(Vec<html::Node>, usize)> {
        let mut old = CorpusRenderer::new(
            Corpus::Old,
            self.source_dir.join(old_inputs),
            &self.output_dir,
            data::read_matches(&self.results_dir.join(old_matches))?,
        );
        let mut new = CorpusRenderer::new(
            Corpus::New,
            self.source_dir.join(new_inputs),
            &self.output_dir,
            data::read_matches(&self.results_dir.join(new_matches))?,
        );
        let mut links = Vec::new();
        let mut match_pages = 0;
        for pattern in patterns {
            let (old_support, new_support) = pattern.class_support().unwrap_or_else(|error| {
                tracing::warn!(%error, pattern_id = pattern.id, "counting matches instead");
                (old.count_of(pattern.id), new.count_of(pattern.id))
            });
            links.push(html::two_class_pattern_link(pattern.id, old_support, new_support));
            match_pages += old.write_pattern(pattern.id)?;
            match_pages += new.write_pattern(pattern.id)?;
        }
        Ok((links, match_pages))
    }
}
