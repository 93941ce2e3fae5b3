use std::fs;
use std::path::Path;
use matchview::{Error, Viewer};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const SOURCE: &str = "def compute(value):\n    return value + 1\n";

const ANNOTATED: &str = r#"<Module>
  <FunctionDef ID="1" LineNr="1" EndLineNr="2" ColNr="1" EndColNr="20">
    <name ID="2" LineNr="1" EndLineNr="1" ColNr="5" EndColNr="11">compute</name>
    <Return ID="3" LineNr="2" EndLineNr="2" ColNr="5" EndColNr="20">
      <Name ID="4" LineNr="2" EndLineNr="2" ColNr="12" EndColNr="16">value</Name>
    </Return>
  </FunctionDef>
</Module>"#;

fn write(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

fn one_class_fixture() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(
        &root.join("results/run.properties"),
        "2Class=false\noutputPath=out/patterns.xml\noutputMatches=out/matches.xml\n",
    );
    write(
        &root.join("results/patterns.xml"),
        "<patterns><subtree Support=\"3\"/><subtree Support=\"1\"/></patterns>",
    );
    write(
        &root.join("results/matches.xml"),
        r#"<matches>
  <match PatternID="1" FullName="pkg.a.compute" FileName="a.py"><Name ID="4"/></match>
  <match PatternID="2" FullName="pkg.gone" FileName="gone.py"><Name ID="4"/></match>
  <match PatternID="1" FullName="pkg.a.compute#name" FileName="a.py"><name ID="2"/></match>
  <match PatternID="2" FullName="pkg.a.again" FileName="a.py"><Name ID="4"/></match>
  <match PatternID="1" FullName="pkg.b" FileName="nested/b.py"><Name ID="4"/></match>
</matches>"#,
    );
    write(&root.join("source/a.py"), SOURCE);
    write(&root.join("source/a.xml"), ANNOTATED);
    write(&root.join("source/b.py"), "x = 1\n");
    dir
}

#[test]
fn one_class_pages_and_links() {
    let dir = one_class_fixture();
    let root = dir.path();
    let out = root.join("html");
    let report = Viewer::new(root.join("results"), root.join("source"), &out)
        .run()
        .unwrap();
    assert_eq!(report.patterns, 2);
    assert_eq!(report.match_pages, 4);
    assert_eq!(report.index, out.join("index.html"));

    let patterns = read(&out.join("patterns.html"));
    assert_eq!(patterns.matches("target=\"center\"").count(), 2);
    assert!(patterns.contains("<h3>List patterns: results</h3>"));
    assert!(patterns.contains("<a href=\"pattern_1_matches_old.html\" target=\"center\">[1]- pattern 1</a>"));

    let first = read(&out.join("pattern_1_matches_old.html"));
    assert_eq!(first.matches("target=\"right\"").count(), 3);
    assert!(first.contains("<a href=\"patternID_1_matchID_1_old.html\" target=\"right\">[1]-pkg.a.compute</a>"));
    assert!(first.contains("<a href=\"patternID_1_matchID_2_old.html\" target=\"right\">[2]-pkg.a.compute#name</a>"));
    assert!(first.contains("<a href=\"patternID_1_matchID_3_old.html\" target=\"right\">[3]-pkg.b</a>"));

    // The match on a missing file is skipped, the next one is still written.
    let second = read(&out.join("pattern_2_matches_old.html"));
    assert_eq!(second.matches("target=\"right\"").count(), 1);
    assert!(second.contains("[1]-pkg.a.again"));
    assert!(out.join("patternID_2_matchID_1_old.html").is_file());
    assert!(!out.join("patternID_2_matchID_2_old.html").exists());

    let index = read(&out.join("index.html"));
    assert!(index.contains("<frame src=\"patterns.html\" name=\"left\">"));
}

#[test]
fn match_pages_highlight_the_matched_nodes() {
    let dir = one_class_fixture();
    let root = dir.path();
    let out = root.join("html");
    Viewer::new(root.join("results"), root.join("source"), &out).run().unwrap();

    let variable = read(&out.join("patternID_1_matchID_1_old.html"));
    assert!(variable.contains("<pre>def compute(value):</pre>\n"));
    assert!(variable.contains(
        "<pre><mark>    <span class=\"key\">return</span> <span class=\"var\">value</span> + 1</mark></pre>\n"
    ));

    let name = read(&out.join("patternID_1_matchID_2_old.html"));
    assert!(name.contains(
        "<pre><mark><span class=\"key\">def</span> <span class=\"var\">compute</span>(value):</mark></pre>\n"
    ));

    // No annotated AST for b.py: the source is shown without highlights.
    let plain = read(&out.join("patternID_1_matchID_3_old.html"));
    assert!(plain.contains("<pre>x = 1</pre>\n"));
    assert!(!plain.contains("<mark>"));
}

#[test]
fn rendering_is_idempotent() {
    let dir = one_class_fixture();
    let root = dir.path();
    let run = |out: &str| {
        Viewer::new(root.join("results"), root.join("source"), root.join(out)).run().unwrap();
    };
    run("first");
    run("second");
    for file in &[
        "patterns.html",
        "pattern_1_matches_old.html",
        "patternID_1_matchID_1_old.html",
        "patternID_1_matchID_2_old.html",
    ] {
        assert_eq!(read(&root.join("first").join(file)), read(&root.join("second").join(file)));
    }
}

#[test]
fn two_class_pages_and_supports() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(
        &root.join("results/run.conf"),
        "2Class=true\noutputPath=patterns.xml\noutputMatches1=old.xml\noutputMatches2=new.xml\ninputFiles1=data/pos\ninputFiles2=data/neg\n",
    );
    write(
        &root.join("results/patterns.xml"),
        "<patterns><subtree Support=\"5-3\"/><subtree Support=\"broken\"/></patterns>",
    );
    write(
        &root.join("results/old.xml"),
        r#"<matches><match PatternID="1" FullName="old.f" FileName="a.py"><Name ID="4"/></match></matches>"#,
    );
    write(
        &root.join("results/new.xml"),
        r#"<matches>
  <match PatternID="1" FullName="new.f" FileName="a.py"><name ID="2"/></match>
  <match PatternID="2" FullName="new.g" FileName="a.py"><name ID="2"/></match>
</matches>"#,
    );
    write(&root.join("source/pos/a.py"), SOURCE);
    write(&root.join("source/pos/a.xml"), ANNOTATED);
    write(&root.join("source/neg/a.py"), SOURCE);
    write(&root.join("source/neg/a.xml"), ANNOTATED);

    let out = root.join("html");
    let report = Viewer::new(root.join("results"), root.join("source"), &out)
        .run()
        .unwrap();
    assert_eq!(report.match_pages, 3);

    let patterns = read(&out.join("patterns.html"));
    assert!(patterns.contains("<a href=\"pattern_1_matches_old.html\" target=\"center\">5 matches old</a>"));
    assert!(patterns.contains("<a href=\"pattern_1_matches_new.html\" target=\"center\">3 matches new</a>"));
    // An unreadable support falls back to the number of matches.
    assert!(patterns.contains(">0 matches old</a>"));
    assert!(patterns.contains(">1 matches new</a>"));

    let old = read(&out.join("patternID_1_matchID_1_old.html"));
    assert!(old.contains("<span class=\"var\">value</span>"));
    let new = read(&out.join("patternID_1_matchID_1_new.html"));
    assert!(new.contains("<span class=\"var\">compute</span>"));
    assert!(out.join("pattern_2_matches_old.html").is_file());
    assert!(out.join("patternID_2_matchID_1_new.html").is_file());
}

#[test]
fn missing_inputs_abort_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("results")).unwrap();
    let viewer = Viewer::new(root.join("results"), root.join("source"), root.join("html"));
    assert!(matches!(viewer.run(), Err(Error::MissingConfig(_))));

    write(&root.join("results/run.properties"), "outputPath=patterns.xml\noutputMatches=matches.xml\n");
    assert!(matches!(viewer.run(), Err(Error::Io {..})));

    write(&root.join("results/patterns.xml"), "<patterns><subtree/>");
    assert!(matches!(viewer.run(), Err(Error::Xml {..})));
}
