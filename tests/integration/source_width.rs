use std::path::Path;
use walkdir::WalkDir;

const MAX_WIDTH: usize = 100;

/// Lines wider than rustfmt's limit, skipping the bodies of multi-line
/// string literals (opened by a trailing `"\`).
fn wide_lines(source: &str) -> Vec<usize> {
    let mut in_literal = false;
    let mut wide = Vec::new();
    for (number, line) in source.lines().enumerate() {
        if in_literal {
            in_literal = !line.trim_end().ends_with("\";");
            continue;
        }
        if line.trim_end().ends_with("\"\\") {
            in_literal = true;
        }
        if line.chars().count() > MAX_WIDTH {
            wide.push(number + 1);
        }
    }
    wide
}

#[test]
fn sources_fit_the_formatter_width() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR"));
    let mut offenders = Vec::new();
    for dir in ["src", "tests"] {
        for entry in WalkDir::new(root.join(dir)).into_iter().filter_map(Result::ok) {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("rs") {
                continue;
            }
            let source = std::fs::read_to_string(path).expect("source is readable");
            for line in wide_lines(&source) {
                offenders.push(format!("{}:{line}", path.display()));
            }
        }
    }
    assert!(offenders.is_empty(), "lines over {MAX_WIDTH} columns: {offenders:?}");
}

#[test]
fn literal_bodies_are_exempt() {
    let long = "x".repeat(MAX_WIDTH + 1);
    let source = format!("const A: &str = \"\\\n{long}\n{long}\";\nlet b = \"{long}\";\n");
    assert_eq!(wide_lines(&source), vec![4]);
}
