use std::fs;
use tempfile::tempdir;
use webpreview::output::{self, DEFAULT_FILENAME};
use webpreview::{
    BinaryDetection, LoaderBuilder, PreviewDocument, PreviewError, ProjectProcessor,
    load_project,
};

const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0, 1];

#[test]
fn integration_full_flow() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("css")).unwrap();
    fs::create_dir_all(dir.path().join("js")).unwrap();
    fs::create_dir_all(dir.path().join("img")).unwrap();
    fs::write(
        dir.path().join("index.html"),
        r#"<!DOCTYPE html>
<html>
<head>
  <link rel="stylesheet" href="css/style.css">
  <link rel="icon" href="img/logo.png">
</head>
<body>
  <img src="./img/logo.png" alt="logo">
  <script src="js/app.js"></script>
</body>
</html>"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("css/style.css"),
        "header { background: url(../img/logo.png); }",
    )
    .unwrap();
    fs::write(
        dir.path().join("js/app.js"),
        "import './helpers.js';\nconsole.log(helper());",
    )
    .unwrap();
    fs::write(
        dir.path().join("js/helpers.js"),
        "function helper() { return 42; }",
    )
    .unwrap();
    fs::write(dir.path().join("img/logo.png"), PNG_BYTES).unwrap();
    fs::write(dir.path().join("build.rs"), "fn main() {}").unwrap();

    let options = LoaderBuilder::new(dir.path()).build();
    let files = load_project(&options).unwrap();
    assert_eq!(files.len(), 5);
    assert!(!files.contains("build.rs"));
    let logo = files.get("img/logo.png").unwrap();
    assert!(logo.content.starts_with("data:image/png;base64,"));
    assert_eq!(logo.size, PNG_BYTES.len() as u64);

    let outcome = ProjectProcessor::new(&files).process_with_report().unwrap();
    let html = outcome.document.as_str();
    assert_eq!(outcome.entry, "index.html");
    assert!(outcome.diagnostics.is_clean());
    assert!(!html.contains("css/style.css"));
    assert!(!html.contains("src=\"js/app.js\""));
    assert!(html.contains(&format!("header {{ background: url('{}'); }}", logo.content)));
    assert!(html.contains(&format!("<img src=\"{}\" alt=\"logo\">", logo.content)));
    assert!(html.contains(&format!("<link rel=\"icon\" href=\"{}\">", logo.content)));
    assert!(html.contains(
        "function helper() { return 42; }\n\n// Bundled: ./helpers.js\nconsole.log(helper());"
    ));
    assert_eq!(
        html.matches("http-equiv=\"Content-Security-Policy\"").count(),
        1
    );
    assert_eq!(outcome.stats.files_count, 5);
    assert_eq!(outcome.stats.total_size, files.total_size());
}

#[test]
fn integration_project_without_html_fails() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("style.css"), "body {}").unwrap();
    fs::write(dir.path().join("app.js"), "run()").unwrap();
    let files = load_project(&LoaderBuilder::new(dir.path()).build()).unwrap();
    let err = ProjectProcessor::new(&files).process().unwrap_err();
    assert!(matches!(err, PreviewError::NoEntryPoint));
}

#[test]
fn integration_loader_filters() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("index.html"), "<p>hi</p>").unwrap();
    fs::write(dir.path().join("notes.txt"), "notes").unwrap();
    fs::write(dir.path().join("big.js"), "A".repeat(5000)).unwrap();
    fs::write(dir.path().join("Makefile"), "all:").unwrap();
    fs::create_dir(dir.path().join(".cache")).unwrap();
    fs::write(dir.path().join(".cache/old.html"), "old").unwrap();

    let options = LoaderBuilder::new(dir.path())
        .ignore_patterns(vec!["*.txt".into()])
        .file_size_limit(Some(100))
        .build();
    let files = load_project(&options).unwrap();
    let paths: Vec<&str> = files.paths().collect();
    assert_eq!(paths, vec!["index.html"]);

    let options = LoaderBuilder::new(dir.path())
        .include_hidden(true)
        .web_files_only(false)
        .build();
    let files = load_project(&options).unwrap();
    assert!(files.contains(".cache/old.html"));
    assert!(files.contains("Makefile"));
    assert!(files.contains("notes.txt"));
    assert!(files.contains("big.js"));
}

#[test]
fn integration_binary_detection() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("data.txt"), vec![0u8, 1, 2, 3]).unwrap();
    fs::write(dir.path().join("font.woff2"), b"wOF2").unwrap();

    let files = load_project(
        &LoaderBuilder::new(dir.path())
            .binary_detection(BinaryDetection::Simple)
            .build(),
    )
    .unwrap();
    assert!(files.get("data.txt").unwrap().is_data_uri());
    assert!(files.get("font.woff2").unwrap().is_data_uri());

    let files = load_project(
        &LoaderBuilder::new(dir.path())
            .binary_detection(BinaryDetection::None)
            .build(),
    )
    .unwrap();
    assert!(!files.get("data.txt").unwrap().is_data_uri());
    assert!(files.get("font.woff2").unwrap().is_data_uri());
}

#[test]
fn integration_invalid_root() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope");
    let err = load_project(&LoaderBuilder::new(&missing).build()).unwrap_err();
    assert!(matches!(err, PreviewError::InvalidPath(_)));
}

#[test]
fn integration_export() {
    let dir = tempdir().unwrap();
    let document = PreviewDocument::new("<!DOCTYPE html><p>saved</p>");
    let target = dir.path().join(DEFAULT_FILENAME);
    output::write_document(&document, &target).unwrap();
    assert_eq!(fs::read_to_string(&target).unwrap(), document.as_str());

    let url = output::to_data_url(&document);
    assert!(url.starts_with("data:text/html;charset=utf-8;base64,"));
}
