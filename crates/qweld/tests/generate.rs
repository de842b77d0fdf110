//! End-to-end generation over temporary source trees

use pretty_assertions::assert_eq;
use qweld::build::{BindingBuilder, Diagnostic, GenerateError};
use qweld::extract::{extract_tree, ExtractOptions};
use qweld::ir::{BindingSchema, SemanticType, Signal, Slot};
use qweld::validate::{validate, ValidationErrorKind};
use quote::ToTokens;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const COUNTER: &str = r#"use qweld_runtime::{QmlBinding, QmlObject};
use std::marker::PhantomData;

#[derive(Default, QmlBinding)]
pub struct Counter {
    base: QmlObject,
    #[qweld(property = "count")]
    _count: isize,
    #[qweld(property = "label")]
    _label: String,
    #[qweld(signal = "countChanged")]
    _count_changed: PhantomData<fn(count: isize)>,
    #[qweld(signal = "overflow")]
    _overflow: PhantomData<fn()>,
    #[qweld(slot = "increment")]
    _increment: PhantomData<fn(step: i32) -> isize>,
    #[qweld(slot = "reset")]
    _reset: PhantomData<fn()>,
    #[qweld(constructor = "init")]
    _init: PhantomData<fn()>,
    total: usize,
}
"#;

const GREETER: &str = r#"use qweld_runtime::{QmlBinding, QmlObject};
use std::marker::PhantomData;

#[derive(Default, QmlBinding)]
pub struct Greeter {
    base: QmlObject,
    #[qweld(property = "count")]
    _count: isize,
    #[qweld(property = "name")]
    _name: String,
    #[qweld(signal = "countChanged")]
    _count_changed: PhantomData<fn(count: isize)>,
    #[qweld(signal = "said")]
    _said: PhantomData<fn(text: String)>,
    #[qweld(slot = "increment")]
    _increment: PhantomData<fn(step: i32) -> isize>,
    #[qweld(slot = "greet")]
    _greet: PhantomData<fn(name: String, factor: f64) -> String>,
    #[qweld(constructor = "init")]
    _init: PhantomData<fn()>,
    pub inits: usize,
}
"#;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn listing(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn counter_schema(source: &Path) -> BindingSchema {
    BindingSchema::new("Counter")
        .in_module("crate::counter")
        .with_source(source)
        .property("count", SemanticType::Int)
        .property("label", SemanticType::String)
        .signal(Signal::new("countChanged").param("count", SemanticType::Int))
        .signal(Signal::new("overflow"))
        .slot(
            Slot::new("increment")
                .param("step", SemanticType::Int32)
                .returns(SemanticType::Int),
        )
        .slot(Slot::new("reset"))
        .constructor("init")
}

#[test]
fn test_counter_tree_generates_files() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "src/counter.rs", COUNTER);

    let report = BindingBuilder::new(dir.path().join("src")).build().unwrap();
    assert_eq!(report.schemas, vec!["Counter".to_string()]);
    assert_eq!(report.written.len(), 3);

    assert_eq!(
        listing(&dir.path().join("src")),
        vec!["counter.rs", "qweld-counter.cpp", "qweld-counter.h", "qweld_counter.rs"]
    );

    let header = fs::read_to_string(dir.path().join("src/qweld-counter.h")).unwrap();
    assert!(header.contains("int qweld_counter_slot_increment(void* ptr, int step);"));
    assert!(header.contains("char* Counter_Label(void* ptr);"));

    let source = fs::read_to_string(dir.path().join("src/qweld-counter.cpp")).unwrap();
    assert!(source.contains("Q_PROPERTY(int count READ count WRITE setCount NOTIFY countChanged)"));

    let glue = fs::read_to_string(dir.path().join("src/qweld_counter.rs")).unwrap();
    assert!(glue.contains("impl crate::counter::Counter {"));
    assert!(glue.contains("pub fn set_count(&self, value: isize)"));
    assert!(glue.contains("pub fn overflow(&self)"));
}

#[test]
fn test_extract_then_validate_reproduces_schema() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "counter.rs", COUNTER);

    let extraction = extract_tree(dir.path(), &ExtractOptions::default());
    assert!(extraction.is_clean());
    assert_eq!(extraction.candidates.len(), 1);

    let (schema, errors) = validate(&extraction.candidates[0]);
    assert!(errors.is_empty(), "{:?}", errors);
    assert_eq!(schema, counter_schema(&dir.path().join("counter.rs")));
}

#[test]
fn test_invalid_tree_writes_nothing() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "counter.rs", COUNTER);
    write(
        dir.path(),
        "broken.rs",
        r#"use qweld_runtime::QmlObject;
use std::marker::PhantomData;

pub struct Broken {
    base: QmlObject,
    #[qweld(property = "value")]
    _value: isize,
    #[qweld(property = "value")]
    _again: f64,
}
"#,
    );

    let err = BindingBuilder::new(dir.path()).build().unwrap_err();
    let diagnostics = err.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    match &diagnostics[0] {
        Diagnostic::Validation(error) => {
            assert_eq!(error.object, "Broken");
            assert!(matches!(error.kind, ValidationErrorKind::DuplicateName { .. }));
            assert_eq!(error.location.line, Some(9));
        }
        other => panic!("unexpected diagnostic: {}", other),
    }

    // The valid Counter was not generated either
    assert_eq!(listing(dir.path()), vec!["broken.rs", "counter.rs"]);
}

#[test]
fn test_parse_error_blocks_generation() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "counter.rs", COUNTER);
    write(dir.path(), "bad.rs", "pub struct {");

    let err = BindingBuilder::new(dir.path()).build().unwrap_err();
    assert!(matches!(err, GenerateError::Rejected(_)));
    assert!(matches!(err.diagnostics()[0], Diagnostic::Structural(_)));
    assert_eq!(listing(dir.path()), vec!["bad.rs", "counter.rs"]);
}

#[test]
fn test_renamed_runtime_import() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "lamp.rs",
        r#"use qweld_runtime as qr;

pub struct Lamp {
    base: qr::QmlObject,
    #[qweld(property = "on")]
    _on: bool,
}
"#,
    );

    let report = BindingBuilder::new(dir.path()).out_dir(dir.path().join("gen")).build().unwrap();
    assert_eq!(report.schemas, vec!["Lamp".to_string()]);
    assert!(dir.path().join("gen/qweld-lamp.h").is_file());
}

#[test]
fn test_cfg_tags_select_declarations() {
    let source = r#"use qweld_runtime::QmlObject;

#[cfg(feature = "desktop")]
pub struct Window {
    base: QmlObject,
    #[qweld(property = "title")]
    _title: String,
}
"#;

    let dir = TempDir::new().unwrap();
    write(dir.path(), "window.rs", source);

    let report = BindingBuilder::new(dir.path()).out_dir(dir.path().join("off")).build().unwrap();
    assert!(report.schemas.is_empty());

    let report = BindingBuilder::new(dir.path())
        .out_dir(dir.path().join("on"))
        .tag("feature=desktop")
        .build()
        .unwrap();
    assert_eq!(report.schemas, vec!["Window".to_string()]);
}

#[test]
fn test_hidden_and_target_dirs_are_skipped() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), ".cache/counter.rs", COUNTER);
    write(dir.path(), "target/debug/counter.rs", COUNTER);
    write(dir.path(), "app/counter.rs", COUNTER);

    let extraction = extract_tree(dir.path(), &ExtractOptions::default());
    assert!(extraction.is_clean());
    assert_eq!(extraction.candidates.len(), 1);
    assert_eq!(extraction.candidates[0].module_path, "crate::app::counter");
}

#[test]
fn test_duplicate_object_across_files() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a/counter.rs", COUNTER);
    write(dir.path(), "b/counter.rs", COUNTER);

    let err = BindingBuilder::new(dir.path()).build().unwrap_err();
    let duplicates = err
        .diagnostics()
        .iter()
        .filter(|d| matches!(d, Diagnostic::Validation(e) if matches!(e.kind, ValidationErrorKind::DuplicateObject { .. })))
        .count();
    assert_eq!(duplicates, 1);
}

#[test]
fn test_descriptor_and_source_together() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "counter.rs", COUNTER);
    write(
        dir.path(),
        "ui/gauge.qweld.toml",
        r#"[[object]]
name = "Gauge"

[[object.property]]
name = "level"
type = "float64"
"#,
    );

    let report = BindingBuilder::new(dir.path())
        .out_dir(dir.path().join("gen"))
        .emit_schema(true)
        .build()
        .unwrap();

    assert_eq!(report.schemas, vec!["Counter".to_string(), "Gauge".to_string()]);
    assert_eq!(report.written.len(), 8);
    assert!(dir.path().join("gen/qweld-gauge.json").is_file());
}

#[test]
fn test_second_run_leaves_files_unchanged() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "counter.rs", COUNTER);

    let first = BindingBuilder::new(dir.path()).out_dir(dir.path().join("gen")).build().unwrap();
    let second = BindingBuilder::new(dir.path()).out_dir(dir.path().join("gen")).build().unwrap();

    assert_eq!(first.written.len(), 3);
    assert!(second.written.is_empty());
    assert_eq!(second.unchanged, first.written);
}

#[test]
fn test_config_file_drives_builder() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "ui/counter.rs", COUNTER);
    write(
        dir.path(),
        "qweld.toml",
        r#"source_dir = "ui"
out_dir = "generated"
file_prefix = "app"
"#,
    );

    let report = BindingBuilder::from_config_file(dir.path().join("qweld.toml"))
        .unwrap()
        .build()
        .unwrap();

    assert_eq!(report.schemas, vec!["Counter".to_string()]);
    assert_eq!(
        listing(&dir.path().join("generated")),
        vec!["app-counter.cpp", "app-counter.h", "app_counter.rs"]
    );
}

/// The runtime crate compiles and runs this glue against stubbed natives
#[test]
fn test_host_glue_matches_runtime_fixture() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "greeter.rs", GREETER);

    let report = BindingBuilder::new(dir.path()).out_dir(dir.path().join("gen")).build().unwrap();
    assert_eq!(report.schemas, vec!["Greeter".to_string()]);

    let generated = fs::read_to_string(dir.path().join("gen/qweld_greeter.rs")).unwrap();
    let fixture = Path::new(env!("CARGO_MANIFEST_DIR")).join("../qweld-runtime/tests/generated/qweld_greeter.rs");
    let fixture = fs::read_to_string(fixture).unwrap();

    // Compare tokens so formatting and plain comments do not matter
    let tokens = |source: &str| syn::parse_file(source).unwrap().into_token_stream().to_string();
    assert_eq!(tokens(&generated), tokens(&fixture));
}

#[test]
fn test_case_folded_type_names_are_rejected() {
    let dir = TempDir::new().unwrap();
    let view = |name: &str| {
        format!(
            "use qweld_runtime::QmlObject;\n\npub struct {} {{\n    base: QmlObject,\n    #[qweld(property = \"a\")]\n    _a: isize,\n}}\n",
            name
        )
    };
    write(dir.path(), "a/html.rs", &view("HtmlView"));
    write(dir.path(), "b/html.rs", &view("HTMLView"));

    let err = BindingBuilder::new(dir.path()).out_dir(dir.path().join("gen")).build().unwrap_err();
    let collisions: Vec<&ValidationErrorKind> = err
        .diagnostics()
        .iter()
        .filter_map(|d| match d {
            Diagnostic::Validation(e) => Some(&e.kind),
            Diagnostic::Structural(_) => None,
        })
        .collect();
    assert_eq!(collisions.len(), 1);
    assert!(matches!(
        collisions[0],
        ValidationErrorKind::ObjectCollision { other, .. } if other == "HtmlView"
    ));
    assert!(!dir.path().join("gen").exists());
}
