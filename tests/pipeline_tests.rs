use std::time::{Duration, Instant};

use serde_json::{json, Value};
use snipcat::{
    parse_config, run_pipeline, Catalogue, CatalogueError, ConfigFormat, Execution, ExportFormat,
    LogLevel, LogLine, Pipeline, PipelineConfig, SourceGoal, Validation,
};

const CHEATSHEET: &str = include_str!("fixtures/cheatsheet.js");

async fn cheatsheet_catalogue(config: &PipelineConfig) -> Catalogue {
    run_pipeline(CHEATSHEET, config).await.unwrap()
}

fn logs_of(catalogue: &Catalogue, path: &[&str], label: &str) -> Vec<LogLine> {
    match &catalogue.get(path, label).unwrap().execution {
        Execution::Success { output } => output.logs.clone(),
        other => panic!("Expected Success for {}, got: {:?}", label, other),
    }
}

#[tokio::test]
async fn test_records_in_document_order() {
    let catalogue = cheatsheet_catalogue(&PipelineConfig::default()).await;
    let labels: Vec<&str> = catalogue.iter().map(|r| r.label.as_str()).collect();
    assert_eq!(
        labels,
        vec![
            "Variable Declarations",
            "Primitive Data Types",
            "If statement",
            "Loops",
            "FUNCTIONS",
            "FUNCTIONS (2)",
            "Broken Example",
            "ES6+ FEATURES",
            "ES6+ FEATURES (2)",
            "ES6+ FEATURES (3)",
            "Promises",
            "Promises (2)",
            "ERROR HANDLING",
            "ERROR HANDLING (2)",
            "DOM MANIPULATION",
            "MATH, DATE, NUMBER",
            "MATH, DATE, NUMBER (2)",
        ]
    );
    let lines: Vec<usize> = catalogue.iter().map(|r| r.line).collect();
    let mut sorted = lines.clone();
    sorted.sort_unstable();
    assert_eq!(lines, sorted);
    assert_eq!(
        catalogue.sections(),
        vec![
            "VARIABLES & DATA TYPES",
            "CONTROL FLOW",
            "FUNCTIONS",
            "ES6+ FEATURES",
            "ERROR HANDLING",
            "DOM MANIPULATION",
            "MATH, DATE, NUMBER",
        ]
    );
}

#[tokio::test]
async fn test_summary_counts() {
    let summary = cheatsheet_catalogue(&PipelineConfig::default()).await.summary();
    assert_eq!(summary.total, 17);
    assert_eq!(summary.valid, 16);
    assert_eq!(summary.syntax_errors, 1);
    assert_eq!(summary.not_run, 1);
    assert_eq!(summary.runtime_errors, 2);
    assert_eq!(summary.succeeded, 14);
    assert_eq!(summary.timed_out, 0);
}

#[tokio::test]
async fn test_syntax_error_is_isolated() {
    let catalogue = cheatsheet_catalogue(&PipelineConfig::default()).await;
    let broken = catalogue.get(&["FUNCTIONS", "Broken Example"], "Broken Example").unwrap();
    match &broken.validation {
        Validation::SyntaxError { detail } => {
            assert!(!detail.message.is_empty());
            assert!(detail.line >= 1);
        }
        other => panic!("Expected SyntaxError, got: {:?}", other),
    }
    assert_eq!(broken.execution, Execution::NotRun);

    match &catalogue.get(&["FUNCTIONS"], "FUNCTIONS (2)").unwrap().execution {
        Execution::Success { output } => assert_eq!(output.value, Some(json!("Hello, World!"))),
        other => panic!("Expected Success, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_runtime_error_does_not_stop_later_snippets() {
    let catalogue = cheatsheet_catalogue(&PipelineConfig::default()).await;
    match &catalogue.get(&["ERROR HANDLING"], "ERROR HANDLING (2)").unwrap().execution {
        Execution::RuntimeError { detail, .. } => {
            assert_eq!(detail.kind, "SyntaxError");
            assert!(!detail.message.is_empty());
        }
        other => panic!("Expected RuntimeError, got: {:?}", other),
    }
    assert_eq!(
        logs_of(&catalogue, &["DOM MANIPULATION"], "DOM MANIPULATION"),
        vec![LogLine::new(LogLevel::Log, "Clicked!")]
    );
}

#[tokio::test]
async fn test_stub_bindings_and_promises() {
    let catalogue = cheatsheet_catalogue(&PipelineConfig::default()).await;
    assert_eq!(
        logs_of(&catalogue, &["ES6+ FEATURES", "Promises"], "Promises"),
        vec![
            LogLine::new(LogLevel::Log, "Done"),
            LogLine::new(LogLevel::Log, "Finished"),
        ]
    );
    assert_eq!(
        logs_of(&catalogue, &["ES6+ FEATURES", "Promises"], "Promises (2)"),
        vec![LogLine::new(LogLevel::Log, "object")]
    );
    assert_eq!(
        logs_of(&catalogue, &["ERROR HANDLING"], "ERROR HANDLING"),
        vec![
            LogLine::new(LogLevel::Error, "Oops!"),
            LogLine::new(LogLevel::Log, "Always runs"),
        ]
    );
}

#[tokio::test]
async fn test_module_snippets() {
    let catalogue = cheatsheet_catalogue(&PipelineConfig::default()).await;
    let export = catalogue.get(&["ES6+ FEATURES"], "ES6+ FEATURES (2)").unwrap();
    assert_eq!(export.validation, Validation::Valid { goal: SourceGoal::Module });
    assert!(matches!(export.execution, Execution::Success { .. }));

    let import = catalogue.get(&["ES6+ FEATURES"], "ES6+ FEATURES (3)").unwrap();
    assert_eq!(import.validation, Validation::Valid { goal: SourceGoal::Module });
    assert!(matches!(import.execution, Execution::RuntimeError { .. }));

    let mut config = PipelineConfig::default();
    config.validate.allow_module_syntax = false;
    let strict = cheatsheet_catalogue(&config).await;
    let export = strict.get(&["ES6+ FEATURES"], "ES6+ FEATURES (2)").unwrap();
    assert!(matches!(export.validation, Validation::SyntaxError { .. }));
    assert_eq!(export.execution, Execution::NotRun);
}

#[tokio::test]
async fn test_declarations_shared_within_section_only() {
    let catalogue = cheatsheet_catalogue(&PipelineConfig::default()).await;
    // `name` comes from the previous snippet of the same section.
    assert!(matches!(
        catalogue
            .get(&["VARIABLES & DATA TYPES", "Primitive Data Types"], "Primitive Data Types")
            .unwrap()
            .execution,
        Execution::Success { .. }
    ));

    let doc = "// FIRST\nlet shared = 1;\n\nshared + 1;\n\n// SECOND\nshared;\n";
    let catalogue = run_pipeline(doc, &PipelineConfig::default()).await.unwrap();
    match &catalogue.records()[1].execution {
        Execution::Success { output } => assert_eq!(output.value, Some(json!(2))),
        other => panic!("Expected Success, got: {:?}", other),
    }
    match &catalogue.records()[2].execution {
        Execution::RuntimeError { detail, .. } => assert_eq!(detail.kind, "ReferenceError"),
        other => panic!("Expected RuntimeError, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_rerun_is_equivalent_ignoring_output() {
    let pipeline = Pipeline::new(&PipelineConfig::default()).unwrap();
    let first = pipeline.run(CHEATSHEET).await.unwrap();
    let second = pipeline.run(CHEATSHEET).await.unwrap();
    assert!(first.equivalent_ignoring_output(&second));

    let floor = |c: &Catalogue| {
        c.get(&["MATH, DATE, NUMBER"], "MATH, DATE, NUMBER (2)")
            .unwrap()
            .execution
            .clone()
    };
    assert_eq!(floor(&first), floor(&second));
}

#[tokio::test]
async fn test_infinite_loop_times_out() {
    let doc = "// LOOP\nlet before = 'kept';\n\nwhile (true) {}\n\ntypeof before;\n\n// NEXT\n'still running';\n";
    let mut config = PipelineConfig::default();
    config.sandbox.timeout_ms = 300;

    let started = Instant::now();
    let catalogue = run_pipeline(doc, &config).await.unwrap();
    let elapsed = started.elapsed();

    assert_eq!(catalogue.records()[1].execution, Execution::TimedOut { after_ms: 300 });
    // The replacement scope starts empty.
    match &catalogue.records()[2].execution {
        Execution::Success { output } => assert_eq!(output.value, Some(json!("undefined"))),
        other => panic!("Expected Success, got: {:?}", other),
    }
    assert!(matches!(catalogue.records()[3].execution, Execution::Success { .. }));
    assert!(elapsed >= Duration::from_millis(300));
    assert!(elapsed < Duration::from_secs(10));
}

#[tokio::test]
async fn test_duplicate_label_produces_no_catalogue() {
    let doc = "// ARRAYS\n\n// Methods\n[1].map(x => x);\n\n// Methods\n[1].filter(x => x);\n";
    match run_pipeline(doc, &PipelineConfig::default()).await {
        Err(CatalogueError::DuplicateLabel { label, section }) => {
            assert_eq!(label, "Methods");
            assert_eq!(section, "ARRAYS/Methods");
        }
        other => panic!("Expected DuplicateLabel, got: {:?}", other),
    }

    let doc = "// ARRAYS\n\n// Methods\n[1];\n\n// OBJECTS\n\n// Methods\n({});\n";
    assert_eq!(run_pipeline(doc, &PipelineConfig::default()).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_document_without_headings_is_malformed() {
    let err = run_pipeline("let x = 1;\n\nlet y = 2;\n", &PipelineConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogueError::MalformedDocument(_)));
    assert!(err.is_document_error());
}

#[tokio::test]
async fn test_expected_failures_from_config() {
    let config = parse_config(
        r#"
[policy]
expected_failures = ["ERROR HANDLING"]
"#,
        ConfigFormat::Toml,
    )
    .unwrap();
    let catalogue = cheatsheet_catalogue(&config).await;
    match &catalogue.get(&["ERROR HANDLING"], "ERROR HANDLING (2)").unwrap().execution {
        Execution::Success { output } => {
            let fault = output.expected_error.as_ref().unwrap();
            assert_eq!(fault.kind, "SyntaxError");
        }
        other => panic!("Expected Success, got: {:?}", other),
    }
    // Unmatched sections are still classified faithfully.
    assert!(matches!(
        catalogue.get(&["ES6+ FEATURES"], "ES6+ FEATURES (3)").unwrap().execution,
        Execution::RuntimeError { .. }
    ));
}

#[tokio::test]
async fn test_missing_bindings_from_config() {
    let config = parse_config(
        r#"{"sandbox": {"bindings": [{"kind": "console"}]}}"#,
        ConfigFormat::Json,
    )
    .unwrap();
    let catalogue = cheatsheet_catalogue(&config).await;
    match &catalogue.get(&["DOM MANIPULATION"], "DOM MANIPULATION").unwrap().execution {
        Execution::RuntimeError { detail, .. } => assert_eq!(detail.kind, "ReferenceError"),
        other => panic!("Expected RuntimeError, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_export_preserves_order_and_fields() {
    let catalogue = cheatsheet_catalogue(&PipelineConfig::default()).await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalogue.json");
    catalogue.save(&path, ExportFormat::Json).unwrap();

    let doc: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let records = doc["records"].as_array().unwrap();
    assert_eq!(records.len(), catalogue.len());
    for (exported, record) in records.iter().zip(catalogue.iter()) {
        assert_eq!(exported["label"], json!(record.label));
        assert_eq!(exported["line"], json!(record.line));
        assert_eq!(exported["source"], json!(record.source_text));
    }
    assert_eq!(doc["summary"]["syntaxErrors"], json!(1));
    assert_eq!(records[6]["validation"]["status"], json!("syntax_error"));
    assert_eq!(records[6]["execution"], json!({ "status": "not_run" }));

    let lines = catalogue.export(ExportFormat::JsonLines).unwrap();
    assert_eq!(lines.lines().count(), catalogue.len());
}

#[tokio::test]
async fn test_hash_commented_notes_are_extracted_and_checked_as_javascript() {
    let mut config = PipelineConfig::default();
    config.extract.comment_prefix = "#".to_string();
    let notes = "# LISTS\nnums = [1, 2, 3]\n\ndef square(n):\n    return n * n\n";

    let catalogue = run_pipeline(notes, &config).await.unwrap();
    let labels: Vec<&str> = catalogue.iter().map(|r| r.label.as_str()).collect();
    assert_eq!(labels, vec!["LISTS", "LISTS (2)"]);

    let list = catalogue.get(&["LISTS"], "LISTS").unwrap();
    assert_eq!(list.validation, Validation::Valid { goal: SourceGoal::Script });
    let function = catalogue.get(&["LISTS"], "LISTS (2)").unwrap();
    assert!(matches!(function.validation, Validation::SyntaxError { .. }));
    assert_eq!(function.execution, Execution::NotRun);
}
