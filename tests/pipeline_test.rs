use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use interview_quiz_cleaner::config::{Config, OutputSettings, ProcessingSettings};
use interview_quiz_cleaner::error::{AppError, SourceError};
use interview_quiz_cleaner::models::{
    Category, CategoryStatus, ChoicePayload, Difficulty, DifficultySource, FailureKind,
    GenerationRequest, GenerationResult,
};
use interview_quiz_cleaner::services::{ChoiceGenerator, QuizExporter};
use interview_quiz_cleaner::App;
use tempfile::TempDir;

const JS_DOC: &str = "\
# JavaScript Questions

## What is a closure?
A closure is a function bundled with its lexical environment.

## Explain event delegation
### How does it work?
Events bubble up to an ancestor listener.
### Why use it?
Fewer listeners and dynamic children are handled.

#### References
- https://example.com
";

const CSS_DOC: &str = "\
## What is CSS specificity?
The weight of a selector that decides which declaration wins.
";

/// 记录调用次数；题干包含 `fail` 时返回失败
struct CountingGenerator {
    calls: AtomicUsize,
}

impl CountingGenerator {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChoiceGenerator for CountingGenerator {
    async fn generate_choice(&self, request: &GenerationRequest) -> GenerationResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if request.question.to_lowercase().contains("why use it") {
            return GenerationResult::failure(
                request.clone(),
                FailureKind::Transport,
                "API请求失败: status=503, error=busy",
                0.1,
            );
        }
        let payload = ChoicePayload {
            question: format!("关于「{}」，下列说法正确的是？", request.question),
            options: vec![
                "A. 正确说法".to_string(),
                "B. 错误说法一".to_string(),
                "C. 错误说法二".to_string(),
                "D. 错误说法三".to_string(),
            ],
            correct_answer_index: 0,
            explanation: "只有第一项符合原答案".to_string(),
            difficulty: Difficulty::Hard,
            difficulty_source: DifficultySource::Model,
            warnings: Vec::new(),
        };
        GenerationResult::success(request.clone(), payload, 0.1)
    }
}

/// 所有请求都返回传输失败
struct AlwaysFailing;

#[async_trait]
impl ChoiceGenerator for AlwaysFailing {
    async fn generate_choice(&self, request: &GenerationRequest) -> GenerationResult {
        GenerationResult::failure(
            request.clone(),
            FailureKind::Transport,
            "API请求错误: connection reset",
            0.0,
        )
    }
}

fn config(root: &Path, categories: Vec<Category>) -> Config {
    Config {
        processing: ProcessingSettings {
            cache_dir: root.join("cache"),
            error_log_file: root.join("error_log.json"),
            ..ProcessingSettings::default()
        },
        output: OutputSettings {
            output_dir: root.join("out"),
            source_md_dir: root.join("source_md"),
            ..OutputSettings::default()
        },
        categories,
        ..Config::default()
    }
}

fn write_sources(root: &Path, docs: &[(Category, &str)]) {
    let dir = root.join("source_md");
    std::fs::create_dir_all(&dir).unwrap();
    for (category, doc) in docs {
        std::fs::write(dir.join(category.source_file_name()), doc).unwrap();
    }
}

async fn app(root: &Path, categories: Vec<Category>, generator: Arc<dyn ChoiceGenerator>) -> App {
    let config = config(root, categories);
    let exporter = QuizExporter::new(config.output.clone()).with_readme(root.join("README.md"));
    App::with_generator(config, generator, "fake-model")
        .await
        .with_exporter(exporter)
}

#[tokio::test]
async fn test_second_run_replays_cache_without_llm_calls() {
    let dir = TempDir::new().unwrap();
    write_sources(dir.path(), &[(Category::JavaScript, JS_DOC)]);

    let first_generator = CountingGenerator::new();
    let first = app(dir.path(), vec![Category::JavaScript], first_generator.clone())
        .await
        .run()
        .await
        .unwrap();

    assert_eq!(first_generator.calls(), 3);
    assert_eq!(first.total_questions, 3);
    assert_eq!(first.total_generated, 2);
    assert_eq!(first.total_failed, 1);
    assert!(!first.categories[0].from_cache);
    assert_eq!(first.categories[0].failed_details.len(), 1);
    assert_eq!(first.categories[0].failed_details[0].index, 2);

    let second_generator = CountingGenerator::new();
    let second = app(dir.path(), vec![Category::JavaScript], second_generator.clone())
        .await
        .run()
        .await
        .unwrap();

    assert_eq!(second_generator.calls(), 0);
    assert!(second.categories[0].from_cache);
    assert_eq!(second.all_records, first.all_records);
    assert_eq!(second.total_failed, 1);
}

#[tokio::test]
async fn test_records_and_exports() {
    let dir = TempDir::new().unwrap();
    write_sources(dir.path(), &[(Category::JavaScript, JS_DOC)]);

    let summary = app(dir.path(), vec![Category::JavaScript], CountingGenerator::new())
        .await
        .run()
        .await
        .unwrap();

    let record = &summary.all_records[0];
    assert_eq!(record.category, Category::JavaScript);
    assert_eq!(record.options[0], "正确说法");
    assert_eq!(record.correct, 0);
    assert_eq!(record.difficulty, Difficulty::Hard);
    assert_eq!(record.meta.source_question, "What is a closure?");
    assert_eq!(record.meta.generation_model, "fake-model");
    assert_eq!(record.id.len(), 16);
    assert!(record.tags.contains("closure"));

    let out = dir.path().join("out");
    assert!(out.join("frontend_questions.json").is_file());
    assert!(out.join("frontend_questions_mini.json").is_file());
    assert!(out.join("frontend_questions_line.json").is_file());
    assert!(out.join("frontend_questions.zip").is_file());

    let error_log: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join("error_log.json")).unwrap(),
    )
    .unwrap();
    let entries = error_log.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert!(entries[0]["error_message"]
        .as_str()
        .unwrap()
        .contains("503"));
}

#[tokio::test]
async fn test_missing_source_does_not_block_other_categories() {
    let dir = TempDir::new().unwrap();
    write_sources(dir.path(), &[(Category::Css, CSS_DOC)]);

    let summary = app(
        dir.path(),
        vec![Category::JavaScript, Category::Css],
        CountingGenerator::new(),
    )
    .await
    .run()
    .await
    .unwrap();

    assert_eq!(summary.categories.len(), 2);
    assert_eq!(summary.categories[0].status, CategoryStatus::NoSource);
    assert!(!summary.categories[0].success);
    assert_eq!(summary.categories[1].status, CategoryStatus::Completed);
    assert_eq!(summary.total_generated, 1);
    assert!(summary.success);
}

#[tokio::test]
async fn test_all_sources_missing_is_an_error() {
    let dir = TempDir::new().unwrap();

    let result = app(dir.path(), vec![Category::Html], CountingGenerator::new())
        .await
        .run()
        .await;

    assert!(matches!(
        result,
        Err(AppError::Source(SourceError::NoSources { .. }))
    ));
}

#[tokio::test]
async fn test_empty_source_reports_no_questions() {
    let dir = TempDir::new().unwrap();
    write_sources(
        dir.path(),
        &[
            (Category::Html, "just an intro without headings\n"),
            (Category::Css, CSS_DOC),
        ],
    );

    let summary = app(
        dir.path(),
        vec![Category::Html, Category::Css],
        CountingGenerator::new(),
    )
    .await
    .run()
    .await
    .unwrap();

    assert_eq!(summary.categories[0].status, CategoryStatus::NoQuestions);
    assert_eq!(summary.categories[0].total, 0);
    assert_eq!(summary.total_generated, 1);
}

#[tokio::test]
async fn test_category_without_successes_is_not_successful() {
    let dir = TempDir::new().unwrap();
    let doc = "## What is the box model?\nContent, padding, border, margin.\n\n## What is z-index?\nStacking order of positioned elements.\n";
    write_sources(dir.path(), &[(Category::Css, doc)]);

    let summary = app(dir.path(), vec![Category::Css], Arc::new(AlwaysFailing))
        .await
        .run()
        .await
        .unwrap();

    let report = &summary.categories[0];
    assert_eq!(report.status, CategoryStatus::Completed);
    assert_eq!(report.total, 2);
    assert_eq!(report.generated, 0);
    assert_eq!(report.failed, 2);
    assert!(!report.success);
    assert!(!summary.success);
    assert!(summary.all_records.is_empty());
    assert!(!dir.path().join("out").join("frontend_questions.json").exists());
}
