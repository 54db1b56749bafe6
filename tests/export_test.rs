use std::collections::BTreeSet;
use std::io::Read;

use interview_quiz_cleaner::config::OutputSettings;
use interview_quiz_cleaner::models::{Category, Difficulty, DifficultySource, QuizMeta, QuizRecord};
use interview_quiz_cleaner::services::exporter::{read_line_json, write_line_json};
use interview_quiz_cleaner::services::QuizExporter;
use tempfile::TempDir;

fn record(i: usize) -> QuizRecord {
    let category = Category::ALL[i % Category::ALL.len()];
    let tags: BTreeSet<String> = if i % 2 == 0 {
        ["closure".to_string()].into_iter().collect()
    } else {
        BTreeSet::new()
    };
    QuizRecord {
        id: format!("{:016x}", i),
        category,
        title: format!("第{}题：下列说法正确的是？", i),
        kind: "single-choice".to_string(),
        options: vec![
            "选项一".to_string(),
            "选项\"二\"".to_string(),
            "选项\n三".to_string(),
            "选项四".to_string(),
        ],
        correct: i % 4,
        analysis: format!("解析 {}", i),
        difficulty: Difficulty::Medium,
        tags,
        meta: QuizMeta {
            source_question: format!("Question {}", i),
            source_answer: "Answer".to_string(),
            generation_model: "qwen-turbo".to_string(),
            validation_status: "validated".to_string(),
            warnings: Vec::new(),
            difficulty_source: DifficultySource::Model,
        },
    }
}

async fn round_trip(count: usize) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("line.json");
    let records: Vec<QuizRecord> = (0..count).map(record).collect();

    write_line_json(&path, &records).await.unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text.lines().count(), count);
    assert_eq!(read_line_json(&path).await.unwrap(), records);
}

#[tokio::test]
async fn test_line_json_round_trip_empty() {
    round_trip(0).await;
}

#[tokio::test]
async fn test_line_json_round_trip_single() {
    round_trip(1).await;
}

#[tokio::test]
async fn test_line_json_round_trip_many() {
    round_trip(150).await;
}

#[tokio::test]
async fn test_export_all_writes_zip_with_json_and_readme() {
    let dir = TempDir::new().unwrap();
    let readme = dir.path().join("README.md");
    std::fs::write(&readme, "# 题库说明\n").unwrap();

    let exporter = QuizExporter::new(OutputSettings {
        output_dir: dir.path().join("out"),
        ..OutputSettings::default()
    })
    .with_readme(&readme);

    let records: Vec<QuizRecord> = (0..3).map(record).collect();
    let outcome = exporter.export_all(&records).await.unwrap();

    let zip_path = outcome.zip.unwrap();
    let mut archive = zip::ZipArchive::new(std::fs::File::open(zip_path).unwrap()).unwrap();
    assert_eq!(archive.len(), 2);

    let mut json = String::new();
    archive
        .by_name("frontend_questions.json")
        .unwrap()
        .read_to_string(&mut json)
        .unwrap();
    let document: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(document["metadata"]["total_questions"], 3);
    assert_eq!(document["questions"][1]["type"], "single-choice");
    assert!(document["questions"][1].get("tags").is_none());
    assert_eq!(document["questions"][0]["_meta"]["validation_status"], "validated");

    assert!(archive.by_name("README.md").is_ok());
    assert!(outcome.mini.is_some());
    assert!(outcome.line.is_some());
}
