use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use interview_quiz_cleaner::models::{
    Category, ChoicePayload, Difficulty, DifficultySource, FailureKind, GenerationOutcome,
    GenerationRequest, GenerationResult,
};
use interview_quiz_cleaner::services::{generate_batch, ChoiceGenerator};

fn payload(question: &str) -> ChoicePayload {
    ChoicePayload {
        question: question.to_string(),
        options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
        correct_answer_index: 1,
        explanation: "解析".to_string(),
        difficulty: Difficulty::Medium,
        difficulty_source: DifficultySource::Model,
        warnings: Vec::new(),
    }
}

fn requests(n: usize) -> Vec<GenerationRequest> {
    (0..n)
        .map(|i| GenerationRequest {
            question: format!("Q{}", i),
            answer: format!("A{}", i),
            category: Category::Html,
            metadata: Default::default(),
        })
        .collect()
}

/// 越靠前的请求越慢
struct ReversedLatency {
    total: u64,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

#[async_trait]
impl ChoiceGenerator for ReversedLatency {
    async fn generate_choice(&self, request: &GenerationRequest) -> GenerationResult {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let index: u64 = request.question[1..].parse().unwrap();
        tokio::time::sleep(Duration::from_millis((self.total - index) * 15)).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        GenerationResult::success(request.clone(), payload(&request.question), 0.0)
    }
}

#[tokio::test]
async fn test_batch_keeps_input_order_under_reversed_latency() {
    let generator = Arc::new(ReversedLatency {
        total: 6,
        in_flight: AtomicUsize::new(0),
        peak: AtomicUsize::new(0),
    });

    let results = generate_batch(Arc::clone(&generator), requests(6), 6).await;

    let questions: Vec<&str> = results
        .iter()
        .map(|r| r.data().unwrap().question.as_str())
        .collect();
    assert_eq!(questions, vec!["Q0", "Q1", "Q2", "Q3", "Q4", "Q5"]);
    for (i, result) in results.iter().enumerate() {
        assert_eq!(result.request.question, format!("Q{}", i));
    }
}

#[tokio::test]
async fn test_batch_respects_concurrency_limit() {
    let generator = Arc::new(ReversedLatency {
        total: 8,
        in_flight: AtomicUsize::new(0),
        peak: AtomicUsize::new(0),
    });

    let results = generate_batch(Arc::clone(&generator), requests(8), 2).await;

    assert_eq!(results.len(), 8);
    assert!(generator.peak.load(Ordering::SeqCst) <= 2);
}

#[tokio::test]
async fn test_empty_batch() {
    let generator = Arc::new(ReversedLatency {
        total: 0,
        in_flight: AtomicUsize::new(0),
        peak: AtomicUsize::new(0),
    });
    assert!(generate_batch(generator, Vec::new(), 3).await.is_empty());
}

/// 第二道题的任务会异常退出
struct PanicsOnSecond;

#[async_trait]
impl ChoiceGenerator for PanicsOnSecond {
    async fn generate_choice(&self, request: &GenerationRequest) -> GenerationResult {
        if request.question == "Q1" {
            panic!("boom");
        }
        GenerationResult::success(request.clone(), payload(&request.question), 0.0)
    }
}

#[tokio::test]
async fn test_panicking_task_becomes_internal_failure() {
    let results = generate_batch(Arc::new(PanicsOnSecond), requests(3), 3).await;

    assert_eq!(results.len(), 3);
    assert!(results[0].is_success());
    assert!(results[2].is_success());
    match &results[1].outcome {
        GenerationOutcome::Failure { kind, .. } => assert_eq!(*kind, FailureKind::Internal),
        other => panic!("expected failure, got {:?}", other),
    }
    assert_eq!(results[1].request.question, "Q1");
}
