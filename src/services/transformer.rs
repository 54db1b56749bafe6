//! 结果转换 - 业务能力层
//!
//! 把通过校验的 [`ChoicePayload`] 转成最终的 [`QuizRecord`]，
//! 这里是第二道结构闸门

use sha2::{Digest, Sha256};
use tracing::{debug, error, info, warn};

use crate::error::TransformError;
use crate::models::quiz::{SINGLE_CHOICE, VALIDATED};
use crate::models::{
    Category, ChoicePayload, Difficulty, DifficultySource, GenerationResult, QuizMeta, QuizRecord,
    SourceUnit,
};
use crate::services::output_validator::{strip_option_marker, OPTION_COUNT};
use crate::services::tagging::extract_tags;

/// 跳过某条结果的原因
#[derive(Debug)]
pub enum SkipReason {
    /// 生成阶段已失败
    GenerationFailed,
    /// 结果数多于题目数
    NoMatchingUnit,
    /// 未通过第二道闸门
    Invalid(TransformError),
}

/// 被跳过的结果
#[derive(Debug)]
pub struct SkippedResult {
    pub index: usize,
    pub reason: SkipReason,
}

/// 批量转换结果
#[derive(Debug, Default)]
pub struct TransformOutcome {
    pub records: Vec<QuizRecord>,
    pub skipped: Vec<SkippedResult>,
}

/// 生成题目 ID：`sha256("<category>:<原题干>")` 的前 16 位
pub fn generate_question_id(category: Category, title: &str) -> String {
    let digest = Sha256::digest(format!("{}:{}", category, title).as_bytes());
    hex::encode(digest)[..16].to_string()
}

/// 转换单道题
pub fn to_quiz_record(
    payload: &ChoicePayload,
    unit: &SourceUnit,
    model: &str,
) -> Result<QuizRecord, TransformError> {
    if payload.question.trim().is_empty() {
        return Err(TransformError::MissingField { field: "question" });
    }
    if payload.explanation.trim().is_empty() {
        return Err(TransformError::MissingField {
            field: "explanation",
        });
    }
    if payload.options.len() != OPTION_COUNT {
        return Err(TransformError::OptionCount {
            actual: payload.options.len(),
        });
    }
    if payload.correct_answer_index >= OPTION_COUNT {
        return Err(TransformError::IndexOutOfRange {
            index: payload.correct_answer_index,
        });
    }

    let difficulty = match payload.difficulty_source {
        DifficultySource::Model => payload.difficulty,
        DifficultySource::Inferred | DifficultySource::Defaulted => {
            Difficulty::estimate(&unit.question, &unit.answer)
        }
    };

    Ok(QuizRecord {
        id: generate_question_id(unit.category, &unit.question),
        category: unit.category,
        title: payload.question.trim().to_string(),
        kind: SINGLE_CHOICE.to_string(),
        options: payload
            .options
            .iter()
            .map(|o| strip_option_marker(o))
            .collect(),
        correct: payload.correct_answer_index,
        analysis: payload.explanation.trim().to_string(),
        difficulty,
        tags: extract_tags(&unit.question, &unit.answer),
        meta: QuizMeta {
            source_question: unit.question.clone(),
            source_answer: unit.answer.clone(),
            generation_model: model.to_string(),
            validation_status: VALIDATED.to_string(),
            warnings: payload.warnings.clone(),
            difficulty_source: payload.difficulty_source,
        },
    })
}

/// 按下标对齐批量转换，保持顺序
pub fn transform_batch(
    results: &[GenerationResult],
    units: &[SourceUnit],
    category: Category,
    model: &str,
) -> TransformOutcome {
    let mut outcome = TransformOutcome::default();

    for (index, result) in results.iter().enumerate() {
        let Some(unit) = units.get(index) else {
            warn!("[{}] 索引超出范围: i={}, 原始问题数量={}", category, index, units.len());
            outcome.skipped.push(SkippedResult {
                index,
                reason: SkipReason::NoMatchingUnit,
            });
            continue;
        };

        let Some(payload) = result.data() else {
            debug!("[{}] 跳过失败的第{}个问题", category, index);
            outcome.skipped.push(SkippedResult {
                index,
                reason: SkipReason::GenerationFailed,
            });
            continue;
        };

        match to_quiz_record(payload, unit, model) {
            Ok(record) => outcome.records.push(record),
            Err(e) => {
                error!("[{}] 转换第{}个问题失败: {}", category, index, e);
                outcome.skipped.push(SkippedResult {
                    index,
                    reason: SkipReason::Invalid(e),
                });
            }
        }
    }

    info!(
        "[{}] 批量转换完成: 成功{}/{}",
        category,
        outcome.records.len(),
        results.len()
    );
    outcome
}
