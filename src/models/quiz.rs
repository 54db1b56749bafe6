use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{Category, Difficulty, DifficultySource};

/// 题目类型，目前只有单选题
pub const SINGLE_CHOICE: &str = "single-choice";

/// 校验通过后的状态标记
pub const VALIDATED: &str = "validated";

/// 可直接导入文档数据库的题目记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizRecord {
    /// `sha256("<category>:<原题干>")` 的前 16 位十六进制
    pub id: String,
    pub category: Category,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub options: Vec<String>,
    pub correct: usize,
    pub analysis: String,
    pub difficulty: Difficulty,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
    #[serde(rename = "_meta")]
    pub meta: QuizMeta,
}

/// 记录的溯源信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizMeta {
    pub source_question: String,
    pub source_answer: String,
    pub generation_model: String,
    pub validation_status: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    pub difficulty_source: DifficultySource,
}
