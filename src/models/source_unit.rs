use serde::{Deserialize, Serialize};

use super::{Category, Difficulty};

/// 从 Markdown 中拆出的一道原始问答
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceUnit {
    pub question: String,
    pub answer: String,
    pub category: Category,
    pub source_file: String,
    pub section_title: String,
    pub is_subsection: bool,
    /// 基于关键词与答案长度的预估难度
    pub estimated_difficulty: Difficulty,
}

impl SourceUnit {
    /// 题目和答案都非空才可用于生成
    pub fn is_complete(&self) -> bool {
        !self.question.trim().is_empty() && !self.answer.trim().is_empty()
    }
}

/// 源文档的基础信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub filename: String,
    pub file_size: usize,
    pub line_count: usize,
    pub first_section: String,
    pub sections_count: usize,
}
