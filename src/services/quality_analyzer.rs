//! 生成质量分析（仅供参考，不会回传给模型）

use std::collections::HashSet;

use serde::Serialize;

use crate::models::{ChoicePayload, Difficulty};

const HARD_HINTS: &[&str] = &["为什么", "如何实现", "原理", "机制", "优化", "性能", "安全"];
const EASY_HINTS: &[&str] = &["是什么", "定义", "简称", "全称", "哪个"];

/// 质量分析结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityReport {
    /// 0-100
    pub score: u32,
    pub issues: Vec<String>,
    pub suggestions: Vec<String>,
}

/// 对一道已通过校验的题目打分
pub fn analyze_quality(payload: &ChoicePayload) -> QualityReport {
    let mut score: i32 = 100;
    let mut issues = Vec::new();
    let mut suggestions = Vec::new();

    if payload.question.chars().count() < 10 {
        issues.push("题干过短，可能不够清晰".to_string());
        score -= 20;
    }

    if payload.options.len() == 4 {
        let lengths: Vec<usize> = payload.options.iter().map(|o| o.chars().count()).collect();
        let max_len = lengths.iter().copied().max().unwrap_or(0);
        let min_len = lengths.iter().copied().min().unwrap_or(0);
        if max_len > min_len * 3 {
            issues.push("选项长度差异过大，可能提示正确答案".to_string());
            score -= 15;
        }

        let prefixes: HashSet<String> = payload
            .options
            .iter()
            .map(|o| o.to_lowercase().chars().take(20).collect())
            .collect();
        if prefixes.len() < 3 {
            issues.push("选项内容过于相似".to_string());
            score -= 10;
        }
    }

    if payload.explanation.chars().count() < 50 {
        issues.push("答案解析过短，可能不够详细".to_string());
        score -= 15;
    }

    let question = payload.question.to_lowercase();
    let hard_count = HARD_HINTS.iter().filter(|kw| question.contains(*kw)).count();
    let easy_count = EASY_HINTS.iter().filter(|kw| question.contains(*kw)).count();
    match payload.difficulty {
        Difficulty::Easy if hard_count > easy_count => {
            suggestions.push("题目可能比评估的难度更高".to_string())
        }
        Difficulty::Hard if easy_count > hard_count => {
            suggestions.push("题目可能比评估的难度更低".to_string())
        }
        _ => {}
    }

    let score = score.max(0) as u32;
    let band = if score < 70 {
        "建议重新生成以改进质量"
    } else if score < 85 {
        "质量可接受，但有改进空间"
    } else {
        "质量良好"
    };
    suggestions.push(band.to_string());

    QualityReport {
        score,
        issues,
        suggestions,
    }
}

/// 把分析结果渲染成改进说明
pub fn improvement_notes(report: &QualityReport) -> String {
    if report.issues.is_empty() {
        return "质量良好，无需改进".to_string();
    }

    let mut notes = vec!["检测到以下问题需要改进：".to_string()];
    notes.extend(report.issues.iter().map(|issue| format!("- {}", issue)));

    if !report.suggestions.is_empty() {
        notes.push("\n改进建议：".to_string());
        notes.extend(report.suggestions.iter().map(|s| format!("- {}", s)));
    }

    notes.join("\n")
}
