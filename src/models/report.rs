use serde::Serialize;

use super::{Category, QuizRecord};

/// 分类处理状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryStatus {
    Completed,
    /// 源文件不存在
    NoSource,
    /// 源文件中没有可用的问答
    NoQuestions,
    Failed,
}

/// 单个失败题目的详情
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedDetail {
    pub index: usize,
    pub question: String,
    pub error: String,
}

/// 单个分类的处理报告
#[derive(Debug, Clone, Serialize)]
pub struct CategoryReport {
    pub category: Category,
    pub status: CategoryStatus,
    pub success: bool,
    pub generated: usize,
    pub failed: usize,
    pub total: usize,
    /// 百分比
    pub success_rate: f64,
    pub elapsed_seconds: f64,
    pub from_cache: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub records: Vec<QuizRecord>,
    pub failed_details: Vec<FailedDetail>,
}

impl CategoryReport {
    /// 未能进入生成阶段的分类
    pub fn unavailable(category: Category, status: CategoryStatus, error: impl Into<String>) -> Self {
        Self {
            category,
            status,
            success: false,
            generated: 0,
            failed: 0,
            total: 0,
            success_rate: 0.0,
            elapsed_seconds: 0.0,
            from_cache: false,
            error: Some(error.into()),
            records: Vec::new(),
            failed_details: Vec::new(),
        }
    }
}

/// 整次运行的汇总
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub success: bool,
    pub total_generated: usize,
    pub total_failed: usize,
    pub total_questions: usize,
    pub overall_success_rate: f64,
    pub categories: Vec<CategoryReport>,
    pub all_records: Vec<QuizRecord>,
    pub generated_at: String,
}

impl RunSummary {
    /// 汇总各分类报告，记录按分类顺序拼接
    pub fn from_reports(categories: Vec<CategoryReport>) -> Self {
        let total_generated = categories.iter().map(|r| r.generated).sum();
        let total_failed = categories.iter().map(|r| r.failed).sum();
        let total_questions = categories.iter().map(|r| r.total).sum();
        let all_records = categories
            .iter()
            .flat_map(|r| r.records.iter().cloned())
            .collect();

        Self {
            success: categories.iter().any(|r| r.success),
            total_generated,
            total_failed,
            total_questions,
            overall_success_rate: percentage(total_generated, total_questions),
            categories,
            all_records,
            generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

/// `part / total * 100`，total 为 0 时为 0
pub fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_of_unavailable_categories() {
        let summary = RunSummary::from_reports(vec![
            CategoryReport::unavailable(Category::Html, CategoryStatus::NoSource, "missing"),
            CategoryReport::unavailable(Category::Css, CategoryStatus::NoQuestions, "empty"),
        ]);
        assert!(!summary.success);
        assert_eq!(summary.total_questions, 0);
        assert_eq!(summary.overall_success_rate, 0.0);
    }

    #[test]
    fn test_percentage() {
        assert_eq!(percentage(1, 4), 25.0);
        assert_eq!(percentage(0, 0), 0.0);
    }
}
