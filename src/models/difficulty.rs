use serde::{Deserialize, Serialize};

/// 题目难度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// 难度值的来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultySource {
    /// 模型直接给出了标准值
    Model,
    /// 从非标准值中推断
    Inferred,
    /// 缺失或无法推断，取默认值
    #[default]
    Defaulted,
}

const EASY_KEYWORDS: &[&str] = &[
    "what is",
    "define",
    "explain briefly",
    "basic",
    "simple",
    "difference between",
    "是什么",
    "定义",
    "解释",
    "简述",
    "简单",
    "基础",
    "哪个",
    "谁",
];

const HARD_KEYWORDS: &[&str] = &[
    "how would you",
    "implement",
    "optimize",
    "compare and contrast",
    "design a system",
    "explain in detail",
    "advantages and disadvantages",
    "为什么",
    "如何实现",
    "原理",
    "机制",
    "优化",
    "性能",
    "安全",
    "设计",
];

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    /// 仅接受标准值（忽略大小写和首尾空白）
    pub fn from_canonical(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// 从非标准值中按子串推断，推断不出时返回 `None`
    pub fn infer_from(s: &str) -> Option<Self> {
        let lower = s.to_lowercase();
        if lower.contains("easy") {
            Some(Difficulty::Easy)
        } else if lower.contains("hard") {
            Some(Difficulty::Hard)
        } else {
            None
        }
    }

    /// 基于题目关键词和答案长度估计难度
    pub fn estimate(question: &str, answer: &str) -> Self {
        let question_lower = question.to_lowercase();

        let easy_count = EASY_KEYWORDS
            .iter()
            .filter(|kw| question_lower.contains(*kw))
            .count();
        let hard_count = HARD_KEYWORDS
            .iter()
            .filter(|kw| question_lower.contains(*kw))
            .count();

        let answer_length = answer.chars().count();
        let answer_lines = answer.matches('\n').count() + 1;

        if easy_count > 0 && answer_length < 300 && answer_lines < 5 {
            Difficulty::Easy
        } else if hard_count > 0 || answer_length > 500 || answer_lines > 10 {
            Difficulty::Hard
        } else {
            Difficulty::Medium
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_canonical() {
        assert_eq!(Difficulty::from_canonical(" Hard "), Some(Difficulty::Hard));
        assert_eq!(Difficulty::from_canonical("EASY_MODE"), None);
    }

    #[test]
    fn test_infer_from_substring() {
        assert_eq!(Difficulty::infer_from("EASY_MODE"), Some(Difficulty::Easy));
        assert_eq!(Difficulty::infer_from("very-hard"), Some(Difficulty::Hard));
        assert_eq!(Difficulty::infer_from("normal"), None);
    }

    #[test]
    fn test_estimate_short_definition_is_easy() {
        assert_eq!(
            Difficulty::estimate("What is a closure?", "A function with its scope."),
            Difficulty::Easy
        );
    }

    #[test]
    fn test_estimate_implementation_is_hard() {
        assert_eq!(
            Difficulty::estimate("How would you implement debounce?", "short"),
            Difficulty::Hard
        );
        assert_eq!(Difficulty::estimate("事件循环的原理", "短"), Difficulty::Hard);
    }

    #[test]
    fn test_estimate_long_answer_is_hard() {
        let long_answer = "x".repeat(600);
        assert_eq!(Difficulty::estimate("Describe hoisting", &long_answer), Difficulty::Hard);
        let many_lines = "line\n".repeat(12);
        assert_eq!(Difficulty::estimate("Describe hoisting", &many_lines), Difficulty::Hard);
    }

    #[test]
    fn test_estimate_defaults_to_medium() {
        assert_eq!(
            Difficulty::estimate("Describe hoisting", "Declarations move up."),
            Difficulty::Medium
        );
    }

    #[test]
    fn test_easy_keyword_with_long_answer_is_hard() {
        let long_answer = "y".repeat(550);
        assert_eq!(Difficulty::estimate("What is the DOM?", &long_answer), Difficulty::Hard);
    }
}
