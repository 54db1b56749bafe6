use serde::{Deserialize, Serialize};

use crate::error::SourceError;

/// 题目分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// JavaScript
    JavaScript,
    /// HTML
    Html,
    /// CSS
    Css,
}

impl Category {
    /// 默认处理顺序
    pub const ALL: [Category; 3] = [Category::JavaScript, Category::Html, Category::Css];

    /// 获取标准名称
    pub fn name(self) -> &'static str {
        match self {
            Category::JavaScript => "javascript",
            Category::Html => "html",
            Category::Css => "css",
        }
    }

    /// 源 Markdown 文件名
    pub fn source_file_name(self) -> &'static str {
        match self {
            Category::JavaScript => "javascript-questions.md",
            Category::Html => "html-questions.md",
            Category::Css => "css-questions.md",
        }
    }

    /// 从字符串解析分类（忽略大小写）
    pub fn find(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "javascript" | "js" => Some(Category::JavaScript),
            "html" => Some(Category::Html),
            "css" => Some(Category::Css),
            _ => None,
        }
    }

    /// 解析逗号分隔的分类列表，去重并保持顺序
    pub fn parse_list(raw: &str) -> Result<Vec<Self>, SourceError> {
        let mut categories = Vec::new();
        for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let category = Self::find(part).ok_or_else(|| SourceError::UnknownCategory {
                name: part.to_string(),
            })?;
            if !categories.contains(&category) {
                categories.push(category);
            }
        }
        Ok(categories)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_is_case_insensitive() {
        assert_eq!(Category::find("JavaScript"), Some(Category::JavaScript));
        assert_eq!(Category::find(" JS "), Some(Category::JavaScript));
        assert_eq!(Category::find("CSS"), Some(Category::Css));
        assert_eq!(Category::find("rust"), None);
    }

    #[test]
    fn test_parse_list_rejects_unknown() {
        assert!(Category::parse_list("html,python").is_err());
        assert_eq!(
            Category::parse_list("html, html,css").unwrap(),
            vec![Category::Html, Category::Css]
        );
    }

    #[test]
    fn test_serializes_lowercase() {
        let json = serde_json::to_string(&Category::JavaScript).unwrap();
        assert_eq!(json, "\"javascript\"");
    }
}
