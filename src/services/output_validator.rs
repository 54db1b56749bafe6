//! LLM 输出校验 - 业务能力层
//!
//! `validate` 只检查不修改；`normalize` 只修正不检查。
//! [`into_choice_payload`] 把两者串起来作为结构闸门。

use std::collections::HashSet;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::SchemaError;
use crate::models::{ChoicePayload, Difficulty, DifficultySource};

/// 必需字段
pub const REQUIRED_FIELDS: [&str; 4] = ["question", "options", "correct_answer_index", "explanation"];

/// 选项数量
pub const OPTION_COUNT: usize = 4;

/// 校验结果
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// 校验模型输出的结构
pub fn validate(raw: &Value) -> ValidationReport {
    let Some(data) = raw.as_object() else {
        return ValidationReport {
            valid: false,
            errors: vec!["输出应为JSON对象".to_string()],
            warnings: Vec::new(),
        };
    };

    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for field in REQUIRED_FIELDS {
        if !data.contains_key(field) {
            errors.push(format!("缺少必需字段: {}", field));
        }
    }

    if data.get("question").is_some_and(|v| !v.is_string()) {
        errors.push("question字段应为字符串类型".to_string());
    }

    if let Some(options) = data.get("options") {
        match options.as_array() {
            None => errors.push("options字段应为数组类型".to_string()),
            Some(items) if items.len() != OPTION_COUNT => errors.push(format!(
                "options字段应包含4个选项，实际有{}个",
                items.len()
            )),
            Some(items) => {
                for (i, option) in items.iter().enumerate() {
                    match option.as_str() {
                        None => errors.push(format!("选项{}应为字符串类型", i)),
                        Some(text) if text.trim().is_empty() => {
                            warnings.push(format!("选项{}内容为空或仅包含空白字符", i))
                        }
                        Some(_) => {}
                    }
                }
            }
        }
    }

    if let Some(index) = data.get("correct_answer_index") {
        match as_integer(index) {
            None => errors.push("correct_answer_index字段应为整数类型".to_string()),
            Some(i) if !(0..OPTION_COUNT as i64).contains(&i) => errors.push(format!(
                "correct_answer_index应在0-3范围内，实际为{}",
                i
            )),
            Some(_) => {}
        }
    }

    if data.get("explanation").is_some_and(|v| !v.is_string()) {
        errors.push("explanation字段应为字符串类型".to_string());
    }

    if let Some(difficulty) = data.get("difficulty") {
        match difficulty.as_str() {
            Some(text) if Difficulty::from_canonical(text).is_none() => warnings.push(format!(
                "难度级别 '{}' 不是标准值 (easy/medium/hard)",
                text.to_lowercase()
            )),
            Some(_) => {}
            None => warnings.push("难度级别应为字符串类型".to_string()),
        }
    }

    if let Some(items) = data.get("options").and_then(Value::as_array) {
        let texts: Vec<String> = items
            .iter()
            .filter_map(Value::as_str)
            .map(|s| s.trim().to_lowercase())
            .collect();
        let distinct: HashSet<&String> = texts.iter().collect();
        if distinct.len() != texts.len() {
            warnings.push("选项内容存在重复或高度相似".to_string());
        }
    }

    ValidationReport {
        valid: errors.is_empty(),
        errors,
        warnings,
    }
}

/// 规范化模型输出
///
/// - 难度：标准值转小写；非标准值按子串推断，推断不出为 medium
/// - 选项：去掉 `A.`、`1.`、`A、`、`(A)` 等前缀，非字符串转成文本
/// - 正确答案索引：非整数或越界时置为 0
pub fn normalize(raw: &Value) -> Value {
    let Some(data) = raw.as_object() else {
        return raw.clone();
    };
    let mut normalized: Map<String, Value> = data.clone();

    let (difficulty, _) = classify_difficulty(data.get("difficulty"));
    normalized.insert("difficulty".to_string(), Value::from(difficulty.as_str()));

    if let Some(items) = data.get("options").and_then(Value::as_array) {
        let cleaned: Vec<Value> = items
            .iter()
            .map(|option| match option {
                Value::String(text) => Value::from(strip_option_marker(text)),
                other => Value::from(other.to_string()),
            })
            .collect();
        normalized.insert("options".to_string(), Value::Array(cleaned));
    }

    if let Some(index) = data.get("correct_answer_index") {
        let in_range = as_integer(index).is_some_and(|i| (0..OPTION_COUNT as i64).contains(&i));
        if !in_range {
            normalized.insert("correct_answer_index".to_string(), Value::from(0));
        }
    }

    Value::Object(normalized)
}

/// 判定难度及其来源
pub fn classify_difficulty(value: Option<&Value>) -> (Difficulty, DifficultySource) {
    let Some(text) = value.and_then(Value::as_str) else {
        return (Difficulty::Medium, DifficultySource::Defaulted);
    };
    if let Some(difficulty) = Difficulty::from_canonical(text) {
        (difficulty, DifficultySource::Model)
    } else if let Some(difficulty) = Difficulty::infer_from(text) {
        (difficulty, DifficultySource::Inferred)
    } else {
        (Difficulty::Medium, DifficultySource::Defaulted)
    }
}

/// 去掉选项前的序号标记
pub fn strip_option_marker(option: &str) -> String {
    let trimmed = option.trim();
    strip_parenthesized_marker(trimmed)
        .or_else(|| strip_plain_marker(trimmed))
        .map(|rest| rest.trim_start().to_string())
        .unwrap_or_else(|| trimmed.to_string())
}

fn is_marker_char(c: char) -> bool {
    matches!(c, 'A'..='D' | 'a'..='d' | '1'..='4')
}

/// `A.`、`A、`、`1)`、`B：` 等
fn strip_plain_marker(text: &str) -> Option<&str> {
    let mut chars = text.char_indices();
    let (_, marker) = chars.next()?;
    if !is_marker_char(marker) {
        return None;
    }
    let (i, separator) = chars.next()?;
    let rest = &text[i + separator.len_utf8()..];
    match separator {
        '、' | '．' | '）' | '：' => Some(rest),
        // `1.5s`、`A.length` 不是序号
        '.' | ')' | ':' => match rest.chars().next() {
            Some(c) if c.is_ascii_alphanumeric() => None,
            _ => Some(rest),
        },
        _ => None,
    }
}

/// `(A)`、`（B）`
fn strip_parenthesized_marker(text: &str) -> Option<&str> {
    let inner = text.strip_prefix('(').or_else(|| text.strip_prefix('（'))?;
    let mut chars = inner.char_indices();
    let (_, marker) = chars.next()?;
    if !is_marker_char(marker) {
        return None;
    }
    let (i, close) = chars.next()?;
    match close {
        ')' | '）' => Some(&inner[i + close.len_utf8()..]),
        _ => None,
    }
}

fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_u64().map(|u| u as i64)),
        _ => None,
    }
}

/// 结构闸门：校验不通过返回 [`SchemaError`]，通过则规范化并转成强类型
pub fn into_choice_payload(raw: &Value) -> Result<ChoicePayload, SchemaError> {
    let report = validate(raw);
    if !report.valid {
        return Err(SchemaError {
            errors: report.errors,
        });
    }

    let (difficulty, difficulty_source) = classify_difficulty(raw.get("difficulty"));
    let normalized = normalize(raw);

    let text = |key: &str| {
        normalized
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    let options = normalized
        .get("options")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|v| v.as_str().unwrap_or_default().to_string())
                .collect()
        })
        .unwrap_or_default();
    let correct_answer_index = normalized
        .get("correct_answer_index")
        .and_then(as_integer)
        .unwrap_or(0) as usize;

    Ok(ChoicePayload {
        question: text("question"),
        options,
        correct_answer_index,
        explanation: text("explanation"),
        difficulty,
        difficulty_source,
        warnings: report.warnings,
    })
}
