//! LLM 生成请求与结果
//!
//! 内存中的 [`GenerationResult`] 是带标签的成功 / 失败类型；
//! 落盘（缓存文件）时使用 `{success, data, error, latency, request_data}` 的扁平结构。

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Category, Difficulty, DifficultySource, SourceUnit};

/// 发送给 LLM 的一道题
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub question: String,
    pub answer: String,
    pub category: Category,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl GenerationRequest {
    /// 由源问答构建请求，`index` 为该题在批次中的位置
    pub fn from_unit(unit: &SourceUnit, index: usize) -> Self {
        let mut metadata = Map::new();
        metadata.insert("index".to_string(), Value::from(index));
        metadata.insert(
            "section_title".to_string(),
            Value::from(unit.section_title.clone()),
        );
        Self {
            question: unit.question.clone(),
            answer: unit.answer.clone(),
            category: unit.category,
            metadata,
        }
    }

    /// 批次内序号
    pub fn index(&self) -> Option<usize> {
        self.metadata
            .get("index")
            .and_then(Value::as_u64)
            .map(|i| i as usize)
    }

    /// 序列化为错误日志使用的 JSON
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

fn default_difficulty() -> Difficulty {
    Difficulty::Medium
}

/// 通过结构闸门并规范化后的 LLM 输出
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoicePayload {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer_index: usize,
    pub explanation: String,
    #[serde(default = "default_difficulty")]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub difficulty_source: DifficultySource,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// 失败类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// 网络、超时、非 200
    Transport,
    /// 模型内容不是合法 JSON
    Decode,
    /// JSON 合法但结构不符
    Schema,
    /// 任务内部异常
    Internal,
}

/// 单次生成的结果
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    Success(ChoicePayload),
    Failure { kind: FailureKind, error: String },
}

/// 一次 LLM 调用的完整结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "GenerationResultRecord", try_from = "GenerationResultRecord")]
pub struct GenerationResult {
    pub outcome: GenerationOutcome,
    pub latency_seconds: f64,
    pub request: GenerationRequest,
}

impl GenerationResult {
    pub fn success(request: GenerationRequest, data: ChoicePayload, latency_seconds: f64) -> Self {
        Self {
            outcome: GenerationOutcome::Success(data),
            latency_seconds: latency_seconds.max(0.0),
            request,
        }
    }

    pub fn failure(
        request: GenerationRequest,
        kind: FailureKind,
        error: impl Into<String>,
        latency_seconds: f64,
    ) -> Self {
        Self {
            outcome: GenerationOutcome::Failure {
                kind,
                error: error.into(),
            },
            latency_seconds: latency_seconds.max(0.0),
            request,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, GenerationOutcome::Success(_))
    }

    pub fn data(&self) -> Option<&ChoicePayload> {
        match &self.outcome {
            GenerationOutcome::Success(data) => Some(data),
            GenerationOutcome::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            GenerationOutcome::Success(_) => None,
            GenerationOutcome::Failure { error, .. } => Some(error),
        }
    }
}

/// 缓存文件中的扁平结构
#[derive(Debug, Clone, Serialize, Deserialize)]
struct GenerationResultRecord {
    success: bool,
    #[serde(default)]
    data: Option<ChoicePayload>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error_kind: Option<FailureKind>,
    #[serde(default)]
    latency: f64,
    request_data: GenerationRequest,
}

impl From<GenerationResult> for GenerationResultRecord {
    fn from(result: GenerationResult) -> Self {
        match result.outcome {
            GenerationOutcome::Success(data) => Self {
                success: true,
                data: Some(data),
                error: None,
                error_kind: None,
                latency: result.latency_seconds,
                request_data: result.request,
            },
            GenerationOutcome::Failure { kind, error } => Self {
                success: false,
                data: None,
                error: Some(error),
                error_kind: Some(kind),
                latency: result.latency_seconds,
                request_data: result.request,
            },
        }
    }
}

impl TryFrom<GenerationResultRecord> for GenerationResult {
    type Error = String;

    fn try_from(record: GenerationResultRecord) -> Result<Self, Self::Error> {
        let outcome = match (record.success, record.data) {
            (true, Some(data)) => GenerationOutcome::Success(data),
            (true, None) => return Err("success=true 的结果缺少 data 字段".to_string()),
            (false, _) => GenerationOutcome::Failure {
                kind: record.error_kind.unwrap_or(FailureKind::Internal),
                error: record.error.unwrap_or_else(|| "未知错误".to_string()),
            },
        };
        Ok(Self {
            outcome,
            latency_seconds: record.latency,
            request: record.request_data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_request() -> GenerationRequest {
        GenerationRequest {
            question: "What is a closure?".to_string(),
            answer: "A function bundled with its lexical scope.".to_string(),
            category: Category::JavaScript,
            metadata: Map::new(),
        }
    }

    fn sample_payload() -> ChoicePayload {
        ChoicePayload {
            question: "闭包是什么？".to_string(),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_answer_index: 2,
            explanation: "因为...".to_string(),
            difficulty: Difficulty::Easy,
            difficulty_source: DifficultySource::Model,
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_success_wire_shape() {
        let result = GenerationResult::success(sample_request(), sample_payload(), 1.5);
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["success"], json!(true));
        assert_eq!(value["data"]["correct_answer_index"], json!(2));
        assert_eq!(value["error"], Value::Null);
        assert_eq!(value["latency"], json!(1.5));
        assert_eq!(value["request_data"]["category"], json!("javascript"));
    }

    #[test]
    fn test_failure_reads_back_from_wire() {
        let value = json!({
            "success": false,
            "data": null,
            "error": "API请求超时",
            "error_kind": "transport",
            "latency": 30.0,
            "request_data": {"question": "q", "answer": "a", "category": "css"}
        });
        let result: GenerationResult = serde_json::from_value(value).unwrap();
        assert!(!result.is_success());
        assert_eq!(result.error(), Some("API请求超时"));
        assert!(matches!(
            result.outcome,
            GenerationOutcome::Failure { kind: FailureKind::Transport, .. }
        ));
    }

    #[test]
    fn test_success_without_data_is_rejected() {
        let value = json!({
            "success": true,
            "latency": 0.1,
            "request_data": {"question": "q", "answer": "a", "category": "css"}
        });
        assert!(serde_json::from_value::<GenerationResult>(value).is_err());
    }

    #[test]
    fn test_negative_latency_is_clamped() {
        let result =
            GenerationResult::failure(sample_request(), FailureKind::Internal, "boom", -1.0);
        assert_eq!(result.latency_seconds, 0.0);
    }

    #[test]
    fn test_request_index_from_metadata() {
        let unit = SourceUnit {
            question: "q".to_string(),
            answer: "a".to_string(),
            category: Category::Html,
            source_file: "html-questions.md".to_string(),
            section_title: "q".to_string(),
            is_subsection: false,
            estimated_difficulty: Difficulty::Medium,
        };
        let request = GenerationRequest::from_unit(&unit, 7);
        assert_eq!(request.index(), Some(7));
        assert_eq!(request.category, Category::Html);
    }
}
