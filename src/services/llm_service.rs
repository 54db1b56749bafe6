//! LLM 服务 - 业务能力层
//!
//! 只负责"把一道简答题改写成选择题"这一能力，不关心流程
//!
//! ## 技术栈
//! - 使用 `async-openai` 的请求类型构建 chat completion 请求体
//! - 使用 `reqwest` 发送请求（需要自定义请求头和超时）
//! - 兼容 OpenAI API 的服务（如 DashScope 兼容模式）

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_openai::types::chat::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use futures::future::join_all;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{debug, error, warn};

use crate::config::LlmSettings;
use crate::error::{AppError, AppResult, ConfigError, SchemaError, TransportError};
use crate::models::{ChoicePayload, FailureKind, GenerationRequest, GenerationResult};
use crate::services::output_validator;
use crate::services::prompt_builder::build_prompt;
use crate::utils::logging::truncate_text;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";

/// 选择题生成能力
///
/// 单题调用永远返回结果，失败也以 [`GenerationResult`] 的形式体现
#[async_trait]
pub trait ChoiceGenerator: Send + Sync {
    async fn generate_choice(&self, request: &GenerationRequest) -> GenerationResult;
}

/// LLM 服务
///
/// 职责：
/// - 构建提示词并调用 chat completions 接口
/// - 解析模型返回的 JSON 并做结构校验
/// - 只处理单道题目，不关心缓存和统计
pub struct LlmService {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    is_dashscope: bool,
}

/// 单次调用内部的失败原因
#[derive(Debug, Error)]
enum GenerateError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("JSON解析失败: {0}")]
    Decode(String),
    #[error("输出验证失败: {0}")]
    Schema(#[from] SchemaError),
    #[error("{0}")]
    Internal(String),
}

impl GenerateError {
    fn kind(&self) -> FailureKind {
        match self {
            GenerateError::Transport(_) => FailureKind::Transport,
            GenerateError::Decode(_) => FailureKind::Decode,
            GenerateError::Schema(_) => FailureKind::Schema,
            GenerateError::Internal(_) => FailureKind::Internal,
        }
    }
}

impl From<AppError> for GenerateError {
    fn from(err: AppError) -> Self {
        GenerateError::Internal(err.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct ChatEnvelope {
    #[serde(default)]
    choices: Vec<EnvelopeChoice>,
}

#[derive(Debug, Deserialize)]
struct EnvelopeChoice {
    message: EnvelopeMessage,
}

#[derive(Debug, Deserialize)]
struct EnvelopeMessage {
    #[serde(default)]
    content: Option<String>,
}

impl LlmService {
    /// 创建新的 LLM 服务
    pub fn new(settings: &LlmSettings) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: chat_completions_url(&settings.base_url),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            is_dashscope: settings.base_url.to_lowercase().contains("dashscope"),
        })
    }

    /// 模型名称
    pub fn model(&self) -> &str {
        &self.model
    }

    /// 实际请求的地址
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// 构建请求体
    fn build_payload(&self, request: &GenerationRequest) -> AppResult<Value> {
        let (system_prompt, user_prompt) = build_prompt(request);

        let messages = vec![
            ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system_prompt)
                    .build()?,
            ),
            ChatCompletionRequestMessage::User(
                ChatCompletionRequestUserMessageArgs::default()
                    .content(user_prompt)
                    .build()?,
            ),
        ];

        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .build()?;

        let mut payload = serde_json::to_value(&chat_request)
            .map_err(|e| AppError::Other(format!("序列化 LLM 请求失败: {}", e)))?;
        payload["response_format"] = json!({ "type": "json_object" });
        Ok(payload)
    }

    /// 发送请求并取出 `choices[0].message.content`
    async fn request_content(&self, payload: &Value) -> Result<String, TransportError> {
        let started = Instant::now();

        let mut builder = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(payload);
        if self.is_dashscope {
            builder = builder.header("X-DashScope-SSE", "disable");
        }

        let response = builder
            .send()
            .await
            .map_err(|e| transport_error(e, started))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: ChatEnvelope = response.json().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout {
                    elapsed: started.elapsed().as_secs_f64(),
                }
            } else {
                TransportError::Envelope {
                    message: e.to_string(),
                }
            }
        })?;

        envelope
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(TransportError::EmptyContent)
    }

    async fn try_generate(&self, request: &GenerationRequest) -> Result<ChoicePayload, GenerateError> {
        let payload = self.build_payload(request)?;

        debug!("调用 LLM API，模型: {}", self.model);
        let content = self.request_content(&payload).await?;
        debug!("LLM 返回内容长度: {} 字符", content.chars().count());

        let raw = parse_content(&content).map_err(|e| GenerateError::Decode(e.to_string()))?;
        Ok(output_validator::into_choice_payload(&raw)?)
    }
}

#[async_trait]
impl ChoiceGenerator for LlmService {
    async fn generate_choice(&self, request: &GenerationRequest) -> GenerationResult {
        let started = Instant::now();
        let outcome = self.try_generate(request).await;
        let latency = started.elapsed().as_secs_f64();

        match outcome {
            Ok(data) => GenerationResult::success(request.clone(), data, latency),
            Err(e) => {
                warn!(
                    "⚠️ 生成失败 [{}] {}: {}",
                    request.category,
                    truncate_text(&request.question, 40),
                    e
                );
                GenerationResult::failure(request.clone(), e.kind(), e.to_string(), latency)
            }
        }
    }
}

fn transport_error(err: reqwest::Error, started: Instant) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout {
            elapsed: started.elapsed().as_secs_f64(),
        }
    } else {
        TransportError::Network {
            message: err.to_string(),
        }
    }
}

/// `<base_url>/chat/completions`，已经是完整地址时原样使用
pub fn chat_completions_url(base_url: &str) -> String {
    let trimmed = base_url.trim().trim_end_matches('/');
    if trimmed.ends_with(CHAT_COMPLETIONS_PATH) {
        trimmed.to_string()
    } else {
        format!("{}{}", trimmed, CHAT_COMPLETIONS_PATH)
    }
}

/// 解析模型返回的 JSON，兼容 ```json 代码块包裹
pub fn parse_content(content: &str) -> Result<Value, serde_json::Error> {
    let trimmed = content.trim();
    let body = match trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
    {
        Some(rest) => rest.strip_suffix("```").unwrap_or(rest).trim(),
        None => trimmed,
    };
    serde_json::from_str(body)
}

/// 并发生成一批题目
///
/// 每道题一个任务，由信号量限制同时在途的请求数；
/// 结果按输入顺序返回，任务异常退出时在对应位置记为 internal 失败
pub async fn generate_batch<G>(
    generator: Arc<G>,
    requests: Vec<GenerationRequest>,
    concurrency_limit: usize,
) -> Vec<GenerationResult>
where
    G: ChoiceGenerator + ?Sized + 'static,
{
    let semaphore = Arc::new(Semaphore::new(concurrency_limit.max(1)));

    let handles: Vec<_> = requests
        .iter()
        .cloned()
        .map(|request| {
            let generator = Arc::clone(&generator);
            let semaphore = Arc::clone(&semaphore);
            tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                generator.generate_choice(&request).await
            })
        })
        .collect();

    join_all(handles)
        .await
        .into_iter()
        .zip(requests)
        .enumerate()
        .map(|(index, (joined, request))| match joined {
            Ok(result) => result,
            Err(e) => {
                error!("[请求 {}] 任务执行失败: {}", index + 1, e);
                GenerationResult::failure(
                    request,
                    FailureKind::Internal,
                    format!("任务执行失败: {}", e),
                    0.0,
                )
            }
        })
        .collect()
}
