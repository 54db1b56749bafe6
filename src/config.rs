use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{AppResult, ConfigError};
use crate::models::Category;

const DASHSCOPE_BASE_URL: &str = "https://dashscope.aliyuncs.com/compatible-mode/v1";
const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    pub llm: LlmSettings,
    pub processing: ProcessingSettings,
    pub output: OutputSettings,
    /// 本次运行要处理的分类
    pub categories: Vec<Category>,
}

/// 大模型配置
#[derive(Clone, Debug)]
pub struct LlmSettings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// 单次请求超时
    pub timeout: Duration,
    /// 同时在途的请求数上限
    pub max_concurrent_requests: usize,
}

/// 处理配置
#[derive(Clone, Debug)]
pub struct ProcessingSettings {
    /// 每个分类本次处理的题目上限（0 表示全部）
    pub batch_size: usize,
    /// 每个分类的起始题目序号
    pub start_index: usize,
    /// 仅对外报告，核心流程不做自动重试
    pub max_retries: u32,
    pub cache_enabled: bool,
    pub cache_dir: PathBuf,
    pub error_log_file: PathBuf,
}

/// 输出配置
#[derive(Clone, Debug)]
pub struct OutputSettings {
    pub output_dir: PathBuf,
    pub source_md_dir: PathBuf,
    pub json_filename: String,
    pub mini_json_filename: String,
    pub line_json_filename: String,
    pub zip_filename: String,
    /// 精简版导出的题目数量
    pub mini_count: usize,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: OPENAI_BASE_URL.to_string(),
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.3,
            max_tokens: 2000,
            timeout: Duration::from_secs(30),
            max_concurrent_requests: 3,
        }
    }
}

impl Default for ProcessingSettings {
    fn default() -> Self {
        Self {
            batch_size: 0,
            start_index: 0,
            max_retries: 3,
            cache_enabled: true,
            cache_dir: PathBuf::from(".cache"),
            error_log_file: PathBuf::from("error_log.json"),
        }
    }
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("cleaned_data"),
            source_md_dir: PathBuf::from("source_md"),
            json_filename: "frontend_questions.json".to_string(),
            mini_json_filename: "frontend_questions_mini.json".to_string(),
            line_json_filename: "frontend_questions_line.json".to_string(),
            zip_filename: "frontend_questions.zip".to_string(),
            mini_count: 20,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm: LlmSettings::default(),
            processing: ProcessingSettings::default(),
            output: OutputSettings::default(),
            categories: Category::ALL.to_vec(),
        }
    }
}

impl Config {
    /// 从环境变量加载配置（先尝试读取 `.env`）
    pub fn from_env() -> AppResult<Self> {
        // .env 不存在时静默使用系统环境变量
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源加载配置，便于测试
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Self::default();

        let api_key = lookup("DASHSCOPE_API_KEY")
            .filter(|v| !v.is_empty())
            .or_else(|| lookup("OPENAI_API_KEY"))
            .unwrap_or_default();

        // DashScope 密钥使用 DashScope 兼容端点
        let (base_url, model) = if api_key.to_lowercase().contains("dashscope") {
            (
                DASHSCOPE_BASE_URL.to_string(),
                lookup("LLM_MODEL").unwrap_or_else(|| "qwen-turbo".to_string()),
            )
        } else {
            (
                lookup("OPENAI_BASE_URL").unwrap_or(default.llm.base_url),
                lookup("LLM_MODEL").unwrap_or(default.llm.model),
            )
        };

        let llm = LlmSettings {
            api_key,
            base_url,
            model,
            temperature: parse_var(&lookup, "LLM_TEMPERATURE", default.llm.temperature)?,
            max_tokens: parse_var(&lookup, "LLM_MAX_TOKENS", default.llm.max_tokens)?,
            timeout: Duration::from_secs(parse_var(
                &lookup,
                "REQUEST_TIMEOUT",
                default.llm.timeout.as_secs(),
            )?),
            max_concurrent_requests: parse_var(
                &lookup,
                "MAX_CONCURRENT_REQUESTS",
                default.llm.max_concurrent_requests,
            )?,
        };

        let processing = ProcessingSettings {
            batch_size: parse_var(&lookup, "BATCH_SIZE", default.processing.batch_size)?,
            start_index: parse_var(&lookup, "START_INDEX", default.processing.start_index)?,
            max_retries: parse_var(&lookup, "MAX_RETRIES", default.processing.max_retries)?,
            cache_enabled: parse_var(&lookup, "CACHE_ENABLED", default.processing.cache_enabled)?,
            cache_dir: lookup("CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.processing.cache_dir),
            error_log_file: lookup("ERROR_LOG_FILE")
                .map(PathBuf::from)
                .unwrap_or(default.processing.error_log_file),
        };

        let output = OutputSettings {
            output_dir: lookup("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.output.output_dir),
            source_md_dir: lookup("SOURCE_MD_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.output.source_md_dir),
            mini_count: parse_var(&lookup, "MINI_EXPORT_COUNT", default.output.mini_count)?,
            ..default.output
        };

        let categories = match lookup("CATEGORIES") {
            Some(raw) => Category::parse_list(&raw)?,
            None => default.categories,
        };

        let config = Self {
            llm,
            processing,
            output,
            categories,
        };
        config.validate()?;
        Ok(config)
    }

    /// 校验配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        if !(0.0..=1.0).contains(&self.llm.temperature) {
            return Err(ConfigError::OutOfRange {
                name: "temperature",
                value: self.llm.temperature.to_string(),
                expected: "0-1",
            });
        }
        if self.llm.max_concurrent_requests == 0 {
            return Err(ConfigError::OutOfRange {
                name: "MAX_CONCURRENT_REQUESTS",
                value: "0".to_string(),
                expected: "1-∞",
            });
        }
        if self.llm.timeout.is_zero() {
            return Err(ConfigError::OutOfRange {
                name: "REQUEST_TIMEOUT",
                value: "0".to_string(),
                expected: "1-∞",
            });
        }
        Ok(())
    }

    /// 脱敏后的 API 密钥，用于日志
    pub fn masked_api_key(&self) -> String {
        let visible: String = self.llm.api_key.chars().take(6).collect();
        format!("{}...", visible)
    }
}

fn parse_var<F, T>(lookup: &F, var_name: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var_name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .to_lowercase()
            .parse()
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: std::any::type_name::<T>().to_string(),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_with_api_key() {
        let config = Config::from_lookup(lookup_from(&[("OPENAI_API_KEY", "sk-test")])).unwrap();
        assert_eq!(config.llm.model, "gpt-3.5-turbo");
        assert_eq!(config.llm.max_concurrent_requests, 3);
        assert_eq!(config.llm.timeout, Duration::from_secs(30));
        assert!(config.processing.cache_enabled);
        assert_eq!(config.output.mini_count, 20);
        assert_eq!(config.categories, Category::ALL.to_vec());
    }

    #[test]
    fn test_missing_api_key_is_fatal() {
        let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(
            err,
            crate::error::AppError::Config(ConfigError::MissingApiKey)
        ));
    }

    #[test]
    fn test_temperature_out_of_range_is_fatal() {
        let err = Config::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("LLM_TEMPERATURE", "1.5"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            crate::error::AppError::Config(ConfigError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_unparseable_number_is_reported() {
        let err = Config::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("LLM_MAX_TOKENS", "lots"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("LLM_MAX_TOKENS"));
    }

    #[test]
    fn test_dashscope_key_switches_endpoint() {
        let config =
            Config::from_lookup(lookup_from(&[("DASHSCOPE_API_KEY", "dashscope-abc")])).unwrap();
        assert_eq!(config.llm.base_url, DASHSCOPE_BASE_URL);
        assert_eq!(config.llm.model, "qwen-turbo");
    }

    #[test]
    fn test_cache_flag_and_categories() {
        let config = Config::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("CACHE_ENABLED", "FALSE"),
            ("CATEGORIES", "js, css"),
        ]))
        .unwrap();
        assert!(!config.processing.cache_enabled);
        assert_eq!(
            config.categories,
            vec![Category::JavaScript, Category::Css]
        );
    }
}
