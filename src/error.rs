use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 源文档错误（按分类隔离，不影响其他分类）
    #[error("源文件错误: {0}")]
    Source(#[from] SourceError),
    /// 网络 / HTTP 传输错误
    #[error("传输错误: {0}")]
    Transport(#[from] TransportError),
    /// LLM 输出不符合题目结构
    #[error("结构校验错误: {0}")]
    Schema(#[from] SchemaError),
    /// 最终记录构建失败
    #[error("转换错误: {0}")]
    Transform(#[from] TransformError),
    /// 文件读写错误（缓存、错误日志、导出）
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 其他错误（用于包装第三方库错误）
    #[error("错误: {0}")]
    Other(String),
}

/// 源文档错误
#[derive(Debug, Error)]
pub enum SourceError {
    /// 源文件不存在
    #[error("源文件不存在: {path}")]
    NotFound { path: String },
    /// 读取源文件失败
    #[error("读取源文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 不支持的分类
    #[error("不支持的分类: {name}")]
    UnknownCategory { name: String },
    /// 所有分类都没有源文件
    #[error("没有找到任何源文件: {dir}")]
    NoSources { dir: String },
}

/// 传输错误
#[derive(Debug, Error)]
pub enum TransportError {
    /// 请求超时
    #[error("API请求超时 (耗时 {elapsed:.2}s)")]
    Timeout { elapsed: f64 },
    /// 网络请求失败
    #[error("API请求错误: {message}")]
    Network { message: String },
    /// 非 200 响应
    #[error("API请求失败: status={status}, error={body}")]
    Status { status: u16, body: String },
    /// 返回内容为空
    #[error("API响应内容为空")]
    EmptyContent,
    /// 响应外层结构无法解析
    #[error("API响应无法解析: {message}")]
    Envelope { message: String },
}

/// 结构校验错误
#[derive(Debug, Error)]
#[error("{}", errors.join("; "))]
pub struct SchemaError {
    pub errors: Vec<String>,
}

/// 转换错误（第二道结构闸门）
#[derive(Debug, Error)]
pub enum TransformError {
    /// 必需字段为空
    #[error("缺少必需字段: {field}")]
    MissingField { field: &'static str },
    /// 选项数量不正确
    #[error("选项数量不正确: 期望4个，实际{actual}个")]
    OptionCount { actual: usize },
    /// 正确答案索引越界
    #[error("正确答案索引无效: {index}，应为0-3的整数")]
    IndexOutOfRange { index: usize },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// JSON 解析失败
    #[error("JSON解析失败 ({path}): {source}")]
    JsonParseFailed {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 缺少 API 密钥
    #[error("API密钥不能为空 (请设置 DASHSCOPE_API_KEY 或 OPENAI_API_KEY)")]
    MissingApiKey,
    /// 数值超出允许范围
    #[error("{name} 必须在 {expected} 之间，当前值: {value}")]
    OutOfRange {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
    /// 无法创建 HTTP 客户端
    #[error("无法创建 HTTP 客户端: {0}")]
    HttpClient(String),
}

// ========== 从常见错误类型转换 ==========

impl From<async_openai::error::OpenAIError> for AppError {
    fn from(err: async_openai::error::OpenAIError) -> Self {
        AppError::Other(format!("构建 LLM 请求失败: {}", err))
    }
}

impl From<zip::result::ZipError> for AppError {
    fn from(err: zip::result::ZipError) -> Self {
        AppError::Other(format!("ZIP 打包失败: {}", err))
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件读取错误
    pub fn file_read_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建 JSON 解析错误
    pub fn json_parse_failed(path: impl Into<String>, source: serde_json::Error) -> Self {
        AppError::File(FileError::JsonParseFailed {
            path: path.into(),
            source,
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
