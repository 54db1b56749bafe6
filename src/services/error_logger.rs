//! 错误日志服务 - 业务能力层
//!
//! 只负责"记录失败请求"能力，不关心流程

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::fs;
use tracing::{debug, error, info, warn};

use crate::error::{AppError, AppResult};

/// 每累积多少条自动落盘一次
const FLUSH_EVERY: usize = 10;

/// 一条错误记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorLogEntry {
    /// `%Y-%m-%d %H:%M:%S`
    pub timestamp: String,
    pub request_data: Value,
    pub error_message: String,
}

/// 错误日志服务
///
/// 职责：
/// - 启动时加载已有的错误记录
/// - 追加新的错误记录，每 10 条落盘一次
/// - 落盘失败只打日志，不中断流程
pub struct ErrorLogger {
    path: PathBuf,
    entries: Vec<ErrorLogEntry>,
}

impl ErrorLogger {
    /// 打开错误日志文件，已有记录会被保留
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match load_entries(&path).await {
            Ok(entries) => {
                if !entries.is_empty() {
                    info!("已加载 {} 条现有错误记录", entries.len());
                }
                entries
            }
            Err(e) => {
                error!("加载错误日志失败: {}", e);
                Vec::new()
            }
        };
        Self { path, entries }
    }

    /// 记录一条错误
    pub async fn log_error(&mut self, request_data: Value, error_message: impl Into<String>) {
        let error_message = error_message.into();
        warn!("记录错误: {}", error_message);

        self.entries.push(ErrorLogEntry {
            timestamp: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            request_data,
            error_message,
        });

        if self.entries.len() % FLUSH_EVERY == 0 {
            self.save().await;
        }
    }

    /// 把全部记录写回文件（尽力而为）
    pub async fn save(&self) {
        match self.try_save().await {
            Ok(()) => info!(
                "错误日志已保存: {} (共{}条记录)",
                self.path.display(),
                self.entries.len()
            ),
            Err(e) => error!("保存错误日志失败: {}", e),
        }
    }

    async fn try_save(&self) -> AppResult<()> {
        let path_str = self.path.display().to_string();
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::file_write_failed(&path_str, e))?;
        }
        let text = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| AppError::json_parse_failed(&path_str, e))?;
        debug!("错误日志写入 {} 字节", text.len());
        fs::write(&self.path, text)
            .await
            .map_err(|e| AppError::file_write_failed(&path_str, e))?;
        Ok(())
    }

    pub fn entries(&self) -> &[ErrorLogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

async fn load_entries(path: &Path) -> AppResult<Vec<ErrorLogEntry>> {
    let path_str = path.display().to_string();
    let text = match fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(AppError::file_read_failed(path_str, e)),
    };
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&text).map_err(|e| AppError::json_parse_failed(path_str, e))
}
