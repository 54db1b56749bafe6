//! 导出服务 - 业务能力层
//!
//! 输出四种产物：完整 JSON、精简版 JSON、逐行 JSON、ZIP 包

use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{info, warn};
use zip::write::FileOptions;
use zip::CompressionMethod;

use crate::config::OutputSettings;
use crate::error::{AppError, AppResult};
use crate::models::{Category, QuizRecord};

const EXPORT_VERSION: &str = "1.0.0";
const EXPORT_SOURCE: &str = "front-end-interview-handbook";
const EXPORT_FORMAT: &str = "quiz";

/// 导出文件的元数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub version: String,
    pub source: String,
    pub total_questions: usize,
    pub generated_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<Category>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_mini_version: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_version_count: Option<usize>,
}

/// 导出文件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub metadata: ExportMetadata,
    pub questions: Vec<QuizRecord>,
}

/// 本次导出生成的文件
#[derive(Debug, Clone, Default)]
pub struct ExportOutcome {
    pub full: Option<PathBuf>,
    pub mini: Option<PathBuf>,
    pub line: Option<PathBuf>,
    pub zip: Option<PathBuf>,
}

/// 导出服务
pub struct QuizExporter {
    settings: OutputSettings,
    readme_path: PathBuf,
}

impl QuizExporter {
    pub fn new(settings: OutputSettings) -> Self {
        Self {
            settings,
            readme_path: PathBuf::from("README.md"),
        }
    }

    /// 指定打包进 ZIP 的 README 路径
    pub fn with_readme(mut self, path: impl Into<PathBuf>) -> Self {
        self.readme_path = path.into();
        self
    }

    fn output_path(&self, file_name: &str) -> PathBuf {
        self.settings.output_dir.join(file_name)
    }

    async fn ensure_output_dir(&self) -> AppResult<()> {
        fs::create_dir_all(&self.settings.output_dir)
            .await
            .map_err(|e| AppError::file_write_failed(self.settings.output_dir.display().to_string(), e))
    }

    /// 导出完整版
    pub async fn export_full(&self, records: &[QuizRecord]) -> AppResult<PathBuf> {
        let categories: BTreeSet<Category> = records.iter().map(|r| r.category).collect();
        let document = ExportDocument {
            metadata: ExportMetadata {
                categories: Some(categories.into_iter().collect()),
                format: Some(EXPORT_FORMAT.to_string()),
                ..base_metadata(records.len())
            },
            questions: records.to_vec(),
        };

        let path = self.output_path(&self.settings.json_filename);
        self.write_document(&path, &document).await?;
        info!("已导出 {} 个问题到: {}", records.len(), path.display());
        Ok(path)
    }

    /// 导出精简版（前 N 道），没有题目时不导出
    pub async fn export_mini(&self, records: &[QuizRecord]) -> AppResult<Option<PathBuf>> {
        if records.is_empty() {
            warn!("没有可导出的问题");
            return Ok(None);
        }

        let mini: Vec<QuizRecord> = records
            .iter()
            .take(self.settings.mini_count)
            .cloned()
            .collect();
        let document = ExportDocument {
            metadata: ExportMetadata {
                is_mini_version: Some(true),
                full_version_count: Some(records.len()),
                ..base_metadata(mini.len())
            },
            questions: mini,
        };

        let path = self.output_path(&self.settings.mini_json_filename);
        self.write_document(&path, &document).await?;
        info!(
            "已导出精简版 {} 个问题到: {}",
            document.questions.len(),
            path.display()
        );
        Ok(Some(path))
    }

    /// 导出逐行 JSON
    pub async fn export_line_json(&self, records: &[QuizRecord]) -> AppResult<PathBuf> {
        self.ensure_output_dir().await?;
        let path = self.output_path(&self.settings.line_json_filename);
        write_line_json(&path, records).await?;
        info!("已导出逐行 JSON {} 行到: {}", records.len(), path.display());
        Ok(path)
    }

    /// 把完整版 JSON 和 README（如果存在）打包成 ZIP
    pub async fn create_zip(&self, json_path: &Path) -> AppResult<PathBuf> {
        let zip_path = self.output_path(&self.settings.zip_filename);
        let json_path = json_path.to_path_buf();
        let readme_path = self.readme_path.clone();
        let target = zip_path.clone();

        tokio::task::spawn_blocking(move || write_zip(&target, &json_path, &readme_path))
            .await
            .map_err(|e| AppError::Other(format!("ZIP 打包任务失败: {}", e)))??;

        info!("已创建ZIP包: {}", zip_path.display());
        Ok(zip_path)
    }

    /// 导出全部产物
    pub async fn export_all(&self, records: &[QuizRecord]) -> AppResult<ExportOutcome> {
        let full = self.export_full(records).await?;
        let mini = self.export_mini(records).await?;
        let line = self.export_line_json(records).await?;
        let zip = self.create_zip(&full).await?;

        Ok(ExportOutcome {
            full: Some(full),
            mini,
            line: Some(line),
            zip: Some(zip),
        })
    }

    async fn write_document(&self, path: &Path, document: &ExportDocument) -> AppResult<()> {
        self.ensure_output_dir().await?;
        let path_str = path.display().to_string();
        let text = serde_json::to_string_pretty(document)
            .map_err(|e| AppError::json_parse_failed(&path_str, e))?;
        fs::write(path, text)
            .await
            .map_err(|e| AppError::file_write_failed(&path_str, e))
    }
}

fn base_metadata(total_questions: usize) -> ExportMetadata {
    ExportMetadata {
        version: EXPORT_VERSION.to_string(),
        source: EXPORT_SOURCE.to_string(),
        total_questions,
        generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        categories: None,
        format: None,
        is_mini_version: None,
        full_version_count: None,
    }
}

/// 每行一条记录
pub async fn write_line_json(path: &Path, records: &[QuizRecord]) -> AppResult<()> {
    let path_str = path.display().to_string();
    let mut text = String::new();
    for record in records {
        let line =
            serde_json::to_string(record).map_err(|e| AppError::json_parse_failed(&path_str, e))?;
        text.push_str(&line);
        text.push('\n');
    }
    fs::write(path, text)
        .await
        .map_err(|e| AppError::file_write_failed(&path_str, e))
}

/// 读回逐行 JSON，空行忽略
pub async fn read_line_json(path: &Path) -> AppResult<Vec<QuizRecord>> {
    let path_str = path.display().to_string();
    let text = fs::read_to_string(path)
        .await
        .map_err(|e| AppError::file_read_failed(&path_str, e))?;

    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).map_err(|e| AppError::json_parse_failed(&path_str, e)))
        .collect()
}

fn write_zip(zip_path: &Path, json_path: &Path, readme_path: &Path) -> AppResult<()> {
    let zip_str = zip_path.display().to_string();
    let file = std::fs::File::create(zip_path).map_err(|e| AppError::file_write_failed(&zip_str, e))?;
    let mut zip = zip::ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let json_name = json_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "questions.json".to_string());
    let json_bytes = std::fs::read(json_path)
        .map_err(|e| AppError::file_read_failed(json_path.display().to_string(), e))?;
    zip.start_file(json_name, options)?;
    zip.write_all(&json_bytes)
        .map_err(|e| AppError::file_write_failed(&zip_str, e))?;

    if readme_path.is_file() {
        let readme = std::fs::read(readme_path)
            .map_err(|e| AppError::file_read_failed(readme_path.display().to_string(), e))?;
        zip.start_file("README.md", options)?;
        zip.write_all(&readme)
            .map_err(|e| AppError::file_write_failed(&zip_str, e))?;
    }

    zip.finish()?;
    Ok(())
}
