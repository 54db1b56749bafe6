use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;

use crate::error::SourceError;
use crate::models::Category;

/// 已读入内存的源文档
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub path: PathBuf,
    pub file_name: String,
    pub content: String,
}

/// 读取某个分类对应的 Markdown 源文件
///
/// 文件不存在时返回 [`SourceError::NotFound`]，由调用方按"无源文件"处理
pub async fn load_category_source(
    source_dir: &Path,
    category: Category,
) -> Result<SourceDocument, SourceError> {
    let file_name = category.source_file_name();
    let path = source_dir.join(file_name);

    let content = fs::read_to_string(&path).await.map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            SourceError::NotFound {
                path: path.display().to_string(),
            }
        } else {
            SourceError::ReadFailed {
                path: path.display().to_string(),
                source: e,
            }
        }
    })?;

    tracing::info!("正在加载: {} ({} 字节)", file_name, content.len());

    Ok(SourceDocument {
        path,
        file_name: file_name.to_string(),
        content,
    })
}
