//! 批次缓存 - 业务能力层
//!
//! 以批次内容的哈希为键，把成功的生成结果存成 `<cache_dir>/<key>.json`

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs;
use tracing::{debug, error, info};

use crate::error::{AppError, AppResult};
use crate::models::{Category, FailureKind, GenerationRequest, GenerationResult, SourceUnit};

/// 参与计算缓存键的题目数量
const KEY_SAMPLE_UNITS: usize = 10;
/// 每道题参与计算的题干字符数
const KEY_QUESTION_CHARS: usize = 50;

/// 缓存文件内容
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub cache_key: String,
    /// Unix 时间戳（秒）
    pub timestamp: f64,
    pub results_count: usize,
    pub results: Vec<GenerationResult>,
}

/// 批次缓存
pub struct BatchCache {
    dir: PathBuf,
    enabled: bool,
}

impl BatchCache {
    pub fn new(dir: impl Into<PathBuf>, enabled: bool) -> Self {
        Self {
            dir: dir.into(),
            enabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn entry_path(&self, cache_key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", cache_key))
    }

    /// 读取缓存，未启用、不存在或损坏时返回 `None`
    pub async fn load(&self, cache_key: &str) -> Option<CacheEntry> {
        if !self.enabled {
            return None;
        }
        let path = self.entry_path(cache_key);
        let text = fs::read_to_string(&path).await.ok()?;

        match serde_json::from_str::<CacheEntry>(&text) {
            Ok(entry) => {
                info!(
                    "从缓存加载: {} ({} 个结果)",
                    path.display(),
                    entry.results.len()
                );
                Some(entry)
            }
            Err(e) => {
                error!("加载缓存失败 {}: {}", path.display(), e);
                None
            }
        }
    }

    /// 写入缓存（尽力而为，失败只打日志）
    pub async fn save(&self, cache_key: &str, results: Vec<GenerationResult>) {
        if !self.enabled {
            return;
        }
        let entry = CacheEntry {
            cache_key: cache_key.to_string(),
            timestamp: chrono::Utc::now().timestamp_millis() as f64 / 1000.0,
            results_count: results.len(),
            results,
        };
        match self.write_entry(&entry).await {
            Ok(path) => info!("保存到缓存: {}", path.display()),
            Err(e) => error!("保存缓存失败: {}", e),
        }
    }

    async fn write_entry(&self, entry: &CacheEntry) -> AppResult<PathBuf> {
        let path = self.entry_path(&entry.cache_key);
        let path_str = path.display().to_string();

        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| AppError::file_write_failed(&path_str, e))?;
        let text = serde_json::to_string_pretty(entry)
            .map_err(|e| AppError::json_parse_failed(&path_str, e))?;
        fs::write(&path, text)
            .await
            .map_err(|e| AppError::file_write_failed(&path_str, e))?;
        Ok(path)
    }
}

/// 计算批次的缓存键
///
/// 只取前 10 道题参与计算，前 10 道相同且总数相同的批次会得到同一个键
pub fn cache_key(category: Category, units: &[SourceUnit]) -> String {
    let mut content = format!("{}:{}:", category, units.len());
    for unit in units.iter().take(KEY_SAMPLE_UNITS) {
        let head: String = unit.question.chars().take(KEY_QUESTION_CHARS).collect();
        content.push_str(&format!("{}:{}:", head, unit.answer.chars().count()));
    }

    let digest = Sha256::digest(content.as_bytes());
    hex::encode(digest)[..16].to_string()
}

/// 按 `request_data.metadata.index` 把缓存结果对齐回批次位置
///
/// 缓存里没有的位置记为失败
pub fn realign(cached: Vec<GenerationResult>, requests: &[GenerationRequest]) -> Vec<GenerationResult> {
    let mut slots: Vec<Option<GenerationResult>> = vec![None; requests.len()];

    for result in cached {
        match result.request.index() {
            Some(index) if index < slots.len() => slots[index] = Some(result),
            other => debug!("忽略无法对齐的缓存结果: index={:?}", other),
        }
    }

    slots
        .into_iter()
        .zip(requests)
        .map(|(slot, request)| {
            slot.unwrap_or_else(|| {
                GenerationResult::failure(
                    request.clone(),
                    FailureKind::Internal,
                    "缓存中没有该题的生成结果",
                    0.0,
                )
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChoicePayload, Difficulty, DifficultySource};

    fn unit(question: &str, answer: &str) -> SourceUnit {
        SourceUnit {
            question: question.to_string(),
            answer: answer.to_string(),
            category: Category::JavaScript,
            source_file: "javascript-questions.md".to_string(),
            section_title: question.to_string(),
            is_subsection: false,
            estimated_difficulty: Difficulty::Medium,
        }
    }

    fn payload() -> ChoicePayload {
        ChoicePayload {
            question: "题干".to_string(),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_answer_index: 1,
            explanation: "解析".to_string(),
            difficulty: Difficulty::Medium,
            difficulty_source: DifficultySource::Model,
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_cache_key_is_stable_and_category_sensitive() {
        let units = vec![unit("What is a closure?", "answer")];
        let key = cache_key(Category::JavaScript, &units);
        assert_eq!(key.len(), 16);
        assert_eq!(key, cache_key(Category::JavaScript, &units));
        assert_ne!(key, cache_key(Category::Css, &units));
    }

    #[test]
    fn test_cache_key_ignores_units_beyond_tenth() {
        let mut a: Vec<SourceUnit> = (0..12).map(|i| unit(&format!("Q{}", i), "x")).collect();
        let b = a.clone();
        a[11].question = "Something else".to_string();
        assert_eq!(cache_key(Category::Html, &a), cache_key(Category::Html, &b));

        a[3].answer = "longer answer".to_string();
        assert_ne!(cache_key(Category::Html, &a), cache_key(Category::Html, &b));
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let cache = BatchCache::new(dir.path().join("cache"), true);
        let units = vec![unit("Q", "A")];
        let request = GenerationRequest::from_unit(&units[0], 0);

        cache
            .save("abc", vec![GenerationResult::success(request, payload(), 0.5)])
            .await;
        let entry = cache.load("abc").await.unwrap();
        assert_eq!(entry.cache_key, "abc");
        assert_eq!(entry.results_count, 1);
        assert!(entry.results[0].is_success());
    }

    #[tokio::test]
    async fn test_disabled_cache_never_hits() {
        let dir = tempfile::tempdir().unwrap();
        let cache = BatchCache::new(dir.path(), false);
        let request = GenerationRequest::from_unit(&unit("Q", "A"), 0);
        cache
            .save("abc", vec![GenerationResult::success(request, payload(), 0.5)])
            .await;
        assert!(cache.load("abc").await.is_none());
        assert!(!dir.path().join("abc.json").exists());
    }

    #[test]
    fn test_realign_fills_gaps_with_failures() {
        let units: Vec<SourceUnit> = (0..3).map(|i| unit(&format!("Q{}", i), "A")).collect();
        let requests: Vec<GenerationRequest> = units
            .iter()
            .enumerate()
            .map(|(i, u)| GenerationRequest::from_unit(u, i))
            .collect();
        let cached = vec![
            GenerationResult::success(requests[2].clone(), payload(), 0.1),
            GenerationResult::success(requests[0].clone(), payload(), 0.1),
        ];

        let aligned = realign(cached, &requests);
        assert_eq!(aligned.len(), 3);
        assert!(aligned[0].is_success());
        assert!(!aligned[1].is_success());
        assert!(aligned[2].is_success());
        assert_eq!(aligned[1].request.question, "Q1");
    }
}
