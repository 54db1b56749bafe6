//! 分类生成流程 - 流程层
//!
//! 核心职责：定义"一个分类"的完整处理流程
//!
//! 流程顺序：
//! 1. 读取源文件 → 解析 → 清理 → 切片
//! 2. 查缓存：命中则直接回放，未命中则并发调用 LLM 并写缓存
//! 3. 转换为最终题目记录
//! 4. 错误日志落盘

use std::fmt::Display;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{AppResult, SourceError};
use crate::models::report::percentage;
use crate::models::{
    load_category_source, CategoryReport, CategoryStatus, FailedDetail, GenerationRequest,
    GenerationResult, SourceUnit,
};
use crate::services::batch_cache::{self, BatchCache};
use crate::services::llm_service::{generate_batch, ChoiceGenerator};
use crate::services::quality_analyzer::{analyze_quality, improvement_notes};
use crate::services::transformer::{transform_batch, SkipReason};
use crate::services::{markdown_parser, ErrorLogger};
use crate::utils::logging::truncate_text;
use crate::workflow::generation_ctx::CategoryCtx;

/// 低于该分数时输出改进说明
const QUALITY_NOTE_THRESHOLD: u32 = 85;

/// 流程阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStage {
    LoadSource,
    CheckCache,
    Replay,
    CallLlm,
    PersistCache,
    Transform,
    PersistErrors,
    Done,
}

impl Display for FlowStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            FlowStage::LoadSource => "📁 加载源文件",
            FlowStage::CheckCache => "🔍 检查缓存",
            FlowStage::Replay => "♻️ 回放缓存结果",
            FlowStage::CallLlm => "🤖 调用 LLM",
            FlowStage::PersistCache => "💾 写入缓存",
            FlowStage::Transform => "🔄 转换题目",
            FlowStage::PersistErrors => "📝 保存错误日志",
            FlowStage::Done => "✓ 完成",
        };
        f.write_str(label)
    }
}

/// 分类生成流程
///
/// - 编排单个分类的完整处理流程
/// - 决定何时读缓存、何时调用 LLM、何时记录错误
/// - 只依赖业务能力（services）
pub struct GenerationFlow {
    generator: Arc<dyn ChoiceGenerator>,
    cache: BatchCache,
    model: String,
    source_dir: PathBuf,
    concurrency: usize,
    start_index: usize,
    batch_size: usize,
}

impl GenerationFlow {
    /// 创建新的生成流程
    pub fn new(generator: Arc<dyn ChoiceGenerator>, model: impl Into<String>, config: &Config) -> Self {
        Self {
            generator,
            cache: BatchCache::new(
                config.processing.cache_dir.clone(),
                config.processing.cache_enabled,
            ),
            model: model.into(),
            source_dir: config.output.source_md_dir.clone(),
            concurrency: config.llm.max_concurrent_requests,
            start_index: config.processing.start_index,
            batch_size: config.processing.batch_size,
        }
    }

    pub async fn run(
        &self,
        ctx: &CategoryCtx,
        error_logger: &mut ErrorLogger,
    ) -> AppResult<CategoryReport> {
        let started = Instant::now();

        // ========== LOAD_SOURCE ==========
        self.enter(ctx, FlowStage::LoadSource);
        let units = match self.load_units(ctx).await {
            Ok(units) => units,
            Err(SourceError::NotFound { path }) => {
                warn!("{} ⚠️ 源文件不存在: {}", ctx, path);
                return Ok(CategoryReport::unavailable(
                    ctx.category,
                    CategoryStatus::NoSource,
                    format!("源文件不存在: {}", path),
                ));
            }
            Err(e) => return Err(e.into()),
        };
        if units.is_empty() {
            warn!("{} ⚠️ 没有找到可处理的问题", ctx);
            return Ok(CategoryReport::unavailable(
                ctx.category,
                CategoryStatus::NoQuestions,
                "没有找到问题",
            ));
        }
        let requests: Vec<GenerationRequest> = units
            .iter()
            .enumerate()
            .map(|(i, unit)| GenerationRequest::from_unit(unit, i))
            .collect();

        // ========== CHECK_CACHE ==========
        self.enter(ctx, FlowStage::CheckCache);
        if !self.cache.is_enabled() {
            debug!("{} 缓存已禁用", ctx);
        }
        let cache_key = batch_cache::cache_key(ctx.category, &units);
        let cached = self.cache.load(&cache_key).await;
        let from_cache = cached.is_some();

        let results = match cached {
            Some(entry) => {
                self.enter(ctx, FlowStage::Replay);
                info!("{} 使用缓存结果 ({} 个)", ctx, entry.results.len());
                batch_cache::realign(entry.results, &requests)
            }
            None => {
                self.enter(ctx, FlowStage::CallLlm);
                info!(
                    "{} 开始生成 {} 道题 (并发 {})",
                    ctx,
                    requests.len(),
                    self.concurrency
                );
                let results =
                    generate_batch(Arc::clone(&self.generator), requests.clone(), self.concurrency)
                        .await;

                for result in results.iter().filter(|r| !r.is_success()) {
                    error_logger
                        .log_error(
                            result.request.to_value(),
                            result.error().unwrap_or("未知错误"),
                        )
                        .await;
                }

                self.enter(ctx, FlowStage::PersistCache);
                let successes: Vec<GenerationResult> =
                    results.iter().filter(|r| r.is_success()).cloned().collect();
                if successes.is_empty() {
                    warn!("{} 没有成功的结果，跳过缓存", ctx);
                } else {
                    self.cache.save(&cache_key, successes).await;
                }
                results
            }
        };

        self.log_quality(ctx, &results);

        // ========== TRANSFORM ==========
        self.enter(ctx, FlowStage::Transform);
        let outcome = transform_batch(&results, &units, ctx.category, &self.model);

        let mut failed_details = Vec::new();
        for skipped in &outcome.skipped {
            let Some(result) = results.get(skipped.index) else {
                continue;
            };
            let error = match &skipped.reason {
                SkipReason::GenerationFailed => result.error().unwrap_or("未知错误").to_string(),
                SkipReason::NoMatchingUnit => "没有对应的源问题".to_string(),
                SkipReason::Invalid(e) => {
                    let message = format!("转换失败: {}", e);
                    error_logger
                        .log_error(result.request.to_value(), message.clone())
                        .await;
                    message
                }
            };
            failed_details.push(FailedDetail {
                index: skipped.index,
                question: result.request.question.clone(),
                error,
            });
        }

        // ========== PERSIST_ERRORS ==========
        self.enter(ctx, FlowStage::PersistErrors);
        if !error_logger.is_empty() {
            error_logger.save().await;
        }

        self.enter(ctx, FlowStage::Done);
        let total = units.len();
        let generated = outcome.records.len();
        Ok(CategoryReport {
            category: ctx.category,
            status: CategoryStatus::Completed,
            success: generated > 0,
            generated,
            failed: total - generated,
            total,
            success_rate: percentage(generated, total),
            elapsed_seconds: started.elapsed().as_secs_f64(),
            from_cache,
            error: None,
            records: outcome.records,
            failed_details,
        })
    }

    /// 读取、解析、清理并切片
    async fn load_units(&self, ctx: &CategoryCtx) -> Result<Vec<SourceUnit>, SourceError> {
        let document = load_category_source(&self.source_dir, ctx.category).await?;

        let metadata = markdown_parser::extract_metadata(&document.content, &document.file_name);
        debug!(
            "{} 文件信息: {} 行, {} 个二级标题, 首行: {}",
            ctx, metadata.line_count, metadata.sections_count, metadata.first_section
        );

        let parsed = markdown_parser::parse(&document.content, ctx.category, &document.file_name);
        let parsed_count = parsed.len();

        let valid: Vec<SourceUnit> = parsed
            .into_iter()
            .map(|mut unit| {
                unit.question = markdown_parser::sanitize_markdown(&unit.question);
                unit.answer = markdown_parser::sanitize_markdown(&unit.answer);
                unit
            })
            .filter(SourceUnit::is_complete)
            .collect();
        info!(
            "{} 解析出 {} 个问题，其中 {} 个有效",
            ctx,
            parsed_count,
            valid.len()
        );

        let limit = if self.batch_size == 0 {
            usize::MAX
        } else {
            self.batch_size
        };
        Ok(valid
            .into_iter()
            .skip(self.start_index)
            .take(limit)
            .collect())
    }

    /// 仅记录日志，不影响结果
    fn log_quality(&self, ctx: &CategoryCtx, results: &[GenerationResult]) {
        for (index, payload) in results
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.data().map(|d| (i, d)))
        {
            let report = analyze_quality(payload);
            if report.score < QUALITY_NOTE_THRESHOLD {
                debug!(
                    "{} 第{}题质量评分 {} ({})\n{}",
                    ctx,
                    index + 1,
                    report.score,
                    truncate_text(&payload.question, 30),
                    improvement_notes(&report)
                );
            }
        }
    }

    fn enter(&self, ctx: &CategoryCtx, stage: FlowStage) {
        debug!("{} ▶ {}", ctx, stage);
    }
}
