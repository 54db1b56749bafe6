/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::models::{CategoryReport, CategoryStatus, RunSummary};
use crate::workflow::CategoryCtx;

/// 初始化 tracing 日志
///
/// 默认级别为 `info`，可通过 `RUST_LOG` 覆盖。重复初始化会被忽略。
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 面试题清洗模式");
    info!("🤖 模型: {} ({})", config.llm.model, config.llm.base_url);
    info!("🔑 API 密钥: {}", config.masked_api_key());
    info!("📊 最大并发数: {}", config.llm.max_concurrent_requests);
    info!(
        "📋 分类: {}",
        config
            .categories
            .iter()
            .map(|c| c.name())
            .collect::<Vec<_>>()
            .join(", ")
    );
    if config.processing.batch_size > 0 {
        info!(
            "📦 每个分类处理: 第 {} 题起共 {} 题",
            config.processing.start_index + 1,
            config.processing.batch_size
        );
    }
    info!(
        "💾 缓存: {}",
        if config.processing.cache_enabled {
            config.processing.cache_dir.display().to_string()
        } else {
            "已禁用".to_string()
        }
    );
    info!("{}", "=".repeat(60));
}

/// 记录分类开始信息
pub fn log_category_start(ctx: &CategoryCtx) {
    info!("\n{}", "=".repeat(60));
    info!("📂 开始处理分类 {}/{}: {}", ctx.position, ctx.total, ctx.category);
    info!("{}", "=".repeat(60));
}

/// 记录分类完成信息
pub fn log_category_complete(ctx: &CategoryCtx, report: &CategoryReport) {
    info!("\n{}", "─".repeat(60));
    match report.status {
        CategoryStatus::Completed => info!(
            "{} ✓ 完成: 成功 {}/{} ({:.1}%), 耗时 {:.1} 秒{}",
            ctx,
            report.generated,
            report.total,
            report.success_rate,
            report.elapsed_seconds,
            if report.from_cache { " [缓存]" } else { "" }
        ),
        _ => warn!(
            "{} ⚠️ 未完成: {}",
            ctx,
            report.error.as_deref().unwrap_or("未知原因")
        ),
    }
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
pub fn print_final_stats(summary: &RunSummary, config: &Config) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!("完成时间: {}", summary.generated_at);
    info!("{}", "=".repeat(60));
    for report in &summary.categories {
        info!(
            "  {:<12} {:>4}/{:<4} {:>6.1}%  {:?}",
            report.category.name(),
            report.generated,
            report.total,
            report.success_rate,
            report.status
        );
    }
    info!("{}", "─".repeat(60));
    info!(
        "✅ 成功: {}/{} ({:.1}%)",
        summary.total_generated, summary.total_questions, summary.overall_success_rate
    );
    info!("❌ 失败: {}", summary.total_failed);
    info!("{}", "=".repeat(60));
    info!("\n输出目录: {}", config.output.output_dir.display());
    info!("错误日志: {}", config.processing.error_log_file.display());
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大字符数
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
