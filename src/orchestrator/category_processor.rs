//! 单个分类处理器 - 编排层
//!
//! ## 职责
//!
//! 调用 `GenerationFlow` 处理一个分类，并把任何错误隔离在该分类内部：
//! 一个分类失败不会影响其他分类。

use tracing::error;

use crate::models::{CategoryReport, CategoryStatus};
use crate::services::ErrorLogger;
use crate::utils::logging::{log_category_complete, log_category_start};
use crate::workflow::{CategoryCtx, GenerationFlow};

/// 处理单个分类
///
/// # 参数
/// - `flow`: 生成流程（跨分类复用）
/// - `ctx`: 分类上下文
/// - `error_logger`: 错误日志
///
/// # 返回
/// 总是返回报告，流程出错时报告状态为 `Failed`
pub async fn process_category(
    flow: &GenerationFlow,
    ctx: &CategoryCtx,
    error_logger: &mut ErrorLogger,
) -> CategoryReport {
    log_category_start(ctx);

    let report = match flow.run(ctx, error_logger).await {
        Ok(report) => report,
        Err(e) => {
            error!("{} ❌ 处理过程中发生错误: {}", ctx, e);
            CategoryReport::unavailable(ctx.category, CategoryStatus::Failed, e.to_string())
        }
    };

    log_category_complete(ctx, &report);
    report
}
