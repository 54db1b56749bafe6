//! 批量分类处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责按分类处理和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：打印启动信息、创建 LLM 服务、打开错误日志
//! 2. **逐个分类处理**：分类之间顺序执行，分类内部的请求并发执行
//! 3. **错误隔离**：单个分类失败只体现在该分类的报告中
//! 4. **全局统计**：汇总所有分类的处理结果
//! 5. **导出**：有题目时导出完整版、精简版、逐行 JSON 和 ZIP 包
//!
//! ## 设计特点
//!
//! - **顶层编排**：不处理单个分类的细节
//! - **资源所有者**：唯一持有错误日志和导出器的模块
//! - **向下委托**：委托 category_processor 处理单个分类

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{AppResult, SourceError};
use crate::models::{CategoryReport, CategoryStatus, RunSummary};
use crate::orchestrator::category_processor;
use crate::services::{ChoiceGenerator, ErrorLogger, LlmService, QuizExporter};
use crate::utils::logging::{log_startup, print_final_stats};
use crate::workflow::{CategoryCtx, GenerationFlow};

/// 应用主结构
pub struct App {
    config: Config,
    flow: GenerationFlow,
    error_logger: ErrorLogger,
    exporter: QuizExporter,
}

impl App {
    /// 初始化应用，使用真实的 LLM 服务
    pub async fn initialize(config: Config) -> AppResult<Self> {
        log_startup(&config);

        let service = LlmService::new(&config.llm)?;
        info!("✓ LLM 服务已就绪: {}", service.endpoint());
        let model = service.model().to_string();

        Ok(Self::with_generator(config, Arc::new(service), model).await)
    }

    /// 使用指定的生成器初始化应用
    pub async fn with_generator(
        config: Config,
        generator: Arc<dyn ChoiceGenerator>,
        model: impl Into<String>,
    ) -> Self {
        let flow = GenerationFlow::new(generator, model, &config);
        let error_logger = ErrorLogger::open(config.processing.error_log_file.clone()).await;
        let exporter = QuizExporter::new(config.output.clone());

        Self {
            config,
            flow,
            error_logger,
            exporter,
        }
    }

    /// 替换导出器（例如指定 README 路径）
    pub fn with_exporter(mut self, exporter: QuizExporter) -> Self {
        self.exporter = exporter;
        self
    }

    /// 运行应用主逻辑
    ///
    /// 所有分类都没有源文件时返回错误，其余情况总是返回汇总
    pub async fn run(&mut self) -> AppResult<RunSummary> {
        let reports = self.process_all_categories().await;

        if !reports.is_empty()
            && reports
                .iter()
                .all(|r| r.status == CategoryStatus::NoSource)
        {
            error!("❌ 没有找到任何源文件，程序结束");
            return Err(SourceError::NoSources {
                dir: self.config.output.source_md_dir.display().to_string(),
            }
            .into());
        }

        let summary = RunSummary::from_reports(reports);

        if summary.all_records.is_empty() {
            warn!("⚠️ 没有生成任何题目，跳过导出");
        } else {
            info!("\n📤 正在导出 {} 道题目...", summary.all_records.len());
            let outcome = self.exporter.export_all(&summary.all_records).await?;
            if let Some(zip) = &outcome.zip {
                info!("✓ 导出完成: {}", zip.display());
            }
        }

        print_final_stats(&summary, &self.config);
        Ok(summary)
    }

    /// 顺序处理所有分类
    async fn process_all_categories(&mut self) -> Vec<CategoryReport> {
        let categories = self.config.categories.clone();
        let total = categories.len();
        let mut reports = Vec::with_capacity(total);

        for (i, category) in categories.into_iter().enumerate() {
            let ctx = CategoryCtx::new(category, i + 1, total);
            let report =
                category_processor::process_category(&self.flow, &ctx, &mut self.error_logger)
                    .await;
            reports.push(report);
        }

        reports
    }
}
