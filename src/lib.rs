//! # Interview Quiz Cleaner
//!
//! 把前端面试题 Markdown 文档清洗成选择题题库的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 数据模型（Models）
//! - `models/` - 分类、难度、源问答单元、生成请求与结果、题目记录、运行报告
//! - `models/loaders` - 按分类读取源 Markdown 文件
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，每个服务只负责一种能力
//! - `markdown_parser` - 标题状态机，切分问答单元
//! - `LlmService` - 调用大模型把简答题改写成选择题
//! - `output_validator` - 校验和规范化模型输出
//! - `BatchCache` / `ErrorLogger` - 结果缓存与错误日志
//! - `transformer` / `QuizExporter` - 生成最终记录并导出
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个分类"的完整处理流程
//! - `CategoryCtx` - 上下文封装（分类 + 序号）
//! - `GenerationFlow` - 流程编排（解析 → 缓存 → LLM → 转换）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 整次运行，汇总统计并导出
//! - `orchestrator/category_processor` - 单个分类处理，隔离错误
//!
//! ## 模块结构

pub mod config;
pub mod error;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{
    Category, CategoryReport, ChoicePayload, Difficulty, GenerationRequest, GenerationResult,
    QuizRecord, RunSummary, SourceUnit,
};
pub use orchestrator::{process_category, App};
pub use services::{ChoiceGenerator, LlmService};
pub use workflow::{CategoryCtx, GenerationFlow};
