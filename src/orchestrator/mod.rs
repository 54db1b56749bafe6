//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责按分类调度和汇总统计，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 整次运行
//! - 管理应用生命周期（初始化、运行）
//! - 组装 LLM 服务、缓存、错误日志、导出器
//! - 逐个分类处理并汇总统计
//! - 导出结果文件
//!
//! ### `category_processor` - 单个分类
//! - 调用 GenerationFlow
//! - 把错误隔离在分类内部
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<Category>)
//!     ↓
//! category_processor (处理单个 Category)
//!     ↓
//! workflow::GenerationFlow (解析 → 缓存 → LLM → 转换)
//!     ↓
//! services (能力层：parser / llm / cache / transformer / exporter)
//! ```

pub mod batch_processor;
pub mod category_processor;

pub use batch_processor::App;
pub use category_processor::process_category;
