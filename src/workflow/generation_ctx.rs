//! 分类处理上下文
//!
//! 封装"我正在处理第几个分类"这一信息

use std::fmt::Display;

use crate::models::Category;

/// 分类处理上下文
#[derive(Debug, Clone, Copy)]
pub struct CategoryCtx {
    pub category: Category,

    /// 分类序号（从1开始，仅用于日志显示）
    pub position: usize,

    /// 本次运行的分类总数
    pub total: usize,
}

impl CategoryCtx {
    pub fn new(category: Category, position: usize, total: usize) -> Self {
        Self {
            category,
            position,
            total,
        }
    }
}

impl Display for CategoryCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[分类 {} {}/{}]", self.category, self.position, self.total)
    }
}
