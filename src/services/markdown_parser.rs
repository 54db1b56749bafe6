//! Markdown 题目解析 - 业务能力层
//!
//! 把面试手册风格的 Markdown 拆成一问一答的 [`SourceUnit`]。
//!
//! 逐行状态机，每一行按以下优先级判定：
//! References 标记 > 二级标题 > 三级标题 > 正文。
//! 代码块内的行永远不会被当作标题。

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{Category, Difficulty, DocumentMetadata, SourceUnit};

static FENCED_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```.*?```").expect("fenced block regex"));
static FENCE_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*```[\w+-]*[ \t]*$").expect("fence marker regex"));
static HTML_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("html tag regex"));
static IMAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[([^\]]*)\]\([^)]*\)").expect("image regex"));
static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\([^)]*\)").expect("link regex"));
static INLINE_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`]+)`").expect("inline code regex"));
static HEADING_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*#+[ \t]*").expect("heading marker regex"));
static BULLET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*[*+-][ \t]+").expect("bullet regex"));
static BLOCKQUOTE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*>[ \t]?").expect("blockquote regex"));
static TABLE_ROW_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*\|.*\|[ \t]*$").expect("table row regex"));

/// 单行的分类结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind<'a> {
    References,
    Heading { level: usize, title: &'a str },
    Text,
}

/// 解析状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// 第一个章节标题之前
    Preamble,
    Section,
    Subsection,
    /// References 之后，直到下一个章节标题
    SkippingReferences,
}

/// 正在累积的章节
struct OpenSection<'a> {
    title: String,
    body: Vec<&'a str>,
    subsections: Vec<(String, Vec<&'a str>)>,
}

/// 解析一篇 Markdown 文档
///
/// 没有任何二级标题时退化为以三级标题作为章节（此时不再拆分子问题）。
/// 答案为空的章节同样会输出，由上层决定是否丢弃。
pub fn parse(document: &str, category: Category, source_file: &str) -> Vec<SourceUnit> {
    let (section_level, sub_level) = if count_headings(document, 2) > 0 {
        (2, Some(3))
    } else {
        (3, None)
    };

    let mut units = Vec::new();
    let mut mode = Mode::Preamble;
    let mut current: Option<OpenSection> = None;
    let mut in_fence = false;

    for line in document.lines() {
        let kind = if in_fence {
            LineKind::Text
        } else {
            classify(line)
        };
        if is_fence_line(line) {
            in_fence = !in_fence;
        }

        match kind {
            LineKind::References => {
                if current.is_some() {
                    mode = Mode::SkippingReferences;
                }
            }
            LineKind::Heading { level, title } if level == section_level => {
                if let Some(section) = current.take() {
                    emit_section(section, category, source_file, &mut units);
                }
                current = Some(OpenSection {
                    title: title.to_string(),
                    body: Vec::new(),
                    subsections: Vec::new(),
                });
                mode = Mode::Section;
            }
            LineKind::Heading { level, title } if Some(level) == sub_level => match mode {
                Mode::Section | Mode::Subsection => {
                    if let Some(section) = current.as_mut() {
                        section.subsections.push((title.to_string(), Vec::new()));
                        mode = Mode::Subsection;
                    }
                }
                Mode::Preamble | Mode::SkippingReferences => {}
            },
            LineKind::Heading { .. } | LineKind::Text => match (mode, current.as_mut()) {
                (Mode::Section, Some(section)) => section.body.push(line),
                (Mode::Subsection, Some(section)) => {
                    if let Some((_, body)) = section.subsections.last_mut() {
                        body.push(line);
                    }
                }
                _ => {}
            },
        }
    }

    if let Some(section) = current.take() {
        emit_section(section, category, source_file, &mut units);
    }

    tracing::debug!("从 {} 解析出 {} 个问题", source_file, units.len());
    units
}

fn emit_section(
    section: OpenSection,
    category: Category,
    source_file: &str,
    units: &mut Vec<SourceUnit>,
) {
    if section.subsections.is_empty() {
        let answer = clean_body(&section.body.join("\n"));
        units.push(SourceUnit {
            estimated_difficulty: Difficulty::estimate(&section.title, &answer),
            question: section.title.clone(),
            answer,
            category,
            source_file: source_file.to_string(),
            section_title: section.title,
            is_subsection: false,
        });
        return;
    }

    for (sub_title, body) in section.subsections {
        let question = format!("{}: {}", section.title, sub_title);
        let answer = clean_body(&body.join("\n"));
        units.push(SourceUnit {
            estimated_difficulty: Difficulty::estimate(&question, &answer),
            question,
            answer,
            category,
            source_file: source_file.to_string(),
            section_title: section.title.clone(),
            is_subsection: true,
        });
    }
}

fn is_fence_line(line: &str) -> bool {
    line.trim_start().starts_with("```")
}

fn classify(line: &str) -> LineKind<'_> {
    match heading(line) {
        Some((level, title)) if level >= 3 && is_references_title(title) => LineKind::References,
        Some((level, title)) => LineKind::Heading { level, title },
        None => LineKind::Text,
    }
}

/// `## 标题` → `(2, "标题")`，标题为空时不算标题
fn heading(line: &str) -> Option<(usize, &str)> {
    let level = line.chars().take_while(|&c| c == '#').count();
    if level == 0 {
        return None;
    }
    let rest = &line[level..];
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let title = rest.trim();
    if title.is_empty() {
        None
    } else {
        Some((level, title))
    }
}

fn is_references_title(title: &str) -> bool {
    title
        .split_whitespace()
        .next()
        .map(|word| word.trim_end_matches(':').eq_ignore_ascii_case("references"))
        .unwrap_or(false)
}

fn count_headings(document: &str, level: usize) -> usize {
    let mut in_fence = false;
    let mut count = 0;
    for line in document.lines() {
        if !in_fence && matches!(heading(line), Some((l, _)) if l == level) {
            count += 1;
        }
        if is_fence_line(line) {
            in_fence = !in_fence;
        }
    }
    count
}

/// 清理答案正文
///
/// 删除代码块，去掉 HTML 标签；图片保留替代文本，链接保留文字，行内代码保留内容。
pub fn clean_body(body: &str) -> String {
    let text = FENCED_BLOCK_RE.replace_all(body, "");
    let text = HTML_TAG_RE.replace_all(&text, "");
    let text = IMAGE_RE.replace_all(&text, "$1");
    let text = LINK_RE.replace_all(&text, "$1");
    let text = INLINE_CODE_RE.replace_all(&text, "$1");
    collapse_blank_lines(&text)
}

/// 进一步去除残留的 Markdown 标记（标题符号、列表符号、引用、表格行、代码块标记）
pub fn sanitize_markdown(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }
    let text = FENCE_MARKER_RE.replace_all(text, "");
    let text = TABLE_ROW_RE.replace_all(&text, "");
    let text = HEADING_MARKER_RE.replace_all(&text, "");
    let text = BULLET_RE.replace_all(&text, "");
    let text = BLOCKQUOTE_RE.replace_all(&text, "");
    collapse_blank_lines(&text)
}

/// 每行去首尾空白，连续空行合并为一行
fn collapse_blank_lines(text: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    for line in text.lines().map(str::trim) {
        if line.is_empty() && lines.last().is_some_and(|l| l.is_empty()) {
            continue;
        }
        lines.push(line);
    }
    lines.join("\n").trim().to_string()
}

/// 提取文档基础信息
pub fn extract_metadata(document: &str, filename: &str) -> DocumentMetadata {
    let first_line = document.split('\n').next().unwrap_or_default();
    DocumentMetadata {
        filename: filename.to_string(),
        file_size: document.len(),
        line_count: document.split('\n').count(),
        first_section: first_line.chars().take(100).collect(),
        sections_count: count_headings(document, 2),
    }
}
