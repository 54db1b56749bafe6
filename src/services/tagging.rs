//! 标签提取
//!
//! 在题目和答案中按关键词表（中英文）匹配标签，忽略大小写。
//! 不超过 3 个字符的 ASCII 关键词（`js`、`ts`、`dom`…）只按整词匹配。

use std::collections::BTreeSet;

use phf::phf_map;

/// 领域标签 → 关键词
static DOMAIN_TAGS: phf::Map<&'static str, &'static [&'static str]> = phf_map! {
    "javascript" => &["js", "javascript", "ecmascript"],
    "html" => &["html", "标记语言", "标签"],
    "css" => &["css", "样式", "布局"],
    "react" => &["react", "组件", "hooks"],
    "vue" => &["vue", "响应式", "指令"],
    "typescript" => &["typescript", "ts", "类型"],
    "es6" => &["es6", "es2015", "箭头函数", "promise"],
    "dom" => &["dom", "文档对象模型"],
    "bom" => &["bom", "浏览器对象模型"],
    "ajax" => &["ajax", "异步", "fetch"],
    "webpack" => &["webpack", "打包", "模块"],
    "性能" => &["性能", "优化", "缓存", "加载"],
    "安全" => &["安全", "xss", "csrf", "注入"],
    "兼容性" => &["兼容性", "浏览器", "polyfill"],
};

/// 概念关键词 → 标签
static CONCEPT_TAGS: phf::Map<&'static str, &'static str> = phf_map! {
    "闭包" => "closure",
    "closure" => "closure",
    "原型" => "prototype",
    "prototype" => "prototype",
    "继承" => "inheritance",
    "事件委托" => "event-delegation",
    "event delegation" => "event-delegation",
    "事件冒泡" => "event-bubbling",
    "事件捕获" => "event-capturing",
    "作用域" => "scope",
    "变量提升" => "hoisting",
    "hoisting" => "hoisting",
    "虚拟dom" => "virtual-dom",
    "virtual dom" => "virtual-dom",
    "防抖" => "debounce",
    "debounce" => "debounce",
    "节流" => "throttle",
    "throttle" => "throttle",
    "懒加载" => "lazy-loading",
    "生命周期" => "lifecycle",
};

const SHORT_KEYWORD_LEN: usize = 3;

/// 从题目和答案中提取标签，结果有序且去重
pub fn extract_tags(question: &str, answer: &str) -> BTreeSet<String> {
    let text = format!("{}\n{}", question, answer).to_lowercase();
    let mut tags = BTreeSet::new();

    for (tag, keywords) in DOMAIN_TAGS.entries() {
        if keywords.iter().any(|kw| contains_keyword(&text, kw)) {
            tags.insert((*tag).to_string());
        }
    }

    for (keyword, tag) in CONCEPT_TAGS.entries() {
        if contains_keyword(&text, keyword) {
            tags.insert((*tag).to_string());
        }
    }

    tags
}

/// `text` 需已转小写
fn contains_keyword(text: &str, keyword: &str) -> bool {
    let is_short_ascii = keyword.is_ascii() && keyword.len() <= SHORT_KEYWORD_LEN;
    if !is_short_ascii {
        return text.contains(keyword);
    }

    text.match_indices(keyword).any(|(start, matched)| {
        let before = text[..start].chars().next_back();
        let after = text[start + matched.len()..].chars().next();
        !before.is_some_and(|c| c.is_ascii_alphanumeric())
            && !after.is_some_and(|c| c.is_ascii_alphanumeric())
    })
}
