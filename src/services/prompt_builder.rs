//! 提示词构建 - 业务能力层
//!
//! 把一道简答题包装成"改写为四选一单选题"的系统提示词与用户提示词

use crate::models::GenerationRequest;

const SYSTEM_PROMPT: &str = "你是一名资深前端开发工程师和面试官，拥有丰富的前端面试经验。你的任务是：
1. 将前端面试简答题转换为高质量的选择题
2. 生成具有强迷惑性的错误选项，这些选项应该：
   - 基于常见的误解或易混淆概念
   - 与正确答案在知识点上相关
   - 看似合理但实际错误
   - 避免明显的错误（如拼写错误、语法错误）
3. 评估题目的难度级别：
   - easy: 基础概念题，记忆性内容为主
   - medium: 需要理解原理，有一定的应用场景
   - hard: 复杂场景、深度原理或综合应用

请严格遵循输出格式要求。";

/// 构建提示词
///
/// 返回 `(system_prompt, user_prompt)`，同一请求总是得到相同的结果
pub fn build_prompt(request: &GenerationRequest) -> (String, String) {
    let user_prompt = format!(
        r#"原始面试题信息：
题目：{question}
原始答案：{answer}
所属分类：{category}

请将上述简答题转换为高质量的4选项单选题。

要求：
1. 保持原问题的核心考察点不变
2. 生成4个选项（1个正确答案 + 3个强迷惑性错误选项）
3. 错误选项应基于：
   - 常见误解或错误理解
   - 相关但不同的知识点
   - 部分正确但不完整的答案
   - 实际开发中容易犯的错误
4. 提供详细的答案解析，解释：
   - 为什么正确答案是正确的
   - 每个错误选项为什么是错误的
   - 相关的知识点和注意事项
5. 评估题目难度（easy/medium/hard）

输出格式要求（必须严格遵循JSON格式）：
{{
  "question": "转换后的单选题题干（使用中文）",
  "options": ["选项A内容", "选项B内容", "选项C内容", "选项D内容"],
  "correct_answer_index": 0,
  "explanation": "详细的答案解析，包括正确和错误的解释",
  "difficulty": "easy/medium/hard"
}}

注意：
- 选项内容应为纯文本，不要包含A、B、C、D等前缀
- correct_answer_index必须是0、1、2或3
- 所有内容使用中文
- 不要添加任何额外的说明或注释，只输出JSON对象"#,
        question = request.question,
        answer = request.answer,
        category = request.category,
    );

    (SYSTEM_PROMPT.to_string(), user_prompt)
}
