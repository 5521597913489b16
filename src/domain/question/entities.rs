//! Question Context - Entities
//!
//! 题库实体，字段与上游 CRUD API 的 JSON 契约一一对应

use serde::{Deserialize, Serialize};

use super::QuestionError;

/// 考题
///
/// 不变量:
/// - 用于朗读时 options 非空，且 correct_option 必须出现在 options 中
/// - 一旦从上游获取即不可变，由播放会话持有至会话结束
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub question_text: String,
    pub options: Vec<String>,
    pub correct_option: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tips: Option<String>,
}

impl Question {
    /// 定位正确选项在选项列表中的下标（精确字符串匹配）
    ///
    /// 返回 `QuestionError::CorrectOptionMissing` 表示题目数据损坏，
    /// 调用方应跳过该题而不是朗读一个未定义的字母
    pub fn correct_index(&self) -> Result<usize, QuestionError> {
        self.options
            .iter()
            .position(|opt| opt == &self.correct_option)
            .ok_or_else(|| QuestionError::CorrectOptionMissing {
                question_id: self.id.clone(),
            })
    }

    /// 校验题目是否可以被朗读
    pub fn validate_for_narration(&self) -> Result<(), QuestionError> {
        if self.options.is_empty() {
            return Err(QuestionError::NoOptions {
                question_id: self.id.clone(),
            });
        }
        self.correct_index()?;
        Ok(())
    }
}

/// 主题（balotario 章节）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    pub id: String,
    pub name: String,
    pub short_name: String,
}

/// 选项下标转字母标签：0 -> 'A', 1 -> 'B', ...
///
/// 字母只取决于列表顺序，与朗读模式无关
pub fn option_letter(index: usize) -> char {
    (b'A' + index as u8) as char
}
